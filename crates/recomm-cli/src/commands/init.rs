//! Init-config command implementation.

use crate::cli::InitConfigArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use std::fs;

/// Execute the init-config command.
pub fn execute_init_config(args: InitConfigArgs, formatter: &Formatter) -> Result<()> {
    if args.path.exists() && !args.force {
        return Err(CliError::InvalidInput(format!(
            "{} already exists; use --force to overwrite",
            args.path.display()
        )));
    }
    if let Some(parent) = args.path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(&args.path, Config::default().to_toml()?)?;
    println!(
        "{}",
        formatter.success(&format!("Wrote {}", args.path.display()))
    );
    Ok(())
}

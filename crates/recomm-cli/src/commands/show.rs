//! Show command implementation.

use super::open_store;
use crate::cli::ShowArgs;
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recomm_domain::{ElementId, ViolationId};

/// Execute the show command.
pub fn execute_show(args: ShowArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;

    let mut recommendations = match (args.violation, args.element) {
        (Some(violation), None) => {
            store.recommendations_for_violation(&ViolationId::new(violation))?
        }
        (None, Some(element)) => store.recommendations_for_element(&ElementId::new(element))?,
        _ => {
            return Err(CliError::InvalidInput(
                "pass exactly one of --violation or --element".to_string(),
            ))
        }
    };
    if !args.all {
        recommendations.retain(|r| r.status.is_live());
    }

    println!("{}", formatter.format_recommendations(&recommendations)?);
    Ok(())
}

//! Recomm CLI - Graph-grounded recommendations for compliance violations.

use clap::Parser;
use recomm_cli::commands;
use recomm_cli::config::OutputFormat;
use recomm_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    // RUST_LOG wins over -v
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> recomm_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        // init-config must work without a readable config
        Command::InitConfig(args) => {
            let formatter = Formatter::new(
                cli.format.map(Into::into).unwrap_or(OutputFormat::Table),
                !cli.no_color,
            );
            commands::execute_init_config(args, &formatter)
        }
        command => {
            let mut config = Config::load(cli.config.as_deref())?;
            if let Some(database) = cli.database {
                config.graph.database = database;
            }

            let format = cli.format.map(Into::into).unwrap_or(config.output.format);
            let color_enabled = !cli.no_color && config.output.color;
            let formatter = Formatter::new(format, color_enabled);
            commands::dispatch(command, config, &formatter).await
        }
    }
}

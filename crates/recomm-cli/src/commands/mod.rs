//! Command implementations.

pub mod init;
pub mod load;
pub mod review;
pub mod run;
pub mod show;

pub use self::init::execute_init_config;
pub use self::load::{execute_load_graph, execute_load_violations};
pub use self::review::{execute_reject, execute_reopen};
pub use self::run::execute_run;
pub use self::show::execute_show;

use crate::cli::Command;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use recomm_graph::SqliteGraph;
use recomm_store::RecommendationStore;
use std::sync::Arc;

/// Run a parsed command against a loaded configuration.
pub async fn dispatch(command: Command, config: Config, formatter: &Formatter) -> Result<()> {
    match command {
        Command::LoadGraph(args) => execute_load_graph(args, &config, formatter),
        Command::LoadViolations(args) => execute_load_violations(args, &config, formatter),
        Command::Run(args) => execute_run(args, config, formatter).await,
        Command::Show(args) => execute_show(args, &config, formatter),
        Command::Reject(args) => execute_reject(args, &config, formatter),
        Command::Reopen(args) => execute_reopen(args, &config, formatter),
        Command::InitConfig(args) => execute_init_config(args, formatter),
    }
}

/// Open the configured graph database.
pub(crate) fn open_graph(config: &Config) -> Result<Arc<SqliteGraph>> {
    tracing::debug!(database = %config.graph.database.display(), "opening graph");
    Ok(Arc::new(SqliteGraph::new(&config.graph.database)?))
}

/// Open a recommendation store over the configured graph.
pub(crate) fn open_store(config: &Config) -> Result<RecommendationStore<SqliteGraph>> {
    Ok(RecommendationStore::new(open_graph(config)?))
}

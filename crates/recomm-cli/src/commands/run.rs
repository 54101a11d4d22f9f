//! Run command implementation.

use super::open_graph;
use crate::cli::RunArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::{next_available_path, Formatter};
use recomm_domain::traits::ViolationFilter;
use recomm_domain::{ClauseId, ElementId};
use recomm_pipeline::Pipeline;
use recomm_reasoner::{LlmReasoner, Reasoner};
use recomm_validator::CandidateValidator;
use std::fs;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Build the violation filter from the run arguments.
pub fn filter_from_args(args: &RunArgs) -> ViolationFilter {
    ViolationFilter {
        min_severity: args.min_severity.map(Into::into),
        clause_id: args.clause.as_deref().map(ClauseId::new),
        element_id: args.element.as_deref().map(ElementId::new),
        limit: args.limit,
    }
}

/// Execute the run command.
pub async fn execute_run(args: RunArgs, mut config: Config, formatter: &Formatter) -> Result<()> {
    if let Some(k) = args.k {
        config.pipeline.k = k;
    }
    if let Some(workers) = args.workers {
        config.pipeline.workers = workers;
    }
    // Timed-out provider calls count against the same budget as live ones
    config.reasoner.max_concurrent_calls = config
        .reasoner
        .max_concurrent_calls
        .min(config.pipeline.max_in_flight_reasoner_calls);
    config.validate()?;

    let graph = open_graph(&config)?;
    let provider = Arc::new(config.llm.build()?);
    let reasoner: Arc<dyn Reasoner> = Arc::new(LlmReasoner::new(provider, config.reasoner.clone()));
    let validator = CandidateValidator::new(config.validator.clone())?;
    let pipeline = Pipeline::new(
        graph,
        config.context.clone(),
        reasoner,
        validator,
        config.merge.clone(),
        config.pipeline.clone(),
    )?;

    // Ctrl-C stops new work; in-flight writes finish
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, cancelling run");
            on_interrupt.cancel();
        }
    });

    let report = pipeline.run(&filter_from_args(&args), &cancel).await?;
    println!("{}", formatter.format_report(&report)?);

    let report_path = if args.no_report {
        None
    } else {
        args.output.or(config.output.report_path)
    };
    if let Some(path) = report_path {
        let path = next_available_path(&path);
        fs::write(&path, serde_json::to_string_pretty(&report)?)?;
        println!(
            "{}",
            formatter.info(&format!("Report written to {}", path.display()))
        );
    }

    let review = report.needs_manual_review();
    if !review.is_empty() {
        println!(
            "{}",
            formatter.warning(&format!("{} violation(s) need manual review", review.len()))
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Command};
    use clap::Parser;
    use recomm_domain::Severity;

    #[test]
    fn test_filter_from_args() {
        let cli = Cli::parse_from([
            "recomm",
            "run",
            "--min-severity",
            "medium",
            "--clause",
            "corridor-width",
            "--limit",
            "10",
        ]);
        let Command::Run(args) = cli.command else {
            panic!("Expected Run command");
        };
        let filter = filter_from_args(&args);
        assert_eq!(filter.min_severity, Some(Severity::Medium));
        assert_eq!(filter.clause_id, Some(ClauseId::new("corridor-width")));
        assert!(filter.element_id.is_none());
        assert_eq!(filter.limit, Some(10));
    }
}

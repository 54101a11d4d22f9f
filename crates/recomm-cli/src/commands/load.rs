//! Load-graph and load-violations command implementations.

use super::open_graph;
use crate::cli::{LoadGraphArgs, LoadViolationsArgs};
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use recomm_graph::{load_clauses, load_graph_dir, load_violations};

/// Execute the load-graph command.
pub fn execute_load_graph(args: LoadGraphArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let graph = open_graph(config)?;
    let data = load_graph_dir(&args.dir)?;
    for file in &data.skipped_files {
        println!("{}", formatter.warning(&format!("Skipped {}", file)));
    }

    let report = graph.ingest(&data, args.force)?;
    if report.unchanged {
        println!(
            "{}",
            formatter.info("Stored model already matches; use --force to rebuild")
        );
    } else {
        println!(
            "{}",
            formatter.success(&format!(
                "Loaded {} element(s) and {} relation(s)",
                report.elements, report.relations
            ))
        );
    }
    Ok(())
}

/// Execute the load-violations command.
pub fn execute_load_violations(
    args: LoadViolationsArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    let graph = open_graph(config)?;

    let clauses = load_clauses(&args.clauses)?;
    for clause in &clauses {
        graph.insert_clause(clause)?;
    }

    let records = load_violations(&args.violations)?;
    let report = graph.ingest_violations(records, config.graph.max_elements_per_issue)?;
    println!(
        "{}",
        formatter.success(&format!(
            "Loaded {} clause(s) and {} violation(s)",
            clauses.len(),
            report.violations
        ))
    );
    if report.skipped > 0 {
        println!(
            "{}",
            formatter.warning(&format!("Skipped {} record(s)", report.skipped))
        );
    }
    Ok(())
}

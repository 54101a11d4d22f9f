//! Reject and reopen command implementations.

use super::open_store;
use crate::cli::{RejectArgs, ReopenArgs};
use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use recomm_domain::traits::WriteAck;
use recomm_domain::{RecommendationId, ViolationId};

/// Execute the reject command.
pub fn execute_reject(args: RejectArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let id = RecommendationId::from_string(&args.id).map_err(CliError::InvalidInput)?;
    let store = open_store(config)?;

    let reopenable = store.reject(id, &args.reason)?;
    println!(
        "{}",
        formatter.success(&format!("Recommendation rejected: {}", id))
    );

    for violation in reopenable {
        if args.reopen {
            report_reopen(&violation, store.reopen(&violation, &args.reason)?, formatter);
        } else {
            println!(
                "{}",
                formatter.info(&format!(
                    "{} has no accepted recommendation left; run `recomm reopen {}`",
                    violation, violation
                ))
            );
        }
    }
    Ok(())
}

/// Execute the reopen command.
pub fn execute_reopen(args: ReopenArgs, config: &Config, formatter: &Formatter) -> Result<()> {
    let store = open_store(config)?;
    let violation = ViolationId::new(args.id);
    let ack = store.reopen(&violation, &args.reason)?;
    report_reopen(&violation, ack, formatter);
    Ok(())
}

fn report_reopen(violation: &ViolationId, ack: WriteAck, formatter: &Formatter) {
    match ack {
        WriteAck::Committed { .. } => {
            println!("{}", formatter.success(&format!("Violation reopened: {}", violation)));
        }
        WriteAck::Conflict { expected, actual, .. } => {
            println!(
                "{}",
                formatter.warning(&format!(
                    "{} changed concurrently (version {} != {}); not reopened",
                    violation, actual, expected
                ))
            );
        }
    }
}

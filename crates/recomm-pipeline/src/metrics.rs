//! Metrics collection for pipeline runs

use crate::ViolationOutcome;
use serde::Serialize;
use std::collections::BTreeMap;

/// Counters collected during a pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PipelineMetrics {
    /// Violations picked up
    pub processed: usize,

    /// Violations addressed by an accepted recommendation
    pub addressed: usize,

    /// Violations whose candidates all failed validation
    pub no_valid_candidate: usize,

    /// Violations with no schema-valid candidate
    pub empty_results: usize,

    /// Violations whose reasoner stayed unreachable
    pub unavailable: usize,

    /// Violations whose context exceeded the cap
    pub context_too_large: usize,

    /// Violations with a missing element or clause
    pub not_found: usize,

    /// Violations left with an unresolved write conflict
    pub conflicts: usize,

    /// Writes retried after rebasing on a fresh version
    pub rebased: usize,

    /// Violations skipped because the run was cancelled
    pub cancelled: usize,

    /// Violations that failed unexpectedly
    pub failed: usize,

    /// Candidates returned by the reasoner
    pub candidates_proposed: usize,

    /// Candidates that passed validation
    pub candidates_accepted: usize,

    /// Rejected candidates per rejection kind
    pub rejected_by_reason: BTreeMap<String, usize>,

    /// Merged recommendations written
    pub merged: usize,

    /// Alternatives stored as proposed
    pub alternatives_stored: usize,

    /// Total runtime in milliseconds
    pub runtime_ms: u64,
}

impl PipelineMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a final violation outcome
    pub fn record_outcome(&mut self, outcome: &ViolationOutcome) {
        match outcome {
            ViolationOutcome::Addressed { alternatives, .. } => {
                self.addressed += 1;
                self.alternatives_stored += alternatives;
            }
            ViolationOutcome::NoValidCandidate { .. } => self.no_valid_candidate += 1,
            ViolationOutcome::EmptyResult { .. } => self.empty_results += 1,
            ViolationOutcome::ReasoningUnavailable { .. } => self.unavailable += 1,
            ViolationOutcome::ContextTooLarge { .. } => self.context_too_large += 1,
            ViolationOutcome::NotFound { .. } => self.not_found += 1,
            ViolationOutcome::Conflict { .. } => self.conflicts += 1,
            ViolationOutcome::Cancelled => self.cancelled += 1,
            ViolationOutcome::Failed { .. } => self.failed += 1,
        }
    }

    /// Record a rejected candidate
    pub fn record_rejection(&mut self, kind: &str) {
        *self.rejected_by_reason.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Total candidates rejected across all reasons
    pub fn total_rejected(&self) -> usize {
        self.rejected_by_reason.values().sum()
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        let mut lines = vec![
            "Pipeline Metrics Summary".to_string(),
            "========================".to_string(),
            format!("Violations processed: {}", self.processed),
            format!("Addressed: {}", self.addressed),
            format!("Total runtime: {}ms", self.runtime_ms),
            String::new(),
        ];

        let unresolved = [
            ("No valid candidate", self.no_valid_candidate),
            ("Empty result", self.empty_results),
            ("Reasoning unavailable", self.unavailable),
            ("Context too large", self.context_too_large),
            ("Not found", self.not_found),
            ("Conflicts", self.conflicts),
            ("Cancelled", self.cancelled),
            ("Failed", self.failed),
        ];
        if unresolved.iter().any(|(_, n)| *n > 0) {
            lines.push("Left open:".to_string());
            for (label, count) in unresolved.iter().filter(|(_, n)| *n > 0) {
                lines.push(format!("  {}: {}", label, count));
            }
            lines.push(String::new());
        }

        lines.push(format!(
            "Candidates: {} proposed, {} accepted, {} rejected",
            self.candidates_proposed,
            self.candidates_accepted,
            self.total_rejected()
        ));
        for (kind, count) in &self.rejected_by_reason {
            lines.push(format!("  {}: {}", kind, count));
        }
        if self.merged > 0 || self.alternatives_stored > 0 || self.rebased > 0 {
            lines.push(format!(
                "Merged: {}, alternatives stored: {}, rebased writes: {}",
                self.merged, self.alternatives_stored, self.rebased
            ));
        }

        lines.join("\n")
    }
}

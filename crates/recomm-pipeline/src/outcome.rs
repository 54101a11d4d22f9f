//! Per-violation results of a pipeline run

use crate::PipelineMetrics;
use recomm_domain::{RecommendationId, ViolationId};
use serde::Serialize;
use std::collections::BTreeMap;

/// What happened to one violation during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ViolationOutcome {
    /// An accepted recommendation now addresses the violation
    Addressed {
        /// The accepted recommendation
        recommendation: RecommendationId,
        /// Other violations covered by the same merged recommendation
        merged_with: Vec<ViolationId>,
        /// Alternatives stored as proposed
        alternatives: usize,
    },

    /// Every candidate failed validation
    NoValidCandidate {
        /// Candidates rejected
        rejected: usize,
    },

    /// The reasoner returned no schema-valid candidate
    EmptyResult {
        /// Items discarded while parsing
        discarded: usize,
    },

    /// The reasoner stayed unreachable after all retries
    ReasoningUnavailable {
        /// Last error
        message: String,
    },

    /// The context exceeded the node cap
    ContextTooLarge {
        /// Elements reached
        count: usize,
        /// Configured cap
        cap: usize,
    },

    /// The violated element or clause is missing from the graph
    NotFound {
        /// What is missing
        message: String,
    },

    /// The violation changed concurrently and could not be rebased
    Conflict {
        /// Violation whose version moved
        violation: ViolationId,
        /// Version the write expected
        expected: u64,
        /// Version found
        actual: u64,
    },

    /// The run was cancelled before anything was written
    Cancelled,

    /// Unexpected failure
    Failed {
        /// Error message
        message: String,
    },
}

impl ViolationOutcome {
    /// Short machine-readable tag
    pub fn kind(&self) -> &'static str {
        match self {
            ViolationOutcome::Addressed { .. } => "addressed",
            ViolationOutcome::NoValidCandidate { .. } => "no_valid_candidate",
            ViolationOutcome::EmptyResult { .. } => "empty_result",
            ViolationOutcome::ReasoningUnavailable { .. } => "reasoning_unavailable",
            ViolationOutcome::ContextTooLarge { .. } => "context_too_large",
            ViolationOutcome::NotFound { .. } => "not_found",
            ViolationOutcome::Conflict { .. } => "conflict",
            ViolationOutcome::Cancelled => "cancelled",
            ViolationOutcome::Failed { .. } => "failed",
        }
    }

    /// Whether a person should look at the violation
    pub fn needs_manual_review(&self) -> bool {
        matches!(
            self,
            ViolationOutcome::NoValidCandidate { .. }
                | ViolationOutcome::EmptyResult { .. }
                | ViolationOutcome::ContextTooLarge { .. }
        )
    }
}

/// Result of one pipeline run
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    /// Outcome per violation
    pub outcomes: BTreeMap<ViolationId, ViolationOutcome>,

    /// Counters for the run
    pub metrics: PipelineMetrics,
}

impl PipelineReport {
    /// Outcome for one violation
    pub fn outcome(&self, id: &ViolationId) -> Option<&ViolationOutcome> {
        self.outcomes.get(id)
    }

    /// Violations a person should look at
    pub fn needs_manual_review(&self) -> Vec<&ViolationId> {
        self.outcomes
            .iter()
            .filter(|(_, o)| o.needs_manual_review())
            .map(|(id, _)| id)
            .collect()
    }
}

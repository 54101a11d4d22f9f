//! Recommendation lifecycle over a graph backend

use crate::StoreError;
use recomm_domain::traits::{GraphAccess, RecommendationWrite, WriteAck, WriteMode};
use recomm_domain::{
    ElementId, Recommendation, RecommendationId, RecommendationStatus, Violation, ViolationId,
    ViolationStatus,
};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{info, warn};

/// Stores recommendations and moves them and their violations through
/// their lifecycles
pub struct RecommendationStore<G> {
    graph: Arc<G>,
}

impl<G> RecommendationStore<G>
where
    G: GraphAccess,
    G::Error: Display,
{
    /// Create a store over a shared graph
    pub fn new(graph: Arc<G>) -> Self {
        Self { graph }
    }

    /// The underlying graph
    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    /// Store a recommendation as the accepted fix for its violations
    ///
    /// Earlier live recommendations of the same violations are superseded and
    /// the violations become addressed, all in one write. The violation
    /// versions the recommendation was reasoned on are the expected versions:
    /// when any has moved, nothing is written and the ack is a conflict.
    pub fn accept(&self, recommendation: Recommendation) -> Result<WriteAck, StoreError> {
        self.write(recommendation, WriteMode::Accept)
    }

    /// Store a ranked alternative without changing violation status
    pub fn propose(&self, recommendation: Recommendation) -> Result<WriteAck, StoreError> {
        self.write(recommendation, WriteMode::Propose)
    }

    fn write(
        &self,
        mut recommendation: Recommendation,
        mode: WriteMode,
    ) -> Result<WriteAck, StoreError> {
        self.check_invariants(&recommendation)?;

        recommendation.status = match mode {
            WriteMode::Accept => RecommendationStatus::Accepted,
            WriteMode::Propose => RecommendationStatus::Proposed,
        };
        let expected_versions = recommendation.provenance.based_on_versions.clone();
        let id = recommendation.id;
        let violations = recommendation.violation_ids.clone();

        let ack = self
            .graph
            .write_recommendation(&RecommendationWrite {
                recommendation,
                mode,
                expected_versions,
            })
            .map_err(graph_error)?;

        match &ack {
            WriteAck::Committed { versions } => info!(
                recommendation = %id,
                mode = ?mode,
                violations = ?violations,
                versions = ?versions,
                "recommendation stored"
            ),
            WriteAck::Conflict {
                violation_id,
                expected,
                actual,
            } => warn!(
                recommendation = %id,
                violation = %violation_id,
                expected,
                actual,
                "recommendation write conflicted"
            ),
        }
        Ok(ack)
    }

    fn check_invariants(&self, recommendation: &Recommendation) -> Result<(), StoreError> {
        if recommendation.violation_ids.is_empty() {
            return Err(StoreError::InvalidRecommendation(
                "must reference at least one violation".to_string(),
            ));
        }
        if recommendation.target_elements.is_empty() {
            return Err(StoreError::InvalidRecommendation(
                "must target at least one element".to_string(),
            ));
        }
        for violation_id in &recommendation.violation_ids {
            if !recommendation
                .provenance
                .based_on_versions
                .contains_key(violation_id)
            {
                return Err(StoreError::InvalidRecommendation(format!(
                    "no base version recorded for {}",
                    violation_id
                )));
            }
            let violation = self.violation(violation_id)?;
            if violation.status.is_terminal() {
                return Err(StoreError::InvalidTransition(format!(
                    "violation {} is {}",
                    violation_id, violation.status
                )));
            }
        }
        for target in &recommendation.target_elements {
            if self.graph.fetch_element(target).map_err(graph_error)?.is_none() {
                return Err(StoreError::NotFound(format!("element {}", target)));
            }
        }
        Ok(())
    }

    /// Reject a stored recommendation
    ///
    /// Violation status is never changed here. Returns the addressed
    /// violations left without a live accepted recommendation, which are now
    /// eligible for [`reopen`](Self::reopen).
    pub fn reject(
        &self,
        id: RecommendationId,
        reason: &str,
    ) -> Result<Vec<ViolationId>, StoreError> {
        let recommendation = self.recommendation(id)?;
        if !recommendation
            .status
            .can_transition_to(RecommendationStatus::Rejected)
        {
            return Err(StoreError::InvalidTransition(format!(
                "recommendation {} is {}",
                id, recommendation.status
            )));
        }
        self.graph
            .append_recommendation_event(id, RecommendationStatus::Rejected, reason)
            .map_err(graph_error)?;
        info!(recommendation = %id, reason, "recommendation rejected");

        let mut reopenable = Vec::new();
        for violation_id in &recommendation.violation_ids {
            let violation = self.violation(violation_id)?;
            if violation.status == ViolationStatus::Addressed
                && !self.has_accepted(violation_id)?
            {
                reopenable.push(violation_id.clone());
            }
        }
        Ok(reopenable)
    }

    /// Move an addressed violation back to open
    ///
    /// Allowed only when no live accepted recommendation addresses it.
    pub fn reopen(&self, id: &ViolationId, reason: &str) -> Result<WriteAck, StoreError> {
        let violation = self.violation(id)?;
        if !violation.status.can_transition_to(ViolationStatus::Open) {
            return Err(StoreError::InvalidTransition(format!(
                "violation {} is {}",
                id, violation.status
            )));
        }
        if self.has_accepted(id)? {
            return Err(StoreError::InvalidTransition(format!(
                "violation {} still has an accepted recommendation",
                id
            )));
        }
        let ack = self
            .graph
            .append_violation_event(id, violation.version, ViolationStatus::Open, reason)
            .map_err(graph_error)?;
        if ack.is_committed() {
            info!(violation = %id, reason, "violation reopened");
        }
        Ok(ack)
    }

    /// Get a recommendation by id
    pub fn recommendation(&self, id: RecommendationId) -> Result<Recommendation, StoreError> {
        self.graph
            .fetch_recommendation(id)
            .map_err(graph_error)?
            .ok_or_else(|| StoreError::NotFound(format!("recommendation {}", id)))
    }

    /// Get a violation by id
    pub fn violation(&self, id: &ViolationId) -> Result<Violation, StoreError> {
        self.graph
            .fetch_violation(id)
            .map_err(graph_error)?
            .ok_or_else(|| StoreError::NotFound(format!("violation {}", id)))
    }

    /// Every recommendation for a violation, oldest first
    pub fn recommendations_for_violation(
        &self,
        id: &ViolationId,
    ) -> Result<Vec<Recommendation>, StoreError> {
        self.violation(id)?;
        self.graph
            .fetch_recommendations_for_violation(id)
            .map_err(graph_error)
    }

    /// Every recommendation targeting an element, oldest first
    pub fn recommendations_for_element(
        &self,
        id: &ElementId,
    ) -> Result<Vec<Recommendation>, StoreError> {
        if self.graph.fetch_element(id).map_err(graph_error)?.is_none() {
            return Err(StoreError::NotFound(format!("element {}", id)));
        }
        self.graph
            .fetch_recommendations_for_element(id)
            .map_err(graph_error)
    }

    /// The accepted recommendation currently addressing a violation, if any
    pub fn accepted_for(&self, id: &ViolationId) -> Result<Option<Recommendation>, StoreError> {
        Ok(self
            .graph
            .fetch_recommendations_for_violation(id)
            .map_err(graph_error)?
            .into_iter()
            .find(|r| r.status == RecommendationStatus::Accepted))
    }

    fn has_accepted(&self, id: &ViolationId) -> Result<bool, StoreError> {
        Ok(self.accepted_for(id)?.is_some())
    }
}

fn graph_error<E: Display>(e: E) -> StoreError {
    StoreError::Graph(e.to_string())
}

//! Candidate validation logic

use crate::{ValidatorConfig, ValidatorError};
use recomm_domain::{Candidate, Context, Element, ElementId, PropertyChange, PropertyValue};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

/// Result of candidate validation
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationResult {
    /// Whether the candidate passed validation
    pub status: ValidationStatus,

    /// Rejection reasons; checks stop at the first failure, so at most one
    pub reasons: Vec<RejectionReason>,
}

impl ValidationResult {
    /// Whether the candidate was accepted
    pub fn is_accepted(&self) -> bool {
        self.status == ValidationStatus::Accepted
    }
}

/// Validation status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationStatus {
    /// Candidate accepted
    Accepted,

    /// Candidate rejected
    Rejected,
}

/// Reasons for rejection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionReason {
    /// A target or changed element is not part of the context
    UnknownElement {
        /// The unknown element id
        element: ElementId,
    },

    /// The predicted value does not satisfy the clause predicate
    DoesNotResolve {
        /// Value the candidate predicted
        predicted: PropertyValue,
        /// Remaining gap to compliance
        deviation: f64,
    },

    /// A change touches a property the element marks as locked
    LockedProperty {
        /// Element carrying the lock
        element: ElementId,
        /// Locked property
        property: String,
    },

    /// A numeric change crosses a limit recorded on the element
    StructuralLimit {
        /// Element carrying the limit
        element: ElementId,
        /// Changed property
        property: String,
        /// The crossed limit
        limit: f64,
        /// Proposed value
        value: f64,
    },
}

impl RejectionReason {
    /// Short machine-readable tag, used for metrics
    pub fn kind(&self) -> &'static str {
        match self {
            RejectionReason::UnknownElement { .. } => "unknown_element",
            RejectionReason::DoesNotResolve { .. } => "does_not_resolve",
            RejectionReason::LockedProperty { .. } => "locked_property",
            RejectionReason::StructuralLimit { .. } => "structural_limit",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::UnknownElement { element } => {
                write!(f, "element {} is not in the context", element)
            }
            RejectionReason::DoesNotResolve {
                predicted,
                deviation,
            } => write!(
                f,
                "predicted value {} misses the requirement by {}",
                predicted, deviation
            ),
            RejectionReason::LockedProperty { element, property } => {
                write!(f, "{}.{} is locked", element, property)
            }
            RejectionReason::StructuralLimit {
                element,
                property,
                limit,
                value,
            } => write!(
                f,
                "{}.{} = {} crosses the recorded limit {}",
                element, property, value, limit
            ),
        }
    }
}

/// Candidates split by validation outcome, input order preserved
#[derive(Debug, Clone, Default)]
pub struct Partitioned {
    /// Candidates that passed every enabled check
    pub accepted: Vec<Candidate>,

    /// Candidates that failed, with the reason
    pub rejected: Vec<(Candidate, RejectionReason)>,
}

/// Validates candidates against the context they were proposed for
pub struct CandidateValidator {
    config: ValidatorConfig,
}

impl CandidateValidator {
    /// Create a validator with the given configuration
    pub fn new(config: ValidatorConfig) -> Result<Self, ValidatorError> {
        config.validate().map_err(ValidatorError::Config)?;
        Ok(Self { config })
    }

    /// Create a validator with default configuration
    pub fn default_config() -> Self {
        Self {
            config: ValidatorConfig::default(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Validate a candidate against the configured rules
    ///
    /// Checks run in order (references, resolution, immutability) and the
    /// first failure is the reported reason.
    pub fn validate(&self, candidate: &Candidate, context: &Context) -> ValidationResult {
        match self.first_failure(candidate, context) {
            None => ValidationResult {
                status: ValidationStatus::Accepted,
                reasons: Vec::new(),
            },
            Some(reason) => ValidationResult {
                status: ValidationStatus::Rejected,
                reasons: vec![reason],
            },
        }
    }

    /// Validate a batch of candidates
    pub fn partition(&self, candidates: Vec<Candidate>, context: &Context) -> Partitioned {
        let mut out = Partitioned::default();
        for candidate in candidates {
            match self.first_failure(&candidate, context) {
                None => out.accepted.push(candidate),
                Some(reason) => {
                    debug!(
                        violation = %context.violation.id,
                        reason = reason.kind(),
                        "candidate rejected: {}",
                        reason
                    );
                    out.rejected.push((candidate, reason));
                }
            }
        }
        info!(
            violation = %context.violation.id,
            accepted = out.accepted.len(),
            rejected = out.rejected.len(),
            "candidates validated"
        );
        out
    }

    fn first_failure(&self, candidate: &Candidate, context: &Context) -> Option<RejectionReason> {
        // 1. Every referenced element exists in the context
        if self.config.check_targets {
            if let Some(reason) = self.check_references(candidate, context) {
                return Some(reason);
            }
        }

        // 2. The predicted value satisfies the clause, recomputed here
        if self.config.check_resolution {
            let predicate = &context.clause.predicate;
            if !predicate.evaluate(&candidate.predicted_value) {
                return Some(RejectionReason::DoesNotResolve {
                    predicted: candidate.predicted_value.clone(),
                    deviation: predicate.deviation(&candidate.predicted_value),
                });
            }
        }

        // 3. No change contradicts an immutable property
        if self.config.check_locked || self.config.check_limits {
            for change in &candidate.changes {
                let Some(element) = context.element(&change.element) else {
                    continue;
                };
                if self.config.check_locked {
                    if let Some(reason) = self.check_locked(element, change) {
                        return Some(reason);
                    }
                }
                if self.config.check_limits {
                    if let Some(reason) = self.check_limits(element, change) {
                        return Some(reason);
                    }
                }
            }
        }

        None
    }

    fn check_references(&self, candidate: &Candidate, context: &Context) -> Option<RejectionReason> {
        candidate
            .targets
            .iter()
            .chain(candidate.changes.iter().map(|c| &c.element))
            .find(|id| !context.contains(id))
            .map(|id| RejectionReason::UnknownElement {
                element: id.clone(),
            })
    }

    fn check_locked(&self, element: &Element, change: &PropertyChange) -> Option<RejectionReason> {
        let locked = element
            .property(&self.config.locked_properties_key)
            .and_then(PropertyValue::as_text)?;
        locked
            .split(',')
            .map(str::trim)
            .any(|name| name == change.property)
            .then(|| RejectionReason::LockedProperty {
                element: element.id.clone(),
                property: change.property.clone(),
            })
    }

    fn check_limits(&self, element: &Element, change: &PropertyChange) -> Option<RejectionReason> {
        let value = change.value.as_f64()?;
        let limit_reason = |limit: f64| RejectionReason::StructuralLimit {
            element: element.id.clone(),
            property: change.property.clone(),
            limit,
            value,
        };

        let min_key = format!("{}{}", change.property, self.config.min_suffix);
        if let Some(min) = element.number(&min_key) {
            if value < min {
                return Some(limit_reason(min));
            }
        }
        let max_key = format!("{}{}", change.property, self.config.max_suffix);
        if let Some(max) = element.number(&max_key) {
            if value > max {
                return Some(limit_reason(max));
            }
        }
        None
    }
}

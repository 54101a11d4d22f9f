//! Recomm Candidate Validator
//!
//! Checks reasoner candidates against the graph before they can become
//! recommendations.
//!
//! The validator provides:
//! - Reference checks (every target and changed element is in the context)
//! - Resolution checks (the predicted value satisfies the clause predicate)
//! - Immutability checks (locked properties, recorded structural limits)
//!
//! # Examples
//!
//! ```no_run
//! use recomm_validator::{CandidateValidator, ValidatorConfig};
//!
//! let validator = CandidateValidator::new(ValidatorConfig::default()).unwrap();
//! // let result = validator.validate(&candidate, &context);
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidatorConfig;
pub use error::ValidatorError;
pub use validator::{
    CandidateValidator, Partitioned, RejectionReason, ValidationResult, ValidationStatus,
};

//! Recomm Ranking & Aggregation
//!
//! Orders validated candidates per violation and merges compatible top
//! proposals that touch the same elements across violations.
//!
//! Ranking is a pure function of the candidate set: reordering the input does
//! not change the output. Merging is symmetric and idempotent, and a batch
//! aggregates the same way regardless of the order proposals arrive in.

#![warn(missing_docs)]

mod config;
mod error;
mod merge;
mod proposal;
mod rank;

pub use config::{MergeConfig, ToleranceMode};
pub use error::RankingError;
pub use merge::{aggregate, compatible, merge};
pub use proposal::Proposal;
pub use rank::{rank, Ranked};

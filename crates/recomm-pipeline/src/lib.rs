//! Recomm Recommendation Pipeline
//!
//! Orchestrates one run over the open violations of a building graph.
//!
//! # Stages
//!
//! 1. Fetch open violations matching a filter
//! 2. Per violation, on a bounded worker pool:
//!    build the context, ask the reasoner for candidates, validate them
//!    against the graph, and rank the survivors
//! 3. Aggregate the top proposals so one change can address several
//!    violations on shared elements
//! 4. Accept each aggregated proposal and store the remaining ranked
//!    proposals as alternatives
//!
//! Each violation ends the run with a [`ViolationOutcome`]. Nothing is
//! written for a violation that ends without an accepted recommendation.
//!
//! # Examples
//!
//! ```no_run
//! use recomm_context::ContextConfig;
//! use recomm_domain::traits::ViolationFilter;
//! use recomm_graph::SqliteGraph;
//! use recomm_llm::MockProvider;
//! use recomm_pipeline::{Pipeline, PipelineConfig};
//! use recomm_ranking::MergeConfig;
//! use recomm_reasoner::{LlmReasoner, ReasonerConfig};
//! use recomm_validator::{CandidateValidator, ValidatorConfig};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let graph = Arc::new(SqliteGraph::new("building.db")?);
//! let reasoner = Arc::new(LlmReasoner::new(
//!     Arc::new(MockProvider::default()),
//!     ReasonerConfig::default(),
//! ));
//! let pipeline = Pipeline::new(
//!     graph,
//!     ContextConfig::default(),
//!     reasoner,
//!     CandidateValidator::new(ValidatorConfig::default())?,
//!     MergeConfig::default(),
//!     PipelineConfig::default(),
//! )?;
//!
//! let report = pipeline
//!     .run(&ViolationFilter::default(), &CancellationToken::new())
//!     .await?;
//! println!("{}", report.metrics.summary());
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod metrics;
mod outcome;
mod pipeline;

pub use config::PipelineConfig;
pub use error::PipelineError;
pub use metrics::PipelineMetrics;
pub use outcome::{PipelineReport, ViolationOutcome};
pub use pipeline::Pipeline;

//! The recommendation pipeline driver

use crate::{PipelineConfig, PipelineError, PipelineMetrics, PipelineReport, ViolationOutcome};
use recomm_context::{ContextBuilder, ContextConfig, ContextError};
use recomm_domain::traits::{GraphAccess, ViolationFilter, WriteAck};
use recomm_domain::{RecommendationStatus, Violation, ViolationId, ViolationStatus};
use recomm_ranking::{aggregate, rank, MergeConfig, Proposal};
use recomm_reasoner::{Reasoner, ReasonerError};
use recomm_store::RecommendationStore;
use recomm_validator::CandidateValidator;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Candidate counts for one violation
#[derive(Debug, Default)]
struct CandidateStats {
    proposed: usize,
    accepted: usize,
    rejected: Vec<&'static str>,
}

/// Where a violation stands after the per-violation stages
enum Stage {
    /// Ranked proposals, best first
    Ready(Vec<Proposal>),
    /// Finished without anything to write
    Done(ViolationOutcome),
}

struct Inner<G> {
    graph: Arc<G>,
    contexts: ContextBuilder<G>,
    reasoner: Arc<dyn Reasoner>,
    validator: CandidateValidator,
    store: RecommendationStore<G>,
    merge: MergeConfig,
    config: PipelineConfig,
    reasoner_permits: Semaphore,
}

/// Drives violations through context building, reasoning, validation,
/// ranking, aggregation, and storage
///
/// Violations are processed in parallel by a bounded pool of workers. A
/// separate limit bounds reasoner calls in flight. A failure in one
/// violation never affects another; each ends with a [`ViolationOutcome`].
pub struct Pipeline<G> {
    inner: Arc<Inner<G>>,
}

impl<G> Pipeline<G>
where
    G: GraphAccess + Send + Sync + 'static,
    G::Error: Display,
{
    /// Assemble a pipeline over a shared graph
    pub fn new(
        graph: Arc<G>,
        context_config: ContextConfig,
        reasoner: Arc<dyn Reasoner>,
        validator: CandidateValidator,
        merge: MergeConfig,
        config: PipelineConfig,
    ) -> Result<Self, PipelineError> {
        context_config.validate().map_err(PipelineError::Config)?;
        merge.validate().map_err(PipelineError::Config)?;
        config.validate().map_err(PipelineError::Config)?;

        let reasoner_permits = Semaphore::new(config.max_in_flight_reasoner_calls);
        Ok(Self {
            inner: Arc::new(Inner {
                contexts: ContextBuilder::new(Arc::clone(&graph), context_config),
                store: RecommendationStore::new(Arc::clone(&graph)),
                graph,
                reasoner,
                validator,
                merge,
                config,
                reasoner_permits,
            }),
        })
    }

    /// Get the configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.inner.config
    }

    /// The store recommendations are written to
    pub fn store(&self) -> &RecommendationStore<G> {
        &self.inner.store
    }

    /// Process every open violation matching the filter once
    ///
    /// Cancellation is checked before each stage. A reasoner call already in
    /// flight runs to completion or timeout; its result is then dropped.
    pub async fn run(
        &self,
        filter: &ViolationFilter,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport, PipelineError> {
        let started = Instant::now();
        let violations = self
            .inner
            .graph
            .fetch_open_violations(filter)
            .map_err(|e| PipelineError::Graph(e.to_string()))?;
        info!(violations = violations.len(), "pipeline run started");

        let mut report = PipelineReport::default();
        report.metrics.processed = violations.len();

        let prepared = self.prepare_all(violations, cancel, &mut report).await;
        self.commit_all(prepared, cancel, &mut report);

        report.metrics.runtime_ms = started.elapsed().as_millis() as u64;
        info!(
            processed = report.metrics.processed,
            addressed = report.metrics.addressed,
            runtime_ms = report.metrics.runtime_ms,
            "pipeline run finished"
        );
        Ok(report)
    }

    /// Run the per-violation stages on the worker pool
    async fn prepare_all(
        &self,
        violations: Vec<Violation>,
        cancel: &CancellationToken,
        report: &mut PipelineReport,
    ) -> BTreeMap<ViolationId, Vec<Proposal>> {
        let workers = Arc::new(Semaphore::new(self.inner.config.workers));
        let mut tasks = JoinSet::new();

        for violation in violations {
            let inner = Arc::clone(&self.inner);
            let workers = Arc::clone(&workers);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let id = violation.id.clone();
                let (stats, stage) = match workers.acquire_owned().await {
                    Ok(_permit) => {
                        // A panicking stage surfaces here, with the violation known
                        let stages =
                            tokio::spawn(async move { inner.prepare(violation, &cancel).await });
                        match stages.await {
                            Ok(result) => result,
                            Err(e) => {
                                error!(violation = %id, "violation stages failed: {}", e);
                                (
                                    CandidateStats::default(),
                                    Stage::Done(ViolationOutcome::Failed {
                                        message: e.to_string(),
                                    }),
                                )
                            }
                        }
                    }
                    Err(e) => (
                        CandidateStats::default(),
                        Stage::Done(ViolationOutcome::Failed {
                            message: e.to_string(),
                        }),
                    ),
                };
                (id, stats, stage)
            });
        }

        let mut prepared = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let (id, stats, stage) = match joined {
                Ok(result) => result,
                Err(e) => {
                    error!("worker task failed: {}", e);
                    report.metrics.failed += 1;
                    continue;
                }
            };

            let metrics = &mut report.metrics;
            metrics.candidates_proposed += stats.proposed;
            metrics.candidates_accepted += stats.accepted;
            for kind in stats.rejected {
                metrics.record_rejection(kind);
            }

            match stage {
                Stage::Ready(proposals) => {
                    prepared.insert(id, proposals);
                }
                Stage::Done(outcome) => record(report, id, outcome),
            }
        }
        prepared
    }

    /// Aggregate the top proposals and write them
    fn commit_all(
        &self,
        prepared: BTreeMap<ViolationId, Vec<Proposal>>,
        cancel: &CancellationToken,
        report: &mut PipelineReport,
    ) {
        let tops: Vec<Proposal> = prepared
            .values()
            .filter_map(|proposals| proposals.first().cloned())
            .collect();
        if tops.is_empty() {
            return;
        }

        for group in aggregate(tops, &self.inner.merge) {
            if cancel.is_cancelled() {
                for id in &group.violation_ids {
                    record(report, id.clone(), ViolationOutcome::Cancelled);
                }
                continue;
            }
            if group.violation_ids.len() > 1 {
                report.metrics.merged += 1;
            }
            for (id, outcome) in self.inner.commit(group, &prepared, &mut report.metrics) {
                record(report, id, outcome);
            }
        }
    }
}

fn record(report: &mut PipelineReport, id: ViolationId, outcome: ViolationOutcome) {
    debug!(violation = %id, outcome = outcome.kind(), "violation finished");
    report.metrics.record_outcome(&outcome);
    report.outcomes.insert(id, outcome);
}

impl<G> Inner<G>
where
    G: GraphAccess + Send + Sync + 'static,
    G::Error: Display,
{
    /// Context, reasoning, validation, and ranking for one violation
    async fn prepare(
        &self,
        violation: Violation,
        cancel: &CancellationToken,
    ) -> (CandidateStats, Stage) {
        let mut stats = CandidateStats::default();
        if cancel.is_cancelled() {
            return (stats, Stage::Done(ViolationOutcome::Cancelled));
        }

        let context = match self.contexts.build(&violation) {
            Ok(context) => context,
            Err(e) => return (stats, Stage::Done(context_outcome(e))),
        };
        debug!(
            violation = %violation.id,
            neighbors = context.neighbors.len(),
            history = context.prior_recommendations.len(),
            "context built"
        );

        if cancel.is_cancelled() {
            return (stats, Stage::Done(ViolationOutcome::Cancelled));
        }

        let proposed = match self.reasoner_permits.acquire().await {
            Ok(_permit) => self.reasoner.propose(&context, self.config.k).await,
            Err(e) => Err(ReasonerError::ReasoningUnavailable(e.to_string())),
        };
        let candidates = match proposed {
            Ok(candidates) => candidates,
            Err(ReasonerError::EmptyResult { discarded }) => {
                return (stats, Stage::Done(ViolationOutcome::EmptyResult { discarded }));
            }
            Err(ReasonerError::ReasoningUnavailable(message)) => {
                return (
                    stats,
                    Stage::Done(ViolationOutcome::ReasoningUnavailable { message }),
                );
            }
            Err(e) => {
                return (
                    stats,
                    Stage::Done(ViolationOutcome::Failed {
                        message: e.to_string(),
                    }),
                );
            }
        };
        stats.proposed = candidates.len();

        if cancel.is_cancelled() {
            return (stats, Stage::Done(ViolationOutcome::Cancelled));
        }

        let partitioned = self.validator.partition(candidates, &context);
        stats.accepted = partitioned.accepted.len();
        stats.rejected = partitioned.rejected.iter().map(|(_, r)| r.kind()).collect();
        if partitioned.accepted.is_empty() {
            info!(violation = %violation.id, "no candidate passed validation, needs manual review");
            let rejected = partitioned.rejected.len();
            return (stats, Stage::Done(ViolationOutcome::NoValidCandidate { rejected }));
        }

        let proposals = rank(partitioned.accepted, &context.clause)
            .iter()
            .map(|ranked| Proposal::from_ranked(&context, ranked, self.reasoner.name()))
            .collect();
        (stats, Stage::Ready(proposals))
    }

    /// Accept one aggregated proposal, rebasing once on a conflict
    fn commit(
        &self,
        mut group: Proposal,
        prepared: &BTreeMap<ViolationId, Vec<Proposal>>,
        metrics: &mut PipelineMetrics,
    ) -> Vec<(ViolationId, ViolationOutcome)> {
        let mut attempts = 0;
        loop {
            let recommendation = group.to_recommendation(RecommendationStatus::Accepted);
            let recommendation_id = recommendation.id;

            let (violation, expected, actual) = match self.store.accept(recommendation) {
                Ok(WriteAck::Committed { versions }) => {
                    return group
                        .violation_ids
                        .iter()
                        .map(|id| {
                            let merged_with = group
                                .violation_ids
                                .iter()
                                .filter(|other| *other != id)
                                .cloned()
                                .collect();
                            let alternatives = self.store_alternatives(id, prepared, &versions);
                            let outcome = ViolationOutcome::Addressed {
                                recommendation: recommendation_id,
                                merged_with,
                                alternatives,
                            };
                            (id.clone(), outcome)
                        })
                        .collect();
                }
                Ok(WriteAck::Conflict {
                    violation_id,
                    expected,
                    actual,
                }) => (violation_id, expected, actual),
                Err(e) => {
                    warn!(violations = ?group.violation_ids, "accept failed: {}", e);
                    return fail_all(&group, e.to_string());
                }
            };

            if attempts < self.config.conflict_retries {
                match self.fresh_versions(&group.violation_ids) {
                    Ok(Some(fresh)) => {
                        info!(
                            violations = ?group.violation_ids,
                            "violation changed concurrently, rebasing"
                        );
                        group.rebase(&fresh);
                        attempts += 1;
                        metrics.rebased += 1;
                        continue;
                    }
                    Ok(None) => {}
                    Err(message) => return fail_all(&group, message),
                }
            }

            warn!(violation = %violation, expected, actual, "write conflict not resolved");
            return group
                .violation_ids
                .iter()
                .map(|id| {
                    let outcome = ViolationOutcome::Conflict {
                        violation: violation.clone(),
                        expected,
                        actual,
                    };
                    (id.clone(), outcome)
                })
                .collect();
        }
    }

    /// Current versions when every violation is still open
    fn fresh_versions(
        &self,
        ids: &[ViolationId],
    ) -> Result<Option<BTreeMap<ViolationId, u64>>, String> {
        let mut versions = BTreeMap::new();
        for id in ids {
            let violation = self.store.violation(id).map_err(|e| e.to_string())?;
            if violation.status != ViolationStatus::Open {
                return Ok(None);
            }
            versions.insert(id.clone(), violation.version);
        }
        Ok(Some(versions))
    }

    /// Store lower-ranked proposals of a violation as alternatives
    fn store_alternatives(
        &self,
        id: &ViolationId,
        prepared: &BTreeMap<ViolationId, Vec<Proposal>>,
        versions: &BTreeMap<ViolationId, u64>,
    ) -> usize {
        if !self.config.store_alternatives {
            return 0;
        }
        let Some(proposals) = prepared.get(id) else {
            return 0;
        };

        let mut stored = 0;
        for proposal in proposals.iter().skip(1).take(self.config.max_alternatives) {
            let mut alternative = proposal.clone();
            alternative.rebase(versions);
            match self
                .store
                .propose(alternative.to_recommendation(RecommendationStatus::Proposed))
            {
                Ok(ack) if ack.is_committed() => stored += 1,
                Ok(_) => warn!(violation = %id, "alternative skipped after a concurrent change"),
                Err(e) => warn!(violation = %id, "alternative not stored: {}", e),
            }
        }
        stored
    }
}

fn context_outcome(error: ContextError) -> ViolationOutcome {
    match error {
        ContextError::ContextTooLarge { count, cap } => {
            ViolationOutcome::ContextTooLarge { count, cap }
        }
        ContextError::ElementNotFound(id) => ViolationOutcome::NotFound {
            message: format!("element {}", id),
        },
        ContextError::ClauseNotFound(id) => ViolationOutcome::NotFound {
            message: format!("clause {}", id),
        },
        ContextError::Graph(message) => ViolationOutcome::Failed { message },
    }
}

fn fail_all(group: &Proposal, message: String) -> Vec<(ViolationId, ViolationOutcome)> {
    group
        .violation_ids
        .iter()
        .map(|id| {
            let outcome = ViolationOutcome::Failed {
                message: message.clone(),
            };
            (id.clone(), outcome)
        })
        .collect()
}

//! Bounded-hop context expansion

use crate::{ContextConfig, ContextError};
use recomm_domain::traits::{GraphAccess, Neighborhood};
use recomm_domain::{Context, Element, ElementId, Neighbor, Relation, Violation};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use std::sync::Arc;
use tracing::{debug, warn};

/// Builds violation contexts from a graph snapshot
///
/// Expansion is a breadth-first walk from the violated element. At each node
/// the allowed relations are followed in `(relation_type, target id)` order
/// and already visited elements are skipped, so each neighbor keeps its
/// minimum hop distance and the same graph always yields the same context.
pub struct ContextBuilder<G> {
    graph: Arc<G>,
    config: ContextConfig,
}

fn graph_error<E: Display>(e: E) -> ContextError {
    ContextError::Graph(e.to_string())
}

impl<G> ContextBuilder<G>
where
    G: GraphAccess,
    G::Error: Display,
{
    /// Create a builder over a shared graph
    pub fn new(graph: Arc<G>, config: ContextConfig) -> Self {
        Self { graph, config }
    }

    /// Get the configuration
    pub fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Build the context for a violation with the configured hop limit
    pub fn build(&self, violation: &Violation) -> Result<Context, ContextError> {
        self.build_with_hops(violation, self.config.hop_limit)
    }

    /// Build the context for a violation with an explicit hop limit
    pub fn build_with_hops(
        &self,
        violation: &Violation,
        hop_limit: u32,
    ) -> Result<Context, ContextError> {
        let neighborhood = self
            .graph
            .fetch_neighborhood(
                &violation.element_id,
                &violation.clause_id,
                &self.config.relation_types,
                hop_limit,
                self.config.include_history,
            )
            .map_err(graph_error)?
            .ok_or_else(|| ContextError::ElementNotFound(violation.element_id.clone()))?;
        let Neighborhood {
            element,
            clause,
            neighbors: reachable,
            recommendations: prior_recommendations,
        } = neighborhood;
        let clause =
            clause.ok_or_else(|| ContextError::ClauseNotFound(violation.clause_id.clone()))?;

        let reachable: BTreeMap<ElementId, Element> = reachable
            .into_iter()
            .map(|element| (element.id.clone(), element))
            .collect();
        let neighbors = self.expand(&element, &reachable, hop_limit)?;

        debug!(
            violation = %violation.id,
            neighbors = neighbors.len(),
            prior = prior_recommendations.len(),
            hops = hop_limit,
            "context built"
        );

        Ok(Context {
            violation: violation.clone(),
            element,
            clause,
            neighbors,
            prior_recommendations,
            hop_radius: hop_limit,
        })
    }

    /// Ordered walk over elements already read from the graph
    fn expand(
        &self,
        root: &Element,
        reachable: &BTreeMap<ElementId, Element>,
        hop_limit: u32,
    ) -> Result<Vec<Neighbor>, ContextError> {
        let cap = self.config.max_nodes;
        if cap == 0 {
            return Err(ContextError::ContextTooLarge { count: 1, cap });
        }

        let mut visited: BTreeSet<ElementId> = BTreeSet::from([root.id.clone()]);
        let mut neighbors: Vec<Neighbor> = Vec::new();
        let mut frontier: Vec<Element> = vec![root.clone()];

        for hop in 1..=hop_limit {
            let mut next = Vec::new();
            for node in &frontier {
                let mut relations: Vec<&Relation> =
                    node.relations_of(&self.config.relation_types).collect();
                relations.sort_by(|a, b| {
                    (a.relation_type, &a.target).cmp(&(b.relation_type, &b.target))
                });

                for relation in relations {
                    if !visited.insert(relation.target.clone()) {
                        continue;
                    }
                    let Some(element) = reachable.get(&relation.target).cloned() else {
                        warn!(element = %relation.target, "relation points at a missing element");
                        continue;
                    };

                    let count = 1 + neighbors.len() + 1;
                    if count > cap {
                        return Err(ContextError::ContextTooLarge { count, cap });
                    }
                    neighbors.push(Neighbor {
                        element: element.clone(),
                        hops: hop,
                        via: relation.relation_type,
                    });
                    next.push(element);
                }
            }
            if next.is_empty() {
                break;
            }
            frontier = next;
        }

        neighbors.sort_by(|a, b| {
            a.hops
                .cmp(&b.hops)
                .then_with(|| a.element.id.cmp(&b.element.id))
        });
        Ok(neighbors)
    }
}

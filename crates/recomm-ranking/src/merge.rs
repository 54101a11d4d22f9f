//! Cross-violation aggregation

use crate::proposal::sort_changes;
use crate::{MergeConfig, Proposal, RankingError};
use recomm_domain::{ElementId, PropertyValue, ViolationId};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Whether two proposals agree on every change they share
///
/// Changes are compared per `(element, property)`. Numbers match within the
/// configured tolerance; text and booleans must be identical.
pub fn compatible(a: &Proposal, b: &Proposal, config: &MergeConfig) -> bool {
    first_incompatibility(a, b, config).is_none()
}

fn first_incompatibility(
    a: &Proposal,
    b: &Proposal,
    config: &MergeConfig,
) -> Option<(ElementId, String)> {
    a.changes.iter().find_map(|ca| {
        b.changes
            .iter()
            .find(|cb| cb.element == ca.element && cb.property == ca.property)
            .filter(|cb| !values_match(&ca.value, &cb.value, config))
            .map(|_| (ca.element.clone(), ca.property.clone()))
    })
}

fn values_match(a: &PropertyValue, b: &PropertyValue, config: &MergeConfig) -> bool {
    match (a, b) {
        (PropertyValue::Number(x), PropertyValue::Number(y)) => config.numbers_match(*x, *y),
        _ => a == b,
    }
}

/// Content order used to pick which side wins on overlapping entries
fn precedence(a: &Proposal, b: &Proposal) -> Ordering {
    a.violation_ids
        .cmp(&b.violation_ids)
        .then_with(|| a.description().cmp(&b.description()))
        .then_with(|| a.confidence.total_cmp(&b.confidence))
}

fn union<T: Ord + Clone>(a: &[T], b: &[T]) -> Vec<T> {
    a.iter()
        .chain(b.iter())
        .cloned()
        .collect::<BTreeSet<T>>()
        .into_iter()
        .collect()
}

/// Merge two compatible partner proposals into one
///
/// The result covers both proposals' violations. It does not depend on the
/// argument order, and merging a proposal with itself returns it unchanged.
pub fn merge(a: &Proposal, b: &Proposal, config: &MergeConfig) -> Result<Proposal, RankingError> {
    if !a.shares_target(b) {
        return Err(RankingError::NotPartners);
    }
    if let Some((element, property)) = first_incompatibility(a, b, config) {
        return Err(RankingError::Incompatible { element, property });
    }

    // Entries keyed by the same violation or change come from the preceding side
    let (first, second) = match precedence(a, b) {
        Ordering::Greater => (b, a),
        _ => (a, b),
    };

    let violation_ids = union(&first.violation_ids, &second.violation_ids);

    let mut changes = first.changes.clone();
    changes.extend(second.changes.iter().cloned());
    sort_changes(&mut changes);

    let mut descriptions = second.descriptions.clone();
    descriptions.extend(first.descriptions.clone());
    let mut outcomes = second.outcomes.clone();
    outcomes.extend(first.outcomes.clone());

    let conflicts_with: Vec<ViolationId> = union(&first.conflicts_with, &second.conflicts_with)
        .into_iter()
        .filter(|v| violation_ids.binary_search(v).is_err())
        .collect();

    let mut provenance = first.provenance.clone();
    provenance.clause_ids = union(&first.provenance.clause_ids, &second.provenance.clause_ids);
    provenance.hop_radius = first.provenance.hop_radius.max(second.provenance.hop_radius);
    provenance.reasoner = first
        .provenance
        .reasoner
        .split('+')
        .chain(second.provenance.reasoner.split('+'))
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .collect::<Vec<_>>()
        .join("+");
    let mut versions = second.provenance.based_on_versions.clone();
    versions.extend(first.provenance.based_on_versions.clone());
    provenance.based_on_versions = versions;

    Ok(Proposal {
        violation_ids,
        targets: union(&first.targets, &second.targets),
        descriptions,
        changes,
        outcomes,
        confidence: first.confidence.min(second.confidence),
        rank: first.rank.min(second.rank),
        style: first.style.min(second.style),
        conflicts_with,
        provenance,
    })
}

/// Aggregate the top proposals of a batch of violations
///
/// Proposals are visited in violation id order. Each one merges into the
/// first earlier group it is a compatible partner of; every incompatible
/// partner is flagged on both sides through `conflicts_with`.
pub fn aggregate(mut proposals: Vec<Proposal>, config: &MergeConfig) -> Vec<Proposal> {
    let input_count = proposals.len();
    proposals.sort_by(precedence);

    let mut groups: Vec<Proposal> = Vec::with_capacity(proposals.len());
    for proposal in proposals {
        let mut merge_into = None;
        let mut conflicting = Vec::new();

        for (i, group) in groups.iter().enumerate() {
            if !group.shares_target(&proposal) {
                continue;
            }
            if compatible(group, &proposal, config) {
                if config.enabled && merge_into.is_none() {
                    merge_into = Some(i);
                }
            } else {
                conflicting.push(i);
            }
        }

        let own_ids = proposal.violation_ids.clone();
        let index = match merge_into.map(|i| (i, merge(&groups[i], &proposal, config))) {
            Some((i, Ok(merged))) => {
                debug!(
                    group = ?groups[i].violation_ids,
                    violations = ?own_ids,
                    "merged compatible proposals"
                );
                groups[i] = merged;
                i
            }
            _ => {
                groups.push(proposal);
                groups.len() - 1
            }
        };

        for j in conflicting {
            if j == index {
                continue;
            }
            debug!(
                group = ?groups[j].violation_ids,
                violations = ?own_ids,
                "conflicting proposals on a shared element"
            );
            let other_ids = groups[j].violation_ids.clone();
            groups[j].conflicts_with.extend(own_ids.iter().cloned());
            groups[index].conflicts_with.extend(other_ids);
        }
    }

    for group in &mut groups {
        let own = group.violation_ids.clone();
        group.conflicts_with.retain(|v| own.binary_search(v).is_err());
        group.conflicts_with.sort();
        group.conflicts_with.dedup();
    }

    info!(proposals = input_count, groups = groups.len(), "proposals aggregated");
    groups
}

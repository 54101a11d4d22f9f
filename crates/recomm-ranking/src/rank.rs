//! Per-violation ranking

use recomm_domain::{Candidate, Clause};

/// A validated candidate with its position among its violation's candidates
#[derive(Debug, Clone, PartialEq)]
pub struct Ranked {
    /// The candidate
    pub candidate: Candidate,
    /// Distance of the predicted value from the nearest compliant boundary
    pub residual: f64,
    /// Position, starting at 1
    pub rank: u32,
}

/// Order candidates by confidence (descending), residual (ascending), then a
/// canonical content key
///
/// The result does not depend on the order of `candidates`.
pub fn rank(candidates: Vec<Candidate>, clause: &Clause) -> Vec<Ranked> {
    let mut keyed: Vec<(f64, String, Candidate)> = candidates
        .into_iter()
        .map(|c| {
            let residual = clause.predicate.residual(&c.predicted_value);
            (residual, canonical_key(&c), c)
        })
        .collect();

    keyed.sort_by(|(ra, ka, a), (rb, kb, b)| {
        b.confidence
            .total_cmp(&a.confidence)
            .then_with(|| ra.total_cmp(rb))
            .then_with(|| ka.cmp(kb))
    });

    keyed
        .into_iter()
        .enumerate()
        .map(|(i, (residual, _, candidate))| Ranked {
            candidate,
            residual,
            rank: i as u32 + 1,
        })
        .collect()
}

/// Total order over candidate content
fn canonical_key(candidate: &Candidate) -> String {
    let mut targets: Vec<&str> = candidate.targets.iter().map(|t| t.as_str()).collect();
    targets.sort_unstable();

    let mut changes: Vec<String> = candidate
        .changes
        .iter()
        .map(|c| format!("{}.{}={}", c.element, c.property, c.value))
        .collect();
    changes.sort_unstable();

    format!(
        "{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}\u{1f}{}",
        targets.join(","),
        candidate.description,
        candidate.predicted_value,
        candidate.style,
        changes.join(","),
        candidate.reasoning
    )
}

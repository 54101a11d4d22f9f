//! Regulatory clauses and their machine-checkable predicates

use crate::{ClauseId, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a clause as reported by the compliance checker
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Advisory
    Low,
    /// Should be fixed
    Medium,
    /// Must be fixed
    High,
    /// Life safety
    Critical,
}

impl Severity {
    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The comparison a predicate applies to a property value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateRule {
    /// value >= min
    AtLeast {
        /// Inclusive lower bound
        min: f64,
    },
    /// value <= max
    AtMost {
        /// Inclusive upper bound
        max: f64,
    },
    /// min <= value <= max
    Between {
        /// Inclusive lower bound
        min: f64,
        /// Inclusive upper bound
        max: f64,
    },
    /// value == expected
    Equals {
        /// Required value
        expected: PropertyValue,
    },
    /// value is one of the allowed categories
    OneOf {
        /// Allowed categorical values
        allowed: Vec<String>,
    },
}

/// A machine-checkable requirement on one element property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Predicate {
    /// Name of the constrained property (e.g. `width`)
    pub property: String,

    /// Comparison rule
    pub rule: PredicateRule,
}

impl Predicate {
    /// Create a predicate
    pub fn new(property: impl Into<String>, rule: PredicateRule) -> Self {
        Self {
            property: property.into(),
            rule,
        }
    }

    /// Check whether a value satisfies the predicate
    ///
    /// A numeric rule never accepts a non-numeric value.
    pub fn evaluate(&self, value: &PropertyValue) -> bool {
        match &self.rule {
            PredicateRule::AtLeast { min } => value.as_f64().is_some_and(|v| v >= *min),
            PredicateRule::AtMost { max } => value.as_f64().is_some_and(|v| v <= *max),
            PredicateRule::Between { min, max } => {
                value.as_f64().is_some_and(|v| v >= *min && v <= *max)
            }
            PredicateRule::Equals { expected } => values_equal(value, expected),
            PredicateRule::OneOf { allowed } => value
                .as_text()
                .is_some_and(|v| allowed.iter().any(|a| a == v)),
        }
    }

    /// Gap between a value and compliance (0.0 when compliant)
    ///
    /// Categorical rules report 1.0 for any non-compliant value; a numeric rule
    /// applied to a non-numeric value reports infinity.
    pub fn deviation(&self, value: &PropertyValue) -> f64 {
        if self.evaluate(value) {
            return 0.0;
        }
        match (&self.rule, value.as_f64()) {
            (PredicateRule::AtLeast { min }, Some(v)) => min - v,
            (PredicateRule::AtMost { max }, Some(v)) => v - max,
            (PredicateRule::Between { min, max }, Some(v)) => {
                if v < *min {
                    min - v
                } else {
                    v - max
                }
            }
            (PredicateRule::Equals { expected }, Some(v)) => match expected.as_f64() {
                Some(e) => (v - e).abs(),
                None => 1.0,
            },
            (PredicateRule::Equals { .. } | PredicateRule::OneOf { .. }, _) => 1.0,
            (_, None) => f64::INFINITY,
        }
    }

    /// Distance between a value and the nearest boundary of the compliant region
    ///
    /// Used to prefer candidates that close the gap precisely over ones that
    /// overshoot it. Categorical rules report 0.0 when satisfied and 1.0 otherwise.
    pub fn residual(&self, value: &PropertyValue) -> f64 {
        match (&self.rule, value.as_f64()) {
            (PredicateRule::AtLeast { min }, Some(v)) => (v - min).abs(),
            (PredicateRule::AtMost { max }, Some(v)) => (v - max).abs(),
            (PredicateRule::Between { min, max }, Some(v)) => (v - min).abs().min((v - max).abs()),
            (PredicateRule::Equals { expected }, Some(v)) => match expected.as_f64() {
                Some(e) => (v - e).abs(),
                None => 1.0,
            },
            (PredicateRule::Equals { .. } | PredicateRule::OneOf { .. }, _) => {
                if self.evaluate(value) {
                    0.0
                } else {
                    1.0
                }
            }
            (_, None) => f64::INFINITY,
        }
    }

    /// Human-readable requirement, used in prompts
    pub fn describe(&self) -> String {
        match &self.rule {
            PredicateRule::AtLeast { min } => format!("{} >= {}", self.property, min),
            PredicateRule::AtMost { max } => format!("{} <= {}", self.property, max),
            PredicateRule::Between { min, max } => {
                format!("{} <= {} <= {}", min, self.property, max)
            }
            PredicateRule::Equals { expected } => format!("{} == {}", self.property, expected),
            PredicateRule::OneOf { allowed } => {
                format!("{} in [{}]", self.property, allowed.join(", "))
            }
        }
    }
}

fn values_equal(a: &PropertyValue, b: &PropertyValue) -> bool {
    match (a, b) {
        (PropertyValue::Number(x), PropertyValue::Number(y)) => (x - y).abs() <= f64::EPSILON,
        _ => a == b,
    }
}

/// A single regulatory requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// Identifier
    pub id: ClauseId,

    /// Requirement text as written in the regulation
    pub description: String,

    /// Machine-checkable predicate
    pub predicate: Predicate,

    /// Severity of non-compliance
    pub severity: Severity,
}

//! Candidate adaptations proposed by reasoning

use crate::{ElementId, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tone of a proposed adaptation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionStyle {
    /// Conventional fix (resize, relocate, replace)
    #[default]
    Standard,
    /// Less conventional rearrangement of the design
    Creative,
}

impl SuggestionStyle {
    /// Get the style name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionStyle::Standard => "standard",
            SuggestionStyle::Creative => "creative",
        }
    }

    /// Parse a style from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Some(SuggestionStyle::Standard),
            "creative" => Some(SuggestionStyle::Creative),
            _ => None,
        }
    }
}

impl fmt::Display for SuggestionStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single property change on one element
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyChange {
    /// Element being changed
    pub element: ElementId,
    /// Property being changed
    pub property: String,
    /// Value after the change
    pub value: PropertyValue,
}

/// An unvalidated proposed fix produced by a reasoner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Elements the adaptation touches
    pub targets: Vec<ElementId>,

    /// What to change, in a sentence or two
    pub description: String,

    /// Predicted post-change value of the violated property
    pub predicted_value: PropertyValue,

    /// Reasoner confidence in [0.0, 1.0]
    pub confidence: f64,

    /// Standard or creative
    pub style: SuggestionStyle,

    /// Every property change the adaptation implies, including the primary one
    pub changes: Vec<PropertyChange>,

    /// Justification referencing context nodes
    pub reasoning: String,
}

impl Candidate {
    /// Change applied to a given element property, if any
    pub fn change_for(&self, element: &ElementId, property: &str) -> Option<&PropertyChange> {
        self.changes
            .iter()
            .find(|c| &c.element == element && c.property == property)
    }

    /// Key identifying semantically identical candidates
    pub fn dedup_key(&self) -> String {
        let mut targets: Vec<&str> = self.targets.iter().map(|t| t.as_str()).collect();
        targets.sort_unstable();
        format!(
            "{}|{}|{}",
            targets.join(","),
            self.predicted_value,
            self.description.trim().to_lowercase()
        )
    }
}

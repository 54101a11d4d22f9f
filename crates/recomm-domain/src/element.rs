//! Building elements and the typed relations between them

use crate::ElementId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A typed property value on an element
///
/// Quantities are stored as plain numbers in the unit the upstream model uses
/// (metres for lengths, square metres for areas).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Boolean flag (e.g. `is_load_bearing`)
    Bool(bool),
    /// Numeric quantity
    Number(f64),
    /// Categorical or free text value
    Text(String),
}

impl PropertyValue {
    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Text view of the value, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Short type tag used in prompts and storage
    pub fn kind(&self) -> &'static str {
        match self {
            PropertyValue::Bool(_) => "bool",
            PropertyValue::Number(_) => "number",
            PropertyValue::Text(_) => "text",
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            PropertyValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Number(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Text(value.to_string())
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Bool(value)
    }
}

/// Type of relation between two elements
///
/// These are the five relation labels produced by upstream model ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    /// Elements share a boundary (wall next to space)
    Adjacent,
    /// One element spatially contains the other (space contains door)
    Contained,
    /// One element structurally supports the other (column supports slab)
    Supports,
    /// Elements are connected by an accessible path (door opens into corridor)
    Accessible,
    /// Elements are locationally aligned (stacked walls)
    Aligned,
}

/// Coarse category of a relation type, used to configure context allow-lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationCategory {
    /// Load paths
    Structural,
    /// Adjacency, accessibility and alignment
    Spatial,
    /// Containment hierarchy
    Containment,
}

impl RelationType {
    /// All relation types in canonical order
    pub const ALL: [RelationType; 5] = [
        RelationType::Adjacent,
        RelationType::Contained,
        RelationType::Supports,
        RelationType::Accessible,
        RelationType::Aligned,
    ];

    /// Storage label of the relation
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationType::Adjacent => "ADJACENT",
            RelationType::Contained => "CONTAINED",
            RelationType::Supports => "SUPPORTS",
            RelationType::Accessible => "ACCESSIBLE",
            RelationType::Aligned => "ALIGNED",
        }
    }

    /// Parse a storage label
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ADJACENT" => Some(RelationType::Adjacent),
            "CONTAINED" => Some(RelationType::Contained),
            "SUPPORTS" => Some(RelationType::Supports),
            "ACCESSIBLE" => Some(RelationType::Accessible),
            "ALIGNED" => Some(RelationType::Aligned),
            _ => None,
        }
    }

    /// Map an ingestion edge-file stem (e.g. `e-structural_support`) to a relation type
    pub fn from_edge_file_stem(stem: &str) -> Option<Self> {
        match stem {
            "e-adjacent_connectivity" => Some(RelationType::Adjacent),
            "e-spatial_containment" => Some(RelationType::Contained),
            "e-structural_support" => Some(RelationType::Supports),
            "e-accessible_connectivity" => Some(RelationType::Accessible),
            "e-locational_alignment" => Some(RelationType::Aligned),
            _ => None,
        }
    }

    /// Category this relation belongs to
    pub fn category(&self) -> RelationCategory {
        match self {
            RelationType::Supports => RelationCategory::Structural,
            RelationType::Contained => RelationCategory::Containment,
            RelationType::Adjacent | RelationType::Accessible | RelationType::Aligned => {
                RelationCategory::Spatial
            }
        }
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of a relation as seen from the element that holds it
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// This element is the source of the edge
    Outgoing,
    /// This element is the target of the edge
    Incoming,
}

/// A directed, typed relation from one element to another
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Relation {
    /// Type of relation
    pub relation_type: RelationType,
    /// The element on the other end
    pub target: ElementId,
    /// Whether the edge points away from or towards the holding element
    pub direction: Direction,
}

/// A building-model entity
///
/// Elements are created by upstream ingestion and are immutable for the
/// duration of a reasoning session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    /// Stable identifier
    pub id: ElementId,

    /// Type tag (wall, door, space, corridor, stair, slab, column, ...)
    pub element_type: String,

    /// Geometric and quantitative properties
    pub properties: BTreeMap<String, PropertyValue>,

    /// Relations to other elements, sorted
    pub relations: Vec<Relation>,
}

impl Element {
    /// Create an element with no properties or relations
    pub fn new(id: impl Into<ElementId>, element_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            element_type: element_type.into(),
            properties: BTreeMap::new(),
            relations: Vec::new(),
        }
    }

    /// Builder-style property setter
    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    /// Numeric property lookup
    pub fn number(&self, name: &str) -> Option<f64> {
        self.property(name).and_then(PropertyValue::as_f64)
    }

    /// Relations whose type is in `allowed`, in sorted order
    pub fn relations_of<'a>(
        &'a self,
        allowed: &'a [RelationType],
    ) -> impl Iterator<Item = &'a Relation> + 'a {
        self.relations
            .iter()
            .filter(move |r| allowed.contains(&r.relation_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_value_untagged_json() {
        let v: PropertyValue = serde_json::from_str("1.25").unwrap();
        assert_eq!(v, PropertyValue::Number(1.25));
        let v: PropertyValue = serde_json::from_str("\"fire_door\"").unwrap();
        assert_eq!(v, PropertyValue::Text("fire_door".to_string()));
        let v: PropertyValue = serde_json::from_str("true").unwrap();
        assert_eq!(v, PropertyValue::Bool(true));
    }

    #[test]
    fn test_relation_labels_round_trip() {
        for rt in RelationType::ALL {
            assert_eq!(RelationType::parse(rt.as_str()), Some(rt));
        }
        assert_eq!(RelationType::parse("unknown"), None);
    }

    #[test]
    fn test_edge_file_stems() {
        assert_eq!(
            RelationType::from_edge_file_stem("e-structural_support"),
            Some(RelationType::Supports)
        );
        assert_eq!(RelationType::from_edge_file_stem("e-mystery"), None);
    }

    #[test]
    fn test_categories() {
        assert_eq!(RelationType::Supports.category(), RelationCategory::Structural);
        assert_eq!(RelationType::Contained.category(), RelationCategory::Containment);
        assert_eq!(RelationType::Aligned.category(), RelationCategory::Spatial);
    }

    #[test]
    fn test_element_builder() {
        let e = Element::new("corridor-1", "corridor").with_property("width", 0.9);
        assert_eq!(e.number("width"), Some(0.9));
        assert!(e.property("height").is_none());
    }
}

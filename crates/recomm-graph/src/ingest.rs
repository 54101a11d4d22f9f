//! Loading the building model and the compliance feed
//!
//! The model directory holds one `v-<type>.json` file per element type (an
//! object of element id → property object) and one `e-<group>.json` file per
//! relation group (an object of group name → list of `[from, to]` pairs, or a
//! bare list of pairs). Unknown edge files are skipped with a warning.

use crate::{GraphError, SqliteGraph};
use recomm_domain::{
    Clause, ClauseId, Element, ElementId, PropertyValue, RelationType, Severity, Violation,
    ViolationId,
};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

/// Elements and edges parsed from a model directory
#[derive(Debug, Clone, Default)]
pub struct GraphData {
    /// Elements sorted by id
    pub elements: Vec<Element>,
    /// Deduplicated `(from, to, type)` edges
    pub relations: Vec<(ElementId, ElementId, RelationType)>,
    /// Files that were ignored
    pub skipped_files: Vec<String>,
}

/// Summary of one ingestion run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Elements written
    pub elements: usize,
    /// Relations written
    pub relations: usize,
    /// Violations written
    pub violations: usize,
    /// Records skipped
    pub skipped: usize,
    /// The stored model already matched and nothing was rewritten
    pub unchanged: bool,
}

/// One entry of the compliance feed
#[derive(Debug, Clone, Deserialize)]
pub struct ViolationRecord {
    /// Violation id
    pub id: String,
    /// Offending element
    pub element_id: String,
    /// Violated clause
    pub clause_id: String,
    /// Measured value
    pub measured: PropertyValue,
    /// Required value or threshold
    pub required: PropertyValue,
    /// Severity label
    pub severity: String,
    /// Other elements the checker implicated
    #[serde(default)]
    pub related_elements: Vec<String>,
}

impl ViolationRecord {
    /// Number of elements the checker implicated, including the offending one
    pub fn element_count(&self) -> usize {
        1 + self.related_elements.len()
    }

    /// Convert to a freshly opened violation
    pub fn into_violation(self) -> Result<Violation, GraphError> {
        let severity = Severity::parse(&self.severity).ok_or_else(|| {
            GraphError::InvalidData(format!("{}: unknown severity {}", self.id, self.severity))
        })?;
        Ok(Violation::open(
            ViolationId::new(self.id),
            ElementId::new(self.element_id),
            ClauseId::new(self.clause_id),
            self.measured,
            self.required,
            severity,
        ))
    }
}

fn json_to_property(value: &Value) -> Option<PropertyValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        Value::Number(n) => n.as_f64().map(PropertyValue::Number),
        Value::String(s) => Some(PropertyValue::Text(s.clone())),
        Value::Array(_) | Value::Object(_) => Some(PropertyValue::Text(value.to_string())),
    }
}

fn parse_pairs(value: &Value, file: &str) -> Result<Vec<(String, String)>, GraphError> {
    let mut pairs = Vec::new();
    let groups: Vec<&Value> = match value {
        Value::Object(map) => map.values().collect(),
        Value::Array(_) => vec![value],
        _ => {
            return Err(GraphError::InvalidData(format!(
                "{}: expected an object or array",
                file
            )))
        }
    };
    for group in groups {
        let Value::Array(items) = group else {
            return Err(GraphError::InvalidData(format!("{}: group is not a list", file)));
        };
        for item in items {
            match item.as_array().map(|a| a.as_slice()) {
                Some([Value::String(from), Value::String(to)]) => {
                    pairs.push((from.clone(), to.clone()))
                }
                _ => {
                    return Err(GraphError::InvalidData(format!(
                        "{}: edge is not a [from, to] pair: {}",
                        file, item
                    )))
                }
            }
        }
    }
    Ok(pairs)
}

/// Parse a model directory into elements and edges
pub fn load_graph_dir(dir: impl AsRef<Path>) -> Result<GraphData, GraphError> {
    let dir = dir.as_ref();
    let mut paths: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut elements: BTreeMap<ElementId, Element> = BTreeMap::new();
    let mut relations = Vec::new();
    let mut skipped_files = Vec::new();

    for path in paths {
        let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
            continue;
        };
        let file = path.display().to_string();

        if let Some(element_type) = stem.strip_prefix("v-") {
            let value: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
            let Value::Object(nodes) = value else {
                return Err(GraphError::InvalidData(format!("{}: expected an object", file)));
            };
            for (id, props) in nodes {
                let mut element = Element::new(id.as_str(), element_type);
                if let Value::Object(props) = props {
                    for (name, value) in &props {
                        if let Some(value) = json_to_property(value) {
                            element.properties.insert(name.clone(), value);
                        }
                    }
                }
                if elements.insert(element.id.clone(), element).is_some() {
                    return Err(GraphError::Duplicate(id));
                }
            }
            debug!(file = %file, "loaded element file");
        } else if stem.starts_with("e-") {
            let Some(relation_type) = RelationType::from_edge_file_stem(&stem) else {
                warn!(file = %file, "unknown edge file, skipping");
                skipped_files.push(file);
                continue;
            };
            let value: Value = serde_json::from_str(&fs::read_to_string(&path)?)?;
            for (from, to) in parse_pairs(&value, &file)? {
                relations.push((ElementId::new(from), ElementId::new(to), relation_type));
            }
            debug!(file = %file, relation = %relation_type, "loaded edge file");
        } else {
            skipped_files.push(file);
        }
    }

    relations.sort();
    relations.dedup();

    Ok(GraphData {
        elements: elements.into_values().collect(),
        relations,
        skipped_files,
    })
}

/// Read a JSON array of violation records
pub fn load_violations(path: impl AsRef<Path>) -> Result<Vec<ViolationRecord>, GraphError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Read a JSON array of clauses
pub fn load_clauses(path: impl AsRef<Path>) -> Result<Vec<Clause>, GraphError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

impl SqliteGraph {
    /// Replace the stored model with `data`
    ///
    /// Skipped when the stored element and relation counts already match,
    /// unless `force` is set.
    pub fn ingest(&self, data: &GraphData, force: bool) -> Result<IngestReport, GraphError> {
        let expected = (data.elements.len(), data.relations.len());
        if !force && self.counts()? == expected {
            info!(
                elements = expected.0,
                relations = expected.1,
                "stored model matches, skipping rebuild"
            );
            return Ok(IngestReport {
                unchanged: true,
                ..Default::default()
            });
        }

        self.clear_model()?;
        self.insert_batch(&data.elements, &data.relations)?;
        info!(
            elements = expected.0,
            relations = expected.1,
            "model ingested"
        );
        Ok(IngestReport {
            elements: expected.0,
            relations: expected.1,
            skipped: data.skipped_files.len(),
            ..Default::default()
        })
    }

    /// Insert open violations from the feed
    ///
    /// Records implicating more than `max_elements` elements and ids that are
    /// already stored are skipped.
    pub fn ingest_violations(
        &self,
        records: Vec<ViolationRecord>,
        max_elements: usize,
    ) -> Result<IngestReport, GraphError> {
        let mut report = IngestReport::default();
        for record in records {
            if record.element_count() > max_elements {
                warn!(
                    violation = %record.id,
                    elements = record.element_count(),
                    "too many elements, skipping"
                );
                report.skipped += 1;
                continue;
            }
            let violation = record.into_violation()?;
            match self.insert_violation(&violation) {
                Ok(()) => report.violations += 1,
                Err(GraphError::Duplicate(id)) => {
                    debug!(violation = %id, "already stored");
                    report.skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_to_property() {
        assert_eq!(
            json_to_property(&serde_json::json!(1.5)),
            Some(PropertyValue::Number(1.5))
        );
        assert_eq!(json_to_property(&Value::Null), None);
        assert_eq!(
            json_to_property(&serde_json::json!([1, 2])),
            Some(PropertyValue::Text("[1,2]".to_string()))
        );
    }

    #[test]
    fn test_parse_pairs_accepts_groups_and_lists() {
        let grouped = serde_json::json!({"level_0": [["A", "B"]], "level_1": [["B", "C"]]});
        assert_eq!(parse_pairs(&grouped, "f").unwrap().len(), 2);

        let flat = serde_json::json!([["A", "B"]]);
        assert_eq!(parse_pairs(&flat, "f").unwrap(), vec![("A".into(), "B".into())]);

        let bad = serde_json::json!([["A"]]);
        assert!(parse_pairs(&bad, "f").is_err());
    }

    #[test]
    fn test_record_severity() {
        let record: ViolationRecord = serde_json::from_value(serde_json::json!({
            "id": "V1", "element_id": "E1", "clause_id": "C1",
            "measured": 0.9, "required": 1.2, "severity": "moderate"
        }))
        .unwrap();
        assert_eq!(record.element_count(), 1);
        assert_eq!(record.into_violation().unwrap().severity, Severity::Medium);
    }
}

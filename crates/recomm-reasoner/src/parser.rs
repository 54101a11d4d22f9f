//! Parse LLM output into schema-valid candidates

use recomm_domain::{Candidate, Context, ElementId, PropertyChange, PropertyValue, SuggestionStyle};
use serde_json::Value;
use std::collections::HashSet;
use tracing::warn;

/// Candidates kept from one response and how many items were discarded
#[derive(Debug, Clone, Default)]
pub struct ParsedResponse {
    /// Schema-valid, deduplicated candidates in response order
    pub candidates: Vec<Candidate>,
    /// Items that failed the schema or were duplicates
    pub discarded: usize,
}

/// Parse an LLM response into at most `k` candidates
///
/// Invalid items are dropped, never repaired. A response that is not JSON at
/// all yields no candidates.
pub fn parse_response(
    response: &str,
    context: &Context,
    k: usize,
    standard_suggestions: usize,
    max_description_len: usize,
) -> ParsedResponse {
    let mut parsed = ParsedResponse::default();

    let json: Value = match serde_json::from_str(&extract_json(response)) {
        Ok(json) => json,
        Err(e) => {
            warn!(violation = %context.violation.id, "unparseable response: {}", e);
            parsed.discarded = 1;
            return parsed;
        }
    };

    let items = match &json {
        Value::Array(items) => items.as_slice(),
        Value::Object(obj) => match obj.get("suggestions").or_else(|| obj.get("candidates")) {
            Some(Value::Array(items)) => items.as_slice(),
            _ => std::slice::from_ref(&json),
        },
        _ => {
            parsed.discarded = 1;
            return parsed;
        }
    };

    let mut seen = HashSet::new();
    for (idx, item) in items.iter().enumerate() {
        let default_style = if idx < standard_suggestions {
            SuggestionStyle::Standard
        } else {
            SuggestionStyle::Creative
        };
        match parse_candidate_json(item, context, default_style, max_description_len) {
            Ok(candidate) => {
                if !seen.insert(candidate.dedup_key()) {
                    parsed.discarded += 1;
                    continue;
                }
                parsed.candidates.push(candidate);
            }
            Err(e) => {
                warn!(violation = %context.violation.id, "Discarding candidate {}: {}", idx, e);
                parsed.discarded += 1;
            }
        }
    }

    if parsed.candidates.len() > k {
        parsed.discarded += parsed.candidates.len() - k;
        parsed.candidates.truncate(k);
    }
    parsed
}

/// Extract JSON from response, handling markdown code blocks
fn extract_json(response: &str) -> String {
    let trimmed = response.trim();

    if trimmed.starts_with("```") {
        let lines: Vec<&str> = trimmed.lines().collect();
        let end = if lines.last().is_some_and(|l| l.trim() == "```") && lines.len() > 1 {
            lines.len() - 1
        } else {
            lines.len()
        };
        lines[1.min(end)..end].join("\n")
    } else {
        trimmed.to_string()
    }
}

fn json_to_value(json: &Value) -> Option<PropertyValue> {
    match json {
        Value::Number(n) => n.as_f64().filter(|f| f.is_finite()).map(PropertyValue::Number),
        Value::String(s) => Some(PropertyValue::Text(s.clone())),
        Value::Bool(b) => Some(PropertyValue::Bool(*b)),
        _ => None,
    }
}

/// Parse and schema-check a single candidate
fn parse_candidate_json(
    json: &Value,
    context: &Context,
    default_style: SuggestionStyle,
    max_description_len: usize,
) -> Result<Candidate, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Candidate is not a JSON object".to_string())?;

    let targets = obj
        .get("targets")
        .and_then(|v| v.as_array())
        .ok_or_else(|| "Missing or invalid 'targets'".to_string())?
        .iter()
        .map(|t| t.as_str().map(ElementId::new))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| "'targets' must be strings".to_string())?;
    if targets.is_empty() {
        return Err("'targets' is empty".to_string());
    }
    if let Some(unknown) = targets.iter().find(|t| !context.contains(t)) {
        return Err(format!("target {} is not in the context", unknown));
    }

    let description = obj
        .get("description")
        .and_then(|v| v.as_str())
        .map(str::trim)
        .ok_or_else(|| "Missing or invalid 'description'".to_string())?
        .to_string();
    if description.is_empty() {
        return Err("'description' is empty".to_string());
    }
    if description.chars().count() > max_description_len {
        return Err(format!(
            "'description' exceeds {} characters",
            max_description_len
        ));
    }

    let predicted_value = obj
        .get("predicted_value")
        .and_then(json_to_value)
        .ok_or_else(|| "Missing or invalid 'predicted_value'".to_string())?;

    let confidence = obj
        .get("confidence")
        .and_then(|v| v.as_f64())
        .ok_or_else(|| "Missing or invalid 'confidence'".to_string())?;
    if !(0.0..=1.0).contains(&confidence) {
        return Err(format!("confidence {} outside [0, 1]", confidence));
    }

    let style = match obj.get("style") {
        None | Some(Value::Null) => default_style,
        Some(Value::String(s)) => {
            SuggestionStyle::parse(s).ok_or_else(|| format!("unknown style '{}'", s))?
        }
        Some(_) => return Err("Invalid 'style'".to_string()),
    };

    let mut changes = match obj.get("changes") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(parse_change)
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => return Err("Invalid 'changes'".to_string()),
    };

    // The primary change on the violated property is always present
    let primary_element = &context.element.id;
    let primary_property = &context.clause.predicate.property;
    let primary_agrees = changes
        .iter()
        .find(|c| &c.element == primary_element && &c.property == primary_property)
        .map(|c| c.value == predicted_value);
    match primary_agrees {
        Some(false) => {
            return Err("primary change disagrees with 'predicted_value'".to_string());
        }
        Some(true) => {}
        None => changes.push(PropertyChange {
            element: primary_element.clone(),
            property: primary_property.clone(),
            value: predicted_value.clone(),
        }),
    }

    let reasoning = obj
        .get("reasoning")
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string();

    Ok(Candidate {
        targets,
        description,
        predicted_value,
        confidence,
        style,
        changes,
        reasoning,
    })
}

fn parse_change(json: &Value) -> Result<PropertyChange, String> {
    let obj = json
        .as_object()
        .ok_or_else(|| "Change is not a JSON object".to_string())?;
    let element = obj
        .get("element")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Change is missing 'element'".to_string())?;
    let property = obj
        .get("property")
        .and_then(|v| v.as_str())
        .ok_or_else(|| "Change is missing 'property'".to_string())?;
    let value = obj
        .get("value")
        .and_then(json_to_value)
        .ok_or_else(|| "Change is missing 'value'".to_string())?;
    Ok(PropertyChange {
        element: ElementId::new(element),
        property: property.to_string(),
        value,
    })
}

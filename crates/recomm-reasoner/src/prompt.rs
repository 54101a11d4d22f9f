//! LLM prompt engineering for adaptation suggestions

use recomm_domain::{Context, Element};

/// Builds prompts asking the LLM for candidate adaptations
pub struct PromptBuilder<'a> {
    context: &'a Context,
    total: usize,
    standard: usize,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder for one context
    pub fn new(context: &'a Context) -> Self {
        Self {
            context,
            total: 5,
            standard: 3,
        }
    }

    /// Set how many suggestions to ask for and how many of them are standard
    pub fn with_counts(mut self, total: usize, standard: usize) -> Self {
        self.total = total;
        self.standard = standard.min(total);
        self
    }

    /// Build the complete prompt
    pub fn build(&self) -> String {
        let context = self.context;
        let violation = &context.violation;
        let clause = &context.clause;
        let mut prompt = String::new();

        prompt.push_str(SUGGESTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str("Compliance issue:\n");
        prompt.push_str(&format!("- violation: {}\n", violation.id));
        prompt.push_str(&format!("- clause {}: {}\n", clause.id, clause.description));
        prompt.push_str(&format!("- requirement: {}\n", clause.predicate.describe()));
        prompt.push_str(&format!(
            "- measured {} = {}, required {}\n",
            clause.predicate.property, violation.measured, violation.required
        ));
        prompt.push_str(&format!("- severity: {}\n\n", violation.severity));

        prompt.push_str("Violating element:\n");
        prompt.push_str(&format!("- {}\n\n", describe_element(&context.element)));

        if !context.neighbors.is_empty() {
            prompt.push_str(&format!(
                "Related elements (within {} hops):\n",
                context.hop_radius
            ));
            for neighbor in &context.neighbors {
                prompt.push_str(&format!(
                    "- {} [{} hop(s) via {}]\n",
                    describe_element(&neighbor.element),
                    neighbor.hops,
                    neighbor.via
                ));
            }
            prompt.push('\n');
        }

        if !context.prior_recommendations.is_empty() {
            prompt.push_str("Earlier recommendations for this element (do not repeat rejected ones):\n");
            for prior in &context.prior_recommendations {
                prompt.push_str(&format!("- [{}] {}\n", prior.status, prior.description));
            }
            prompt.push('\n');
        }

        prompt.push_str(&self.count_rules());
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    fn count_rules(&self) -> String {
        let creative = self.total - self.standard;
        let mut rules = format!("Produce exactly {} suggestions. ", self.total);
        if self.standard > 0 && creative > 0 {
            rules.push_str(&format!(
                "Mark the first {} with style \"standard\" and the remaining {} with style \"creative\".",
                self.standard, creative
            ));
        } else if self.standard > 0 {
            rules.push_str("Mark every suggestion with style \"standard\".");
        } else {
            rules.push_str("Mark every suggestion with style \"creative\".");
        }
        rules
    }
}

fn describe_element(element: &Element) -> String {
    let properties: Vec<String> = element
        .properties
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    if properties.is_empty() {
        format!("{} ({})", element.id, element.element_type)
    } else {
        format!(
            "{} ({}): {}",
            element.id,
            element.element_type,
            properties.join(", ")
        )
    }
}

/// Output schema passed to structured generation
pub const CANDIDATE_SCHEMA: &str = r#"{
  "type": "object",
  "required": ["suggestions"],
  "properties": {
    "suggestions": {
      "type": "array",
      "items": {
        "type": "object",
        "required": ["targets", "description", "predicted_value", "confidence", "style"],
        "properties": {
          "targets": {"type": "array", "items": {"type": "string"}, "minItems": 1},
          "description": {"type": "string"},
          "predicted_value": {"type": ["number", "string", "boolean"]},
          "confidence": {"type": "number", "minimum": 0, "maximum": 1},
          "style": {"enum": ["standard", "creative"]},
          "changes": {
            "type": "array",
            "items": {
              "type": "object",
              "required": ["element", "property", "value"],
              "properties": {
                "element": {"type": "string"},
                "property": {"type": "string"},
                "value": {"type": ["number", "string", "boolean"]}
              }
            }
          },
          "reasoning": {"type": "string"}
        }
      }
    }
  }
}"#;

const SUGGESTION_INSTRUCTIONS: &str = r#"You are an expert building design assistant resolving building code compliance issues.
Propose concrete design adaptations that make the violating element satisfy the requirement.

Rules:
- Only reference element ids listed below; never invent ids
- "targets" lists every element the adaptation modifies
- "predicted_value" is the value of the constrained property after the change
- "changes" lists every property change as {"element", "property", "value"}
- Keep "description" to one or two sentences
- Tie "reasoning" to the listed properties and relations
- Respect structural roles: do not weaken or move load-bearing elements unless the change accounts for it
- Set "confidence" in [0, 1] to reflect how likely the change is feasible"#;

const OUTPUT_FORMAT_REMINDER: &str = r#"Output format (JSON only, no additional text):
{
  "suggestions": [
    {
      "targets": ["element-id"],
      "description": "what to change",
      "predicted_value": 1.25,
      "confidence": 0.0-1.0,
      "style": "standard",
      "changes": [{"element": "element-id", "property": "width", "value": 1.25}],
      "reasoning": "why it works"
    }
  ]
}

Remember: Return ONLY valid JSON, no markdown code blocks, no explanations."#;

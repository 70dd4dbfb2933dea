//! Prompt templates for specialist agents

use crate::agent::DomainKnowledge;
use crate::core::string::truncate;
use serde_json::Value;

/// Longest serialized data block placed in a prompt
const MAX_DATA_CHARS: usize = 6_000;

/// Values substituted into an agent prompt template
#[derive(Debug, Clone, Default)]
pub struct PromptVars<'a> {
    pub domain: &'a str,
    pub description: &'a str,
    pub query: &'a str,
    pub facts: &'a [String],
    pub data: Option<&'a Value>,
    pub filters: Option<&'a Value>,
}

/// Templates for generating specialist prompts
pub struct PromptTemplate;

impl PromptTemplate {
    /// Template used when a domain does not bring its own
    pub fn default_agent_template() -> &'static str {
        r#"You are the {domain} specialist of a business analytics team.
{description}

Known facts about this domain:
{facts}

Filters extracted from the question:
{filters}

Data retrieved for this question:
{data}

Question: {query}

Answer using only the data above. Quote concrete figures and dates. If the data does not contain the answer, say that no data was found."#
    }

    /// System prompt for response generation
    pub fn system(style: &str) -> &'static str {
        match style {
            "detailed" => {
                r#"You are a careful business analyst. Give a complete answer: the headline figure first, then a breakdown, then any notable trend. Never invent numbers."#
            }
            _ => {
                r#"You are a careful business analyst. Answer in two or three sentences, headline figure first. Never invent numbers."#
            }
        }
    }

    /// Fill the `{domain}`, `{description}`, `{query}`, `{facts}`, `{data}`
    /// and `{filters}` placeholders
    pub fn render(template: &str, vars: &PromptVars<'_>) -> String {
        template
            .replace("{domain}", vars.domain)
            .replace("{description}", vars.description)
            .replace("{facts}", &Self::bullet_list(vars.facts))
            .replace("{filters}", &Self::format_value(vars.filters))
            .replace("{data}", &Self::format_value(vars.data))
            .replace("{query}", vars.query)
    }

    /// Render the prompt of a domain for a query
    pub fn for_domain(
        knowledge: &DomainKnowledge,
        query: &str,
        data: Option<&Value>,
        filters: Option<&Value>,
    ) -> String {
        Self::render(
            &knowledge.prompt_template,
            &PromptVars {
                domain: &knowledge.display_name,
                description: &knowledge.description,
                query,
                facts: &knowledge.facts,
                data,
                filters,
            },
        )
    }

    fn bullet_list(items: &[String]) -> String {
        if items.is_empty() {
            return "(none)".to_string();
        }
        items
            .iter()
            .map(|f| format!("- {}", f))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_value(value: Option<&Value>) -> String {
        match value {
            None | Some(Value::Null) => "(none)".to_string(),
            Some(value) => {
                let json = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                truncate(&json, MAX_DATA_CHARS)
            }
        }
    }

    /// Answer built from static knowledge and loaded data only, without text
    /// generation
    pub fn local_analysis(knowledge: &DomainKnowledge, query: &str, data: Option<&Value>) -> String {
        let mut out = format!(
            "Local {} analysis for \"{}\".",
            knowledge.display_name.to_lowercase(),
            query.trim()
        );

        let figures = data.map(headline_fields).unwrap_or_default();
        if figures.is_empty() {
            out.push_str(" No live figures were available.");
        } else {
            out.push_str(" Available figures: ");
            out.push_str(&figures.join(", "));
            out.push('.');
        }

        if let Some(fact) = knowledge.facts.first() {
            out.push(' ');
            out.push_str(fact);
        }
        out
    }

    /// Answer of the basic agent when no specialist is relevant
    pub fn basic_analysis(query: &str, catalog: &[DomainKnowledge]) -> String {
        let areas = catalog
            .iter()
            .map(|k| k.display_name.to_lowercase())
            .collect::<Vec<_>>()
            .join(", ");
        if query.trim().is_empty() {
            return format!(
                "The question is empty. Ask about one of these business areas: {}.",
                areas
            );
        }
        format!(
            "The question \"{}\" did not match any business area. Available areas: {}. Try naming the records you are interested in, for example orders or shipments, and a time period.",
            query.trim(),
            areas
        )
    }
}

/// `name: value` pairs of the numeric and string scalars at the top two levels
fn headline_fields(data: &Value) -> Vec<String> {
    let mut fields = Vec::new();
    let Value::Object(map) = data else {
        return fields;
    };
    for (key, value) in map {
        match value {
            Value::Number(n) => fields.push(format!("{}: {}", key, n)),
            Value::Object(inner) if key != "previous" && !key.starts_with('_') => {
                for (inner_key, inner_value) in inner {
                    if let Value::Number(n) = inner_value {
                        fields.push(format!("{}: {}", inner_key, n));
                    }
                }
            }
            _ => {}
        }
    }
    fields.truncate(8);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DomainTag, builtin_knowledge};
    use serde_json::json;

    #[test]
    fn test_render_fills_placeholders() {
        let knowledge = builtin_knowledge(&DomainTag::Orders).unwrap();
        let data = json!({"total_orders": 42});
        let prompt = PromptTemplate::for_domain(&knowledge, "How many orders?", Some(&data), None);
        assert!(prompt.contains("Orders specialist"));
        assert!(prompt.contains("Question: How many orders?"));
        assert!(prompt.contains("\"total_orders\": 42"));
        assert!(prompt.contains("- An order must be placed"));
        assert!(!prompt.contains("{data}"));
        assert!(!prompt.contains("{filters}"));
    }

    #[test]
    fn test_missing_values_render_as_none() {
        let prompt = PromptTemplate::render(
            "{facts} | {data}",
            &PromptVars {
                query: "q",
                ..Default::default()
            },
        );
        assert_eq!(prompt, "(none) | (none)");
    }

    #[test]
    fn test_local_analysis_uses_data_and_facts() {
        let knowledge = builtin_knowledge(&DomainTag::Orders).unwrap();
        let data = json!({"summary": {"total_orders": 42, "revenue": 1000}, "previous": {"total_orders": 1}});
        let text = PromptTemplate::local_analysis(&knowledge, "orders this week", Some(&data));
        assert!(text.starts_with("Local orders analysis"));
        assert!(text.contains("total_orders: 42"));
        assert!(!text.contains("total_orders: 1,"));
        assert!(text.contains(&knowledge.facts[0]));

        let empty = PromptTemplate::local_analysis(&knowledge, "orders", None);
        assert!(empty.contains("No live figures"));
    }

    #[test]
    fn test_basic_analysis_lists_areas() {
        let catalog = crate::agent::builtin_catalog();
        let text = PromptTemplate::basic_analysis("what's the weather", &catalog);
        assert!(text.contains("did not match"));
        assert!(text.contains("shipments"));
        assert!(PromptTemplate::basic_analysis(" ", &catalog).contains("empty"));
    }

    #[test]
    fn test_system_styles() {
        assert!(PromptTemplate::system("detailed").contains("breakdown"));
        assert!(PromptTemplate::system("anything").contains("two or three"));
    }
}

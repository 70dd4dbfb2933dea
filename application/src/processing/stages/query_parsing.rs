//! `query_parsing` stage: turns the question text into filters.

use crate::processing::envelope;
use crate::processing::stage::{ProcessingStage, StageArgs, StageContext, StageError};
use async_trait::async_trait;
use insight_domain::{QueryFilters, StageName, StageOutput};
use serde_json::{Value, json};
use tracing::debug;

/// Related business terms added by semantic parsing
const SYNONYMS: &[(&str, &[&str])] = &[
    ("revenue", &["sales", "income"]),
    ("sale", &["revenue"]),
    ("income", &["revenue"]),
    ("shipment", &["shipping", "dispatch"]),
    ("shipping", &["shipment"]),
    ("delivery", &["arrival"]),
    ("late", &["delayed", "overdue"]),
    ("delayed", &["late"]),
    ("customer", &["client", "buyer"]),
    ("client", &["customer"]),
    ("stock", &["inventory"]),
    ("inventory", &["stock"]),
    ("order", &["purchase"]),
    ("profit", &["margin"]),
];

pub struct QueryParsingStage;

impl QueryParsingStage {
    fn parse(&self, args: &StageArgs, ctx: &StageContext) -> Result<StageOutput, StageError> {
        let query = envelope::str_field(&args.input, envelope::QUERY)
            .or_else(|| args.input.as_str())
            .ok_or_else(|| StageError::InvalidInput("no query text in input".to_string()))?;

        let mut filters = QueryFilters::parse(query, ctx.today);
        if args.flag("semantic") {
            expand_terms(&mut filters.terms);
        }

        let filters_value =
            serde_json::to_value(&filters).map_err(|e| StageError::Failed(e.to_string()))?;

        if !filters.is_answerable() {
            debug!(run_id = %ctx.run_id, "Query has no content words, stopping chain");
            let output = envelope::extend(
                &args.input,
                [
                    (envelope::QUERY, json!(query)),
                    (envelope::FILTERS, filters_value),
                    (
                        envelope::STOPPED,
                        json!("The question does not name anything that can be looked up"),
                    ),
                ],
            );
            return Ok(StageOutput::stop(output));
        }

        Ok(StageOutput::new(envelope::extend(
            &args.input,
            [
                (envelope::QUERY, json!(query)),
                (envelope::FILTERS, filters_value),
            ],
        )))
    }
}

fn expand_terms(terms: &mut Vec<String>) {
    let mut extra = Vec::new();
    for term in terms.iter() {
        let singular = term.strip_suffix('s').unwrap_or(term);
        for (key, related) in SYNONYMS {
            if *key == term || *key == singular {
                extra.extend(related.iter().map(|r| r.to_string()));
            }
        }
    }
    for word in extra {
        if !terms.contains(&word) {
            terms.push(word);
        }
    }
}

#[async_trait]
impl ProcessingStage for QueryParsingStage {
    fn name(&self) -> StageName {
        StageName::QueryParsing
    }

    fn methods(&self) -> &'static [&'static str] {
        &["parse"]
    }

    async fn invoke(
        &self,
        method: &str,
        args: StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        match method {
            "parse" => self.parse(&args, ctx),
            other => Err(self.unknown_method(other)),
        }
    }
}

/// Filters a previous parse step left in the payload
pub fn filters_from(value: Option<&Value>) -> QueryFilters {
    value
        .and_then(|v| serde_json::from_value(v.clone()).ok())
        .unwrap_or_default()
}

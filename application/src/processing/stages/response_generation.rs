//! `response_generation` stage: prompts the text generator for an answer.

use crate::config::OrchestrationParams;
use crate::ports::text_generator::{CompletionOptions, TextGenerator, complete_with_deadline};
use crate::processing::envelope;
use crate::processing::stage::{ProcessingStage, StageArgs, StageContext, StageError};
use async_trait::async_trait;
use insight_domain::core::score::round2;
use insight_domain::prompt::PromptVars;
use insight_domain::{DomainKnowledge, PromptTemplate, StageName, StageOutput};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Hint when the answer is grounded in loaded data but the context was not scored
const DATA_HINT: f64 = 0.75;
/// Hint when no data was loaded
const NO_DATA_HINT: f64 = 0.5;

pub struct ResponseGenerationStage {
    generator: Arc<dyn TextGenerator>,
    completion_timeout: Duration,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl ResponseGenerationStage {
    pub fn new(generator: Arc<dyn TextGenerator>, params: &OrchestrationParams) -> Self {
        Self {
            generator,
            completion_timeout: params.completion_timeout,
            temperature: params.temperature,
            max_tokens: params.max_tokens,
        }
    }

    async fn generate(
        &self,
        args: &StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        let query = args
            .arg(envelope::QUERY)
            .and_then(Value::as_str)
            .ok_or_else(|| StageError::InvalidInput("query must be a string".to_string()))?;
        let knowledge: Option<DomainKnowledge> = args
            .arg(envelope::KNOWLEDGE)
            .map(|v| serde_json::from_value(v.clone()))
            .transpose()
            .map_err(|e| StageError::InvalidInput(format!("knowledge: {}", e)))?;
        let data = args.arg(envelope::DATA);
        let filters = args.arg(envelope::FILTERS);

        let prompt = match &knowledge {
            Some(knowledge) => PromptTemplate::for_domain(knowledge, query, data, filters),
            None => PromptTemplate::render(
                PromptTemplate::default_agent_template(),
                &PromptVars {
                    domain: "Business",
                    query,
                    data,
                    filters,
                    ..Default::default()
                },
            ),
        };

        let style = args.param_str("style").unwrap_or("concise");
        let options = CompletionOptions::new(ctx.bounded(self.completion_timeout))
            .with_system_prompt(PromptTemplate::system(style))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let text = tokio::select! {
            biased;
            _ = ctx.cancellation.cancelled() => return Err(StageError::Cancelled),
            result = complete_with_deadline(self.generator.as_ref(), &prompt, &options) => result?,
        };

        let hint = confidence_hint(data, args.arg(envelope::INTELLIGENCE));
        let domain = knowledge
            .as_ref()
            .map(|k| k.display_name.to_lowercase())
            .unwrap_or_else(|| "business".to_string());
        let reasoning = if data.is_some() {
            format!(
                "Generated by {} from loaded {} data",
                self.generator.name(),
                domain
            )
        } else {
            format!(
                "Generated by {} without live {} data",
                self.generator.name(),
                domain
            )
        };

        debug!(run_id = %ctx.run_id, chars = text.len(), "Generated response");
        Ok(StageOutput::new(envelope::extend(
            &args.input,
            [
                (envelope::RESPONSE, json!(text.trim())),
                (envelope::CONFIDENCE_HINT, json!(hint)),
                (envelope::REASONING, json!(reasoning)),
            ],
        )))
    }
}

fn confidence_hint(data: Option<&Value>, intelligence: Option<&Value>) -> f64 {
    let scored = intelligence
        .and_then(|i| i.get("overall"))
        .and_then(Value::as_f64);
    match (scored, data) {
        (Some(overall), _) => round2(0.4 + 0.5 * overall.clamp(0.0, 1.0)),
        (None, Some(_)) => DATA_HINT,
        (None, None) => NO_DATA_HINT,
    }
}

#[async_trait]
impl ProcessingStage for ResponseGenerationStage {
    fn name(&self) -> StageName {
        StageName::ResponseGeneration
    }

    fn methods(&self) -> &'static [&'static str] {
        &["generate"]
    }

    async fn invoke(
        &self,
        method: &str,
        args: StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        match method {
            "generate" => self.generate(&args, ctx).await,
            other => Err(self.unknown_method(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::text_generator::GenerationError;
    use crate::processing::stages::test_context;
    use insight_domain::{DomainTag, builtin_knowledge};
    use serde_json::Map;
    use std::sync::Mutex;

    /// Records the prompt and system prompt it was called with
    struct Recording {
        calls: Mutex<Vec<(String, Option<String>)>>,
    }

    #[async_trait]
    impl TextGenerator for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        async fn complete(
            &self,
            prompt: &str,
            options: &CompletionOptions,
        ) -> Result<String, GenerationError> {
            self.calls
                .lock()
                .unwrap()
                .push((prompt.to_string(), options.system_prompt.clone()));
            Ok(" There were 42 orders. ".to_string())
        }
    }

    fn named(with_data: bool) -> Map<String, Value> {
        let knowledge = builtin_knowledge(&DomainTag::Orders).unwrap();
        let mut named = Map::new();
        named.insert("query".to_string(), json!("How many orders?"));
        named.insert(
            "knowledge".to_string(),
            serde_json::to_value(knowledge).unwrap(),
        );
        if with_data {
            named.insert("data".to_string(), json!({"order_count": 42}));
        }
        named
    }

    #[tokio::test]
    async fn test_generate_builds_domain_prompt() {
        let generator = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
        });
        let stage = ResponseGenerationStage::new(generator.clone(), &OrchestrationParams::default());
        let args = StageArgs::new(json!({"query": "How many orders?"})).with_named(named(true));

        let out = stage.invoke("generate", args, &test_context()).await.unwrap();
        assert_eq!(out.value["response"], "There were 42 orders.");
        assert_eq!(out.value["confidence_hint"], DATA_HINT);

        let calls = generator.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].0.contains("\"order_count\": 42"));
        assert!(calls[0].1.as_deref().unwrap().contains("two or three"));
    }

    #[tokio::test]
    async fn test_detailed_style_and_no_data_hint() {
        let generator = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
        });
        let stage = ResponseGenerationStage::new(generator.clone(), &OrchestrationParams::default());
        let mut params = Map::new();
        params.insert("style".to_string(), json!("detailed"));
        let args = StageArgs::new(json!({}))
            .with_named(named(false))
            .with_params(params);

        let out = stage.invoke("generate", args, &test_context()).await.unwrap();
        assert_eq!(out.value["confidence_hint"], NO_DATA_HINT);
        let calls = generator.calls.lock().unwrap();
        assert!(calls[0].1.as_deref().unwrap().contains("breakdown"));
    }

    #[test]
    fn test_scored_context_drives_hint() {
        let intelligence = json!({"overall": 1.0});
        assert_eq!(confidence_hint(None, Some(&intelligence)), 0.9);
        assert_eq!(confidence_hint(Some(&json!({})), None), DATA_HINT);
    }

    #[tokio::test]
    async fn test_cancelled_before_completion() {
        let generator = Arc::new(Recording {
            calls: Mutex::new(Vec::new()),
        });
        let stage = ResponseGenerationStage::new(generator, &OrchestrationParams::default());
        let ctx = test_context();
        ctx.cancellation.cancel();
        let args = StageArgs::new(json!({})).with_named(named(true));
        let err = stage.invoke("generate", args, &ctx).await.unwrap_err();
        assert!(matches!(err, StageError::Cancelled));
    }
}

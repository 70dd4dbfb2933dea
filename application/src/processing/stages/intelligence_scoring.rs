//! `intelligence_scoring` stage: context quality and answer assessment.

use crate::processing::envelope;
use crate::processing::stage::{ProcessingStage, StageArgs, StageContext, StageError};
use async_trait::async_trait;
use insight_domain::enrichment::{assess_response, score_context};
use insight_domain::{DomainKnowledge, StageName, StageOutput};
use serde_json::Value;

pub struct IntelligenceScoringStage;

impl IntelligenceScoringStage {
    fn knowledge(args: &StageArgs) -> Result<DomainKnowledge, StageError> {
        let value = args
            .arg(envelope::KNOWLEDGE)
            .ok_or_else(|| StageError::InvalidInput("knowledge is required".to_string()))?;
        serde_json::from_value(value.clone())
            .map_err(|e| StageError::InvalidInput(format!("knowledge: {}", e)))
    }

    fn score(&self, args: &StageArgs, ctx: &StageContext) -> Result<StageOutput, StageError> {
        let knowledge = Self::knowledge(args)?;
        let data = args.arg(envelope::DATA).cloned().unwrap_or(Value::Null);
        let matched = match args.arg(envelope::MATCHED_KEYWORDS) {
            Some(Value::Array(items)) => items.len(),
            Some(Value::Number(n)) => n.as_u64().unwrap_or(0) as usize,
            _ => 0,
        };

        let score = score_context(&data, &knowledge.key_metrics, matched, ctx.today);
        let value = serde_json::to_value(score).map_err(|e| StageError::Failed(e.to_string()))?;
        Ok(StageOutput::new(envelope::extend(
            &args.input,
            [(envelope::INTELLIGENCE, value)],
        )))
    }

    fn assess(&self, args: &StageArgs) -> Result<StageOutput, StageError> {
        let knowledge = Self::knowledge(args)?;
        let text = args
            .arg(envelope::RESPONSE)
            .and_then(Value::as_str)
            .ok_or_else(|| StageError::InvalidInput("response must be a string".to_string()))?;

        let assessment = assess_response(text, &knowledge.keywords);
        let value =
            serde_json::to_value(assessment).map_err(|e| StageError::Failed(e.to_string()))?;
        Ok(StageOutput::new(envelope::extend(
            &args.input,
            [(envelope::ASSESSMENT, value)],
        )))
    }
}

#[async_trait]
impl ProcessingStage for IntelligenceScoringStage {
    fn name(&self) -> StageName {
        StageName::IntelligenceScoring
    }

    fn methods(&self) -> &'static [&'static str] {
        &["score", "assess_response"]
    }

    async fn invoke(
        &self,
        method: &str,
        args: StageArgs,
        ctx: &StageContext,
    ) -> Result<StageOutput, StageError> {
        match method {
            "score" => self.score(&args, ctx),
            "assess_response" => self.assess(&args),
            other => Err(self.unknown_method(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::stages::test_context;
    use insight_domain::{DomainTag, builtin_knowledge};
    use serde_json::{Map, json};

    fn knowledge_value() -> Value {
        serde_json::to_value(builtin_knowledge(&DomainTag::Orders).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_score_attaches_intelligence() {
        let mut named = Map::new();
        named.insert("knowledge".to_string(), knowledge_value());
        named.insert("data".to_string(), json!({"order_count": 10}));
        named.insert("matched_keywords".to_string(), json!(["order", "revenue", "purchase"]));
        let args = StageArgs::new(json!({"query": "q"})).with_named(named);

        let out = IntelligenceScoringStage
            .invoke("score", args, &test_context())
            .await
            .unwrap();
        let intelligence = &out.value["intelligence"];
        assert_eq!(intelligence["keyword_coverage"], 1.0);
        assert!(intelligence["overall"].as_f64().unwrap() > 0.0);
        assert_eq!(out.value["query"], "q");
    }

    #[tokio::test]
    async fn test_score_without_data_is_empty() {
        let mut named = Map::new();
        named.insert("knowledge".to_string(), knowledge_value());
        let args = StageArgs::new(json!({})).with_named(named);
        let out = IntelligenceScoringStage
            .invoke("score", args, &test_context())
            .await
            .unwrap();
        assert_eq!(out.value["intelligence"]["overall"], 0.0);
    }

    #[tokio::test]
    async fn test_assess_response() {
        let mut named = Map::new();
        named.insert("knowledge".to_string(), knowledge_value());
        named.insert(
            "response".to_string(),
            json!("There were 120 orders on 2024-05-30, up 5%."),
        );
        let args = StageArgs::new(json!({})).with_named(named);
        let out = IntelligenceScoringStage
            .invoke("assess_response", args, &test_context())
            .await
            .unwrap();
        assert_eq!(out.value["assessment"]["specificity"], 1.0);
    }

    #[tokio::test]
    async fn test_invalid_knowledge() {
        let mut named = Map::new();
        named.insert("knowledge".to_string(), json!("orders"));
        let args = StageArgs::new(json!({})).with_named(named);
        let err = IntelligenceScoringStage
            .invoke("score", args, &test_context())
            .await
            .unwrap_err();
        assert!(matches!(err, StageError::InvalidInput(_)));
    }
}

//! LLM-backed strategy
//!
//! Delegates prompt rendering to a domain `PromptBuilder`, sends the prompt
//! to a `TextModel` and parses the structured reply.

use super::parser::parse_decision;
use super::{PromptBuilder, Strategy};
use crate::paper::Position;
use crate::model::TextModel;
use crate::types::{to_percent, MarketSnapshot, PortfolioSummary, TradeAction, TradeDecision};
use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, error};

pub struct LlmStrategy {
    model: Box<dyn TextModel>,
    prompts: Box<dyn PromptBuilder>,
    name: String,
    min_confidence: Decimal,
}

impl LlmStrategy {
    pub fn new(
        model: Box<dyn TextModel>,
        prompts: Box<dyn PromptBuilder>,
        model_id: &str,
        min_confidence: Decimal,
    ) -> Self {
        Self {
            model,
            prompts,
            name: format!("LLM Strategy ({})", model_id),
            min_confidence,
        }
    }

    pub fn min_confidence(&self) -> Decimal {
        self.min_confidence
    }

    /// Downgrade a low-confidence BUY to PASS
    fn apply_confidence_gate(&self, decision: TradeDecision) -> TradeDecision {
        if decision.action == TradeAction::Buy && decision.confidence < self.min_confidence {
            return TradeDecision::pass(format!(
                "Confidence {}% below threshold {}%",
                as_percent(decision.confidence),
                as_percent(self.min_confidence)
            ));
        }
        decision
    }
}

fn as_percent(value: Decimal) -> Decimal {
    to_percent(value).round().normalize()
}

#[async_trait]
impl Strategy for LlmStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    async fn analyze(
        &self,
        snapshot: &MarketSnapshot,
        summary: &PortfolioSummary,
        existing: Option<&Position>,
    ) -> TradeDecision {
        let prompt = self.prompts.build_analysis_prompt(snapshot, summary, existing);
        debug!("Prompt for {} ({} chars)", snapshot.slug, prompt.len());

        match self.model.complete(&prompt).await {
            Ok(response) => self.apply_confidence_gate(parse_decision(&response, snapshot)),
            Err(e) => {
                error!("LLM strategy error: {}", e);
                TradeDecision::pass(format!("Error: {}", e))
            }
        }
    }
}

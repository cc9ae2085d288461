//! Language model access
//!
//! Strategies only see the `TextModel` trait: prompt in, free text out.

mod llm;
#[cfg(test)]
mod tests;

pub use llm::{LlmModel, LlmProvider};

use crate::error::Result;
use async_trait::async_trait;

/// Text-completion service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Send a single user prompt and return the model's reply
    async fn complete(&self, prompt: &str) -> Result<String>;
}

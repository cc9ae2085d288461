//! Tests for model module

#[cfg(test)]
mod tests {
    use super::super::llm::{LlmModel, LlmProvider};
    use super::super::{MockTextModel, TextModel};
    use crate::config::LlmConfig;
    use crate::error::BotError;

    #[test]
    fn test_openrouter_endpoint() {
        let provider = LlmProvider::OpenRouter {
            api_key: "sk-or".to_string(),
            model: "anthropic/claude-3.5-sonnet".to_string(),
        };
        assert_eq!(provider.endpoint(), "https://openrouter.ai/api/v1/chat/completions");
        assert_eq!(provider.api_key(), Some("sk-or"));
        assert_eq!(provider.model(), "anthropic/claude-3.5-sonnet");
    }

    #[test]
    fn test_compatible_endpoint_trims_slash() {
        let provider = LlmProvider::Compatible {
            api_key: None,
            model: "llama3".to_string(),
            base_url: "http://localhost:11434/v1/".to_string(),
        };
        assert_eq!(provider.endpoint(), "http://localhost:11434/v1/chat/completions");
        assert!(provider.api_key().is_none());
    }

    #[test]
    fn test_empty_key_not_sent() {
        let provider = LlmProvider::OpenAI {
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
        };
        assert!(provider.api_key().is_none());
    }

    #[test]
    fn test_new_builds_client() {
        let model = LlmModel::openrouter("sk-or".to_string(), "m".to_string())
            .unwrap()
            .with_params(0.1, 64);
        assert_eq!(model.provider().model(), "m");
        assert_eq!(model.provider().api_key(), Some("sk-or"));
    }

    #[test]
    fn test_from_config_default_is_openrouter() {
        let config = LlmConfig {
            api_key: "sk-or".to_string(),
            ..Default::default()
        };
        let model = LlmModel::from_config(&config).unwrap();
        match model.provider() {
            LlmProvider::OpenRouter { api_key, model } => {
                assert_eq!(api_key, "sk-or");
                assert_eq!(model, "anthropic/claude-3.5-sonnet");
            }
            other => panic!("Expected OpenRouter provider, got {:?}", other),
        }
    }

    #[test]
    fn test_from_config_openai_default_base() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            api_key: "sk".to_string(),
            model: "gpt-4o".to_string(),
            ..Default::default()
        };
        let model = LlmModel::from_config(&config).unwrap();
        assert_eq!(
            model.provider().endpoint(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[test]
    fn test_from_config_compatible_requires_base_url() {
        let config = LlmConfig {
            provider: "ollama".to_string(),
            ..Default::default()
        };
        assert!(matches!(LlmModel::from_config(&config), Err(BotError::Config(_))));
    }

    #[test]
    fn test_from_config_unknown_provider() {
        let config = LlmConfig {
            provider: "carrier-pigeon".to_string(),
            ..Default::default()
        };
        assert!(matches!(LlmModel::from_config(&config), Err(BotError::Config(_))));
    }

    #[tokio::test]
    async fn test_mock_text_model() {
        let mut mock = MockTextModel::new();
        mock.expect_complete()
            .withf(|prompt| prompt.contains("ACTION"))
            .times(1)
            .returning(|_| Ok("ACTION: PASS".to_string()));

        let reply = mock.complete("Return ACTION").await.unwrap();
        assert_eq!(reply, "ACTION: PASS");
    }
}

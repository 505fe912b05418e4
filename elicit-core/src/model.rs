use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The generative text service boundary. Implementations return raw
/// text (or a transport error) and guarantee nothing about structure;
/// all parsing and validation happens on the caller's side.
#[async_trait]
pub trait TextModel: Send + Sync {
    fn name(&self) -> &str;
    async fn generate(&self, req: GenerateRequest) -> Result<String>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub config: GenerateConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateConfig {
    pub temperature: f32,
    pub max_output_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self { model: model.into(), prompt: prompt.into(), config: GenerateConfig::default() }
    }

    /// Set the declared response shape for structured output.
    pub fn with_response_schema(mut self, schema: Value) -> Self {
        self.config.response_schema = Some(schema);
        self
    }

    pub fn with_config(mut self, config: GenerateConfig) -> Self {
        self.config = config;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_generate_request_creation() {
        let req = GenerateRequest::new("test-model", "hello");
        assert_eq!(req.model, "test-model");
        assert_eq!(req.config.temperature, 0.0);
        assert!(req.config.response_schema.is_none());
    }

    #[test]
    fn test_generate_request_with_response_schema() {
        let schema = json!({"type": "object"});
        let req = GenerateRequest::new("test-model", "hello").with_response_schema(schema.clone());
        assert_eq!(req.config.response_schema, Some(schema));
    }

    #[test]
    fn test_generate_config_default_is_deterministic() {
        let config = GenerateConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert!(config.seed.is_none());
    }
}

use async_trait::async_trait;
use elicit_core::{ElicitError, GenerateRequest, Result, TextModel};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
enum ScriptedReply {
    Text(String),
    TransportError(String),
}

/// A [`TextModel`] that plays back a scripted sequence of replies and
/// records every request it receives, so tests can assert on prompts
/// and pinned generation settings.
pub struct ScriptedModel {
    name: String,
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Arc<Mutex<Vec<GenerateRequest>>>,
}

impl ScriptedModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    #[must_use]
    pub fn with_text(self, raw: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(ScriptedReply::Text(raw.into()));
        self
    }

    #[must_use]
    pub fn with_json(self, value: serde_json::Value) -> Self {
        self.with_text(value.to_string())
    }

    #[must_use]
    pub fn with_transport_error(self, message: impl Into<String>) -> Self {
        self.replies.lock().unwrap().push_back(ScriptedReply::TransportError(message.into()));
        self
    }

    /// Shared handle to the recorded requests; stays usable after the
    /// model has been moved into a client.
    pub fn request_log(&self) -> Arc<Mutex<Vec<GenerateRequest>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, req: GenerateRequest) -> Result<String> {
        self.requests.lock().unwrap().push(req);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(ScriptedReply::Text(raw)) => Ok(raw),
            Some(ScriptedReply::TransportError(message)) => Err(ElicitError::Model(message)),
            None => Err(ElicitError::Model("scripted model has no reply left".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn plays_replies_in_order() {
        let model = ScriptedModel::new("mock").with_text("first").with_text("second");
        let req = GenerateRequest::new("m", "p");
        assert_eq!(model.generate(req.clone()).await.unwrap(), "first");
        assert_eq!(model.generate(req.clone()).await.unwrap(), "second");
        assert!(model.generate(req).await.is_err());
    }

    #[tokio::test]
    async fn records_requests() {
        let model = ScriptedModel::new("mock").with_text("ok");
        let log = model.request_log();
        model.generate(GenerateRequest::new("m", "the prompt")).await.unwrap();
        assert_eq!(log.lock().unwrap()[0].prompt, "the prompt");
    }

    #[tokio::test]
    async fn scripted_transport_error_surfaces_as_model_error() {
        let model = ScriptedModel::new("mock").with_transport_error("HTTP 503");
        let err = model.generate(GenerateRequest::new("m", "p")).await.unwrap_err();
        assert!(matches!(err, ElicitError::Model(_)));
    }
}

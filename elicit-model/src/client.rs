use crate::outputs::{StageOutput, StageRole, decode_stage_output};
use crate::prompts::{PromptTemplates, render};
use crate::retry::{RetryConfig, is_transient_error};
use elicit_core::{
    CompilerConfig, ElicitError, GenerateConfig, GenerateRequest, Result, TextModel,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::{debug, warn};

/// Configuration for the stage client. Temperature is not part of it:
/// every request goes out pinned to 0.0 so that identical inputs
/// reproduce identical stage output.
#[derive(Debug, Clone)]
pub struct StageClientConfig {
    pub model: String,
    pub retry: RetryConfig,
    pub max_output_tokens: Option<i32>,
    pub seed: Option<u64>,
}

impl StageClientConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            retry: RetryConfig::default(),
            max_output_tokens: None,
            seed: None,
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Capability-typed adapter over a [`TextModel`]. Renders the role's
/// template, issues the call, and decodes the response strictly as the
/// role's declared shape.
///
/// Transient transport failures and structurally invalid responses
/// both consume attempts from the same bounded budget; only transport
/// failures sleep before the next attempt, invalid responses go
/// straight back out as a fresh generation. Exhausting the budget, or
/// the overall deadline, surfaces `CompilationFailed` with the attempt
/// count. An invalid response is never "repaired" locally.
pub struct StageClient {
    model: Arc<dyn TextModel>,
    templates: PromptTemplates,
    config: StageClientConfig,
}

impl StageClient {
    pub fn new(
        model: Arc<dyn TextModel>,
        templates: PromptTemplates,
        config: StageClientConfig,
    ) -> Self {
        Self { model, templates, config }
    }

    pub fn template_version(&self) -> &str {
        &self.templates.version
    }

    /// The configuration recorded on snapshots produced from this
    /// client's compilation output.
    pub fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            model: self.config.model.clone(),
            template_version: self.templates.version.clone(),
            temperature: 0.0,
            seed: self.config.seed,
        }
    }

    pub async fn invoke(
        &self,
        role: StageRole,
        vars: &HashMap<&str, String>,
    ) -> Result<StageOutput> {
        let prompt = render(self.templates.for_role(role), vars)?;
        let attempts = AtomicU32::new(0);

        let loop_fut = self.attempt_loop(role, &prompt, &attempts);
        match self.config.retry.overall_timeout {
            Some(deadline) => match tokio::time::timeout(deadline, loop_fut).await {
                Ok(result) => result,
                Err(_) => Err(ElicitError::CompilationFailed {
                    attempts: attempts.load(Ordering::SeqCst),
                    message: format!("{role} call exceeded the overall deadline"),
                }),
            },
            None => loop_fut.await,
        }
    }

    async fn attempt_loop(
        &self,
        role: StageRole,
        prompt: &str,
        attempts: &AtomicU32,
    ) -> Result<StageOutput> {
        let retry = &self.config.retry;
        let mut delay = retry.initial_delay;

        loop {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            debug!(role = %role, attempt, "invoking generative stage");

            let request = GenerateRequest {
                model: self.config.model.clone(),
                prompt: prompt.to_string(),
                config: GenerateConfig {
                    temperature: 0.0,
                    max_output_tokens: self.config.max_output_tokens,
                    seed: self.config.seed,
                    response_schema: Some(role.response_schema()),
                },
            };

            let failure = match self.model.generate(request).await {
                Ok(raw) => match decode_stage_output(role, &raw) {
                    Ok(output) => return Ok(output),
                    // A fresh generation attempt, never a parse fallback.
                    Err(error) => error,
                },
                Err(error) if is_transient_error(&error) => {
                    if attempt >= retry.max_attempts {
                        return Err(Self::exhausted(role, attempt, &error));
                    }
                    warn!(
                        role = %role,
                        attempt,
                        max_attempts = retry.max_attempts,
                        delay_ms = delay.as_millis(),
                        error = %error,
                        "transient transport failure; backing off"
                    );
                    tokio::time::sleep(delay).await;
                    delay = retry.next_delay(delay);
                    continue;
                }
                Err(error) => return Err(Self::exhausted(role, attempt, &error)),
            };

            if attempt >= retry.max_attempts {
                return Err(Self::exhausted(role, attempt, &failure));
            }
            warn!(
                role = %role,
                attempt,
                max_attempts = retry.max_attempts,
                error = %failure,
                "structurally invalid response; regenerating"
            );
        }
    }

    fn exhausted(role: StageRole, attempts: u32, error: &ElicitError) -> ElicitError {
        ElicitError::CompilationFailed {
            attempts,
            message: format!("{role} stage failed: {error}"),
        }
    }
}

//! # elicit-model
//!
//! The generative stage client for the elicit requirements engine.
//!
//! Four fixed prompt roles (gap-analysis, question-generation,
//! compilation, validation) share one adapter, [`StageClient`], over
//! the [`elicit_core::TextModel`] boundary. The adapter renders the
//! role's template, pins temperature to zero, and decodes the raw
//! response strictly into the role's declared shape — structured
//! output is all-or-nothing, with no partial acceptance.
//!
//! Transient transport failures retry with bounded exponential
//! backoff; structurally invalid responses consume attempts as fresh
//! generations. Both paths share one overall deadline.

pub mod client;
pub mod mock;
pub mod outputs;
pub mod prompts;
pub mod retry;

pub use client::{StageClient, StageClientConfig};
pub use mock::ScriptedModel;
pub use outputs::{
    CompilationOutput, FindingItem, GapAnalysisOutput, GapItem, QuestionGenerationOutput,
    QuestionItem, SemanticFindingKind, StageOutput, StageRole, ValidationOutput,
    decode_stage_output,
};
pub use prompts::{PromptTemplates, render};
pub use retry::{RetryConfig, is_transient_error, is_transient_message};

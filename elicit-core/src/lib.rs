//! # elicit-core
//!
//! Core types and traits for the elicit requirements engine.
//!
//! This crate provides the shared foundation:
//!
//! - The data model: [`Question`], [`Answer`], [`CompiledSnapshot`],
//!   [`Issue`], and the provenance [`Trace`]
//! - [`TextModel`] - the generative text service boundary
//! - [`ElicitError`] / [`Result`] - unified error handling
//!
//! Answers form per-question supersede chains and compiled snapshots
//! form an append-only per-project history; both are modeled here as
//! plain immutable records. The store and engine crates enforce the
//! chain and append-only invariants.

pub mod error;
pub mod model;
pub mod types;

pub use error::{ElicitError, Result, SchemaViolation};
pub use model::{GenerateConfig, GenerateRequest, TextModel};
pub use types::{
    Answer, AnswerValue, ChangeKind, CompiledSnapshot, CompilerConfig, Gap, Issue, IssueKind,
    PathChange, Project, Question, QuestionDraft, QuestionKind, QuestionStatus, Severity, Trace,
    TraceSource,
};

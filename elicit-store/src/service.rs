use async_trait::async_trait;
use elicit_core::{
    Answer, AnswerValue, CompiledSnapshot, Issue, Project, Question, QuestionDraft, QuestionStatus,
    Result,
};
use std::collections::HashMap;

/// The version chain store: per-question answer history (supersede
/// chains) and per-project compiled-output history (append-only log).
///
/// Implementations must guarantee that `append_snapshot` writes the
/// snapshot, its trace/derived_from payload, and its issue batch
/// atomically, and that answers and snapshots are never mutated or
/// deleted once written.
#[async_trait]
pub trait ChainStore: Send + Sync {
    async fn create_project(&self, name: &str) -> Result<Project>;
    async fn get_project(&self, project_id: &str) -> Result<Project>;

    /// Persist drafts as new questions with `Unanswered` status.
    /// Choice-kind drafts must carry a non-empty option set.
    async fn insert_questions(
        &self,
        project_id: &str,
        drafts: Vec<QuestionDraft>,
    ) -> Result<Vec<Question>>;

    async fn questions(&self, project_id: &str) -> Result<Vec<Question>>;
    async fn get_question(&self, question_id: &str) -> Result<Question>;
    async fn set_question_status(&self, question_id: &str, status: QuestionStatus) -> Result<()>;

    /// For every question with at least one answer, the single
    /// highest-version answer. No question ever has two entries.
    async fn current_answers(&self, project_id: &str) -> Result<HashMap<String, Answer>>;

    /// Append to the question's supersede chain, compare-and-swap
    /// style: `expected_version` is the chain head version the caller
    /// read (0 when the question is unanswered). A mismatch means a
    /// concurrent writer advanced the chain and yields `InvalidState`;
    /// the caller re-reads and retries the logical operation itself.
    async fn record_answer(
        &self,
        question_id: &str,
        value: AnswerValue,
        expected_version: u32,
    ) -> Result<Answer>;

    /// The full chain for a question, oldest first. Superseded answers
    /// stay readable forever.
    async fn answer_history(&self, question_id: &str) -> Result<Vec<Answer>>;

    /// Append one snapshot and its issue batch atomically. A snapshot
    /// arriving with an empty id gets a fresh identity and timestamp;
    /// targeting an existing identity is an `InvalidState` append-only
    /// violation. Issue ids and snapshot back-references are assigned
    /// here as well.
    async fn append_snapshot(
        &self,
        snapshot: CompiledSnapshot,
        issues: Vec<Issue>,
    ) -> Result<CompiledSnapshot>;

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<CompiledSnapshot>;

    /// All snapshots for a project, in creation order.
    async fn snapshots(&self, project_id: &str) -> Result<Vec<CompiledSnapshot>>;

    async fn issues(&self, snapshot_id: &str) -> Result<Vec<Issue>>;
}

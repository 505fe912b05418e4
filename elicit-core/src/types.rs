use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Owning scope for questions, answers, and compiled history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    SingleChoice,
    MultiChoice,
    Freeform,
}

impl QuestionKind {
    /// Choice kinds carry an option set; freeform questions never do.
    pub fn requires_options(self) -> bool {
        matches!(self, QuestionKind::SingleChoice | QuestionKind::MultiChoice)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    Unanswered,
    Answered,
    NeedsReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub project_id: String,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Present only for choice kinds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub tags: Vec<String>,
    pub priority: i32,
    /// Paths into the specification document this question informs.
    pub target_paths: Vec<String>,
    pub status: QuestionStatus,
}

/// Draft produced by the question-generation stage, before it is
/// persisted with an identity and `Unanswered` status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub tags: Vec<String>,
    pub priority: i32,
    pub target_paths: Vec<String>,
}

/// The structured value of one answer, shaped by its question's kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
    Json(Value),
}

/// One link in a question's supersede chain. Answers are never mutated
/// or deleted; an edit appends a new answer with `version + 1` and
/// `supersedes` pointing at the previous head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    pub value: AnswerValue,
    /// Starts at 1; strictly increasing along the chain.
    pub version: u32,
    pub supersedes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// One provenance tuple: the answer a compiled value was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceSource {
    pub question_id: String,
    pub answer_id: String,
    pub answer_version: u32,
}

/// Mapping from a specification-document path to the answers that
/// justified its value. BTreeMap keeps serialization order stable.
pub type Trace = BTreeMap<String, Vec<TraceSource>>;

/// The compiler configuration recorded on every snapshot. Temperature
/// is held at zero so identical inputs reproduce identical output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub model: String,
    pub template_version: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

/// One immutable compiled output. Snapshots are append-only: a new
/// compile always produces a new snapshot, never an update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledSnapshot {
    pub id: String,
    pub project_id: String,
    pub document: Value,
    pub trace: Trace,
    /// question id -> the answer version this compile read.
    pub derived_from: BTreeMap<String, u32>,
    pub compiler: CompilerConfig,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    Missing,
    Conflict,
    Assumption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warn,
    Error,
}

/// A validation finding attached to a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub project_id: String,
    pub snapshot_id: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
    pub paths: Vec<String>,
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

/// One structural difference between two compiled documents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathChange {
    pub path: String,
    pub kind: ChangeKind,
    pub before: Option<Value>,
    pub after: Option<Value>,
}

/// A coverage gap proposed by the gap-analysis stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Specification schema area, e.g. "/personas".
    pub area: String,
    pub reason: String,
    pub priority: i32,
}

use crate::asker::draft_questions;
use crate::compiler::compile_document;
use crate::diff::diff_documents;
use crate::planner::analyze_gaps;
use crate::schema::{SPEC_SECTIONS, SpecValidator};
use crate::validator::{check_schema, order_issue_batch, semantic_findings, trace_coverage_issues};
use elicit_core::{
    Answer, AnswerValue, CompiledSnapshot, Issue, PathChange, Question, QuestionStatus, Result,
};
use elicit_model::StageClient;
use elicit_store::ChainStore;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Run the semantic (conflict/assumption) validation pass after
    /// trace coverage. When enabled, its failures propagate.
    pub semantic_validation: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self { semantic_validation: true }
    }
}

/// Thin coordinator over the chain store and the stage client.
///
/// Compilation is serialized per project: one keyed async mutex per
/// project id, held for the whole read-answers → compile → validate →
/// append span and released on every exit path by guard drop. Answer
/// submission stays optimistic (version CAS in the store) since writes
/// to different questions are independent.
pub struct Orchestrator {
    store: Arc<dyn ChainStore>,
    client: StageClient,
    config: OrchestratorConfig,
    spec_validator: SpecValidator,
    compile_locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl Orchestrator {
    pub fn new(
        store: Arc<dyn ChainStore>,
        client: StageClient,
        config: OrchestratorConfig,
    ) -> Result<Self> {
        Ok(Self {
            store,
            client,
            config,
            spec_validator: SpecValidator::new()?,
            compile_locks: Mutex::new(HashMap::new()),
        })
    }

    fn project_lock(&self, project_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.compile_locks.lock().unwrap();
        Arc::clone(locks.entry(project_id.to_string()).or_default())
    }

    /// Record an answer to a question, appending to its supersede
    /// chain. A concurrent edit between our read and write surfaces as
    /// `InvalidState`; the caller re-reads and retries.
    pub async fn submit_answer(&self, question_id: &str, value: AnswerValue) -> Result<Answer> {
        self.store.get_question(question_id).await?;
        let head_version =
            self.store.answer_history(question_id).await?.last().map(|a| a.version).unwrap_or(0);

        let answer = self.store.record_answer(question_id, value, head_version).await?;
        self.store.set_question_status(question_id, QuestionStatus::Answered).await?;
        debug!(question_id, version = answer.version, "answer submitted");
        Ok(answer)
    }

    /// The planner/asker path: propose coverage gaps, draft questions,
    /// drop duplicates, and persist the rest as unanswered questions.
    /// Reads compiled history never mutates it.
    pub async fn request_next_questions(&self, project_id: &str) -> Result<Vec<Question>> {
        let answers = self.store.current_answers(project_id).await?;
        let existing = self.store.questions(project_id).await?;

        let gaps = analyze_gaps(&self.client, &answers, &SPEC_SECTIONS).await?;
        let drafts = draft_questions(&self.client, &gaps, &existing).await?;
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        let questions = self.store.insert_questions(project_id, drafts).await?;
        info!(project_id, count = questions.len(), "new questions persisted");
        Ok(questions)
    }

    /// Compile the current answer state into a new immutable snapshot.
    ///
    /// Schema-invalid output aborts with `ValidationFailed` and
    /// persists nothing. Schema-valid output is persisted together
    /// with its trace, `derived_from` map, and issue batch in one
    /// atomic append.
    pub async fn compile(&self, project_id: &str) -> Result<(CompiledSnapshot, Vec<Issue>)> {
        let lock = self.project_lock(project_id);
        let _guard = lock.lock().await;

        let answers = self.store.current_answers(project_id).await?;
        let draft = compile_document(&self.client, &answers).await?;

        check_schema(&self.spec_validator, &draft.document)?;

        let mut issues = trace_coverage_issues(project_id, &draft.document, &draft.trace);
        if self.config.semantic_validation {
            issues.extend(
                semantic_findings(&self.client, &answers, &draft.document, project_id).await?,
            );
        }
        let issues = order_issue_batch(issues);

        let derived_from: BTreeMap<String, u32> = answers
            .iter()
            .map(|(question_id, answer)| (question_id.clone(), answer.version))
            .collect();

        let snapshot = CompiledSnapshot {
            id: String::new(),
            project_id: project_id.to_string(),
            document: draft.document,
            trace: draft.trace,
            derived_from,
            compiler: self.client.compiler_config(),
            created_at: chrono::Utc::now(),
        };
        let snapshot = self.store.append_snapshot(snapshot, issues).await?;
        let issues = self.store.issues(&snapshot.id).await?;
        info!(
            project_id,
            snapshot_id = %snapshot.id,
            issues = issues.len(),
            "compiled snapshot appended"
        );
        Ok((snapshot, issues))
    }

    /// Structural diff between the documents of two historical
    /// snapshots.
    pub async fn diff_snapshots(
        &self,
        snapshot_a: &str,
        snapshot_b: &str,
    ) -> Result<Vec<PathChange>> {
        let a = self.store.get_snapshot(snapshot_a).await?;
        let b = self.store.get_snapshot(snapshot_b).await?;
        Ok(diff_documents(&a.document, &b.document))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_locks_are_per_project() {
        let store = Arc::new(elicit_store::InMemoryChainStore::new());
        let client = StageClient::new(
            Arc::new(elicit_model::ScriptedModel::new("mock")),
            elicit_model::PromptTemplates::builtin(),
            elicit_model::StageClientConfig::new("test-model"),
        );
        let orchestrator =
            Orchestrator::new(store, client, OrchestratorConfig::default()).unwrap();

        let a1 = orchestrator.project_lock("project-a");
        let a2 = orchestrator.project_lock("project-a");
        let b = orchestrator.project_lock("project-b");
        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}

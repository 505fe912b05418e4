use crate::ChainStore;
use async_trait::async_trait;
use chrono::Utc;
use elicit_core::{
    Answer, AnswerValue, CompiledSnapshot, ElicitError, Issue, Project, Question, QuestionDraft,
    QuestionStatus, Result,
};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;
use uuid::Uuid;

/// In-memory reference implementation of [`ChainStore`].
///
/// Chains live as append-only vectors keyed by question id; the chain
/// head is always the last element, which makes the compare-and-swap
/// in `record_answer` a single write-locked comparison. Reads hand out
/// clones, so nothing a caller holds can mutate stored history.
pub struct InMemoryChainStore {
    projects: Arc<RwLock<HashMap<String, Project>>>,
    questions: Arc<RwLock<HashMap<String, Question>>>,
    project_questions: Arc<RwLock<HashMap<String, Vec<String>>>>,
    chains: Arc<RwLock<HashMap<String, Vec<Answer>>>>,
    snapshots: Arc<RwLock<HashMap<String, CompiledSnapshot>>>,
    project_snapshots: Arc<RwLock<HashMap<String, Vec<String>>>>,
    issues: Arc<RwLock<HashMap<String, Vec<Issue>>>>,
}

impl InMemoryChainStore {
    pub fn new() -> Self {
        Self {
            projects: Arc::new(RwLock::new(HashMap::new())),
            questions: Arc::new(RwLock::new(HashMap::new())),
            project_questions: Arc::new(RwLock::new(HashMap::new())),
            chains: Arc::new(RwLock::new(HashMap::new())),
            snapshots: Arc::new(RwLock::new(HashMap::new())),
            project_snapshots: Arc::new(RwLock::new(HashMap::new())),
            issues: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    fn require_project(&self, project_id: &str) -> Result<()> {
        if self.projects.read().unwrap().contains_key(project_id) {
            Ok(())
        } else {
            Err(ElicitError::NotFound(format!("project {project_id}")))
        }
    }
}

impl Default for InMemoryChainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChainStore for InMemoryChainStore {
    async fn create_project(&self, name: &str) -> Result<Project> {
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        self.projects.write().unwrap().insert(project.id.clone(), project.clone());
        Ok(project)
    }

    async fn get_project(&self, project_id: &str) -> Result<Project> {
        self.projects
            .read()
            .unwrap()
            .get(project_id)
            .cloned()
            .ok_or_else(|| ElicitError::NotFound(format!("project {project_id}")))
    }

    async fn insert_questions(
        &self,
        project_id: &str,
        drafts: Vec<QuestionDraft>,
    ) -> Result<Vec<Question>> {
        self.require_project(project_id)?;

        for draft in &drafts {
            let has_options = draft.options.as_ref().is_some_and(|o| !o.is_empty());
            if draft.kind.requires_options() && !has_options {
                return Err(ElicitError::InvalidState(format!(
                    "choice question '{}' has no options",
                    draft.prompt
                )));
            }
            if !draft.kind.requires_options() && draft.options.is_some() {
                return Err(ElicitError::InvalidState(format!(
                    "freeform question '{}' must not carry options",
                    draft.prompt
                )));
            }
        }

        let mut created = Vec::with_capacity(drafts.len());
        let mut questions = self.questions.write().unwrap();
        let mut index = self.project_questions.write().unwrap();
        let ids = index.entry(project_id.to_string()).or_default();
        for draft in drafts {
            let question = Question {
                id: Uuid::new_v4().to_string(),
                project_id: project_id.to_string(),
                prompt: draft.prompt,
                kind: draft.kind,
                options: draft.options,
                tags: draft.tags,
                priority: draft.priority,
                target_paths: draft.target_paths,
                status: QuestionStatus::Unanswered,
            };
            ids.push(question.id.clone());
            questions.insert(question.id.clone(), question.clone());
            created.push(question);
        }
        debug!(project_id, count = created.len(), "persisted question drafts");
        Ok(created)
    }

    async fn questions(&self, project_id: &str) -> Result<Vec<Question>> {
        self.require_project(project_id)?;
        let index = self.project_questions.read().unwrap();
        let questions = self.questions.read().unwrap();
        Ok(index
            .get(project_id)
            .map(|ids| ids.iter().filter_map(|id| questions.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn get_question(&self, question_id: &str) -> Result<Question> {
        self.questions
            .read()
            .unwrap()
            .get(question_id)
            .cloned()
            .ok_or_else(|| ElicitError::NotFound(format!("question {question_id}")))
    }

    async fn set_question_status(&self, question_id: &str, status: QuestionStatus) -> Result<()> {
        let mut questions = self.questions.write().unwrap();
        let question = questions
            .get_mut(question_id)
            .ok_or_else(|| ElicitError::NotFound(format!("question {question_id}")))?;
        question.status = status;
        Ok(())
    }

    async fn current_answers(&self, project_id: &str) -> Result<HashMap<String, Answer>> {
        self.require_project(project_id)?;
        let index = self.project_questions.read().unwrap();
        let chains = self.chains.read().unwrap();

        let mut current = HashMap::new();
        for question_id in index.get(project_id).map(Vec::as_slice).unwrap_or_default() {
            if let Some(head) = chains.get(question_id).and_then(|chain| chain.last()) {
                current.insert(question_id.clone(), head.clone());
            }
        }
        Ok(current)
    }

    async fn record_answer(
        &self,
        question_id: &str,
        value: AnswerValue,
        expected_version: u32,
    ) -> Result<Answer> {
        if !self.questions.read().unwrap().contains_key(question_id) {
            return Err(ElicitError::NotFound(format!("question {question_id}")));
        }

        let mut chains = self.chains.write().unwrap();
        let chain = chains.entry(question_id.to_string()).or_default();
        let head_version = chain.last().map(|a| a.version).unwrap_or(0);
        if head_version != expected_version {
            return Err(ElicitError::InvalidState(format!(
                "answer chain for question {question_id} is at version {head_version}, \
                 caller expected {expected_version}"
            )));
        }

        let answer = Answer {
            id: Uuid::new_v4().to_string(),
            question_id: question_id.to_string(),
            value,
            version: head_version + 1,
            supersedes: chain.last().map(|a| a.id.clone()),
            created_at: Utc::now(),
        };
        chain.push(answer.clone());
        debug!(question_id, version = answer.version, "recorded answer");
        Ok(answer)
    }

    async fn answer_history(&self, question_id: &str) -> Result<Vec<Answer>> {
        if !self.questions.read().unwrap().contains_key(question_id) {
            return Err(ElicitError::NotFound(format!("question {question_id}")));
        }
        Ok(self.chains.read().unwrap().get(question_id).cloned().unwrap_or_default())
    }

    async fn append_snapshot(
        &self,
        mut snapshot: CompiledSnapshot,
        mut issues: Vec<Issue>,
    ) -> Result<CompiledSnapshot> {
        self.require_project(&snapshot.project_id)?;

        if snapshot.id.is_empty() {
            snapshot.id = Uuid::new_v4().to_string();
            snapshot.created_at = Utc::now();
        }
        for issue in &mut issues {
            if issue.id.is_empty() {
                issue.id = Uuid::new_v4().to_string();
            }
            issue.snapshot_id = snapshot.id.clone();
            issue.project_id = snapshot.project_id.clone();
        }

        // One write section for snapshot + index + issues: all or nothing.
        let mut snapshots = self.snapshots.write().unwrap();
        let mut index = self.project_snapshots.write().unwrap();
        let mut issue_map = self.issues.write().unwrap();

        if snapshots.contains_key(&snapshot.id) {
            return Err(ElicitError::InvalidState(format!(
                "snapshot {} already exists; snapshots are append-only",
                snapshot.id
            )));
        }
        index.entry(snapshot.project_id.clone()).or_default().push(snapshot.id.clone());
        issue_map.insert(snapshot.id.clone(), issues);
        snapshots.insert(snapshot.id.clone(), snapshot.clone());
        debug!(
            project_id = %snapshot.project_id,
            snapshot_id = %snapshot.id,
            "appended compiled snapshot"
        );
        Ok(snapshot)
    }

    async fn get_snapshot(&self, snapshot_id: &str) -> Result<CompiledSnapshot> {
        self.snapshots
            .read()
            .unwrap()
            .get(snapshot_id)
            .cloned()
            .ok_or_else(|| ElicitError::NotFound(format!("snapshot {snapshot_id}")))
    }

    async fn snapshots(&self, project_id: &str) -> Result<Vec<CompiledSnapshot>> {
        self.require_project(project_id)?;
        let index = self.project_snapshots.read().unwrap();
        let snapshots = self.snapshots.read().unwrap();
        Ok(index
            .get(project_id)
            .map(|ids| ids.iter().filter_map(|id| snapshots.get(id).cloned()).collect())
            .unwrap_or_default())
    }

    async fn issues(&self, snapshot_id: &str) -> Result<Vec<Issue>> {
        if !self.snapshots.read().unwrap().contains_key(snapshot_id) {
            return Err(ElicitError::NotFound(format!("snapshot {snapshot_id}")));
        }
        Ok(self.issues.read().unwrap().get(snapshot_id).cloned().unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use elicit_core::{CompilerConfig, IssueKind, QuestionKind, Severity, Trace};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn freeform_draft(prompt: &str) -> QuestionDraft {
        QuestionDraft {
            prompt: prompt.to_string(),
            kind: QuestionKind::Freeform,
            options: None,
            tags: vec![],
            priority: 1,
            target_paths: vec!["/product/name".to_string()],
        }
    }

    fn empty_snapshot(project_id: &str) -> CompiledSnapshot {
        CompiledSnapshot {
            id: String::new(),
            project_id: project_id.to_string(),
            document: json!({}),
            trace: Trace::new(),
            derived_from: BTreeMap::new(),
            compiler: CompilerConfig {
                model: "test-model".to_string(),
                template_version: "v1".to_string(),
                temperature: 0.0,
                seed: None,
            },
            created_at: Utc::now(),
        }
    }

    async fn store_with_question() -> (InMemoryChainStore, String, String) {
        let store = InMemoryChainStore::new();
        let project = store.create_project("demo").await.unwrap();
        let questions =
            store.insert_questions(&project.id, vec![freeform_draft("Name?")]).await.unwrap();
        let question_id = questions[0].id.clone();
        (store, project.id, question_id)
    }

    #[tokio::test]
    async fn record_answer_builds_linear_chain() {
        let (store, _, q) = store_with_question().await;

        let v1 = store
            .record_answer(&q, AnswerValue::Json(json!({"name": "Acme"})), 0)
            .await
            .unwrap();
        assert_eq!(v1.version, 1);
        assert!(v1.supersedes.is_none());

        let v2 = store
            .record_answer(&q, AnswerValue::Json(json!({"name": "Acme Inc"})), 1)
            .await
            .unwrap();
        assert_eq!(v2.version, 2);
        assert_eq!(v2.supersedes.as_deref(), Some(v1.id.as_str()));

        // Following supersedes pointers terminates at version 1 with no
        // repeated identity.
        let history = store.answer_history(&q).await.unwrap();
        let mut seen = std::collections::HashSet::new();
        let mut cursor = history.last().cloned();
        while let Some(answer) = cursor {
            assert!(seen.insert(answer.id.clone()), "cycle in supersede chain");
            cursor = match answer.supersedes {
                Some(prev_id) => {
                    Some(history.iter().find(|a| a.id == prev_id).cloned().unwrap())
                }
                None => {
                    assert_eq!(answer.version, 1);
                    None
                }
            };
        }
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test]
    async fn stale_version_yields_invalid_state() {
        let (store, _, q) = store_with_question().await;
        store.record_answer(&q, AnswerValue::Text("a".to_string()), 0).await.unwrap();

        // A racing writer already advanced the chain to version 1.
        let err = store.record_answer(&q, AnswerValue::Text("b".to_string()), 0).await.unwrap_err();
        assert!(matches!(err, ElicitError::InvalidState(_)));

        // The chain is untouched by the failed write.
        let history = store.answer_history(&q).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn current_answers_returns_highest_version_only() {
        let (store, project_id, q) = store_with_question().await;
        store.record_answer(&q, AnswerValue::Text("a".to_string()), 0).await.unwrap();
        let v2 = store.record_answer(&q, AnswerValue::Text("b".to_string()), 1).await.unwrap();

        let current = store.current_answers(&project_id).await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[&q].id, v2.id);
        assert_eq!(current[&q].version, 2);
    }

    #[tokio::test]
    async fn current_answers_skips_unanswered_questions() {
        let (store, project_id, _) = store_with_question().await;
        let current = store.current_answers(&project_id).await.unwrap();
        assert!(current.is_empty());
    }

    #[tokio::test]
    async fn append_snapshot_assigns_identity_and_rejects_reuse() {
        let (store, project_id, _) = store_with_question().await;

        let first = store.append_snapshot(empty_snapshot(&project_id), vec![]).await.unwrap();
        assert!(!first.id.is_empty());

        let mut replay = empty_snapshot(&project_id);
        replay.id = first.id.clone();
        let err = store.append_snapshot(replay, vec![]).await.unwrap_err();
        assert!(matches!(err, ElicitError::InvalidState(_)));

        assert_eq!(store.snapshots(&project_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn snapshots_are_immutable_across_reads() {
        let (store, project_id, _) = store_with_question().await;
        let mut snapshot = empty_snapshot(&project_id);
        snapshot.document = json!({"product": {"name": "Acme"}});
        let stored = store.append_snapshot(snapshot, vec![]).await.unwrap();

        let first = serde_json::to_vec(&store.get_snapshot(&stored.id).await.unwrap()).unwrap();
        let second = serde_json::to_vec(&store.get_snapshot(&stored.id).await.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn append_snapshot_attaches_issue_batch() {
        let (store, project_id, q) = store_with_question().await;
        let issue = Issue {
            id: String::new(),
            project_id: String::new(),
            snapshot_id: String::new(),
            kind: IssueKind::Missing,
            severity: Severity::Warn,
            message: "path /product/name has no trace entry".to_string(),
            paths: vec!["/product/name".to_string()],
            question_ids: vec![q],
        };
        let stored = store.append_snapshot(empty_snapshot(&project_id), vec![issue]).await.unwrap();

        let issues = store.issues(&stored.id).await.unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].snapshot_id, stored.id);
        assert!(!issues[0].id.is_empty());
    }

    #[tokio::test]
    async fn choice_drafts_require_options() {
        let store = InMemoryChainStore::new();
        let project = store.create_project("demo").await.unwrap();
        let draft = QuestionDraft {
            prompt: "Pick one".to_string(),
            kind: QuestionKind::SingleChoice,
            options: None,
            tags: vec![],
            priority: 1,
            target_paths: vec![],
        };
        let err = store.insert_questions(&project.id, vec![draft]).await.unwrap_err();
        assert!(matches!(err, ElicitError::InvalidState(_)));
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = InMemoryChainStore::new();
        assert!(matches!(
            store.get_project("missing").await.unwrap_err(),
            ElicitError::NotFound(_)
        ));
        assert!(matches!(
            store.get_question("missing").await.unwrap_err(),
            ElicitError::NotFound(_)
        ));
        assert!(matches!(
            store.get_snapshot("missing").await.unwrap_err(),
            ElicitError::NotFound(_)
        ));
    }
}

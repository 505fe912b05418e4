use elicit_core::{ElicitError, Gap, Question, QuestionDraft, QuestionStatus, Result};
use elicit_model::{StageClient, StageOutput, StageRole};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

/// Question generation: turn the planner's gap list into constrained
/// question drafts, dropping any draft that duplicates an existing
/// unanswered question. Duplicate detection is a normalized
/// text-and-path-set comparison, not exact string match.
pub async fn draft_questions(
    client: &StageClient,
    gaps: &[Gap],
    existing: &[Question],
) -> Result<Vec<QuestionDraft>> {
    let mut vars = HashMap::new();
    vars.insert("gaps", serde_json::to_string_pretty(gaps)?);
    vars.insert("existing", existing_context(existing)?);

    let output = client.invoke(StageRole::QuestionGeneration, &vars).await?;
    let StageOutput::QuestionGeneration(output) = output else {
        return Err(ElicitError::Model(
            "question-generation returned the wrong output variant".into(),
        ));
    };

    let drafts: Vec<QuestionDraft> = output
        .questions
        .into_iter()
        .map(|item| QuestionDraft {
            prompt: item.prompt,
            kind: item.kind,
            options: item.options,
            tags: item.tags,
            priority: item.priority,
            target_paths: item.target_paths,
        })
        .filter(|draft| !is_duplicate(draft, existing))
        .collect();
    debug!(drafts = drafts.len(), "question drafting complete");
    Ok(drafts)
}

/// A draft duplicates an existing unanswered question when both the
/// normalized prompt text and the normalized target-path set match.
pub fn is_duplicate(draft: &QuestionDraft, existing: &[Question]) -> bool {
    let draft_prompt = normalize_prompt(&draft.prompt);
    let draft_paths = normalize_paths(&draft.target_paths);
    existing.iter().any(|question| {
        question.status == QuestionStatus::Unanswered
            && normalize_prompt(&question.prompt) == draft_prompt
            && normalize_paths(&question.target_paths) == draft_paths
    })
}

/// Lowercase, strip punctuation, collapse whitespace.
pub fn normalize_prompt(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_alphanumeric() {
            if pending_space && !normalized.is_empty() {
                normalized.push(' ');
            }
            pending_space = false;
            normalized.extend(c.to_lowercase());
        } else {
            pending_space = true;
        }
    }
    normalized
}

/// Trim path entries, drop empties, dedupe, order-insensitive.
pub fn normalize_paths(paths: &[String]) -> BTreeSet<String> {
    paths
        .iter()
        .map(|p| p.trim().trim_end_matches('/').to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

fn existing_context(existing: &[Question]) -> Result<String> {
    let summary: Vec<serde_json::Value> = existing
        .iter()
        .map(|q| {
            serde_json::json!({
                "prompt": q.prompt,
                "status": q.status,
                "target_paths": q.target_paths,
            })
        })
        .collect();
    Ok(serde_json::to_string_pretty(&summary)?)
}

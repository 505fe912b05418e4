use elicit_core::{Answer, ElicitError, Gap, Result};
use elicit_model::{StageClient, StageOutput, StageRole};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Gap analysis: inspect the current answer state against the target
/// schema's section list and propose coverage gaps, highest priority
/// first. Pure apart from the single gap-analysis stage call; no
/// persistent side effects.
pub async fn analyze_gaps(
    client: &StageClient,
    answers: &HashMap<String, Answer>,
    sections: &[&str],
) -> Result<Vec<Gap>> {
    let mut vars = HashMap::new();
    vars.insert("sections", sections.join(", "));
    vars.insert("answers", answer_context(answers)?);

    let output = client.invoke(StageRole::GapAnalysis, &vars).await?;
    let StageOutput::GapAnalysis(output) = output else {
        return Err(ElicitError::Model("gap-analysis returned the wrong output variant".into()));
    };

    let mut gaps: Vec<Gap> = output
        .gaps
        .into_iter()
        .map(|item| Gap { area: item.area, reason: item.reason, priority: item.priority })
        .collect();
    gaps.sort_by(|a, b| b.priority.cmp(&a.priority).then_with(|| a.area.cmp(&b.area)));
    debug!(gaps = gaps.len(), "gap analysis complete");
    Ok(gaps)
}

/// Render the answer state for a prompt: question id -> current value
/// and version, in stable key order.
pub(crate) fn answer_context(answers: &HashMap<String, Answer>) -> Result<String> {
    let ordered: BTreeMap<&String, serde_json::Value> = answers
        .iter()
        .map(|(question_id, answer)| {
            (
                question_id,
                json!({
                    "answer_id": answer.id,
                    "answer_version": answer.version,
                    "value": answer.value,
                }),
            )
        })
        .collect();
    Ok(serde_json::to_string_pretty(&ordered)?)
}

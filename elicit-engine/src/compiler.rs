use crate::planner::answer_context;
use elicit_core::{Answer, ElicitError, Result, Trace};
use elicit_model::{StageClient, StageOutput, StageRole};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// A candidate specification document plus its provenance trace, not
/// yet validated and not yet persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledDraft {
    pub document: Value,
    pub trace: Trace,
}

/// Compile the full current answer mapping into a candidate document
/// and trace via one compilation stage call. The compiler does not
/// validate its own output; it propagates stage failure unmodified and
/// never masks it with a partial result.
pub async fn compile_document(
    client: &StageClient,
    answers: &HashMap<String, Answer>,
) -> Result<CompiledDraft> {
    let mut vars = HashMap::new();
    vars.insert("answers", answer_context(answers)?);

    let output = client.invoke(StageRole::Compilation, &vars).await?;
    let StageOutput::Compilation(output) = output else {
        return Err(ElicitError::Model("compilation returned the wrong output variant".into()));
    };
    debug!(trace_paths = output.trace.len(), "compilation stage complete");
    Ok(CompiledDraft { document: output.document, trace: output.trace })
}

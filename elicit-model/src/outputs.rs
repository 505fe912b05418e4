use elicit_core::{ElicitError, QuestionKind, Result, Severity, Trace};
use serde::Deserialize;
use serde_json::{Value, json};

/// The four fixed prompt roles. Each role has a statically declared
/// output shape; the response is decoded into exactly that shape or
/// the attempt fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageRole {
    GapAnalysis,
    QuestionGeneration,
    Compilation,
    Validation,
}

impl StageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            StageRole::GapAnalysis => "gap-analysis",
            StageRole::QuestionGeneration => "question-generation",
            StageRole::Compilation => "compilation",
            StageRole::Validation => "validation",
        }
    }

    /// Declared response shape, attached to every outbound request.
    pub fn response_schema(self) -> Value {
        match self {
            StageRole::GapAnalysis => json!({
                "type": "object",
                "required": ["gaps"],
                "properties": {
                    "gaps": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["area", "reason", "priority"],
                            "properties": {
                                "area": { "type": "string" },
                                "reason": { "type": "string" },
                                "priority": { "type": "integer" }
                            }
                        }
                    }
                }
            }),
            StageRole::QuestionGeneration => json!({
                "type": "object",
                "required": ["questions"],
                "properties": {
                    "questions": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["prompt", "kind", "tags", "priority", "target_paths"],
                            "properties": {
                                "prompt": { "type": "string" },
                                "kind": { "enum": ["single_choice", "multi_choice", "freeform"] },
                                "options": { "type": "array", "items": { "type": "string" } },
                                "tags": { "type": "array", "items": { "type": "string" } },
                                "priority": { "type": "integer" },
                                "target_paths": { "type": "array", "items": { "type": "string" } }
                            }
                        }
                    }
                }
            }),
            StageRole::Compilation => json!({
                "type": "object",
                "required": ["document", "trace"],
                "properties": {
                    "document": { "type": "object" },
                    "trace": { "type": "object" }
                }
            }),
            StageRole::Validation => json!({
                "type": "object",
                "required": ["findings"],
                "properties": {
                    "findings": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "required": ["kind", "severity", "message", "paths", "question_ids"],
                            "properties": {
                                "kind": { "enum": ["conflict", "assumption"] },
                                "severity": { "enum": ["info", "warn", "error"] },
                                "message": { "type": "string" },
                                "paths": { "type": "array", "items": { "type": "string" } },
                                "question_ids": { "type": "array", "items": { "type": "string" } }
                            }
                        }
                    }
                }
            }),
        }
    }
}

impl std::fmt::Display for StageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GapItem {
    pub area: String,
    pub reason: String,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GapAnalysisOutput {
    pub gaps: Vec<GapItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionItem {
    pub prompt: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    pub tags: Vec<String>,
    pub priority: i32,
    pub target_paths: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionGenerationOutput {
    pub questions: Vec<QuestionItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilationOutput {
    pub document: Value,
    pub trace: Trace,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticFindingKind {
    Conflict,
    Assumption,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindingItem {
    pub kind: SemanticFindingKind,
    pub severity: Severity,
    pub message: String,
    pub paths: Vec<String>,
    pub question_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationOutput {
    pub findings: Vec<FindingItem>,
}

/// Closed union of stage outputs, one variant per role.
#[derive(Debug, Clone, PartialEq)]
pub enum StageOutput {
    GapAnalysis(GapAnalysisOutput),
    QuestionGeneration(QuestionGenerationOutput),
    Compilation(CompilationOutput),
    Validation(ValidationOutput),
}

/// Decode a raw model response strictly as the role's declared shape.
/// Unknown fields, missing fields, or non-JSON input all fail; there
/// is no partial acceptance and no default-filling.
pub fn decode_stage_output(role: StageRole, raw: &str) -> Result<StageOutput> {
    let decode_err = |e: serde_json::Error| {
        ElicitError::Model(format!("{role} response does not match its declared shape: {e}"))
    };
    match role {
        StageRole::GapAnalysis => {
            serde_json::from_str(raw).map(StageOutput::GapAnalysis).map_err(decode_err)
        }
        StageRole::QuestionGeneration => {
            serde_json::from_str(raw).map(StageOutput::QuestionGeneration).map_err(decode_err)
        }
        StageRole::Compilation => {
            serde_json::from_str(raw).map(StageOutput::Compilation).map_err(decode_err)
        }
        StageRole::Validation => {
            serde_json::from_str(raw).map(StageOutput::Validation).map_err(decode_err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_gap_analysis_output() {
        let raw = r#"{"gaps": [{"area": "/personas", "reason": "no personas yet", "priority": 2}]}"#;
        let out = decode_stage_output(StageRole::GapAnalysis, raw).unwrap();
        match out {
            StageOutput::GapAnalysis(out) => {
                assert_eq!(out.gaps.len(), 1);
                assert_eq!(out.gaps[0].area, "/personas");
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_fields() {
        let raw = r#"{"gaps": [], "confidence": 0.9}"#;
        let err = decode_stage_output(StageRole::GapAnalysis, raw).unwrap_err();
        assert!(matches!(err, ElicitError::Model(_)));
    }

    #[test]
    fn rejects_missing_required_fields() {
        let raw = r#"{"questions": [{"prompt": "What is the product name?"}]}"#;
        assert!(decode_stage_output(StageRole::QuestionGeneration, raw).is_err());
    }

    #[test]
    fn rejects_prose_wrapping() {
        let raw = "Sure! Here is the JSON:\n{\"gaps\": []}";
        assert!(decode_stage_output(StageRole::GapAnalysis, raw).is_err());
    }

    #[test]
    fn decodes_compilation_output_with_trace() {
        let raw = r#"{
            "document": {"product": {"name": "Acme"}},
            "trace": {"/product/name": [{"question_id": "q1", "answer_id": "a1", "answer_version": 1}]}
        }"#;
        let out = decode_stage_output(StageRole::Compilation, raw).unwrap();
        match out {
            StageOutput::Compilation(out) => {
                assert_eq!(out.trace["/product/name"][0].answer_version, 1);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn question_item_options_are_optional() {
        let raw = r#"{"questions": [{
            "prompt": "Describe the main workflow",
            "kind": "freeform",
            "tags": ["workflow"],
            "priority": 1,
            "target_paths": ["/workflows"]
        }]}"#;
        let out = decode_stage_output(StageRole::QuestionGeneration, raw).unwrap();
        match out {
            StageOutput::QuestionGeneration(out) => assert!(out.questions[0].options.is_none()),
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn every_role_declares_a_schema() {
        for role in [
            StageRole::GapAnalysis,
            StageRole::QuestionGeneration,
            StageRole::Compilation,
            StageRole::Validation,
        ] {
            let schema = role.response_schema();
            assert_eq!(schema["type"], "object");
            assert!(schema["required"].is_array());
        }
    }
}

use crate::planner::answer_context;
use crate::schema::SpecValidator;
use elicit_core::{
    Answer, ElicitError, Issue, IssueKind, Result, Severity, Trace,
};
use elicit_model::{SemanticFindingKind, StageClient, StageOutput, StageRole};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Check 1: schema conformance. A violation means the compiled output
/// never becomes a snapshot; the caller gets the full violation list.
pub fn check_schema(validator: &SpecValidator, document: &Value) -> Result<()> {
    validator
        .check(document)
        .map_err(|violations| ElicitError::ValidationFailed { violations })
}

/// Check 2: trace coverage. Every populated (non-empty, non-default)
/// leaf path in a schema-valid document must have at least one source
/// tuple in the trace. Uncovered paths become `missing` issues at
/// `warn` severity; this check never blocks persistence.
pub fn trace_coverage_issues(project_id: &str, document: &Value, trace: &Trace) -> Vec<Issue> {
    let mut paths = Vec::new();
    collect_populated_paths(document, String::new(), &mut paths);

    paths
        .into_iter()
        .filter(|path| trace.get(path).is_none_or(|sources| sources.is_empty()))
        .map(|path| Issue {
            id: String::new(),
            project_id: project_id.to_string(),
            snapshot_id: String::new(),
            kind: IssueKind::Missing,
            severity: Severity::Warn,
            message: format!("populated path {path} has no trace entry"),
            paths: vec![path],
            question_ids: vec![],
        })
        .collect()
}

/// Leaf paths holding a populated value. Null, empty strings, empty
/// composites, `false`, and zero count as defaults and are skipped;
/// composites themselves are not leaves.
fn collect_populated_paths(value: &Value, path: String, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            for key in keys {
                collect_populated_paths(&map[key.as_str()], format!("{path}/{key}"), out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                collect_populated_paths(item, format!("{path}/{index}"), out);
            }
        }
        Value::Null => {}
        Value::Bool(b) => {
            if *b {
                out.push(path);
            }
        }
        Value::Number(n) => {
            if n.as_f64() != Some(0.0) {
                out.push(path);
            }
        }
        Value::String(s) => {
            if !s.is_empty() {
                out.push(path);
            }
        }
    }
}

/// Optional second pass: one validation stage call surfacing semantic
/// conflicts and assumptions between answers and the compiled
/// document. Failure propagates; there is no best-effort fallback.
pub async fn semantic_findings(
    client: &StageClient,
    answers: &HashMap<String, Answer>,
    document: &Value,
    project_id: &str,
) -> Result<Vec<Issue>> {
    let mut vars = HashMap::new();
    vars.insert("answers", answer_context(answers)?);
    vars.insert("document", serde_json::to_string_pretty(document)?);

    let output = client.invoke(StageRole::Validation, &vars).await?;
    let StageOutput::Validation(output) = output else {
        return Err(ElicitError::Model("validation returned the wrong output variant".into()));
    };

    let issues = output
        .findings
        .into_iter()
        .map(|finding| Issue {
            id: String::new(),
            project_id: project_id.to_string(),
            snapshot_id: String::new(),
            kind: match finding.kind {
                SemanticFindingKind::Conflict => IssueKind::Conflict,
                SemanticFindingKind::Assumption => IssueKind::Assumption,
            },
            severity: finding.severity,
            message: finding.message,
            paths: finding.paths,
            question_ids: finding.question_ids,
        })
        .collect::<Vec<_>>();
    debug!(findings = issues.len(), "semantic validation complete");
    Ok(issues)
}

/// Merge coverage and semantic issues into one deterministically
/// ordered batch: by primary path, then kind, then message.
pub fn order_issue_batch(mut issues: Vec<Issue>) -> Vec<Issue> {
    issues.sort_by(|a, b| {
        let a_path = a.paths.first().map(String::as_str).unwrap_or("");
        let b_path = b.paths.first().map(String::as_str).unwrap_or("");
        a_path
            .cmp(b_path)
            .then_with(|| kind_rank(a.kind).cmp(&kind_rank(b.kind)))
            .then_with(|| a.message.cmp(&b.message))
    });
    issues
}

fn kind_rank(kind: IssueKind) -> u8 {
    match kind {
        IssueKind::Missing => 0,
        IssueKind::Conflict => 1,
        IssueKind::Assumption => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::empty_document;
    use serde_json::json;

    #[test]
    fn schema_failure_carries_all_violations() {
        let validator = SpecValidator::new().unwrap();
        let mut document = empty_document();
        let map = document.as_object_mut().unwrap();
        map.remove("acceptance");
        map.remove("plan");

        let err = check_schema(&validator, &document).unwrap_err();
        match err {
            ElicitError::ValidationFailed { violations } => {
                assert_eq!(violations.len(), 2);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn untraced_populated_path_yields_one_warn_issue() {
        let mut document = empty_document();
        document["product"]["name"] = json!("Acme");

        let issues = trace_coverage_issues("p1", &document, &Trace::new());
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Missing);
        assert_eq!(issues[0].severity, Severity::Warn);
        assert_eq!(issues[0].paths, vec!["/product/name".to_string()]);
    }

    #[test]
    fn traced_paths_produce_no_issues() {
        let mut document = empty_document();
        document["product"]["name"] = json!("Acme");

        let mut trace = Trace::new();
        trace.insert(
            "/product/name".to_string(),
            vec![elicit_core::TraceSource {
                question_id: "q1".to_string(),
                answer_id: "a1".to_string(),
                answer_version: 1,
            }],
        );
        assert!(trace_coverage_issues("p1", &document, &trace).is_empty());
    }

    #[test]
    fn empty_trace_entry_still_counts_as_uncovered() {
        let mut document = empty_document();
        document["product"]["name"] = json!("Acme");

        let mut trace = Trace::new();
        trace.insert("/product/name".to_string(), vec![]);
        assert_eq!(trace_coverage_issues("p1", &document, &trace).len(), 1);
    }

    #[test]
    fn default_values_are_not_populated() {
        let document = json!({
            "a": null,
            "b": "",
            "c": [],
            "d": {},
            "e": false,
            "f": 0,
            "g": "real",
            "h": [0, 1],
            "i": true
        });
        let mut paths = Vec::new();
        collect_populated_paths(&document, String::new(), &mut paths);
        assert_eq!(paths, vec!["/g", "/h/1", "/i"]);
    }

    #[test]
    fn issue_batch_order_is_deterministic() {
        let issue = |kind, path: &str, message: &str| Issue {
            id: String::new(),
            project_id: "p1".to_string(),
            snapshot_id: String::new(),
            kind,
            severity: Severity::Warn,
            message: message.to_string(),
            paths: vec![path.to_string()],
            question_ids: vec![],
        };
        let batch = vec![
            issue(IssueKind::Assumption, "/scope", "assumed internal users"),
            issue(IssueKind::Missing, "/product/name", "no trace entry"),
            issue(IssueKind::Conflict, "/scope", "answers disagree"),
        ];

        let ordered = order_issue_batch(batch.clone());
        assert_eq!(ordered[0].paths[0], "/product/name");
        assert_eq!(ordered[1].kind, IssueKind::Conflict);
        assert_eq!(ordered[2].kind, IssueKind::Assumption);
        // Re-ordering the same input gives the identical batch.
        let mut shuffled = batch;
        shuffled.reverse();
        assert_eq!(order_issue_batch(shuffled), ordered);
    }
}

use crate::StageRole;
use elicit_core::{ElicitError, Result};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

static PLACEHOLDER_REGEX: OnceLock<Regex> = OnceLock::new();

fn placeholder_regex() -> &'static Regex {
    PLACEHOLDER_REGEX.get_or_init(|| Regex::new(r"\{([a-z_]+)\}").expect("invalid regex pattern"))
}

/// Immutable prompt templates, one per stage role. Constructed once at
/// startup and passed into the client explicitly; there is no shared
/// mutable template registry.
#[derive(Debug, Clone)]
pub struct PromptTemplates {
    pub version: String,
    gap_analysis: String,
    question_generation: String,
    compilation: String,
    validation: String,
}

impl PromptTemplates {
    /// The built-in template set. Placeholders use `{name}` syntax and
    /// are substituted from the caller's variable map at render time.
    pub fn builtin() -> Self {
        Self {
            version: "v1".to_string(),
            gap_analysis: concat!(
                "You are analyzing coverage of a product specification.\n",
                "Target schema sections: {sections}\n",
                "Current answers:\n{answers}\n",
                "Identify the schema areas lacking sufficient answer coverage. ",
                "Respond with a single JSON object of the form ",
                "{\"gaps\": [{\"area\", \"reason\", \"priority\"}]} and nothing else.",
            )
            .to_string(),
            question_generation: concat!(
                "You are drafting clarifying questions for a product specification.\n",
                "Coverage gaps:\n{gaps}\n",
                "Existing questions:\n{existing}\n",
                "Draft new questions that close the gaps without duplicating ",
                "existing ones. Respond with a single JSON object of the form ",
                "{\"questions\": [{\"prompt\", \"kind\", \"options\", \"tags\", ",
                "\"priority\", \"target_paths\"}]} and nothing else.",
            )
            .to_string(),
            compilation: concat!(
                "You are compiling collected answers into a specification document.\n",
                "Answers (with question, answer, and version identities):\n{answers}\n",
                "Produce the full specification document and, for every populated ",
                "path, the provenance tuples that justify it. Respond with a single ",
                "JSON object of the form {\"document\", \"trace\"} and nothing else.",
            )
            .to_string(),
            validation: concat!(
                "You are reviewing a compiled specification for semantic problems.\n",
                "Answers:\n{answers}\n",
                "Compiled document:\n{document}\n",
                "Report contradictions between answers as conflicts and unstated ",
                "inferences as assumptions. Respond with a single JSON object of ",
                "the form {\"findings\": [{\"kind\", \"severity\", \"message\", ",
                "\"paths\", \"question_ids\"}]} and nothing else.",
            )
            .to_string(),
        }
    }

    pub fn for_role(&self, role: StageRole) -> &str {
        match role {
            StageRole::GapAnalysis => &self.gap_analysis,
            StageRole::QuestionGeneration => &self.question_generation,
            StageRole::Compilation => &self.compilation,
            StageRole::Validation => &self.validation,
        }
    }
}

/// Substitute `{name}` placeholders from the variable map. A
/// placeholder with no matching variable is a configuration error;
/// rendering never silently leaves holes in a prompt.
pub fn render(template: &str, vars: &HashMap<&str, String>) -> Result<String> {
    let regex = placeholder_regex();
    let mut result = String::with_capacity(template.len());
    let mut last_end = 0;

    for captures in regex.captures_iter(template) {
        let whole = captures.get(0).expect("capture 0 always present");
        let name = captures.get(1).expect("capture 1 always present").as_str();
        let value = vars.get(name).ok_or_else(|| {
            ElicitError::Config(format!("template placeholder '{{{name}}}' has no variable"))
        })?;
        result.push_str(&template[last_end..whole.start()]);
        result.push_str(value);
        last_end = whole.end();
    }
    result.push_str(&template[last_end..]);

    Ok(result)
}

use elicit_core::{ElicitError, Result, SchemaViolation};
use jsonschema::Validator;
use serde_json::{Value, json};

/// The required top-level sections of every compiled specification
/// document, in canonical order.
pub const SPEC_SECTIONS: [&str; 12] = [
    "product",
    "scope",
    "personas",
    "requirements",
    "workflows",
    "data_model",
    "api",
    "ui",
    "non_functionals",
    "acceptance",
    "plan",
    "trace",
];

/// Wraps the compiled JSON Schema for specification documents. All
/// twelve sections are required; a document that omits any of them is
/// rejected outright, never patched up.
pub struct SpecValidator {
    validator: Validator,
}

impl SpecValidator {
    pub fn new() -> Result<Self> {
        let validator = Validator::new(&specification_schema())
            .map_err(|e| ElicitError::Config(format!("invalid specification schema: {e}")))?;
        Ok(Self { validator })
    }

    /// Full violation list on failure; conformance is all-or-nothing.
    pub fn check(&self, document: &Value) -> std::result::Result<(), Vec<SchemaViolation>> {
        let violations = self
            .validator
            .iter_errors(document)
            .map(|e| SchemaViolation {
                path: e.instance_path().to_string(),
                message: e.to_string(),
            })
            .collect::<Vec<_>>();

        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}

pub fn specification_schema() -> Value {
    json!({
        "type": "object",
        "required": SPEC_SECTIONS,
        "additionalProperties": false,
        "properties": {
            "product": { "type": "object" },
            "scope": { "type": "object" },
            "personas": { "type": "array" },
            "requirements": { "type": "array" },
            "workflows": { "type": "array" },
            "data_model": { "type": "object" },
            "api": { "type": "object" },
            "ui": { "type": "object" },
            "non_functionals": { "type": "object" },
            "acceptance": { "type": "array" },
            "plan": { "type": "array" },
            "trace": { "type": "object" }
        }
    })
}

/// A minimal schema-valid document: every section present and empty.
/// Useful as a compile target for answerless projects and in tests.
pub fn empty_document() -> Value {
    json!({
        "product": {},
        "scope": {},
        "personas": [],
        "requirements": [],
        "workflows": [],
        "data_model": {},
        "api": {},
        "ui": {},
        "non_functionals": {},
        "acceptance": [],
        "plan": [],
        "trace": {}
    })
}

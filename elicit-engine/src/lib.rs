//! # elicit-engine
//!
//! The compilation and versioning engine: it turns accumulated answers
//! into versioned, machine-consumable specification documents.
//!
//! ## Pipeline
//!
//! Four stages run over the [`elicit_model::StageClient`]:
//!
//! 1. [`planner`] - gap analysis against the target schema sections
//! 2. [`asker`] - question drafting with duplicate suppression
//! 3. [`compiler`] - answers to document + provenance trace
//! 4. [`validator`] - schema conformance (blocking) and trace
//!    coverage / semantic findings (issue-producing)
//!
//! The [`Orchestrator`] coordinates them against a
//! [`elicit_store::ChainStore`], serializing compiles per project and
//! appending snapshots atomically. [`diff::diff_documents`] computes
//! path-addressed structural differences between any two snapshots.
//!
//! All stages are pure transformations over their inputs; the chain
//! store is the only mutable shared state.

pub mod asker;
pub mod compiler;
pub mod diff;
pub mod orchestrator;
pub mod planner;
pub mod schema;
pub mod validator;

pub use asker::{draft_questions, is_duplicate, normalize_paths, normalize_prompt};
pub use compiler::{CompiledDraft, compile_document};
pub use diff::diff_documents;
pub use orchestrator::{Orchestrator, OrchestratorConfig};
pub use planner::analyze_gaps;
pub use schema::{SPEC_SECTIONS, SpecValidator, empty_document, specification_schema};
pub use validator::{check_schema, order_issue_batch, semantic_findings, trace_coverage_issues};

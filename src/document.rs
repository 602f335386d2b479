//! Parsed document model
//!
//! In-memory representation of experiment and build files. Values stay
//! textual here; typed conversion happens when the trial hierarchy is
//! resolved into the flat trial table.
//!
//! Documents are immutable once parsing completes and owned by the caller.

use std::collections::HashMap;

use serde::Serialize;

/// A single `<type> <identifier> <value>` declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Variable {
    pub type_name: String,
    pub identifier: String,
    pub value: String,
}

/// A label plus a repetition count, used both for flat entries in
/// non-trial definitions and for hierarchy references. The count defaults
/// to `"1"` when the source omits it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pair {
    pub label: String,
    pub count: String,
}

impl Pair {
    pub fn new(label: impl Into<String>, count: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            count: count.into(),
        }
    }
}

/// Flat identifier -> variable map of one leaf region.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VariableSection {
    pub params: HashMap<String, Variable>,
}

/// Per-trial parameter map, keyed by field name.
pub type TrialParams = HashMap<String, Variable>;

/// The trial/block/session/experiment reference graph.
///
/// Every label referenced in a `Pair` must resolve to exactly one of the
/// three maps; the resolver rejects anything else.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrialHierarchy {
    pub trial_map: HashMap<String, TrialParams>,
    pub block_map: HashMap<String, Vec<Pair>>,
    pub session_map: HashMap<String, Vec<Pair>>,
    pub experiment: Vec<Pair>,
}

/// A fully parsed experiment (`filetype run`) document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExperimentDocument {
    /// Leaf variable sections keyed by region type (`mf_input`, `activity`,
    /// `trial_spec`).
    pub sections: HashMap<String, VariableSection>,
    pub trial_info: TrialHierarchy,
}

impl ExperimentDocument {
    /// Serialize the document to pretty-printed JSON for inspection.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// A fully parsed build (`filetype build`) document.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildDocument {
    /// Leaf variable sections keyed by region type (`connectivity`,
    /// `activity`).
    pub sections: HashMap<String, VariableSection>,
}

impl BuildDocument {
    /// Serialize the document to pretty-printed JSON for inspection.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

//! Trial hierarchy resolution
//!
//! Fourth stage of the pipeline: expands the parsed
//! experiment/session/block/trial reference graph into the flat per-trial
//! table the simulation engine consumes.
//!
//! String labels are resolved exactly once, into an index-based tree, before
//! any counting or expansion. Unknown labels and reference cycles are
//! rejected at that point with a named error instead of being skipped. The
//! validated tree is then walked twice: once to compute the total trial
//! count (multiplicative over repetition, additive over siblings) and once,
//! depth first in declaration order, to write out the trial names. The name
//! order defines the trial execution order and is deterministic.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::document::{ExperimentDocument, Pair, TrialHierarchy, TrialParams};

/// Fatal resolution failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// A referenced label is not a trial, block, or session.
    UnknownLabel {
        label: String,
        referenced_from: String,
    },
    /// A referenced label appears in more than one of the three maps.
    AmbiguousLabel { label: String },
    /// A block or session (transitively) references itself.
    CyclicReference { label: String },
    /// A repetition count that does not parse as an unsigned integer.
    BadCount { label: String, count: String },
    /// A trial without one of the required per-trial fields.
    MissingField { trial: String, field: String },
    /// A per-trial field value that does not parse as its target type.
    BadFieldValue {
        trial: String,
        field: String,
        value: String,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::UnknownLabel {
                label,
                referenced_from,
            } => write!(
                f,
                "'{referenced_from}' references '{label}', which names no trial, block, or session"
            ),
            ResolveError::AmbiguousLabel { label } => {
                write!(f, "'{label}' names more than one of trial, block, session")
            }
            ResolveError::CyclicReference { label } => {
                write!(f, "'{label}' is part of a reference cycle")
            }
            ResolveError::BadCount { label, count } => {
                write!(f, "repetition count '{count}' for '{label}' is not a number")
            }
            ResolveError::MissingField { trial, field } => {
                write!(f, "trial '{trial}' does not define '{field}'")
            }
            ResolveError::BadFieldValue {
                trial,
                field,
                value,
            } => write!(f, "trial '{trial}': '{field}' value '{value}' does not parse"),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Flat per-trial output consumed by the simulation engine. The eight
/// arrays are parallel and indexable `0..num_trials`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TrialTable {
    pub num_trials: u32,
    pub trial_names: Vec<String>,
    pub use_css: Vec<u32>,
    pub use_pfpc_plasts: Vec<u32>,
    pub use_mfnc_plasts: Vec<u32>,
    pub cs_onsets: Vec<u32>,
    pub cs_lens: Vec<u32>,
    pub cs_percents: Vec<f32>,
    pub use_uss: Vec<u32>,
    pub us_onsets: Vec<u32>,
}

impl TrialTable {
    /// Serialize the table to pretty-printed JSON for inspection.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Expand an experiment document's trial hierarchy into a `TrialTable`.
pub fn expand_trials(document: &ExperimentDocument) -> Result<TrialTable, ResolveError> {
    resolve_trials(&document.trial_info)
}

/// Expand a trial hierarchy into a `TrialTable`.
pub fn resolve_trials(hierarchy: &TrialHierarchy) -> Result<TrialTable, ResolveError> {
    let tree = RefTree::build(hierarchy)?;
    let num_trials = tree.count(tree.root);

    let mut names = Vec::with_capacity(num_trials as usize);
    tree.expand(tree.root, &mut names);
    debug_assert_eq!(names.len(), num_trials as usize);

    let mut table = TrialTable {
        num_trials,
        ..TrialTable::default()
    };
    for name in &names {
        let params = hierarchy
            .trial_map
            .get(name.as_str())
            .ok_or_else(|| ResolveError::UnknownLabel {
                label: name.clone(),
                referenced_from: "experiment".to_string(),
            })?;
        table.use_css.push(field_u32(params, name, "use_cs")?);
        table
            .use_pfpc_plasts
            .push(field_u32(params, name, "use_pfpc_plast")?);
        table
            .use_mfnc_plasts
            .push(field_u32(params, name, "use_mfnc_plast")?);
        table.cs_onsets.push(field_u32(params, name, "cs_onset")?);
        table.cs_lens.push(field_u32(params, name, "cs_len")?);
        table
            .cs_percents
            .push(field_f32(params, name, "cs_percent")?);
        table.use_uss.push(field_u32(params, name, "use_us")?);
        table.us_onsets.push(field_u32(params, name, "us_onset")?);
    }
    table.trial_names = names;

    tracing::debug!(num_trials, "resolved trial table");
    Ok(table)
}

/// Total number of trials the hierarchy expands to, without materializing
/// the table. Runs the same label validation as `resolve_trials`.
pub fn calculate_num_trials(hierarchy: &TrialHierarchy) -> Result<u32, ResolveError> {
    let tree = RefTree::build(hierarchy)?;
    Ok(tree.count(tree.root))
}

enum Node {
    /// Leaf: a trial label.
    Trial(String),
    /// Block, session, or the experiment root: child node plus repetition
    /// count, in declaration order.
    Group(Vec<(usize, u32)>),
}

/// The validated, acyclic, index-based form of the hierarchy.
struct RefTree {
    nodes: Vec<Node>,
    root: usize,
}

/// Label resolution state during tree construction. `InProgress` marks a
/// label on the current DFS path, so hitting it again is a cycle.
enum Slot {
    InProgress,
    Done(usize),
}

impl RefTree {
    fn build(hierarchy: &TrialHierarchy) -> Result<Self, ResolveError> {
        let mut tree = RefTree {
            nodes: Vec::new(),
            root: 0,
        };
        let mut slots: HashMap<String, Slot> = HashMap::new();
        let children =
            tree.resolve_pairs(&hierarchy.experiment, "experiment", hierarchy, &mut slots)?;
        tree.root = tree.push(Node::Group(children));
        Ok(tree)
    }

    fn push(&mut self, node: Node) -> usize {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn resolve_pairs(
        &mut self,
        pairs: &[Pair],
        referenced_from: &str,
        hierarchy: &TrialHierarchy,
        slots: &mut HashMap<String, Slot>,
    ) -> Result<Vec<(usize, u32)>, ResolveError> {
        let mut children = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let count: u32 = pair.count.parse().map_err(|_| ResolveError::BadCount {
                label: pair.label.clone(),
                count: pair.count.clone(),
            })?;
            let child = self.resolve_label(&pair.label, referenced_from, hierarchy, slots)?;
            children.push((child, count));
        }
        Ok(children)
    }

    fn resolve_label(
        &mut self,
        label: &str,
        referenced_from: &str,
        hierarchy: &TrialHierarchy,
        slots: &mut HashMap<String, Slot>,
    ) -> Result<usize, ResolveError> {
        match slots.get(label) {
            Some(Slot::Done(index)) => return Ok(*index),
            Some(Slot::InProgress) => {
                return Err(ResolveError::CyclicReference {
                    label: label.to_string(),
                })
            }
            None => {}
        }

        let is_trial = hierarchy.trial_map.contains_key(label);
        let block = hierarchy.block_map.get(label);
        let session = hierarchy.session_map.get(label);
        let hits = usize::from(is_trial) + usize::from(block.is_some()) + usize::from(session.is_some());
        if hits > 1 {
            return Err(ResolveError::AmbiguousLabel {
                label: label.to_string(),
            });
        }

        let index = if is_trial {
            self.push(Node::Trial(label.to_string()))
        } else if let Some(pairs) = block.or(session) {
            slots.insert(label.to_string(), Slot::InProgress);
            let children = self.resolve_pairs(pairs, label, hierarchy, slots)?;
            self.push(Node::Group(children))
        } else {
            return Err(ResolveError::UnknownLabel {
                label: label.to_string(),
                referenced_from: referenced_from.to_string(),
            });
        };
        slots.insert(label.to_string(), Slot::Done(index));
        Ok(index)
    }

    /// Trial count of a subtree: 1 for a leaf, otherwise the sum over
    /// children of count times the child's own total.
    fn count(&self, index: usize) -> u32 {
        match &self.nodes[index] {
            Node::Trial(_) => 1,
            Node::Group(children) => children
                .iter()
                .map(|(child, count)| count * self.count(*child))
                .sum(),
        }
    }

    /// Depth-first name expansion in declaration order.
    fn expand(&self, index: usize, names: &mut Vec<String>) {
        if let Node::Group(children) = &self.nodes[index] {
            for (child, count) in children {
                match &self.nodes[*child] {
                    Node::Trial(name) => {
                        names.extend(std::iter::repeat(name.clone()).take(*count as usize));
                    }
                    Node::Group(_) => {
                        for _ in 0..*count {
                            self.expand(*child, names);
                        }
                    }
                }
            }
        }
    }
}

fn field_u32(params: &TrialParams, trial: &str, field: &str) -> Result<u32, ResolveError> {
    let var = params.get(field).ok_or_else(|| ResolveError::MissingField {
        trial: trial.to_string(),
        field: field.to_string(),
    })?;
    var.value.parse().map_err(|_| ResolveError::BadFieldValue {
        trial: trial.to_string(),
        field: field.to_string(),
        value: var.value.clone(),
    })
}

fn field_f32(params: &TrialParams, trial: &str, field: &str) -> Result<f32, ResolveError> {
    let var = params.get(field).ok_or_else(|| ResolveError::MissingField {
        trial: trial.to_string(),
        field: field.to_string(),
    })?;
    var.value.parse().map_err(|_| ResolveError::BadFieldValue {
        trial: trial.to_string(),
        field: field.to_string(),
        value: var.value.clone(),
    })
}

//! The externally observable exploration snapshot.

use super::step::Step;
use crate::graph::Graph;
use crate::knowledge::{Decomposition, KnowledgeSource};
use crate::primitives::MAX_INPUT_LENGTH;
use crate::{DexploreError, GraphKind, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Snapshot of one exploration.
///
/// Replaced wholesale on every transition. Readers never mutate it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorationState {
    pub step: Step,
    pub system: String,
    #[serde(default)]
    pub situation: Option<String>,
    #[serde(default)]
    pub problem: Option<String>,
    #[serde(default)]
    pub intention: Option<String>,

    /// FIFO worklist of systems still to explore.
    #[serde(default)]
    pub pending_subsystems: VecDeque<String>,

    /// Placeholder node for each entry of `pending_subsystems`, same order.
    #[serde(default)]
    pub pending_anchors: VecDeque<NodeId>,

    /// Placeholder the current system's situation hangs off, until used.
    #[serde(default)]
    pub anchor: Option<NodeId>,

    #[serde(default)]
    pub suggested_situation: Option<String>,
    #[serde(default)]
    pub available_situations: Vec<String>,
    #[serde(default)]
    pub suggested_problem: Option<String>,
    #[serde(default)]
    pub available_problems: Vec<String>,
    #[serde(default)]
    pub suggested_intention: Option<String>,
    #[serde(default)]
    pub available_intentions: Vec<String>,

    #[serde(default)]
    pub can_decompose: bool,
    #[serde(default)]
    pub can_apply_solution: bool,
    #[serde(default)]
    pub suggested_decomposition: Option<Decomposition>,
    #[serde(default)]
    pub available_solutions: Vec<String>,

    #[serde(default)]
    pub message: String,

    /// The DE graph recorded so far.
    pub graph: Graph,
}

impl ExplorationState {
    /// Begin exploring `system` with an empty DE graph.
    pub fn start<K>(system: &str, knowledge: &K) -> Result<Self, DexploreError>
    where
        K: KnowledgeSource + ?Sized,
    {
        let system = require_text("system", system)?;
        let mut state = Self {
            step: Step::SituationAssessment,
            system: String::new(),
            situation: None,
            problem: None,
            intention: None,
            pending_subsystems: VecDeque::new(),
            pending_anchors: VecDeque::new(),
            anchor: None,
            suggested_situation: None,
            available_situations: Vec::new(),
            suggested_problem: None,
            available_problems: Vec::new(),
            suggested_intention: None,
            available_intentions: Vec::new(),
            can_decompose: false,
            can_apply_solution: false,
            suggested_decomposition: None,
            available_solutions: Vec::new(),
            message: String::new(),
            graph: Graph::new(GraphKind::De),
        };
        state.enter_system(system, knowledge);
        state.message = format!("Assess the situation for system: {system}");
        Ok(state)
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.step.is_terminal()
    }

    /// Switch to a new system at situation assessment, dropping every
    /// per-system value of the previous one.
    pub(crate) fn enter_system<K>(&mut self, system: &str, knowledge: &K)
    where
        K: KnowledgeSource + ?Sized,
    {
        self.clear_step_fields();
        self.step = Step::SituationAssessment;
        self.system = system.to_string();
        self.suggested_situation = knowledge.suggest_situation(system);
        self.available_situations = knowledge.situations();
    }

    pub(crate) fn clear_step_fields(&mut self) {
        self.anchor = None;
        self.situation = None;
        self.problem = None;
        self.intention = None;
        self.suggested_situation = None;
        self.available_situations.clear();
        self.suggested_problem = None;
        self.available_problems.clear();
        self.suggested_intention = None;
        self.available_intentions.clear();
        self.can_decompose = false;
        self.can_apply_solution = false;
        self.suggested_decomposition = None;
        self.available_solutions.clear();
    }
}

/// Trim a user-supplied value and reject it when blank or oversized.
pub(crate) fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, DexploreError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DexploreError::Validation(format!("{field} must not be empty")));
    }
    if trimmed.len() > MAX_INPUT_LENGTH {
        return Err(DexploreError::Validation(format!(
            "{field} exceeds {MAX_INPUT_LENGTH} bytes"
        )));
    }
    Ok(trimmed)
}

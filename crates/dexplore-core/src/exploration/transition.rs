//! The pure transition function.
//!
//! Each accepted event appends to the DE graph and advances the step.
//! Work happens on a copy of the state: an error at any point returns
//! before the copy escapes, so a rejected event changes nothing.

use super::state::{ExplorationState, require_text};
use super::step::{Event, Step};
use crate::graph::{Graph, GraphEdge, GraphNode};
use crate::knowledge::KnowledgeSource;
use crate::primitives::{
    DECOMPOSITION_PREFIX, INTENTION_PREFIX, MAX_DECOMPOSITION_PAIRS, PROBLEM_PREFIX,
    SITUATION_PREFIX, SOLUTION_PREFIX, SUBSYSTEM_PLACEHOLDER_KIND, SUBSYSTEM_PREFIX,
};
use crate::{DexploreError, NodeId, NodeKind};
use std::collections::BTreeSet;

// =============================================================================
// VALIDATION
// =============================================================================

/// Check that `event` is acceptable in `state` without touching anything.
pub fn validate(state: &ExplorationState, event: &Event) -> Result<(), DexploreError> {
    if state.step.is_terminal() {
        return Err(DexploreError::TerminalState);
    }
    if event.accepted_in() != state.step {
        return Err(DexploreError::Validation(format!(
            "'{}' is not accepted during {}",
            event.name(),
            state.step
        )));
    }

    match event {
        Event::Situation { situation } => require_text("situation", situation).map(|_| ()),
        Event::Problem { problem } => require_text("problem", problem).map(|_| ()),
        Event::Intention { intention } => require_text("intention", intention).map(|_| ()),
        Event::Decompose {
            sub_intentions,
            sub_systems,
        } => decomposition_pairs(sub_intentions, sub_systems).map(|_| ()),
        Event::Solution { solution } => {
            let solution = require_text("solution", solution)?;
            if state.available_solutions.iter().any(|s| s == solution) {
                Ok(())
            } else {
                Err(DexploreError::InvalidChoice {
                    choice: solution.to_string(),
                })
            }
        }
    }
}

/// Pair sub-intentions with sub-systems by position.
///
/// Pairs blank on both sides are dropped. A pair blank on one side only is
/// malformed. At least one pair must remain.
pub fn decomposition_pairs(
    sub_intentions: &[String],
    sub_systems: &[String],
) -> Result<Vec<(String, String)>, DexploreError> {
    let len = sub_intentions.len().max(sub_systems.len());
    let mut pairs = Vec::new();

    for i in 0..len {
        let intention = sub_intentions.get(i).map_or("", |s| s.trim());
        let system = sub_systems.get(i).map_or("", |s| s.trim());
        match (intention.is_empty(), system.is_empty()) {
            (true, true) => continue,
            (false, false) => {
                let intention = require_text("sub-intention", intention)?;
                let system = require_text("sub-system", system)?;
                pairs.push((intention.to_string(), system.to_string()));
            }
            _ => {
                return Err(DexploreError::Validation(format!(
                    "decomposition pair {} is missing its {}",
                    i + 1,
                    if intention.is_empty() { "sub-intention" } else { "sub-system" }
                )));
            }
        }
    }

    if pairs.is_empty() {
        return Err(DexploreError::Validation(
            "decomposition needs at least one sub-intention/sub-system pair".to_string(),
        ));
    }
    if pairs.len() > MAX_DECOMPOSITION_PAIRS {
        return Err(DexploreError::Validation(format!(
            "decomposition exceeds {MAX_DECOMPOSITION_PAIRS} pairs"
        )));
    }
    Ok(pairs)
}

// =============================================================================
// TRANSITION
// =============================================================================

/// Apply one event, returning the next state.
pub fn transition<K>(
    state: &ExplorationState,
    event: Event,
    knowledge: &K,
) -> Result<ExplorationState, DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    validate(state, &event)?;
    let mut next = state.clone();

    match event {
        Event::Situation { situation } => assess_situation(&mut next, situation.trim(), knowledge)?,
        Event::Problem { problem } => identify_problem(&mut next, problem.trim(), knowledge)?,
        Event::Intention { intention } => {
            establish_intention(&mut next, intention.trim(), knowledge)?;
        }
        Event::Decompose {
            sub_intentions,
            sub_systems,
        } => {
            let pairs = decomposition_pairs(&sub_intentions, &sub_systems)?;
            decompose(&mut next, pairs, knowledge)?;
        }
        Event::Solution { solution } => apply_solution(&mut next, solution.trim(), knowledge)?,
    }
    Ok(next)
}

fn assess_situation<K>(
    next: &mut ExplorationState,
    situation: &str,
    knowledge: &K,
) -> Result<(), DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    let anchor = next.anchor.take().or_else(|| last_id(&next.graph));
    let node = GraphNode::new(
        next_id(&next.graph, SITUATION_PREFIX),
        NodeKind::SituationAssessment,
    )
    .with_system(next.system.as_str())
    .with_situation(situation);
    append(&mut next.graph, node, anchor)?;

    next.situation = Some(situation.to_string());
    next.suggested_problem = knowledge.suggest_problem(&next.system, situation);
    next.available_problems = knowledge.problems();
    next.step = Step::ProblemIdentification;
    next.message = format!("Identify problems for system in situation: {situation}");
    Ok(())
}

fn identify_problem<K>(
    next: &mut ExplorationState,
    problem: &str,
    knowledge: &K,
) -> Result<(), DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    let anchor = last_id(&next.graph);
    let node = GraphNode::new(
        next_id(&next.graph, PROBLEM_PREFIX),
        NodeKind::ProblemIdentification,
    )
    .with_system(next.system.as_str())
    .with_problem(problem);
    append(&mut next.graph, node, anchor)?;

    next.problem = Some(problem.to_string());
    next.suggested_intention = knowledge.suggest_intention(problem);
    next.available_intentions = knowledge.intentions();
    next.step = Step::EstablishIntention;
    next.message = format!("Establish intention to solve problem: {problem}");
    Ok(())
}

fn establish_intention<K>(
    next: &mut ExplorationState,
    intention: &str,
    knowledge: &K,
) -> Result<(), DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    let anchor = last_id(&next.graph);
    let node = GraphNode::new(
        next_id(&next.graph, INTENTION_PREFIX),
        NodeKind::EstablishIntention,
    )
    .with_system(next.system.as_str())
    .with_intention(intention);
    append(&mut next.graph, node, anchor)?;

    // Advisory only: the user still picks the branch.
    let suggested = knowledge
        .decomposition(&next.system, intention)
        .filter(|d| !d.is_empty());
    next.intention = Some(intention.to_string());
    next.can_decompose = suggested.is_some();
    next.suggested_decomposition = suggested;
    next.available_solutions = knowledge.solutions(&next.system);
    next.can_apply_solution = !next.available_solutions.is_empty();
    next.step = Step::ChoosePath;
    next.message = "Choose next step: decompose intention or apply solution?".to_string();
    Ok(())
}

fn decompose<K>(
    next: &mut ExplorationState,
    pairs: Vec<(String, String)>,
    knowledge: &K,
) -> Result<(), DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    let (sub_intentions, sub_systems): (Vec<String>, Vec<String>) = pairs.into_iter().unzip();

    let anchor = last_id(&next.graph);
    let decomposition_id = next_id(&next.graph, DECOMPOSITION_PREFIX);
    let mut node = GraphNode::new(decomposition_id.clone(), NodeKind::DecomposeIntention)
        .with_system(next.system.as_str())
        .with_decomposition(sub_intentions.clone(), sub_systems.clone());
    if let Some(intention) = &next.intention {
        node = node.with_intention(intention.as_str());
    }
    append(&mut next.graph, node, anchor)?;

    let mut placeholders = Vec::with_capacity(sub_systems.len());
    let mut enqueued = BTreeSet::new();
    for (intention, system) in sub_intentions.iter().zip(&sub_systems) {
        let node = GraphNode::new(
            next_id(&next.graph, SUBSYSTEM_PREFIX),
            NodeKind::Other(SUBSYSTEM_PLACEHOLDER_KIND.to_string()),
        )
        .with_intention(intention.as_str())
        .with_subsystem(system.as_str());
        let id = node.id.clone();
        append(&mut next.graph, node, Some(decomposition_id.clone()))?;

        // One pending entry per distinct sub-system, anchored at its first placeholder.
        if *system != next.system && enqueued.insert(system.clone()) {
            next.pending_subsystems.push_back(system.clone());
            next.pending_anchors.push_back(id.clone());
        }
        placeholders.push(id);
    }
    next.graph.merge_hierarchy(&decomposition_id, &placeholders)?;

    advance(next, knowledge);
    Ok(())
}

fn apply_solution<K>(
    next: &mut ExplorationState,
    solution: &str,
    knowledge: &K,
) -> Result<(), DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    let anchor = last_id(&next.graph);
    let node = GraphNode::new(
        next_id(&next.graph, SOLUTION_PREFIX),
        NodeKind::SolutionAssignment,
    )
    .with_system(next.system.as_str())
    .with_solution(solution)
    .with_subsystem(format!("{}_{}", next.system, solution));
    append(&mut next.graph, node, anchor)?;

    advance(next, knowledge);
    Ok(())
}

/// Pop the next pending system, or complete when none is left.
fn advance<K>(next: &mut ExplorationState, knowledge: &K)
where
    K: KnowledgeSource + ?Sized,
{
    match next.pending_subsystems.pop_front() {
        Some(system) => {
            let anchor = next.pending_anchors.pop_front();
            next.enter_system(&system, knowledge);
            next.anchor = anchor;
            next.message = format!("Explore subsystem: {system}");
        }
        None => {
            next.clear_step_fields();
            next.step = Step::Completed;
            next.message = "Design exploration completed!".to_string();
        }
    }
}

// =============================================================================
// GRAPH HELPERS
// =============================================================================

/// `<PREFIX>_<n>` where `n` is the node count after insertion.
fn next_id(graph: &Graph, prefix: &str) -> NodeId {
    NodeId::sequential(prefix, graph.node_count() + 1)
}

fn last_id(graph: &Graph) -> Option<NodeId> {
    graph.last_node().map(|n| n.id.clone())
}

fn append(graph: &mut Graph, node: GraphNode, from: Option<NodeId>) -> Result<(), DexploreError> {
    let id = node.id.clone();
    graph.add_node(node)?;
    if let Some(source) = from {
        graph.add_edge(GraphEdge::new(source, id))?;
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

//! Automatic exploration: always take what the knowledge base suggests.

use super::state::ExplorationState;
use super::step::{Event, Step};
use super::transition::transition;
use crate::DexploreError;
use crate::knowledge::KnowledgeSource;

/// The event the knowledge base would pick in `state`.
///
/// Suggestion first, else the first candidate. At the branch, a suggested
/// decomposition wins over the first solution.
pub fn suggested_event(state: &ExplorationState) -> Result<Event, DexploreError> {
    let missing = |what: &str| {
        DexploreError::Validation(format!("no {what} known for system: {}", state.system))
    };

    match state.step {
        Step::SituationAssessment => pick(&state.suggested_situation, &state.available_situations)
            .map(Event::situation)
            .ok_or_else(|| missing("situation")),
        Step::ProblemIdentification => pick(&state.suggested_problem, &state.available_problems)
            .map(Event::problem)
            .ok_or_else(|| missing("problem")),
        Step::EstablishIntention => pick(&state.suggested_intention, &state.available_intentions)
            .map(Event::intention)
            .ok_or_else(|| missing("intention")),
        Step::ChoosePath => {
            if let Some(split) = state.suggested_decomposition.as_ref().filter(|d| !d.is_empty()) {
                Ok(Event::decompose(split.intentions.clone(), split.systems.clone()))
            } else {
                state
                    .available_solutions
                    .first()
                    .cloned()
                    .map(Event::solution)
                    .ok_or_else(|| missing("decomposition or solution"))
            }
        }
        Step::Completed => Err(DexploreError::TerminalState),
    }
}

fn pick(suggested: &Option<String>, available: &[String]) -> Option<String> {
    suggested.clone().or_else(|| available.first().cloned())
}

/// Drive a whole exploration of `system` from suggestions alone.
///
/// Fails when a step has nothing to suggest or when `max_steps`
/// transitions pass without completing.
pub fn auto_explore<K>(
    system: &str,
    knowledge: &K,
    max_steps: usize,
) -> Result<ExplorationState, DexploreError>
where
    K: KnowledgeSource + ?Sized,
{
    let mut state = ExplorationState::start(system, knowledge)?;
    for _ in 0..max_steps {
        if state.is_completed() {
            return Ok(state);
        }
        let event = suggested_event(&state)?;
        state = transition(&state, event, knowledge)?;
    }
    if state.is_completed() {
        Ok(state)
    } else {
        Err(DexploreError::Validation(format!(
            "exploration of '{}' did not complete within {max_steps} steps",
            system.trim()
        )))
    }
}

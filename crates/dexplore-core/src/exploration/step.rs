//! Protocol steps and the events that drive them.

use serde::{Deserialize, Serialize};

// =============================================================================
// STEP
// =============================================================================

/// State of the exploration protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Initial state for every system, including popped subsystems.
    SituationAssessment,
    ProblemIdentification,
    EstablishIntention,
    /// Branch: decompose the intention or apply a solution.
    ChoosePath,
    /// Terminal. No further input is accepted.
    Completed,
}

impl Step {
    /// Wire name of the step.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Step::SituationAssessment => "situation_assessment",
            Step::ProblemIdentification => "problem_identification",
            Step::EstablishIntention => "establish_intention",
            Step::ChoosePath => "choose_path",
            Step::Completed => "completed",
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Step::Completed)
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// EVENT
// =============================================================================

/// One user submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Event {
    Situation {
        situation: String,
    },
    Problem {
        problem: String,
    },
    Intention {
        intention: String,
    },
    /// Positional `(sub_intention, sub_system)` pairs.
    Decompose {
        sub_intentions: Vec<String>,
        sub_systems: Vec<String>,
    },
    Solution {
        solution: String,
    },
}

impl Event {
    /// Wire name of the action.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Event::Situation { .. } => "situation",
            Event::Problem { .. } => "problem",
            Event::Intention { .. } => "intention",
            Event::Decompose { .. } => "decompose",
            Event::Solution { .. } => "solution",
        }
    }

    /// The step in which this event is accepted.
    #[must_use]
    pub fn accepted_in(&self) -> Step {
        match self {
            Event::Situation { .. } => Step::SituationAssessment,
            Event::Problem { .. } => Step::ProblemIdentification,
            Event::Intention { .. } => Step::EstablishIntention,
            Event::Decompose { .. } | Event::Solution { .. } => Step::ChoosePath,
        }
    }

    pub fn situation(situation: impl Into<String>) -> Self {
        Event::Situation {
            situation: situation.into(),
        }
    }

    pub fn problem(problem: impl Into<String>) -> Self {
        Event::Problem {
            problem: problem.into(),
        }
    }

    pub fn intention(intention: impl Into<String>) -> Self {
        Event::Intention {
            intention: intention.into(),
        }
    }

    pub fn decompose<I, S>(sub_intentions: I, sub_systems: S) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
        S: IntoIterator,
        S::Item: Into<String>,
    {
        Event::Decompose {
            sub_intentions: sub_intentions.into_iter().map(Into::into).collect(),
            sub_systems: sub_systems.into_iter().map(Into::into).collect(),
        }
    }

    pub fn solution(solution: impl Into<String>) -> Self {
        Event::Solution {
            solution: solution.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_use_snake_case_on_the_wire() {
        let json = serde_json::to_string(&Step::ChoosePath).expect("ser");
        assert_eq!(json, "\"choose_path\"");
        assert_eq!(Step::ChoosePath.to_string(), "choose_path");
        assert!(Step::Completed.is_terminal());
        assert!(!Step::SituationAssessment.is_terminal());
    }

    #[test]
    fn events_are_tagged_by_action() {
        let event = Event::decompose(["a"], ["b"]);
        let value = serde_json::to_value(&event).expect("ser");
        assert_eq!(value["action"], "decompose");
        assert_eq!(value["sub_systems"][0], "b");

        let parsed: Event =
            serde_json::from_str(r#"{"action":"solution","solution":"brake"}"#).expect("de");
        assert_eq!(parsed, Event::solution("brake"));
        assert_eq!(parsed.accepted_in(), Step::ChoosePath);
    }
}

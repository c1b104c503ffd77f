//! # Knowledge Base
//!
//! Supplies the suggestions and candidate lists surfaced at each step of an
//! exploration. The state machine only sees the `KnowledgeSource` trait, so
//! any backing store can be plugged in; `KnowledgeBase` is the in-memory one.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// A suggested split of one intention into sub-intentions, each paired
/// positionally with the sub-system responsible for it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Decomposition {
    pub intentions: Vec<String>,
    pub systems: Vec<String>,
}

impl Decomposition {
    #[must_use]
    pub fn new(intentions: &[&str], systems: &[&str]) -> Self {
        Self {
            intentions: intentions.iter().map(|s| (*s).to_string()).collect(),
            systems: systems.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.intentions.is_empty() && self.systems.is_empty()
    }
}

/// Read-only source of domain knowledge.
pub trait KnowledgeSource {
    /// Suggested situation for a system.
    fn suggest_situation(&self, system: &str) -> Option<String>;

    /// Every known situation.
    fn situations(&self) -> Vec<String>;

    /// Suggested problem for a system in a situation.
    fn suggest_problem(&self, system: &str, situation: &str) -> Option<String>;

    /// Every known problem.
    fn problems(&self) -> Vec<String>;

    /// Suggested intention for solving a problem.
    fn suggest_intention(&self, problem: &str) -> Option<String>;

    /// Every known intention, including decomposition sub-intentions.
    fn intentions(&self) -> Vec<String>;

    /// Suggested decomposition of an intention within a system.
    fn decomposition(&self, system: &str, intention: &str) -> Option<Decomposition>;

    /// Candidate solutions for a system.
    fn solutions(&self, system: &str) -> Vec<String>;
}

// =============================================================================
// IN-MEMORY KNOWLEDGE BASE
// =============================================================================

/// In-memory knowledge base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    situations: BTreeMap<String, String>,
    problems: BTreeMap<(String, String), String>,
    intentions: BTreeMap<String, String>,
    decompositions: BTreeMap<(String, String), Decomposition>,
    solutions: BTreeMap<String, Vec<String>>,
}

impl KnowledgeBase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The reference collision-avoidance domain.
    #[must_use]
    pub fn collision_avoidance() -> Self {
        let mut kb = Self::new();
        kb.add_situation("car_running", "obstacle_detected");
        kb.add_situation("auto_maneuvering_system", "normal_driving");
        kb.add_situation("human_maneuvering_system", "low_visibility");

        kb.add_problem("car_running", "obstacle_detected", "collision_risk");
        kb.add_problem("human_maneuvering_system", "low_visibility", "visibility_impaired");

        kb.add_intention("collision_risk", "avoid_collision");
        kb.add_intention("visibility_impaired", "support_driver_in_low_visibility");

        kb.add_decomposition(
            "car_running",
            "avoid_collision",
            Decomposition::new(
                &["avoid_by_car", "avoid_by_driver"],
                &["auto_maneuvering_system", "human_maneuvering_system"],
            ),
        );
        kb.add_decomposition(
            "human_maneuvering_system",
            "support_driver_in_low_visibility",
            Decomposition::new(
                &["alarm_obstacle", "guide_maneuvering"],
                &["obstacle_alarming_system", "maneuvering_guiding_system"],
            ),
        );

        kb.add_solutions(
            "auto_maneuvering_system",
            &["automatic_braking", "automatic_steering"],
        );
        kb.add_solutions("obstacle_alarming_system", &["visual_alarm", "audio_alarm"]);
        kb.add_solutions(
            "maneuvering_guiding_system",
            &["haptic_feedback", "visual_guidance"],
        );
        kb
    }

    pub fn add_situation(&mut self, system: &str, situation: &str) -> &mut Self {
        self.situations.insert(system.to_string(), situation.to_string());
        self
    }

    pub fn add_problem(&mut self, system: &str, situation: &str, problem: &str) -> &mut Self {
        self.problems.insert(
            (system.to_string(), situation.to_string()),
            problem.to_string(),
        );
        self
    }

    pub fn add_intention(&mut self, problem: &str, intention: &str) -> &mut Self {
        self.intentions.insert(problem.to_string(), intention.to_string());
        self
    }

    pub fn add_decomposition(
        &mut self,
        system: &str,
        intention: &str,
        decomposition: Decomposition,
    ) -> &mut Self {
        self.decompositions.insert(
            (system.to_string(), intention.to_string()),
            decomposition,
        );
        self
    }

    /// Add candidate solutions for a system, skipping ones already listed.
    pub fn add_solutions(&mut self, system: &str, solutions: &[&str]) -> &mut Self {
        let listed = self.solutions.entry(system.to_string()).or_default();
        for solution in solutions {
            if !listed.iter().any(|s| s == solution) {
                listed.push((*solution).to_string());
            }
        }
        self
    }

    /// Every system name the knowledge base mentions, sorted.
    #[must_use]
    pub fn all_systems(&self) -> Vec<String> {
        let mut systems: BTreeSet<&str> = BTreeSet::new();
        systems.extend(self.situations.keys().map(String::as_str));
        systems.extend(self.problems.keys().map(|(s, _)| s.as_str()));
        systems.extend(self.solutions.keys().map(String::as_str));
        for ((system, _), decomposition) in &self.decompositions {
            systems.insert(system);
            systems.extend(decomposition.systems.iter().map(String::as_str));
        }
        systems.into_iter().map(str::to_string).collect()
    }

    /// Serializable dump of every entry.
    #[must_use]
    pub fn snapshot(&self) -> KnowledgeSnapshot {
        KnowledgeSnapshot {
            situations: self
                .situations
                .iter()
                .map(|(system, situation)| SituationEntry {
                    system: system.clone(),
                    situation: situation.clone(),
                })
                .collect(),
            problems: self
                .problems
                .iter()
                .map(|((system, situation), problem)| ProblemEntry {
                    system: system.clone(),
                    situation: situation.clone(),
                    problem: problem.clone(),
                })
                .collect(),
            intentions: self
                .intentions
                .iter()
                .map(|(problem, intention)| IntentionEntry {
                    problem: problem.clone(),
                    intention: intention.clone(),
                })
                .collect(),
            decompositions: self
                .decompositions
                .iter()
                .map(|((system, intention), decomposition)| DecompositionEntry {
                    system: system.clone(),
                    intention: intention.clone(),
                    decomposition: decomposition.clone(),
                })
                .collect(),
            solutions: self.solutions.clone(),
        }
    }
}

impl From<KnowledgeSnapshot> for KnowledgeBase {
    fn from(snapshot: KnowledgeSnapshot) -> Self {
        let mut kb = Self::new();
        for e in snapshot.situations {
            kb.situations.insert(e.system, e.situation);
        }
        for e in snapshot.problems {
            kb.problems.insert((e.system, e.situation), e.problem);
        }
        for e in snapshot.intentions {
            kb.intentions.insert(e.problem, e.intention);
        }
        for e in snapshot.decompositions {
            kb.decompositions.insert((e.system, e.intention), e.decomposition);
        }
        kb.solutions = snapshot.solutions;
        kb
    }
}

impl KnowledgeSource for KnowledgeBase {
    fn suggest_situation(&self, system: &str) -> Option<String> {
        self.situations.get(system).cloned()
    }

    fn situations(&self) -> Vec<String> {
        distinct(self.situations.values())
    }

    fn suggest_problem(&self, system: &str, situation: &str) -> Option<String> {
        self.problems
            .get(&(system.to_string(), situation.to_string()))
            .cloned()
    }

    fn problems(&self) -> Vec<String> {
        distinct(self.problems.values())
    }

    fn suggest_intention(&self, problem: &str) -> Option<String> {
        self.intentions.get(problem).cloned()
    }

    fn intentions(&self) -> Vec<String> {
        distinct(
            self.intentions
                .values()
                .chain(self.decompositions.values().flat_map(|d| d.intentions.iter())),
        )
    }

    fn decomposition(&self, system: &str, intention: &str) -> Option<Decomposition> {
        self.decompositions
            .get(&(system.to_string(), intention.to_string()))
            .cloned()
    }

    fn solutions(&self, system: &str) -> Vec<String> {
        if let Some(exact) = self.solutions.get(system) {
            return exact.clone();
        }
        let needle = system.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.solutions
            .iter()
            .find(|(name, _)| name.to_lowercase().contains(&needle))
            .map(|(_, solutions)| solutions.clone())
            .unwrap_or_default()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .map(String::as_str)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

// =============================================================================
// SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SituationEntry {
    pub system: String,
    pub situation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemEntry {
    pub system: String,
    pub situation: String,
    pub problem: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentionEntry {
    pub problem: String,
    pub intention: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecompositionEntry {
    pub system: String,
    pub intention: String,
    #[serde(flatten)]
    pub decomposition: Decomposition,
}

/// Flat, serializable form of a `KnowledgeBase`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KnowledgeSnapshot {
    #[serde(default)]
    pub situations: Vec<SituationEntry>,
    #[serde(default)]
    pub problems: Vec<ProblemEntry>,
    #[serde(default)]
    pub intentions: Vec<IntentionEntry>,
    #[serde(default)]
    pub decompositions: Vec<DecompositionEntry>,
    #[serde(default)]
    pub solutions: BTreeMap<String, Vec<String>>,
}

// =============================================================================
// TESTS
// =============================================================================

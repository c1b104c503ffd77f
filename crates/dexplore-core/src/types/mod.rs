//! # Core Type Definitions
//!
//! This module contains the shared vocabulary of the exploration engine:
//! - Node identifiers and type tags (`NodeId`, `NodeKind`)
//! - Graph view tags (`GraphKind`)
//! - Opaque metadata (`Metadata`)
//! - Error types (`DexploreError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Implement `Ord` where they are used as map keys
//! - Use `BTreeMap` for open-ended mappings so serialization order is stable

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a node within one graph.
///
/// Assigned once at creation and never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a node id from anything string-like.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Build the conventional `<PREFIX>_<n>` id.
    #[must_use]
    pub fn sequential(prefix: &str, ordinal: usize) -> Self {
        Self(format!("{prefix}_{ordinal}"))
    }

    /// Borrow the raw id string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Opaque auxiliary key/value pairs attached to nodes and edges.
///
/// Never interpreted by the engine; carried through serialization as-is.
pub type Metadata = BTreeMap<String, serde_json::Value>;

// =============================================================================
// NODE KIND
// =============================================================================

/// Type tag of a graph node.
///
/// The first six variants are design-exploration artifacts, the next five
/// are systems-integration relations. Anything else (including a missing
/// tag) is kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeKind {
    SituationAssessment,
    ProblemIdentification,
    EstablishIntention,
    DecomposeIntention,
    ConditionalBranch,
    SolutionAssignment,
    Condition,
    Backups,
    Collaboration,
    Alternative,
    Exclusive,
    /// Unrecognized tag, resolved to the default style.
    Other(String),
}

impl NodeKind {
    /// Design-exploration artifact kinds, in catalog order.
    pub const DESIGN_EXPLORATION: [NodeKind; 6] = [
        Self::SituationAssessment,
        Self::ProblemIdentification,
        Self::EstablishIntention,
        Self::DecomposeIntention,
        Self::ConditionalBranch,
        Self::SolutionAssignment,
    ];

    /// Systems-integration relation kinds, in catalog order.
    pub const SYSTEMS_INTEGRATION: [NodeKind; 5] = [
        Self::Condition,
        Self::Backups,
        Self::Collaboration,
        Self::Alternative,
        Self::Exclusive,
    ];

    /// The wire tag of this kind.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::SituationAssessment => "SituationAssessment",
            Self::ProblemIdentification => "ProblemIdentification",
            Self::EstablishIntention => "EstablishIntention",
            Self::DecomposeIntention => "DecomposeIntention",
            Self::ConditionalBranch => "ConditionalBranch",
            Self::SolutionAssignment => "SolutionAssignment",
            Self::Condition => "Condition",
            Self::Backups => "Backups",
            Self::Collaboration => "Collaboration",
            Self::Alternative => "Alternative",
            Self::Exclusive => "Exclusive",
            Self::Other(tag) => tag,
        }
    }

    /// Catalog code, e.g. `PI` or `BUP`. Unrecognized tags are their own code.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::SituationAssessment => "SI",
            Self::ProblemIdentification => "PI",
            Self::EstablishIntention => "EI",
            Self::DecomposeIntention => "DI",
            Self::ConditionalBranch => "CB",
            Self::SolutionAssignment => "SA",
            Self::Condition => "CND",
            Self::Backups => "BUP",
            Self::Collaboration => "COL",
            Self::Alternative => "ALT",
            Self::Exclusive => "EXO",
            Self::Other(tag) => tag,
        }
    }

    /// Human-readable name, e.g. "Problem Identification".
    #[must_use]
    pub fn display_name(&self) -> String {
        let tag = self.as_str();
        let mut name = String::with_capacity(tag.len() + 2);
        for (i, c) in tag.char_indices() {
            if i > 0 && c.is_ascii_uppercase() {
                name.push(' ');
            }
            name.push(c);
        }
        name
    }

    /// Whether the tag belongs to the closed set.
    #[must_use]
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl Default for NodeKind {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

impl From<String> for NodeKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "SituationAssessment" => Self::SituationAssessment,
            "ProblemIdentification" => Self::ProblemIdentification,
            "EstablishIntention" => Self::EstablishIntention,
            "DecomposeIntention" => Self::DecomposeIntention,
            "ConditionalBranch" => Self::ConditionalBranch,
            "SolutionAssignment" => Self::SolutionAssignment,
            "Condition" => Self::Condition,
            "Backups" => Self::Backups,
            "Collaboration" => Self::Collaboration,
            "Alternative" => Self::Alternative,
            "Exclusive" => Self::Exclusive,
            _ => Self::Other(tag),
        }
    }
}

impl From<NodeKind> for String {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// GRAPH KIND
// =============================================================================

/// Which view a graph represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum GraphKind {
    /// Design Exploration: the append-only session history.
    #[serde(rename = "DesignExploration", alias = "DE")]
    De,
    /// Logical Dependency: produced by the external conversion service.
    #[serde(rename = "LogicalDependency", alias = "LD")]
    Ld,
    /// Systems Integration: produced by the external conversion service.
    #[serde(rename = "SystemsIntegration", alias = "SI")]
    Si,
}

impl GraphKind {
    /// Short name used in messages.
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        match self {
            Self::De => "DE",
            Self::Ld => "LD",
            Self::Si => "SI",
        }
    }
}

impl fmt::Display for GraphKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur anywhere in the exploration system.
///
/// - No silent failures
/// - Integrity and protocol errors are contract violations, surfaced without retry
/// - `Service` errors are recoverable: the prior state is kept and the input may be resubmitted
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DexploreError {
    /// A node with this id is already in the graph.
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),

    /// An edge or hierarchy refers to a node that is not in the graph.
    #[error("Dangling reference to node: {0}")]
    DanglingReference(NodeId),

    /// User input is blank, malformed, or otherwise unusable.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The selection is not among the candidates currently offered.
    #[error("Invalid choice '{choice}': not among the offered candidates")]
    InvalidChoice {
        /// The rejected selection.
        choice: String,
    },

    /// Input was submitted after the exploration completed.
    #[error("Exploration already completed; no further input accepted")]
    TerminalState,

    /// The exploration service failed or returned malformed data.
    #[error("Service error: {0}")]
    Service(String),

    /// Input was submitted before an exploration was started.
    #[error("No exploration has been started")]
    NotStarted,

    /// A previous submission is still awaiting its result.
    #[error("A transition is already in flight")]
    TransitionInFlight,

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(String),
}

impl DexploreError {
    /// Whether resubmitting the same input may succeed.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Service(_) | Self::TransitionInFlight)
    }

    /// Stable snake_case name of the variant, used on the wire.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::DuplicateNode(_) => "duplicate_node",
            Self::DanglingReference(_) => "dangling_reference",
            Self::Validation(_) => "validation",
            Self::InvalidChoice { .. } => "invalid_choice",
            Self::TerminalState => "terminal_state",
            Self::Service(_) => "service",
            Self::NotStarted => "not_started",
            Self::TransitionInFlight => "transition_in_flight",
            Self::Serialization(_) => "serialization",
            Self::Io(_) => "io",
        }
    }

    /// The variant's payload without the display prefix, if it has one.
    #[must_use]
    pub fn detail(&self) -> Option<String> {
        match self {
            Self::DuplicateNode(id) | Self::DanglingReference(id) => Some(id.to_string()),
            Self::Validation(msg) | Self::Service(msg) | Self::Serialization(msg) | Self::Io(msg) => {
                Some(msg.clone())
            }
            Self::InvalidChoice { choice } => Some(choice.clone()),
            Self::TerminalState | Self::NotStarted | Self::TransitionInFlight => None,
        }
    }

    /// Rebuild an error from its wire `kind` and `detail`.
    ///
    /// Unknown kinds become `Service`.
    #[must_use]
    pub fn from_parts(kind: &str, detail: Option<String>) -> Self {
        let detail = detail.unwrap_or_default();
        match kind {
            "duplicate_node" => Self::DuplicateNode(NodeId(detail)),
            "dangling_reference" => Self::DanglingReference(NodeId(detail)),
            "validation" => Self::Validation(detail),
            "invalid_choice" => Self::InvalidChoice { choice: detail },
            "terminal_state" => Self::TerminalState,
            "not_started" => Self::NotStarted,
            "transition_in_flight" => Self::TransitionInFlight,
            "serialization" => Self::Serialization(detail),
            "io" => Self::Io(detail),
            _ => Self::Service(detail),
        }
    }
}

impl From<std::io::Error> for DexploreError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for DexploreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_roundtrips_known_tags() {
        for tag in ["SituationAssessment", "Backups", "Exclusive"] {
            let kind = NodeKind::from(tag.to_string());
            assert!(kind.is_recognized());
            assert_eq!(String::from(kind), tag);
        }
    }

    #[test]
    fn node_kind_keeps_unknown_tag() {
        let kind = NodeKind::from("Subsystem".to_string());
        assert_eq!(kind, NodeKind::Other("Subsystem".to_string()));
        assert!(!kind.is_recognized());
        assert_eq!(kind.as_str(), "Subsystem");
    }

    #[test]
    fn catalog_covers_every_recognized_kind() {
        let codes: Vec<_> = NodeKind::DESIGN_EXPLORATION
            .iter()
            .chain(&NodeKind::SYSTEMS_INTEGRATION)
            .map(|kind| kind.code().to_string())
            .collect();
        assert_eq!(
            codes,
            ["SI", "PI", "EI", "DI", "CB", "SA", "CND", "BUP", "COL", "ALT", "EXO"]
        );
        assert_eq!(
            NodeKind::ProblemIdentification.display_name(),
            "Problem Identification"
        );
        assert_eq!(NodeKind::Backups.display_name(), "Backups");
    }

    #[test]
    fn graph_kind_accepts_short_aliases() {
        let long: GraphKind = serde_json::from_str("\"SystemsIntegration\"").expect("long");
        let short: GraphKind = serde_json::from_str("\"SI\"").expect("short");
        assert_eq!(long, GraphKind::Si);
        assert_eq!(short, GraphKind::Si);
        assert_eq!(
            serde_json::to_string(&GraphKind::De).expect("ser"),
            "\"DesignExploration\""
        );
    }

    #[test]
    fn sequential_ids() {
        assert_eq!(NodeId::sequential("SI", 1).as_str(), "SI_1");
    }

    #[test]
    fn only_service_and_in_flight_are_recoverable() {
        assert!(DexploreError::Service("down".into()).is_recoverable());
        assert!(DexploreError::TransitionInFlight.is_recoverable());
        assert!(!DexploreError::TerminalState.is_recoverable());
        assert!(!DexploreError::Validation("x".into()).is_recoverable());
    }

    #[test]
    fn errors_survive_kind_and_detail() {
        let errors = [
            DexploreError::DuplicateNode(NodeId::from("SI_1")),
            DexploreError::Validation("blank".into()),
            DexploreError::InvalidChoice {
                choice: "teleport".into(),
            },
            DexploreError::TerminalState,
            DexploreError::NotStarted,
        ];
        for err in errors {
            let rebuilt = DexploreError::from_parts(err.kind(), err.detail());
            assert_eq!(rebuilt, err);
        }
        assert_eq!(
            DexploreError::from_parts("mystery", Some("boom".into())),
            DexploreError::Service("boom".into())
        );
    }
}

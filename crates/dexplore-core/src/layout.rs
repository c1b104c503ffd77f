//! # Layout Engine
//!
//! Pure placement of an ordered node list onto a fixed grid, plus the
//! type -> colour lookup used to style rendered nodes.
//!
//! Node `i` (0-based, insertion order) lands in column `i mod 3`, row
//! `i / 3`. Appending nodes never moves the ones already placed.

use crate::graph::GraphNode;
use crate::primitives::{COLUMN_SPACING, GRID_COLUMNS, ROW_SPACING};
use crate::{NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// POSITION
// =============================================================================

/// Grid coordinate in layout units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    /// Position of the node at ordinal `index`.
    #[must_use]
    pub fn for_index(index: usize) -> Self {
        let column = (index % GRID_COLUMNS) as i64;
        let row = (index / GRID_COLUMNS) as i64;
        Self {
            x: column.saturating_mul(COLUMN_SPACING),
            y: row.saturating_mul(ROW_SPACING),
        }
    }
}

/// Place every node of the sequence.
///
/// Deterministic and order-dependent. If an id repeats, the later position wins.
#[must_use]
pub fn layout(nodes: &[GraphNode]) -> BTreeMap<NodeId, Position> {
    nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.clone(), Position::for_index(i)))
        .collect()
}

// =============================================================================
// COLOURS
// =============================================================================

/// Fill colour for node types outside the table.
pub const DEFAULT_COLOR: &str = "#CCCCCC";

/// Fill colour for a node type.
#[must_use]
pub fn color_of(kind: &NodeKind) -> &'static str {
    match kind {
        // DE artifacts
        NodeKind::SituationAssessment => "#4A90E2",
        NodeKind::ProblemIdentification => "#E24A4A",
        NodeKind::EstablishIntention => "#4AE290",
        NodeKind::DecomposeIntention => "#E2C44A",
        NodeKind::ConditionalBranch => "#9B4AE2",
        NodeKind::SolutionAssignment => "#E24AC4",
        // SI relations
        NodeKind::Condition => "#FF6B6B",
        NodeKind::Backups => "#4ECDC4",
        NodeKind::Collaboration => "#45B7D1",
        NodeKind::Alternative => "#FFA07A",
        NodeKind::Exclusive => "#98D8C8",
        NodeKind::Other(_) => DEFAULT_COLOR,
    }
}

// =============================================================================
// TESTS
// =============================================================================

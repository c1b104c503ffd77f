//! # dexplore-core
//!
//! The deterministic design-exploration engine - THE LOGIC.
//!
//! A user records design decisions one step at a time (situation, problem,
//! intention, then decomposition or solution) and this crate assembles the
//! append-only Design Exploration (DE) graph of that history, lays it out on
//! a fixed grid and projects it into displayable nodes and edges.
//!
//! ## Architectural Constraints
//!
//! - Pure and synchronous: NO async, NO network, NO logging
//! - Deterministic: `BTreeMap` for every mapping, integer coordinates only
//! - Transitions never partially apply: an error leaves the input state as it was
//! - LD/SI graphs are received as opaque values; their derivation lives elsewhere

// =============================================================================
// MODULES
// =============================================================================

pub mod exploration;
pub mod graph;
pub mod knowledge;
pub mod layout;
pub mod primitives;
pub mod render;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{DexploreError, GraphKind, Metadata, NodeId, NodeKind};

// =============================================================================
// RE-EXPORTS: Graph, Layout, Rendering
// =============================================================================

pub use graph::{Graph, GraphEdge, GraphNode};
pub use layout::{DEFAULT_COLOR, Position, color_of, layout};
pub use render::{Rendering, RenderedEdge, RenderedNode, render};

// =============================================================================
// RE-EXPORTS: Exploration
// =============================================================================

pub use exploration::{
    Event, ExplorationState, Step, auto_explore, decomposition_pairs, suggested_event, transition,
    validate,
};
pub use knowledge::{Decomposition, KnowledgeBase, KnowledgeSnapshot, KnowledgeSource};
pub use primitives::DEFAULT_AUTO_STEPS;

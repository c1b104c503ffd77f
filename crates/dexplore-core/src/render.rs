//! # Visualization Adapter
//!
//! Projects a `Graph` through the layout engine into displayable nodes and
//! edges. Holds no state across calls and never fails for a graph that
//! passed the insertion checks.

use crate::graph::{Graph, GraphEdge, GraphNode};
use crate::layout::{Position, color_of};
use crate::NodeId;
use serde::{Deserialize, Serialize};

// =============================================================================
// STYLE CONSTANTS
// =============================================================================

pub const TEXT_COLOR: &str = "#fff";
pub const NODE_BORDER: &str = "2px solid #333";
pub const NODE_RADIUS: u32 = 8;
pub const NODE_PADDING: u32 = 10;
pub const NODE_MIN_WIDTH: u32 = 200;

pub const EDGE_KIND: &str = "smoothstep";
pub const EDGE_STROKE: &str = "#333";
pub const EDGE_STROKE_WIDTH: u32 = 2;
pub const ARROW_CLOSED: &str = "arrowclosed";

// =============================================================================
// RENDERED TYPES
// =============================================================================

/// Label of a rendered node: a title plus `"<Field>: <value>"` lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeLabel {
    pub title: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub background: String,
    pub color: String,
    pub border: String,
    pub border_radius: u32,
    pub padding: u32,
    pub min_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderedNode {
    pub id: NodeId,
    pub label: NodeLabel,
    pub position: Position,
    pub style: NodeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedEdge {
    pub id: String,
    pub source: NodeId,
    pub target: NodeId,
    pub label: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub animated: bool,
    pub marker_end: String,
    pub style: EdgeStyle,
}

/// The displayable projection of one graph.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rendering {
    pub nodes: Vec<RenderedNode>,
    pub edges: Vec<RenderedEdge>,
}

// =============================================================================
// RENDER
// =============================================================================

/// Render every node and edge of `graph`, preserving insertion order.
#[must_use]
pub fn render(graph: &Graph) -> Rendering {
    let nodes = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(i, node)| render_node(node, Position::for_index(i)))
        .collect();
    let edges = graph
        .edges()
        .iter()
        .enumerate()
        .map(|(i, edge)| render_edge(i, edge))
        .collect();
    Rendering { nodes, edges }
}

fn render_node(node: &GraphNode, position: Position) -> RenderedNode {
    let title = if node.kind.as_str().is_empty() {
        node.id.to_string()
    } else {
        node.kind.to_string()
    };
    let details = node
        .details()
        .map(|(field, value)| format!("{field}: {value}"))
        .collect();

    RenderedNode {
        id: node.id.clone(),
        label: NodeLabel { title, details },
        position,
        style: NodeStyle {
            background: color_of(&node.kind).to_string(),
            color: TEXT_COLOR.to_string(),
            border: NODE_BORDER.to_string(),
            border_radius: NODE_RADIUS,
            padding: NODE_PADDING,
            min_width: NODE_MIN_WIDTH,
        },
    }
}

fn render_edge(index: usize, edge: &GraphEdge) -> RenderedEdge {
    RenderedEdge {
        id: format!("edge-{index}"),
        source: edge.source.clone(),
        target: edge.target.clone(),
        label: edge.logic.clone().unwrap_or_default(),
        kind: EDGE_KIND.to_string(),
        animated: true,
        marker_end: ARROW_CLOSED.to_string(),
        style: EdgeStyle {
            stroke: EDGE_STROKE.to_string(),
            stroke_width: EDGE_STROKE_WIDTH,
        },
    }
}

impl Rendering {
    /// Plain-text listing, one node per block followed by the edges.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            out.push_str(&format!(
                "[{}] {} @ ({}, {}) {}\n",
                node.id, node.label.title, node.position.x, node.position.y, node.style.background
            ));
            for line in &node.label.details {
                out.push_str(&format!("    {line}\n"));
            }
        }
        for edge in &self.edges {
            if edge.label.is_empty() {
                out.push_str(&format!("{} -> {}\n", edge.source, edge.target));
            } else {
                out.push_str(&format!("{} -[{}]-> {}\n", edge.source, edge.label, edge.target));
            }
        }
        out
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! # Graph Model
//!
//! The canonical node/edge/graph structures shared by the DE, LD and SI views.
//!
//! A `Graph` is append-only: nodes and edges are inserted, never removed or
//! mutated. Insertion order is preserved because it is the layout order.
//! Referential integrity is checked at insertion, not eventually, and is
//! re-checked when a graph is deserialized from the wire.

use crate::{DexploreError, GraphKind, Metadata, NodeId, NodeKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// NODE
// =============================================================================

/// One exploration artifact.
///
/// Descriptive fields are optional and depend on the node type; composite
/// nodes from the SI view use the structural fields.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: NodeId,

    #[serde(rename = "type", default)]
    pub kind: NodeKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub situation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problem: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intention: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub solution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subsystem: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_intentions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sub_systems: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subsystems: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub situations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub backups: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,

    /// Opaque payload carried by LD/SI nodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphNode {
    /// Create a node with only an id and a type tag.
    #[must_use]
    pub fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            kind,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_situation(mut self, situation: impl Into<String>) -> Self {
        self.situation = Some(situation.into());
        self
    }

    #[must_use]
    pub fn with_problem(mut self, problem: impl Into<String>) -> Self {
        self.problem = Some(problem.into());
        self
    }

    #[must_use]
    pub fn with_intention(mut self, intention: impl Into<String>) -> Self {
        self.intention = Some(intention.into());
        self
    }

    #[must_use]
    pub fn with_solution(mut self, solution: impl Into<String>) -> Self {
        self.solution = Some(solution.into());
        self
    }

    #[must_use]
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    /// Attach the ordered sub-intention/sub-system lists of a decomposition.
    #[must_use]
    pub fn with_decomposition(mut self, sub_intentions: Vec<String>, sub_systems: Vec<String>) -> Self {
        self.sub_intentions = sub_intentions;
        self.sub_systems = sub_systems;
        self
    }

    /// Descriptive fields that are present, as `(label, value)` in display order.
    pub fn details(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            ("System", &self.system),
            ("Situation", &self.situation),
            ("Problem", &self.problem),
            ("Intention", &self.intention),
            ("Solution", &self.solution),
            ("Subsystem", &self.subsystem),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .as_deref()
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
    }
}

// =============================================================================
// EDGE
// =============================================================================

/// Directed relation between two nodes of the same graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: NodeId,
    pub target: NodeId,

    /// Guard or condition label shown on the rendered connector.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logic: Option<String>,

    #[serde(default)]
    pub metadata: Metadata,
}

impl GraphEdge {
    /// Create an unlabeled edge.
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            logic: None,
            metadata: Metadata::new(),
        }
    }

    /// Create an edge carrying a logic label.
    #[must_use]
    pub fn with_logic(source: NodeId, target: NodeId, logic: impl Into<String>) -> Self {
        Self {
            logic: Some(logic.into()),
            ..Self::new(source, target)
        }
    }
}

// =============================================================================
// GRAPH
// =============================================================================

/// Ordered, append-only container of nodes and edges.
///
/// The position index is rebuilt on deserialization and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GraphWire")]
pub struct Graph {
    #[serde(rename = "type")]
    kind: GraphKind,

    nodes: Vec<GraphNode>,

    edges: Vec<GraphEdge>,

    /// Parent key -> ordered descendant ids.
    ///
    /// DE graphs key this by node id; SI graphs received from the
    /// conversion service key it by level name, so keys are kept opaque.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hierarchies: Option<BTreeMap<String, Vec<String>>>,

    /// NodeId -> position in `nodes`
    #[serde(skip)]
    index: BTreeMap<NodeId, usize>,
}

/// Wire shape of a graph before integrity checks.
#[derive(Deserialize)]
struct GraphWire {
    #[serde(rename = "type")]
    kind: GraphKind,
    #[serde(default)]
    nodes: Vec<GraphNode>,
    #[serde(default)]
    edges: Vec<GraphEdge>,
    #[serde(default)]
    hierarchies: Option<BTreeMap<String, Vec<String>>>,
}

impl TryFrom<GraphWire> for Graph {
    type Error = DexploreError;

    fn try_from(wire: GraphWire) -> Result<Self, Self::Error> {
        let mut graph = Graph::new(wire.kind);
        for node in wire.nodes {
            graph.add_node(node)?;
        }
        for edge in wire.edges {
            graph.add_edge(edge)?;
        }
        graph.hierarchies = wire.hierarchies;
        Ok(graph)
    }
}

impl Graph {
    /// Create an empty graph of the given view.
    #[must_use]
    pub fn new(kind: GraphKind) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            edges: Vec::new(),
            hierarchies: None,
            index: BTreeMap::new(),
        }
    }

    /// Which view this graph represents.
    #[must_use]
    pub fn kind(&self) -> GraphKind {
        self.kind
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[GraphNode] {
        &self.nodes
    }

    /// Edges in insertion order.
    #[must_use]
    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    /// Hierarchy mapping, if any has been recorded.
    #[must_use]
    pub fn hierarchies(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        self.hierarchies.as_ref()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    /// Look up a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&GraphNode> {
        self.index.get(id).and_then(|&pos| self.nodes.get(pos))
    }

    /// The most recently inserted node.
    #[must_use]
    pub fn last_node(&self) -> Option<&GraphNode> {
        self.nodes.last()
    }

    /// Edges leaving the given node, in insertion order.
    pub fn outgoing<'a>(&'a self, id: &'a NodeId) -> impl Iterator<Item = &'a GraphEdge> + 'a {
        self.edges.iter().filter(move |e| &e.source == id)
    }

    /// Nodes of the given kind, in insertion order.
    pub fn nodes_of_kind<'a>(&'a self, kind: &'a NodeKind) -> impl Iterator<Item = &'a GraphNode> + 'a {
        self.nodes.iter().filter(move |n| &n.kind == kind)
    }

    /// Append a node.
    ///
    /// Fails with `DuplicateNode` if the id is already present.
    pub fn add_node(&mut self, node: GraphNode) -> Result<&GraphNode, DexploreError> {
        if self.index.contains_key(&node.id) {
            return Err(DexploreError::DuplicateNode(node.id));
        }
        let pos = self.nodes.len();
        self.index.insert(node.id.clone(), pos);
        self.nodes.push(node);
        Ok(&self.nodes[pos])
    }

    /// Append an edge.
    ///
    /// Fails with `DanglingReference` if either endpoint is absent.
    pub fn add_edge(&mut self, edge: GraphEdge) -> Result<(), DexploreError> {
        for endpoint in [&edge.source, &edge.target] {
            if !self.index.contains_key(endpoint) {
                return Err(DexploreError::DanglingReference(endpoint.clone()));
            }
        }
        self.edges.push(edge);
        Ok(())
    }

    /// Record `children` as ordered descendants of `parent`.
    ///
    /// Parent and children must exist. Children already listed under the
    /// parent are skipped; existing entries are never reordered or removed.
    pub fn merge_hierarchy(&mut self, parent: &NodeId, children: &[NodeId]) -> Result<(), DexploreError> {
        if !self.contains_node(parent) {
            return Err(DexploreError::DanglingReference(parent.clone()));
        }
        if let Some(missing) = children.iter().find(|c| !self.contains_node(c)) {
            return Err(DexploreError::DanglingReference(missing.clone()));
        }

        let listed = self
            .hierarchies
            .get_or_insert_with(BTreeMap::new)
            .entry(parent.0.clone())
            .or_default();
        for child in children {
            if !listed.iter().any(|c| c == child.as_str()) {
                listed.push(child.0.clone());
            }
        }
        Ok(())
    }

    /// Adopt a newer snapshot of this graph.
    ///
    /// The snapshot must be of the same view and must start with exactly the
    /// nodes and edges already held here; the remainder is appended through
    /// the integrity-checked insert path. On any failure `self` is untouched.
    ///
    /// Returns the number of appended nodes.
    pub fn extend_from(&mut self, snapshot: &Graph) -> Result<usize, DexploreError> {
        if snapshot.kind != self.kind {
            return Err(DexploreError::Service(format!(
                "expected a {} graph, received {}",
                self.kind, snapshot.kind
            )));
        }
        if !snapshot.nodes.starts_with(&self.nodes) || !snapshot.edges.starts_with(&self.edges) {
            return Err(DexploreError::Service(
                "graph snapshot rewrites history already recorded".to_string(),
            ));
        }

        let mut next = self.clone();
        for node in &snapshot.nodes[self.nodes.len()..] {
            next.add_node(node.clone())?;
        }
        for edge in &snapshot.edges[self.edges.len()..] {
            next.add_edge(edge.clone())?;
        }
        if let Some(recorded) = &self.hierarchies {
            let incoming = snapshot.hierarchies.as_ref();
            for (parent, children) in recorded {
                let kept = incoming
                    .and_then(|h| h.get(parent))
                    .is_some_and(|theirs| theirs.starts_with(&children[..]));
                if !kept {
                    return Err(DexploreError::Service(format!(
                        "hierarchy under '{parent}' rewrites recorded children"
                    )));
                }
            }
        }
        if let Some(incoming) = &snapshot.hierarchies {
            let current = next.hierarchies.get_or_insert_with(BTreeMap::new);
            for (parent, children) in incoming {
                let listed = current.entry(parent.clone()).or_default();
                let known = listed.len();
                listed.extend(children[known..].iter().cloned());
            }
        }

        let appended = next.nodes.len() - self.nodes.len();
        *self = next;
        Ok(appended)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str) -> GraphNode {
        GraphNode::new(NodeId::from(id), NodeKind::SituationAssessment)
    }

    fn edge(from: &str, to: &str) -> GraphEdge {
        GraphEdge::new(NodeId::from(from), NodeId::from(to))
    }

    #[test]
    fn add_node_preserves_insertion_order() {
        let mut graph = Graph::new(GraphKind::De);
        graph.add_node(node("b")).expect("b");
        graph.add_node(node("a")).expect("a");

        let ids: Vec<_> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn add_node_rejects_duplicates() {
        let mut graph = Graph::new(GraphKind::De);
        graph.add_node(node("SI_1")).expect("first");

        let err = graph.add_node(node("SI_1")).expect_err("duplicate");
        assert_eq!(err, DexploreError::DuplicateNode(NodeId::from("SI_1")));
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn details_skip_missing_and_empty_fields() {
        let json = r#"{"id":"car","system":"","situation":"fog","problem":null}"#;
        let received: GraphNode = serde_json::from_str(json).expect("node");

        let details: Vec<_> = received.details().collect();
        assert_eq!(details, vec![("Situation", "fog")]);
    }

    #[test]
    fn add_edge_rejects_dangling_endpoints() {
        let mut graph = Graph::new(GraphKind::De);
        graph.add_node(node("a")).expect("a");

        let err = graph.add_edge(edge("a", "missing")).expect_err("dangling");
        assert_eq!(err, DexploreError::DanglingReference(NodeId::from("missing")));
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn merge_hierarchy_appends_without_duplicates() {
        let mut graph = Graph::new(GraphKind::De);
        for id in ["p", "c1", "c2"] {
            graph.add_node(node(id)).expect("node");
        }
        let parent = NodeId::from("p");

        graph.merge_hierarchy(&parent, &[NodeId::from("c1")]).expect("first");
        graph
            .merge_hierarchy(&parent, &[NodeId::from("c1"), NodeId::from("c2")])
            .expect("second");

        let listed = &graph.hierarchies().expect("hierarchies")["p"];
        assert_eq!(listed, &vec!["c1".to_string(), "c2".to_string()]);
    }

    #[test]
    fn merge_hierarchy_requires_existing_nodes() {
        let mut graph = Graph::new(GraphKind::De);
        graph.add_node(node("p")).expect("p");

        let err = graph
            .merge_hierarchy(&NodeId::from("p"), &[NodeId::from("ghost")])
            .expect_err("ghost child");
        assert_eq!(err, DexploreError::DanglingReference(NodeId::from("ghost")));
        assert!(graph.hierarchies().is_none());
    }

    #[test]
    fn deserialization_rejects_dangling_edges() {
        let json = r#"{"type":"DesignExploration","nodes":[{"id":"a","type":"SituationAssessment"}],"edges":[{"source":"a","target":"b"}]}"#;
        let result: Result<Graph, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn deserialization_accepts_untyped_service_nodes() {
        let json = r#"{"type":"SI","nodes":[{"id":"car","level":0,"is_root":true}],"edges":[],"hierarchies":{"Level_0":["car"]}}"#;
        let graph: Graph = serde_json::from_str(json).expect("si graph");

        assert_eq!(graph.kind(), GraphKind::Si);
        assert_eq!(graph.nodes()[0].kind, NodeKind::default());
        assert_eq!(graph.nodes()[0].level, Some(0));
        assert!(graph.contains_node(&NodeId::from("car")));
    }

    #[test]
    fn serialization_matches_wire_shape() {
        let mut graph = Graph::new(GraphKind::De);
        graph
            .add_node(node("SI_1").with_system("car").with_situation("fog"))
            .expect("node");

        let value = serde_json::to_value(&graph).expect("ser");
        assert_eq!(value["type"], "DesignExploration");
        assert_eq!(value["nodes"][0]["type"], "SituationAssessment");
        assert_eq!(value["nodes"][0]["system"], "car");
        assert!(value.get("index").is_none());
        assert!(value.get("hierarchies").is_none());
    }

    #[test]
    fn extend_from_appends_suffix() {
        let mut current = Graph::new(GraphKind::De);
        current.add_node(node("a")).expect("a");

        let mut snapshot = current.clone();
        snapshot.add_node(node("b")).expect("b");
        snapshot.add_edge(edge("a", "b")).expect("edge");

        let appended = current.extend_from(&snapshot).expect("extend");
        assert_eq!(appended, 1);
        assert_eq!(current, snapshot);
    }

    #[test]
    fn extend_from_rejects_rewritten_history() {
        let mut current = Graph::new(GraphKind::De);
        current.add_node(node("a")).expect("a");

        let mut snapshot = Graph::new(GraphKind::De);
        snapshot.add_node(node("z")).expect("z");

        let before = current.clone();
        assert!(matches!(
            current.extend_from(&snapshot),
            Err(DexploreError::Service(_))
        ));
        assert_eq!(current, before);
    }

    #[test]
    fn extend_from_rejects_other_views() {
        let mut current = Graph::new(GraphKind::De);
        let snapshot = Graph::new(GraphKind::Ld);
        assert!(current.extend_from(&snapshot).is_err());
    }

    #[test]
    fn details_follow_display_order() {
        let n = node("x").with_problem("p").with_system("s");
        let details: Vec<_> = n.details().collect();
        assert_eq!(details, vec![("System", "s"), ("Problem", "p")]);
    }
}

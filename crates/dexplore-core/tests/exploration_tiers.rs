//! # Exploration Tier Tests (T0-T3)
//!
//! If ANY tier fails, the engine is INVALID.
//!
//! ## Tiers
//! - T0: Graph Integrity
//! - T1: Layout and Rendering
//! - T2: Protocol Transitions
//! - T3: End-to-End Exploration

use dexplore_core::{
    DexploreError, Event, ExplorationState, Graph, GraphEdge, GraphKind, GraphNode,
    KnowledgeBase, NodeId, NodeKind, Step, transition,
};

fn reference_kb() -> KnowledgeBase {
    let mut kb = KnowledgeBase::collision_avoidance();
    kb.add_solutions("car_running", &["emergency_braking", "evasive_steering"]);
    kb
}

// =============================================================================
// TIER T0: GRAPH INTEGRITY
// =============================================================================

mod t0_graph_integrity {
    use super::*;

    /// T0.1: A fresh graph is empty and typed.
    #[test]
    fn create_graph_is_empty() {
        let graph = Graph::new(GraphKind::De);
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
        assert_eq!(graph.kind(), GraphKind::De);
    }

    /// T0.2: Duplicate ids are rejected and nothing changes.
    #[test]
    fn duplicate_node_rejected() {
        let mut graph = Graph::new(GraphKind::De);
        let node = GraphNode::new(NodeId::from("SI_1"), NodeKind::SituationAssessment);
        graph.add_node(node.clone()).expect("first");

        assert_eq!(
            graph.add_node(node).expect_err("second"),
            DexploreError::DuplicateNode(NodeId::from("SI_1"))
        );
        assert_eq!(graph.node_count(), 1);
    }

    /// T0.3: Edges must reference existing nodes at insertion time.
    #[test]
    fn forward_reference_rejected() {
        let mut graph = Graph::new(GraphKind::De);
        graph
            .add_node(GraphNode::new(NodeId::from("a"), NodeKind::SituationAssessment))
            .expect("a");

        let err = graph
            .add_edge(GraphEdge::new(NodeId::from("a"), NodeId::from("b")))
            .expect_err("b does not exist yet");
        assert!(matches!(err, DexploreError::DanglingReference(_)));

        graph
            .add_node(GraphNode::new(NodeId::from("b"), NodeKind::ProblemIdentification))
            .expect("b");
        graph
            .add_edge(GraphEdge::new(NodeId::from("a"), NodeId::from("b")))
            .expect("now valid");
        assert_eq!(graph.edge_count(), 1);
    }

    /// T0.4: Metadata passes through serialization untouched.
    #[test]
    fn metadata_is_opaque() {
        let mut node = GraphNode::new(NodeId::from("x"), NodeKind::Backups);
        node.metadata
            .insert("anything".into(), serde_json::json!({"nested": [1, 2, 3]}));
        let mut graph = Graph::new(GraphKind::Si);
        graph.add_node(node).expect("x");

        let json = serde_json::to_string(&graph).expect("ser");
        let back: Graph = serde_json::from_str(&json).expect("de");
        assert_eq!(back, graph);
    }
}

// =============================================================================
// TIER T1: LAYOUT AND RENDERING
// =============================================================================

mod t1_layout_rendering {
    use super::*;
    use dexplore_core::{Position, color_of, layout, render};

    /// T1.1: Rendering matches the layout engine node for node.
    #[test]
    fn render_uses_layout_positions() {
        let kb = reference_kb();
        let mut state = ExplorationState::start("car_running", &kb).expect("start");
        for event in [
            Event::situation("obstacle_detected"),
            Event::problem("collision_risk"),
            Event::intention("avoid_collision"),
            Event::solution("emergency_braking"),
        ] {
            state = transition(&state, event, &kb).expect("step");
        }

        let placed = layout(state.graph.nodes());
        let rendering = render(&state.graph);
        assert_eq!(rendering.nodes.len(), 4);
        assert_eq!(rendering.edges.len(), 3);
        for node in &rendering.nodes {
            assert_eq!(node.position, placed[&node.id]);
        }
        assert_eq!(rendering.nodes[3].position, Position { x: 0, y: 150 });
    }

    /// T1.2: Fill colour comes from the node type.
    #[test]
    fn render_colours_by_type() {
        let kb = reference_kb();
        let state = transition(
            &ExplorationState::start("car_running", &kb).expect("start"),
            Event::situation("obstacle_detected"),
            &kb,
        )
        .expect("situation");

        let rendering = render(&state.graph);
        assert_eq!(
            rendering.nodes[0].style.background,
            color_of(&NodeKind::SituationAssessment)
        );
        assert_eq!(rendering.nodes[0].label.title, "SituationAssessment");
    }
}

// =============================================================================
// TIER T2: PROTOCOL TRANSITIONS
// =============================================================================

mod t2_protocol {
    use super::*;

    fn at_choose_path(kb: &KnowledgeBase) -> ExplorationState {
        let mut state = ExplorationState::start("car_running", kb).expect("start");
        for event in [
            Event::situation("obstacle_detected"),
            Event::problem("collision_risk"),
            Event::intention("avoid_collision"),
        ] {
            state = transition(&state, event, kb).expect("step");
        }
        state
    }

    /// T2.1: Intention surfaces the advisory decomposition without moving on.
    #[test]
    fn intention_offers_decomposition() {
        let kb = reference_kb();
        let state = at_choose_path(&kb);

        assert_eq!(state.step, Step::ChoosePath);
        let split = state.suggested_decomposition.as_ref().expect("suggested");
        assert_eq!(split.intentions, vec!["avoid_by_car", "avoid_by_driver"]);
        assert!(state.can_decompose && state.can_apply_solution);
    }

    /// T2.2: Decompose [A, B] from S queues A then B and explores A first.
    #[test]
    fn decompose_queues_siblings_breadth_first() {
        let kb = reference_kb();
        let mut state = transition(
            &at_choose_path(&kb),
            Event::decompose(
                ["avoid_by_car", "avoid_by_driver"],
                ["auto_maneuvering_system", "human_maneuvering_system"],
            ),
            &kb,
        )
        .expect("decompose");
        assert_eq!(state.system, "auto_maneuvering_system");

        for event in [
            Event::situation("normal_driving"),
            Event::problem("collision_risk"),
            Event::intention("avoid_collision"),
            Event::solution("automatic_braking"),
        ] {
            state = transition(&state, event, &kb).expect("auto branch");
        }
        assert_eq!(state.system, "human_maneuvering_system");
        assert!(state.pending_subsystems.is_empty());
        assert_eq!(state.step, Step::SituationAssessment);
    }

    /// T2.3: Empty decomposition leaves the step and graph unchanged.
    #[test]
    fn empty_decomposition_rejected() {
        let kb = reference_kb();
        let state = at_choose_path(&kb);
        let result = transition(&state, Event::decompose(Vec::<String>::new(), Vec::<String>::new()), &kb);
        assert!(matches!(result, Err(DexploreError::Validation(_))));
        assert_eq!(state.step, Step::ChoosePath);
        assert_eq!(state.graph.node_count(), 3);
    }

    /// T2.4: A subsystem reached again by a later decomposition is explored again.
    #[test]
    fn revisits_across_decompositions_are_allowed() {
        let mut kb = reference_kb();
        kb.add_solutions("loop_system", &["done"]);
        let state = transition(
            &at_choose_path(&kb),
            Event::decompose(["a"], ["loop_system"]),
            &kb,
        )
        .expect("first");

        let mut state = state;
        for event in [
            Event::situation("s"),
            Event::problem("p"),
            Event::intention("i"),
            Event::decompose(["again"], ["car_running"]),
        ] {
            state = transition(&state, event, &kb).expect("loop");
        }
        assert_eq!(state.system, "car_running");
        assert_eq!(state.step, Step::SituationAssessment);
    }
}

// =============================================================================
// TIER T3: END-TO-END EXPLORATION
// =============================================================================

mod t3_end_to_end {
    use super::*;
    use dexplore_core::{DEFAULT_AUTO_STEPS, auto_explore};

    /// T3.1: The single-system walk completes with exactly SI, PI, EI, SA.
    #[test]
    fn car_running_to_completion() {
        let kb = reference_kb();
        let mut state = ExplorationState::start("car_running", &kb).expect("start");
        assert_eq!(state.suggested_situation.as_deref(), Some("obstacle_detected"));

        state = transition(&state, Event::situation("obstacle_detected"), &kb).expect("situation");
        assert_eq!(state.suggested_problem.as_deref(), Some("collision_risk"));

        state = transition(&state, Event::problem("collision_risk"), &kb).expect("problem");
        assert_eq!(state.suggested_intention.as_deref(), Some("avoid_collision"));

        state = transition(&state, Event::intention("avoid_collision"), &kb).expect("intention");
        let offered = state.available_solutions[0].clone();

        state = transition(&state, Event::solution(offered), &kb).expect("solution");
        assert_eq!(state.step, Step::Completed);
        assert!(state.pending_subsystems.is_empty());

        let kinds: Vec<_> = state.graph.nodes().iter().map(|n| n.kind.clone()).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::SituationAssessment,
                NodeKind::ProblemIdentification,
                NodeKind::EstablishIntention,
                NodeKind::SolutionAssignment,
            ]
        );

        assert_eq!(
            transition(&state, Event::situation("again"), &kb),
            Err(DexploreError::TerminalState)
        );
    }

    /// T3.2: Following suggestions alone explores the whole reference domain.
    #[test]
    fn automatic_exploration_visits_every_subsystem() {
        let kb = KnowledgeBase::collision_avoidance();
        let done = auto_explore("car_running", &kb, DEFAULT_AUTO_STEPS).expect("auto");

        let explored: Vec<_> = done
            .graph
            .nodes_of_kind(&NodeKind::SituationAssessment)
            .filter_map(|n| n.system.as_deref())
            .collect();
        assert_eq!(
            explored,
            vec![
                "car_running",
                "auto_maneuvering_system",
                "human_maneuvering_system",
                "obstacle_alarming_system",
                "maneuvering_guiding_system",
            ]
        );
    }
}

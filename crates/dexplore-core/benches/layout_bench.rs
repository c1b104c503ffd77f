//! # Layout Benchmarks
//!
//! Layout and rendering cost as the DE graph grows.
//!
//! Run with: `cargo bench -p dexplore-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use dexplore_core::{Graph, GraphEdge, GraphKind, GraphNode, NodeId, NodeKind, layout, render};
use std::hint::black_box;

/// A chain of `size` nodes cycling through the DE artifact types.
fn create_chain(size: usize) -> Graph {
    let kinds = [
        NodeKind::SituationAssessment,
        NodeKind::ProblemIdentification,
        NodeKind::EstablishIntention,
        NodeKind::SolutionAssignment,
    ];
    let mut graph = Graph::new(GraphKind::De);
    let mut previous: Option<NodeId> = None;

    for i in 0..size {
        let id = NodeId::sequential("N", i + 1);
        let node = GraphNode::new(id.clone(), kinds[i % kinds.len()].clone())
            .with_system("car_running")
            .with_situation("obstacle_detected");
        graph.add_node(node).expect("insert");
        if let Some(prev) = previous {
            graph.add_edge(GraphEdge::new(prev, id.clone())).expect("edge");
        }
        previous = Some(id);
    }

    graph
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout");

    for size in [10, 100, 1000] {
        let graph = create_chain(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| layout(black_box(graph.nodes())));
        });
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");

    for size in [10, 100, 1000] {
        let graph = create_chain(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &graph, |b, graph| {
            b.iter(|| render(black_box(graph)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_layout, bench_render);
criterion_main!(benches);

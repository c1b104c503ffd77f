//! # Exploration Service Boundary
//!
//! The request/response contract between the client-side `Explorer` and
//! whatever hosts the knowledge base. Every call returns a full
//! `ExplorationState` snapshot; the caller decides whether to adopt it.

use dexplore_core::{
    DexploreError, Event, ExplorationState, Graph, GraphKind, KnowledgeSource, transition,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

// =============================================================================
// CONVERSION RESULT
// =============================================================================

/// The three views returned by the conversion operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedGraphs {
    pub de: Graph,
    pub ld: Graph,
    pub si: Graph,
}

impl ConvertedGraphs {
    /// Each graph must carry the view its slot names.
    pub fn check(&self) -> Result<(), DexploreError> {
        for (slot, graph, expected) in [
            ("de", &self.de, GraphKind::De),
            ("ld", &self.ld, GraphKind::Ld),
            ("si", &self.si, GraphKind::Si),
        ] {
            if graph.kind() != expected {
                return Err(DexploreError::Service(format!(
                    "conversion returned a {} graph in the '{slot}' slot",
                    graph.kind()
                )));
            }
        }
        Ok(())
    }
}

// =============================================================================
// SERVICE TRAIT
// =============================================================================

/// Remote or in-process host of an exploration.
pub trait ExplorationService: Send + Sync {
    /// Begin a new exploration of `system`.
    fn start(&self, system: &str)
    -> impl Future<Output = Result<ExplorationState, DexploreError>> + Send;

    /// Submit one event and receive the next snapshot.
    fn submit(&self, event: &Event)
    -> impl Future<Output = Result<ExplorationState, DexploreError>> + Send;

    /// Read back the snapshot the service currently holds.
    fn current(&self) -> impl Future<Output = Result<ExplorationState, DexploreError>> + Send;

    /// Convert a completed DE graph into `{de, ld, si}`.
    fn convert(&self, de: &Graph)
    -> impl Future<Output = Result<ConvertedGraphs, DexploreError>> + Send;
}

// =============================================================================
// IN-PROCESS SERVICE
// =============================================================================

/// Runs the pure transition function against a local knowledge source.
pub struct LocalService<K> {
    knowledge: Arc<K>,
    state: Mutex<Option<ExplorationState>>,
}

impl<K> LocalService<K>
where
    K: KnowledgeSource + Send + Sync,
{
    #[must_use]
    pub fn new(knowledge: Arc<K>) -> Self {
        Self {
            knowledge,
            state: Mutex::new(None),
        }
    }
}

impl<K> ExplorationService for LocalService<K>
where
    K: KnowledgeSource + Send + Sync,
{
    async fn start(&self, system: &str) -> Result<ExplorationState, DexploreError> {
        let state = ExplorationState::start(system, self.knowledge.as_ref())?;
        *self.state.lock().await = Some(state.clone());
        Ok(state)
    }

    async fn submit(&self, event: &Event) -> Result<ExplorationState, DexploreError> {
        let mut guard = self.state.lock().await;
        let current = guard.as_ref().ok_or(DexploreError::NotStarted)?;
        let next = transition(current, event.clone(), self.knowledge.as_ref())?;
        *guard = Some(next.clone());
        Ok(next)
    }

    async fn current(&self) -> Result<ExplorationState, DexploreError> {
        self.state.lock().await.clone().ok_or(DexploreError::NotStarted)
    }

    async fn convert(&self, _de: &Graph) -> Result<ConvertedGraphs, DexploreError> {
        Err(DexploreError::Service(
            "conversion is not available in-process; use a remote service".to_string(),
        ))
    }
}

// =============================================================================
// TESTS
// =============================================================================

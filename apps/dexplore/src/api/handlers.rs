//! # API Endpoint Handlers

use super::{
    AppState,
    types::{
        ApiError, ComponentTypesResponse, DecomposeRequest, HealthResponse, IntentionRequest,
        KnowledgeResponse, ProblemRequest, SituationRequest, SolutionRequest, StartRequest,
    },
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::collections::BTreeMap;
use dexplore_core::{
    DexploreError, Event, ExplorationState, Rendering, primitives::MAX_INPUT_LENGTH, render,
    transition,
};

// =============================================================================
// HEALTH & KNOWLEDGE
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

/// Dump the knowledge base the service explores against.
pub async fn knowledge_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(KnowledgeResponse {
        systems: state.knowledge.all_systems(),
        knowledge: state.knowledge.snapshot(),
    })
}

/// Catalog of the DE and SI component types.
pub async fn component_types_handler() -> impl IntoResponse {
    Json(ComponentTypesResponse::default())
}

// =============================================================================
// EXPLORATIONS
// =============================================================================

/// Exploration ids are path segments chosen by the client.
fn validate_id(id: &str) -> Result<(), DexploreError> {
    let well_formed = !id.is_empty()
        && id.len() <= MAX_INPUT_LENGTH
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if well_formed {
        Ok(())
    } else {
        Err(DexploreError::Validation(format!(
            "invalid exploration id '{id}'"
        )))
    }
}

/// Current snapshot of one exploration.
pub async fn get_exploration_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExplorationState>, ApiError> {
    validate_id(&id)?;
    let explorations = state.explorations.read().await;
    let exploration = explorations.get(&id).ok_or(DexploreError::NotStarted)?;
    Ok(Json(exploration.clone()))
}

/// Start (or restart) an exploration.
pub async fn start_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<StartRequest>,
) -> Result<Json<ExplorationState>, ApiError> {
    validate_id(&id)?;
    let started = ExplorationState::start(&request.system, state.knowledge.as_ref())?;

    let mut explorations = state.explorations.write().await;
    make_room(&mut explorations, &id, state.max_explorations)?;
    explorations.insert(id.clone(), started.clone());
    tracing::info!(exploration = %id, system = %started.system, "Exploration started");
    Ok(Json(started))
}

/// Ensure `id` fits under `max`, evicting a completed exploration if needed.
fn make_room(
    explorations: &mut BTreeMap<String, ExplorationState>,
    id: &str,
    max: usize,
) -> Result<(), DexploreError> {
    if explorations.contains_key(id) || explorations.len() < max {
        return Ok(());
    }
    let completed = explorations
        .iter()
        .find(|(_, exploration)| exploration.is_completed())
        .map(|(key, _)| key.clone());
    match completed {
        Some(evicted) => {
            explorations.remove(&evicted);
            tracing::info!(exploration = %evicted, "Completed exploration evicted");
            Ok(())
        }
        None => {
            tracing::warn!(exploration = %id, max, "Exploration limit reached");
            Err(DexploreError::Validation(format!(
                "exploration limit of {max} reached; discard one first"
            )))
        }
    }
}

/// Discard an exploration.
pub async fn delete_exploration_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    validate_id(&id)?;
    state
        .explorations
        .write()
        .await
        .remove(&id)
        .ok_or(DexploreError::NotStarted)?;
    tracing::info!(exploration = %id, "Exploration discarded");
    Ok(StatusCode::NO_CONTENT)
}

/// Apply one event under the write lock, so transitions on one exploration never overlap.
async fn apply(state: AppState, id: String, event: Event) -> Result<Json<ExplorationState>, ApiError> {
    validate_id(&id)?;
    let mut explorations = state.explorations.write().await;
    let current = explorations.get(&id).ok_or(DexploreError::NotStarted)?;
    let action = event.name();

    let next = match transition(current, event, state.knowledge.as_ref()) {
        Ok(next) => next,
        Err(err) => {
            tracing::warn!(exploration = %id, action, error = %err, "Input rejected");
            return Err(err.into());
        }
    };
    tracing::info!(
        exploration = %id,
        action,
        from = %current.step,
        to = %next.step,
        nodes = next.graph.node_count(),
        pending = next.pending_subsystems.len(),
        "Transition applied"
    );
    explorations.insert(id, next.clone());
    Ok(Json(next))
}

pub async fn situation_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SituationRequest>,
) -> Result<Json<ExplorationState>, ApiError> {
    apply(state, id, request.into()).await
}

pub async fn problem_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<ProblemRequest>,
) -> Result<Json<ExplorationState>, ApiError> {
    apply(state, id, request.into()).await
}

pub async fn intention_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<IntentionRequest>,
) -> Result<Json<ExplorationState>, ApiError> {
    apply(state, id, request.into()).await
}

pub async fn decompose_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<DecomposeRequest>,
) -> Result<Json<ExplorationState>, ApiError> {
    apply(state, id, request.into()).await
}

pub async fn solution_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SolutionRequest>,
) -> Result<Json<ExplorationState>, ApiError> {
    apply(state, id, request.into()).await
}

/// Displayable projection of the exploration's DE graph.
pub async fn render_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Rendering>, ApiError> {
    validate_id(&id)?;
    let explorations = state.explorations.read().await;
    let exploration = explorations.get(&id).ok_or(DexploreError::NotStarted)?;
    Ok(Json(render(&exploration.graph)))
}

// =============================================================================
// CONVERSION
// =============================================================================

/// The LD/SI derivation is hosted by a separate knowledge service.
pub async fn convert_handler() -> ApiError {
    ApiError(DexploreError::Service(
        "DE to LD/SI conversion is not hosted by this service".to_string(),
    ))
}

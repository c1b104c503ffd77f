//! # API Request/Response Types
//!
//! JSON structures for the HTTP API. Exploration snapshots, renderings and
//! knowledge dumps are served as their core types directly.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use dexplore_core::{DexploreError, Event, KnowledgeSnapshot, NodeKind};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// KNOWLEDGE RESPONSE
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeResponse {
    pub systems: Vec<String>,
    pub knowledge: KnowledgeSnapshot,
}

// =============================================================================
// COMPONENT TYPES
// =============================================================================

/// One entry of the component type catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentType {
    #[serde(rename = "type")]
    pub code: String,
    pub name: String,
    /// Node `type` tag used on the wire.
    pub tag: String,
}

impl From<&NodeKind> for ComponentType {
    fn from(kind: &NodeKind) -> Self {
        Self {
            code: kind.code().to_string(),
            name: kind.display_name(),
            tag: kind.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentTypesResponse {
    pub de_components: Vec<ComponentType>,
    pub si_components: Vec<ComponentType>,
}

impl Default for ComponentTypesResponse {
    fn default() -> Self {
        Self {
            de_components: NodeKind::DESIGN_EXPLORATION.iter().map(Into::into).collect(),
            si_components: NodeKind::SYSTEMS_INTEGRATION.iter().map(Into::into).collect(),
        }
    }
}

// =============================================================================
// EXPLORATION REQUESTS
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub system: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SituationRequest {
    pub situation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemRequest {
    pub problem: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentionRequest {
    pub intention: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecomposeRequest {
    #[serde(default)]
    pub sub_intentions: Vec<String>,
    #[serde(default)]
    pub sub_systems: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolutionRequest {
    pub solution: String,
}

impl From<SituationRequest> for Event {
    fn from(req: SituationRequest) -> Self {
        Event::situation(req.situation)
    }
}

impl From<ProblemRequest> for Event {
    fn from(req: ProblemRequest) -> Self {
        Event::problem(req.problem)
    }
}

impl From<IntentionRequest> for Event {
    fn from(req: IntentionRequest) -> Self {
        Event::intention(req.intention)
    }
}

impl From<DecomposeRequest> for Event {
    fn from(req: DecomposeRequest) -> Self {
        Event::decompose(req.sub_intentions, req.sub_systems)
    }
}

impl From<SolutionRequest> for Event {
    fn from(req: SolutionRequest) -> Self {
        Event::solution(req.solution)
    }
}

// =============================================================================
// ERRORS
// =============================================================================

/// Error body: `{error, kind}`, plus the variant payload when there is one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&DexploreError> for ErrorResponse {
    fn from(err: &DexploreError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
            detail: err.detail(),
        }
    }
}

/// A core error leaving the API with its mapped status code.
#[derive(Debug)]
pub struct ApiError(pub DexploreError);

impl From<DexploreError> for ApiError {
    fn from(err: DexploreError) -> Self {
        Self(err)
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &DexploreError) -> StatusCode {
    match err {
        DexploreError::Validation(_) | DexploreError::Serialization(_) => StatusCode::BAD_REQUEST,
        DexploreError::NotStarted => StatusCode::NOT_FOUND,
        DexploreError::TerminalState | DexploreError::TransitionInFlight => StatusCode::CONFLICT,
        DexploreError::InvalidChoice { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        DexploreError::Service(_) => StatusCode::NOT_IMPLEMENTED,
        DexploreError::DuplicateNode(_)
        | DexploreError::DanglingReference(_)
        | DexploreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (status_for(&self.0), Json(ErrorResponse::from(&self.0))).into_response()
    }
}

// =============================================================================
// TESTS
// =============================================================================

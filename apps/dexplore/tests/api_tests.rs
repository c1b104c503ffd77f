//! Integration tests for the dexplore HTTP API.
//!
//! Uses axum-test to drive the router without starting a real server.

#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, StatusCode, header::AUTHORIZATION};
use axum_test::TestServer;
use dexplore::api::{
    AppState, ComponentTypesResponse, ErrorResponse, HealthResponse, KnowledgeResponse,
    create_router,
};
use dexplore::config::Config;
use dexplore_core::{ExplorationState, KnowledgeBase, Rendering, Step};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn test_config() -> Config {
    Config {
        rate_limit: 0,
        ..Config::default()
    }
}

fn create_test_server() -> TestServer {
    let state = AppState::new(KnowledgeBase::collision_avoidance());
    TestServer::new(create_router(state, &test_config())).unwrap()
}

fn create_capped_test_server(max: usize) -> TestServer {
    let state = AppState::new(KnowledgeBase::collision_avoidance()).with_max_explorations(max);
    TestServer::new(create_router(state, &test_config())).unwrap()
}

fn create_auth_test_server(api_key: &str) -> TestServer {
    let config = Config {
        api_key: Some(api_key.to_string()),
        ..test_config()
    };
    let state = AppState::new(KnowledgeBase::collision_avoidance());
    TestServer::new(create_router(state, &config)).unwrap()
}

async fn start(server: &TestServer, id: &str, system: &str) -> ExplorationState {
    let response = server
        .post(&format!("/api/explorations/{id}/start"))
        .json(&json!({ "system": system }))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Walk `car_running` to the branch point.
async fn start_at_branch(server: &TestServer, id: &str) -> ExplorationState {
    start(server, id, "car_running").await;
    for (action, body) in [
        ("situation", json!({ "situation": "obstacle_detected" })),
        ("problem", json!({ "problem": "collision_risk" })),
        ("intention", json!({ "intention": "avoid_collision" })),
    ] {
        server
            .post(&format!("/api/explorations/{id}/{action}"))
            .json(&body)
            .await
            .assert_status_ok();
    }
    server
        .get(&format!("/api/explorations/{id}"))
        .await
        .json()
}

/// Run the leaf system `obstacle_alarming_system` to completion.
async fn complete_leaf(server: &TestServer, id: &str) {
    start(server, id, "obstacle_alarming_system").await;
    for (action, body) in [
        ("situation", json!({ "situation": "dark" })),
        ("problem", json!({ "problem": "unseen" })),
        ("intention", json!({ "intention": "warn" })),
        ("solution", json!({ "solution": "audio_alarm" })),
    ] {
        server
            .post(&format!("/api/explorations/{id}/{action}"))
            .json(&body)
            .await
            .assert_status_ok();
    }
}

fn error_kind(response: &axum_test::TestResponse) -> String {
    response.json::<ErrorResponse>().kind
}

// =============================================================================
// HEALTH & KNOWLEDGE
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert!(!health.version.is_empty());
}

#[tokio::test]
async fn test_knowledge_endpoint() {
    let server = create_test_server();

    let response = server.get("/api/knowledge").await;

    response.assert_status_ok();
    let knowledge: KnowledgeResponse = response.json();
    assert!(knowledge.systems.contains(&"car_running".to_string()));
    assert_eq!(knowledge.knowledge.decompositions.len(), 2);
}

#[tokio::test]
async fn test_component_types_endpoint() {
    let server = create_test_server();

    let response = server.get("/api/component-types").await;

    response.assert_status_ok();
    let catalog: ComponentTypesResponse = response.json();
    let de: Vec<_> = catalog.de_components.iter().map(|c| c.code.as_str()).collect();
    let si: Vec<_> = catalog.si_components.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(de, vec!["SI", "PI", "EI", "DI", "CB", "SA"]);
    assert_eq!(si, vec!["CND", "BUP", "COL", "ALT", "EXO"]);
    assert_eq!(catalog.de_components[0].name, "Situation Assessment");
    assert_eq!(catalog.si_components[1].tag, "Backups");

    let raw: serde_json::Value = response.json();
    assert_eq!(raw["de_components"][3]["type"], "DI");
}

// =============================================================================
// EXPLORATION FLOW
// =============================================================================

#[tokio::test]
async fn test_start_returns_suggestions() {
    let server = create_test_server();

    let state = start(&server, "tab-1", "car_running").await;

    assert_eq!(state.step, Step::SituationAssessment);
    assert_eq!(state.suggested_situation.as_deref(), Some("obstacle_detected"));
    assert!(state.graph.is_empty());
}

#[tokio::test]
async fn test_full_exploration_over_http() {
    let server = create_test_server();
    let mut state = start(&server, "full", "car_running").await;

    for _ in 0..64 {
        if state.is_completed() {
            break;
        }
        let event = dexplore_core::suggested_event(&state).unwrap();
        let response = server
            .post(&format!("/api/explorations/full/{}", event.name()))
            .json(&event)
            .await;
        response.assert_status_ok();
        state = response.json();
    }

    assert!(state.is_completed());
    assert_eq!(state.graph.node_count(), 24);
    assert_eq!(state.graph.edge_count(), 23);

    let rendering: Rendering = server.get("/api/explorations/full/render").await.json();
    assert_eq!(rendering.nodes.len(), 24);
    assert_eq!(rendering.edges.len(), 23);
}

#[tokio::test]
async fn test_explorations_are_isolated_by_id() {
    let server = create_test_server();
    start_at_branch(&server, "a").await;
    start(&server, "b", "human_maneuvering_system").await;

    let a: ExplorationState = server.get("/api/explorations/a").await.json();
    let b: ExplorationState = server.get("/api/explorations/b").await.json();

    assert_eq!(a.step, Step::ChoosePath);
    assert_eq!(a.graph.node_count(), 3);
    assert_eq!(b.step, Step::SituationAssessment);
    assert!(b.graph.is_empty());
}

#[tokio::test]
async fn test_decompose_queues_subsystems() {
    let server = create_test_server();
    start_at_branch(&server, "d").await;

    let response = server
        .post("/api/explorations/d/decompose")
        .json(&json!({
            "sub_intentions": ["avoid_by_car", "avoid_by_driver"],
            "sub_systems": ["auto_maneuvering_system", "human_maneuvering_system"]
        }))
        .await;

    response.assert_status_ok();
    let state: ExplorationState = response.json();
    assert_eq!(state.system, "auto_maneuvering_system");
    assert_eq!(
        state.pending_subsystems.iter().collect::<Vec<_>>(),
        vec!["human_maneuvering_system"]
    );
    assert_eq!(state.step, Step::SituationAssessment);
}

// =============================================================================
// CAPACITY & DISCARD
// =============================================================================

#[tokio::test]
async fn test_delete_discards_exploration() {
    let server = create_test_server();
    start(&server, "gone", "car_running").await;

    server
        .delete("/api/explorations/gone")
        .await
        .assert_status(StatusCode::NO_CONTENT);

    server
        .get("/api/explorations/gone")
        .await
        .assert_status_not_found();
    let again = server.delete("/api/explorations/gone").await;
    again.assert_status_not_found();
    assert_eq!(error_kind(&again), "not_started");
}

#[tokio::test]
async fn test_full_server_rejects_new_exploration() {
    let server = create_capped_test_server(2);
    start(&server, "a", "car_running").await;
    start(&server, "b", "car_running").await;

    let response = server
        .post("/api/explorations/c/start")
        .json(&json!({ "system": "car_running" }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(error_kind(&response), "validation");
    server.get("/api/explorations/c").await.assert_status_not_found();

    // Restarting a held id never needs room.
    start(&server, "a", "human_maneuvering_system").await;

    server
        .delete("/api/explorations/b")
        .await
        .assert_status(StatusCode::NO_CONTENT);
    start(&server, "c", "car_running").await;
}

#[tokio::test]
async fn test_full_server_evicts_completed_exploration() {
    let server = create_capped_test_server(2);
    start(&server, "open", "car_running").await;
    complete_leaf(&server, "done").await;

    start(&server, "fresh", "car_running").await;

    server.get("/api/explorations/done").await.assert_status_not_found();
    server.get("/api/explorations/open").await.assert_status_ok();
    server.get("/api/explorations/fresh").await.assert_status_ok();
}

// =============================================================================
// ERROR MAPPING
// =============================================================================

#[tokio::test]
async fn test_submit_before_start_is_not_found() {
    let server = create_test_server();

    let response = server
        .post("/api/explorations/nowhere/situation")
        .json(&json!({ "situation": "x" }))
        .await;

    response.assert_status_not_found();
    assert_eq!(error_kind(&response), "not_started");
}

#[tokio::test]
async fn test_blank_input_is_bad_request() {
    let server = create_test_server();
    start(&server, "blank", "car_running").await;

    let response = server
        .post("/api/explorations/blank/situation")
        .json(&json!({ "situation": "   " }))
        .await;

    response.assert_status_bad_request();
    assert_eq!(error_kind(&response), "validation");

    let state: ExplorationState = server.get("/api/explorations/blank").await.json();
    assert!(state.graph.is_empty());
}

#[tokio::test]
async fn test_wrong_step_is_bad_request() {
    let server = create_test_server();
    start(&server, "early", "car_running").await;

    let response = server
        .post("/api/explorations/early/solution")
        .json(&json!({ "solution": "automatic_braking" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_unknown_solution_is_unprocessable() {
    let server = create_test_server();
    start(&server, "s", "auto_maneuvering_system").await;
    for (action, body) in [
        ("situation", json!({ "situation": "normal_driving" })),
        ("problem", json!({ "problem": "drift" })),
        ("intention", json!({ "intention": "keep_lane" })),
    ] {
        server
            .post(&format!("/api/explorations/s/{action}"))
            .json(&body)
            .await
            .assert_status_ok();
    }

    let response = server
        .post("/api/explorations/s/solution")
        .json(&json!({ "solution": "teleport" }))
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorResponse = response.json();
    assert_eq!(body.kind, "invalid_choice");
    assert_eq!(body.detail.as_deref(), Some("teleport"));
}

#[tokio::test]
async fn test_completed_exploration_is_conflict() {
    let server = create_test_server();
    complete_leaf(&server, "done").await;

    let response = server
        .post("/api/explorations/done/situation")
        .json(&json!({ "situation": "again" }))
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(error_kind(&response), "terminal_state");
}

#[tokio::test]
async fn test_unknown_system_is_accepted_without_suggestions() {
    let server = create_test_server();

    let state = start(&server, "unknown", "spaceship").await;

    assert_eq!(state.system, "spaceship");
    assert!(state.suggested_situation.is_none());
    assert!(state.available_situations.is_empty());
}

#[tokio::test]
async fn test_invalid_exploration_id_is_bad_request() {
    let server = create_test_server();

    let response = server.get("/api/explorations/bad%20id").await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn test_render_before_start_is_not_found() {
    let server = create_test_server();

    server
        .get("/api/explorations/ghost/render")
        .await
        .assert_status_not_found();
}

#[tokio::test]
async fn test_convert_is_not_hosted() {
    let server = create_test_server();

    let response = server
        .post("/api/convert")
        .json(&json!({ "type": "DE", "nodes": [], "edges": [] }))
        .await;

    response.assert_status(StatusCode::NOT_IMPLEMENTED);
    assert_eq!(error_kind(&response), "service");
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();
    start(&server, "json", "car_running").await;

    let response = server
        .post("/api/explorations/json/situation")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION MIDDLEWARE TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/api/knowledge")
        .add_header(
            AUTHORIZATION,
            format!("Bearer {}", api_key).parse::<HeaderValue>().unwrap(),
        )
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .get("/api/knowledge")
        .add_header(AUTHORIZATION, "Bearer wrong-key".parse::<HeaderValue>().unwrap())
        .await;

    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let server = create_auth_test_server("correct-key");

    server
        .post("/api/explorations/x/start")
        .json(&json!({ "system": "car_running" }))
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_auth_health_exempt() {
    let server = create_auth_test_server("correct-key");

    server.get("/health").await.assert_status_ok();
}

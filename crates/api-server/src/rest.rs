//! REST handlers for ad decisions and operational endpoints.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use podads_core::decision::Decision;
use podads_core::types::AdRequest;
use podads_decisioning::{BatchOutcome, DecisionEngine};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, warn};

/// Maximum request id length.
const MAX_FIELD_LEN: usize = 256;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Shared application state for REST handlers.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<DecisionEngine>,
    pub node_id: String,
    pub start_time: Instant,
    pub catalog_size: usize,
    pub default_seed: u64,
    pub default_batch_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct DecisionParams {
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct BatchParams {
    pub seed: Option<u64>,
    pub count: Option<usize>,
}

/// Validate an ad request at the API boundary.
fn validate_ad_request(request: &AdRequest) -> Result<(), &'static str> {
    if request.request_id.trim().is_empty() {
        return Err("'requestId' must not be empty");
    }
    if request.request_id.len() > MAX_FIELD_LEN {
        return Err("'requestId' exceeds maximum length");
    }
    if request.podcast.episode.trim().is_empty() {
        return Err("'podcast.episode' must not be empty");
    }
    if request.podcast.show.trim().is_empty() {
        return Err("'podcast.show' must not be empty");
    }
    if request.listener.geo.trim().is_empty() {
        return Err("'listener.geo' must not be empty");
    }
    Ok(())
}

fn reject_invalid(request: &AdRequest) -> Result<(), ApiError> {
    validate_ad_request(request).map_err(|msg| {
        warn!(request_id = %request.request_id, error = msg, "Ad request validation failed");
        metrics::counter!("api.validation_errors").increment(1);
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_ad_request".to_string(),
                message: msg.to_string(),
            }),
        )
    })
}

fn decision_failed() -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: "decision_failed".to_string(),
            message: "Internal processing error".to_string(),
        }),
    )
}

/// POST /v1/decision?seed=N
pub async fn handle_decision(
    State(state): State<AppState>,
    Query(params): Query<DecisionParams>,
    Json(request): Json<AdRequest>,
) -> Result<Json<Decision>, ApiError> {
    reject_invalid(&request)?;

    let seed = params.seed.unwrap_or(state.default_seed);
    match state.engine.execute(&request, seed) {
        Ok(decision) => Ok(Json(decision)),
        Err(e) => {
            error!(error = %e, request_id = %request.request_id, "Decision failed");
            Err(decision_failed())
        }
    }
}

/// POST /v1/decision/batch?seed=N&count=M
///
/// The batch runs on the blocking pool so large counts don't stall the runtime.
pub async fn handle_batch(
    State(state): State<AppState>,
    Query(params): Query<BatchParams>,
    Json(request): Json<AdRequest>,
) -> Result<Json<BatchOutcome>, ApiError> {
    reject_invalid(&request)?;

    let seed = params.seed.unwrap_or(state.default_seed);
    let count = params.count.unwrap_or(state.default_batch_count);
    let request_id = request.request_id.clone();
    let engine = state.engine.clone();

    match tokio::task::spawn_blocking(move || engine.execute_batch(&request, seed, count)).await {
        Ok(Ok(outcome)) => Ok(Json(outcome)),
        Ok(Err(e)) => {
            error!(error = %e, request_id = %request_id, "Batch decision failed");
            Err(decision_failed())
        }
        Err(e) => {
            error!(error = %e, request_id = %request_id, "Batch worker panicked");
            Err(decision_failed())
        }
    }
}

/// GET /
pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Podcast ad decision service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        node_id: state.node_id.clone(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        candidates: state.catalog_size,
        filters: state.engine.filter_names().len(),
    })
}

/// GET /ready: 200 once a non-empty catalog is loaded.
pub async fn readiness(State(state): State<AppState>) -> StatusCode {
    if state.catalog_size > 0 {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /live
pub async fn liveness() -> StatusCode {
    StatusCode::OK
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub node_id: String,
    pub uptime_secs: u64,
    pub candidates: usize,
    pub filters: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::router;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use podads_core::config::DecisionConfig;
    use podads_decisioning::{Blocklist, FixtureCatalog};
    use serde_json::Value;
    use tower::ServiceExt;

    const CAMPAIGNS: &str = include_str!("../../../fixtures/campaigns.json");
    const CREATIVES: &str = include_str!("../../../fixtures/creatives.json");
    const BLOCKLIST: &str = include_str!("../../../fixtures/blocklist.json");
    const REQUEST: &str = include_str!("../../../fixtures/request.json");

    fn state() -> AppState {
        let catalog = FixtureCatalog::from_json(CAMPAIGNS, CREATIVES).unwrap();
        let catalog_size = catalog.len();
        let blocklist = Blocklist::from_json(BLOCKLIST).unwrap();
        let engine = DecisionEngine::new(
            Arc::new(catalog),
            Arc::new(blocklist),
            &DecisionConfig::default(),
        );
        AppState {
            engine: Arc::new(engine),
            node_id: "podads-test".to_string(),
            start_time: Instant::now(),
            catalog_size,
            default_seed: 12345,
            default_batch_count: 10,
        }
    }

    fn post(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(request: Request<Body>) -> (StatusCode, Value) {
        let response = router(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    fn request_with(path: &str, value: Value) -> String {
        let mut request: Value = serde_json::from_str(REQUEST).unwrap();
        let mut target = &mut request;
        let parts: Vec<&str> = path.split('.').collect();
        for part in &parts[..parts.len() - 1] {
            target = &mut target[*part];
        }
        target[parts[parts.len() - 1]] = value;
        request.to_string()
    }

    #[test]
    fn test_validation() {
        let request: AdRequest = serde_json::from_str(REQUEST).unwrap();
        assert!(validate_ad_request(&request).is_ok());

        let blank = request.with_request_id("  ");
        assert!(validate_ad_request(&blank).is_err());

        let long = request.with_request_id("r".repeat(MAX_FIELD_LEN + 1));
        assert!(validate_ad_request(&long).is_err());
    }

    #[tokio::test]
    async fn test_decision_endpoint_fills() {
        let (status, json) = send(post("/v1/decision?seed=12345", REQUEST.to_string())).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["requestId"], "req-demo-001");
        assert_eq!(json["seed"], 12345);
        assert_eq!(json["winner"]["candidate"]["campaignId"], "camp-005");
        assert_eq!(json["winner"]["serve"]["pricePaid"], 600.0);
    }

    #[tokio::test]
    async fn test_decision_uses_default_seed() {
        let (status, json) = send(post("/v1/decision", REQUEST.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["seed"], 12345);
    }

    #[tokio::test]
    async fn test_invalid_request_is_rejected() {
        let body = request_with("listener.geo", Value::String(String::new()));
        let (status, json) = send(post("/v1/decision", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "invalid_ad_request");
        assert_eq!(json["message"], "'listener.geo' must not be empty");
    }

    #[tokio::test]
    async fn test_blank_episode_is_rejected() {
        let body = request_with("podcast.episode", Value::String("   ".to_string()));
        let (status, json) = send(post("/v1/decision", body)).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "'podcast.episode' must not be empty");
    }

    #[tokio::test]
    async fn test_unknown_enum_is_client_error() {
        let body = request_with("podcast.category", Value::String("gardening".to_string()));
        let (status, _) = send(post("/v1/decision", body)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_batch_endpoint() {
        let (status, json) = send(post(
            "/v1/decision/batch?seed=100&count=3",
            REQUEST.to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["count"], 3);
        assert_eq!(json["fills"], 3);
        assert_eq!(json["noFills"], 0);
        assert_eq!(json["decisions"][1]["requestId"], "req-demo-001-batch-1");
        assert_eq!(json["decisions"][1]["seed"], 101);
    }

    #[tokio::test]
    async fn test_batch_count_clamped() {
        let (_, json) = send(post("/v1/decision/batch?count=0", REQUEST.to_string())).await;
        assert_eq!(json["count"], 1);

        let (_, json) = send(post("/v1/decision/batch", REQUEST.to_string())).await;
        assert_eq!(json["count"], 10);
    }

    #[tokio::test]
    async fn test_operational_endpoints() {
        let get = |uri: &str| Request::builder().uri(uri).body(Body::empty()).unwrap();

        let (status, json) = send(get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["candidates"], 16);
        assert_eq!(json["filters"], 13);

        let (status, json) = send(get("/")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(json["version"].is_string());

        assert_eq!(send(get("/ready")).await.0, StatusCode::OK);
        assert_eq!(send(get("/live")).await.0, StatusCode::OK);
    }
}

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use giftwise_common::api::gifts::{
    ErrorBody, GenerateGiftsRequest, GenerateGiftsResponse, MISSING_FIELDS_MESSAGE,
};

use crate::advisor::{AdvisorOutcome, GiftAdvisorSession};

/// Shared application state.
pub struct AppState {
    pub advisor: GiftAdvisorSession,
    pub metrics_handle: PrometheusHandle,
}

/// Build the router with CORS and request tracing.
pub fn create_router(state: Arc<AppState>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/generate-gifts", post(generate_gifts_handler))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!(origin = %origin, error = %e, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    layer.allow_origin(AllowOrigin::list(origins))
}

type ErrorResponse = (StatusCode, Json<ErrorBody>);

/// POST /generate-gifts — validate, run the gift session, map the outcome.
pub async fn generate_gifts_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateGiftsRequest>, JsonRejection>,
) -> Result<Json<GenerateGiftsResponse>, ErrorResponse> {
    metrics::counter!("gifts.requests").increment(1);

    let request = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected gift request body");
            GenerateGiftsRequest::default()
        }
    };

    let request = request.validate().map_err(|e| {
        tracing::info!(error = %e, "Gift request failed validation");
        metrics::counter!("gifts.outcome", "outcome" => "invalid").increment(1);
        bad_request(MISSING_FIELDS_MESSAGE)
    })?;

    tracing::info!(
        name = %request.name,
        age = request.age,
        occasion = %request.occasion,
        "Client requesting gift ideas"
    );

    match state.advisor.run(&request).await {
        Ok(AdvisorOutcome::Gifts {
            gifts,
            tool_calls,
            tool_results,
        }) => Ok(Json(GenerateGiftsResponse::success(
            request,
            gifts,
            tool_calls,
            tool_results,
        ))),
        Ok(AdvisorOutcome::Unparseable(malformed)) => {
            Ok(Json(GenerateGiftsResponse::unparseable(malformed.raw)))
        }
        Err(e) if e.is_recoverable() => Ok(Json(GenerateGiftsResponse::failure(e.to_string()))),
        Err(e) => {
            tracing::error!(error = %e, "Error generating gift ideas");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorBody {
                    error: "Internal server error".into(),
                    details: Some(e.to_string()),
                }),
            ))
        }
    }
}

fn bad_request(message: &str) -> ErrorResponse {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorBody {
            error: message.to_string(),
            details: None,
        }),
    )
}

async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(serde_json::json!({ "status": "healthy" })),
    )
}

async fn metrics_handler(State(state): State<Arc<AppState>>) -> String {
    state.metrics_handle.render()
}

//! HTTP surface: read-only JSON endpoints over the feed service.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use common::error::truncate_detail;
use common::Error;

use crate::service::FeedService;

/// Upstream error bodies are cut to this many bytes before they reach a
/// client.
const DETAIL_LIMIT: usize = 300;

pub fn create_router(service: Arc<FeedService>) -> Router {
    Router::new()
        .route("/api/odds", get(get_odds))
        .route("/api/scores", get(get_scores))
        .route("/api/history", get(get_history))
        .route("/api/health", get(get_health))
        .with_state(service)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[derive(Debug, Deserialize)]
struct OddsQuery {
    live: Option<bool>,
    bookmaker: Option<String>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    /// Upstream HTTP status when one exists; null on transport failures.
    status: Option<u16>,
    detail: String,
}

async fn get_odds(
    State(service): State<Arc<FeedService>>,
    Query(params): Query<OddsQuery>,
) -> Response {
    let live = params.live.unwrap_or(false);
    match service.odds_rows(live, params.bookmaker.as_deref()).await {
        Ok(rows) => Json(rows).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_scores(State(service): State<Arc<FeedService>>) -> Response {
    match service.scores().await {
        Ok(games) => Json(games).into_response(),
        Err(e) => error_response(e),
    }
}

async fn get_history(State(service): State<Arc<FeedService>>) -> Response {
    Json(service.history_today().await).into_response()
}

async fn get_health(State(service): State<Arc<FeedService>>) -> Response {
    Json(service.health().await).into_response()
}

/// Upstream failures surface as 422 with the provider's truncated detail;
/// anything else is a 500.
fn error_response(err: Error) -> Response {
    if err.is_upstream() {
        let body = ErrorBody {
            error: "upstream request failed".to_string(),
            status: err.upstream_status(),
            detail: truncate_detail(&err.to_string(), DETAIL_LIMIT),
        };
        (StatusCode::UNPROCESSABLE_ENTITY, Json(body)).into_response()
    } else {
        error!("internal error: {err}");
        let body = ErrorBody {
            error: "internal error".to_string(),
            status: None,
            detail: truncate_detail(&err.to_string(), DETAIL_LIMIT),
        };
        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_error_maps_to_422_with_status() {
        let err = Error::OddsApi {
            status: 429,
            detail: "quota exhausted".to_string(),
        };
        let response = error_response(err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_transport_error_still_maps_to_422() {
        let err = Error::Http("connection refused".to_string());
        let response = error_response(err);
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_other_errors_map_to_500() {
        let err = Error::Other("state poisoned".to_string());
        let response = error_response(err);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_body_serializes_status_even_when_null() {
        let body = ErrorBody {
            error: "upstream request failed".to_string(),
            status: None,
            detail: "connection refused".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"status\":null"));

        let body = ErrorBody {
            error: "upstream request failed".to_string(),
            status: Some(502),
            detail: "bad gateway".to_string(),
        };
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"status\":502"));
    }
}

//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Form, Json,
    extract::{FromRequest, Request, State},
    http::header::CONTENT_TYPE,
};
use hibiki_shared::time::millis_to_rfc3339;

use crate::{
    infrastructure::dto::http::{ApiResponseDto, ConnectionDto, HealthDto, PublishRequestDto},
    ui::state::AppState,
    usecase::PublishError,
};

/// `POST /messages/new`: broadcast a chat message to every connection.
///
/// Accepts JSON and `application/x-www-form-urlencoded` bodies. An unparseable
/// body is treated the same as a missing `content`.
pub async fn publish_message(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Json<ApiResponseDto> {
    let content = extract_content(request).await;

    match state.publisher.publish(content).await {
        Ok(_) => Json(ApiResponseDto::ok()),
        Err(PublishError::InvalidContent(_)) => Json(ApiResponseDto::failure("Missing content.")),
    }
}

/// Pull `content` out of a JSON or form body, choosing by `Content-Type`.
async fn extract_content(request: Request) -> Option<String> {
    let is_form = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

    if is_form {
        match Form::<PublishRequestDto>::from_request(request, &()).await {
            Ok(Form(body)) => body.content,
            Err(rejection) => {
                tracing::debug!("Rejected publish form body: {}", rejection);
                None
            }
        }
    } else {
        match Json::<PublishRequestDto>::from_request(request, &()).await {
            Ok(Json(body)) => body.content,
            Err(rejection) => {
                tracing::debug!("Rejected publish JSON body: {}", rejection);
                None
            }
        }
    }
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthDto> {
    Json(HealthDto {
        status: "ok".to_string(),
        connections: state.registry.len().await,
    })
}

/// Debug endpoint listing the registry (for testing purposes)
pub async fn debug_connections(State(state): State<Arc<AppState>>) -> Json<Vec<ConnectionDto>> {
    let connections = state
        .registry
        .snapshot()
        .await
        .into_iter()
        .map(|handle| ConnectionDto {
            id: handle.id.to_string(),
            connected_at: millis_to_rfc3339(handle.connected_at),
            alive: handle.liveness.is_alive(),
        })
        .collect();
    Json(connections)
}

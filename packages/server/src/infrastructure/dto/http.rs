//! HTTP API request and response bodies.

use serde::{Deserialize, Serialize};

/// Body of `POST /messages/new`.
#[derive(Debug, Deserialize)]
pub struct PublishRequestDto {
    pub content: Option<String>,
}

/// `{success, data?}` envelope returned by the publish endpoint.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiResponseDto {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<ApiMessageDto>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiMessageDto {
    pub message: String,
}

impl ApiResponseDto {
    pub fn ok() -> Self {
        Self {
            success: true,
            data: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: Some(ApiMessageDto {
                message: message.into(),
            }),
        }
    }
}

/// Body of `GET /api/health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
    pub connections: usize,
}

/// One entry of `GET /debug/connections`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ConnectionDto {
    pub id: String,
    pub connected_at: Option<String>,
    pub alive: bool,
}

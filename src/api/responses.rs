// Response helpers for the legacy API

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::core::errors::ProxyError;

/// Content type legacy clients expect on every successful answer
pub const LEGACY_JSON: &str = "application/json;charset=utf-8";

/// 200 with a pre-serialized JSON body
pub fn legacy_json(body: Vec<u8>) -> Response {
    (StatusCode::OK, [(header::CONTENT_TYPE, LEGACY_JSON)], body).into_response()
}

/// API error type that converts domain errors to plain-text HTTP responses
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: String) -> Self {
        Self { status, message }
    }

    pub fn from_proxy_error(err: ProxyError) -> Self {
        let status = StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self {
            status,
            message: err.user_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.message,
        )
            .into_response()
    }
}

impl From<ProxyError> for ApiError {
    fn from(err: ProxyError) -> Self {
        ApiError::from_proxy_error(err)
    }
}

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::discord::DiscordError;

/// How much upstream error body we are willing to echo back to the caller.
const DETAIL_LIMIT: usize = 256;

#[derive(Debug)]
pub enum AppError {
    Honeypot,
    BotAgent,
    OriginDenied,
    RateLimited { retry_after: u64 },
    Upstream { status: u16, body: String },
    UpstreamUnreachable(String),
    MalformedUpstream(String),
    Internal(String),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::Honeypot => StatusCode::BAD_REQUEST,
            AppError::BotAgent => StatusCode::FORBIDDEN,
            AppError::OriginDenied => StatusCode::FORBIDDEN,
            AppError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            // Hand the upstream's own verdict straight back to the caller.
            AppError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            AppError::UpstreamUnreachable(_) => StatusCode::BAD_GATEWAY,
            AppError::MalformedUpstream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Honeypot => "invalid request".to_string(),
            AppError::BotAgent => "automated clients are not served".to_string(),
            AppError::OriginDenied => "origin not allowed".to_string(),
            AppError::RateLimited { retry_after } => {
                format!("rate limited, retry after {retry_after}s")
            }
            AppError::Upstream { status, .. } => {
                format!("invite service rejected the request ({status})")
            }
            AppError::UpstreamUnreachable(e) => {
                tracing::error!("upstream unreachable: {e}");
                "invite service unreachable".to_string()
            }
            AppError::MalformedUpstream(e) => {
                tracing::error!("unusable upstream response: {e}");
                "invite service returned an unusable response".to_string()
            }
            AppError::Internal(e) => {
                tracing::error!("internal error: {e}");
                "internal server error".to_string()
            }
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            AppError::Upstream { body, .. } if !body.is_empty() => {
                Some(body.chars().take(DETAIL_LIMIT).collect())
            }
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.details() {
            Some(details) => json!({ "error": self.message(), "details": details }),
            None => json!({ "error": self.message() }),
        };

        let mut response = (status, Json(body)).into_response();
        if let AppError::RateLimited { retry_after } = &self {
            response
                .headers_mut()
                .insert("Retry-After", retry_after.to_string().parse().unwrap());
        }
        response
    }
}

impl From<DiscordError> for AppError {
    fn from(e: DiscordError) -> Self {
        match e {
            DiscordError::Http(e) => AppError::UpstreamUnreachable(e.to_string()),
            DiscordError::Api { status, body } => AppError::Upstream { status, body },
            DiscordError::Malformed(msg) => AppError::MalformedUpstream(msg),
        }
    }
}

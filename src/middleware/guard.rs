use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::error::AppError;
use crate::state::AppState;

/// User-Agent substrings that mark obvious automation. Matched lowercase.
const BOT_MARKERS: &[&str] = &[
    "bot", "crawler", "spider", "curl", "wget", "python", "scrapy", "headless", "phantomjs",
    "selenium",
];

/// Stateless request filter run before the issuer: honeypot field, bot
/// user-agents, and (when configured) an origin allowlist.
pub async fn boundary_guard(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if honeypot_triggered(req.uri().query()) {
        return AppError::Honeypot.into_response();
    }

    let user_agent = req
        .headers()
        .get("User-Agent")
        .and_then(|v| v.to_str().ok());
    if is_bot_agent(user_agent) {
        return AppError::BotAgent.into_response();
    }

    if let Some(allowed) = &state.config.allowed_origins {
        let origin = req.headers().get("Origin").and_then(|v| v.to_str().ok());
        let referer = req.headers().get("Referer").and_then(|v| v.to_str().ok());
        if !origin_allowed(allowed, origin, referer) {
            return AppError::OriginDenied.into_response();
        }
    }

    next.run(req).await
}

/// Real users never fill the `email` field; any non-empty value means a form
/// scraper submitted it.
fn honeypot_triggered(query: Option<&str>) -> bool {
    let Some(query) = query else { return false };
    query.split('&').any(|pair| match pair.split_once('=') {
        Some(("email", value)) => !value.is_empty(),
        _ => false,
    })
}

fn is_bot_agent(user_agent: Option<&str>) -> bool {
    let Some(ua) = user_agent.map(str::trim).filter(|ua| !ua.is_empty()) else {
        return true;
    };
    let ua = ua.to_lowercase();
    BOT_MARKERS.iter().any(|marker| ua.contains(marker))
}

/// A present Origin must match the allowlist exactly. Without one, a present
/// Referer must sit under an allowed origin. Neither header present passes;
/// header-less non-browser clients are the user-agent check's problem.
fn origin_allowed(allowed: &[String], origin: Option<&str>, referer: Option<&str>) -> bool {
    match (origin, referer) {
        (Some(origin), _) => allowed
            .iter()
            .any(|a| a.trim_end_matches('/') == origin.trim_end_matches('/')),
        (None, Some(referer)) => allowed.iter().any(|a| {
            let base = a.trim_end_matches('/');
            referer == base || referer.starts_with(&format!("{base}/"))
        }),
        (None, None) => true,
    }
}

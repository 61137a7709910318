mod health;
mod invite;

use axum::http::{HeaderValue, Method};
use axum::middleware as axum_mw;
use axum::routing::get;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::middleware::guard::boundary_guard;
use crate::middleware::rate_limit::rate_limit_middleware;
use crate::state::AppState;

/// Build the full application router. Consumes the state so middleware
/// layers that need `State<AppState>` (guard, rate limiter) can be wired up.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(health::health))
        .route("/version", get(health::version))
        .merge(invite_routes(&state))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn invite_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/invite", get(invite::issue_invite))
        .layer(axum_mw::from_fn_with_state(state.clone(), boundary_guard))
        .layer(axum_mw::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
}

fn cors_layer(config: &Config) -> CorsLayer {
    match &config.allowed_origins {
        Some(origins) => {
            let list: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(list))
                .allow_methods([Method::GET])
                .allow_headers(Any)
        }
        None => CorsLayer::permissive(),
    }
}

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use dashmap::DashMap;
use http::Request;

use gatehouse::cache::{CacheError, CacheStore, MemoryCache};
use gatehouse::clock::{Clock, SystemClock};
use gatehouse::config::Config;
use gatehouse::discord::DiscordClient;
use gatehouse::issuer::{cache_key, Issuer};
use gatehouse::models::invite::InviteRecord;
use gatehouse::routes;
use gatehouse::state::AppState;

/// A User-Agent the boundary filter treats as a real browser.
pub const BROWSER_UA: &str =
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 Chrome/126.0 Safari/537.36";

/// Canned behavior for the stub invite upstream.
#[derive(Clone, Copy)]
pub enum UpstreamBehavior {
    /// 200 with the given invite code.
    Code(&'static str),
    /// Fixed non-success status and body.
    Status(u16, &'static str),
    /// 200 whose body has no code field.
    MissingCode,
}

/// Cache store whose every operation fails, for outage tests.
pub struct FailingCache;

#[async_trait]
impl CacheStore for FailingCache {
    async fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
        Err(CacheError::Backend("store offline".to_string()))
    }

    async fn put(&self, _key: &str, _value: &str, _ttl_secs: u64) -> Result<(), CacheError> {
        Err(CacheError::Backend("store offline".to_string()))
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Err(CacheError::Backend("store offline".to_string()))
    }
}

/// Spawn a stub Discord API on an ephemeral port. Returns its base URL and a
/// counter of invite-creation calls it served.
async fn spawn_upstream(behavior: UpstreamBehavior) -> (String, Arc<AtomicUsize>) {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = Arc::clone(&hits);

    let app = axum::Router::new().route(
        "/channels/{channel_id}/invites",
        axum::routing::post(move || {
            let hits = Arc::clone(&handler_hits);
            async move {
                hits.fetch_add(1, Ordering::SeqCst);
                match behavior {
                    UpstreamBehavior::Code(code) => {
                        Json(serde_json::json!({ "code": code, "uses": 0 })).into_response()
                    }
                    UpstreamBehavior::Status(status, body) => (
                        StatusCode::from_u16(status).unwrap(),
                        body.to_string(),
                    )
                        .into_response(),
                    UpstreamBehavior::MissingCode => {
                        Json(serde_json::json!({ "message": "ok" })).into_response()
                    }
                }
            }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://127.0.0.1:{}", addr.port()), hits)
}

/// Test server owning a full AppState wired against a stub upstream.
/// Each instance is isolated — safe for parallel tests.
pub struct TestServer {
    pub state: AppState,
    pub cache: Arc<dyn CacheStore>,
    upstream_hits: Arc<AtomicUsize>,
}

impl TestServer {
    pub async fn new(behavior: UpstreamBehavior) -> Self {
        Self::build(behavior, None, Arc::new(MemoryCache::new())).await
    }

    pub async fn with_origins(behavior: UpstreamBehavior, origins: Vec<String>) -> Self {
        Self::build(behavior, Some(origins), Arc::new(MemoryCache::new())).await
    }

    pub async fn with_failing_cache(behavior: UpstreamBehavior) -> Self {
        Self::build(behavior, None, Arc::new(FailingCache)).await
    }

    async fn build(
        behavior: UpstreamBehavior,
        allowed_origins: Option<Vec<String>>,
        cache: Arc<dyn CacheStore>,
    ) -> Self {
        let (base_url, upstream_hits) = spawn_upstream(behavior).await;

        let config = Config {
            port: 0,
            bot_token: "test-token".to_string(),
            channel_id: "4242".to_string(),
            api_base: base_url,
            allowed_origins,
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let discord = DiscordClient::new(&config.api_base, &config.bot_token, &config.channel_id);
        let issuer = Issuer::new(Arc::clone(&cache), discord, Arc::clone(&clock));

        let state = AppState {
            config: Arc::new(config),
            issuer: Arc::new(issuer),
            clock,
            rate_limits: Arc::new(DashMap::new()),
        };

        Self {
            state,
            cache,
            upstream_hits,
        }
    }

    /// Returns an Axum Router wired to this server's state for `oneshot()` calls.
    pub fn router(&self) -> axum::Router {
        routes::router(self.state.clone())
    }

    pub fn upstream_hits(&self) -> usize {
        self.upstream_hits.load(Ordering::SeqCst)
    }

    /// Plant a record in the cache store under its identifier's key.
    pub async fn seed_record(&self, record: &InviteRecord, ttl_secs: u64) {
        self.cache
            .put(
                &cache_key(&record.uuid),
                &serde_json::to_string(record).unwrap(),
                ttl_secs,
            )
            .await
            .expect("failed to seed cache");
    }

    /// Read a record back out of the cache store, if present.
    pub async fn cached_record(&self, uuid: &str) -> Option<InviteRecord> {
        self.cache
            .get(&cache_key(uuid))
            .await
            .expect("cache read failed")
            .map(|raw| serde_json::from_str(&raw).expect("undecodable cache entry"))
    }
}

// ---------------------------------------------------------------------------
// Request builder helpers
// ---------------------------------------------------------------------------

/// Build a GET request that passes the boundary filters (browser UA).
pub fn browser_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("User-Agent", BROWSER_UA)
        .body(Body::empty())
        .unwrap()
}

/// Build a GET request with an arbitrary User-Agent.
pub fn request_with_ua(uri: &str, user_agent: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("User-Agent", user_agent)
        .body(Body::empty())
        .unwrap()
}

/// Browser-UA GET request carrying an Origin header.
pub fn browser_request_from(uri: &str, origin: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("User-Agent", BROWSER_UA)
        .header("Origin", origin)
        .body(Body::empty())
        .unwrap()
}

/// Parse a response body into a `serde_json::Value`.
pub async fn parse_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

use std::sync::Arc;

use dashmap::DashMap;
use tokio::net::TcpListener;

use gatehouse::cache::MemoryCache;
use gatehouse::clock::{Clock, SystemClock};
use gatehouse::config::Config;
use gatehouse::discord::DiscordClient;
use gatehouse::issuer::Issuer;
use gatehouse::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env();
    print_banner(&config);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let discord = DiscordClient::new(&config.api_base, &config.bot_token, &config.channel_id);
    let issuer = Issuer::new(Arc::new(MemoryCache::new()), discord, Arc::clone(&clock));

    let port = config.port;
    let state = AppState {
        config: Arc::new(config),
        issuer: Arc::new(issuer),
        clock,
        rate_limits: Arc::new(DashMap::new()),
    };

    let app = gatehouse::routes::router(state);

    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .expect("failed to bind");

    let actual_port = listener
        .local_addr()
        .expect("failed to get local address")
        .port();
    eprintln!("  \x1b[32m→ listening on 0.0.0.0:{actual_port}\x1b[0m");
    eprintln!();

    axum::serve(listener, app).await.expect("server error");
}

fn print_banner(config: &Config) {
    let version = env!("CARGO_PKG_VERSION");
    let origins = match &config.allowed_origins {
        Some(list) => list.join(", "),
        None => "any".to_string(),
    };

    eprintln!();
    eprintln!("  \x1b[1;36mgatehouse\x1b[0m \x1b[2mv{version}\x1b[0m");
    eprintln!();
    eprintln!("  \x1b[2mport\x1b[0m         {}", config.port);
    eprintln!("  \x1b[2mchannel\x1b[0m      {}", config.channel_id);
    eprintln!("  \x1b[2mapi base\x1b[0m     {}", config.api_base);
    eprintln!("  \x1b[2morigins\x1b[0m      {origins}");
    eprintln!();
}

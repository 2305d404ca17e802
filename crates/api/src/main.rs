use std::net::SocketAddr;
use std::sync::Arc;

use atlasboard_api::config::ServerConfig;
use atlasboard_api::router::build_app_router;
use atlasboard_api::session::AccountRegistry;
use atlasboard_api::state::AppState;
use atlasboard_geocode::NominatimGeocoder;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_LOG_FILTER: &str = "atlasboard_api=debug,atlasboard_geocode=debug,tower_http=debug";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ServerConfig::from_env();
    let addr = listen_addr(&config);
    let app = build_app_router(app_state(&config), &config);

    let listener = TcpListener::bind(addr)
        .await
        .unwrap_or_else(|e| panic!("cannot listen on {addr}: {e}"));
    tracing::info!(%addr, "atlasboard listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_stop())
        .await
        .expect("HTTP server failed");

    // Accounts, bookmarks and datasets live only in memory.
    tracing::info!("atlasboard stopped; session data dropped");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn app_state(config: &ServerConfig) -> AppState {
    let geocoder = NominatimGeocoder::new(&config.geocoder.url, &config.geocoder.user_agent);
    tracing::info!(
        geocoder = %config.geocoder.url,
        language = %config.geocoder.language,
        cluster_threshold = config.cluster_threshold,
        "building application state"
    );

    AppState {
        config: Arc::new(config.clone()),
        accounts: Arc::new(AccountRegistry::new()),
        geocoder: Arc::new(geocoder),
    }
}

fn listen_addr(config: &ServerConfig) -> SocketAddr {
    let ip = config
        .host
        .parse()
        .unwrap_or_else(|e| panic!("HOST '{}' is not an IP address: {e}", config.host));
    SocketAddr::new(ip, config.port)
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn wait_for_stop() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal, "shutting down");
}

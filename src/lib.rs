//! # Placebook
//!
//! A PIN-gated HTTP API for personal saved-place bookmarks, fronted by
//! a static single-page client and backed by one of three pluggable
//! stores (flat JSON file, SQLite, Redis).
//!
//! Every `/api` route except `/api/health` sits behind a shared-PIN
//! check. Place search and reverse geocoding proxy to the Google Maps
//! APIs; nothing from those calls is persisted.
//!
//! Run with `APP_PIN`, `GOOGLE_MAPS_API_KEY` and `PORT` set:
//! ```sh
//! APP_PIN=123456 GOOGLE_MAPS_API_KEY=... PORT=3000 cargo run
//! ```

use std::{sync::Arc, time::Duration};

use axum::{
    http::{header::CONTENT_TYPE, HeaderName, Method},
    middleware,
    routing::{delete, get},
    Router,
};
use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod assets;
pub mod auth;
pub mod config;
pub mod error;
pub mod maps;
pub mod place;
pub mod routes;
pub mod state;
pub mod store;

use state::AppState;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = AppState::new().await;

    let address = format!("0.0.0.0:{}", state.config.port);
    let app = router(state);

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Listening on http://{address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

/// The full application router. `/api/health` is registered after the
/// auth layer so it stays open; everything else under `/api` must pass
/// the PIN check first, including unknown paths.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(auth::PIN_HEADER)])
        .max_age(Duration::from_secs(60 * 60));

    // Unknown paths and unsupported methods under /api are both plain
    // 404s, matching the contract's "anything else is not found".
    let api = Router::new()
        .route(
            "/places",
            get(routes::list_places)
                .post(routes::create_place)
                .fallback(routes::api_not_found),
        )
        .route(
            "/places/:id",
            delete(routes::delete_place).fallback(routes::api_not_found),
        )
        .route(
            "/search",
            get(routes::search_places).fallback(routes::api_not_found),
        )
        .route(
            "/location",
            get(routes::locate).fallback(routes::api_not_found),
        )
        .fallback(routes::api_not_found)
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_pin))
        .route("/health", get(routes::health));

    Router::new()
        .nest("/api", api)
        .fallback_service(assets::asset_service(state.clone()))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

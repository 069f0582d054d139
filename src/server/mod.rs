//! HTTP surface: public storefront API, session endpoints and the guarded
//! admin API.

pub mod auth;
pub mod error;
pub mod routes;
pub mod state;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use crate::utils::error::Result;

pub use state::AppState;

pub fn router(state: AppState, cors_origins: &[String]) -> Router {
    let body_limit = state.admin.limits().body_limit();

    let public = Router::new()
        .route("/healthz", get(routes::healthz))
        .route("/api/home", get(routes::home))
        .route("/api/banners", get(routes::banners))
        .route("/api/newarrivals", get(routes::new_arrivals))
        .route("/api/allcategories", get(routes::all_categories))
        .route("/api/products/{collection}/{id}", get(routes::product))
        .route("/api/search", get(routes::search))
        .route("/api/auth/login", post(routes::login))
        .route("/api/auth/refresh", post(routes::refresh));

    let admin = Router::new()
        .route("/api/auth/me", get(routes::me))
        .route(
            "/api/admin/images",
            post(routes::admin_upload).layer(DefaultBodyLimit::max(body_limit)),
        )
        .route(
            "/api/admin/{collection}",
            get(routes::admin_list).post(routes::admin_create),
        )
        .route(
            "/api/admin/{collection}/{id}",
            get(routes::admin_draft)
                .put(routes::admin_update)
                .delete(routes::admin_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), auth::require_admin));

    public
        .merge(admin)
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("⚠️ Ignoring invalid CORS origin {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60))
}

pub async fn start_server(config: &AppConfig, state: AppState) -> Result<()> {
    let app = router(state, config.cors_origins());
    let address = config.bind_address();

    let listener = TcpListener::bind(&address).await?;
    tracing::info!("🚀 Server running on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("👋 Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => tracing::info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                tracing::error!("Failed to install Ctrl+C handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

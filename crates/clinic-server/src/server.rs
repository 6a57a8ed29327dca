use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use clinic_api::ApiError;
use clinic_core::now_timestamp;
use clinic_db_postgres::mask_password;
use clinic_storage::DynStore;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer, compression::CompressionLayer, cors::CorsLayer,
    trace::TraceLayer,
};

use crate::config::{AppConfig, StorageBackend};
use crate::middleware::{self as app_middleware, RateLimiter};
use crate::state::AppState;
use crate::{auth, dashboard, resources, seed};

pub struct ClinicServer {
    addr: SocketAddr,
    app: Router,
}

/// Routes and middleware over an already constructed store.
pub fn build_router(state: AppState) -> Router {
    let cfg = state.config.clone();

    let mut api = resources::router()
        .merge(auth::routes())
        .merge(dashboard::routes())
        .method_not_allowed_fallback(method_not_allowed);
    if cfg.rate_limit.enabled {
        let limiter = Arc::new(RateLimiter::from_config(&cfg.rate_limit));
        api = api.layer(middleware::from_fn_with_state(
            limiter,
            app_middleware::rate_limit,
        ));
    }

    Router::new()
        .route("/health", get(health))
        .nest("/api", api)
        .method_not_allowed_fallback(method_not_allowed)
        .fallback(route_not_found)
        .with_state(state)
        // Middleware stack (order: request id -> panic catcher -> compression -> trace -> cors -> body limit)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(app_middleware::request_id))
                .layer(CatchPanicLayer::custom(panic_response))
                .layer(CompressionLayer::new())
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|req: &axum::http::Request<axum::body::Body>| {
                            use tracing::field::Empty;
                            let req_id = req
                                .extensions()
                                .get::<axum::http::HeaderValue>()
                                .and_then(|v| v.to_str().ok())
                                .unwrap_or("")
                                .to_string();
                            tracing::info_span!(
                                "http.request",
                                http.method = %req.method(),
                                http.target = %req.uri(),
                                http.status_code = Empty,
                                request_id = %req_id
                            )
                        })
                        .on_response(
                            |res: &Response,
                             latency: std::time::Duration,
                             span: &tracing::Span| {
                                span.record(
                                    "http.status_code",
                                    tracing::field::display(res.status().as_u16()),
                                );
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            },
                        ),
                )
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(cfg.server.body_limit_bytes)),
        )
}

/// Builds the store selected by `storage.backend`.
pub async fn create_store(cfg: &AppConfig) -> anyhow::Result<DynStore> {
    match cfg.storage.backend {
        StorageBackend::Memory => Ok(clinic_db_memory::create_store()),
        StorageBackend::Postgres => {
            let pg = cfg.storage.postgres.to_postgres_config();
            tracing::info!(url = %mask_password(&pg.url), "connecting to PostgreSQL");
            Ok(clinic_db_postgres::create_store(pg).await?)
        }
    }
}

/// Full application: store, optional demo data, routes.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let store = create_store(cfg).await?;
    tracing::info!(backend = store.backend_name(), "record store ready");

    if cfg.storage.seed_demo_data {
        seed::seed_demo_data(store.as_ref()).await?;
    }

    Ok(build_router(AppState::new(store, cfg.clone())))
}

async fn health() -> Result<Json<Value>, ApiError> {
    let timestamp = now_timestamp().map_err(|e| ApiError::internal(e.to_string()))?;
    Ok(Json(json!({ "status": "OK", "timestamp": timestamp })))
}

async fn route_not_found() -> ApiError {
    ApiError::not_found("Route not found")
}

async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed("Method not allowed")
}

fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "handler panicked");
    ApiError::internal("Internal server error").into_response()
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub async fn build(self) -> anyhow::Result<ClinicServer> {
        let app = build_app(&self.config).await?;
        Ok(ClinicServer {
            addr: self.addr,
            app,
        })
    }
}

impl ClinicServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(
            listener,
            self.app
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

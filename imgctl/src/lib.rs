//! # imgctl: Image Delivery Gateway
//!
//! `imgctl` is an edge gateway mediating access to an S3-compatible object
//! store holding images. It exposes exactly two operations: issuing
//! short-lived, scoped write permissions for uploads, and serving reads with
//! on-the-fly resizing and HTTP caching.
//!
//! ## Request Flow
//!
//! **Uploads**: a client posts an upload intent to `/signed-url` with a
//! logical path and a file extension. The request is validated against the
//! upload policy (path characters, traversal, extension allow-list), a
//! collision-resistant object key is generated, and a presigned PUT URL with
//! a fixed expiry is returned. The client uploads directly against that URL;
//! the gateway never handles the image bytes.
//!
//! **Delivery**: a client fetches `/images/{key}` with optional `width` and
//! `height` query parameters. The key and dimensions are validated, a
//! rendition is fetched from the transform backend (or the raw object from
//! the store when no backend is configured), and the response carries a
//! deterministic ETag plus a long-lived immutable Cache-Control directive.
//!
//! ## Architecture
//!
//! Built on [Axum](https://github.com/tokio-rs/axum). Each request is
//! handled independently and statelessly; the only process-wide resources
//! are the configuration and the backend clients, all constructed once in
//! [`Application::new`] and shared read-only through [`AppState`]. The
//! suspension points of a request are exactly its backend calls, so a client
//! disconnect drops the handler future and cancels any in-flight fetch.
//!
//! Every failure is rendered by [`errors::ErrorResponder`] as an RFC 7807
//! problem-detail body, uniformly across validation errors, missing objects
//! and backend failures.

pub mod api;
pub mod caching;
pub mod config;
pub mod errors;
pub mod keys;
pub mod openapi;
pub mod storage;
pub mod telemetry;
pub mod transform;
pub mod validation;

#[cfg(test)]
mod test;

use crate::errors::ErrorResponder;
use crate::openapi::ApiDoc;
use crate::storage::ObjectStore;
use crate::transform::TransformClient;
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Everything here is immutable after startup and cheap to clone: the
/// backend clients sit behind `Arc`s, closing the lazily-initialized-global
/// race by construction.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<ObjectStore>,
    pub transform: Option<Arc<TransformClient>>,
    pub problems: ErrorResponder,
}

/// Create the CORS layer: a single allowed origin, GET and POST only,
/// all headers permitted.
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    // Url renders with a trailing slash; browser Origin headers have none
    let origin = config
        .cors
        .allowed_origin
        .as_str()
        .trim_end_matches('/')
        .parse::<HeaderValue>()?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any))
}

/// Build the gateway router: the two operations, OpenAPI docs, CORS and
/// request tracing.
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/signed-url", post(api::handlers::signed_url::issue_signed_url))
        .route("/images/{*key}", get(api::handlers::delivery::deliver_image))
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Main application struct that owns all resources and lifecycle.
///
/// 1. **Create**: [`Application::new`] validates nothing further (the config
///    is already validated) and constructs the backend clients exactly once.
/// 2. **Serve**: [`Application::serve`] binds a TCP port and handles
///    requests until the shutdown future resolves.
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create a new application instance with all shared resources initialized
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(ObjectStore::new(&config.storage));

        let transform = config
            .delivery
            .transform_url
            .clone()
            .map(|url| Arc::new(TransformClient::new(url)));

        if transform.is_some() {
            info!("Transform backend configured; delivering resized renditions");
        } else {
            info!("No transform backend configured; delivering raw objects");
        }

        let state = AppState::builder()
            .config(config.clone())
            .store(store)
            .maybe_transform(transform)
            .problems(ErrorResponder::new(&config.cdn_url))
            .build();

        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("Gateway listening on http://{}", bind_addr);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        Ok(())
    }
}

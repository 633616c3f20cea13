//! HTTP server setup.
//!
//! # Responsibilities
//! - Build the stage chain and its terminal synthesizer from config
//! - Create the Axum router: every method, every path, one handler
//! - Wire up transport tracing
//! - Serve on a caller-bound listener until shutdown

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::Response,
    routing::any,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::config::StubConfig;
use crate::content::ContentResolver;
use crate::http::context::RequestContext;
use crate::http::middleware::{default_stages, BoxHandler};
use crate::http::request::{IdGenerator, UuidGenerator};
use crate::http::response::ResponseSynthesizer;

/// Application state injected into the handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: BoxHandler,
}

/// The stub HTTP server.
pub struct StubServer {
    router: Router,
    config: StubConfig,
}

impl StubServer {
    /// Create a server that generates UUID request ids.
    pub fn new(config: StubConfig) -> Self {
        Self::with_id_generator(config, Arc::new(UuidGenerator))
    }

    pub fn with_id_generator(config: StubConfig, generator: Arc<dyn IdGenerator>) -> Self {
        let state = AppState {
            pipeline: Self::build_pipeline(&config, generator),
        };
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Compose the stage chain around the response synthesizer.
    pub fn build_pipeline(config: &StubConfig, generator: Arc<dyn IdGenerator>) -> BoxHandler {
        let synthesizer = ResponseSynthesizer::new(
            ContentResolver::new(&config.content.root),
            config.content.max_body_bytes,
        );
        default_stages(generator).then(synthesizer)
    }

    fn build_router(state: AppState) -> Router {
        Router::new()
            .route("/{*path}", any(stub_handler))
            .route("/", any(stub_handler))
            .with_state(state)
            .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
    }

    /// Router without a listener, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` fires, then let in-flight requests finish.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            content_root = %self.config.content.root.display(),
            "HTTP server starting"
        );

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Runs every request through the stage chain with a fresh context.
async fn stub_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let mut ctx = RequestContext::new();
    state.pipeline.handle(request, &mut ctx).await
}

use axum::routing::{get, post};
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::{Any, CorsLayer};

use crate::config::HostConfig;
use crate::error::{CoreError, CoreResult};
use crate::host::AppHost;

pub mod apps;
pub mod error;
pub mod manifests;
pub mod openapi;

pub struct Server {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    host: Arc<AppHost>,
}

impl Server {
    pub async fn new(config: &HostConfig) -> CoreResult<Self> {
        let host = Arc::new(AppHost::from_config(config)?);
        Self::start(host, &config.server.bind_address).await
    }

    /// Serves `host` on `bind_address`; port `0` picks a free port.
    pub async fn start(host: Arc<AppHost>, bind_address: &str) -> CoreResult<Self> {
        let state = Arc::new(ServerState { host: host.clone() });
        let app = router(state);
        let listener = TcpListener::bind(bind_address)
            .await
            .map_err(|error| CoreError::Internal(format!("bind {bind_address}: {error}")))?;
        let addr = listener
            .local_addr()
            .map_err(|error| CoreError::Internal(error.to_string()))?;
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.await;
                })
                .await;
        });
        tracing::info!(%addr, "apphost server listening");

        Ok(Server {
            addr,
            shutdown: Some(shutdown_tx),
            host,
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn host(&self) -> &AppHost {
        &self.host
    }

    pub fn shutdown(&mut self) -> CoreResult<()> {
        if let Some(sender) = self.shutdown.take() {
            sender
                .send(())
                .map_err(|_| CoreError::Internal("failed to send server shutdown signal".into()))
        } else {
            Ok(())
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}

fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let app = Router::new()
        .route("/health", get(health))
        .route("/manifest/validate", post(manifests::validate_manifest))
        .route("/manifest/fetch", post(manifests::fetch_manifest))
        .route("/manifest/schema", get(manifests::manifest_schema))
        .route("/apps", get(apps::list_apps))
        .route("/apps/install", post(apps::install_app))
        .with_state(state);

    #[cfg(feature = "swagger-ui")]
    let app = {
        use utoipa::OpenApi;
        app.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
        )
    };

    app.layer(cors)
}

async fn health() -> &'static str {
    "ok"
}

pub(crate) struct ServerState {
    pub(crate) host: Arc<AppHost>,
}

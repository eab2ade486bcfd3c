//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the download handler
//! - Wire up middleware (tracing, timeout, request ID)
//! - Bind server to listener
//! - Validate each request and hand the outcome to the handler table
//! - Apply configuration updates while serving
//! - Start the admin API when enabled

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, Uri},
    response::Response,
    routing::get,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AdminState};
use crate::config::{AppConfig, DownloadConfig, SettingsHandle};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};
use crate::http::response::OutcomeHandlers;
use crate::token::unix_now;
use crate::validator::{validate_with, ValidationOutcome, Validator};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub validator: Validator,
    pub handlers: Arc<OutcomeHandlers>,
}

/// HTTP server for signed downloads.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    settings: SettingsHandle,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and the default
    /// outcome handlers.
    pub fn new(config: AppConfig) -> Self {
        Self::with_handlers(config, OutcomeHandlers::default())
    }

    /// Create a new HTTP server with custom outcome handlers.
    pub fn with_handlers(config: AppConfig, handlers: OutcomeHandlers) -> Self {
        let settings = SettingsHandle::new(config.download.clone());

        let state = AppState {
            validator: Validator::new(settings.clone()),
            handlers: Arc::new(handlers),
        };

        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            settings,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        Router::new()
            .route("/{*path}", get(download_handler))
            .route("/", get(download_handler))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    request_id = %request_id(request.headers()),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// The live download settings shared with the request handlers.
    pub fn settings(&self) -> SettingsHandle {
        self.settings.clone()
    }

    /// Get a reference to the config the server was started with.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires.
    ///
    /// New `[download]` sections arriving on `config_updates` replace the live
    /// settings; invalid ones are logged and dropped.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<DownloadConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let settings = self.settings.clone();
        tokio::spawn(async move {
            while let Some(update) = config_updates.recv().await {
                if let Err(errors) = settings.replace(update) {
                    for error in errors {
                        tracing::error!(error = %error, "Rejected configuration update");
                    }
                }
            }
        });

        if self.config.admin.enabled {
            let admin_listener = TcpListener::bind(&self.config.admin.bind_address).await?;
            let admin_addr = admin_listener.local_addr()?;
            let admin = setup_admin_router(AdminState::new(
                self.settings.clone(),
                &self.config.admin.api_key,
            ));
            let mut admin_shutdown = shutdown.resubscribe();
            tracing::info!(address = %admin_addr, "Admin API starting");
            tokio::spawn(async move {
                let served = axum::serve(admin_listener, admin)
                    .with_graceful_shutdown(async move {
                        let _ = admin_shutdown.recv().await;
                    })
                    .await;
                if let Err(e) = served {
                    tracing::error!(error = %e, "Admin API failed");
                }
            });
        }

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Validate the request target and respond through the handler table.
async fn download_handler(State(state): State<AppState>, uri: Uri, headers: HeaderMap) -> Response {
    let target = uri.path_and_query().map(|pq| pq.as_str()).unwrap_or("/");
    let request_id = request_id(&headers);

    let config = state.validator.settings().load();
    let outcome = validate_with(&config, target, unix_now()).await;
    match (&outcome, outcome.reject_kind(), outcome.reason()) {
        (ValidationOutcome::Serve(serve), _, _) => {
            tracing::info!(
                request_id = %request_id,
                file = %serve.file_path,
                "Serving download"
            );
        }
        (_, Some(kind), Some(reason)) => {
            tracing::warn!(
                request_id = %request_id,
                kind = %kind,
                stage = %reason.stage,
                detail = %reason.detail,
                "Download rejected"
            );
        }
        _ => {}
    }

    state.handlers.respond(outcome, config).await
}

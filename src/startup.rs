//! Application Startup
//!
//! Application building and server initialization.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::presentation::http::handlers::health;
use crate::presentation::http::routes;
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::Gateway;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
    gateway: Arc<Gateway>,
}

impl Application {
    /// Build the application from settings.
    ///
    /// Failing to bind the port is the only startup-fatal condition; the
    /// error propagates out and the server never reports itself healthy.
    pub async fn build(settings: Settings) -> Result<Self> {
        health::init_server_start();

        // Create WebSocket gateway
        let gateway = Arc::new(Gateway::new());

        // Create app state
        let state = AppState {
            gateway: Arc::clone(&gateway),
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state)
            .layer(logging::create_trace_layer())
            .layer(cors::create_cors_layer(&settings.cors));

        // Bind to address
        let listener = TcpListener::bind(settings.server_addr()).await?;
        tracing::info!("Listening on {}", listener.local_addr()?);
        tracing::info!(
            "WebSocket endpoint: ws://{}{}",
            settings.server_addr(),
            settings.websocket.path
        );

        Ok(Self {
            listener,
            router,
            gateway,
        })
    }

    /// Run the server until stopped.
    ///
    /// On a shutdown signal the listener stops accepting first (the serve
    /// future is dropped), then every live connection is closed through the
    /// gateway, and only then does this return and let the runtime wind
    /// down. No connection is left half-registered.
    pub async fn run_until_stopped(self) -> Result<()> {
        let Self {
            listener,
            router,
            gateway,
        } = self;

        let server = axum::serve(listener, router).into_future();

        tokio::select! {
            result = server => {
                result?;
            }
            _ = shutdown_signal() => {
                tracing::info!("Shutdown signal received, closing connections");
                gateway.close_all();
            }
        }

        tracing::info!("Server stopped");
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

/// Resolves when the process receives SIGINT (ctrl-c) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install ctrl-c handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

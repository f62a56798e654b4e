//! HTTP layer for the auth-service and the user-service.
//!
//! Each service is an axum `Router` built from its state. [`start`] binds it to
//! an address and serves it on a background task until the returned handle is
//! stopped or dropped.

pub mod auth_api;
pub mod content_api;
pub mod error;
pub mod extract;

use std::net::SocketAddr;

use axum::http::{header, HeaderValue, Method};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tower_http::cors::CorsLayer;

pub use auth_api::{AuthLinks, AuthState};
pub use content_api::ContentState;
pub use error::{ApiError, MessageBody};
pub use extract::AuthUser;

/// Handle to a running service
pub struct ServiceHandle {
    pub name: &'static str,
    pub addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: Option<tokio::task::JoinHandle<()>>,
}

impl ServiceHandle {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Ask the server to finish in-flight requests and stop
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Wait until the server task has exited
    pub async fn stopped(mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                log::error!("{} server task failed: {}", self.name, e);
            }
        }
    }
}

impl Drop for ServiceHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Allow the browser frontend to call the service with credentials
pub fn cors(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(e) => {
            log::warn!("Ignoring invalid frontend origin {:?}: {}", frontend_url, e);
            layer
        }
    }
}

/// Bind `addr` and serve `app` on a background task. Port 0 picks a free port.
pub async fn start(name: &'static str, addr: SocketAddr, app: Router) -> std::io::Result<ServiceHandle> {
    let listener = TcpListener::bind(addr).await?;
    let addr = listener.local_addr()?;
    log::info!("{} listening on http://{}", name, addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.await;
                log::info!("{} shutting down", name);
            })
            .await;
        if let Err(e) = result {
            log::error!("{} server error: {}", name, e);
        }
    });

    Ok(ServiceHandle {
        name,
        addr,
        shutdown_tx: Some(shutdown_tx),
        task: Some(task),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_and_stop() {
        let app = Router::new().route("/ping", axum::routing::get(|| async { "pong" }));
        let mut handle = start("test", SocketAddr::from(([127, 0, 0, 1], 0)), app)
            .await
            .unwrap();
        assert_ne!(handle.addr.port(), 0);

        let body = reqwest::get(format!("{}/ping", handle.base_url()))
            .await
            .unwrap()
            .text()
            .await
            .unwrap();
        assert_eq!(body, "pong");

        handle.stop();
        handle.stopped().await;
    }
}

use std::net::SocketAddr;

use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;

use crate::error::{Error, Result};
use crate::schedule::Shutdown;
use crate::snapshot::SnapshotReader;

mod exposition;

async fn liveness() -> StatusCode {
    StatusCode::OK
}

async fn metrics(snapshots: State<SnapshotReader>) -> Response {
    let body = snapshots
        .current()
        .map(|snapshot| exposition::render(&snapshot))
        .unwrap_or_default();

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, exposition::CONTENT_TYPE)],
        body,
    )
        .into_response()
}

async fn snapshot(snapshots: State<SnapshotReader>) -> Response {
    match snapshots.current() {
        Some(snapshot) => (StatusCode::OK, Json(snapshot)).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "no snapshot collected yet",
        )
            .into_response(),
    }
}

/// Builds the routes of the metrics endpoint.
pub fn router(snapshots: SnapshotReader) -> axum::Router {
    axum::Router::new()
        .route("/", get(liveness))
        .route("/metrics", get(metrics))
        .route("/snapshot", get(snapshot))
        .with_state(snapshots)
}

/// HTTP server exposing the latest snapshot.
pub struct APIServer {
    router: axum::Router,
    listener: tokio::net::TcpListener,
}

impl APIServer {
    /// Binds the listening socket.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Bind`] if the address cannot be bound.
    pub async fn bind(addr: &str, snapshots: SnapshotReader) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind {
                addr: addr.to_owned(),
                source,
            })?;
        Ok(Self {
            router: router(snapshots),
            listener,
        })
    }

    /// Address the listener is bound to, with the port resolved.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves requests until `shutdown` fires.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Serve`] if the server fails.
    pub async fn serve(self, shutdown: Shutdown) -> Result<()> {
        axum::serve(self.listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown.wait())
            .await
            .map_err(Error::Serve)
    }
}

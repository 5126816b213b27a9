//! Axum-based RPC server.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use dpos_store::AccountStore;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::RpcError;
use crate::handlers::MessageResponse;
use crate::service::{VoterQueryService, VotersOutcome};
use crate::validation::VotersParams;

/// Build the router serving `GET /api/voters` and `GET /metrics`.
pub fn router<S>(service: Arc<VoterQueryService<S>>) -> Router
where
    S: AccountStore + Send + Sync + 'static,
{
    Router::new()
        .route("/api/voters", get(voters::<S>))
        .route("/metrics", get(metrics::<S>))
        .with_state(service)
}

async fn voters<S>(
    State(service): State<Arc<VoterQueryService<S>>>,
    params: Result<Query<VotersParams>, QueryRejection>,
) -> Result<Response, RpcError>
where
    S: AccountStore + Send + Sync + 'static,
{
    let Query(params) = params.map_err(|e| RpcError::InvalidRequest(e.body_text()))?;

    // Store reads block, so keep them off the async workers.
    let outcome = tokio::task::spawn_blocking(move || service.query(&params))
        .await
        .map_err(|e| RpcError::Server(e.to_string()))??;

    Ok(match outcome {
        VotersOutcome::Found(body) => (StatusCode::OK, Json(body)).into_response(),
        VotersOutcome::NotFound => {
            (StatusCode::OK, Json(MessageResponse::no_data())).into_response()
        }
    })
}

async fn metrics<S>(State(service): State<Arc<VoterQueryService<S>>>) -> Result<Response, RpcError>
where
    S: AccountStore + Send + Sync + 'static,
{
    let text = service
        .metrics()
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok((
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        text,
    )
        .into_response())
}

/// HTTP front end of the voters query service.
pub struct RpcServer<S> {
    addr: SocketAddr,
    service: Arc<VoterQueryService<S>>,
}

impl<S> RpcServer<S>
where
    S: AccountStore + Send + Sync + 'static,
{
    pub fn new(addr: SocketAddr, service: Arc<VoterQueryService<S>>) -> Self {
        Self { addr, service }
    }

    /// Bind the listener. Split from [`serve`](BoundRpcServer::serve) so
    /// callers learn the actual port when binding to port 0.
    pub async fn bind(self) -> Result<BoundRpcServer<S>, RpcError> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| RpcError::Server(format!("bind {}: {e}", self.addr)))?;
        Ok(BoundRpcServer {
            listener,
            service: self.service,
        })
    }

    /// Bind and serve until `shutdown` resolves.
    pub async fn start(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<(), RpcError> {
        self.bind().await?.serve(shutdown).await
    }
}

pub struct BoundRpcServer<S> {
    listener: TcpListener,
    service: Arc<VoterQueryService<S>>,
}

impl<S> BoundRpcServer<S>
where
    S: AccountStore + Send + Sync + 'static,
{
    pub fn local_addr(&self) -> Result<SocketAddr, RpcError> {
        self.listener
            .local_addr()
            .map_err(|e| RpcError::Server(e.to_string()))
    }

    pub async fn serve(self, shutdown: impl Future<Output = ()> + Send + 'static) -> Result<(), RpcError> {
        let addr = self.local_addr()?;
        info!(%addr, "RPC server listening");
        axum::serve(self.listener, router(self.service))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| RpcError::Server(e.to_string()))?;
        info!("RPC server stopped");
        Ok(())
    }
}

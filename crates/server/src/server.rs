use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use std::sync::Arc;

use crate::{balances, events, wagers};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub token: Option<Arc<str>>,
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

/// Static bearer token check. With no token configured the API is open;
/// the gateway is the only intended caller either way.
async fn auth(
    State(state): State<ServerState>,
    request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(expected) = state.token.as_deref() else {
        return Ok(next.run(request).await);
    };

    let provided = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if provided == Some(expected) {
        Ok(next.run(request).await)
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

fn router(state: ServerState) -> Router {
    Router::new()
        .route("/events/marker", post(events::marker_added))
        .route("/events/member-removed", post(events::member_removed))
        .route("/wagers", post(wagers::create))
        .route("/wagers/cancel", post(wagers::cancel))
        .route("/wagers/list", post(wagers::send_list))
        .route("/balance", post(balances::balance))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .route("/healthz", get(healthz))
        .with_state(state)
}

pub async fn run(engine: Engine, token: Option<String>) {
    let listener = match tokio::net::TcpListener::bind("127.0.0.1:3000").await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind server listener: {err}");
            return;
        }
    };
    if let Err(err) = run_with_listener(engine, token, listener).await {
        tracing::error!("server failed: {err}");
    }
}

pub async fn run_with_listener(
    engine: Engine,
    token: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        token: token.map(Arc::from),
    };

    axum::serve(listener, router(state)).await
}

pub fn spawn_with_listener(
    engine: Engine,
    token: Option<String>,
    listener: tokio::net::TcpListener,
) -> Result<std::net::SocketAddr, std::io::Error> {
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(err) = run_with_listener(engine, token, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    Ok(addr)
}

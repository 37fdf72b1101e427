use crate::handlers::{activities, user_activities, users};
use crate::state::AppState;
use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::get;
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
struct Health {
    status: &'static str,
    version: &'static str,
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(users::routes())
        .merge(activities::routes())
        .merge(user_activities::routes())
        .route("/health", get(health))
        .with_state(state)
        .layer(middleware::from_fn(log_request))
}

pub async fn serve(app: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!(
        "event=server_listen module=server status=ok addr={}",
        listener.local_addr()?
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("event=server_stop module=server status=ok");
    Ok(())
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        version: activity_core::core_version(),
    })
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started_at.elapsed().as_millis();
    if status.is_server_error() {
        error!(
            "event=http_request module=server status={} method={method} path={path} latency_ms={latency_ms}",
            status.as_u16()
        );
    } else {
        info!(
            "event=http_request module=server status={} method={method} path={path} latency_ms={latency_ms}",
            status.as_u16()
        );
    }
    response
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!("event=server_signal module=server status=error error={err}");
    }
}

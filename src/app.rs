use std::time::Duration;

use crate::config::AppConfig;
use crate::state::AppState;
use crate::users;
use axum::{
    body::Body,
    http::{Request, Response},
    routing::get,
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{field, Span};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .merge(users::router())
        .route("/health", get(|| async { "Service is healthy:)" }))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(record_response),
        )
}

fn request_span(req: &Request<Body>) -> Span {
    tracing::info_span!(
        "http_request",
        method = %req.method(),
        path = %req.uri().path(),
        status = field::Empty,
        latency_ms = field::Empty,
    )
}

// 4xx are caller mistakes (bad id, duplicate nickname) and log at warn.
fn record_response(res: &Response<Body>, latency: Duration, span: &Span) {
    let status = res.status();
    span.record("status", field::display(status));
    span.record("latency_ms", latency.as_millis() as u64);

    if status.is_server_error() {
        tracing::error!(%status, "response");
    } else if status.is_client_error() {
        tracing::warn!(%status, "response");
    } else {
        tracing::debug!(%status, "response");
    }
}

pub async fn serve(app: Router, config: &AppConfig) -> anyhow::Result<()> {
    let addr = config.addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "users service listening");
    axum::serve(listener, app).await?;
    Ok(())
}

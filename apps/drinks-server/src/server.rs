use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use drinks::DrinksModule;
use drinks_auth::AuthorizationGate;
use tower_http::trace::TraceLayer;
use tracing::field::Empty;

use crate::config::{AppConfig, ServerConfig};
use crate::cors::build_cors_layer;

/// Assemble the gate, the drinks module and the HTTP middleware.
///
/// # Errors
/// Fails on invalid auth or CORS settings, or if the module cannot start.
pub async fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let gate = AuthorizationGate::from_config(&cfg.auth).context("auth configuration")?;
    let module = DrinksModule::init(cfg.drinks.clone())
        .await
        .context("drinks module")?;
    apply_middleware(module.router(Arc::new(gate)), &cfg.server)
}

fn apply_middleware(router: Router, cfg: &ServerConfig) -> anyhow::Result<Router> {
    let mut router = router;

    // CORS is outer to the handlers so OPTIONS preflight short-circuits.
    if cfg.cors.enabled {
        router = router.layer(build_cors_layer(&cfg.cors)?);
    }

    router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    uri = %req.uri().path(),
                    status = Empty,
                    latency_ms = Empty,
                )
            })
            .on_response(
                |res: &Response<Body>, latency: Duration, span: &tracing::Span| {
                    span.record("status", res.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                },
            ),
    );
    Ok(router)
}

fn parse_bind_address(bind_addr: &str) -> anyhow::Result<SocketAddr> {
    bind_addr
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address '{bind_addr}': {e}"))
}

/// Bind and serve until Ctrl-C.
///
/// # Errors
/// Fails if the app cannot be built, the address cannot be bound, or the
/// server errors.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = parse_bind_address(&cfg.server.bind_addr)?;
    let app = build_app(&cfg).await?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP server bound on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!(e))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("HTTP server shutting down gracefully");
}

use std::time::Duration;

use anyhow::Context;
use axum::http::{HeaderName, HeaderValue, Method};
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};

use crate::config::CorsConfig;

/// Build the CORS layer from configuration.
///
/// # Errors
/// Fails on unparsable origins, methods or headers, and on credentials
/// combined with a wildcard origin.
pub fn build_cors_layer(cfg: &CorsConfig) -> anyhow::Result<CorsLayer> {
    let any_origin = cfg.allowed_origins.iter().any(|o| o == "*");
    anyhow::ensure!(
        !(any_origin && cfg.allow_credentials),
        "cors: allow_credentials cannot be combined with a wildcard origin"
    );

    let origins = if any_origin {
        AllowOrigin::any()
    } else {
        let list = cfg
            .allowed_origins
            .iter()
            .map(|o| HeaderValue::from_str(o).with_context(|| format!("cors: bad origin '{o}'")))
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowOrigin::list(list)
    };

    let methods = cfg
        .allowed_methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .with_context(|| format!("cors: bad method '{m}'"))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let any_header = cfg.allowed_headers.iter().any(|h| h == "*");
    anyhow::ensure!(
        !(any_header && cfg.allow_credentials),
        "cors: allow_credentials cannot be combined with wildcard headers"
    );
    let headers = if any_header {
        AllowHeaders::from(Any)
    } else {
        let list = cfg
            .allowed_headers
            .iter()
            .map(|h| {
                HeaderName::from_bytes(h.as_bytes())
                    .with_context(|| format!("cors: bad header '{h}'"))
            })
            .collect::<anyhow::Result<Vec<_>>>()?;
        AllowHeaders::list(list)
    };

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .allow_credentials(cfg.allow_credentials)
        .max_age(Duration::from_secs(cfg.max_age_seconds)))
}

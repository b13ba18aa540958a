//! HTTP render endpoint.
//!
//! `POST /generate-pdf` takes `{ html, css?, layout?, fileName? }` and answers
//! with `application/pdf`, or a textual failure with a non-2xx status.
//! Callers address this operation directly; there is no page-level callback.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::{
    extract::{DefaultBodyLimit, Json, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::error::RenderError;
use crate::layout_config::LayoutSettings;
use crate::pipeline::{generate_pdf, RenderRequest};
use crate::render::{Renderer, RendererConfig};

/// Largest accepted request body (markup with inlined images can be big).
pub const BODY_LIMIT_BYTES: usize = 10 * 1024 * 1024;

/// File name used when the caller does not supply one.
pub const DEFAULT_FILE_NAME: &str = "GeneratedPDF";

/// Server configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    pub renderer: RendererConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 3003)),
            renderer: RendererConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Read overrides from the environment:
    ///
    /// | Variable                  | Meaning                          |
    /// |---------------------------|----------------------------------|
    /// | `FORGE_BIND`              | full socket address              |
    /// | `PORT`                    | port on 0.0.0.0 (if no `FORGE_BIND`) |
    /// | `CHROME_PATH`             | browser binary                   |
    /// | `FORGE_LOAD_TIMEOUT_SECS` | content-load timeout             |
    /// | `FORGE_NO_SANDBOX`        | `1`/`true` disables the sandbox  |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ServerConfig::from_env`] over an arbitrary lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(bind) = lookup("FORGE_BIND") {
            match bind.parse() {
                Ok(addr) => config.bind = addr,
                Err(e) => log::warn!("Ignoring FORGE_BIND={bind}: {e}"),
            }
        } else if let Some(port) = lookup("PORT") {
            match port.parse::<u16>() {
                Ok(port) => config.bind.set_port(port),
                Err(e) => log::warn!("Ignoring PORT={port}: {e}"),
            }
        }

        if let Some(path) = lookup("CHROME_PATH") {
            if !path.is_empty() {
                config.renderer.chrome_path = Some(PathBuf::from(path));
            }
        }

        if let Some(secs) = lookup("FORGE_LOAD_TIMEOUT_SECS") {
            match secs.parse::<u64>() {
                Ok(secs) if secs > 0 => config.renderer.load_timeout = Duration::from_secs(secs),
                _ => log::warn!("Ignoring FORGE_LOAD_TIMEOUT_SECS={secs}"),
            }
        }

        if let Some(flag) = lookup("FORGE_NO_SANDBOX") {
            config.renderer.sandbox = !matches!(flag.to_ascii_lowercase().as_str(), "1" | "true" | "yes");
        }

        config
    }
}

/// Body of `POST /generate-pdf`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePdfRequest {
    pub html: String,
    #[serde(default)]
    pub css: Option<String>,
    #[serde(default)]
    pub layout: Option<LayoutSettings>,
    #[serde(default)]
    pub file_name: Option<String>,
}

impl GeneratePdfRequest {
    fn render_request(&self) -> RenderRequest {
        RenderRequest {
            html: self.html.clone(),
            css: self.css.clone(),
            layout: self.layout.clone().unwrap_or_default(),
        }
    }

    /// `Content-Disposition` file name, restricted to a safe character set.
    fn attachment_name(&self) -> String {
        let stem: String = self
            .file_name
            .as_deref()
            .unwrap_or(DEFAULT_FILE_NAME)
            .trim()
            .trim_end_matches(".pdf")
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ' ') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        if stem.trim().is_empty() {
            format!("{DEFAULT_FILE_NAME}.pdf")
        } else {
            format!("{stem}.pdf")
        }
    }
}

/// A failed render, reported as text.
#[derive(Debug)]
pub struct AppError(pub RenderError);

impl From<RenderError> for AppError {
    fn from(err: RenderError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.0.is_timeout() {
            StatusCode::GATEWAY_TIMEOUT
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        log::warn!("PDF generation failed: {}", self.0);
        (status, format!("PDF generation failed: {}", self.0)).into_response()
    }
}

#[derive(Clone)]
struct AppState {
    renderer: Renderer,
}

/// Build the application router.
pub fn app(renderer: Renderer) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/generate-pdf", post(generate_pdf_handler))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(CorsLayer::permissive())
        .with_state(AppState { renderer })
}

async fn index() -> &'static str {
    "PDF server is up and running"
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "template-forge",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn generate_pdf_handler(
    State(state): State<AppState>,
    Json(payload): Json<GeneratePdfRequest>,
) -> Result<Response, AppError> {
    let request = payload.render_request();
    let pdf = generate_pdf(&state.renderer, &request).await?;

    let disposition = format!("attachment; filename=\"{}\"", payload.attachment_name());
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        pdf.into_bytes(),
    )
        .into_response())
}

/// Bind and serve until Ctrl-C.
pub async fn serve(config: ServerConfig) -> std::io::Result<()> {
    let renderer = Renderer::chrome(config.renderer.clone());
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    log::info!("PDF server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app(renderer))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
    log::info!("Shutting down");
}

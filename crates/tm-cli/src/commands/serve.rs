//! HTTP migration trigger using axum
//!
//! `POST /migrate` applies pending migrations unless another request
//! already attempted a run inside the gate window; `GET /health` is a
//! liveness probe that never touches the database.

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tm_migrate::{trigger, AppliedScript, Migrator, RunOnceGate, TriggerOutcome};

use crate::cli::{GlobalArgs, ServeArgs};
use crate::commands::common::{build_migrator, build_options, load_project};

/// State shared across all handlers
pub(crate) struct AppState {
    pub(crate) migrator: Migrator,
    pub(crate) gate: RunOnceGate,
}

/// Body of a successful or skipped trigger
#[derive(Debug, Serialize)]
struct TriggerResponse {
    status: &'static str,
    applied: Vec<AppliedScript>,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_applied: Option<i64>,
}

/// Body of a failed run
#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: &'static str,
    error: String,
}

/// Execute the serve command
pub async fn execute(args: &ServeArgs, global: &GlobalArgs) -> Result<()> {
    let project = load_project(global)?;
    let migrator = build_migrator(&project, build_options(&project)?)?;

    let window = args
        .window_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| project.config.gate.window());
    let state = Arc::new(AppState {
        migrator,
        gate: RunOnceGate::new(window),
    });

    if args.migrate_on_start {
        let report = trigger(&state.migrator, &state.gate)
            .await
            .context("Startup migration run failed")?;
        if let TriggerOutcome::Ran(report) = report {
            println!("Startup migration: {report}");
        }
    }

    let host = args.host.as_deref().unwrap_or(&project.config.server.host);
    let port = args.port.unwrap_or(project.config.server.port);
    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    println!("Serving migration trigger at http://{addr}/migrate");
    println!("Press Ctrl+C to stop.\n");
    log::info!("Run-once window is {:?}", window);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    Ok(())
}

/// Build the trigger router
pub(crate) fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/migrate", post(post_migrate))
        .route("/health", get(get_health))
        .with_state(state)
}

async fn post_migrate(State(state): State<Arc<AppState>>) -> Response {
    match trigger(&state.migrator, &state.gate).await {
        Ok(TriggerOutcome::Skipped) => Json(TriggerResponse {
            status: "skipped",
            applied: Vec::new(),
            last_applied: None,
        })
        .into_response(),
        Ok(TriggerOutcome::Ran(report)) => Json(TriggerResponse {
            status: "applied",
            last_applied: report.last_applied,
            applied: report.applied,
        })
        .into_response(),
        Err(e) => {
            log::error!("Triggered migration run failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    status: "error",
                    error: e.to_string(),
                }),
            )
                .into_response()
        }
    }
}

async fn get_health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    println!("Shutting down");
}

#[cfg(test)]
#[path = "serve_test.rs"]
mod tests;

//! Serve command implementation
//!
//! HTTP surface over [`PredictionService`]:
//! - `POST /predict` with `{"symptoms": [...]}`
//! - `GET /symptoms`
//! - `GET /health`
//! - `GET /`
//!
//! The artifact is loaded once at startup. If that fails the server still
//! starts and every model-backed route answers 500.

use crate::error::{CliError, Result};
use crate::output;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use colored::Colorize;
use medpredict::config::ServiceConfig;
use medpredict::service::{respond, PredictionService};
use medpredict::MedPredictError;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

/// Run the serve command
pub(crate) fn run(config: &ServiceConfig) -> Result<()> {
    let service = PredictionService::load(&config.artifact);
    if !service.is_ready() {
        output::warning(&format!(
            "Model not loaded from {}; /predict and /symptoms will answer 500",
            config.artifact.display()
        ));
    }

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::Server(format!("Failed to create runtime: {e}")))?;

    let bind_addr = config.bind_address();
    let cors = config.cors;
    runtime.block_on(async move {
        let ready = service.is_ready();
        let app = build_router(service, cors);

        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind {bind_addr}: {e}")))?;

        print_banner(&bind_addr, ready);
        info!(addr = %bind_addr, model_loaded = ready, "prediction server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CliError::Server(format!("Server error: {e}")))?;

        println!();
        println!("{}", "Server stopped".yellow());
        Ok(())
    })
}

/// Build the axum Router for the prediction endpoints.
pub(crate) fn build_router(service: PredictionService, cors: bool) -> Router {
    let router = Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/symptoms", get(symptoms))
        .route("/predict", post(predict))
        .with_state(service);

    if cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers(Any),
        )
    } else {
        router
    }
}

async fn root() -> &'static str {
    "API is running"
}

async fn health(State(service): State<PredictionService>) -> Json<serde_json::Value> {
    let status = if service.is_ready() { "healthy" } else { "degraded" };
    Json(json!({
        "status": status,
        "model_loaded": service.is_ready(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn symptoms(State(service): State<PredictionService>) -> Response {
    match service.symptoms() {
        Ok(symptoms) => Json(json!({"success": true, "symptoms": symptoms})).into_response(),
        Err(e) => error_response(e),
    }
}

async fn predict(State(service): State<PredictionService>, body: Bytes) -> Response {
    // Availability is reported before body problems
    let result = service
        .artifact()
        .and_then(|_| {
            serde_json::from_slice::<serde_json::Value>(&body).map_err(|e| {
                MedPredictError::invalid_input(format!("request body must be JSON: {e}"))
            })
        })
        .and_then(|value| service.predict_value(&value));

    let response = respond(result);
    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(response)).into_response()
}

fn error_response(e: MedPredictError) -> Response {
    let status = StatusCode::from_u16(e.category().status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({"success": false, "error": e.to_string()})),
    )
        .into_response()
}

fn print_banner(bind_addr: &str, ready: bool) {
    println!();
    println!(
        "{}",
        format!("Medpredict server listening on http://{bind_addr}")
            .green()
            .bold()
    );
    println!();
    println!("{}", "Endpoints:".cyan());
    println!("  GET  /          - Liveness message");
    println!("  GET  /health    - Health check");
    println!("  GET  /symptoms  - Known symptoms");
    println!("  POST /predict   - Predict a disease from symptoms");
    println!();
    println!("{}", format!("Model loaded: {ready}").dimmed());
    println!("{}", "Press Ctrl+C to stop".dimmed());
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}

//! ==============================================================================
//! server.rs - dashboard http api
//! ==============================================================================
//!
//! purpose:
//!     exposes telemetry, the analysis state machine and report export over
//!     http so any ui can render them. handlers are thin: they translate
//!     requests into service calls and serialize whatever comes back.
//!
//! relationships:
//!     - used by: main.rs (run_server), tests/api.rs (router)
//!     - uses: telemetry.rs, service.rs, report.rs, domain.rs
//!
//! routes:
//!     GET    /                     minimal html status page
//!     GET    /api/telemetry        current sensor reading
//!     GET    /api/history          fixed chart table
//!     GET    /api/fertilizers      fixed fertilizer catalogue
//!     GET    /api/forecast         fixed weather outlook
//!     GET    /api/quick-stats      fixed overview cards
//!     GET    /api/analysis         analysis snapshot
//!     DELETE /api/analysis         clear image + result
//!     POST   /api/analysis/image   raw image body, starts a run
//!     POST   /api/analysis/drop    browser drag event as json
//!     GET    /api/report           rendered report (204 without a result)
//!     POST   /api/report/export    write report via the configured sink
//!
//! ==============================================================================

use crate::domain::{UploadedImage, FERTILIZERS, FORECAST, HISTORICAL, QUICK_STATS};
use crate::dropzone::DragEvent;
use crate::error::ExportError;
use crate::report::{self, html_escape, ReportFormat, ReportSink};
use crate::service::AnalysisService;
use crate::telemetry::SharedTelemetry;

use anyhow::Result;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Local;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};

// ==============================================================================
// shared state
// ==============================================================================
// everything a handler can touch. all members are cheap clones of shared
// handles, so axum can clone the context per request.

#[derive(Clone)]
pub struct AppContext {
    pub telemetry: SharedTelemetry,
    pub analysis: AnalysisService,
    pub reports: Arc<dyn ReportSink>,
}

pub fn router(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(dashboard_handler))
        .route("/api/telemetry", get(telemetry_handler))
        .route("/api/history", get(history_handler))
        .route("/api/fertilizers", get(fertilizers_handler))
        .route("/api/forecast", get(forecast_handler))
        .route("/api/quick-stats", get(quick_stats_handler))
        .route("/api/analysis", get(analysis_handler).delete(clear_handler))
        // images are accepted at any size
        .route("/api/analysis/image", post(upload_handler).layer(DefaultBodyLimit::disable()))
        .route("/api/analysis/drop", post(drop_handler).layer(DefaultBodyLimit::disable()))
        .route("/api/report", get(report_handler))
        .route("/api/report/export", post(export_handler))
        .layer(CorsLayer::permissive())
        .with_state(ctx)
}

pub async fn run_server<F>(ctx: AppContext, bind_addr: &str, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("[SERVER] Dashboard API live at http://{}", listener.local_addr()?);
    axum::serve(listener, router(ctx))
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}

// ==============================================================================
// errors
// ==============================================================================

pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({"status": "error", "message": self.message}));
        (self.status, body).into_response()
    }
}

impl From<ExportError> for ApiError {
    fn from(e: ExportError) -> Self {
        Self { status: StatusCode::INTERNAL_SERVER_ERROR, message: e.to_string() }
    }
}

// ==============================================================================
// handlers
// ==============================================================================

async fn dashboard_handler(State(ctx): State<AppContext>) -> Html<String> {
    let telemetry = ctx.telemetry.read().await.clone();
    let analysis = ctx.analysis.snapshot().await;
    let r = &telemetry.reading;

    let analysis_line = match &analysis.result {
        Some(res) => format!(
            "{} soil, {}% confidence, health score {}",
            res.soil_type,
            res.confidence,
            report::health_score(&res.npk)
        ),
        None => format!("{:?}", analysis.phase),
    };

    Html(format!(
        r#"<!doctype html>
<html>
<head><title>Green Grids</title><meta http-equiv="refresh" content="5"></head>
<body style="font-family: system-ui; padding: 2rem;">
    <h1>Green Grids Smart Agriculture</h1>
    <h2>Live Sensors ({time})</h2>
    <ul>
        <li>Nitrogen: {n} ppm</li>
        <li>Phosphorus: {p} ppm</li>
        <li>Potassium: {k} ppm</li>
        <li>Temperature: {t}°C</li>
        <li>Humidity: {h}%</li>
        <li>pH: {ph}</li>
    </ul>
    <h2>Soil Analysis</h2>
    <p>{analysis}</p>
</body>
</html>"#,
        time = html_escape(&r.timestamp),
        n = r.nitrogen,
        p = r.phosphorus,
        k = r.potassium,
        t = r.temperature,
        h = r.humidity,
        ph = html_escape(&r.ph),
        analysis = html_escape(&analysis_line),
    ))
}

async fn telemetry_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    let state = ctx.telemetry.read().await;
    Json(state.clone())
}

async fn history_handler() -> impl IntoResponse {
    Json(HISTORICAL)
}

async fn fertilizers_handler() -> impl IntoResponse {
    Json(FERTILIZERS)
}

async fn forecast_handler() -> impl IntoResponse {
    Json(FORECAST)
}

async fn quick_stats_handler() -> impl IntoResponse {
    Json(QUICK_STATS)
}

async fn analysis_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    Json(ctx.analysis.snapshot().await)
}

async fn clear_handler(State(ctx): State<AppContext>) -> impl IntoResponse {
    ctx.analysis.clear().await;
    Json(ctx.analysis.snapshot().await)
}

#[derive(Deserialize)]
struct UploadParams {
    name: Option<String>,
}

/// POST /api/analysis/image?name=field.jpg
/// body is the raw file; content-type is recorded but not checked
async fn upload_handler(
    State(ctx): State<AppContext>,
    Query(params): Query<UploadParams>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let name = params.name.unwrap_or_else(|| "upload".to_string());

    let image = UploadedImage::new(name, mime_type, body.to_vec());
    let run = ctx.analysis.submit(image).await;
    (
        StatusCode::ACCEPTED,
        Json(serde_json::json!({"status": "ok", "run": run, "phase": "analyzing"})),
    )
}

async fn drop_handler(State(ctx): State<AppContext>, Json(event): Json<DragEvent>) -> impl IntoResponse {
    let (outcome, run) = ctx.analysis.drag(event).await;
    let status = if run.is_some() { StatusCode::ACCEPTED } else { StatusCode::OK };
    (
        status,
        Json(serde_json::json!({
            "defaultPrevented": outcome.default_prevented,
            "dragActive": outcome.drag_active,
            "run": run,
        })),
    )
}

#[derive(Deserialize)]
struct ReportParams {
    #[serde(default)]
    format: ReportFormat,
}

async fn report_handler(
    State(ctx): State<AppContext>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let result = ctx.analysis.result().await;
    let Some(doc) = report::build(result.as_ref(), params.format, &Local::now())? else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let headers = [
        (header::CONTENT_TYPE, doc.format.content_type().to_string()),
        (header::CONTENT_DISPOSITION, format!("inline; filename=\"{}\"", doc.file_name)),
    ];
    Ok((headers, doc.body).into_response())
}

async fn export_handler(
    State(ctx): State<AppContext>,
    Query(params): Query<ReportParams>,
) -> Result<Response, ApiError> {
    let result = ctx.analysis.result().await;
    let sink = Arc::clone(&ctx.reports);

    // file io off the async workers
    let exported = tokio::task::spawn_blocking(move || {
        report::export(result.as_ref(), params.format, sink.as_ref(), &Local::now())
    })
    .await
    .map_err(|e| {
        error!("[REPORT] export task failed: {}", e);
        ApiError { status: StatusCode::INTERNAL_SERVER_ERROR, message: format!("task join error: {}", e) }
    })??;

    Ok(match exported {
        Some(receipt) => (StatusCode::CREATED, Json(receipt)).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

//! HTTP surface.
//!
//! `POST /json` accepts a multipart form whose `file` field holds a workbook and answers with the
//! [`OutputMap`] as a JSON object. The optional `sheet` query parameter restricts the output to one
//! sheet when that sheet exists.
//!
//! Decoding and extraction are CPU-bound and run in a blocking task. Each request gets its own
//! [`CancellationToken`], carrying the configured deadline, which is cancelled if the request future
//! is dropped.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, Query, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use bytes::Bytes;
use serde::Deserialize;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{ExtractionError, ExtractionResult};
use crate::extraction::{resolve_sheets, CancellationToken, ExtractionEngine, TracingObserver};
use crate::types::OutputMap;
use crate::workbook::{ExcelWorkbook, SheetSource};

/// Name of the multipart field carrying the workbook.
pub const UPLOAD_FIELD: &str = "file";

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<ExtractionEngine>,
    request_timeout: Option<Duration>,
}

impl AppState {
    /// Create handler state around an extraction engine.
    pub fn new(engine: ExtractionEngine, request_timeout: Option<Duration>) -> Self {
        Self {
            engine: Arc::new(engine),
            request_timeout,
        }
    }

    /// The shared extraction engine.
    pub fn engine(&self) -> &ExtractionEngine {
        &self.engine
    }

    fn request_token(&self) -> CancellationToken {
        match self.request_timeout {
            Some(timeout) => CancellationToken::with_deadline(Instant::now() + timeout),
            None => CancellationToken::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConvertParams {
    sheet: Option<String>,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/json", post(convert))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .with_state(state)
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    let engine = ExtractionEngine::new(config.extraction_options())
        .context("failed to build extraction engine")?
        .with_observer(Arc::new(TracingObserver));
    info!(
        threads = engine.num_threads(),
        max_rows = config.max_rows,
        empty_rows = ?config.empty_rows,
        cell_mode = ?config.cell_mode,
        "extraction engine ready"
    );

    let app = router(
        AppState::new(engine, config.request_timeout()),
        config.max_upload_bytes(),
    );

    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("failed to bind {}", config.listen))?;
    info!("server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "cannot listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

async fn convert(
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<ConvertParams>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let path = uri.path();
    let query = uri.query().unwrap_or("");

    let result = convert_upload(&state, params.sheet, multipart)
        .await
        .and_then(|output| {
            let body = serde_json::to_vec(&output)?;
            Ok((output, body))
        });

    match result {
        Ok((output, body)) => {
            let sheets = output.sheet_names().collect::<Vec<_>>().join(",");
            let rows = output
                .iter()
                .map(|s| format!("{}={}", s.sheet, s.row_count()))
                .collect::<Vec<_>>()
                .join(",");
            info!(path, query, %sheets, %rows, "converted workbook to json");
            ([(CONTENT_TYPE, "application/json")], Bytes::from(body)).into_response()
        }
        Err(err) => {
            let status = status_for(&err);
            error!(path, query, status = status.as_u16(), error = %err, "workbook conversion failed");
            (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
        }
    }
}

async fn convert_upload(
    state: &AppState,
    sheet: Option<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ExtractionResult<OutputMap> {
    let multipart = multipart.map_err(|e| ExtractionError::Upload {
        message: e.body_text(),
    })?;
    let upload = read_upload(multipart).await?;

    let cancel = state.request_token();
    let _guard = cancel.drop_guard();
    let engine = Arc::clone(&state.engine);

    tokio::task::spawn_blocking(move || {
        let workbook = ExcelWorkbook::from_bytes(upload)?;
        let sheets = resolve_sheets(workbook.sheet_names(), sheet.as_deref());
        engine.extract(&workbook, &sheets, &cancel)
    })
    .await
    .map_err(|e| ExtractionError::Worker {
        message: e.to_string(),
    })?
}

async fn read_upload(mut multipart: Multipart) -> ExtractionResult<Bytes> {
    let upload_err = |message: String| ExtractionError::Upload { message };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| upload_err(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            return field.bytes().await.map_err(|e| upload_err(e.body_text()));
        }
    }
    Err(upload_err(format!("missing form field '{UPLOAD_FIELD}'")))
}

fn status_for(err: &ExtractionError) -> StatusCode {
    match err {
        ExtractionError::Upload { .. } => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

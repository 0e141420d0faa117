use crate::error::AppError;
use crate::metrics::{MetricsSnapshot, TimedOperation};
use crate::pages::{self, SUBMISSION_FIELD};
use crate::AppState;
use axum::{
    Json,
    extract::{Multipart, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use evaluate::{BundleField, BundleUpdate};
use serde::Serialize;
use std::sync::Arc;
use tracing::{Instrument, info, info_span};
use uuid::Uuid;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    model: String,
}

pub async fn index() -> Html<String> {
    Html(pages::index_page())
}

/// Grade an uploaded document and render the model's evaluation
pub async fn submit(State(state): State<Arc<AppState>>, multipart: Multipart) -> Response {
    let timer = TimedOperation::start();
    let span = info_span!("evaluation", id = %Uuid::new_v4());

    match run_evaluation(&state, multipart).instrument(span).await {
        Ok(evaluation) => {
            state.metrics.record_success(timer.elapsed());
            Html(pages::result_page(&evaluation)).into_response()
        }
        Err(e) => {
            state.metrics.record_failure(e.kind());
            e.into_response()
        }
    }
}

async fn run_evaluation(state: &AppState, mut multipart: Multipart) -> Result<String, AppError> {
    let upload = read_submission(&mut multipart)
        .await?
        .ok_or(AppError::MissingUpload(SUBMISSION_FIELD))?;

    info!(
        document_id = %ingest::document_id(&upload),
        bytes = upload.len(),
        "Submission received"
    );

    let submission = ingest::extract_text(&upload)?;
    let bundle = state.store.load().await?;

    if state.require_rubric && bundle.rubric.is_empty() {
        return Err(AppError::ConfigurationIncomplete(
            "no rubric has been uploaded".to_string(),
        ));
    }

    Ok(state.evaluator.evaluate(&bundle, &submission).await?)
}

async fn read_submission(multipart: &mut Multipart) -> Result<Option<Vec<u8>>, AppError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(SUBMISSION_FIELD) {
            continue;
        }
        let bytes = field.bytes().await?;
        if !bytes.is_empty() {
            return Ok(Some(bytes.to_vec()));
        }
    }
    Ok(None)
}

pub async fn config_form(State(state): State<Arc<AppState>>) -> Result<Html<String>, AppError> {
    let status = state.store.status().await?;
    Ok(Html(pages::config_page(&status)))
}

/// Persist the provided configuration fields. Empty file parts and a blank
/// instruction count as not provided.
pub async fn save_config(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Redirect, AppError> {
    let mut update = BundleUpdate::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(target) = field.name().and_then(BundleField::from_form_name) else {
            continue;
        };
        let bytes = field.bytes().await?;

        let provided = if target.is_document() {
            !bytes.is_empty()
        } else {
            !String::from_utf8_lossy(&bytes).trim().is_empty()
        };
        if provided {
            update.set(target, bytes.to_vec());
        }
    }

    let written = state.store.save(update).await?;
    if !written.is_empty() {
        state.metrics.record_config_update();
    }

    Ok(Redirect::to("/config"))
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model: state.evaluator.model().to_string(),
    })
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}

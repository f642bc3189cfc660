use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::resize::{ResizeOutcome, ResizeReport, ResizeService};
use crate::app::thumbnails::{ThumbnailOutcome, ThumbnailReport, ThumbnailService};
use crate::domain::event::S3Event;
use crate::http::AppError;
use crate::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    status: &'static str,
}

/// Result of one invocation: `processed` is false when the object was skipped.
#[derive(Serialize)]
pub struct InvocationResponse<T> {
    pub processed: bool,
    #[serde(flatten)]
    pub report: Option<T>,
}

impl<T> InvocationResponse<T> {
    fn processed(report: T) -> Self {
        Self {
            processed: true,
            report: Some(report),
        }
    }

    fn skipped() -> Self {
        Self {
            processed: false,
            report: None,
        }
    }
}

pub(crate) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn generate_thumbnails(
    State(state): State<AppState>,
    Json(event): Json<S3Event>,
) -> Result<Json<InvocationResponse<ThumbnailReport>>, AppError> {
    let object = event.source_object()?;
    let service = ThumbnailService::new(
        state.storage.clone(),
        state.decoder.clone(),
        state.settings.clone(),
    );

    let outcome = service.handle(&object).await.map_err(|err| {
        tracing::error!(error = %err, source = %object, "failed to generate thumbnails");
        AppError::from(err)
    })?;

    match outcome {
        ThumbnailOutcome::Processed(report) => Ok(Json(InvocationResponse::processed(report))),
        ThumbnailOutcome::NotProcessed => Ok(Json(InvocationResponse::skipped())),
    }
}

pub async fn resize_image(
    State(state): State<AppState>,
    Json(event): Json<S3Event>,
) -> Result<Json<InvocationResponse<ResizeReport>>, AppError> {
    let object = event.source_object()?;
    let service = ResizeService::new(
        state.storage.clone(),
        state.variants.clone(),
        state.settings.storage_timeout,
    );

    let outcome = service.handle(&object).await.map_err(|err| {
        tracing::error!(error = %err, source = %object, "failed to resize image");
        AppError::from(err)
    })?;

    match outcome {
        ResizeOutcome::Processed(report) => Ok(Json(InvocationResponse::processed(report))),
        ResizeOutcome::NotProcessed => Ok(Json(InvocationResponse::skipped())),
    }
}

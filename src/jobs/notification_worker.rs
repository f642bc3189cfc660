use anyhow::Result;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::app::error::JobError;
use crate::app::resize::{ResizeOutcome, ResizeService};
use crate::app::thumbnails::{ThumbnailOutcome, ThumbnailService};
use crate::config::Pipeline;
use crate::domain::event::S3Event;
use crate::domain::media::ObjectRef;
use crate::infra::queue::QueueClient;
use crate::AppState;

const POLL_WAIT_SECONDS: i32 = 10;
const IDLE_SLEEP_MS: u64 = 200;
const ERROR_BACKOFF_MS: u64 = 1000;

#[derive(Debug, PartialEq, Eq)]
pub enum ProcessingOutcome {
    Completed,
    RetryLater,
}

pub async fn run(state: AppState, queue: QueueClient, pipeline: Pipeline) -> Result<()> {
    info!(queue = %queue.queue_name(), ?pipeline, "notification worker started");
    loop {
        match queue.receive_notification(POLL_WAIT_SECONDS).await {
            Ok(Some(message)) => {
                let outcome = process_notification(&state, pipeline, &message.event).await;

                if outcome == ProcessingOutcome::Completed {
                    if let Err(err) = queue.delete_message(&message.receipt_handle).await {
                        warn!(error = ?err, "failed to delete queue message");
                    }
                }
            }
            Ok(None) => {
                tokio::time::sleep(Duration::from_millis(IDLE_SLEEP_MS)).await;
            }
            Err(err) => {
                warn!(error = ?err, "queue receive failed, backing off");
                tokio::time::sleep(Duration::from_millis(ERROR_BACKOFF_MS)).await;
            }
        }
    }
}

/// Runs one notification through `pipeline`. Only timeouts ask for redelivery;
/// every other failure is final.
pub async fn process_notification(
    state: &AppState,
    pipeline: Pipeline,
    event: &S3Event,
) -> ProcessingOutcome {
    let object = match event.source_object() {
        Ok(object) => object,
        Err(err) => {
            warn!(error = %err, "dropping notification");
            return ProcessingOutcome::Completed;
        }
    };

    match invoke(state, pipeline, &object).await {
        Ok(true) => ProcessingOutcome::Completed,
        Ok(false) => {
            info!(source = %object, "object not processed");
            ProcessingOutcome::Completed
        }
        Err(err) if err.is_retryable() => {
            warn!(error = %err, source = %object, "job timed out, leaving for redelivery");
            ProcessingOutcome::RetryLater
        }
        Err(err) => {
            error!(error = %err, source = %object, "failed to process object");
            ProcessingOutcome::Completed
        }
    }
}

/// `Ok(false)` means the object was deliberately not processed.
pub async fn invoke(state: &AppState, pipeline: Pipeline, object: &ObjectRef) -> Result<bool, JobError> {
    match pipeline {
        Pipeline::Thumbnails => {
            let service = ThumbnailService::new(
                state.storage.clone(),
                state.decoder.clone(),
                state.settings.clone(),
            );
            match service.handle(object).await? {
                ThumbnailOutcome::Processed(_) => Ok(true),
                ThumbnailOutcome::NotProcessed => Ok(false),
            }
        }
        Pipeline::Resize => {
            let service = ResizeService::new(
                state.storage.clone(),
                state.variants.clone(),
                state.settings.storage_timeout,
            );
            match service.handle(object).await? {
                ResizeOutcome::Processed(_) => Ok(true),
                ResizeOutcome::NotProcessed => Ok(false),
            }
        }
    }
}

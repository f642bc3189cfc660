use anyhow::anyhow;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_jobs::app::variants::VariantMatrix;
use media_jobs::config::AppConfig;
use media_jobs::infra::{decoder::Ffmpeg, queue::QueueClient, storage::ObjectStorage};
use media_jobs::{http, jobs, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;

    let storage = ObjectStorage::new(&config).await?;
    let decoder = Ffmpeg::new(
        config.ffmpeg_path.clone(),
        config.ffprobe_path.clone(),
        config.decoder_timeout(),
    );
    let variants = VariantMatrix::standard();
    anyhow::ensure!(!variants.is_empty(), "variant matrix has no cells");
    tracing::info!(cells = variants.len(), "variant matrix ready");

    let state = AppState {
        storage: Arc::new(storage),
        decoder: Arc::new(decoder),
        variants: Arc::new(variants),
        settings: config.job_settings(),
    };

    match config.app_mode.as_str() {
        "api" => {
            let app = http::router(state).layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(RequestBodyLimitLayer::new(config.upload_max_bytes)),
            );
            let listener = tokio::net::TcpListener::bind(&config.http_addr).await?;
            tracing::info!("listening on {}", config.http_addr);

            axum::serve(listener, app)
                .with_graceful_shutdown(shutdown_signal())
                .await?;
        }
        "worker" => {
            let queue = QueueClient::new(&config).await?;
            tracing::info!(pipeline = ?config.worker_pipeline, "starting worker mode");
            tokio::select! {
                result = jobs::notification_worker::run(state, queue, config.worker_pipeline) => {
                    result?;
                }
                _ = shutdown_signal() => {}
            }
        }
        other => return Err(anyhow!("unknown APP_MODE: {}", other)),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

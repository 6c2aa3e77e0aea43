//! Transcode worker binary.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vtx_jobstore::PostgrestClient;
use vtx_media::FfmpegEncoder;
use vtx_storage::R2Client;
use vtx_worker::{serve_health, Dispatcher, TranscodePipeline, WorkerConfig, WorkerHealth};

#[tokio::main]
async fn main() {
    // Install rustls crypto provider (required for TLS/HTTPS)
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();
    init_tracing();

    info!("Starting vtx-worker");

    let config = WorkerConfig::from_env();
    info!("Worker config: {:?}", config);

    let jobs = match PostgrestClient::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create job store client: {}", e);
            std::process::exit(1);
        }
    };

    let objects = match R2Client::from_env() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to create object store client: {}", e);
            std::process::exit(1);
        }
    };

    let encoder = match FfmpegEncoder::locate(config.ffmpeg_path.as_deref()) {
        Ok(encoder) => encoder.with_timeout(config.encode_timeout),
        Err(e) => {
            error!("FFmpeg unavailable: {}", e);
            std::process::exit(1);
        }
    };
    info!(binary = %encoder.binary().display(), "Using encoder");

    let pipeline = TranscodePipeline::new(objects, Arc::new(encoder), config.work_dir.clone());
    let health = Arc::new(WorkerHealth::new());
    let dispatcher = Dispatcher::new(jobs, pipeline, config.clone()).with_health(Arc::clone(&health));

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let health_addr = config.health_addr();
    let health_rx = shutdown_rx.clone();
    let health_handle = tokio::spawn(async move {
        if let Err(e) = serve_health(&health_addr, health, health_rx).await {
            error!("Health server error: {}", e);
        }
    });

    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Received shutdown signal, finishing current job");
        let _ = shutdown_tx.send(true);
    });

    if let Err(e) = dispatcher.run(shutdown_rx).await {
        error!("Dispatcher error: {}", e);
        std::process::exit(1);
    }

    health_handle.await.ok();
    info!("Worker shutdown complete");
}

/// Colored text for dev, JSON when `LOG_FORMAT=json`.
fn init_tracing() {
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vtx=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.ok();
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

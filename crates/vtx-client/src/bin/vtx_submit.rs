//! Submit a video for transcoding and wait for the result.
//!
//! Waits for the worker to wake, uploads the file through a presigned URL,
//! queues a job, then polls it until it is done or failed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vtx_client::{content_type_for, follow_job, wait_for_awake, ApiClient, ClientConfig, WakeWatcher};
use vtx_models::JobStatus;

#[derive(Parser, Debug)]
#[command(name = "vtx-submit", version, about = "Upload a video and transcode it")]
struct Cli {
    /// Video file to upload
    file: PathBuf,

    /// Edge API base URL
    #[arg(long, env = "VTX_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Owner of the job; the API default applies when omitted
    #[arg(long, env = "VTX_USER_ID")]
    user_id: Option<String>,

    /// Content type to declare; guessed from the extension when omitted
    #[arg(long)]
    content_type: Option<String>,

    /// Seconds between wake probes and job polls
    #[arg(long, default_value_t = 3)]
    poll_interval_secs: u64,

    /// Give up waiting for the worker after this many seconds
    #[arg(long, default_value_t = 300)]
    wake_timeout_secs: u64,

    /// Skip waiting for the worker
    #[arg(long, default_value_t = false)]
    no_wait: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    if rustls::crypto::ring::default_provider().install_default().is_err() {
        eprintln!("rustls crypto provider already installed");
    }

    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vtx=info")))
        .init();

    let cli = Cli::parse();
    let interval = Duration::from_secs(cli.poll_interval_secs.max(1));

    let content_type = match cli.content_type.as_deref() {
        Some(ct) => ct.to_string(),
        None => content_type_for(&cli.file)
            .with_context(|| format!("cannot infer a video type for {}; pass --content-type", cli.file.display()))?
            .to_string(),
    };

    let config = ClientConfig {
        base_url: cli.api_url.clone(),
        poll_interval: interval,
        ..ClientConfig::default()
    };
    let client = ApiClient::new(&config).context("failed to build API client")?;

    if !cli.no_wait {
        info!("Waiting for worker at {}", client.base_url());
        let (rx, watcher) = WakeWatcher::new(Arc::new(client.clone()), interval).spawn();
        let awake = tokio::time::timeout(Duration::from_secs(cli.wake_timeout_secs), wait_for_awake(rx)).await;
        watcher.abort();
        match awake {
            Ok(true) => info!("Worker is awake"),
            _ => bail!("worker did not wake within {}s", cli.wake_timeout_secs),
        }
    }

    let job = client
        .submit_file(&cli.file, &content_type, cli.user_id.clone())
        .await
        .context("submission failed")?;
    println!("job {}", job.id);

    let outcome = follow_job(&client, &job.id, interval)
        .await
        .context("lost track of job")?;

    match outcome.job.status {
        JobStatus::Done => {
            match outcome.signed_url {
                Some(url) => println!("done: {}", url),
                None => println!("done: result URL unavailable, retry GET /jobs/{}/url", job.id),
            }
            Ok(())
        }
        _ => bail!(
            "job {} failed: {}",
            job.id,
            outcome.job.error.unwrap_or_else(|| "unknown error".to_string())
        ),
    }
}

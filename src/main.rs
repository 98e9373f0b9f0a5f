use std::io::Read;

use anyhow::Context;

use spamwatch::config::{NotifyConfig, RetrainConfig};
use spamwatch::pipeline::{NotifyPipeline, ObjectCreatedEvent};
use spamwatch::retrain::RetrainRunner;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let command = std::env::args().nth(1).unwrap_or_default();
    match command.as_str() {
        "notify" => notify().await,
        "retrain" => retrain().await,
        _ => {
            eprintln!("Usage: spamwatch <notify|retrain>");
            eprintln!("  notify   read an object-created event (JSON) from stdin");
            eprintln!("  retrain  drive the notebook retrain cycle");
            std::process::exit(2);
        }
    }
}

/// Notification pipeline invocation: event JSON on stdin, success payload
/// on stdout. Storage/inference failures surface as a nonzero exit.
async fn notify() -> anyhow::Result<()> {
    let mut raw = String::new();
    std::io::stdin()
        .read_to_string(&mut raw)
        .context("Failed to read event from stdin")?;
    let event: ObjectCreatedEvent =
        serde_json::from_str(&raw).context("Invalid object-created event")?;

    let config = NotifyConfig::from_env()?;
    let pipeline = NotifyPipeline::from_config(config);

    let response = pipeline.run(&event).await?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

async fn retrain() -> anyhow::Result<()> {
    let config = RetrainConfig::from_env()?;
    let runner = RetrainRunner::new(config);

    let response = runner.run().await?;
    println!("{}", serde_json::to_string(&response)?);
    Ok(())
}

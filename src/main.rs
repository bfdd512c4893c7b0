use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collector::config::{Config, SourceConfig};
use collector::pipeline::{Pipeline, Sink, Source, Transform};
use collector::resolve::{self, Resolver};
use collector::sinks::StdoutSink;
use collector::sources::{DockerSource, FileSource, StdinSource};
use collector::transform::remap::{CaseMode, RemapTransform};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "collector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("starting collector");

    let config = Config::load().context("loading configuration")?;
    info!(
        sources = config.sources.len(),
        transforms = config.transforms.len(),
        sinks = config.sinks.len(),
        "configuration loaded"
    );

    let pipeline = build_pipeline(&config).context("building pipeline from configuration")?;

    let cancel = CancellationToken::new();
    let shutdown_cancel = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        shutdown_cancel.cancel();
    });

    match pipeline.run(cancel).await {
        Ok(()) => {
            info!("pipeline drained cleanly");
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "pipeline failed");
            Err(e).context("pipeline execution failed")
        }
    }
}

fn build_pipeline(config: &Config) -> Result<Pipeline> {
    let sources = build_sources(config);
    let transform = build_transform(config)?;
    let resolver = resolve::from_config(&config.resolve)
        .context("building resolver")?
        .map(|r| -> Arc<dyn Resolver> { Arc::from(r) });
    let sink = build_sink(config)?;

    Ok(Pipeline::new(sources, transform, resolver, sink)?)
}

fn build_sources(config: &Config) -> Vec<Box<dyn Source>> {
    config
        .sources
        .iter()
        .map(|(name, source)| -> Box<dyn Source> {
            match source {
                SourceConfig::Stdin { service } => {
                    info!(name, %service, "configured stdin source");
                    Box::new(StdinSource::new(name.clone()))
                }
                SourceConfig::File { service, path } => {
                    info!(name, %service, %path, "configured file source");
                    Box::new(FileSource::new(path.clone(), name.clone()))
                }
                SourceConfig::Docker {
                    service,
                    container_id,
                } => {
                    info!(name, %service, %container_id, "configured docker source");
                    Box::new(DockerSource::new(container_id.clone(), name.clone()))
                }
            }
        })
        .collect()
}

fn build_transform(config: &Config) -> Result<Option<Arc<dyn Transform>>> {
    let Some((name, transform)) = config.transforms.iter().next() else {
        return Ok(None);
    };
    info!(name, kind = %transform.kind, "configured transform");

    let case = transform
        .case
        .as_deref()
        .map(|s| CaseMode::parse(s).ok_or_else(|| anyhow::anyhow!("unknown transform case mode '{s}'")))
        .transpose()?;

    let add_fields = transform
        .add_fields
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    Ok(Some(Arc::new(RemapTransform { add_fields, case })))
}

fn build_sink(config: &Config) -> Result<Box<dyn Sink>> {
    let (name, sink) = config
        .sinks
        .iter()
        .next()
        .context("no sink configured")?;
    match sink.kind.as_str() {
        "stdout" => {
            info!(name, pretty = sink.pretty, "configured stdout sink");
            Ok(Box::new(StdoutSink::new(sink.pretty)))
        }
        other => Err(anyhow::anyhow!("unknown sink type '{other}'")),
    }
}

/// Listens for SIGINT (Ctrl+C) or SIGTERM and returns once either fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

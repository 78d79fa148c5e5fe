pub mod config;
pub mod logging;
pub mod shutdown;

pub use config::{Config, ConfigError, LogFormat, LogLevel};
pub use logging::init_tracing;
pub use shutdown::spawn_signal_listener;

use crate::broker::connect_broker;
use crate::domain::Level;
use crate::pipeline::{LogPipeline, PipelineHandle, ShutdownReport};
use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Line forwarder: every input line becomes one event of the configured level.
pub struct App {
    config: Config,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;

        // A config file replaces the command line entirely
        let config = match &config.config_file {
            Some(path) => Config::from_file(path)?,
            None => config,
        };

        Ok(Self::from_config(config))
    }

    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Forward `input` until EOF or until `token` is cancelled, then shut the pipeline down.
    pub async fn run<R>(self, input: R, token: CancellationToken) -> anyhow::Result<ShutdownReport>
    where
        R: AsyncBufRead + Unpin,
    {
        let broker = connect_broker(&self.config).await;
        let pipeline = LogPipeline::start(self.config.pipeline_config(), broker)
            .context("failed to start log pipeline")?;

        let level = Level::from(self.config.event_level.clone());
        info!(
            service = %self.config.service_name,
            level = %level,
            "Forwarding input lines as log events"
        );

        let forwarded = forward_lines(
            input,
            &pipeline.handle(),
            &self.config.service_name,
            &level,
            &token,
        )
        .await
        .context("failed to read input")?;
        debug!(forwarded, "Input finished");

        let report = pipeline
            .shutdown(self.config.shutdown_timeout)
            .await
            .context("log pipeline did not shut down cleanly")?;
        Ok(report)
    }
}

async fn forward_lines<R>(
    input: R,
    handle: &PipelineHandle,
    service: &str,
    level: &Level,
    token: &CancellationToken,
) -> std::io::Result<u64>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    let mut forwarded = 0;

    loop {
        tokio::select! {
            () = token.cancelled() => break,
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                handle.log(level.clone(), service, &line);
                forwarded += 1;
            }
        }
    }

    Ok(forwarded)
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Main entry point for the application
pub async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    // Let clap print help and version itself
    if let Err(e) = Config::try_parse_from(&args)
        && matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
    {
        e.print()?;
        return Ok(());
    }

    let app = App::from_args(args)?;
    init_tracing(app.config().log_level, app.config().log_format);
    info!("Starting log-fanout v{}", get_version());

    let print_metrics = app.config().print_metrics;
    let token = CancellationToken::new();
    let signals = spawn_signal_listener(token.clone());

    let report = app.run(BufReader::new(tokio::io::stdin()), token.clone()).await;
    token.cancel();
    let _ = signals.await;
    let report = report?;

    println!("{}", serde_json::to_string_pretty(&report)?);

    if print_metrics {
        print_prometheus(&report)?;
    }

    Ok(())
}

#[cfg(feature = "metrics")]
fn print_prometheus(report: &ShutdownReport) -> anyhow::Result<()> {
    let metrics = crate::reliability::PipelineMetrics::new()?;
    metrics.update(&report.stats);
    print!("{}", metrics.render()?);
    Ok(())
}

#[cfg(not(feature = "metrics"))]
fn print_prometheus(_report: &ShutdownReport) -> anyhow::Result<()> {
    tracing::warn!("Built without the metrics feature; --print-metrics ignored");
    Ok(())
}

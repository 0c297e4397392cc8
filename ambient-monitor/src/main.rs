//! ambient-monitor - mirror the dominant screen color onto a BLE light strip
//!
//! Usage:
//!   ambient-monitor                          - run with the built-in device
//!   ambient-monitor --device-address ADDR    - run against another strip
//!   ambient-monitor --discover [--json]      - list the device's characteristics
//!   ambient-monitor --color ff0080 --frames 1
//!
//! Set RUST_LOG=ambient_monitor=trace to see every frame sent.

use std::process::ExitCode;

use ambient_monitor::{
    Args, ColorSource, FixedColor, MonitorConfig, Outcome, ScreenColorSource, ScreenSampler,
    discover, run_session, signal,
};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match MonitorConfig::try_from(&args) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let cancel = CancellationToken::new();
    signal::spawn_listener(cancel.clone());

    if args.json && config.characteristic.is_some() {
        tracing::warn!("--json only applies when discovering characteristics");
    }

    if config.characteristic.is_none() {
        return match discover(&config, &cancel).await {
            Ok(Some(characteristics)) if args.json => {
                match serde_json::to_string_pretty(&characteristics) {
                    Ok(json) => {
                        println!("{json}");
                        ExitCode::SUCCESS
                    }
                    Err(e) => {
                        tracing::error!("failed to encode characteristics: {e}");
                        ExitCode::FAILURE
                    }
                }
            }
            Ok(Some(_)) => ExitCode::SUCCESS,
            Ok(None) => ExitCode::from(signal::INTERRUPTED),
            Err(e) => {
                tracing::error!("{e}");
                ExitCode::FAILURE
            }
        };
    }

    let mut source: Box<dyn ColorSource> = match config.fixed_color {
        Some(color) => {
            tracing::info!(%color, "sending a fixed color");
            Box::new(FixedColor(color))
        }
        None => match ScreenSampler::primary(config.capture) {
            Ok(sampler) => Box::new(ScreenColorSource::new(sampler)),
            Err(e) => {
                tracing::error!("{e}");
                return ExitCode::FAILURE;
            }
        },
    };

    match run_session(&config, &mut *source, &cancel).await {
        Ok(Outcome::Completed { frames }) => {
            tracing::info!(frames, "done");
            ExitCode::SUCCESS
        }
        Ok(Outcome::Interrupted) => ExitCode::from(signal::INTERRUPTED),
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

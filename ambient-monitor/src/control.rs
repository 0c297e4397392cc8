//! The control loop
//!
//! `Connecting -> Running -> ShuttingDown`. Once a connection exists, every
//! way out of the loop (interrupt, frame bound, fatal error) goes through
//! [`shut_down`], which writes the off frame and disconnects exactly once.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use ambient_ble_controller::{self as ble, CharacteristicInfo, GattClient, LightTransport, Session};
use ambient_proto::Command;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::Error;
use crate::config::MonitorConfig;
use crate::source::ColorSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Connecting,
    Running,
    ShuttingDown,
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            State::Connecting => "connecting",
            State::Running => "running",
            State::ShuttingDown => "shutting-down",
        })
    }
}

/// How a run that did not fail ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Cancelled by a signal
    Interrupted,
    /// The frame bound was reached
    Completed { frames: u64 },
}

/// Connect, then stream colors from `source` until cancelled
///
/// `connect` is always awaited to completion. It should give up with
/// [`ble::Error::Cancelled`] if `cancel` fires before a link exists, which
/// ends the run without touching the strip. A failed connect returns
/// [`Error::Connection`] without writing anything. After a successful
/// connect the strip is given `settle_delay`, turned on, and fed one
/// set-color frame per `loop_interval`. Write and extraction failures while
/// running are logged and that frame is skipped.
pub async fn run<T, F, C>(
    connect: F,
    source: &mut C,
    config: &MonitorConfig,
    cancel: &CancellationToken,
) -> Result<Outcome, Error>
where
    T: LightTransport,
    F: Future<Output = Result<T, ble::Error>>,
    C: ColorSource + ?Sized,
{
    tracing::info!(state = %State::Connecting, address = %config.device_address);
    let mut transport = match connect.await {
        Ok(transport) => transport,
        Err(ble::Error::Cancelled) => {
            tracing::info!("interrupted before a connection was made");
            return Ok(Outcome::Interrupted);
        }
        Err(e) => return Err(Error::Connection(e)),
    };

    // an interrupt that raced the connect is picked up by the settle delay
    let result = drive(&mut transport, source, config, cancel).await;
    shut_down(&mut transport).await;
    result
}

async fn drive<T, C>(
    transport: &mut T,
    source: &mut C,
    config: &MonitorConfig,
    cancel: &CancellationToken,
) -> Result<Outcome, Error>
where
    T: LightTransport,
    C: ColorSource + ?Sized,
{
    // some receivers drop writes that arrive right after the connection
    if !sleep_or_cancel(config.settle_delay, cancel).await {
        return Ok(Outcome::Interrupted);
    }

    transport
        .write(&Command::On.encode())
        .await
        .map_err(Error::Write)?;
    tracing::info!("turned on");

    tracing::info!(state = %State::Running, "ambient monitor starting");
    let mut frames = 0u64;
    let mut failures = 0u64;

    loop {
        if cancel.is_cancelled() {
            return Ok(Outcome::Interrupted);
        }
        if config.max_frames.is_some_and(|max| frames >= max) {
            tracing::info!(frames, "frame limit reached");
            return Ok(Outcome::Completed { frames });
        }
        frames += 1;

        match update(transport, source).await {
            Ok(()) if failures > 0 => {
                tracing::info!(skipped = failures, "updates recovered");
                failures = 0;
            }
            Ok(()) => {}
            Err(e) => {
                // a dropped link fails every frame, so only the first is loud
                if failures == 0 {
                    tracing::warn!(frame = frames, "skipping update: {e}");
                } else {
                    tracing::debug!(frame = frames, "skipping update: {e}");
                }
                failures += 1;
            }
        }

        if !sleep_or_cancel(config.loop_interval, cancel).await {
            return Ok(Outcome::Interrupted);
        }
    }
}

/// One iteration: sample, encode, write
async fn update<T, C>(transport: &mut T, source: &mut C) -> Result<(), Error>
where
    T: LightTransport,
    C: ColorSource + ?Sized,
{
    let color = source.next_color()?;
    let command = Command::SetColor(color);
    tracing::trace!(%color, frame = %command.to_hex(), "sending color");
    transport
        .write(&command.encode())
        .await
        .map_err(Error::Write)
}

/// Best-effort off frame, then disconnect
async fn shut_down<T: LightTransport>(transport: &mut T) {
    tracing::info!(state = %State::ShuttingDown);
    match transport.write(&Command::Off.encode()).await {
        Ok(()) => tracing::info!("turned off"),
        Err(e) => tracing::warn!("could not turn off: {e}"),
    }
    transport.disconnect().await;
}

/// `false` if cancelled before `duration` passed
async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    tokio::select! {
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

/// [`run`] against a device that still needs its write target picked
///
/// Selects `config.characteristic` once `connect` succeeds. A device without
/// that characteristic is disconnected and reported as [`Error::Connection`]
/// before anything is written.
pub async fn run_client<T, F, C>(
    connect: F,
    source: &mut C,
    config: &MonitorConfig,
    cancel: &CancellationToken,
) -> Result<Outcome, Error>
where
    T: GattClient,
    F: Future<Output = Result<T, ble::Error>>,
    C: ColorSource + ?Sized,
{
    let characteristic = config.characteristic.ok_or_else(|| {
        Error::Config("no characteristic configured, run with --discover to find one".to_string())
    })?;

    run(open_target(connect, characteristic), source, config, cancel).await
}

async fn open_target<T, F>(connect: F, characteristic: Uuid) -> Result<T, ble::Error>
where
    T: GattClient,
    F: Future<Output = Result<T, ble::Error>>,
{
    let mut client = connect.await?;
    if let Err(e) = client.select_characteristic(characteristic) {
        for c in client.characteristics() {
            tracing::warn!(service = %c.service, uuid = %c.uuid, "device offers");
        }
        client.disconnect().await;
        return Err(e);
    }
    tracing::debug!(%characteristic, "writing to characteristic");
    Ok(client)
}

/// [`run`] against a real strip over BLE
pub async fn run_session<C>(
    config: &MonitorConfig,
    source: &mut C,
    cancel: &CancellationToken,
) -> Result<Outcome, Error>
where
    C: ColorSource + ?Sized,
{
    let connect = Session::connect(&config.device_address, config.scan_timeout, cancel);
    run_client(connect, source, config, cancel).await
}

/// Connect, list the device's characteristics, and disconnect
///
/// Nothing is written. Returns `None` if `connect` gave up with
/// [`ble::Error::Cancelled`]. Once connected the listing always finishes and
/// the device is disconnected exactly once.
pub async fn discover_client<T, F>(
    connect: F,
    config: &MonitorConfig,
) -> Result<Option<Vec<CharacteristicInfo>>, Error>
where
    T: GattClient,
    F: Future<Output = Result<T, ble::Error>>,
{
    tracing::info!(state = %State::Connecting, address = %config.device_address);
    let mut client = match connect.await {
        Ok(client) => client,
        Err(ble::Error::Cancelled) => return Ok(None),
        Err(e) => return Err(Error::Connection(e)),
    };

    let characteristics = client.characteristics();
    for c in &characteristics {
        tracing::info!(
            service = %c.service,
            uuid = %c.uuid,
            properties = %c.properties.join(","),
            writable = c.is_writable(),
            "characteristic"
        );
    }
    tracing::info!("test the writable characteristics to find the one that drives the strip");

    tracing::info!(state = %State::ShuttingDown);
    client.disconnect().await;
    Ok(Some(characteristics))
}

/// [`discover_client`] against a real device over BLE
pub async fn discover(
    config: &MonitorConfig,
    cancel: &CancellationToken,
) -> Result<Option<Vec<CharacteristicInfo>>, Error> {
    let connect = Session::connect(&config.device_address, config.scan_timeout, cancel);
    discover_client(connect, config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_names() {
        assert_eq!(State::Connecting.to_string(), "connecting");
        assert_eq!(State::Running.to_string(), "running");
        assert_eq!(State::ShuttingDown.to_string(), "shutting-down");
    }

    #[tokio::test(start_paused = true)]
    async fn sleep_is_cut_short_by_cancel() {
        let cancel = CancellationToken::new();
        assert!(sleep_or_cancel(Duration::from_millis(10), &cancel).await);

        cancel.cancel();
        assert!(!sleep_or_cancel(Duration::from_secs(3600), &cancel).await);
    }
}

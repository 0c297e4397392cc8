//! Ambient BLE Controller
//!
//! Owns the connection to a light strip's BLE receiver and the writes made
//! to its command characteristic.
//!
//! # Example
//!
//! ```ignore
//! use ambient_ble_controller::{GattClient, LightTransport, Session};
//! use ambient_proto::Command;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), ambient_ble_controller::Error> {
//!     let cancel = CancellationToken::new();
//!     let mut session =
//!         Session::connect("be:89:10:00:f2:ca", Duration::from_secs(10), &cancel).await?;
//!     session.select_characteristic(ambient_ble_controller::parse_uuid(
//!         ambient_proto::ble::COMMAND_UUID,
//!     )?)?;
//!
//!     session.write(&Command::On.encode()).await?;
//!     session.write(&Command::Off.encode()).await?;
//!     session.disconnect().await;
//!     Ok(())
//! }
//! ```

pub mod ble;

use std::future::Future;

use uuid::Uuid;

pub use ble::{CharacteristicInfo, Session, get_adapter, parse_address, parse_uuid};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no Bluetooth adapter found")]
    NoAdapter,

    #[error("invalid device address {0:?}")]
    InvalidAddress(String),

    #[error("invalid characteristic UUID {0:?}")]
    InvalidUuid(String),

    #[error("device {address} not seen within {secs}s")]
    DeviceNotFound { address: String, secs: u64 },

    #[error("failed to connect to {address}: {reason}")]
    Connection { address: String, reason: String },

    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(uuid::Uuid),

    #[error("no characteristic selected for writes")]
    NoCharacteristic,

    #[error("write failed: {0}")]
    Write(String),

    #[error("cancelled while looking for the device")]
    Cancelled,

    #[error(transparent)]
    Btle(#[from] btleplug::Error),
}

/// Something frames can be written to
///
/// [`Session`] is the real implementation. The control loop is generic over
/// this so it can be driven without a radio.
pub trait LightTransport {
    /// Write one frame to the command characteristic
    fn write(&mut self, frame: &[u8]) -> impl Future<Output = Result<(), Error>> + Send;

    /// Close the connection. Safe to call more than once, never fails.
    fn disconnect(&mut self) -> impl Future<Output = ()> + Send;
}

/// A connected device whose GATT table can be listed and written to
///
/// Implemented by [`Session`]; lets the connect-then-select step be driven
/// without a radio.
pub trait GattClient: LightTransport {
    /// Every characteristic on the device, ordered by service then UUID
    fn characteristics(&self) -> Vec<CharacteristicInfo>;

    /// Use the characteristic `uuid` for all subsequent writes
    fn select_characteristic(&mut self, uuid: Uuid) -> Result<(), Error>;
}

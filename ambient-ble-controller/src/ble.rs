//! BLE session with a light strip
//!
//! Provides functions to connect to a strip by MAC address, list its GATT
//! characteristics, and write command frames to one of them.

use btleplug::api::{
    BDAddr, Central, CharPropFlags, Characteristic, Manager as _, Peripheral as _, ScanFilter,
    WriteType,
};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::str::FromStr;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{Error, GattClient, LightTransport};

/// How often the adapter is polled while looking for the target device
const SCAN_POLL: Duration = Duration::from_millis(250);

/// A GATT characteristic exposed by the connected device
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CharacteristicInfo {
    pub service: Uuid,
    pub uuid: Uuid,
    pub properties: Vec<&'static str>,
}

impl CharacteristicInfo {
    pub fn is_writable(&self) -> bool {
        self.properties
            .iter()
            .any(|p| *p == "write" || *p == "write-without-response")
    }
}

impl From<&Characteristic> for CharacteristicInfo {
    fn from(c: &Characteristic) -> Self {
        Self {
            service: c.service_uuid,
            uuid: c.uuid,
            properties: flag_names(c.properties),
        }
    }
}

fn flag_names(flags: CharPropFlags) -> Vec<&'static str> {
    [
        (CharPropFlags::BROADCAST, "broadcast"),
        (CharPropFlags::READ, "read"),
        (CharPropFlags::WRITE_WITHOUT_RESPONSE, "write-without-response"),
        (CharPropFlags::WRITE, "write"),
        (CharPropFlags::NOTIFY, "notify"),
        (CharPropFlags::INDICATE, "indicate"),
        (CharPropFlags::AUTHENTICATED_SIGNED_WRITES, "signed-write"),
        (CharPropFlags::EXTENDED_PROPERTIES, "extended"),
    ]
    .into_iter()
    .filter(|(flag, _)| flags.contains(*flag))
    .map(|(_, name)| name)
    .collect()
}

/// Parse a `xx:xx:xx:xx:xx:xx` MAC address
pub fn parse_address(s: &str) -> Result<BDAddr, Error> {
    BDAddr::from_str(s.trim()).map_err(|_| Error::InvalidAddress(s.to_string()))
}

/// Parse UUID string into uuid::Uuid
pub fn parse_uuid(s: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(s.trim()).map_err(|_| Error::InvalidUuid(s.to_string()))
}

/// Get the default Bluetooth adapter
pub async fn get_adapter() -> Result<Adapter, Error> {
    let manager = Manager::new().await?;
    let adapters = manager.adapters().await?;
    adapters.into_iter().next().ok_or(Error::NoAdapter)
}

/// Scan until the peripheral with `address` shows up, or `timeout` passes
///
/// Returns [`Error::Cancelled`] if `cancel` fires first.
async fn find_peripheral(
    adapter: &Adapter,
    address: BDAddr,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<Peripheral, Error> {
    adapter.start_scan(ScanFilter::default()).await?;
    let deadline = tokio::time::Instant::now() + timeout;

    let found = loop {
        let peripherals = adapter.peripherals().await?;
        if let Some(p) = peripherals.into_iter().find(|p| p.address() == address) {
            break Ok(p);
        }
        if tokio::time::Instant::now() >= deadline {
            break Err(Error::DeviceNotFound {
                address: address.to_string(),
                secs: timeout.as_secs(),
            });
        }
        tokio::select! {
            _ = cancel.cancelled() => break Err(Error::Cancelled),
            _ = tokio::time::sleep(SCAN_POLL) => {}
        }
    };

    if let Err(e) = adapter.stop_scan().await {
        tracing::debug!("stop_scan failed: {e}");
    }
    found
}

/// A live connection to a strip
///
/// Created by [`Session::connect`]. Writes go to the characteristic chosen
/// with [`GattClient::select_characteristic`].
pub struct Session {
    peripheral: Peripheral,
    address: BDAddr,
    characteristic: Option<Characteristic>,
    connected: bool,
}

impl Session {
    /// Connect to the device at `address` and discover its services
    ///
    /// There is no retry: a device that cannot be found or refuses the
    /// connection is reported as an error. `cancel` only interrupts the scan.
    /// Once the device has been found the connection is always finished, so
    /// the caller gets a session it can shut down.
    pub async fn connect(
        address: &str,
        scan_timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<Self, Error> {
        let address = parse_address(address)?;
        let adapter = get_adapter().await?;

        tracing::info!(%address, "scanning");
        let peripheral = find_peripheral(&adapter, address, scan_timeout, cancel).await?;

        tracing::info!(%address, "connecting");
        let connection_error = |e: btleplug::Error| Error::Connection {
            address: address.to_string(),
            reason: e.to_string(),
        };
        peripheral.connect().await.map_err(connection_error)?;

        let mut session = Self {
            peripheral,
            address,
            characteristic: None,
            connected: true,
        };

        if let Err(e) = session.peripheral.discover_services().await {
            session.disconnect().await;
            return Err(connection_error(e));
        }

        tracing::info!(%address, "connected");
        Ok(session)
    }

    pub fn address(&self) -> BDAddr {
        self.address
    }
}

impl GattClient for Session {
    fn characteristics(&self) -> Vec<CharacteristicInfo> {
        let mut list: Vec<_> = self
            .peripheral
            .characteristics()
            .iter()
            .map(CharacteristicInfo::from)
            .collect();
        list.sort_by_key(|c| (c.service, c.uuid));
        list
    }

    fn select_characteristic(&mut self, uuid: Uuid) -> Result<(), Error> {
        let characteristic = self
            .peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == uuid)
            .ok_or(Error::CharacteristicNotFound(uuid))?;
        self.characteristic = Some(characteristic);
        Ok(())
    }
}

impl LightTransport for Session {
    async fn write(&mut self, frame: &[u8]) -> Result<(), Error> {
        let characteristic = self.characteristic.as_ref().ok_or(Error::NoCharacteristic)?;

        // the strip never answers, so skip the round trip when allowed
        let write_type = if characteristic
            .properties
            .contains(CharPropFlags::WRITE_WITHOUT_RESPONSE)
        {
            WriteType::WithoutResponse
        } else {
            WriteType::WithResponse
        };

        self.peripheral
            .write(characteristic, frame, write_type)
            .await
            .map_err(|e| Error::Write(e.to_string()))
    }

    async fn disconnect(&mut self) {
        if !self.connected {
            return;
        }
        self.connected = false;

        match self.peripheral.disconnect().await {
            Ok(()) => tracing::info!(address = %self.address, "disconnected"),
            Err(e) => tracing::warn!(address = %self.address, "disconnect failed: {e}"),
        }
    }
}

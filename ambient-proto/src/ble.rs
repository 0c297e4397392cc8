//! BLE constants for the strip's receiver
//!
//! Values were read from Bluetooth HCI logs of the vendor app. Other units of
//! the same strip may expose a different write characteristic; run the
//! monitor with `--discover` to list what a device offers.

/// MAC address of the receiver the defaults were captured from
pub const DEFAULT_DEVICE_ADDRESS: &str = "be:89:10:00:f2:ca";

/// Write characteristic UUID: 0000fff3-0000-1000-8000-00805f9b34fb
pub const COMMAND_UUID: &str = "0000fff3-0000-1000-8000-00805f9b34fb";


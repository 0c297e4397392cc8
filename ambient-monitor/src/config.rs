//! Runtime configuration
//!
//! Command-line flags (with environment fallbacks) are parsed into [`Args`]
//! and then validated into a [`MonitorConfig`], which is what the control
//! loop and the sampler take.

use std::time::Duration;

use ambient_proto::{Rgb, ble};
use uuid::Uuid;

use crate::Error;

#[derive(clap::Parser, Debug)]
#[command(name = "ambient-monitor")]
#[command(about = "Mirror the dominant screen color onto a BLE light strip")]
pub struct Args {
    /// MAC address of the strip's BLE receiver
    #[arg(long, env = "AMBIENT_DEVICE_ADDRESS", default_value = ble::DEFAULT_DEVICE_ADDRESS)]
    pub device_address: String,

    /// Characteristic UUID that command frames are written to
    #[arg(long, env = "AMBIENT_CHARACTERISTIC", default_value = ble::COMMAND_UUID)]
    pub characteristic: String,

    /// List the device's characteristics and exit
    #[arg(long)]
    pub discover: bool,

    /// Print discovered characteristics as JSON (when discovering)
    #[arg(long)]
    pub json: bool,

    /// Width of the sampled region, centered on the primary display
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Height of the sampled region, centered on the primary display
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Seconds to wait after connecting before the first write
    #[arg(long, default_value_t = 3.0)]
    pub settle_delay: f64,

    /// Seconds between color updates
    #[arg(long, default_value_t = 0.1)]
    pub interval: f64,

    /// Seconds to look for the device before giving up
    #[arg(long, default_value_t = 10.0)]
    pub scan_timeout: f64,

    /// Stop after this many updates
    #[arg(long)]
    pub frames: Option<u64>,

    /// Send this color (rrggbb) instead of sampling the screen
    #[arg(long)]
    pub color: Option<Rgb>,
}

/// Requested size of the sampled region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CaptureSize {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// A rectangle on the display, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    /// Center `size` on a `screen_width` x `screen_height` display
    ///
    /// A size larger than the display is clamped to the display.
    pub fn centered(screen_width: u32, screen_height: u32, size: CaptureSize) -> Self {
        let width = size.width.min(screen_width);
        let height = size.height.min(screen_height);
        Self {
            left: (screen_width - width) / 2,
            top: (screen_height - height) / 2,
            width,
            height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub device_address: String,
    /// `None` means the characteristic is unknown and discovery should run
    pub characteristic: Option<Uuid>,
    pub capture: CaptureSize,
    pub settle_delay: Duration,
    pub loop_interval: Duration,
    pub scan_timeout: Duration,
    pub max_frames: Option<u64>,
    pub fixed_color: Option<Rgb>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device_address: ble::DEFAULT_DEVICE_ADDRESS.to_string(),
            characteristic: Uuid::parse_str(ble::COMMAND_UUID).ok(),
            capture: CaptureSize::default(),
            settle_delay: Duration::from_secs(3),
            loop_interval: Duration::from_millis(100),
            scan_timeout: Duration::from_secs(10),
            max_frames: None,
            fixed_color: None,
        }
    }
}

impl TryFrom<&Args> for MonitorConfig {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self, Error> {
        let characteristic = match args.characteristic.trim() {
            _ if args.discover => None,
            "" => None,
            s => Some(
                Uuid::parse_str(s)
                    .map_err(|e| Error::Config(format!("characteristic {s:?}: {e}")))?,
            ),
        };

        if args.width == 0 || args.height == 0 {
            return Err(Error::Config(format!(
                "capture region {}x{} is empty",
                args.width, args.height
            )));
        }

        Ok(Self {
            device_address: args.device_address.trim().to_string(),
            characteristic,
            capture: CaptureSize {
                width: args.width,
                height: args.height,
            },
            settle_delay: seconds("settle-delay", args.settle_delay)?,
            loop_interval: seconds("interval", args.interval)?,
            scan_timeout: seconds("scan-timeout", args.scan_timeout)?,
            max_frames: args.frames,
            fixed_color: args.color,
        })
    }
}

fn seconds(name: &str, value: f64) -> Result<Duration, Error> {
    Duration::try_from_secs_f64(value)
        .map_err(|_| Error::Config(format!("{name} must be a non-negative number of seconds, got {value}")))
}

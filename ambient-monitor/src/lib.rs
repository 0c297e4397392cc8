//! Ambient Monitor - screen color to BLE light strip
//!
//! Samples a region of the primary display, reduces it to one dominant
//! color, and streams that color to a strip as set-color frames. Every exit
//! path after a successful connection turns the strip off and disconnects.

pub mod config;
pub mod control;
pub mod extractor;
pub mod sampler;
pub mod signal;
pub mod source;

pub use config::{Args, CaptureSize, MonitorConfig, Region};
pub use control::{
    Outcome, State, discover, discover_client, run, run_client, run_session,
};
pub use extractor::{ExtractionError, dominant_color};
pub use sampler::ScreenSampler;
pub use source::{ColorSource, FixedColor, ScreenColorSource};

pub use ambient_ble_controller as ble;
pub use ambient_proto::{Command, Rgb};

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("connection failed: {0}")]
    Connection(#[source] ble::Error),

    #[error("write failed: {0}")]
    Write(#[source] ble::Error),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("invalid configuration: {0}")]
    Config(String),
}

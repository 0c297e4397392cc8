//! Ambient light wire protocol - command frames and colors
//!
//! The strip firmware accepts fixed-layout frames that start with `0x7E` and
//! end with `0xEF`. The bytes in between were lifted from Bluetooth captures
//! of the vendor app and are reproduced as-is.

pub mod ble;

use std::fmt;

use data_encoding::{HEXLOWER, HEXLOWER_PERMISSIVE};

/// Start byte shared by every frame
pub const FRAME_START: u8 = 0x7E;

/// End byte shared by every frame
pub const FRAME_END: u8 = 0xEF;

/// Power on: `7e 04 04 f0 00 01 ff 00 ef`
pub const ON_FRAME: [u8; 9] = [0x7E, 0x04, 0x04, 0xF0, 0x00, 0x01, 0xFF, 0x00, 0xEF];

/// Power off: `7e 04 04 00 00 00 ff 00 ef`
pub const OFF_FRAME: [u8; 9] = [0x7E, 0x04, 0x04, 0x00, 0x00, 0x00, 0xFF, 0x00, 0xEF];

/// Bytes preceding the color channels in a set-color frame
pub const COLOR_PREFIX: [u8; 4] = [0x7E, 0x07, 0x05, 0x03];

/// Bytes following the color channels in a set-color frame
pub const COLOR_SUFFIX: [u8; 2] = [0x10, 0xEF];

/// Length of a set-color frame
pub const COLOR_FRAME_LEN: usize = COLOR_PREFIX.len() + 3 + COLOR_SUFFIX.len();

/// 8-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Lower-case `rrggbb`, zero padded
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&[self.r, self.g, self.b])
    }

    /// Parse `rrggbb` or `#rrggbb` (either case)
    pub fn from_hex(s: &str) -> Result<Self, ParseColorError> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);
        if s.len() != 6 {
            return Err(ParseColorError::Length(s.len()));
        }

        let bytes = HEXLOWER_PERMISSIVE.decode(s.as_bytes())?;
        match bytes[..] {
            [r, g, b] => Ok(Self { r, g, b }),
            _ => Err(ParseColorError::Length(s.len())),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl std::str::FromStr for Rgb {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

/// Error returned by [`Rgb::from_hex`]
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseColorError {
    #[error("expected 6 hex digits (rrggbb), got {0} characters")]
    Length(usize),

    #[error("invalid hex color: {0}")]
    Hex(#[from] data_encoding::DecodeError),
}

/// A command understood by the strip
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    On,
    Off,
    SetColor(Rgb),
}

impl Command {
    /// Encode into the frame the firmware expects
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Command::On => ON_FRAME.to_vec(),
            Command::Off => OFF_FRAME.to_vec(),
            Command::SetColor(rgb) => encode_color(*rgb).to_vec(),
        }
    }

    /// Lower-case hex rendering of the encoded frame, for logs
    pub fn to_hex(&self) -> String {
        HEXLOWER.encode(&self.encode())
    }
}

/// Set-color frame: `7e 07 05 03 <r> <g> <b> 10 ef`
pub fn encode_color(rgb: Rgb) -> [u8; COLOR_FRAME_LEN] {
    let mut frame = [0u8; COLOR_FRAME_LEN];
    frame[..4].copy_from_slice(&COLOR_PREFIX);
    frame[4] = rgb.r;
    frame[5] = rgb.g;
    frame[6] = rgb.b;
    frame[7..].copy_from_slice(&COLOR_SUFFIX);
    frame
}

/// Power-on frame
pub fn encode_on() -> [u8; 9] {
    ON_FRAME
}

/// Power-off frame
pub fn encode_off() -> [u8; 9] {
    OFF_FRAME
}

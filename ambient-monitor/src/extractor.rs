//! Dominant color of a captured frame
//!
//! Uses the modified median cut quantizer from `color-thief`. The first
//! palette entry is the color that covers the most of the frame.

use ambient_proto::Rgb;
use color_thief::ColorFormat;

/// 1 samples every pixel
const QUALITY: u8 = 1;

/// Palette size the dominant color is picked from
const PALETTE_SIZE: u8 = 5;

#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("no display found")]
    NoMonitor,

    #[error("screen capture failed: {0}")]
    Capture(#[from] xcap::XCapError),

    #[error("captured frame is empty")]
    EmptyFrame,

    #[error("color quantization failed: {0}")]
    Quantize(String),
}

/// Dominant color of tightly packed RGBA pixels
pub fn dominant_color(rgba: &[u8]) -> Result<Rgb, ExtractionError> {
    if rgba.len() < 4 {
        return Err(ExtractionError::EmptyFrame);
    }

    let palette = color_thief::get_palette(rgba, ColorFormat::Rgba, QUALITY, PALETTE_SIZE)
        .map_err(|e| ExtractionError::Quantize(format!("{e:?}")))?;

    // fully white or transparent frames leave nothing to quantize
    palette
        .first()
        .map(|c| Rgb::new(c.r, c.g, c.b))
        .ok_or(ExtractionError::EmptyFrame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(pixels: &[(Rgb, usize)]) -> Vec<u8> {
        pixels
            .iter()
            .flat_map(|(c, n)| std::iter::repeat_n([c.r, c.g, c.b, 255], *n))
            .flatten()
            .collect()
    }

    #[test]
    fn empty_frame_is_an_error() {
        assert!(matches!(dominant_color(&[]), Err(ExtractionError::EmptyFrame)));
    }

    #[test]
    fn majority_color_wins() {
        let pixels = frame(&[
            (Rgb::new(20, 40, 220), 3000),
            (Rgb::new(220, 30, 30), 1000),
        ]);
        let color = dominant_color(&pixels).unwrap();
        assert!(color.b > color.r, "expected a blue result, got {color}");
    }

    #[test]
    fn mostly_red_frame_is_red() {
        let pixels = frame(&[
            (Rgb::new(200, 10, 10), 5000),
            (Rgb::new(10, 200, 10), 500),
        ]);
        let color = dominant_color(&pixels).unwrap();
        assert!(color.r > color.g && color.r > color.b, "expected red, got {color}");
    }
}

//! Where each iteration's color comes from

use ambient_proto::Rgb;

use crate::extractor::{ExtractionError, dominant_color};
use crate::sampler::ScreenSampler;

/// Produces one color per control loop iteration
pub trait ColorSource {
    fn next_color(&mut self) -> Result<Rgb, ExtractionError>;
}

/// Dominant color of a screen region
pub struct ScreenColorSource {
    sampler: ScreenSampler,
}

impl ScreenColorSource {
    pub fn new(sampler: ScreenSampler) -> Self {
        Self { sampler }
    }
}

impl ColorSource for ScreenColorSource {
    fn next_color(&mut self) -> Result<Rgb, ExtractionError> {
        let pixels = self.sampler.capture()?;
        dominant_color(pixels)
    }
}

/// The same color every time, for checking a strip without a display
#[derive(Debug, Clone, Copy)]
pub struct FixedColor(pub Rgb);

impl ColorSource for FixedColor {
    fn next_color(&mut self) -> Result<Rgb, ExtractionError> {
        Ok(self.0)
    }
}

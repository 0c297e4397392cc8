//! Screen capture of a fixed region of the primary display

use image::RgbaImage;
use xcap::Monitor;

use crate::config::{CaptureSize, Region};
use crate::extractor::ExtractionError;

/// Captures one region of the primary display
///
/// The region is fixed when the sampler is created. Pixels are copied into a
/// buffer owned by the sampler, which is reused from frame to frame.
pub struct ScreenSampler {
    monitor: Monitor,
    region: Region,
    buffer: Vec<u8>,
}

impl ScreenSampler {
    /// Sample a `size` region centered on the primary display
    pub fn primary(size: CaptureSize) -> Result<Self, ExtractionError> {
        let mut monitors = Monitor::all()?;
        if monitors.is_empty() {
            return Err(ExtractionError::NoMonitor);
        }
        let index = monitors.iter().position(|m| m.is_primary()).unwrap_or(0);
        let monitor = monitors.swap_remove(index);

        let region = Region::centered(monitor.width(), monitor.height(), size);
        if region.is_empty() {
            return Err(ExtractionError::EmptyFrame);
        }

        tracing::info!(
            monitor = monitor.name(),
            left = region.left,
            top = region.top,
            width = region.width,
            height = region.height,
            "sampling screen region"
        );

        Ok(Self {
            monitor,
            region,
            buffer: Vec::with_capacity(region.width as usize * region.height as usize * 4),
        })
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// Capture the region, returning its RGBA pixels row by row
    pub fn capture(&mut self) -> Result<&[u8], ExtractionError> {
        let image = self.monitor.capture_image()?;
        copy_region(&image, self.region, &mut self.buffer);
        if self.buffer.is_empty() {
            return Err(ExtractionError::EmptyFrame);
        }
        Ok(&self.buffer)
    }
}

/// Copy `region` of `image` into `buffer`, replacing its contents
///
/// The region is clipped to the image, since a display can change size
/// after the region was computed.
fn copy_region(image: &RgbaImage, region: Region, buffer: &mut Vec<u8>) {
    buffer.clear();

    let (image_width, image_height) = image.dimensions();
    let right = (region.left + region.width).min(image_width);
    let bottom = (region.top + region.height).min(image_height);
    if region.left >= right || region.top >= bottom {
        return;
    }

    let raw = image.as_raw();
    let row_len = (right - region.left) as usize * 4;
    for y in region.top..bottom {
        let start = (y as usize * image_width as usize + region.left as usize) * 4;
        buffer.extend_from_slice(&raw[start..start + row_len]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| image::Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn copies_only_the_region() {
        let image = gradient(8, 6);
        let region = Region { left: 2, top: 1, width: 3, height: 2 };
        let mut buffer = Vec::new();
        copy_region(&image, region, &mut buffer);

        assert_eq!(buffer.len(), 3 * 2 * 4);
        let pixels: Vec<(u8, u8)> = buffer.chunks(4).map(|p| (p[0], p[1])).collect();
        assert_eq!(pixels, vec![(2, 1), (3, 1), (4, 1), (2, 2), (3, 2), (4, 2)]);
    }

    #[test]
    fn buffer_is_reused() {
        let image = gradient(4, 4);
        let region = Region { left: 0, top: 0, width: 4, height: 4 };
        let mut buffer = Vec::with_capacity(64);
        let ptr = buffer.as_ptr();

        copy_region(&image, region, &mut buffer);
        copy_region(&image, region, &mut buffer);

        assert_eq!(buffer.len(), 64);
        assert_eq!(buffer.as_ptr(), ptr);
    }

    #[test]
    fn region_outside_image_is_clipped() {
        let image = gradient(4, 4);
        let mut buffer = vec![1, 2, 3];

        copy_region(&image, Region { left: 2, top: 2, width: 10, height: 10 }, &mut buffer);
        assert_eq!(buffer.len(), 2 * 2 * 4);

        copy_region(&image, Region { left: 9, top: 0, width: 2, height: 2 }, &mut buffer);
        assert!(buffer.is_empty());
    }
}

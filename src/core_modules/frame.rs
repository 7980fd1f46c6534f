// THEORY:
// The `frame` module is the entry point of raw camera data into the engine. A
// `Frame` is a "dumb", borrowed view over a packed pixel buffer: it knows its
// dimensions and its channel layout, and nothing about time or neighbours.
//
// Key architectural principles:
// 1.  **Zero-Copy Input**: Capture libraries already own the pixel memory. A
//     `Frame` only borrows it, so a camera buffer can be analysed in place.
// 2.  **Validated Shape**: The buffer length is checked once, at construction.
//     Every later stage may index the buffer without re-checking bounds.
// 3.  **Single-Pixel Heuristics Only**: Grayscale conversion (Rec. 601 luma)
//     and mean brightness are computed per pixel or per frame. Comparing two
//     frames belongs to the motion detector, not here.

use crate::error::FrameError;
use image::{GrayImage, Luma, RgbImage};

/// Byte order of the pixels in a frame buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    /// Three bytes per pixel, blue first (the OpenCV default).
    Bgr,
    /// Three bytes per pixel, red first.
    Rgb,
    /// One intensity byte per pixel.
    Gray,
}

impl PixelLayout {
    pub fn channels(self) -> usize {
        match self {
            PixelLayout::Bgr | PixelLayout::Rgb => 3,
            PixelLayout::Gray => 1,
        }
    }
}

/// A read-only view of one captured image.
#[derive(Debug, Clone, Copy)]
pub struct Frame<'a> {
    width: u32,
    height: u32,
    layout: PixelLayout,
    data: &'a [u8],
}

impl<'a> Frame<'a> {
    pub fn new(
        width: u32,
        height: u32,
        layout: PixelLayout,
        data: &'a [u8],
    ) -> Result<Self, FrameError> {
        if width == 0 || height == 0 {
            return Err(FrameError::EmptyDimensions { width, height });
        }
        let channels = layout.channels();
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(FrameError::BufferSize {
                got: data.len(),
                expected,
                width,
                height,
                channels,
            });
        }
        Ok(Self {
            width,
            height,
            layout,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn layout(&self) -> PixelLayout {
        self.layout
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Converts the frame to single-channel luma using Rec. 601 weights,
    /// rounded to the nearest intensity.
    pub fn to_luma(&self) -> GrayImage {
        let luma: Vec<u8> = match self.layout {
            PixelLayout::Gray => self.data.to_vec(),
            PixelLayout::Bgr => self
                .data
                .chunks_exact(3)
                .map(|px| luminance(px[2], px[1], px[0]))
                .collect(),
            PixelLayout::Rgb => self
                .data
                .chunks_exact(3)
                .map(|px| luminance(px[0], px[1], px[2]))
                .collect(),
        };
        // Length was validated in `new`, so the buffer always fits.
        GrayImage::from_raw(self.width, self.height, luma)
            .unwrap_or_else(|| GrayImage::from_pixel(self.width, self.height, Luma([0])))
    }

    /// Average of every channel byte in the frame. A camera that is still
    /// warming up (or a covered lens) reports values close to zero.
    pub fn mean_brightness(&self) -> f64 {
        let sum: u64 = self.data.iter().map(|&b| b as u64).sum();
        sum as f64 / self.data.len() as f64
    }
}

fn luminance(red: u8, green: u8, blue: u8) -> u8 {
    let y = 0.299_f32 * red as f32 + 0.587_f32 * green as f32 + 0.114_f32 * blue as f32;
    y.round().clamp(0.0, 255.0) as u8
}

/// Anything that can lend out a `Frame` view of its pixels.
///
/// Capture backends implement this for their native image type so the
/// session loop can hand frames to the detector without copying them.
pub trait AsFrame {
    fn as_frame(&self) -> Result<Frame<'_>, FrameError>;
}

impl AsFrame for RgbImage {
    fn as_frame(&self) -> Result<Frame<'_>, FrameError> {
        Frame::new(self.width(), self.height(), PixelLayout::Rgb, self.as_raw())
    }
}

impl AsFrame for GrayImage {
    fn as_frame(&self) -> Result<Frame<'_>, FrameError> {
        Frame::new(self.width(), self.height(), PixelLayout::Gray, self.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn rejects_wrong_buffer_length() {
        let data = vec![0u8; 10];
        let result = Frame::new(2, 2, PixelLayout::Bgr, &data);
        assert!(matches!(
            result,
            Err(FrameError::BufferSize { got: 10, expected: 12, .. })
        ));
    }

    #[test]
    fn rejects_empty_dimensions() {
        let result = Frame::new(0, 4, PixelLayout::Gray, &[]);
        assert!(matches!(result, Err(FrameError::EmptyDimensions { .. })));
    }

    #[test]
    fn bgr_and_rgb_agree_on_luma() {
        // Pure red in both byte orders.
        let bgr = [0u8, 0, 255];
        let rgb = [255u8, 0, 0];
        let a = Frame::new(1, 1, PixelLayout::Bgr, &bgr).unwrap().to_luma();
        let b = Frame::new(1, 1, PixelLayout::Rgb, &rgb).unwrap().to_luma();
        assert_eq!(a.get_pixel(0, 0), b.get_pixel(0, 0));
        assert_eq!(a.get_pixel(0, 0).0[0], 76);
    }

    #[test]
    fn white_stays_white() {
        let img = RgbImage::from_pixel(3, 2, Rgb([255, 255, 255]));
        let luma = img.as_frame().unwrap().to_luma();
        assert!(luma.pixels().all(|p| p.0[0] == 255));
    }

    #[test]
    fn mean_brightness_of_dark_frame() {
        let img = RgbImage::from_pixel(4, 4, Rgb([1, 2, 3]));
        let frame = img.as_frame().unwrap();
        assert!((frame.mean_brightness() - 2.0).abs() < 1e-9);
    }
}

//! Onyx Image
//!
//! Album art pipeline: fetch encoded bytes from an [`ArtSource`], decode
//! them to RGBA8, and scale them to fit a tile.
//!
//! Scaling comes in two qualities. [`ScaleQuality::Fast`] resizes in a
//! single pass. [`ScaleQuality::High`] halves the image repeatedly (never
//! going below the target) and then finishes with a last pass, which keeps
//! detail that a single large-ratio bicubic pass would alias away.
//!
//! # Example
//!
//! ```ignore
//! use onyx_image::{ArtImage, ScaleQuality};
//!
//! let art = ArtImage::decode(&bytes)?;
//! let thumb = art.scale_to_fit(100, ScaleQuality::High)?;
//! ```

mod error;
mod source;

pub use error::{ImageError, Result};
pub use source::{ArtSource, DirectoryArtSource, MemoryArtSource};

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};
use serde::{Deserialize, Serialize};

/// Downscaling strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleQuality {
    /// One resize straight to the target size
    Fast,
    /// Successive halvings followed by a final pass
    #[default]
    High,
}

/// Decoded straight-alpha RGBA8 image
#[derive(Debug, Clone, PartialEq)]
pub struct ArtImage {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl ArtImage {
    /// Create from raw RGBA pixels
    pub fn from_rgba(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected_len = width as usize * height as usize * 4;
        if pixels.len() != expected_len {
            return Err(ImageError::Decode(format!(
                "Invalid pixel data length: expected {}, got {}",
                expected_len,
                pixels.len()
            )));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Decode PNG or JPEG bytes
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::from_dynamic(img))
    }

    fn from_dynamic(img: DynamicImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            pixels: img.to_rgba8().into_raw(),
            width,
            height,
        }
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn to_rgba_image(&self) -> Result<RgbaImage> {
        RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| ImageError::Decode("Invalid pixel buffer".to_string()))
    }

    /// Resize to exactly `width` x `height`
    pub fn scale(&self, width: u32, height: u32, quality: ScaleQuality) -> Result<Self> {
        scale(self, width, height, quality)
    }

    /// Shrink (never enlarge) so neither side exceeds `max_dim`
    pub fn scale_to_fit(&self, max_dim: u32, quality: ScaleQuality) -> Result<Self> {
        let factor = fit_factor(self.width, self.height, max_dim);
        if factor >= 1.0 {
            return Ok(self.clone());
        }
        let width = ((self.width as f32 * factor).round() as u32).max(1);
        let height = ((self.height as f32 * factor).round() as u32).max(1);
        self.scale(width, height, quality)
    }
}

/// Factor that fits `width` x `height` inside `max_dim` x `max_dim`,
/// capped at 1 so small art is never enlarged
pub fn fit_factor(width: u32, height: u32, max_dim: u32) -> f32 {
    if width == 0 || height == 0 {
        return 1.0;
    }
    let max_dim = max_dim as f32;
    1.0f32
        .min(max_dim / height as f32)
        .min(max_dim / width as f32)
}

/// Sizes visited by the high-quality path, ending at the target
pub fn halving_steps(width: u32, height: u32, target_width: u32, target_height: u32) -> Vec<(u32, u32)> {
    let (mut w, mut h) = (width, height);
    let mut steps = Vec::new();
    loop {
        if w > target_width {
            w = (w / 2).max(target_width);
        } else {
            w = target_width;
        }
        if h > target_height {
            h = (h / 2).max(target_height);
        } else {
            h = target_height;
        }
        steps.push((w, h));
        if w == target_width && h == target_height {
            return steps;
        }
    }
}

/// Resize `image` to exactly `width` x `height`
pub fn scale(image: &ArtImage, width: u32, height: u32, quality: ScaleQuality) -> Result<ArtImage> {
    if width == 0 || height == 0 {
        return Err(ImageError::EmptyTarget(width, height));
    }
    if image.width == width && image.height == height {
        return Ok(image.clone());
    }

    let mut current = image.to_rgba_image()?;
    match quality {
        ScaleQuality::Fast => {
            current = image::imageops::resize(&current, width, height, FilterType::Triangle);
        }
        ScaleQuality::High => {
            let steps = halving_steps(image.width, image.height, width, height);
            tracing::trace!(
                "scale: {}x{} -> {}x{} in {} passes",
                image.width,
                image.height,
                width,
                height,
                steps.len()
            );
            for (w, h) in steps {
                current = image::imageops::resize(&current, w, h, FilterType::CatmullRom);
            }
        }
    }

    let (w, h) = current.dimensions();
    ArtImage::from_rgba(current.into_raw(), w, h)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn checker(width: u32, height: u32) -> ArtImage {
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 255 } else { 0 };
                pixels.extend_from_slice(&[v, v, v, 255]);
            }
        }
        ArtImage::from_rgba(pixels, width, height).unwrap()
    }

    fn encode_png(image: &ArtImage) -> Vec<u8> {
        let rgba = RgbaImage::from_raw(image.width(), image.height(), image.pixels().to_vec()).unwrap();
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(rgba)
            .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_round_trip_dimensions() {
        let art = checker(12, 7);
        let decoded = ArtImage::decode(&encode_png(&art)).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
        assert_eq!(decoded.pixels(), art.pixels());
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(matches!(
            ArtImage::decode(b"definitely not a png"),
            Err(ImageError::Decode(_))
        ));
    }

    #[test]
    fn test_fit_factor() {
        assert_eq!(fit_factor(400, 200, 100), 0.25);
        assert_eq!(fit_factor(200, 400, 100), 0.25);
        assert_eq!(fit_factor(50, 80, 100), 1.0);
        assert_eq!(fit_factor(0, 80, 100), 1.0);
    }

    #[test]
    fn test_halving_steps_never_undershoot() {
        assert_eq!(
            halving_steps(500, 500, 100, 100),
            vec![(250, 250), (125, 125), (100, 100)]
        );
        assert_eq!(halving_steps(300, 120, 100, 100), vec![(150, 100), (100, 100)]);
        // Enlarging goes straight to the target
        assert_eq!(halving_steps(40, 40, 100, 100), vec![(100, 100)]);
    }

    #[test]
    fn test_scale_qualities_hit_target() {
        let art = checker(64, 48);
        for quality in [ScaleQuality::Fast, ScaleQuality::High] {
            let scaled = art.scale(16, 12, quality).unwrap();
            assert_eq!((scaled.width(), scaled.height()), (16, 12));
            assert_eq!(scaled.pixels().len(), 16 * 12 * 4);
        }
    }

    #[test]
    fn test_scale_to_fit_keeps_aspect_and_never_enlarges() {
        let art = checker(400, 200);
        let fitted = art.scale_to_fit(100, ScaleQuality::High).unwrap();
        assert_eq!((fitted.width(), fitted.height()), (100, 50));

        let small = checker(30, 20);
        assert_eq!(small.scale_to_fit(100, ScaleQuality::Fast).unwrap(), small);
    }

    #[test]
    fn test_empty_target_is_rejected() {
        let art = checker(4, 4);
        assert!(matches!(
            art.scale(0, 4, ScaleQuality::Fast),
            Err(ImageError::EmptyTarget(0, 4))
        ));
    }
}

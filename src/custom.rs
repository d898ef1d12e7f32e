//! User-described filters.
//!
//! A custom filter is read from a small JSON document instead of being
//! compiled in. It may carry a 3×3 convolution kernel, a 4×4 color matrix
//! with an offset, or both; the kernel runs first. `intensity` mixes the
//! processed color back with the original.
//!
//! ```json
//! {
//!   "name": "sepia",
//!   "color_matrix": [
//!     [0.3588, 0.7044, 0.1368, 0.0],
//!     [0.2990, 0.5870, 0.1140, 0.0],
//!     [0.2392, 0.4696, 0.0912, 0.0],
//!     [0.0,    0.0,    0.0,    1.0]
//!   ],
//!   "intensity": 1.0
//! }
//! ```
use std::fs;
use std::path::Path;
use std::str::FromStr;

use image::Rgba;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::filter::{is_empty, Filter, RgbaImage};

pub type Kernel = [[f32; 3]; 3];
pub type ColorMatrix = [[f32; 4]; 4];

fn default_name() -> String {
    "custom".to_string()
}

fn default_intensity() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomFilterDescriptor {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub convolution: Option<Kernel>,
    #[serde(default)]
    pub color_matrix: Option<ColorMatrix>,
    /// Added after the color matrix, in normalized `[0, 1]` units.
    #[serde(default)]
    pub offset: [f32; 4],
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomFilter {
    descriptor: CustomFilterDescriptor,
}

impl CustomFilter {
    pub fn from_descriptor(descriptor: CustomFilterDescriptor) -> Result<Self> {
        if descriptor.convolution.is_none() && descriptor.color_matrix.is_none() {
            return Err(Error::InvalidFilter(format!(
                "{}: needs a `convolution` kernel or a `color_matrix`",
                descriptor.name
            )));
        }
        if !descriptor.intensity.is_finite() {
            return Err(Error::InvalidFilter(format!(
                "{}: intensity must be finite",
                descriptor.name
            )));
        }
        Ok(Self { descriptor })
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading custom filter from {}", path.display());
        fs::read_to_string(path)?.parse()
    }

    pub fn descriptor(&self) -> &CustomFilterDescriptor {
        &self.descriptor
    }

    fn convolve(&self, img: &RgbaImage, kernel: &Kernel) -> RgbaImage {
        let (width, height) = img.dimensions();
        let mut output_buffer = RgbaImage::new(width, height);
        for (x, y, output_pixel) in output_buffer.enumerate_pixels_mut() {
            let mut sum = [0.0f32; 3];
            for (ky, row) in kernel.iter().enumerate() {
                for (kx, weight) in row.iter().enumerate() {
                    let sx = (x as i64 + kx as i64 - 1).clamp(0, width as i64 - 1) as u32;
                    let sy = (y as i64 + ky as i64 - 1).clamp(0, height as i64 - 1) as u32;
                    let sample = img.get_pixel(sx, sy).0;
                    for c in 0..3 {
                        sum[c] += weight * sample[c] as f32;
                    }
                }
            }
            let alpha = img.get_pixel(x, y).0[3];
            *output_pixel = Rgba([
                sum[0].round().clamp(0.0, 255.0) as u8,
                sum[1].round().clamp(0.0, 255.0) as u8,
                sum[2].round().clamp(0.0, 255.0) as u8,
                alpha,
            ]);
        }
        output_buffer
    }

    fn apply_matrix(pixel: Rgba<u8>, matrix: &ColorMatrix, offset: &[f32; 4]) -> [f32; 4] {
        let input = pixel.0.map(|c| c as f32 / 255.0);
        let mut out = [0.0f32; 4];
        for (row, value) in matrix.iter().zip(out.iter_mut()) {
            *value = row.iter().zip(input.iter()).map(|(m, c)| m * c).sum();
        }
        for (value, o) in out.iter_mut().zip(offset) {
            *value += o;
        }
        out
    }
}

impl FromStr for CustomFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_descriptor(serde_json::from_str(s)?)
    }
}

impl Filter for CustomFilter {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn image_by_filtering(&self, img: &RgbaImage) -> Option<RgbaImage> {
        if is_empty(img) {
            return None;
        }
        let convolved = self
            .descriptor
            .convolution
            .as_ref()
            .map(|kernel| self.convolve(img, kernel));
        let processed = convolved.as_ref().unwrap_or(img);

        let intensity = self.descriptor.intensity;
        let mut output_buffer = RgbaImage::new(img.width(), img.height());
        for (x, y, pixel) in processed.enumerate_pixels() {
            let filtered = match &self.descriptor.color_matrix {
                Some(matrix) => Self::apply_matrix(*pixel, matrix, &self.descriptor.offset),
                None => pixel.0.map(|c| c as f32 / 255.0),
            };
            let original = img.get_pixel(x, y).0;
            let mut mixed = [0u8; 4];
            for c in 0..4 {
                let o = original[c] as f32 / 255.0;
                let v = o + (filtered[c] - o) * intensity;
                mixed[c] = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
            output_buffer.put_pixel(x, y, Rgba(mixed));
        }
        Some(output_buffer)
    }
}

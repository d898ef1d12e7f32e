use std::path::PathBuf;
use std::str::FromStr;

use image::{ImageBuffer, Rgba};
use palette::Srgb;

use crate::custom::CustomFilter;
use crate::error::{Error, Result};

pub type RgbaImage = ImageBuffer<Rgba<u8>, Vec<u8>>;

pub const EDGE_STRENGTH: f32 = 1.0;
pub const FRACTIONAL_WIDTH_OF_A_PIXEL: f32 = 0.05;

/// A named image transformation.
///
/// Filters are immutable once configured and may be applied any number of
/// times, on their own or as a stage of a [`FilterChain`](crate::chain::FilterChain).
pub trait Filter {
    fn name(&self) -> &str;

    /// Filters `image` into a new buffer. `None` means the filter produced no
    /// output, which is the case for every filter on a zero-area input.
    fn image_by_filtering(&self, image: &RgbaImage) -> Option<RgbaImage>;
}

impl<F: Filter + ?Sized> Filter for &F {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn image_by_filtering(&self, image: &RgbaImage) -> Option<RgbaImage> {
        (**self).image_by_filtering(image)
    }
}

impl<F: Filter + ?Sized> Filter for Box<F> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn image_by_filtering(&self, image: &RgbaImage) -> Option<RgbaImage> {
        (**self).image_by_filtering(image)
    }
}

pub fn is_empty(image: &RgbaImage) -> bool {
    image.width() == 0 || image.height() == 0
}

/// Luminance weights applied directly to the gamma-encoded channels.
pub const LUMINANCE_WEIGHTING: [f32; 3] = [0.2125, 0.7154, 0.0721];

/// Weighted sum of the sRGB-encoded channels, in `[0, 1]`. No linearization
/// happens, so midtones match the usual shader-side grayscale.
pub fn luminance(pixel: &Rgba<u8>) -> f32 {
    let [r, g, b, _] = pixel.0;
    let rgb: Srgb<f32> = Srgb::new(r, g, b).into_format();
    let [wr, wg, wb] = LUMINANCE_WEIGHTING;
    (rgb.red * wr + rgb.green * wg + rgb.blue * wb).clamp(0.0, 1.0)
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SobelEdgeDetection {
    pub edge_strength: f32,
}

impl Default for SobelEdgeDetection {
    fn default() -> Self {
        Self {
            edge_strength: EDGE_STRENGTH,
        }
    }
}

impl SobelEdgeDetection {
    pub fn new(edge_strength: f32) -> Self {
        Self { edge_strength }
    }
}

impl Filter for SobelEdgeDetection {
    fn name(&self) -> &str {
        "sobel"
    }

    fn image_by_filtering(&self, img: &RgbaImage) -> Option<RgbaImage> {
        if is_empty(img) {
            return None;
        }
        let (width, height) = img.dimensions();
        let luma: Vec<f32> = img.pixels().map(luminance).collect();
        // clamp-to-edge sampling
        let at = |x: i64, y: i64| {
            let x = x.clamp(0, width as i64 - 1) as usize;
            let y = y.clamp(0, height as i64 - 1) as usize;
            luma[y * width as usize + x]
        };

        let mut output_buffer = RgbaImage::new(width, height);
        for (x, y, output_pixel) in output_buffer.enumerate_pixels_mut() {
            let (x, y) = (x as i64, y as i64);
            let top_left = at(x - 1, y - 1);
            let top = at(x, y - 1);
            let top_right = at(x + 1, y - 1);
            let left = at(x - 1, y);
            let right = at(x + 1, y);
            let bottom_left = at(x - 1, y + 1);
            let bottom = at(x, y + 1);
            let bottom_right = at(x + 1, y + 1);

            let h = -top_left - 2.0 * left - bottom_left + top_right + 2.0 * right + bottom_right;
            let v = -top_left - 2.0 * top - top_right + bottom_left + 2.0 * bottom + bottom_right;
            let magnitude = to_u8(self.edge_strength * (h * h + v * v).sqrt());

            *output_pixel = Rgba([magnitude, magnitude, magnitude, 255]);
        }
        Some(output_buffer)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pixellate {
    /// Block size as a fraction of the image width.
    pub fractional_width_of_a_pixel: f32,
}

impl Default for Pixellate {
    fn default() -> Self {
        Self {
            fractional_width_of_a_pixel: FRACTIONAL_WIDTH_OF_A_PIXEL,
        }
    }
}

impl Pixellate {
    pub fn new(fractional_width_of_a_pixel: f32) -> Self {
        Self {
            fractional_width_of_a_pixel,
        }
    }

    /// Side of a square block in pixels for an image `width` pixels wide.
    pub fn block_size(&self, width: u32) -> u32 {
        let fraction = self.fractional_width_of_a_pixel.clamp(0.0, 1.0);
        ((fraction * width as f32).round() as u32).max(1)
    }
}

impl Filter for Pixellate {
    fn name(&self) -> &str {
        "pixellate"
    }

    fn image_by_filtering(&self, img: &RgbaImage) -> Option<RgbaImage> {
        if is_empty(img) {
            return None;
        }
        let (width, height) = img.dimensions();
        let block = self.block_size(width);

        let mut output_buffer = RgbaImage::new(width, height);
        for (x, y, output_pixel) in output_buffer.enumerate_pixels_mut() {
            // sample the center of the block, clamped for partial blocks
            let sample_x = (x / block * block + block / 2).min(width - 1);
            let sample_y = (y / block * block + block / 2).min(height - 1);
            *output_pixel = *img.get_pixel(sample_x, sample_y);
        }
        Some(output_buffer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Grayscale;

impl Filter for Grayscale {
    fn name(&self) -> &str {
        "grayscale"
    }

    fn image_by_filtering(&self, img: &RgbaImage) -> Option<RgbaImage> {
        if is_empty(img) {
            return None;
        }
        let mut output_buffer = RgbaImage::new(img.width(), img.height());
        for (x, y, pixel) in img.enumerate_pixels() {
            let value = to_u8(luminance(pixel));
            output_buffer.put_pixel(x, y, Rgba([value, value, value, pixel.0[3]]));
        }
        Some(output_buffer)
    }
}

/// Textual filter reference, e.g. `sobel`, `sobel=2`, `pixellate=0.02`,
/// `grayscale` or `custom=filters/sepia.json`.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterSpec {
    Sobel(f32),
    Pixellate(f32),
    Grayscale,
    Custom(PathBuf),
}

impl FilterSpec {
    pub fn build(&self) -> Result<Box<dyn Filter>> {
        Ok(match self {
            FilterSpec::Sobel(strength) => Box::new(SobelEdgeDetection::new(*strength)),
            FilterSpec::Pixellate(fraction) => Box::new(Pixellate::new(*fraction)),
            FilterSpec::Grayscale => Box::new(Grayscale),
            FilterSpec::Custom(path) => Box::new(CustomFilter::from_file(path)?),
        })
    }
}

impl FromStr for FilterSpec {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (name, value) = match s.split_once('=') {
            Some((name, value)) => (name.trim(), Some(value.trim())),
            None => (s.trim(), None),
        };
        let number = |default: f32| -> Result<f32> {
            match value {
                None => Ok(default),
                Some(v) => v
                    .parse()
                    .map_err(|_| Error::InvalidFilter(format!("{name}: not a number: {v}"))),
            }
        };

        match name {
            "sobel" | "edge" => Ok(FilterSpec::Sobel(number(EDGE_STRENGTH)?)),
            "pixellate" => Ok(FilterSpec::Pixellate(number(FRACTIONAL_WIDTH_OF_A_PIXEL)?)),
            "grayscale" => match value {
                None => Ok(FilterSpec::Grayscale),
                Some(_) => Err(Error::InvalidFilter("grayscale takes no parameter".into())),
            },
            "custom" => match value {
                Some(path) if !path.is_empty() => Ok(FilterSpec::Custom(PathBuf::from(path))),
                _ => Err(Error::InvalidFilter("custom needs a file: custom=PATH".into())),
            },
            other => Err(Error::InvalidFilter(format!("unknown filter `{other}`"))),
        }
    }
}

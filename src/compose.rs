//! Diagnostic composites for comparing a filter's input and output.
use image::imageops;

use crate::filter::RgbaImage;

/// Juxtaposes `input` and `output` on one transparent canvas.
///
/// The canvas is as wide as both images and as tall as `input`. Both images
/// rest on the bottom edge; whatever of `output` does not fit is clipped.
pub fn side_by_side(input: &RgbaImage, output: &RgbaImage) -> RgbaImage {
    let width = input.width() + output.width();
    let height = input.height();
    let mut canvas = RgbaImage::new(width, height);

    imageops::replace(&mut canvas, input, 0, 0);
    let output_y = height as i64 - output.height() as i64;
    imageops::replace(&mut canvas, output, input.width() as i64, output_y);
    canvas
}

/// Stacks one side-by-side composite per `(input, output)` pair, top to bottom.
pub fn contact_sheet<'a, I>(pairs: I) -> RgbaImage
where
    I: IntoIterator<Item = (&'a RgbaImage, &'a RgbaImage)>,
{
    let rows: Vec<RgbaImage> = pairs
        .into_iter()
        .map(|(input, output)| side_by_side(input, output))
        .collect();
    let width = rows.iter().map(|row| row.width()).max().unwrap_or(0);
    let height = rows.iter().map(|row| row.height()).sum();

    let mut sheet = RgbaImage::new(width, height);
    let mut y = 0i64;
    for row in &rows {
        imageops::replace(&mut sheet, row, 0, y);
        y += row.height() as i64;
    }
    sheet
}

//! Applying one filter function to many images.
//!
//! [`convert_directory`] reads every regular file of an input directory,
//! filters it and stores the result as PNG under the same file name in the
//! output directory. A file that cannot be decoded, filtered or written is
//! logged and skipped; the rest of the directory is still processed.
use std::ffi::OsString;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::io::Reader;
use image::{ImageError, ImageFormat};

use crate::error::{Error, Result};
use crate::filter::{is_empty, RgbaImage};

pub const INPUT_DIR: &str = "input";
pub const OUTPUT_DIR: &str = "output";

/// Decodes the image at `path`, choosing the decoder from the file content
/// and falling back to the extension only when the content is not recognized.
pub fn open_image(path: impl AsRef<Path>) -> Result<RgbaImage> {
    let path = path.as_ref();
    let decode_error = |source: ImageError| Error::Decode {
        path: path.to_path_buf(),
        source,
    };
    let image = Reader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|err| decode_error(ImageError::IoError(err)))?
        .decode()
        .map_err(decode_error)?;
    Ok(image.to_rgba8())
}

/// Encodes `image` as PNG in memory, then writes it in one go, so a failed
/// encode leaves no file behind.
pub fn write_png(image: &RgbaImage, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let encode_error = |source: ImageError| Error::Encode {
        path: path.to_path_buf(),
        source,
    };
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(encode_error)?;
    fs::write(path, bytes).map_err(|err| encode_error(ImageError::IoError(err)))
}

/// Maps `filter` over `images`, keeping the order.
pub fn filter_images<F>(images: &[RgbaImage], filter: F) -> Vec<RgbaImage>
where
    F: FnMut(&RgbaImage) -> RgbaImage,
{
    images.iter().map(filter).collect()
}

#[derive(Debug)]
pub enum Outcome {
    Converted(PathBuf),
    Skipped(Error),
}

#[derive(Debug)]
pub struct BatchItem {
    pub file_name: OsString,
    pub outcome: Outcome,
}

#[derive(Debug, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn converted(&self) -> impl Iterator<Item = &BatchItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, Outcome::Converted(_)))
    }

    pub fn skipped(&self) -> impl Iterator<Item = &BatchItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.outcome, Outcome::Skipped(_)))
    }
}

/// Runs [`convert_directory`] on `root/input`, writing into `root/output`.
pub fn convert_sibling<F>(root: impl AsRef<Path>, filter: F) -> Result<BatchReport>
where
    F: FnMut(&RgbaImage) -> Option<RgbaImage>,
{
    let root = root.as_ref();
    convert_directory(root.join(INPUT_DIR), root.join(OUTPUT_DIR), filter)
}

/// Filters every regular file of `input_dir` into `output_dir`.
///
/// Only failing to list `input_dir` or to create `output_dir` is an error;
/// per-file failures end up as [`Outcome::Skipped`] in the report. An entry
/// that cannot even be listed is reported with an empty file name.
pub fn convert_directory<F>(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    mut filter: F,
) -> Result<BatchReport>
where
    F: FnMut(&RgbaImage) -> Option<RgbaImage>,
{
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();
    let entries = fs::read_dir(input_dir)?;

    let mut report = BatchReport::default();
    let mut files = Vec::new();
    for entry in entries {
        let listed = entry.and_then(|entry| Ok((entry.file_type()?, entry)));
        match listed {
            Ok((file_type, entry)) if file_type.is_file() => files.push(entry.path()),
            Ok(_) => {}
            Err(err) => {
                log::warn!("skipping unreadable entry in {}: {}", input_dir.display(), err);
                report.items.push(BatchItem {
                    file_name: OsString::new(),
                    outcome: Outcome::Skipped(Error::Io(err)),
                });
            }
        }
    }
    files.sort();
    fs::create_dir_all(output_dir)?;

    log::info!(
        "converting {} file(s) from {} into {}",
        files.len(),
        input_dir.display(),
        output_dir.display()
    );

    for path in files {
        let Some(file_name) = path.file_name().map(|name| name.to_os_string()) else {
            continue;
        };
        let destination = output_dir.join(&file_name);
        let outcome = match convert_file(&path, &destination, &mut filter) {
            Ok(()) => {
                log::debug!("wrote {}", destination.display());
                Outcome::Converted(destination)
            }
            Err(err) => {
                log::warn!("skipping {}: {}", path.display(), err);
                Outcome::Skipped(err)
            }
        };
        report.items.push(BatchItem { file_name, outcome });
    }

    log::info!(
        "converted {}, skipped {}",
        report.converted().count(),
        report.skipped().count()
    );
    Ok(report)
}

fn convert_file<F>(source: &Path, destination: &Path, filter: &mut F) -> Result<()>
where
    F: FnMut(&RgbaImage) -> Option<RgbaImage>,
{
    let input = open_image(source)?;

    let output = filter(&input)
        .filter(|image| !is_empty(image))
        .ok_or_else(|| Error::NoOutput {
            name: source.display().to_string(),
        })?;

    // the file name is kept even when its extension says otherwise
    write_png(&output, destination)
}

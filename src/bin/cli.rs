use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use filter_playground::batch::{
    convert_directory, convert_sibling, filter_images, open_image, write_png, BatchReport,
};
use filter_playground::chain::FilterChain;
use filter_playground::compose::{contact_sheet, side_by_side};
use filter_playground::custom::CustomFilter;
use filter_playground::filter::{FilterSpec, Grayscale, Pixellate, SobelEdgeDetection};
use filter_playground::{Filter, RgbaImage};

const CHAIR: &str = "ChairTest.png";
const CUSTOM_FILTER: &str = "CustomFilter.json";
const GALLERY: [&str; 6] = [
    "DTS_Beauty.jpg",
    "DTS_BMX.jpg",
    "DTS_Body.jpg",
    "DTS_Cuba.jpg",
    "DTS_HotCold.jpg",
    "DTS_Kinckerbocker.jpg",
];

#[derive(Parser)]
#[command(name = "filter-playground", version, about = "Apply image filters and compare the results")]
struct CliArgs {
    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Filter one image
    Apply {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// sobel[=STRENGTH], pixellate[=FRACTION], grayscale or custom=FILE
        #[arg(short, long)]
        filter: FilterSpec,
        /// Save input and output next to each other
        #[arg(long)]
        side_by_side: bool,
    },
    /// Run one image through several filters, in order
    Chain {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(short, long = "filter", required = true)]
        filters: Vec<FilterSpec>,
        #[arg(long)]
        side_by_side: bool,
    },
    /// Filter every file of a directory into PNG files of the same name
    Batch {
        #[arg(long, conflicts_with = "root", requires = "output_dir")]
        input_dir: Option<PathBuf>,
        #[arg(long, conflicts_with = "root")]
        output_dir: Option<PathBuf>,
        /// Use ROOT/input and ROOT/output
        #[arg(long)]
        root: Option<PathBuf>,
        #[arg(short, long)]
        filter: FilterSpec,
    },
    /// Replay the playground: edge detection, pixellation, custom filter,
    /// a chain and grayscale over a gallery
    Playground {
        /// Directory holding ChairTest.png and the DTS_*.jpg gallery
        #[arg(long)]
        images: PathBuf,
        #[arg(long)]
        output: PathBuf,
        /// Custom filter description (default: IMAGES/CustomFilter.json)
        #[arg(long)]
        custom: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    let level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match args.command {
        Command::Apply {
            input,
            output,
            filter,
            side_by_side,
        } => {
            let filter = filter.build()?;
            filter_one(&input, &output, &filter, side_by_side)
        }
        Command::Chain {
            input,
            output,
            filters,
            side_by_side,
        } => {
            let mut chain = FilterChain::new();
            for spec in &filters {
                chain.add_target(spec.build()?);
            }
            filter_one(&input, &output, &chain, side_by_side)
        }
        Command::Batch {
            input_dir,
            output_dir,
            root,
            filter,
        } => {
            let filter = filter.build()?;
            let apply = |image: &RgbaImage| filter.image_by_filtering(image);
            let report = match (root, input_dir, output_dir) {
                (Some(root), _, _) => convert_sibling(root, apply)?,
                (None, Some(input_dir), Some(output_dir)) => {
                    convert_directory(input_dir, output_dir, apply)?
                }
                _ => bail!("batch needs --root or both --input-dir and --output-dir"),
            };
            summarize(&report);
            Ok(())
        }
        Command::Playground {
            images,
            output,
            custom,
        } => playground(&images, &output, custom),
    }
}

fn load(path: &Path) -> Result<RgbaImage> {
    Ok(open_image(path)?)
}

fn save(image: &RgbaImage, path: &Path) -> Result<()> {
    write_png(image, path)?;
    log::info!("saved {}", path.display());
    Ok(())
}

fn filter_one(input: &Path, output: &Path, filter: &dyn Filter, side: bool) -> Result<()> {
    let source = load(input)?;
    let Some(filtered) = filter.image_by_filtering(&source) else {
        bail!("{} produced no output for {}", filter.name(), input.display());
    };
    if side {
        save(&side_by_side(&source, &filtered), output)
    } else {
        save(&filtered, output)
    }
}

fn summarize(report: &BatchReport) {
    for item in report.skipped() {
        log::warn!("skipped {}", item.file_name.to_string_lossy());
    }
    println!(
        "{} converted, {} skipped",
        report.converted().count(),
        report.skipped().count()
    );
}

fn compare(source: &RgbaImage, filter: &dyn Filter, output: &Path) -> Result<()> {
    match filter.image_by_filtering(source) {
        Some(filtered) => save(&side_by_side(source, &filtered), output),
        None => bail!("{} produced no output", filter.name()),
    }
}

fn playground(images: &Path, output: &Path, custom: Option<PathBuf>) -> Result<()> {
    std::fs::create_dir_all(output)?;
    let chair = load(&images.join(CHAIR))?;

    // a simple edge detection
    compare(&chair, &SobelEdgeDetection::default(), &output.join("edge_detection.png"))?;

    // pixellate with a tweaked parameter
    let pixellate = Pixellate::new(0.02);
    compare(&chair, &pixellate, &output.join("pixellate.png"))?;

    let custom_path = custom.unwrap_or_else(|| images.join(CUSTOM_FILTER));
    match CustomFilter::from_file(&custom_path) {
        Ok(custom) => {
            compare(&chair, &custom, &output.join("custom.png"))?;

            // pixellation feeding the custom filter
            let mut chain = FilterChain::new();
            chain.add_target(&pixellate).add_target(&custom);
            compare(&chair, &chain, &output.join("chain.png"))?;
        }
        Err(err) => log::warn!(
            "skipping custom filter and chain, {}: {}",
            custom_path.display(),
            err
        ),
    }

    // multi-image
    let gallery = GALLERY
        .iter()
        .map(|name| load(&images.join(name)))
        .collect::<Result<Vec<_>>>()?;
    let filtered = filter_images(&gallery, |image| {
        Grayscale.image_by_filtering(image).unwrap_or_else(|| image.clone())
    });
    save(
        &contact_sheet(gallery.iter().zip(filtered.iter())),
        &output.join("grayscale.png"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgb, RgbImage};

    fn write_scene(dir: &Path, name: &str, format: ImageFormat) {
        let image = RgbImage::from_fn(40, 30, |x, y| {
            if (x / 8 + y / 8) % 2 == 0 {
                Rgb([220, 180, 40])
            } else {
                Rgb([20, 60, 200])
            }
        });
        image
            .save_with_format(dir.join(name), format)
            .expect("to write test input");
    }

    fn playground_images(dir: &Path) {
        write_scene(dir, CHAIR, ImageFormat::Png);
        for name in GALLERY {
            write_scene(dir, name, ImageFormat::Jpeg);
        }
        std::fs::write(
            dir.join(CUSTOM_FILTER),
            include_str!("../../filters/CustomFilter.json"),
        )
        .unwrap();
    }

    #[test]
    fn playground_writes_every_comparison() {
        let scratch = tempfile::tempdir().unwrap();
        let images = scratch.path().join("images");
        let output = scratch.path().join("output");
        std::fs::create_dir(&images).unwrap();
        playground_images(&images);

        playground(&images, &output, None).unwrap();

        for name in ["edge_detection.png", "pixellate.png", "custom.png", "chain.png"] {
            let composite = open_image(output.join(name)).unwrap();
            assert_eq!(composite.dimensions(), (80, 30), "{name}");
        }
        let sheet = open_image(output.join("grayscale.png")).unwrap();
        assert_eq!(sheet.dimensions(), (80, 30 * GALLERY.len() as u32));
    }

    #[test]
    fn playground_without_custom_filter_skips_custom_and_chain() {
        let scratch = tempfile::tempdir().unwrap();
        let images = scratch.path().join("images");
        let output = scratch.path().join("output");
        std::fs::create_dir(&images).unwrap();
        playground_images(&images);
        std::fs::remove_file(images.join(CUSTOM_FILTER)).unwrap();

        playground(&images, &output, None).unwrap();

        assert!(output.join("edge_detection.png").is_file());
        assert!(output.join("pixellate.png").is_file());
        assert!(!output.join("custom.png").exists());
        assert!(!output.join("chain.png").exists());
        assert!(output.join("grayscale.png").is_file());
    }

    #[test]
    fn playground_needs_the_chair() {
        let scratch = tempfile::tempdir().unwrap();
        assert!(playground(scratch.path(), &scratch.path().join("output"), None).is_err());
    }
}

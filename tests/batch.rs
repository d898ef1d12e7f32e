//! Directory conversion: which files come out, and in what form.
use std::fs;
use std::path::Path;

use filter_playground::batch::{
    convert_directory, convert_sibling, open_image, write_png, Outcome, INPUT_DIR, OUTPUT_DIR,
};
use filter_playground::filter::{Filter, Grayscale};
use filter_playground::{Error, RgbaImage};
use image::{ImageFormat, Rgba};

fn write_image(dir: &Path, name: &str, format: ImageFormat) {
    let image = image::DynamicImage::ImageRgb8(image::RgbImage::from_fn(6, 4, |x, y| {
        image::Rgb([(x * 40) as u8, (y * 60) as u8, 128])
    }));
    image
        .save_with_format(dir.join(name), format)
        .expect("to write test input");
}

fn names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn converts_decodable_files_and_skips_the_rest() {
    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("in");
    let output = scratch.path().join("out");
    fs::create_dir(&input).unwrap();

    write_image(&input, "a.png", ImageFormat::Png);
    fs::write(input.join("b.png"), b"definitely not a png").unwrap();
    write_image(&input, "c.jpg", ImageFormat::Jpeg);
    fs::create_dir(input.join("nested")).unwrap();
    write_image(&input.join("nested"), "d.png", ImageFormat::Png);

    let report = convert_directory(&input, &output, |image| Grayscale.image_by_filtering(image))
        .expect("batch to run");

    // the corrupt file sorts before c.jpg and must not stop it
    assert_eq!(names(&output), vec!["a.png", "c.jpg"]);
    assert_eq!(report.items.len(), 3);
    assert_eq!(report.converted().count(), 2);
    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].file_name, "b.png");
    assert!(matches!(skipped[0].outcome, Outcome::Skipped(Error::Decode { .. })));
}

#[test]
fn outputs_are_png_whatever_the_input_container() {
    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("in");
    let output = scratch.path().join("out");
    fs::create_dir(&input).unwrap();
    write_image(&input, "photo.jpg", ImageFormat::Jpeg);
    write_image(&input, "shot.bmp", ImageFormat::Bmp);

    convert_directory(&input, &output, |image| Some(image.clone())).unwrap();

    for name in ["photo.jpg", "shot.bmp"] {
        let bytes = fs::read(output.join(name)).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (6, 4));
    }
}

#[test]
fn no_output_means_no_file() {
    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("in");
    let output = scratch.path().join("out");
    fs::create_dir(&input).unwrap();
    for name in ["keep.png", "drop.png", "empty.png"] {
        write_image(&input, name, ImageFormat::Png);
    }

    let mut calls = 0;
    let report = convert_directory(&input, &output, |image| {
        calls += 1;
        match calls {
            // drop.png
            1 => None,
            // empty.png
            2 => Some(RgbaImage::new(0, 0)),
            _ => Some(image.clone()),
        }
    })
    .unwrap();

    assert_eq!(calls, 3);
    assert_eq!(names(&output), vec!["keep.png"]);
    assert!(report
        .skipped()
        .all(|item| matches!(item.outcome, Outcome::Skipped(Error::NoOutput { .. }))));
}

#[test]
fn encode_failure_skips_item() {
    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("in");
    let output = scratch.path().join("out");
    fs::create_dir(&input).unwrap();
    write_image(&input, "a.png", ImageFormat::Png);
    write_image(&input, "b.png", ImageFormat::Png);
    // a directory where the output file should go cannot be written over
    fs::create_dir_all(output.join("a.png")).unwrap();

    let report = convert_directory(&input, &output, |image| Some(image.clone())).unwrap();

    assert_eq!(report.converted().count(), 1);
    let skipped: Vec<_> = report.skipped().collect();
    assert_eq!(skipped.len(), 1);
    assert_eq!(skipped[0].file_name, "a.png");
    assert!(matches!(skipped[0].outcome, Outcome::Skipped(Error::Encode { .. })));
    assert!(output.join("a.png").is_dir());
    assert!(output.join("b.png").is_file());
}

#[test]
fn sibling_directories() {
    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join(INPUT_DIR);
    fs::create_dir(&input).unwrap();
    write_image(&input, "a.png", ImageFormat::Png);

    let report = convert_sibling(scratch.path(), |image| {
        let mut image = image.clone();
        image.put_pixel(0, 0, Rgba([1, 2, 3, 4]));
        Some(image)
    })
    .unwrap();

    assert_eq!(report.converted().count(), 1);
    let written = image::open(scratch.path().join(OUTPUT_DIR).join("a.png"))
        .unwrap()
        .to_rgba8();
    assert_eq!(written.get_pixel(0, 0).0, [1, 2, 3, 4]);
}

#[test]
fn missing_input_directory_is_an_error() {
    let scratch = tempfile::tempdir().unwrap();
    let output = scratch.path().join("out");
    let result = convert_directory(scratch.path().join("nope"), &output, |image| Some(image.clone()));
    assert!(matches!(result, Err(Error::Io(_))));
    assert!(!output.exists());
}

#[test]
fn decoder_follows_content_not_extension() {
    let scratch = tempfile::tempdir().unwrap();
    let input = scratch.path().join("in");
    let output = scratch.path().join("out");
    fs::create_dir(&input).unwrap();
    write_image(&input, "noext", ImageFormat::Png);
    write_image(&input, "photo.jpg", ImageFormat::Png);

    let report = convert_directory(&input, &output, |image| Grayscale.image_by_filtering(image))
        .unwrap();

    assert_eq!(report.converted().count(), 2);
    assert_eq!(names(&output), vec!["noext", "photo.jpg"]);
}

#[test]
fn batch_output_can_be_fed_back_in() {
    let scratch = tempfile::tempdir().unwrap();
    let first = scratch.path().join("first");
    let second = scratch.path().join("second");
    let third = scratch.path().join("third");
    fs::create_dir(&first).unwrap();
    write_image(&first, "photo.jpg", ImageFormat::Jpeg);

    convert_directory(&first, &second, |image| Some(image.clone())).unwrap();
    let report = convert_directory(&second, &third, |image| Some(image.clone())).unwrap();

    assert_eq!(report.converted().count(), 1);
    assert_eq!(
        open_image(second.join("photo.jpg")).unwrap(),
        open_image(third.join("photo.jpg")).unwrap()
    );
}

#[test]
fn open_image_reports_decode_errors() {
    let scratch = tempfile::tempdir().unwrap();
    let garbage = scratch.path().join("garbage.png");
    fs::write(&garbage, b"\x89PNG but not really").unwrap();
    assert!(matches!(open_image(&garbage), Err(Error::Decode { .. })));
    assert!(matches!(
        open_image(scratch.path().join("absent.png")),
        Err(Error::Decode { .. })
    ));
}

#[test]
fn failed_write_leaves_no_file() {
    let scratch = tempfile::tempdir().unwrap();
    let image = RgbaImage::from_pixel(3, 3, Rgba([5, 6, 7, 255]));

    let missing_parent = scratch.path().join("no/such/dir/out.png");
    assert!(matches!(write_png(&image, &missing_parent), Err(Error::Encode { .. })));
    assert!(!missing_parent.exists());

    let written = scratch.path().join("out.png");
    write_png(&image, &written).unwrap();
    assert_eq!(open_image(&written).unwrap(), image);
}

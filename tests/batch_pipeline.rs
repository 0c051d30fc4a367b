use std::path::Path;
use std::sync::Arc;

use image::{DynamicImage, ImageBuffer, Rgb};
use picslim::config::{ConfigOverrides, ConfigResolver, EffectiveConfig};
use picslim::parallel::NoProgress;
use picslim::report;
use tempfile::TempDir;

fn write_image(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, y| Rgb([(x % 251) as u8, (y % 251) as u8, 90]));
    DynamicImage::ImageRgb8(img).save(path).unwrap();
}

fn resolve(input: &Path, output: &Path, overrides: ConfigOverrides) -> EffectiveConfig {
    ConfigResolver::new()
        .without_default_file()
        .resolve(
            None,
            &ConfigOverrides {
                input_dir: Some(input.to_string_lossy().into_owned()),
                output_dir: Some(output.to_string_lossy().into_owned()),
                ..overrides
            },
        )
        .unwrap()
}

fn render(outcome: &picslim::BatchOutcome) -> String {
    let mut buffer = Vec::new();
    report::report(outcome, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

#[tokio::test]
async fn resizes_and_adds_webp_variants() {
    let input = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("min");
    write_image(&input.path().join("a.jpg"), 800, 600);
    write_image(&input.path().join("b.png"), 2000, 1000);

    let config = resolve(
        input.path(),
        &output,
        ConfigOverrides {
            quality: Some(80),
            max_width: Some(1000),
            max_height: Some(1000),
            formats: Some("source,webp".to_string()),
            ..Default::default()
        },
    );

    let outcome = picslim::optimize(&config, Arc::new(NoProgress)).await.unwrap();

    assert_eq!(image::image_dimensions(output.join("a.jpg")).unwrap(), (800, 600));
    assert_eq!(image::image_dimensions(output.join("b.png")).unwrap(), (1000, 500));
    assert!(output.join("a.webp").is_file());
    assert!(output.join("b.webp").is_file());

    let summary = render(&outcome);
    assert!(summary.contains("Processed: 2"));
    assert!(summary.contains("Errors: 0"));
}

#[tokio::test]
async fn missing_input_root_reports_no_images() {
    let work = TempDir::new().unwrap();
    let output = work.path().join("min");

    let config = resolve(&work.path().join("does-not-exist"), &output, ConfigOverrides::default());
    let outcome = picslim::optimize(&config, Arc::new(NoProgress)).await.unwrap();

    assert_eq!(outcome.completed, 0);
    assert_eq!(render(&outcome), "No images found.\n");
    assert!(!output.exists());
}

#[tokio::test]
async fn corrupt_file_does_not_stop_the_batch() {
    let input = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("min");

    for i in 0..9 {
        write_image(&input.path().join(format!("img{}.png", i)), 40, 30);
    }
    std::fs::write(input.path().join("corrupt.jpg"), b"\xFF\xD8 truncated").unwrap();

    let config = resolve(
        input.path(),
        &output,
        ConfigOverrides {
            concurrency: Some(10),
            ..Default::default()
        },
    );
    let outcome = picslim::optimize(&config, Arc::new(NoProgress)).await.unwrap();

    assert_eq!(outcome.completed, 10);
    assert_eq!(outcome.batches, 1);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].file, Path::new("corrupt.jpg"));

    for i in 0..9 {
        assert!(output.join(format!("img{}.png", i)).is_file());
    }

    let summary = render(&outcome);
    assert!(summary.contains("Processed: 10"));
    assert!(summary.contains("Errors: 1"));
    assert!(summary.contains("corrupt.jpg"));
}

#[tokio::test]
async fn recursive_run_mirrors_the_tree() {
    let input = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("out");
    write_image(&input.path().join("top.png"), 10, 10);
    write_image(&input.path().join("albums/2024/deep.jpg"), 10, 10);
    std::fs::write(input.path().join("albums/readme.txt"), b"skip me").unwrap();

    let flat = resolve(input.path(), &output, ConfigOverrides::default());
    let outcome = picslim::optimize(&flat, Arc::new(NoProgress)).await.unwrap();
    assert_eq!(outcome.completed, 1);
    assert!(!output.join("albums").exists());

    let recursive = resolve(
        input.path(),
        &output,
        ConfigOverrides {
            recursive: Some(true),
            formats: Some("source,avif".to_string()),
            ..Default::default()
        },
    );
    let outcome = picslim::optimize(&recursive, Arc::new(NoProgress)).await.unwrap();

    assert_eq!(outcome.completed, 2);
    assert!(outcome.errors.is_empty());
    assert!(output.join("albums/2024/deep.jpg").is_file());
    assert!(output.join("albums/2024/deep.avif").is_file());
    assert!(output.join("top.avif").is_file());
    assert!(!output.join("albums/readme.txt").exists());
}

#[tokio::test]
async fn unwritable_destination_fails_only_that_file() {
    let input = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let output = work.path().join("min");
    write_image(&input.path().join("first.png"), 12, 12);
    write_image(&input.path().join("second.png"), 12, 12);
    // A regular file where the output subdirectory should be created
    write_image(&input.path().join("nested/third.png"), 12, 12);
    std::fs::create_dir_all(&output).unwrap();
    std::fs::write(output.join("nested"), b"in the way").unwrap();

    let config = resolve(
        input.path(),
        &output,
        ConfigOverrides {
            recursive: Some(true),
            concurrency: Some(1),
            ..Default::default()
        },
    );
    let outcome = picslim::optimize(&config, Arc::new(NoProgress)).await.unwrap();

    assert_eq!(outcome.completed, 3);
    assert_eq!(outcome.batches, 3);
    assert_eq!(outcome.errors.len(), 1);
    assert_eq!(outcome.errors[0].file, Path::new("nested/third.png"));
    assert!(output.join("first.png").is_file());
    assert!(output.join("second.png").is_file());
}

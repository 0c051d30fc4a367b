//! Codec capability: metadata, decode, resize and encode
//!
//! All methods are blocking; callers run them on the blocking thread pool.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::DynamicImage;
use tracing::debug;

use crate::error::{PicslimError, Result};
use crate::processing::formats::OutputFormat;
use crate::processing::resize::{resize_within, Bounds, FilterType};

/// AVIF encoder speed (1 = slowest/smallest, 10 = fastest)
pub const AVIF_SPEED: u8 = 6;

/// Dimensions read from an image header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageMetadata {
    pub width: u32,
    pub height: u32,
}

/// Encoder parameters shared by all output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// 1-100, used by JPEG, WebP and AVIF
    pub quality: u8,
    /// 0-9, used by PNG
    pub compression_level: u8,
}

/// Image codec used by the processing task
pub trait ImageCodec: Send + Sync {
    /// Read width and height without decoding pixel data
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata>;

    /// Decode the full image
    fn decode(&self, path: &Path) -> Result<DynamicImage>;

    /// Downscale to fit the bounds, never enlarging
    fn resize(&self, image: DynamicImage, bounds: Bounds) -> DynamicImage {
        resize_within(image, bounds, FilterType::Lanczos3)
    }

    /// Encode and write one output file
    fn encode_to_file(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        options: EncodeOptions,
        path: &Path,
    ) -> Result<()>;
}

/// Codec backed by the `image` crate, with lossy WebP from `webp`
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageCrateCodec;

impl ImageCrateCodec {
    pub fn new() -> Self {
        Self
    }

    fn write_file(
        image: &DynamicImage,
        format: OutputFormat,
        options: EncodeOptions,
        path: &Path,
    ) -> Result<()> {
        match format {
            OutputFormat::WebP => {
                let rgba = image.to_rgba8();
                let encoded = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height())
                    .encode(options.quality as f32);
                std::fs::write(path, &*encoded)?;
            }
            OutputFormat::Jpeg => {
                let mut writer = BufWriter::new(File::create(path)?);
                let encoder = JpegEncoder::new_with_quality(&mut writer, options.quality);
                if image.color().has_alpha() {
                    DynamicImage::ImageRgb8(image.to_rgb8()).write_with_encoder(encoder)?;
                } else {
                    image.write_with_encoder(encoder)?;
                }
                writer.flush()?;
            }
            OutputFormat::Png => {
                let mut writer = BufWriter::new(File::create(path)?);
                let encoder = PngEncoder::new_with_quality(
                    &mut writer,
                    png_compression(options.compression_level),
                    PngFilterType::Adaptive,
                );
                image.write_with_encoder(encoder)?;
                writer.flush()?;
            }
            OutputFormat::Avif => {
                let mut writer = BufWriter::new(File::create(path)?);
                let encoder = AvifEncoder::new_with_speed_quality(&mut writer, AVIF_SPEED, options.quality);
                match image {
                    DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => {
                        image.write_with_encoder(encoder)?
                    }
                    other => DynamicImage::ImageRgba8(other.to_rgba8()).write_with_encoder(encoder)?,
                }
                writer.flush()?;
            }
        }
        Ok(())
    }
}

impl ImageCodec for ImageCrateCodec {
    fn read_metadata(&self, path: &Path) -> Result<ImageMetadata> {
        let (width, height) = image::image_dimensions(path)?;
        Ok(ImageMetadata { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        Ok(image::open(path)?)
    }

    fn encode_to_file(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        options: EncodeOptions,
        path: &Path,
    ) -> Result<()> {
        debug!(
            "Encoding {:?} as {} (quality {}, compression {})",
            path,
            format.name(),
            options.quality,
            options.compression_level
        );

        Self::write_file(image, format, options, path).map_err(|e| {
            PicslimError::encode(format.name(), e.to_string(), Some(path.to_path_buf()))
        })
    }
}

/// Map a 0-9 deflate level onto the encoder's presets
fn png_compression(level: u8) -> CompressionType {
    match level {
        0..=2 => CompressionType::Fast,
        3..=6 => CompressionType::Default,
        _ => CompressionType::Best,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgba};
    use tempfile::TempDir;

    fn create_test_image(width: u32, height: u32) -> DynamicImage {
        let img = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 255) as u8, (y % 255) as u8, 128, 255])
        });
        DynamicImage::ImageRgba8(img)
    }

    fn options() -> EncodeOptions {
        EncodeOptions {
            quality: 80,
            compression_level: 9,
        }
    }

    #[test]
    fn test_png_compression_mapping() {
        assert!(matches!(png_compression(0), CompressionType::Fast));
        assert!(matches!(png_compression(5), CompressionType::Default));
        assert!(matches!(png_compression(9), CompressionType::Best));
    }

    #[test]
    fn test_jpeg_and_png_round_trip_dimensions() {
        let dir = TempDir::new().unwrap();
        let codec = ImageCrateCodec::new();
        let image = create_test_image(64, 48);

        for (format, name) in [(OutputFormat::Jpeg, "out.jpg"), (OutputFormat::Png, "out.png")] {
            let path = dir.path().join(name);
            codec.encode_to_file(&image, format, options(), &path).unwrap();

            let meta = codec.read_metadata(&path).unwrap();
            assert_eq!(meta, ImageMetadata { width: 64, height: 48 });
        }
    }

    #[test]
    fn test_webp_output_is_riff() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.webp");

        ImageCrateCodec::new()
            .encode_to_file(&create_test_image(32, 32), OutputFormat::WebP, options(), &path)
            .unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"RIFF"));
        assert_eq!(&bytes[8..12], b"WEBP");
    }

    #[test]
    fn test_corrupt_header_fails_metadata() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        assert!(ImageCrateCodec::new().read_metadata(&path).is_err());
    }

    #[test]
    fn test_unwritable_destination_is_encode_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing-dir").join("out.png");

        let err = ImageCrateCodec::new()
            .encode_to_file(&create_test_image(8, 8), OutputFormat::Png, options(), &path)
            .unwrap_err();

        assert!(matches!(err, PicslimError::EncodeError { .. }));
        assert_eq!(err.file_path(), Some(&path));
    }
}

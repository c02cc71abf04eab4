//! Image preparation for upload.
//!
//! Local images are decoded, scaled down to the configured maximum width when
//! they are wider, flattened to 8-bit RGB (so palette and alpha sources encode
//! cleanly to formats without those), and re-encoded in memory.
//!
//! | Step | Implementation |
//! |---|---|
//! | **Decode** | `image::load_from_memory` (format guessed from content) |
//! | **Resize** | [`target_dimensions`] + Lanczos3 `resize_exact` |
//! | **Normalize** | `to_rgb8` |
//! | **Encode** | `write_to` with the format from `img.ext` |

use crate::config::Config;
use crate::error::{Result, WpError};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

/// Maps a configured extension to the encoder used for uploads.
pub fn output_format(ext: &str) -> Result<ImageFormat> {
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
        "png" => Ok(ImageFormat::Png),
        "gif" => Ok(ImageFormat::Gif),
        "bmp" => Ok(ImageFormat::Bmp),
        "webp" => Ok(ImageFormat::WebP),
        other => Err(WpError::config_error(format!(
            "Unsupported image output extension: {other}"
        ))),
    }
}

/// Output size for an image of `width` x `height` under `max_width`.
///
/// Wider images are scaled by `max_width / width` on both axes; the height is
/// truncated like the width ratio and never drops below one pixel.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled = (u64::from(height) * u64::from(max_width) / u64::from(width)) as u32;
    (max_width, scaled.max(1))
}

/// Encoded image ready to be sent as a request body.
#[derive(Debug, Clone)]
pub struct PreparedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct ImagePreparer {
    max_width: u32,
    format: ImageFormat,
}

impl ImagePreparer {
    pub fn new(max_width: u32, format: ImageFormat) -> Self {
        Self { max_width, format }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.img.max_size, output_format(&config.img.ext)?))
    }

    /// Reads, resizes and encodes the image at `path`.
    pub async fn prepare(&self, path: &Path) -> Result<PreparedImage> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|e| WpError::image(path.display().to_string(), e))?;
        self.prepare_bytes(&data, &path.display().to_string())
    }

    /// Resizes and encodes already-loaded image data. `name` is used in errors.
    pub fn prepare_bytes(&self, data: &[u8], name: &str) -> Result<PreparedImage> {
        let source = image::load_from_memory(data).map_err(|e| WpError::image(name, e))?;

        let (width, height) = target_dimensions(source.width(), source.height(), self.max_width);
        let resized = if (width, height) == (source.width(), source.height()) {
            source
        } else {
            debug!(
                "Resizing {name} from {}x{} to {width}x{height}",
                source.width(),
                source.height()
            );
            source.resize_exact(width, height, FilterType::Lanczos3)
        };

        let rgb = DynamicImage::ImageRgb8(resized.to_rgb8());
        let mut bytes = Vec::new();
        rgb.write_to(&mut Cursor::new(&mut bytes), self.format)
            .map_err(|e| WpError::image(name, e))?;

        Ok(PreparedImage {
            bytes,
            width,
            height,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn write_png(dir: &Path, name: &str, width: u32, height: u32) -> std::path::PathBuf {
        let path = dir.join(name);
        RgbaImage::from_pixel(width, height, Rgba([200, 30, 30, 128]))
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_target_dimensions() {
        assert_eq!(target_dimensions(640, 480, 800), (640, 480));
        assert_eq!(target_dimensions(800, 600, 800), (800, 600));
        assert_eq!(target_dimensions(1600, 1200, 800), (800, 600));
        assert_eq!(target_dimensions(1000, 333, 800), (800, 266));
        assert_eq!(target_dimensions(5000, 2, 100), (100, 1));
    }

    #[test]
    fn test_aspect_ratio_within_one_pixel() {
        for (w, h) in [(1920, 1080), (1234, 987), (3001, 17), (801, 800)] {
            let (tw, th) = target_dimensions(w, h, 800);
            assert_eq!(tw, 800);
            let exact = f64::from(h) * 800.0 / f64::from(w);
            assert!((f64::from(th) - exact).abs() <= 1.0, "{w}x{h} -> {tw}x{th}");
        }
    }

    #[test]
    fn test_output_format() {
        assert_eq!(output_format("jpg").unwrap(), ImageFormat::Jpeg);
        assert_eq!(output_format("JPEG").unwrap(), ImageFormat::Jpeg);
        assert_eq!(output_format("png").unwrap(), ImageFormat::Png);
        assert!(output_format("tiff").is_err());
    }

    #[tokio::test]
    async fn test_narrow_image_keeps_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "small.png", 120, 80);
        let preparer = ImagePreparer::new(800, ImageFormat::Jpeg);

        let prepared = preparer.prepare(&path).await.unwrap();
        assert_eq!((prepared.width, prepared.height), (120, 80));

        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (120, 80));
        assert_eq!(
            image::guess_format(&prepared.bytes).unwrap(),
            ImageFormat::Jpeg
        );
    }

    #[tokio::test]
    async fn test_wide_image_is_scaled_down() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_png(dir.path(), "wide.png", 1000, 500);
        let preparer = ImagePreparer::new(400, ImageFormat::Jpeg);

        let prepared = preparer.prepare(&path).await.unwrap();
        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (400, 200));
    }

    #[test]
    fn test_alpha_image_encodes_as_rgb() {
        let mut png = Vec::new();
        let gray = DynamicImage::ImageLumaA8(image::GrayAlphaImage::new(10, 10));
        gray.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .unwrap();

        let preparer = ImagePreparer::new(800, ImageFormat::Jpeg);
        let prepared = preparer.prepare_bytes(&png, "gray.png").unwrap();
        let decoded = image::load_from_memory(&prepared.bytes).unwrap();
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[tokio::test]
    async fn test_undecodable_file_is_image_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.png");
        std::fs::write(&path, b"definitely not an image").unwrap();
        let preparer = ImagePreparer::new(800, ImageFormat::Jpeg);

        let err = preparer.prepare(&path).await.unwrap_err();
        assert!(matches!(err, WpError::Image { .. }));

        let err = preparer
            .prepare(&dir.path().join("missing.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, WpError::Image { .. }));
    }
}

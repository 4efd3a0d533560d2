use crate::error::ProcessError;
use image::imageops;
use image::io::Reader;
use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io;
use std::path::Path;

/// Placeholder substituted with the source object's base filename.
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(w: u32, h: u32) -> Self {
        TargetSize {
            width: w,
            height: h,
        }
    }

    /// An image is too small for a cover resize only when it falls short of
    /// the target on both axes; otherwise one axis is scaled up as needed.
    fn accepts(self, width: u32, height: u32) -> bool {
        !(width < self.width && height < self.height)
    }
}

/// Decodes `source`, cover-resizes it to `target` and writes it to
/// `destination` in the format it was decoded from.
pub fn resize_cover(
    source: &Path,
    destination: &Path,
    target: TargetSize,
) -> Result<ImageFormat, ProcessError> {
    let img_reader = Reader::open(source).map_err(|err| match err.kind() {
        io::ErrorKind::NotFound => ProcessError::FileNotFound {
            path: source.to_path_buf(),
        },
        _ => ProcessError::Io(err),
    })?;
    let img_reader = img_reader.with_guessed_format()?;
    let Some(format) = img_reader.format() else {
        return Err(ProcessError::UnknownFormat {
            path: source.to_path_buf(),
        });
    };
    let og_img = img_reader.decode()?;

    let resized_img = cover(&og_img, target)?;
    resized_img.save_with_format(destination, format)?;

    tracing::debug!(
        "resized {}x{} {:?} to {}x{}",
        og_img.width(),
        og_img.height(),
        format,
        target.width,
        target.height
    );

    Ok(format)
}

/// Scales `img` until it covers `target` and crops the centred overflow.
pub fn cover(img: &DynamicImage, target: TargetSize) -> Result<DynamicImage, ProcessError> {
    let (width, height) = img.dimensions();

    if !target.accepts(width, height) {
        return Err(ProcessError::ImageSize {
            width,
            height,
            target,
        });
    }

    Ok(img.resize_to_fill(target.width, target.height, imageops::FilterType::Lanczos3))
}

/// Renders the destination key for `key` by substituting its base filename
/// into `template`.
pub fn destination_key(template: &str, key: &str) -> String {
    template.replace(FILENAME_PLACEHOLDER, basename(key))
}

// Everything after the last '/', so a key ending in '/' has an empty basename.
fn basename(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::{cover, destination_key, resize_cover, TargetSize};
    use crate::error::ProcessError;
    use image::io::Reader;
    use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
    use std::path::{Path, PathBuf};

    fn fixture() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("res/test-img.png")
    }

    // Black side bands around a white centre, 200px of band each side of 400px.
    fn banded(width: u32, height: u32, band: u32) -> DynamicImage {
        let img = RgbImage::from_fn(width, height, |x, _| {
            if x < band || x >= width - band {
                Rgb([0, 0, 0])
            } else {
                Rgb([255, 255, 255])
            }
        });
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn image_resize_fixture() {
        let dir = tempfile::tempdir().unwrap();
        let destination = dir.path().join("resized");

        let format = resize_cover(&fixture(), &destination, TargetSize::new(400, 400)).unwrap();
        let resized = Reader::open(&destination)
            .unwrap()
            .with_guessed_format()
            .unwrap()
            .decode()
            .unwrap();

        assert_eq!(format, ImageFormat::Png);
        assert_eq!(resized.dimensions(), (400, 400));
    }

    #[test]
    fn cover_crops_overflow_centred() {
        let img = banded(800, 400, 200);

        let resized = cover(&img, TargetSize::new(400, 400)).unwrap().to_rgb8();

        assert_eq!(resized.dimensions(), (400, 400));
        for (x, y) in [(0, 0), (399, 0), (0, 399), (399, 399), (200, 200)] {
            let Rgb([r, g, b]) = *resized.get_pixel(x, y);
            assert!(r > 200 && g > 200 && b > 200, "pixel {x},{y} not white");
        }
    }

    #[test]
    fn cover_upscales_short_axis() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(300, 600));

        let resized = cover(&img, TargetSize::new(400, 400)).unwrap();

        assert_eq!(resized.dimensions(), (400, 400));
    }

    #[test]
    fn cover_rejects_image_smaller_on_both_axes() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(300, 200));

        let err = cover(&img, TargetSize::new(400, 400)).unwrap_err();

        assert!(matches!(
            err,
            ProcessError::ImageSize {
                width: 300,
                height: 200,
                ..
            }
        ));
    }

    #[test]
    fn preserves_container_format() {
        let dir = tempfile::tempdir().unwrap();
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(500, 450, Rgb([10, 120, 200])));

        for format in [
            ImageFormat::Png,
            ImageFormat::Jpeg,
            ImageFormat::Gif,
            ImageFormat::Bmp,
            ImageFormat::Tiff,
        ] {
            let source = dir.path().join(format!("orig-{format:?}_orig"));
            let destination = dir.path().join(format!("resized-{format:?}"));
            img.save_with_format(&source, format).unwrap();

            let used = resize_cover(&source, &destination, TargetSize::new(400, 400)).unwrap();
            let detected = Reader::open(&destination)
                .unwrap()
                .with_guessed_format()
                .unwrap()
                .format();

            assert_eq!(used, format);
            assert_eq!(detected, Some(format));
        }
    }

    #[test]
    fn too_small_source_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("orig-small_orig");
        let destination = dir.path().join("resized-small");
        RgbImage::new(64, 64).save_with_format(&source, ImageFormat::Png).unwrap();

        let err = resize_cover(&source, &destination, TargetSize::new(400, 400)).unwrap_err();

        assert!(matches!(err, ProcessError::ImageSize { .. }));
        assert!(!destination.exists());
    }

    #[test]
    fn missing_source_is_file_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("orig-missing_orig");

        let err = resize_cover(&source, &dir.path().join("out"), TargetSize::new(400, 400))
            .unwrap_err();

        assert!(matches!(err, ProcessError::FileNotFound { path } if path == source));
    }

    #[test]
    fn garbage_source_is_not_a_size_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("orig-garbage_orig");
        std::fs::write(&source, b"definitely not an image").unwrap();

        let err = resize_cover(&source, &dir.path().join("out"), TargetSize::new(400, 400))
            .unwrap_err();

        assert!(matches!(err, ProcessError::UnknownFormat { .. }));
    }

    #[test]
    fn headerless_tga_is_unknown_format() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("orig-tga_orig");
        RgbImage::from_pixel(500, 500, Rgb([1, 2, 3]))
            .save_with_format(&source, ImageFormat::Tga)
            .unwrap();

        let err = resize_cover(&source, &dir.path().join("out"), TargetSize::new(400, 400))
            .unwrap_err();

        assert!(matches!(err, ProcessError::UnknownFormat { .. }));
    }

    #[test]
    fn destination_key_uses_basename() {
        assert_eq!(destination_key("images/{filename}", "a/b/photo.JPG"), "images/photo.JPG");
        assert_eq!(destination_key("images/{filename}", "object_key"), "images/object_key");
        assert_eq!(destination_key("thumbs/{filename}", "dir/"), "thumbs/");
    }
}

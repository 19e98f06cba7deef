//! Image preparation: decode a photo and hand the engine a clean RGB PNG.
//!
//! Phone photos arrive as JPEGs, sometimes greyscale or CMYK-ish, sometimes
//! PNG screenshots with an alpha channel. Decoding here does two things:
//! undecodable files fail early with [`OcrError::Decode`] naming the cause,
//! and every image reaches the engine as 8-bit RGB. No enhancement is done;
//! recognition quality is the engine's business.
//!
//! Decoding is CPU-bound, so it runs inside `spawn_blocking`.

use crate::error::OcrError;
use image::ImageFormat;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// A decoded image written to a temp PNG. The file is deleted on drop.
#[derive(Debug)]
pub struct PreparedImage {
    file: NamedTempFile,
    pub width: u32,
    pub height: u32,
}

impl PreparedImage {
    /// Path of the temp PNG to pass to the engine.
    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// Decode `path` and write it out as an RGB PNG temp file.
pub async fn prepare_image(path: &Path) -> Result<PreparedImage, OcrError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || prepare_image_blocking(&path))
        .await
        .map_err(|e| OcrError::Io {
            detail: format!("image preparation task panicked: {e}"),
        })?
}

fn prepare_image_blocking(path: &Path) -> Result<PreparedImage, OcrError> {
    let img = image::open(path).map_err(|e| OcrError::Decode {
        detail: e.to_string(),
    })?;
    let rgb = image::DynamicImage::ImageRgb8(img.to_rgb8());

    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
        .map_err(|e| OcrError::Decode {
            detail: format!("re-encoding as PNG failed: {e}"),
        })?;

    let io_err = |e: std::io::Error| OcrError::Io {
        detail: e.to_string(),
    };
    let mut file = tempfile::Builder::new()
        .prefix("notes2tex-")
        .suffix(".png")
        .tempfile()
        .map_err(io_err)?;
    file.write_all(&buf).map_err(io_err)?;
    file.flush().map_err(io_err)?;

    debug!(
        "Prepared {} → {}x{} px RGB ({} bytes)",
        path.display(),
        rgb.width(),
        rgb.height(),
        buf.len()
    );

    Ok(PreparedImage {
        width: rgb.width(),
        height: rgb.height(),
        file,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::TempDir;

    #[tokio::test]
    async fn prepares_png_with_alpha() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("page.png");
        RgbaImage::from_pixel(12, 8, Rgba([10, 20, 30, 128]))
            .save(&src)
            .unwrap();

        let prepared = prepare_image(&src).await.expect("prepare should succeed");
        assert_eq!((prepared.width, prepared.height), (12, 8));

        let decoded = image::open(prepared.path()).expect("temp PNG is readable");
        assert_eq!(decoded.color(), image::ColorType::Rgb8);
    }

    #[tokio::test]
    async fn temp_file_is_removed_on_drop() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("page.png");
        RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 255])).save(&src).unwrap();

        let prepared = prepare_image(&src).await.unwrap();
        let temp_path = prepared.path().to_path_buf();
        assert!(temp_path.exists());
        drop(prepared);
        assert!(!temp_path.exists());
    }

    #[tokio::test]
    async fn garbage_bytes_fail_to_decode() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("broken.jpg");
        std::fs::write(&src, b"definitely not a jpeg").unwrap();

        let err = prepare_image(&src).await.unwrap_err();
        assert!(matches!(err, OcrError::Decode { .. }), "got: {err:?}");
    }
}

use std::path::{Path, PathBuf};

use anyhow::Context;
use image::{DynamicImage, imageops::FilterType};

use crate::foundation::core::PixelSize;
use crate::foundation::error::MosaicResult;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "bmp", "webp"];

/// Decodes an encoded raster and resizes it to exactly `size`.
///
/// The result is RGBA8 when the source carries alpha and RGB8 otherwise.
pub fn decode_sprite(bytes: &[u8], size: PixelSize) -> MosaicResult<DynamicImage> {
    let img = image::load_from_memory(bytes).context("decode sprite from memory")?;
    Ok(normalize(img, size))
}

/// Reads and decodes the sprite at `path`, resized like [`decode_sprite`].
pub fn load_sprite_file(path: &Path, size: PixelSize) -> MosaicResult<DynamicImage> {
    let img = image::open(path).with_context(|| format!("decode sprite '{}'", path.display()))?;
    Ok(normalize(img, size))
}

fn normalize(img: DynamicImage, size: PixelSize) -> DynamicImage {
    let img = if img.width() == size.width && img.height() == size.height {
        img
    } else {
        img.resize_exact(size.width, size.height, FilterType::Triangle)
    };
    if img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Image files directly inside `dir`, sorted by path.
pub fn list_image_files(dir: &Path) -> MosaicResult<Vec<PathBuf>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("read directory '{}'", dir.display()))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("list directory '{}'", dir.display()))?
            .path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.iter().any(|x| x.eq_ignore_ascii_case(e)))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;

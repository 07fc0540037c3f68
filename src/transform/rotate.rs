use image::DynamicImage;

use crate::foundation::core::{Affine, PixelSize, Vec2};
use crate::foundation::error::MosaicResult;
use crate::transform::{TransformedSprite, descriptor::TransformDescriptor, warp::warp_rgba};

/// Rotates `sprite` about its center by `angle_degrees` (counter-clockwise on screen)
/// without cropping.
///
/// The output raster is grown to `h·|sin| + w·|cos|` by `h·|cos| + w·|sin|`, truncated
/// to whole pixels, and the returned affine already includes the recentering shift,
/// so it maps original corners straight onto output coordinates.
pub fn rotate2d(sprite: &DynamicImage, angle_degrees: f64) -> MosaicResult<TransformedSprite> {
    let rgba = sprite.to_rgba8();
    let (w, h) = rgba.dimensions();
    let source_size = PixelSize::new(w, h);

    let rad = angle_degrees.to_radians();
    let (sin, cos) = (rad.sin().abs(), rad.cos().abs());
    let new_w = ((f64::from(h) * sin + f64::from(w) * cos) as u32).max(1);
    let new_h = ((f64::from(h) * cos + f64::from(w) * sin) as u32).max(1);

    // Pivot on the integer pixel center, then re-center in the grown raster.
    let center = Vec2::new(f64::from(w / 2), f64::from(h / 2));
    let out_center = Vec2::new(f64::from(new_w) / 2.0, f64::from(new_h) / 2.0);
    let affine = Affine::translate(out_center) * Affine::rotate(-rad) * Affine::translate(-center);

    let descriptor = TransformDescriptor::Affine(affine);
    let out_size = PixelSize::new(new_w, new_h);
    let pixels = warp_rgba(&rgba, &descriptor, out_size)?;

    Ok(TransformedSprite {
        pixels,
        polygon: descriptor.project_corners(source_size),
        descriptor,
        source_size,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/transform/rotate.rs"]
mod tests;

use image::{Rgba, RgbaImage, imageops};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use crate::foundation::core::PixelSize;
use crate::foundation::error::MosaicResult;
use crate::transform::descriptor::TransformDescriptor;

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Renders `src` through `forward` into a fresh `out`-sized raster.
///
/// Bilinear filtering; samples that fall outside `src` blend towards transparent black.
pub(crate) fn warp_rgba(
    src: &RgbaImage,
    forward: &TransformDescriptor,
    out: PixelSize,
) -> MosaicResult<RgbaImage> {
    // Bilinear lookups need all four neighbours in bounds; the frame keeps edge pixels.
    let mut framed = RgbaImage::from_pixel(src.width() + 2, src.height() + 2, TRANSPARENT);
    imageops::replace(&mut framed, src, 1, 1);
    let projection = Projection::translate(-1.0, -1.0).and_then(forward.projection()?);

    let mut dst = RgbaImage::from_pixel(out.width, out.height, TRANSPARENT);
    warp_into(
        &framed,
        &projection,
        Interpolation::Bilinear,
        TRANSPARENT,
        &mut dst,
    );
    Ok(dst)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/warp.rs"]
mod tests;

//! Sprite geometry: planar rotation and simulated perspective tilt.
//!
//! Every transform returns a [`TransformedSprite`] that carries the rendered pixels
//! together with the exact [`TransformDescriptor`] used to produce them.

pub(crate) mod descriptor;
pub(crate) mod perspective;
pub(crate) mod rotate;
pub(crate) mod warp;

use image::RgbaImage;

use crate::foundation::core::PixelSize;

pub use descriptor::{Homography, Polygon4, TransformDescriptor};
pub use perspective::{PerspectiveRange, rotate3d, rotate3d_sampled};
pub use rotate::rotate2d;

/// Output of a sprite transform.
#[derive(Clone, Debug)]
pub struct TransformedSprite {
    /// Rendered RGBA pixels; uncovered area is transparent black.
    pub pixels: RgbaImage,
    /// Transform mapping source-sprite coordinates into `pixels` coordinates.
    pub descriptor: TransformDescriptor,
    /// Source sprite corners under `descriptor`.
    pub polygon: Polygon4,
    /// Dimensions of the untransformed source sprite.
    pub source_size: PixelSize,
}

impl TransformedSprite {
    /// Dimensions of the rendered raster.
    pub fn size(&self) -> PixelSize {
        PixelSize::new(self.pixels.width(), self.pixels.height())
    }
}

use image::DynamicImage;
use nalgebra::{Rotation3, Vector3};
use rand::Rng;

use crate::foundation::core::{AngleRange, PixelSize, Point};
use crate::foundation::error::{MosaicError, MosaicResult};
use crate::transform::{
    TransformedSprite,
    descriptor::{Homography, Polygon4, TransformDescriptor},
    warp::warp_rgba,
};

/// Sampling ranges for [`rotate3d_sampled`]: `theta` turns the card about the vertical
/// axis, `phi` tips it about the horizontal axis.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct PerspectiveRange {
    /// Turn about the vertical axis, in degrees.
    pub theta: AngleRange,
    /// Tip about the horizontal axis, in degrees.
    pub phi: AngleRange,
}

impl PerspectiveRange {
    /// Gentle tilt used for ordinary placements.
    pub const MILD: Self = Self {
        theta: AngleRange::symmetric(30.0),
        phi: AngleRange::symmetric(15.0),
    };

    /// Strong tilt, including cards seen from behind.
    pub const WIDE: Self = Self {
        theta: AngleRange::symmetric(180.0),
        phi: AngleRange::symmetric(30.0),
    };

    /// Validates both ranges; `what` prefixes the field names.
    pub fn validate(self, what: &str) -> MosaicResult<()> {
        self.theta.validate(&format!("{what}.theta"))?;
        self.phi.validate(&format!("{what}.phi"))
    }
}

/// [`rotate3d`] with both angles drawn uniformly from `range`.
pub fn rotate3d_sampled<R: Rng + ?Sized>(
    sprite: &DynamicImage,
    range: PerspectiveRange,
    rng: &mut R,
) -> MosaicResult<TransformedSprite> {
    let theta = range.theta.sample_uniform(rng);
    let phi = range.phi.sample_uniform(rng);
    rotate3d(sprite, theta, phi)
}

/// Tilts `sprite` in 3D and renders it through a pinhole projection.
///
/// The flat card sits in the `z = 0` plane centered on the origin and is rotated by
/// `Ry(theta)·Rx(phi)`. Each corner is projected with `(X, Y)·f/(Z + f)` where
/// `f = max(w, h)`, the projected quad is shifted so its minimum lands at the origin,
/// and the pixels are warped through the homography fitted to the four corner pairs.
///
/// The returned polygon is the shifted projected quad, which the homography maps the
/// source corners onto.
pub fn rotate3d(
    sprite: &DynamicImage,
    theta_degrees: f64,
    phi_degrees: f64,
) -> MosaicResult<TransformedSprite> {
    let rgba = sprite.to_rgba8();
    let (w, h) = rgba.dimensions();
    let source_size = PixelSize::new(w, h);
    let (wf, hf) = (f64::from(w), f64::from(h));

    let rot = Rotation3::from_axis_angle(&Vector3::y_axis(), theta_degrees.to_radians())
        * Rotation3::from_axis_angle(&Vector3::x_axis(), phi_degrees.to_radians());
    let focal = wf.max(hf);

    let source = Polygon4::from_size(source_size);
    let mut projected = [Point::ZERO; 4];
    for (dst, corner) in projected.iter_mut().zip(source.points()) {
        let p = rot * Vector3::new(corner.x - wf / 2.0, corner.y - hf / 2.0, 0.0);
        let depth = p.z + focal;
        if depth <= f64::EPSILON {
            return Err(MosaicError::geometry(format!(
                "corner projects behind the camera (theta={theta_degrees}, phi={phi_degrees})"
            )));
        }
        let factor = focal / depth;
        *dst = Point::new(p.x * factor, p.y * factor);
    }

    let extent = Polygon4(projected).bounds();
    let out_w = extent.width() as u32;
    let out_h = extent.height() as u32;
    if out_w == 0 || out_h == 0 {
        return Err(MosaicError::geometry(format!(
            "projection collapses to {out_w}x{out_h} (theta={theta_degrees}, phi={phi_degrees})"
        )));
    }

    let polygon = Polygon4(projected.map(|p| Point::new(p.x - extent.x0, p.y - extent.y0)));
    let homography = Homography::from_quad_to_quad(source.points(), polygon.points())?;
    let descriptor = TransformDescriptor::Homography(homography);
    let pixels = warp_rgba(&rgba, &descriptor, PixelSize::new(out_w, out_h))?;

    Ok(TransformedSprite {
        pixels,
        descriptor,
        polygon,
        source_size,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/transform/perspective.rs"]
mod tests;

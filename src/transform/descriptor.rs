use imageproc::geometric_transformations::Projection;
use nalgebra::{Matrix3, SMatrix, SVector, Vector3};

use crate::foundation::core::{Affine, PixelSize, Point, Rect, Vec2};
use crate::foundation::error::{MosaicError, MosaicResult};

/// Four corners of a transformed sprite, ordered top-left, top-right, bottom-right,
/// bottom-left in the sprite's own frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Polygon4(pub [Point; 4]);

impl Polygon4 {
    /// Corners of an untransformed `size` raster anchored at the origin.
    pub fn from_size(size: PixelSize) -> Self {
        let (w, h) = (size.width_f64(), size.height_f64());
        Self([
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ])
    }

    /// Corners in order.
    pub fn points(&self) -> &[Point; 4] {
        &self.0
    }

    /// Polygon shifted by `offset`.
    pub fn translate(self, offset: Vec2) -> Self {
        Self(self.0.map(|p| p + offset))
    }

    /// Axis-aligned extent of the four corners.
    pub fn bounds(&self) -> Rect {
        let [a, b, c, d] = self.0;
        Rect::from_points(a, b).union_pt(c).union_pt(d)
    }

    /// Whether every coordinate is finite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|p| p.x.is_finite() && p.y.is_finite())
    }
}

/// Projective 3x3 transform with `h33` normalized to 1.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Homography(Matrix3<f64>);

impl Homography {
    /// Wraps a matrix acting on column vectors `(x, y, 1)`.
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        Self(m)
    }

    /// Underlying 3x3 matrix.
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }

    /// Exact homography taking each `src[i]` onto `dst[i]`.
    ///
    /// Solves the 8x8 system obtained by fixing `h33 = 1`, which is what a
    /// four-point perspective fit reduces to.
    pub fn from_quad_to_quad(src: &[Point; 4], dst: &[Point; 4]) -> MosaicResult<Self> {
        let mut a = SMatrix::<f64, 8, 8>::zeros();
        let mut b = SVector::<f64, 8>::zeros();

        for (i, (s, d)) in src.iter().zip(dst.iter()).enumerate() {
            let (x, y, u, v) = (s.x, s.y, d.x, d.y);
            let r0 = 2 * i;
            let r1 = 2 * i + 1;

            a[(r0, 0)] = x;
            a[(r0, 1)] = y;
            a[(r0, 2)] = 1.0;
            a[(r0, 6)] = -x * u;
            a[(r0, 7)] = -y * u;
            b[r0] = u;

            a[(r1, 3)] = x;
            a[(r1, 4)] = y;
            a[(r1, 5)] = 1.0;
            a[(r1, 6)] = -x * v;
            a[(r1, 7)] = -y * v;
            b[r1] = v;
        }

        let h = a
            .lu()
            .solve(&b)
            .ok_or_else(|| MosaicError::geometry("quad correspondence is singular"))?;
        if h.iter().any(|v| !v.is_finite()) {
            return Err(MosaicError::geometry("homography has non-finite entries"));
        }

        Ok(Self(Matrix3::new(
            h[0], h[1], h[2], //
            h[3], h[4], h[5], //
            h[6], h[7], 1.0,
        )))
    }

    /// Maps `p` through the homography. Points on the line at infinity come back
    /// non-finite.
    pub fn apply(&self, p: Point) -> Point {
        let v = self.0 * Vector3::new(p.x, p.y, 1.0);
        if v.z.abs() < f64::EPSILON {
            return Point::new(f64::INFINITY, f64::INFINITY);
        }
        Point::new(v.x / v.z, v.y / v.z)
    }

    /// Inverse map, if the matrix is invertible.
    pub fn inverse(&self) -> MosaicResult<Self> {
        self.0
            .try_inverse()
            .map(Self)
            .ok_or_else(|| MosaicError::geometry("homography is not invertible"))
    }
}

/// The one transform that both warps a sprite's pixels and projects its corners.
///
/// Box derivation always goes through [`TransformDescriptor::project_corners`] on the
/// same value that was used to render, so reported boxes cannot drift from pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TransformDescriptor {
    /// 2x3 affine map (planar rotation).
    Affine(Affine),
    /// 3x3 projective map (simulated tilt).
    Homography(Homography),
}

impl TransformDescriptor {
    /// Maps one point through the transform.
    pub fn map_point(&self, p: Point) -> Point {
        match self {
            Self::Affine(a) => *a * p,
            Self::Homography(h) => h.apply(p),
        }
    }

    /// Corner polygon of a `size` sprite under this transform, in the transformed
    /// raster's coordinates.
    pub fn project_corners(&self, size: PixelSize) -> Polygon4 {
        let Polygon4(corners) = Polygon4::from_size(size);
        Polygon4(corners.map(|p| self.map_point(p)))
    }

    /// The same map as an `imageproc` projection, for pixel warping.
    pub fn projection(&self) -> MosaicResult<Projection> {
        let m: [f64; 9] = match self {
            Self::Affine(a) => {
                let [a, b, c, d, e, f] = a.as_coeffs();
                [a, c, e, b, d, f, 0.0, 0.0, 1.0]
            }
            Self::Homography(h) => {
                let m = h.matrix();
                std::array::from_fn(|i| m[(i / 3, i % 3)])
            }
        };
        if m.iter().any(|v| !v.is_finite()) || m[8].abs() < f64::EPSILON {
            return Err(MosaicError::geometry("transform has no finite projection"));
        }
        Projection::from_matrix(m.map(|v| v as f32))
            .ok_or_else(|| MosaicError::geometry("transform is not invertible"))
    }

    /// Inverse transform.
    pub fn inverse(&self) -> MosaicResult<Self> {
        match self {
            Self::Affine(a) => {
                let det = a.determinant();
                if !det.is_finite() || det.abs() < f64::EPSILON {
                    return Err(MosaicError::geometry("affine transform is not invertible"));
                }
                Ok(Self::Affine(a.inverse()))
            }
            Self::Homography(h) => h.inverse().map(Self::Homography),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/transform/descriptor.rs"]
mod tests;

use rand::Rng;

use crate::foundation::error::{MosaicError, MosaicResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Integer raster dimensions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct PixelSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl PixelSize {
    /// Size of `width` by `height` pixels.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Rejects a zero dimension; `what` names the field in the error.
    pub fn validate(self, what: &str) -> MosaicResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(MosaicError::validation(format!(
                "{what} must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    /// Width as `f64`.
    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    /// Height as `f64`.
    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }
}

/// Closed interval of angles, in degrees.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct AngleRange {
    /// Lower bound, inclusive.
    pub min: f64,
    /// Upper bound, inclusive.
    pub max: f64,
}

impl AngleRange {
    /// Range `[min, max]`.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Range symmetric around zero: `[-half_width, half_width]`.
    pub const fn symmetric(half_width: f64) -> Self {
        Self {
            min: -half_width,
            max: half_width,
        }
    }

    /// Rejects non-finite or inverted bounds; `what` names the field in the error.
    pub fn validate(self, what: &str) -> MosaicResult<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(MosaicError::validation(format!(
                "{what} must be a finite range with min <= max, got [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Continuous uniform sample in `[min, max]`.
    pub fn sample_uniform<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        if self.min == self.max {
            return self.min;
        }
        rng.gen_range(self.min..=self.max)
    }

    /// [`AngleRange::validate`], additionally requiring at least one whole degree in
    /// the range, for ranges read by [`AngleRange::sample_whole`].
    pub fn validate_whole(self, what: &str) -> MosaicResult<()> {
        self.validate(what)?;
        if self.min.ceil() > self.max.floor() {
            return Err(MosaicError::validation(format!(
                "{what} must contain a whole degree, got [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }

    /// Uniform sample over the whole degrees contained in the range.
    ///
    /// A range without a whole degree falls back to [`AngleRange::sample_uniform`], so
    /// the result never leaves `[min, max]`.
    pub fn sample_whole<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        let (lo, hi) = (self.min.ceil(), self.max.floor());
        if lo > hi {
            return self.sample_uniform(rng);
        }
        f64::from(rng.gen_range(lo as i32..=hi as i32))
    }

    /// Whole-degree magnitude from the range with a random sign.
    pub fn sample_whole_signed<R: Rng + ?Sized>(self, rng: &mut R) -> f64 {
        let magnitude = self.sample_whole(rng);
        if rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;

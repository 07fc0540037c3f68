use std::path::{Path, PathBuf};

use anyhow::Context as _;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_hollow_circle_mut;
use rand::Rng;

use crate::foundation::core::PixelSize;
use crate::foundation::error::MosaicResult;

/// Procedural backdrops written for use as a local background folder.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Backdrop {
    /// Solid white.
    White,
    /// Solid black.
    Black,
    /// Solid mid gray.
    Gray,
    /// Solid light blue.
    LightBlue,
    /// Solid light green.
    LightGreen,
    /// Per-pixel gray-ish noise.
    Noise,
    /// Black to white, left to right.
    HorizontalGradient,
    /// Black to white, top to bottom.
    VerticalGradient,
    /// 100 px squares in two light grays.
    Checkerboard,
    /// Concentric rings around the center.
    Circles,
}

const CHECKER_SQUARE: u32 = 100;
const RING_SPACING: usize = 100;

impl Backdrop {
    /// Every backdrop, in file order.
    pub const ALL: [Self; 10] = [
        Self::White,
        Self::Black,
        Self::Gray,
        Self::LightBlue,
        Self::LightGreen,
        Self::Noise,
        Self::HorizontalGradient,
        Self::VerticalGradient,
        Self::Checkerboard,
        Self::Circles,
    ];

    /// File name the backdrop is saved under.
    pub fn file_name(self) -> &'static str {
        match self {
            Self::White => "white_bg.png",
            Self::Black => "black_bg.png",
            Self::Gray => "gray_bg.png",
            Self::LightBlue => "blue_light_bg.png",
            Self::LightGreen => "green_light_bg.png",
            Self::Noise => "noise_bg.png",
            Self::HorizontalGradient => "gradient_h_bg.png",
            Self::VerticalGradient => "gradient_v_bg.png",
            Self::Checkerboard => "checker_bg.png",
            Self::Circles => "circles_bg.png",
        }
    }

    /// Renders the backdrop at `size`; only [`Backdrop::Noise`] draws from `rng`.
    pub fn render<R: Rng + ?Sized>(self, size: PixelSize, rng: &mut R) -> RgbImage {
        let (w, h) = (size.width, size.height);
        let solid = |c: [u8; 3]| RgbImage::from_pixel(w, h, Rgb(c));
        match self {
            Self::White => solid([255, 255, 255]),
            Self::Black => solid([0, 0, 0]),
            Self::Gray => solid([128, 128, 128]),
            Self::LightBlue => solid([150, 200, 230]),
            Self::LightGreen => solid([180, 220, 180]),
            Self::Noise => RgbImage::from_fn(w, h, |_, _| {
                Rgb([
                    rng.gen_range(100..200),
                    rng.gen_range(100..200),
                    rng.gen_range(100..200),
                ])
            }),
            Self::HorizontalGradient => RgbImage::from_fn(w, h, |x, _| {
                let v = ramp(x, w);
                Rgb([v, v, v])
            }),
            Self::VerticalGradient => RgbImage::from_fn(w, h, |_, y| {
                let v = ramp(y, h);
                Rgb([v, v, v])
            }),
            Self::Checkerboard => RgbImage::from_fn(w, h, |x, y| {
                let even = (x / CHECKER_SQUARE + y / CHECKER_SQUARE) % 2 == 0;
                let v = if even { 255 } else { 200 };
                Rgb([v, v, v])
            }),
            Self::Circles => {
                let mut img = solid([220, 220, 220]);
                let center = ((w / 2) as i32, (h / 2) as i32);
                let limit = (w.min(h) / 2) as i32;
                for radius in (50..limit).step_by(RING_SPACING) {
                    // two-pixel ring
                    draw_hollow_circle_mut(&mut img, center, radius, Rgb([180, 180, 180]));
                    draw_hollow_circle_mut(&mut img, center, radius + 1, Rgb([180, 180, 180]));
                }
                img
            }
        }
    }
}

fn ramp(pos: u32, len: u32) -> u8 {
    (255 * u64::from(pos) / u64::from(len.max(1))) as u8
}

/// Writes every [`Backdrop`] into `dir` and returns the written paths.
pub fn write_backdrops<R: Rng + ?Sized>(
    dir: &Path,
    size: PixelSize,
    rng: &mut R,
) -> MosaicResult<Vec<PathBuf>> {
    size.validate("backdrop size")?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("create backdrop dir '{}'", dir.display()))?;
    let mut written = Vec::with_capacity(Backdrop::ALL.len());
    for backdrop in Backdrop::ALL {
        let path = dir.join(backdrop.file_name());
        backdrop
            .render(size, rng)
            .save(&path)
            .with_context(|| format!("write backdrop '{}'", path.display()))?;
        written.push(path);
    }
    tracing::info!(dir = %dir.display(), count = written.len(), "backdrops written");
    Ok(written)
}

#[cfg(test)]
#[path = "../../tests/unit/render/backdrop.rs"]
mod tests;

use image::{RgbImage, RgbaImage};

use crate::foundation::math::mul_div255;

/// Raster that can be placed onto an RGB canvas.
#[derive(Clone, Copy, Debug)]
pub enum Layer<'a> {
    /// Opaque pixels: the covered region is overwritten.
    Opaque(&'a RgbImage),
    /// Straight-alpha pixels: blended as `src·a + dst·(1 - a)`.
    Alpha(&'a RgbaImage),
}

impl<'a> From<&'a RgbImage> for Layer<'a> {
    fn from(value: &'a RgbImage) -> Self {
        Self::Opaque(value)
    }
}

impl<'a> From<&'a RgbaImage> for Layer<'a> {
    fn from(value: &'a RgbaImage) -> Self {
        Self::Alpha(value)
    }
}

impl Layer<'_> {
    fn dimensions(&self) -> (u32, u32) {
        match self {
            Layer::Opaque(img) => img.dimensions(),
            Layer::Alpha(img) => img.dimensions(),
        }
    }
}

/// Overlap between a layer placed at some offset and the canvas, in both frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Overlap {
    canvas_x: u32,
    canvas_y: u32,
    layer_x: u32,
    layer_y: u32,
    width: u32,
    height: u32,
}

fn overlap(canvas: (u32, u32), layer: (u32, u32), x: i64, y: i64) -> Option<Overlap> {
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + i64::from(layer.0)).min(i64::from(canvas.0));
    let y_end = (y + i64::from(layer.1)).min(i64::from(canvas.1));
    if x_end <= x_start || y_end <= y_start {
        return None;
    }
    Some(Overlap {
        canvas_x: x_start as u32,
        canvas_y: y_start as u32,
        layer_x: (x_start - x) as u32,
        layer_y: (y_start - y) as u32,
        width: (x_end - x_start) as u32,
        height: (y_end - y_start) as u32,
    })
}

/// Draws `layer` onto `canvas` with its top-left corner at `(x, y)`.
///
/// Only the part that intersects the canvas is touched; a placement entirely outside
/// leaves the canvas as it was. The layer itself is never modified.
pub fn overlay<'a>(canvas: &mut RgbImage, layer: impl Into<Layer<'a>>, x: i64, y: i64) {
    let layer = layer.into();
    let Some(ov) = overlap(canvas.dimensions(), layer.dimensions(), x, y) else {
        return;
    };

    for row in 0..ov.height {
        for col in 0..ov.width {
            let (cx, cy) = (ov.canvas_x + col, ov.canvas_y + row);
            let (lx, ly) = (ov.layer_x + col, ov.layer_y + row);
            let dst = canvas.get_pixel_mut(cx, cy);
            match layer {
                Layer::Opaque(img) => *dst = *img.get_pixel(lx, ly),
                Layer::Alpha(img) => {
                    let src = img.get_pixel(lx, ly).0;
                    dst.0 = blend_straight(dst.0, src);
                }
            }
        }
    }
}

fn blend_straight(dst: [u8; 3], src: [u8; 4]) -> [u8; 3] {
    let a = u16::from(src[3]);
    if a == 0 {
        return dst;
    }
    let inv = 255 - a;
    let mut out = [0u8; 3];
    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), a);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;

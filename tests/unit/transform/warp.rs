use super::*;
use crate::foundation::core::{Affine, Point, Vec2};

fn checker(w: u32, h: u32) -> RgbaImage {
    RgbaImage::from_fn(w, h, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([255, 0, 0, 255])
        } else {
            Rgba([0, 0, 255, 255])
        }
    })
}

#[test]
fn identity_warp_copies_pixels() {
    let src = checker(6, 4);
    let out = warp_rgba(
        &src,
        &TransformDescriptor::Affine(Affine::IDENTITY),
        PixelSize::new(6, 4),
    )
    .unwrap();
    assert_eq!(out, src);
}

#[test]
fn integer_translation_shifts_pixels_and_pads_transparent() {
    let src = checker(4, 4);
    let out = warp_rgba(
        &src,
        &TransformDescriptor::Affine(Affine::translate(Vec2::new(2.0, 1.0))),
        PixelSize::new(6, 5),
    )
    .unwrap();
    assert_eq!(out.get_pixel(2, 1), src.get_pixel(0, 0));
    assert_eq!(out.get_pixel(5, 4), src.get_pixel(3, 3));
    assert_eq!(out.get_pixel(0, 0).0, [0, 0, 0, 0]);
}

#[test]
fn half_pixel_offset_blends_neighbours() {
    let src = RgbaImage::from_fn(2, 1, |x, _| {
        if x == 0 {
            Rgba([0, 0, 0, 255])
        } else {
            Rgba([200, 200, 200, 255])
        }
    });
    let out = warp_rgba(
        &src,
        &TransformDescriptor::Affine(Affine::translate(Vec2::new(-0.5, 0.0))),
        PixelSize::new(1, 1),
    )
    .unwrap();
    assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100, 255]);
}

#[test]
fn quarter_turn_lands_pixels_where_corners_project() {
    // 3x2 source turned onto a 2x3 raster: (x, y) -> (1 - y, x).
    let src = RgbaImage::from_fn(3, 2, |x, y| Rgba([(10 * x + y) as u8, 0, 0, 255]));
    let forward = TransformDescriptor::Affine(Affine::new([0.0, 1.0, -1.0, 0.0, 1.0, 0.0]));
    let out = warp_rgba(&src, &forward, PixelSize::new(2, 3)).unwrap();
    for (x, y, px) in src.enumerate_pixels() {
        let p = forward.map_point(Point::new(f64::from(x), f64::from(y)));
        assert_eq!(out.get_pixel(p.x.round() as u32, p.y.round() as u32), px);
    }
}

#[test]
fn edge_pixels_survive_the_warp() {
    let src = checker(5, 3);
    let out = warp_rgba(
        &src,
        &TransformDescriptor::Affine(Affine::translate(Vec2::new(1.0, 1.0))),
        PixelSize::new(7, 5),
    )
    .unwrap();
    assert_eq!(out.get_pixel(5, 3), src.get_pixel(4, 2));
    assert_eq!(out.get_pixel(1, 1), src.get_pixel(0, 0));
    assert_eq!(out.get_pixel(6, 4).0, [0, 0, 0, 0]);
}

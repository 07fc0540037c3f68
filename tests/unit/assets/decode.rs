use std::io::Cursor;

use image::{Rgb, RgbImage, Rgba, RgbaImage};

use super::*;

fn png_bytes(img: DynamicImage) -> Vec<u8> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_resizes_to_sprite_size() {
    let bytes = png_bytes(DynamicImage::ImageRgb8(RgbImage::from_pixel(
        56,
        76,
        Rgb([9, 9, 9]),
    )));
    let sprite = decode_sprite(&bytes, PixelSize::new(28, 38)).unwrap();
    assert_eq!((sprite.width(), sprite.height()), (28, 38));
    assert!(sprite.as_rgb8().is_some());
}

#[test]
fn alpha_sources_stay_rgba() {
    let bytes = png_bytes(DynamicImage::ImageRgba8(RgbaImage::from_pixel(
        4,
        4,
        Rgba([1, 2, 3, 100]),
    )));
    let sprite = decode_sprite(&bytes, PixelSize::new(4, 4)).unwrap();
    assert_eq!(sprite.as_rgba8().unwrap().get_pixel(0, 0).0, [1, 2, 3, 100]);
}

#[test]
fn garbage_bytes_fail_to_decode() {
    assert!(decode_sprite(b"not an image", PixelSize::new(4, 4)).is_err());
}

#[test]
fn listing_filters_and_sorts_image_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["b.PNG", "a.jpg", "notes.txt", "c.jpeg"] {
        std::fs::write(dir.path().join(name), b"x").unwrap();
    }
    std::fs::create_dir(dir.path().join("nested.png")).unwrap();
    let names: Vec<String> = list_image_files(dir.path())
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.jpg", "b.PNG", "c.jpeg"]);
}

#[test]
fn listing_missing_directory_errors() {
    assert!(list_image_files(Path::new("/no/such/dir/anywhere")).is_err());
}

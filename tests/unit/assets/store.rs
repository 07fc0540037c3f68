use image::{Rgb, RgbImage};

use super::*;

fn write_png(dir: &Path, name: &str, w: u32, h: u32) {
    RgbImage::from_pixel(w, h, Rgb([10, 20, 30]))
        .save(dir.join(name))
        .unwrap();
}

#[test]
fn cards_are_resized_and_identified() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "card_001_x.png", 56, 76);
    write_png(dir.path(), "mystery.png", 28, 38);
    std::fs::write(dir.path().join("broken_002_.png"), b"not a png").unwrap();

    let pool = SpritePool::load_cards(
        dir.path(),
        PixelSize::new(28, 38),
        &CardIdParserChain::default(),
    )
    .unwrap();

    assert_eq!(pool.len(), 2);
    assert_eq!(pool.skipped(), 1);
    let first = &pool.sprites()[0];
    assert_eq!(first.file_name(), "card_001_x.png");
    assert_eq!(first.size(), PixelSize::new(28, 38));
    assert_eq!(first.card_id.as_ref().map(CardId::as_str), Some("001"));
    assert_eq!(pool.sprites()[1].card_id, None);
}

#[test]
fn fillers_never_carry_identifiers() {
    let dir = tempfile::tempdir().unwrap();
    write_png(dir.path(), "fake_001_.png", 8, 8);
    let pool = SpritePool::load_fillers(dir.path(), PixelSize::new(8, 8)).unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool.sprites()[0].card_id, None);
}

#[test]
fn class_lookup_goes_through_the_map() {
    let map = ClassMap::from_rows([("001/050", "Bulbasaur")]).unwrap();
    let px = DynamicImage::ImageRgb8(RgbImage::new(2, 2));
    let known = CardSprite::new(px.clone(), "a.png".into(), Some(CardId::from_token("1")));
    let unknown = CardSprite::new(px.clone(), "b.png".into(), Some(CardId::from_token("9")));
    let anonymous = CardSprite::new(px, "c.png".into(), None);
    assert_eq!(known.class_id(&map), Some(1));
    assert_eq!(unknown.class_id(&map), None);
    assert_eq!(anonymous.class_id(&map), None);
}

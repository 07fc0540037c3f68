use image::{Rgba, RgbaImage};
use rand::{SeedableRng, rngs::StdRng};

use super::*;
use crate::assets::SpritePool;
use crate::dataset::CardId;
use crate::render::FillerTiling;

const CANVAS: PixelSize = PixelSize::new(1920, 1080);

fn card(id: Option<&str>) -> CardSprite {
    let pixels = DynamicImage::ImageRgba8(RgbaImage::from_pixel(280, 380, Rgba([30, 60, 200, 255])));
    CardSprite::new(
        pixels,
        "card_001_x.png".into(),
        id.map(CardId::from_token),
    )
}

fn bulbasaur() -> ClassMap {
    ClassMap::from_rows([("001/050", "Bulbasaur")]).unwrap()
}

fn upright() -> PlacementRanges {
    PlacementRanges {
        mild_rotation: AngleRange::new(0.0, 0.0),
        ..PlacementRanges::default()
    }
}

fn job<'a>(group: Vec<&'a CardSprite>, layout_mode: LayoutMode, transform_mode: TransformMode) -> LayoutJob<'a> {
    LayoutJob {
        index: 1,
        group,
        layout_mode,
        // No local folder configured: white backdrop, no IO.
        background_mode: BackgroundMode::Local,
        transform_mode,
    }
}

#[test]
fn upright_card_in_first_grid_cell_has_hand_computed_box() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let engine = LayoutEngine::new(GridSpec::default(), upright(), BoxClipping::Keep, &map, &backgrounds)
        .unwrap();
    let c = card(Some("001"));

    let out = engine
        .build_layout(&job(vec![&c], LayoutMode::Grid, TransformMode::Planar), &mut StdRng::seed_from_u64(5))
        .unwrap();

    assert_eq!(out.canvas.dimensions(), (1920, 1080));
    assert_eq!(out.annotations.len(), 1);
    let line = out.annotations[0];
    assert_eq!(line.class_id, 1);
    // Cell 455x510 at (20, 20); card offset (87, 65) inside it.
    let b = line.bbox;
    assert!((b.cx - 247.0 / 1920.0).abs() < 1e-9);
    assert!((b.cy - 275.0 / 1080.0).abs() < 1e-9);
    assert!((b.w - 280.0 / 1920.0).abs() < 1e-9);
    assert!((b.h - 380.0 / 1080.0).abs() < 1e-9);
    assert_eq!(out.canvas.get_pixel(247, 275).0, [30, 60, 200]);
    assert_eq!(out.canvas.get_pixel(5, 5).0, [255, 255, 255]);
    assert!(out.stats.background_fallback);
    assert_eq!(out.stats.annotated, 1);
}

#[test]
fn unmapped_cards_are_drawn_but_not_labelled() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let engine = LayoutEngine::new(GridSpec::default(), upright(), BoxClipping::Keep, &map, &backgrounds)
        .unwrap();
    let unknown = card(Some("077"));
    let anonymous = card(None);

    let out = engine
        .build_layout(
            &job(vec![&unknown, &anonymous], LayoutMode::Grid, TransformMode::Planar),
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
    assert!(out.annotations.is_empty());
    assert_eq!(out.stats.placed, 2);
    assert_eq!(out.stats.unlabeled, 2);
    assert_eq!(out.canvas.get_pixel(247, 275).0, [30, 60, 200]);
}

#[test]
fn random_layout_keeps_boxes_on_canvas() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let engine = LayoutEngine::new(
        GridSpec::default(),
        PlacementRanges::default(),
        BoxClipping::Keep,
        &map,
        &backgrounds,
    )
    .unwrap();
    let c = card(Some("001"));
    let group = vec![&c; 8];

    for transform in TransformMode::ALL {
        let out = engine
            .build_layout(&job(group.clone(), LayoutMode::Random, transform), &mut StdRng::seed_from_u64(11))
            .unwrap();
        assert_eq!(out.annotations.len(), 8);
        for line in &out.annotations {
            let r = line.bbox.to_pixel_rect(CANVAS);
            // Rasters are truncated to whole pixels, so corners may poke out by < 1 px.
            assert!(r.x0 > -1.0 && r.y0 > -1.0, "{r:?}");
            assert!(r.x1 < 1921.0 && r.y1 < 1081.0, "{r:?}");
        }
    }
}

#[test]
fn same_seed_gives_identical_layout() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let engine = LayoutEngine::new(
        GridSpec::default(),
        PlacementRanges::default(),
        BoxClipping::Keep,
        &map,
        &backgrounds,
    )
    .unwrap();
    let c = card(Some("001"));
    let j = job(vec![&c, &c, &c], LayoutMode::StrongRotation, TransformMode::Perspective);

    let a = engine.build_layout(&j, &mut StdRng::seed_from_u64(99)).unwrap();
    let b = engine.build_layout(&j, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(a.canvas, b.canvas);
    assert_eq!(a.annotations, b.annotations);
}

#[test]
fn edge_on_perspective_is_skipped_and_counted() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let ranges = PlacementRanges {
        mild_perspective: PerspectiveRange {
            theta: AngleRange::new(90.0, 90.0),
            phi: AngleRange::new(0.0, 0.0),
        },
        ..PlacementRanges::default()
    };
    let engine = LayoutEngine::new(GridSpec::default(), ranges, BoxClipping::Keep, &map, &backgrounds)
        .unwrap();
    let c = card(Some("001"));

    let out = engine
        .build_layout(&job(vec![&c], LayoutMode::Grid, TransformMode::Perspective), &mut StdRng::seed_from_u64(0))
        .unwrap();
    assert_eq!(out.stats.degenerate, 1);
    assert_eq!(out.stats.placed, 0);
    assert!(out.annotations.is_empty());
}

#[test]
fn oversized_group_is_rejected_for_grid_layouts() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let engine = LayoutEngine::new(GridSpec::default(), upright(), BoxClipping::Keep, &map, &backgrounds)
        .unwrap();
    let c = card(Some("001"));
    let err = engine
        .build_layout(&job(vec![&c; 9], LayoutMode::Grid, TransformMode::Planar), &mut StdRng::seed_from_u64(0))
        .unwrap_err();
    assert!(matches!(err, MosaicError::Validation(_)));
}

#[test]
fn engine_rejects_out_of_range_flip_probability() {
    let fillers = SpritePool::default();
    let backgrounds = BackgroundSynthesizer::new(CANVAS, &fillers, FillerTiling::default());
    let map = bulbasaur();
    let ranges = PlacementRanges {
        flip_probability: 1.5,
        ..PlacementRanges::default()
    };
    let err = LayoutEngine::new(GridSpec::default(), ranges, BoxClipping::Keep, &map, &backgrounds)
        .err()
        .unwrap();
    assert!(matches!(err, MosaicError::Validation(_)));
}

#[test]
fn invalid_flip_probability_fails_validation() {
    let ranges = PlacementRanges {
        flip_probability: 1.5,
        ..PlacementRanges::default()
    };
    assert!(ranges.validate().is_err());
    assert!(PlacementRanges::default().validate().is_ok());
}

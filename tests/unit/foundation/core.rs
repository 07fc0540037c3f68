use rand::{SeedableRng, rngs::StdRng};

use super::*;

#[test]
fn pixel_size_rejects_zero_dimensions() {
    assert!(PixelSize::new(0, 10).validate("canvas").is_err());
    assert!(PixelSize::new(10, 0).validate("canvas").is_err());
    PixelSize::new(1920, 1080).validate("canvas").unwrap();
}

#[test]
fn angle_range_validation() {
    AngleRange::new(10.0, 20.0).validate("r").unwrap();
    assert!(AngleRange::new(20.0, 10.0).validate("r").is_err());
    assert!(AngleRange::new(f64::NAN, 10.0).validate("r").is_err());
}

#[test]
fn whole_samples_stay_in_range_and_are_integral() {
    let mut rng = StdRng::seed_from_u64(7);
    let r = AngleRange::new(10.0, 20.0);
    for _ in 0..200 {
        let a = r.sample_whole(&mut rng);
        assert_eq!(a, a.trunc());
        assert!((10.0..=20.0).contains(&a));
    }
}

#[test]
fn signed_samples_cover_both_signs() {
    let mut rng = StdRng::seed_from_u64(3);
    let r = AngleRange::new(10.0, 20.0);
    let mut neg = false;
    let mut pos = false;
    for _ in 0..200 {
        let a = r.sample_whole_signed(&mut rng);
        assert!((10.0..=20.0).contains(&a.abs()));
        neg |= a < 0.0;
        pos |= a > 0.0;
    }
    assert!(neg && pos);
}

#[test]
fn degenerate_range_samples_its_single_value() {
    let mut rng = StdRng::seed_from_u64(1);
    let r = AngleRange::symmetric(0.0);
    assert_eq!(r.sample_uniform(&mut rng), 0.0);
    assert_eq!(r.sample_whole(&mut rng), 0.0);
}

#[test]
fn range_without_whole_degree_fails_whole_validation() {
    let r = AngleRange::new(10.2, 10.8);
    r.validate("r").unwrap();
    assert!(r.validate_whole("r").is_err());
    AngleRange::new(10.2, 11.0).validate_whole("r").unwrap();
    AngleRange::symmetric(0.0).validate_whole("r").unwrap();
}

#[test]
fn whole_sampling_never_leaves_a_fractional_range() {
    let mut rng = StdRng::seed_from_u64(11);
    let r = AngleRange::new(10.2, 10.8);
    for _ in 0..100 {
        let a = r.sample_whole(&mut rng);
        assert!((10.2..=10.8).contains(&a), "sampled {a}");
        let s = r.sample_whole_signed(&mut rng);
        assert!((10.2..=10.8).contains(&s.abs()), "sampled {s}");
    }
}

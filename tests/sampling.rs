//! Sampling pipeline scenarios through the public API.

use funcplot::{Expression, Sample, SampleCache, SampleRange};

#[test]
fn square_over_symmetric_range() {
    let mut cache: SampleCache = SampleCache::new(5);
    cache.set_current(Expression::parse("x^2", &["x"]).unwrap());

    let samples: Vec<Sample> = cache.sample(SampleRange::new(-2.0, 2.0)).to_vec();
    assert_eq!(samples.len(), 5, "no domain errors anywhere in the range");
    for (i, s) in samples.iter().enumerate() {
        assert_eq!(s.y, s.x * s.x, "sample {i} must be an exact square");
        assert_eq!(s.segment_end, i == samples.len() - 1);
    }
    // three interior steps span the range; the first sample sits just
    // left of the lower bound
    assert!(samples[0].x < -2.0);
    let step = samples[1].x - samples[0].x;
    assert!((step - 4.0 / 3.0).abs() < 1e-12);
}

#[test]
fn sqrt_leaves_a_gap_on_the_negative_half() {
    let mut cache: SampleCache = SampleCache::new(20);
    cache.set_current(Expression::parse("sqrt(x)", &["x"]).unwrap());

    let samples = cache.sample(SampleRange::new(-5.0, 5.0));
    assert!(!samples.is_empty());
    // nothing valid below zero: those evaluations fail instead of
    // producing samples
    assert!(samples.iter().all(|s| s.x >= 0.0));
    // one contiguous run, closed exactly once at its end
    assert_eq!(samples.iter().filter(|s| s.segment_end).count(), 1);
    assert!(samples.last().unwrap().segment_end);
    for s in samples {
        assert!((s.y - s.x.sqrt()).abs() < 1e-12);
    }
}

#[test]
fn resampling_same_bounds_returns_identical_samples() {
    let mut cache: SampleCache = SampleCache::new(64);
    cache.set_current(Expression::parse("sin(x)", &["x"]).unwrap());

    let first = cache.sample(SampleRange::new(0.0, 6.28)).to_vec();
    let second = cache.sample(SampleRange::new(0.0, 6.28)).to_vec();
    assert_eq!(first, second);

    // a sub-tolerance wiggle of the bounds is still the same request
    let third = cache
        .sample(SampleRange::new(5e-10, 6.28 - 5e-10))
        .to_vec();
    assert_eq!(first, third);
}

#[test]
fn switching_versions_resamples_the_same_bounds() {
    let mut cache: SampleCache = SampleCache::new(16);
    cache.set_current(Expression::parse("x", &["x"]).unwrap());
    let linear = cache.sample(SampleRange::new(0.0, 1.0)).to_vec();

    cache.set_current(Expression::parse("x+1", &["x"]).unwrap());
    let shifted = cache.sample(SampleRange::new(0.0, 1.0)).to_vec();
    assert_ne!(linear, shifted);
    for (a, b) in linear.iter().zip(&shifted) {
        assert_eq!(a.x, b.x);
        assert!((b.y - (a.y + 1.0)).abs() < 1e-12);
    }

    cache.undo();
    let back = cache.sample(SampleRange::new(0.0, 1.0)).to_vec();
    assert_eq!(linear, back);
}

#[test]
fn empty_cache_samples_nothing() {
    let mut cache: SampleCache = SampleCache::new(16);
    assert!(cache.sample(SampleRange::new(-1.0, 1.0)).is_empty());
    assert_eq!(cache.current_label(), "");
}

//! Engine behavior through the public API, plus history interaction.

use funcplot::{EngineError, Expression, SampleCache};

#[test]
fn sqrt_expression_full_cycle() {
    let expr = Expression::parse("2*5*sqrt(x)+4", &["x"]).unwrap();
    assert_eq!(expr.display_string(), "2*5*sqrt(x)+4");

    // fine on the positive half, a domain error on the negative one
    assert_eq!(expr.evaluate(&[4.0]), Ok(24.0));
    assert_eq!(expr.evaluate(&[-1.0]), Err(EngineError::NotReal));

    let d = expr.derivative("x").unwrap();
    let x = 4.0_f64;
    assert!((d.evaluate(&[x]).unwrap() - 10.0 / (2.0 * x.sqrt())).abs() < 1e-12);

    assert_eq!(
        expr.antiderivative("x", 0.0),
        Err(EngineError::NonPolynomial)
    );

    // the integrand is undefined over most of [-100, 100]
    assert_eq!(
        expr.definite_integral("x", -100.0, 100.0),
        Err(EngineError::IntegralNotReal)
    );
}

#[test]
fn two_variable_expression() {
    let expr = Expression::parse("x^2+y^2", &["x", "y"]).unwrap();
    assert_eq!(expr.evaluate(&[3.0, 4.0]), Ok(25.0));

    let d = expr.derivative("x").unwrap();
    assert_eq!(d.evaluate(&[3.0, 4.0]), Ok(6.0));
    assert_eq!(d.variables(), expr.variables());
}

#[test]
fn sine_of_square() {
    let expr = Expression::parse("sin(x^2)", &["x"]).unwrap();
    assert!((expr.evaluate(&[2.0]).unwrap() - 4.0_f64.sin()).abs() < 1e-15);

    let d = expr.derivative("x").unwrap();
    let x = 1.7_f64;
    assert!((d.evaluate(&[x]).unwrap() - 2.0 * x * (x * x).cos()).abs() < 1e-12);

    assert_eq!(
        expr.antiderivative("x", 0.0),
        Err(EngineError::NonPolynomial)
    );

    // Fresnel-type integral over [0, 1]
    let v = expr.definite_integral("x", 0.0, 1.0).unwrap();
    assert!((v - 0.310268).abs() < 1e-5, "got {v}");
}

#[test]
fn polynomial_antiderivative_round_trip() {
    let expr = Expression::parse("3*x^2-4*x+1", &["x"]).unwrap();
    let anti = expr.antiderivative("x", 2.0).unwrap();
    // F(x) = x^3 - 2 x^2 + x + 2
    for x in [-1.5, 0.0, 0.5, 3.0] {
        let expect = x * x * x - 2.0 * x * x + x + 2.0;
        assert!((anti.evaluate(&[x]).unwrap() - expect).abs() < 1e-9);
    }
    // derived display text is canonical, generated from the tree
    assert_eq!(anti.display_string(), "x^3+-2*x^2+x+2");
}

#[test]
fn undo_redo_through_the_cache() {
    let mut cache: SampleCache = SampleCache::new(16);
    cache.set_current(Expression::parse("x", &["x"]).unwrap());
    cache.set_current(Expression::parse("x^2", &["x"]).unwrap());
    assert_eq!(cache.current_label(), "x^2");

    assert!(cache.undo());
    assert_eq!(cache.current_label(), "x");
    assert!(!cache.undo(), "oldest entry cannot be undone past");

    assert!(cache.redo());
    assert_eq!(cache.current_label(), "x^2");
    assert!(!cache.redo(), "newest entry cannot be redone past");
}

#[test]
fn duplicate_detection_uses_display_text() {
    let mut cache: SampleCache = SampleCache::new(16);
    cache.set_current(Expression::parse("x^2", &["x"]).unwrap());
    assert!(cache.matches_current("x^2"));
    assert!(!cache.matches_current("x ^ 2"));
    assert!(!cache.matches_current("x^3"));
}

#[test]
fn history_is_bounded_to_ten_versions() {
    let mut cache: SampleCache = SampleCache::new(16);
    for i in 0..15 {
        cache.set_current(Expression::parse(&format!("x+{i}"), &["x"]).unwrap());
    }
    assert_eq!(cache.current_label(), "x+14");

    let mut undos = 0;
    while cache.undo() {
        undos += 1;
    }
    assert_eq!(undos, 9, "capacity 10 leaves nine undo steps");
    assert_eq!(cache.current_label(), "x+5");
}

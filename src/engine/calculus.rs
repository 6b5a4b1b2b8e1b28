//! Symbolic derivative, polynomial antiderivative and numeric quadrature.

use crate::engine::ast::{add, call, div, mul, neg, num, pow, sub, Func, Node};
use crate::engine::EngineError;

/// Structural derivative with respect to the variable at `var`.
/// The folding constructors keep the result free of trivial terms; no
/// further simplification is attempted.
pub(crate) fn differentiate(node: &Node, var: usize) -> Node {
    match node {
        Node::Num(_) => num(0.0),
        Node::Var(i) => num(if *i == var { 1.0 } else { 0.0 }),
        Node::Neg(a) => neg(differentiate(a, var)),
        Node::Add(a, b) => add(differentiate(a, var), differentiate(b, var)),
        Node::Sub(a, b) => sub(differentiate(a, var), differentiate(b, var)),
        Node::Mul(a, b) => {
            let da = differentiate(a, var);
            let db = differentiate(b, var);
            add(mul(da, (**b).clone()), mul((**a).clone(), db))
        }
        Node::Div(a, b) => {
            let da = differentiate(a, var);
            let db = differentiate(b, var);
            div(
                sub(mul(da, (**b).clone()), mul((**a).clone(), db)),
                pow((**b).clone(), num(2.0)),
            )
        }
        Node::Pow(base, expo) => {
            let db = differentiate(base, var);
            match (&**base, &**expo) {
                // u^n: n * u^(n-1) * u'
                (_, Node::Num(n)) => mul(
                    mul(num(*n), pow((**base).clone(), num(n - 1.0))),
                    db,
                ),
                // c^v: c^v * ln(c) * v'
                (Node::Num(c), _) => {
                    let de = differentiate(expo, var);
                    mul(
                        mul(node.clone(), num(c.ln())),
                        de,
                    )
                }
                // u^v: u^v * (v' * ln(u) + v * u' / u)
                _ => {
                    let de = differentiate(expo, var);
                    mul(
                        node.clone(),
                        add(
                            mul(de, call(Func::Ln, (**base).clone())),
                            div(mul((**expo).clone(), db), (**base).clone()),
                        ),
                    )
                }
            }
        }
        Node::Call(f, a) => {
            let u = (**a).clone();
            let du = differentiate(a, var);
            let outer = match f {
                Func::Sqrt => div(num(1.0), mul(num(2.0), call(Func::Sqrt, u))),
                Func::Abs => div(u.clone(), call(Func::Abs, u)),
                Func::Exp => call(Func::Exp, u),
                Func::Ln => div(num(1.0), u),
                Func::Sin => call(Func::Cos, u),
                Func::Cos => neg(call(Func::Sin, u)),
                Func::Tan => div(num(1.0), pow(call(Func::Cos, u), num(2.0))),
                Func::Asin => div(num(1.0), call(Func::Sqrt, sub(num(1.0), pow(u, num(2.0))))),
                Func::Acos => neg(div(
                    num(1.0),
                    call(Func::Sqrt, sub(num(1.0), pow(u, num(2.0)))),
                )),
                Func::Atan => div(num(1.0), add(num(1.0), pow(u, num(2.0)))),
                Func::Sinh => call(Func::Cosh, u),
                Func::Cosh => call(Func::Sinh, u),
                Func::Tanh => div(num(1.0), pow(call(Func::Cosh, u), num(2.0))),
            };
            mul(outer, du)
        }
    }
}

/// Extract dense polynomial coefficients (ascending powers of `var`), or
/// `None` when the tree is not a polynomial in that variable: other
/// variables, function calls, non-constant denominators, or fractional,
/// negative or very large exponents all disqualify it.
pub(crate) fn polynomial(node: &Node, var: usize) -> Option<Vec<f64>> {
    const MAX_DEGREE: u32 = 64;

    let coeffs = match node {
        Node::Num(v) => vec![*v],
        Node::Var(i) => {
            if *i == var {
                vec![0.0, 1.0]
            } else {
                return None;
            }
        }
        Node::Neg(a) => {
            let mut c = polynomial(a, var)?;
            for v in &mut c {
                *v = -*v;
            }
            c
        }
        Node::Add(a, b) => poly_add(&polynomial(a, var)?, &polynomial(b, var)?, 1.0),
        Node::Sub(a, b) => poly_add(&polynomial(a, var)?, &polynomial(b, var)?, -1.0),
        Node::Mul(a, b) => poly_mul(&polynomial(a, var)?, &polynomial(b, var)?),
        Node::Div(a, b) => {
            let divisor = polynomial(b, var)?;
            if divisor.len() != 1 || divisor[0] == 0.0 {
                return None;
            }
            let mut c = polynomial(a, var)?;
            for v in &mut c {
                *v /= divisor[0];
            }
            c
        }
        Node::Pow(base, expo) => {
            let n = match &**expo {
                Node::Num(n) if *n >= 0.0 && n.fract() == 0.0 && *n <= MAX_DEGREE as f64 => {
                    *n as u32
                }
                _ => return None,
            };
            let base = polynomial(base, var)?;
            let mut acc = vec![1.0];
            for _ in 0..n {
                acc = poly_mul(&acc, &base);
            }
            acc
        }
        Node::Call(..) => return None,
    };

    Some(trim(coeffs))
}

fn poly_add(a: &[f64], b: &[f64], sign: f64) -> Vec<f64> {
    let mut out = vec![0.0; a.len().max(b.len())];
    for (i, v) in a.iter().enumerate() {
        out[i] += v;
    }
    for (i, v) in b.iter().enumerate() {
        out[i] += sign * v;
    }
    out
}

fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

fn trim(mut coeffs: Vec<f64>) -> Vec<f64> {
    while coeffs.len() > 1 && *coeffs.last().unwrap() == 0.0 {
        coeffs.pop();
    }
    coeffs
}

/// Term-wise polynomial antiderivative, highest power first, with the
/// integration constant appended only when nonzero.
pub(crate) fn antiderivative(node: &Node, var: usize, constant: f64) -> Option<Node> {
    let coeffs = polynomial(node, var)?;

    let mut terms: Vec<Node> = Vec::new();
    for (k, &c) in coeffs.iter().enumerate().rev() {
        if c == 0.0 {
            continue;
        }
        let coeff = c / (k as f64 + 1.0);
        let power = pow(Node::Var(var), num(k as f64 + 1.0));
        terms.push(if coeff == 1.0 {
            power
        } else {
            mul(num(coeff), power)
        });
    }
    if constant != 0.0 {
        terms.push(num(constant));
    }

    Some(
        terms
            .into_iter()
            .reduce(|acc, t| add(acc, t))
            .unwrap_or_else(|| num(constant)),
    )
}

const QUAD_EPS: f64 = 1e-9;
const QUAD_MAX_DEPTH: u32 = 24;

/// Adaptive Simpson quadrature over `[lo, hi]`. Bounds may be given in
/// either order; a non-finite integrand value anywhere in the refinement
/// aborts with an error instead of poisoning the sum.
pub(crate) fn definite_integral<F>(f: F, lo: f64, hi: f64) -> Result<f64, EngineError>
where
    F: Fn(f64) -> Result<f64, EngineError>,
{
    if lo == hi {
        return Ok(0.0);
    }
    let (a, b, sign) = if lo <= hi {
        (lo, hi, 1.0)
    } else {
        (hi, lo, -1.0)
    };

    let fa = probe(&f, a)?;
    let fb = probe(&f, b)?;
    let m = 0.5 * (a + b);
    let fm = probe(&f, m)?;
    let whole = simpson(a, b, fa, fm, fb);
    let total = adapt(&f, a, b, fa, fm, fb, whole, QUAD_EPS, QUAD_MAX_DEPTH)?;

    if total.is_finite() {
        Ok(sign * total)
    } else {
        Err(EngineError::IntegralNotReal)
    }
}

fn probe<F>(f: &F, x: f64) -> Result<f64, EngineError>
where
    F: Fn(f64) -> Result<f64, EngineError>,
{
    let y = f(x)?;
    if y.is_finite() {
        Ok(y)
    } else {
        Err(EngineError::IntegralNotReal)
    }
}

fn simpson(a: f64, b: f64, fa: f64, fm: f64, fb: f64) -> f64 {
    (b - a) / 6.0 * (fa + 4.0 * fm + fb)
}

#[allow(clippy::too_many_arguments)]
fn adapt<F>(
    f: &F,
    a: f64,
    b: f64,
    fa: f64,
    fm: f64,
    fb: f64,
    whole: f64,
    eps: f64,
    depth: u32,
) -> Result<f64, EngineError>
where
    F: Fn(f64) -> Result<f64, EngineError>,
{
    let m = 0.5 * (a + b);
    let lm = 0.5 * (a + m);
    let rm = 0.5 * (m + b);
    let flm = probe(f, lm)?;
    let frm = probe(f, rm)?;
    let left = simpson(a, m, fa, flm, fm);
    let right = simpson(m, b, fm, frm, fb);
    let delta = left + right - whole;

    if depth == 0 || delta.abs() <= 15.0 * eps {
        return Ok(left + right + delta / 15.0);
    }
    let half_eps = 0.5 * eps;
    Ok(adapt(f, a, m, fa, flm, fm, left, half_eps, depth - 1)?
        + adapt(f, m, b, fm, frm, fb, right, half_eps, depth - 1)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ast::NodeDisplay;
    use crate::engine::parser::parse;

    fn x_vars() -> Vec<String> {
        vec!["x".to_string()]
    }

    fn show(node: &Node, vars: &[String]) -> String {
        NodeDisplay { node, vars }.to_string()
    }

    #[test]
    fn derivative_of_powers_and_sums() {
        let vars = x_vars();
        let node = parse("x^2+3*x+1", &vars).unwrap();
        let d = differentiate(&node, 0);
        assert_eq!(d.eval(&[4.0]).unwrap(), 11.0);
        assert_eq!(d.eval(&[0.0]).unwrap(), 3.0);
    }

    #[test]
    fn derivative_chain_rule() {
        let vars = x_vars();
        let node = parse("sin(x^2)", &vars).unwrap();
        let d = differentiate(&node, 0);
        let x = 1.3_f64;
        let expect = (x * x).cos() * 2.0 * x;
        assert!((d.eval(&[x]).unwrap() - expect).abs() < 1e-12);
    }

    #[test]
    fn derivative_of_sqrt_matches_closed_form() {
        let vars = x_vars();
        let node = parse("2*5*sqrt(x)+4", &vars).unwrap();
        let d = differentiate(&node, 0);
        let x = 2.25_f64;
        let expect = 10.0 / (2.0 * x.sqrt());
        assert!((d.eval(&[x]).unwrap() - expect).abs() < 1e-12);
    }

    #[test]
    fn polynomial_extraction() {
        let vars = x_vars();
        let node = parse("(x+1)*(x-1)", &vars).unwrap();
        assert_eq!(polynomial(&node, 0), Some(vec![-1.0, 0.0, 1.0]));

        let node = parse("x^2/2", &vars).unwrap();
        assert_eq!(polynomial(&node, 0), Some(vec![0.0, 0.0, 0.5]));

        let node = parse("sin(x)", &vars).unwrap();
        assert_eq!(polynomial(&node, 0), None);

        let node = parse("1/x", &vars).unwrap();
        assert_eq!(polynomial(&node, 0), None);

        let node = parse("x^0.5", &vars).unwrap();
        assert_eq!(polynomial(&node, 0), None);
    }

    #[test]
    fn antiderivative_of_quadratic() {
        let vars = x_vars();
        let node = parse("3*x^2+2", &vars).unwrap();
        let anti = antiderivative(&node, 0, 0.0).unwrap();
        assert_eq!(show(&anti, &vars), "x^3+2*x");
        // d/dx of the antiderivative gives back the integrand
        let back = differentiate(&anti, 0);
        for x in [-2.0, 0.0, 1.5] {
            assert!((back.eval(&[x]).unwrap() - node.eval(&[x]).unwrap()).abs() < 1e-12);
        }
    }

    #[test]
    fn antiderivative_constant_term() {
        let vars = x_vars();
        let node = parse("2", &vars).unwrap();
        let anti = antiderivative(&node, 0, 1.0).unwrap();
        assert_eq!(show(&anti, &vars), "2*x+1");
        let anti = antiderivative(&node, 0, 0.0).unwrap();
        assert_eq!(show(&anti, &vars), "2*x");
    }

    #[test]
    fn simpson_integrates_smooth_functions() {
        let f = |x: f64| Ok(x * x);
        let v = definite_integral(f, 0.0, 3.0).unwrap();
        assert!((v - 9.0).abs() < 1e-8);

        let g = |x: f64| Ok(x.sin());
        let v = definite_integral(g, 0.0, core::f64::consts::PI).unwrap();
        assert!((v - 2.0).abs() < 1e-8);

        // swapped bounds flip the sign
        let v = definite_integral(f, 3.0, 0.0).unwrap();
        assert!((v + 9.0).abs() < 1e-8);
    }

    #[test]
    fn simpson_rejects_non_finite_integrands() {
        let f = |x: f64| Ok(x.sqrt());
        assert_eq!(
            definite_integral(f, -1.0, 1.0),
            Err(EngineError::IntegralNotReal)
        );
    }
}

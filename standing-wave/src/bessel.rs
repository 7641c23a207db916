//! Zero-order Bessel function of the first kind.
//!
//! Power series below |x| = 8, Hankel asymptotic form with rational
//! corrections beyond (about 1e-10 absolute). NaN and infinite arguments
//! yield NaN.

const SERIES_LIMIT: f64 = 8.0;

/// J0(x).
pub fn j0(x: f64) -> f64 {
    let ax = x.abs();
    if ax < SERIES_LIMIT {
        series(ax)
    } else {
        asymptotic(ax)
    }
}

// sum_k (-1)^k (x^2/4)^k / (k!)^2
fn series(x: f64) -> f64 {
    let q = x * x / 4.0;
    let mut sum = 1.0;
    let mut term = 1.0;
    for k in 1..60 {
        term *= -q / (k * k) as f64;
        sum += term;
        if term.abs() < 1e-17 {
            break;
        }
    }
    sum
}

fn asymptotic(ax: f64) -> f64 {
    let z = 8.0 / ax;
    let y = z * z;
    let phase = ax - std::f64::consts::FRAC_PI_4;
    let p0 = 1.0
        + y * (-0.1098628627e-2
            + y * (0.2734510407e-4 + y * (-0.2073370639e-5 + y * 0.2093887211e-6)));
    let q0 = -0.1562499995e-1
        + y * (0.1430488765e-3
            + y * (-0.6911147651e-5 + y * (0.7621095161e-6 - y * 0.934935152e-7)));
    (std::f64::consts::FRAC_2_PI / ax).sqrt() * (phase.cos() * p0 - z * phase.sin() * q0)
}

//! Gamma distribution (shape-rate parameterisation) with exact quantiles
//!
//! `cdf` is the regularised lower incomplete gamma P(a, βx):
//! series expansion for x < a + 1, Lentz continued fraction otherwise
//! (Numerical Recipes §6.2). `quantile` starts from the Wilson-Hilferty
//! approximation and refines with Newton steps kept inside a bracket,
//! falling back to bisection when a step leaves it.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

const MAX_ITER: usize = 500;
const EPS: f64 = 1e-15;
const FPMIN: f64 = 1e-300;
const QUANTILE_TOL: f64 = 1e-12;
const QUANTILE_MAX_ITER: usize = 100;

/// Series and continued fraction both need O(√a) terms near x ≈ a.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn iteration_budget(a: f64) -> usize {
    MAX_ITER + (12.0 * a.sqrt()) as usize
}

/// Lanczos coefficients (g = 7, n = 9).
const LANCZOS: [f64; 9] = [
    0.999_999_999_999_809_93,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_13,
    -176.615_029_162_140_59,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// Natural log of Γ(z) for z > 0.
#[must_use]
pub fn ln_gamma(z: f64) -> f64 {
    if z < 0.5 {
        // Reflection: Γ(z)Γ(1-z) = π / sin(πz)
        let pi = std::f64::consts::PI;
        return (pi / (pi * z).sin()).abs().ln() - ln_gamma(1.0 - z);
    }
    let z = z - 1.0;
    let mut x = LANCZOS[0];
    for (i, c) in LANCZOS.iter().enumerate().skip(1) {
        #[allow(clippy::cast_precision_loss)]
        let k = i as f64;
        x += c / (z + k);
    }
    let t = z + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (z + 0.5) * t.ln() - t + x.ln()
}

/// Regularised lower incomplete gamma P(a, x).
#[must_use]
pub fn regularized_lower_gamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x < a + 1.0 {
        lower_gamma_series(a, x)
    } else {
        1.0 - upper_gamma_continued_fraction(a, x)
    }
}

fn lower_gamma_series(a: f64, x: f64) -> f64 {
    let mut ap = a;
    let mut sum = 1.0 / a;
    let mut del = sum;
    for _ in 0..iteration_budget(a) {
        ap += 1.0;
        del *= x / ap;
        sum += del;
        if del.abs() < sum.abs() * EPS {
            break;
        }
    }
    (sum.ln() - x + a * x.ln() - ln_gamma(a)).exp().clamp(0.0, 1.0)
}

/// Q(a, x) by modified Lentz.
fn upper_gamma_continued_fraction(a: f64, x: f64) -> f64 {
    let mut b = x + 1.0 - a;
    let mut c = 1.0 / FPMIN;
    let mut d = 1.0 / b;
    let mut h = d;
    for i in 1..=iteration_budget(a) {
        #[allow(clippy::cast_precision_loss)]
        let i = i as f64;
        let an = -i * (i - a);
        b += 2.0;
        d = an.mul_add(d, b);
        if d.abs() < FPMIN {
            d = FPMIN;
        }
        c = b + an / c;
        if c.abs() < FPMIN {
            c = FPMIN;
        }
        d = 1.0 / d;
        let del = d * c;
        h *= del;
        if (del - 1.0).abs() < EPS {
            break;
        }
    }
    ((-x + a * x.ln() - ln_gamma(a)).exp() * h).clamp(0.0, 1.0)
}

/// Standard normal quantile (Acklam's rational approximation, |rel err| < 1.2e-9).
#[must_use]
pub fn normal_quantile(p: f64) -> f64 {
    const A: [f64; 6] = [
        -3.969_683_028_665_376e1,
        2.209_460_984_245_205e2,
        -2.759_285_104_469_687e2,
        1.383_577_518_672_69e2,
        -3.066_479_806_614_716e1,
        2.506_628_277_459_239,
    ];
    const B: [f64; 5] = [
        -5.447_609_879_822_406e1,
        1.615_858_368_580_409e2,
        -1.556_989_798_598_866e2,
        6.680_131_188_771_972e1,
        -1.328_068_155_288_572e1,
    ];
    const C: [f64; 6] = [
        -7.784_894_002_430_293e-3,
        -3.223_964_580_411_365e-1,
        -2.400_758_277_161_838,
        -2.549_732_539_343_734,
        4.374_664_141_464_968,
        2.938_163_982_698_783,
    ];
    const D: [f64; 4] = [
        7.784_695_709_041_462e-3,
        3.224_671_290_700_398e-1,
        2.445_134_137_142_996,
        3.754_408_661_907_416,
    ];
    const P_LOW: f64 = 0.024_25;

    if p <= 0.0 {
        return f64::NEG_INFINITY;
    }
    if p >= 1.0 {
        return f64::INFINITY;
    }

    if p < P_LOW {
        let q = (-2.0 * p.ln()).sqrt();
        (((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    } else if p <= 1.0 - P_LOW {
        let q = p - 0.5;
        let r = q * q;
        (((((A[0] * r + A[1]) * r + A[2]) * r + A[3]) * r + A[4]) * r + A[5]) * q
            / (((((B[0] * r + B[1]) * r + B[2]) * r + B[3]) * r + B[4]) * r + 1.0)
    } else {
        let q = (-2.0 * (1.0 - p).ln()).sqrt();
        -(((((C[0] * q + C[1]) * q + C[2]) * q + C[3]) * q + C[4]) * q + C[5])
            / ((((D[0] * q + D[1]) * q + D[2]) * q + D[3]) * q + 1.0)
    }
}

/// Gamma(shape, rate) distribution: mean = shape / rate, variance = shape / rate².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gamma {
    shape: f64,
    rate: f64,
}

impl Gamma {
    /// Create a Gamma distribution.
    ///
    /// # Errors
    /// `InvalidHyperparameter` unless both parameters are finite and > 0.
    pub fn new(shape: f64, rate: f64) -> Result<Self> {
        if !(shape.is_finite() && rate.is_finite() && shape > 0.0 && rate > 0.0) {
            return Err(Error::InvalidHyperparameter {
                param: "shape, rate".to_string(),
                value: format!("({shape}, {rate})"),
                constraint: "both finite and > 0".to_string(),
            });
        }
        Ok(Self { shape, rate })
    }

    /// Skip validation for parameters already checked by `new`.
    pub(crate) const fn from_validated(shape: f64, rate: f64) -> Self {
        Self { shape, rate }
    }

    /// Shape α.
    #[must_use]
    pub const fn shape(&self) -> f64 {
        self.shape
    }

    /// Rate β.
    #[must_use]
    pub const fn rate(&self) -> f64 {
        self.rate
    }

    /// α / β
    #[must_use]
    pub fn mean(&self) -> f64 {
        self.shape / self.rate
    }

    /// α / β²
    #[must_use]
    pub fn variance(&self) -> f64 {
        self.shape / (self.rate * self.rate)
    }

    /// (α - 1) / β, defined for α ≥ 1.
    #[must_use]
    pub fn mode(&self) -> Option<f64> {
        (self.shape >= 1.0).then(|| (self.shape - 1.0) / self.rate)
    }

    /// Density at `x`.
    #[must_use]
    pub fn pdf(&self, x: f64) -> f64 {
        if x < 0.0 {
            return 0.0;
        }
        if x == 0.0 {
            return match self.shape.partial_cmp(&1.0) {
                Some(std::cmp::Ordering::Less) => f64::INFINITY,
                Some(std::cmp::Ordering::Equal) => self.rate,
                _ => 0.0,
            };
        }
        let bx = self.rate * x;
        ((self.shape - 1.0).mul_add(bx.ln(), -bx) - ln_gamma(self.shape) + self.rate.ln()).exp()
    }

    /// P(X ≤ x).
    #[must_use]
    pub fn cdf(&self, x: f64) -> f64 {
        regularized_lower_gamma(self.shape, self.rate * x)
    }

    /// Inverse CDF.
    ///
    /// # Errors
    /// `InvalidHyperparameter` unless `0 <= p < 1`.
    pub fn quantile(&self, p: f64) -> Result<f64> {
        if !(0.0..1.0).contains(&p) {
            return Err(Error::InvalidHyperparameter {
                param: "probability".to_string(),
                value: p.to_string(),
                constraint: "in [0, 1)".to_string(),
            });
        }
        if p == 0.0 {
            return Ok(0.0);
        }
        Ok(standard_gamma_quantile(self.shape, p) / self.rate)
    }

    /// Central credible interval containing `level` of the mass.
    ///
    /// # Errors
    /// `InvalidHyperparameter` unless `0 < level < 1`.
    pub fn credible_interval(&self, level: f64) -> Result<(f64, f64)> {
        let tail = (1.0 - check_level(level)?) / 2.0;
        Ok((self.quantile(tail)?, self.quantile(1.0 - tail)?))
    }
}

/// Accept a central credible mass strictly inside (0, 1).
///
/// # Errors
/// `InvalidHyperparameter` otherwise.
pub fn check_level(level: f64) -> Result<f64> {
    if level > 0.0 && level < 1.0 {
        Ok(level)
    } else {
        Err(Error::InvalidHyperparameter {
            param: "credible_level".to_string(),
            value: level.to_string(),
            constraint: "in (0, 1)".to_string(),
        })
    }
}

/// Quantile of Gamma(a, 1).
fn standard_gamma_quantile(a: f64, p: f64) -> f64 {
    // P(a, x) ≈ x^a / Γ(a + 1) near zero; below the smallest normal f64 the quantile is 0
    let ln_small_x = (p.ln() + ln_gamma(a + 1.0)) / a;
    if ln_small_x < f64::MIN_POSITIVE.ln() {
        return 0.0;
    }

    let ln_ga = ln_gamma(a);

    // Wilson-Hilferty start, or the small-x series inversion when it goes non-positive
    let z = normal_quantile(p);
    let c = 1.0 / (9.0 * a);
    let wh = a * (1.0 - c + z * c.sqrt()).powi(3);
    let mut x = if wh > 0.0 && a > 0.5 {
        wh
    } else {
        ln_small_x.exp()
    };
    if !(x.is_finite() && x > 0.0) {
        x = a;
    }

    let mut lo = 0.0_f64;
    let mut hi = f64::INFINITY;

    for _ in 0..QUANTILE_MAX_ITER {
        let f = regularized_lower_gamma(a, x) - p;
        if f == 0.0 {
            return x;
        }
        if f < 0.0 {
            lo = x;
        } else {
            hi = x;
        }

        let density = ((a - 1.0).mul_add(x.ln(), -x) - ln_ga).exp();
        let newton = if density > 0.0 && density.is_finite() {
            x - f / density
        } else {
            f64::NAN
        };

        let next = if newton.is_finite() && newton > lo && newton < hi {
            newton
        } else if hi.is_finite() {
            0.5 * (lo + hi)
        } else {
            2.0 * x.max(lo)
        };

        if (next - x).abs() <= QUANTILE_TOL * x.max(FPMIN) {
            return next;
        }
        x = next;
    }
    x
}

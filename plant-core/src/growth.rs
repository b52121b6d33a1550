//! Analytical growth laws: length at a given age and its inverse.
//!
//! Every law is monotonic non-decreasing in age and invertible on
//! `[0, k)`, so `length(age(l)) == l` up to floating point rounding.

use crate::error::PlantError;

/// Relative distance to the maximal length at which the inverse of an
/// asymptotic law saturates.
const SATURATION: f64 = 1e-12;

/// Growth law of an organ type.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum GrowthLaw {
    /// `l(t) = k (1 - exp(-r t / k))`, approaching `k` asymptotically.
    #[default]
    NegativeExponential,
    /// `l(t) = min(k, r t)`.
    Linear,
    /// A user supplied curve, scaled so that its last sample reaches `k`.
    Sampled(SampledCurve),
}

impl GrowthLaw {
    /// Length of an organ of age `age` with growth rate `r` and maximal length `k`.
    ///
    /// ### Panics
    /// Panics if `age` is negative.
    pub fn length(&self, age: f64, r: f64, k: f64) -> f64 {
        assert!(age >= 0.0, "GrowthLaw::length: negative age {age}");
        match self {
            GrowthLaw::NegativeExponential => {
                if k <= 0.0 {
                    0.0
                } else {
                    k * (1.0 - (-r * age / k).exp())
                }
            }
            GrowthLaw::Linear => (r * age).min(k),
            GrowthLaw::Sampled(curve) => k * curve.fraction_at(age),
        }
    }

    /// Age at which an organ with growth rate `r` and maximal length `k`
    /// reaches `length`.
    ///
    /// Lengths at or beyond `k` are clamped. The negative exponential law
    /// never reaches `k`, its inverse saturates just below it instead.
    ///
    /// ### Panics
    /// Panics if `length` is negative.
    pub fn age(&self, length: f64, r: f64, k: f64) -> f64 {
        assert!(length >= 0.0, "GrowthLaw::age: negative length {length}");
        if length == 0.0 || k <= 0.0 {
            return 0.0;
        }
        match self {
            GrowthLaw::NegativeExponential => {
                if r <= 0.0 {
                    return f64::INFINITY;
                }
                let l = length.min(k * (1.0 - SATURATION));
                -k / r * (1.0 - l / k).ln()
            }
            GrowthLaw::Linear => {
                if r <= 0.0 {
                    return f64::INFINITY;
                }
                length.min(k) / r
            }
            GrowthLaw::Sampled(curve) => curve.age_at((length / k).min(1.0)),
        }
    }
}

/// Piecewise linear growth curve through `(age, length)` samples.
///
/// Lengths are normalized by the last sample, so the curve describes the
/// fraction of the maximal length reached at a given age. Beyond the last
/// sample the organ keeps its full length.
#[derive(Clone, Debug, PartialEq)]
pub struct SampledCurve {
    ages: Vec<f64>,
    fractions: Vec<f64>,
}

impl SampledCurve {
    /// Creates a curve from samples starting at `(0, 0)` with strictly
    /// increasing ages and lengths.
    pub fn new(ages: Vec<f64>, lengths: Vec<f64>) -> Result<Self, PlantError> {
        if ages.len() != lengths.len() || ages.len() < 2 {
            return Err(PlantError::InvalidArgument(
                "sampled growth curve needs at least two (age, length) pairs".into(),
            ));
        }
        if ages[0] != 0.0 || lengths[0] != 0.0 {
            return Err(PlantError::InvalidArgument(
                "sampled growth curve must start at (0, 0)".into(),
            ));
        }
        let increasing = |v: &[f64]| v.windows(2).all(|w| w[1] > w[0]);
        if !increasing(&ages) || !increasing(&lengths) {
            return Err(PlantError::InvalidArgument(
                "sampled growth curve must be strictly increasing".into(),
            ));
        }

        let total = lengths[lengths.len() - 1];
        let fractions = lengths.iter().map(|l| l / total).collect();
        Ok(Self { ages, fractions })
    }

    fn fraction_at(&self, age: f64) -> f64 {
        interpolate(&self.ages, &self.fractions, age)
    }

    fn age_at(&self, fraction: f64) -> f64 {
        interpolate(&self.fractions, &self.ages, fraction)
    }
}

/// Linear interpolation of `ys` over increasing `xs`, clamped at both ends.
fn interpolate(xs: &[f64], ys: &[f64], x: f64) -> f64 {
    let last = xs.len() - 1;
    if x <= xs[0] {
        return ys[0];
    }
    if x >= xs[last] {
        return ys[last];
    }
    let i = xs.partition_point(|&v| v <= x);
    let (x0, x1) = (xs[i - 1], xs[i]);
    let (y0, y1) = (ys[i - 1], ys[i]);
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

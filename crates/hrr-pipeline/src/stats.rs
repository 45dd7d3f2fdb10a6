//! Brightness statistics and the hepatic-renal ratio.
//!
//! Both functions are pure. An empty sample has no mean, and a ratio
//! whose denominator structure is unmeasurable or not strictly positive
//! is undefined rather than an error: a kidney region with zero measured
//! brightness is a legitimate clinical outcome.
//!
//! Uncertainty propagation is first order and assumes the two
//! structures' errors are independent.

use serde::{Deserialize, Serialize};

/// Mean and population standard deviation of one structure's sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Arithmetic mean intensity.
    pub mean: f64,
    /// Population standard deviation (divisor = sample count).
    pub std: f64,
}

/// Liver-to-kidney mean ratio with its propagated standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ratio {
    /// `mean_liver / mean_kidney`.
    pub value: f64,
    /// `None` when the numerator mean is zero, since the relative error
    /// of the numerator is then undefined.
    pub std: Option<f64>,
}

/// Mean and population standard deviation of `samples`.
///
/// Returns `None` for an empty slice.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn describe<T>(samples: &[T]) -> Option<Summary>
where
    T: Copy + Into<f64>,
{
    if samples.is_empty() {
        return None;
    }

    let n = samples.len() as f64;
    let mean = samples.iter().map(|&v| v.into()).sum::<f64>() / n;
    let variance = samples
        .iter()
        .map(|&v| {
            let d = v.into() - mean;
            d * d
        })
        .sum::<f64>()
        / n;

    Some(Summary {
        mean,
        std: variance.sqrt(),
    })
}

/// Ratio of the numerator structure's mean to the denominator's.
///
/// Defined only when both summaries are present and
/// `denominator.mean > 0`. The standard deviation follows
/// `ratio * sqrt((std_a / mean_a)^2 + (std_b / mean_b)^2)` and is
/// `None` when `numerator.mean == 0`.
#[must_use]
pub fn ratio(numerator: Option<Summary>, denominator: Option<Summary>) -> Option<Ratio> {
    let (a, b) = (numerator?, denominator?);
    if b.mean <= 0.0 {
        return None;
    }

    let value = a.mean / b.mean;
    let std = (a.mean != 0.0).then(|| {
        let rel_a = a.std / a.mean;
        let rel_b = b.std / b.mean;
        value * rel_a.hypot(rel_b)
    });

    Some(Ratio { value, std })
}

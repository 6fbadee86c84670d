//! Held-out evaluation metrics
//!
//! Sign convention for directional accuracy: zero is its own class, so a
//! zero prediction only matches a zero outcome.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Evaluation metrics of one run
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub mean_absolute_error: f64,
    /// Coefficient of determination; negative when worse than the mean
    pub r_squared: f64,
    /// Fraction of matching signs, in [0, 1]
    pub directional_accuracy: f64,
}

/// Compute all metrics for aligned actual/predicted vectors
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<Metrics> {
    check_inputs(actual, predicted)?;

    Ok(Metrics {
        mean_absolute_error: mean_absolute_error(actual, predicted)?,
        r_squared: r_squared(actual, predicted)?,
        directional_accuracy: directional_accuracy(actual, predicted)?,
    })
}

fn check_inputs(actual: &[f64], predicted: &[f64]) -> Result<()> {
    if actual.len() != predicted.len() {
        return Err(Error::LengthMismatch {
            actual: actual.len(),
            predicted: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(Error::EmptyEvaluationSet);
    }
    Ok(())
}

pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_inputs(actual, predicted)?;

    let total: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).abs())
        .sum();

    Ok(total / actual.len() as f64)
}

/// R² against the mean of `actual`.
///
/// A constant `actual` scores 1.0 when predicted exactly and 0.0 otherwise.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_inputs(actual, predicted)?;

    let mean = actual.iter().sum::<f64>() / actual.len() as f64;

    let ss_res: f64 = actual
        .iter()
        .zip(predicted.iter())
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

pub fn directional_accuracy(actual: &[f64], predicted: &[f64]) -> Result<f64> {
    check_inputs(actual, predicted)?;

    let hits = actual
        .iter()
        .zip(predicted.iter())
        .filter(|(a, p)| sign(**a) == sign(**p))
        .count();

    Ok(hits as f64 / actual.len() as f64)
}

/// -1, 0 or 1
fn sign(x: f64) -> i8 {
    if x > 0.0 {
        1
    } else if x < 0.0 {
        -1
    } else {
        0
    }
}

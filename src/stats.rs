//! Shared statistics primitives for timing analysis
//!
//! Wraps trueno's SIMD vector statistics behind f64-millisecond interfaces.
//! Duration samples cross into f32 vectors only at this boundary; everything
//! above works in f64 milliseconds.

use trueno::Vector;

/// Arithmetic mean of duration samples.
///
/// Empty input yields 0.0 rather than an error: a step with no samples has
/// no meaningful average and downstream guards treat 0.0 as "no baseline".
pub fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        return 0.0;
    }
    let v: Vec<f32> = samples.iter().map(|&s| s as f32).collect();
    f64::from(Vector::from_slice(&v).mean().unwrap_or(0.0))
}

/// Population standard deviation of duration samples.
///
/// Fewer than two samples yield 0.0 (a single observation has no spread).
pub fn std_dev(samples: &[f64]) -> f64 {
    if samples.len() < 2 {
        return 0.0;
    }
    let v: Vec<f32> = samples.iter().map(|&s| s as f32).collect();
    f64::from(Vector::from_slice(&v).stddev().unwrap_or(0.0))
}

/// Z-score of a value against a baseline mean and standard deviation.
///
/// A zero or negative standard deviation yields 0.0: with a perfectly flat
/// baseline any deviation would be infinitely many sigmas out, so the score
/// carries no information.
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    (value - mean) / std_dev
}

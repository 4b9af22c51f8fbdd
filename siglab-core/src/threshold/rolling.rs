//! Trailing-window statistics shared by the adaptive policies.
//!
//! Sample standard deviation uses n - 1 degrees of freedom. Quantiles use
//! linear interpolation between closest ranks: position `q * (n - 1)` in the
//! sorted window.

/// Trailing window ending at `end` (inclusive), or `None` when fewer than
/// `window` bars precede it.
///
/// The first `window` positions never get a window, including `window - 1`
/// where the slice would already be full. Those bars use the fallback.
pub fn trailing(values: &[f64], end: usize, window: usize) -> Option<&[f64]> {
    if window == 0 || end < window || end >= values.len() {
        return None;
    }
    Some(&values[(end + 1 - window)..=end])
}

pub fn mean(window: &[f64]) -> f64 {
    if window.is_empty() {
        return f64::NAN;
    }
    window.iter().sum::<f64>() / window.len() as f64
}

/// Sample standard deviation. NaN for fewer than two values.
pub fn sample_std(window: &[f64]) -> f64 {
    let n = window.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(window);
    let ss: f64 = window.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (n - 1) as f64).sqrt()
}

/// `q`-th quantile with linear interpolation. `q` is clamped to [0, 1].
pub fn quantile(window: &[f64], q: f64) -> f64 {
    if window.is_empty() {
        return f64::NAN;
    }
    let mut sorted = window.to_vec();
    sorted.sort_by(f64::total_cmp);

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

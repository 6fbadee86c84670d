//! Rolling-window series helpers
//!
//! Every function returns a vector aligned with its input; positions without
//! enough history hold `f64::NAN`.

/// Period-over-period change `(x[t] - x[t-1]) / x[t-1]`
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];

    for i in 1..values.len() {
        if values[i - 1] != 0.0 {
            result[i] = (values[i] - values[i - 1]) / values[i - 1];
        }
    }

    result
}

/// Shift a series forward by `periods` (value at t is the input at t - periods)
pub fn lag(values: &[f64], periods: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];

    for i in periods..values.len() {
        result[i] = values[i - periods];
    }

    result
}

/// Shift a series backward by `periods` (value at t is the input at t + periods)
pub fn lead(values: &[f64], periods: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];

    for i in 0..values.len().saturating_sub(periods) {
        result[i] = values[i + periods];
    }

    result
}

/// Simple Moving Average over a trailing window that includes the current point
pub fn sma(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period == 0 {
        return result;
    }

    for i in (period - 1)..values.len() {
        let window = &values[(i + 1 - period)..=i];
        result[i] = window.iter().sum::<f64>() / period as f64;
    }

    result
}

/// Trailing sample standard deviation (n - 1 denominator).
///
/// A window containing an undefined value is itself undefined.
pub fn rolling_std(values: &[f64], period: usize) -> Vec<f64> {
    let mut result = vec![f64::NAN; values.len()];
    if period < 2 {
        return result;
    }

    for i in (period - 1)..values.len() {
        let window = &values[(i + 1 - period)..=i];
        if window.iter().any(|v| v.is_nan()) {
            continue;
        }
        result[i] = sample_std(window);
    }

    result
}

/// Sample standard deviation of a slice (NaN for fewer than two points)
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }

    let mean = values.iter().sum::<f64>() / n as f64;
    let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pct_change() {
        let result = pct_change(&[10.0, 11.0, 9.9]);
        assert!(result[0].is_nan());
        assert!((result[1] - 0.1).abs() < 1e-12);
        assert!((result[2] + 0.1).abs() < 1e-12);
    }

    #[test]
    fn test_lag_and_lead() {
        let values = vec![1.0, 2.0, 3.0, 4.0];

        let lagged = lag(&values, 2);
        assert!(lagged[1].is_nan());
        assert_eq!(lagged[2], 1.0);
        assert_eq!(lagged[3], 2.0);

        let led = lead(&values, 1);
        assert_eq!(led[0], 2.0);
        assert_eq!(led[2], 4.0);
        assert!(led[3].is_nan());
    }

    #[test]
    fn test_sma() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let result = sma(&values, 3);

        assert!(result[0].is_nan());
        assert!(result[1].is_nan());
        assert!((result[2] - 2.0).abs() < 1e-10);
        assert!((result[3] - 3.0).abs() < 1e-10);
        assert!((result[4] - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_rolling_std_uses_sample_denominator() {
        let values = vec![f64::NAN, 2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let result = rolling_std(&values, 8);

        assert!(result[7].is_nan());
        // Sample std of 2,4,4,4,5,5,7,9 is sqrt(32 / 7)
        assert!((result[8] - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_sample_std_needs_two_points() {
        assert!(sample_std(&[1.0]).is_nan());
        assert!((sample_std(&[1.0, 3.0]) - 2.0f64.sqrt()).abs() < 1e-12);
    }
}

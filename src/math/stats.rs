//! Small descriptive statistics helpers.

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by `n`).
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64)
}

/// Linear-interpolated percentile, `q` in `[0, 100]`. Non-finite values are ignored.
pub fn percentile(values: &[f64], q: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

/// Coefficient of determination `1 − var(residual) / var(observed)`.
///
/// `None` when the observed data has zero variance.
pub fn r_squared(residual: &[f64], observed: &[f64]) -> Option<f64> {
    let var_y = variance(observed)?;
    if var_y <= 0.0 || !var_y.is_finite() {
        return None;
    }
    let var_r = variance(residual)?;
    Some(1.0 - var_r / var_y)
}

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variance_is_population_variance() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert!((variance(&v).unwrap() - 1.25).abs() < 1e-12);
        assert!(variance(&[]).is_none());
    }

    #[test]
    fn percentile_interpolates() {
        let v = [5.0, 1.0, 3.0, 2.0, 4.0];
        assert_eq!(percentile(&v, 0.0), Some(1.0));
        assert_eq!(percentile(&v, 100.0), Some(5.0));
        assert!((percentile(&v, 10.0).unwrap() - 1.4).abs() < 1e-12);
    }

    #[test]
    fn r_squared_of_perfect_fit_is_one() {
        let y = [1.0, 4.0, 9.0];
        assert_eq!(r_squared(&[0.0, 0.0, 0.0], &y), Some(1.0));
        assert!(r_squared(&[0.0; 3], &[2.0; 3]).is_none());
    }

    #[test]
    fn round_to_four_places() {
        assert_eq!(round_to(694.123_456, 4), 694.1235);
    }
}

/// Computes the arithmetic mean of a slice of values. Returns `None` for empty input.
///
/// Falls back to a running mean when the plain sum overflows, so finite input
/// always gives a finite mean.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let sum = values.iter().sum::<f64>();
    if sum.is_finite() {
        return Some(sum / values.len() as f64);
    }
    let running = values
        .iter()
        .enumerate()
        .fold(0.0, |acc, (i, v)| acc + (v - acc) / (i + 1) as f64);
    Some(running)
}

/// Percentile `q` (0 to 100) of already sorted values, interpolating linearly
/// between the two bracketing order statistics at rank `q/100 * (n-1)`.
/// Returns `None` for empty input.
pub fn percentile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (q / 100.0).clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let (a, b) = (sorted[lo], sorted[hi]);

    Some((a + (b - a) * (rank - lo as f64)).clamp(a, b))
}

pub fn median(sorted: &[f64]) -> Option<f64> {
    percentile(sorted, 50.0)
}

/// Sorts prices ascending. Prices are finite, so `total_cmp` matches numeric order.
pub fn sorted(mut values: Vec<f64>) -> Vec<f64> {
    values.sort_by(f64::total_cmp);
    values
}

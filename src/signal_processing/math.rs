/// Median of a set of values, taking the upper element for even counts
///
/// Sorts a copy and picks index `len / 2`, so `[0.6, 0.7, 0.8, 0.9]` yields
/// `0.8` rather than the averaged `0.75`. Reported rates depend on this
/// exact tie-break. Returns `None` for an empty input.
pub fn upper_median(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(f64::total_cmp);
    Some(sorted[sorted.len() / 2])
}

/// Whole beats per minute for an inter-beat interval, truncated toward zero
pub fn interval_to_bpm(interval_secs: f64) -> u32 {
    if interval_secs <= 0.0 {
        return 0;
    }
    // `as` saturates for out-of-range floats
    (60.0 / interval_secs).floor() as u32
}

/// Interval in whole milliseconds, rounded to nearest
pub fn interval_to_millis(interval_secs: f64) -> u32 {
    (interval_secs * 1000.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upper_median_even_count() {
        let median = upper_median([0.8, 0.6, 0.9, 0.7]).unwrap();
        assert_eq!(median, 0.8);
    }

    #[test]
    fn test_upper_median_odd_count() {
        assert_eq!(upper_median([0.9, 0.5, 0.7]), Some(0.7));
        assert_eq!(upper_median([1.2]), Some(1.2));
        assert_eq!(upper_median(std::iter::empty()), None);
    }

    #[test]
    fn test_median_rejects_single_outlier() {
        let median = upper_median([0.8, 0.81, 0.35, 0.79, 0.8]).unwrap();
        assert_eq!(median, 0.8);
    }

    #[test]
    fn test_interval_conversions() {
        assert_eq!(interval_to_bpm(1.0), 60);
        assert_eq!(interval_to_bpm(0.8), 75);
        assert_eq!(interval_to_bpm(0.7), 85); // 85.71 truncates
        assert_eq!(interval_to_bpm(0.0), 0);
        assert_eq!(interval_to_millis(0.8), 800);
        assert_eq!(interval_to_millis(0.7996), 800);
        assert_eq!(interval_to_millis(0.7994), 799);
    }
}

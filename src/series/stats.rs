//! 数値の集約計算

use super::element::compare_floats;

/// 平均を計算（空の場合はNone）
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// 中央値を計算
///
/// 偶数個の場合は中央の2つの値の平均。NaNは最後に並ぶ
pub(crate) fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| compare_floats(*a, *b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

/// 母分散を計算
pub(crate) fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    let sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    Some(sq / values.len() as f64)
}

/// 母標準偏差を計算
pub(crate) fn stddev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), Some(2.5));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_median_with_nan_is_order_independent() {
        assert_eq!(median(&[f64::NAN, 1.0, 2.0]), Some(2.0));
        assert_eq!(median(&[1.0, f64::NAN, 2.0]), Some(2.0));
        assert_eq!(median(&[2.0, 1.0, f64::NAN]), Some(2.0));
        assert_eq!(median(&[3.0, f64::NAN, 1.0, 2.0]), Some(2.5));
    }

    #[test]
    fn test_population_variance() {
        // 2, 4, 4, 4, 5, 5, 7, 9 -> mean 5, variance 4, stddev 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(variance(&values), Some(4.0));
        assert_eq!(stddev(&values), Some(2.0));
        assert_eq!(variance(&[7.0]), Some(0.0));
        assert_eq!(stddev(&[]), None);
    }
}

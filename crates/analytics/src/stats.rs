//! Small numeric helpers shared by indicators and analysis.

/// Arithmetic mean. `None` for an empty slice.
pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by `n`, not `n - 1`).
pub(crate) fn population_std_dev(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    let variance = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / values.len() as f64;
    Some(variance.sqrt())
}

/// The last `n` values, or `None` when the slice is shorter than `n`.
pub(crate) fn tail(values: &[f64], n: usize) -> Option<&[f64]> {
    if n == 0 || values.len() < n {
        return None;
    }
    Some(&values[values.len() - n..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_population_std_dev() {
        let sd = population_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((sd - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_tail() {
        assert_eq!(tail(&[1.0, 2.0, 3.0], 2), Some(&[2.0, 3.0][..]));
        assert_eq!(tail(&[1.0], 2), None);
        assert_eq!(tail(&[1.0], 0), None);
    }
}

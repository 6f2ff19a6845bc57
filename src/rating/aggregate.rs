//! Team rating aggregation
//!
//! Pairwise methods compare one scalar per roster. These reductions turn a
//! roster's individual ratings into that scalar.

use crate::error::{RatingError, Result};

/// Arithmetic mean of a non-empty roster
pub fn average_rating(ratings: &[f64]) -> Result<f64> {
    if ratings.is_empty() {
        return Err(RatingError::invalid(
            "Cannot aggregate the rating of an empty roster",
        ));
    }

    Ok(ratings.iter().sum::<f64>() / ratings.len() as f64)
}

/// Power mean `(Σ rᵢ^p / n)^(1/p)`
///
/// Higher exponents bias the aggregate toward the strongest member. The sum
/// is taken relative to the roster maximum so that `r^p` cannot overflow for
/// realistic ratings and exponents.
pub fn power_mean_rating(ratings: &[f64], exponent: f64) -> Result<f64> {
    if ratings.is_empty() {
        return Err(RatingError::invalid(
            "Cannot aggregate the rating of an empty roster",
        ));
    }
    if !(exponent.is_finite() && exponent > 0.0) {
        return Err(RatingError::invalid(format!(
            "Power-mean exponent must be positive, got {}",
            exponent
        )));
    }
    if let Some(negative) = ratings.iter().find(|r| **r < 0.0) {
        return Err(RatingError::invalid(format!(
            "Power mean is undefined for negative rating {}",
            negative
        )));
    }

    let max = ratings.iter().cloned().fold(0.0_f64, f64::max);
    if max == 0.0 {
        return Ok(0.0);
    }

    let mean = ratings
        .iter()
        .map(|r| (r / max).powf(exponent))
        .sum::<f64>()
        / ratings.len() as f64;

    Ok(max * mean.powf(exponent.recip()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[1000.0, 1200.0, 1400.0]).unwrap(), 1200.0);
        assert_eq!(average_rating(&[1500.0]).unwrap(), 1500.0);
    }

    #[test]
    fn test_empty_roster_rejected() {
        assert!(matches!(
            average_rating(&[]),
            Err(RatingError::InvalidInput { .. })
        ));
        assert!(power_mean_rating(&[], 15.0).is_err());
    }

    #[test]
    fn test_power_mean_of_equal_ratings() {
        let mean = power_mean_rating(&[1000.0, 1000.0], 15.0).unwrap();
        assert!((mean - 1000.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_mean_favours_strongest() {
        let mean = power_mean_rating(&[1000.0, 2000.0], 15.0).unwrap();
        let arithmetic = average_rating(&[1000.0, 2000.0]).unwrap();

        assert!(mean > 1000.0 && mean < 2000.0);
        assert!((2000.0 - mean) < (2000.0 - arithmetic));
        // 2000 * 0.5^(1/15), ignoring the negligible weaker term
        assert!((mean - 1909.6).abs() < 0.5);
    }

    #[test]
    fn test_power_mean_exponent_one_is_arithmetic() {
        let mean = power_mean_rating(&[1000.0, 1500.0, 2300.0], 1.0).unwrap();
        assert!((mean - 1600.0).abs() < 1e-9);
    }

    #[test]
    fn test_power_mean_rejects_bad_input() {
        assert!(power_mean_rating(&[1000.0], 0.0).is_err());
        assert!(power_mean_rating(&[1000.0], -2.0).is_err());
        assert!(power_mean_rating(&[1000.0, -5.0], 15.0).is_err());
        assert_eq!(power_mean_rating(&[0.0, 0.0], 15.0).unwrap(), 0.0);
    }
}

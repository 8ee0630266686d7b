//! Numeric validation utilities
//!
//! Provides range validation and checked conversions used by the geometry
//! planner and the configuration layer.

use crate::error::{BannerError, Result};

/// Validator for numeric operations and conversions
pub struct NumericValidator;

impl NumericValidator {
    /// Safely convert f32 to u32 with bounds checking
    pub fn validate_f32_to_u32(value: f32) -> Result<u32> {
        if !value.is_finite() {
            return Err(BannerError::processing(format!(
                "Cannot convert non-finite value {} to u32",
                value
            )));
        }

        if value < 0.0 {
            return Err(BannerError::processing(format!(
                "Cannot convert negative value {} to u32",
                value
            )));
        }

        if value > u32::MAX as f32 {
            return Err(BannerError::processing(format!(
                "Value {} exceeds u32::MAX ({})",
                value,
                u32::MAX
            )));
        }

        Ok(value as u32)
    }

    /// Validate a width budget fraction, which must lie in (0, 1]
    pub fn validate_fraction(value: f32) -> Result<f32> {
        if !value.is_finite() {
            return Err(BannerError::invalid_geometry(format!(
                "Width fraction must be finite, got {}",
                value
            )));
        }

        if value <= 0.0 || value > 1.0 {
            return Err(BannerError::invalid_geometry(format!(
                "Width fraction must be in (0, 1], got {}",
                value
            )));
        }

        Ok(value)
    }

    /// Validate numeric range (inclusive)
    pub fn validate_range<T>(value: T, min: T, max: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy,
    {
        if value < min || value > max {
            return Err(BannerError::invalid_config(format!(
                "{} must be between {} and {}, got {}",
                name, min, max, value
            )));
        }
        Ok(value)
    }

    /// Validate that a value is positive
    pub fn validate_positive<T>(value: T, name: &str) -> Result<T>
    where
        T: PartialOrd + std::fmt::Display + Copy + Default,
    {
        if value <= T::default() {
            return Err(BannerError::invalid_config(format!(
                "{} must be positive, got {}",
                name, value
            )));
        }
        Ok(value)
    }

    /// Validate that both image dimensions are non-zero
    pub fn validate_dimensions(width: u32, height: u32, what: &str) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(BannerError::invalid_geometry(format!(
                "{} dimensions must be positive, got {}x{}",
                what, width, height
            )));
        }
        Ok(())
    }

    /// Scale `value` by `numerator / denominator`, rounded to nearest, never below 1
    pub fn scale_rounded(value: u32, numerator: u32, denominator: u32) -> Result<u32> {
        if denominator == 0 {
            return Err(BannerError::processing("Cannot scale by a zero denominator"));
        }
        let scaled = (u64::from(value) * u64::from(numerator) * 2 + u64::from(denominator))
            / (2 * u64::from(denominator));
        u32::try_from(scaled.max(1)).map_err(|_| {
            BannerError::processing(format!(
                "Scaled value {} * {} / {} exceeds u32::MAX",
                value, numerator, denominator
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_f32_to_u32() {
        assert_eq!(NumericValidator::validate_f32_to_u32(0.0).unwrap(), 0);
        assert_eq!(NumericValidator::validate_f32_to_u32(280.9).unwrap(), 280);

        assert!(NumericValidator::validate_f32_to_u32(-1.0).is_err());
        assert!(NumericValidator::validate_f32_to_u32(f32::NAN).is_err());
        assert!(NumericValidator::validate_f32_to_u32(f32::INFINITY).is_err());
    }

    #[test]
    fn test_validate_fraction() {
        assert!(NumericValidator::validate_fraction(0.35).is_ok());
        assert!(NumericValidator::validate_fraction(1.0).is_ok());

        assert!(NumericValidator::validate_fraction(0.0).is_err());
        assert!(NumericValidator::validate_fraction(-0.1).is_err());
        assert!(NumericValidator::validate_fraction(1.01).is_err());
        assert!(NumericValidator::validate_fraction(f32::NAN).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(NumericValidator::validate_range(50, 0, 100, "test").is_ok());
        assert!(NumericValidator::validate_range(100, 0, 100, "test").is_ok());
        assert!(NumericValidator::validate_range(-1, 0, 100, "test").is_err());
        assert!(NumericValidator::validate_range(101, 0, 100, "test").is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(NumericValidator::validate_positive(1, "test").is_ok());
        assert!(NumericValidator::validate_positive(0.5, "test").is_ok());
        assert!(NumericValidator::validate_positive(0, "test").is_err());
        assert!(NumericValidator::validate_positive(-1.0, "test").is_err());
    }

    #[test]
    fn test_validate_dimensions() {
        assert!(NumericValidator::validate_dimensions(1, 1, "canvas").is_ok());
        let err = NumericValidator::validate_dimensions(0, 5, "foreground").unwrap_err();
        assert!(err.to_string().contains("foreground"));
    }

    #[test]
    fn test_scale_rounded() {
        assert_eq!(NumericValidator::scale_rounded(400, 280, 400).unwrap(), 280);
        // 300 * 280 / 1000 = 84
        assert_eq!(NumericValidator::scale_rounded(300, 280, 1000).unwrap(), 84);
        // 5 * 1 / 2 = 2.5 rounds up
        assert_eq!(NumericValidator::scale_rounded(5, 1, 2).unwrap(), 3);
        // never collapses to zero
        assert_eq!(NumericValidator::scale_rounded(1, 1, 1000).unwrap(), 1);
        assert!(NumericValidator::scale_rounded(1, 1, 0).is_err());
    }
}

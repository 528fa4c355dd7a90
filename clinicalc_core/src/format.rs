//! Fixed-decimal formatting for result values.
//!
//! Volumes and counts are shown with 0 decimals, ratios and pressures with 1.
//! Rounding is half away from zero on the binary value.

/// Round `value` to `decimals` places, half away from zero
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // -0.0 == 0.0, this drops the sign
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Format `value` with exactly `decimals` places
pub fn fixed(value: f64, decimals: u32) -> String {
    format!("{:.*}", decimals as usize, round_to(value, decimals))
}

/// Format with no decimals
pub fn whole(value: f64) -> String {
    fixed(value, 0)
}

/// Render a boolean the way inputs encode it
pub fn flag(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_one_decimal() {
        assert_eq!(fixed(93.333_333, 1), "93.3");
        assert_eq!(fixed(24.221_453, 1), "24.2");
        assert_eq!(fixed(18.5, 1), "18.5");
    }

    #[test]
    fn test_half_rounds_away_from_zero() {
        assert_eq!(fixed(2.5, 0), "3");
        assert_eq!(fixed(-2.5, 0), "-3");
        assert_eq!(fixed(0.25, 1), "0.3");
    }

    #[test]
    fn test_negative_zero_is_normalised() {
        assert_eq!(fixed(-0.04, 1), "0.0");
        assert_eq!(whole(-0.2), "0");
    }
}

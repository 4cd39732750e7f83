//! Unit conversions between EMU, points, pixels, angles, and percentages

use crate::constants::emu;

/// A length in English Metric Units (EMUs)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Length(i64);

impl Length {
    /// Create a Length from EMUs
    pub fn new(emu: i64) -> Self {
        Length(emu)
    }

    /// Get length in EMUs
    pub fn emu(&self) -> i64 {
        self.0
    }

    /// Get length in inches
    pub fn inches(&self) -> f64 {
        self.0 as f64 / emu::PER_INCH as f64
    }

    /// Get length in points
    pub fn pt(&self) -> f64 {
        self.0 as f64 / emu::PER_POINT as f64
    }

    /// Get length in centimeters
    pub fn cm(&self) -> f64 {
        self.0 as f64 / emu::PER_CM as f64
    }

    /// Get length in millimeters
    pub fn mm(&self) -> f64 {
        self.0 as f64 / emu::PER_MM as f64
    }

    /// Get length in device pixels given a scale in pixels per EMU
    pub fn px(&self, scale: f64) -> f32 {
        (self.0 as f64 * scale) as f32
    }
}

impl From<i64> for Length {
    fn from(emu: i64) -> Self {
        Length(emu)
    }
}

impl From<Length> for i64 {
    fn from(length: Length) -> Self {
        length.0
    }
}

/// Create a Length from inches
pub fn inches(value: f64) -> Length {
    Length((value * emu::PER_INCH as f64).round() as i64)
}

/// Create a Length from points
pub fn pt(value: f64) -> Length {
    Length((value * emu::PER_POINT as f64).round() as i64)
}

/// Create a Length from centimeters
pub fn cm(value: f64) -> Length {
    Length((value * emu::PER_CM as f64).round() as i64)
}

/// EMU to points; exact for every representable EMU value
pub fn emu_to_points(emu_value: i64) -> f64 {
    emu_value as f64 / emu::PER_POINT as f64
}

/// Points to EMU, rounding to the nearest unit
pub fn points_to_emu(points: f64) -> i64 {
    (points * emu::PER_POINT as f64).round() as i64
}

/// EMU to device pixels at a given scale (pixels per EMU)
pub fn emu_to_px(emu_value: i64, scale: f64) -> f32 {
    (emu_value as f64 * scale) as f32
}

/// Angle units (60000ths of a degree) to degrees
pub fn angle_to_degrees(angle: i64) -> f64 {
    angle as f64 / emu::ANGLE_PER_DEGREE as f64
}

/// Degrees to angle units
pub fn degrees_to_angle(degrees: f64) -> i64 {
    (degrees * emu::ANGLE_PER_DEGREE as f64).round() as i64
}

/// Centipoint font size (1/100 pt) to points
pub fn centipoints_to_points(centipoints: i64) -> f32 {
    centipoints as f32 / emu::CENTIPOINTS_PER_POINT as f32
}

/// Percentage in 1/100000 units to a fraction in [0, 1] (not clamped)
pub fn percent_to_fraction(value: i64) -> f64 {
    value as f64 / emu::PER_PERCENT as f64
}

/// Parse an OOXML percentage attribute. Accepts raw mille-percent
/// ("50000") and the suffixed form ("50%" / "50.5%").
pub fn parse_percent(raw: &str) -> Option<f64> {
    if let Some(stripped) = raw.strip_suffix('%') {
        stripped.parse::<f64>().ok().map(|v| v / 100.0)
    } else {
        raw.parse::<i64>().ok().map(percent_to_fraction)
    }
}

/// Points to device pixels at a given DPI
pub fn points_to_px(points: f32, dpi: f32) -> f32 {
    points * dpi / 72.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_round_trip_is_exact() {
        for emu_value in [0i64, 1, 12_700, 914_400, 12_192_000, 6_858_000, 123_456_789] {
            assert_eq!(points_to_emu(emu_to_points(emu_value)), emu_value);
        }
    }

    #[test]
    fn test_seed_conversions() {
        assert_eq!(emu_to_points(12_700), 1.0);
        assert_eq!(points_to_emu(1.0), 12_700);
        assert_eq!(angle_to_degrees(5_400_000), 90.0);
    }

    #[test]
    fn test_length_conversions() {
        let len = inches(1.0);
        assert_eq!(len.emu(), 914_400);
        assert_eq!(len.inches(), 1.0);
        assert_eq!(len.pt(), 72.0);
    }

    #[test]
    fn test_cm_round_trip_within_one_emu() {
        for emu_value in [360_000i64, 914_400, 5_143_500] {
            let back = (Length::new(emu_value).cm() * 360_000.0).round() as i64;
            assert!((back - emu_value).abs() <= 1);
        }
    }

    #[test]
    fn test_percent_parsing() {
        assert_eq!(parse_percent("50000"), Some(0.5));
        assert_eq!(parse_percent("100000"), Some(1.0));
        assert_eq!(parse_percent("75%"), Some(0.75));
        assert_eq!(parse_percent("bogus"), None);
    }

    #[test]
    fn test_font_size_units() {
        assert_eq!(centipoints_to_points(1_800), 18.0);
        assert_eq!(points_to_px(72.0, 96.0), 96.0);
    }
}

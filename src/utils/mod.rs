//! Utility functions and types for the scanner.

pub mod error;
mod logging;

pub use error::{Error, Result};
pub use logging::{init_logging, set_log_level};

/// Round to `places` decimals, ties away from zero.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10_f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::round_to;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(0.123, 2), 0.12);
        assert_eq!(round_to(0.125, 1), 0.1);
        assert_eq!(round_to(0.25, 1), 0.3);
        assert_eq!(round_to(-0.25, 1), -0.3);
        assert_eq!(round_to(12.0, 2), 12.0);
    }
}

//! Exponential backoff.

use std::time::Duration;

/// `unit * 2^exponent`, saturating instead of overflowing.
pub fn exponential_delay(exponent: u32, unit: Duration) -> Duration {
    let factor = 2u32.checked_pow(exponent).unwrap_or(u32::MAX);
    unit.saturating_mul(factor)
}

//! Fixed-precision rendering and parsing of raw token amounts.
//!
//! ERC-20 amounts are unsigned integers scaled by the token's `decimals`
//! metadata. These helpers convert between that raw representation and
//! the decimal strings shown to (or typed by) the user, using exact
//! integer arithmetic on `U256` throughout. No locale formatting, no
//! thousands separators.

use crate::error::{CoreError, CoreResult};
use alloy::primitives::U256;

/// Render a raw amount as a decimal string with a fixed fractional width.
///
/// The amount is interpreted as `amount / 10^scale_decimals`. The
/// fractional part is zero-padded up to `display_decimals` digits, or
/// hard-truncated down to it, never rounded, so a balance display can
/// never overstate what the user holds.
///
/// `display_decimals == 0` renders the integer part alone, with no
/// trailing separator.
#[must_use]
pub fn format_units(amount: U256, scale_decimals: u32, display_decimals: usize) -> String {
    let base = pow10(scale_decimals);
    let whole = amount / base;
    let frac = amount % base;

    if display_decimals == 0 {
        return whole.to_string();
    }

    // Left-pad the fractional digits to the full scale width so leading
    // zeros survive (e.g. 12.0034, not 12.34).
    let mut digits = if scale_decimals == 0 {
        String::new()
    } else {
        pad_left(&frac.to_string(), scale_decimals as usize)
    };

    if digits.len() > display_decimals {
        digits.truncate(display_decimals);
    } else {
        while digits.len() < display_decimals {
            digits.push('0');
        }
    }

    format!("{whole}.{digits}")
}

/// Parse a user-entered decimal string into a raw amount.
///
/// Accepts plain integers (`"12"`) and decimal fractions (`"12.34"`).
/// Rejects empty input, any non-digit character, more fractional digits
/// than `scale_decimals` (the token cannot represent them), and values
/// that do not fit in 256 bits.
pub fn parse_units(text: &str, scale_decimals: u32) -> CoreResult<U256> {
    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::EmptyAmount);
    }

    let (whole, frac) = match text.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (text, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return Err(CoreError::InvalidAmount(text.to_string()));
    }
    if !is_digits(whole) || !is_digits(frac) {
        return Err(CoreError::InvalidAmount(text.to_string()));
    }
    if frac.len() > scale_decimals as usize {
        return Err(CoreError::TooManyDecimals {
            given: frac.len(),
            max: scale_decimals,
        });
    }

    let whole_part = parse_digits(if whole.is_empty() { "0" } else { whole })?;
    let frac_part = if frac.is_empty() {
        U256::ZERO
    } else {
        // Right-pad to the full scale: "3" at scale 2 means 30 raw units.
        let mut padded = frac.to_string();
        while padded.len() < scale_decimals as usize {
            padded.push('0');
        }
        parse_digits(&padded)?
    };

    whole_part
        .checked_mul(pow10(scale_decimals))
        .and_then(|scaled| scaled.checked_add(frac_part))
        .ok_or_else(|| CoreError::AmountOverflow(text.to_string()))
}

/// Shorten an address for display: `0x12345678...9abcdef0`.
///
/// Returns the input unchanged when it is already short enough, and an
/// empty string for empty input.
#[must_use]
pub fn truncate_address(address: &str, first: usize, last: usize) -> String {
    if address.is_empty() {
        return String::new();
    }
    if address.len() <= first + last {
        return address.to_string();
    }
    format!("{}...{}", &address[..first], &address[address.len() - last..])
}

fn pow10(exp: u32) -> U256 {
    U256::from(10u64).pow(U256::from(exp))
}

fn pad_left(digits: &str, width: usize) -> String {
    if digits.len() >= width {
        return digits.to_string();
    }
    let mut padded = String::with_capacity(width);
    for _ in 0..width - digits.len() {
        padded.push('0');
    }
    padded.push_str(digits);
    padded
}

fn is_digits(s: &str) -> bool {
    s.chars().all(|c| c.is_ascii_digit())
}

fn parse_digits(s: &str) -> CoreResult<U256> {
    U256::from_str_radix(s, 10).map_err(|_| CoreError::AmountOverflow(s.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_truncates_not_rounds() {
        // 123456 at scale 4 is 12.3456; display 2 chops, never rounds up
        assert_eq!(format_units(U256::from(123456u64), 4, 2), "12.34");
        assert_eq!(format_units(U256::from(129999u64), 4, 2), "12.99");
    }

    #[test]
    fn test_format_zero() {
        assert_eq!(format_units(U256::ZERO, 0, 2), "0.00");
        assert_eq!(format_units(U256::ZERO, 18, 4), "0.0000");
    }

    #[test]
    fn test_format_pads_short_fraction() {
        // 12.5 displayed with 4 digits
        assert_eq!(format_units(U256::from(125u64), 1, 4), "12.5000");
    }

    #[test]
    fn test_format_preserves_leading_fraction_zeros() {
        // 120034 at scale 4 is 12.0034
        assert_eq!(format_units(U256::from(120034u64), 4, 4), "12.0034");
        assert_eq!(format_units(U256::from(120034u64), 4, 2), "12.00");
    }

    #[test]
    fn test_format_fractional_width_is_exact() {
        for display in 1usize..=8 {
            let s = format_units(U256::from(987654321u64), 5, display);
            let (_, frac) = s.split_once('.').unwrap();
            assert_eq!(frac.len(), display, "display={display} gave {s:?}");
        }
    }

    #[test]
    fn test_format_zero_display_decimals() {
        assert_eq!(format_units(U256::from(123456u64), 4, 0), "12");
    }

    #[test]
    fn test_format_scale_zero() {
        // Whole-unit token: no fractional information, padded with zeros
        assert_eq!(format_units(U256::from(42u64), 0, 2), "42.00");
    }

    #[test]
    fn test_parse_plain_integer() {
        assert_eq!(parse_units("30", 6).unwrap(), U256::from(30_000_000u64));
        assert_eq!(parse_units("30", 0).unwrap(), U256::from(30u64));
    }

    #[test]
    fn test_parse_fraction() {
        assert_eq!(parse_units("12.34", 6).unwrap(), U256::from(12_340_000u64));
        assert_eq!(parse_units("0.5", 2).unwrap(), U256::from(50u64));
        assert_eq!(parse_units(".5", 1).unwrap(), U256::from(5u64));
    }

    #[test]
    fn test_parse_round_trips_format() {
        let raw = parse_units("12.3456", 4).unwrap();
        assert_eq!(format_units(raw, 4, 4), "12.3456");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_units("", 6), Err(CoreError::EmptyAmount)));
        assert!(matches!(
            parse_units(".", 6),
            Err(CoreError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_units("12a", 6),
            Err(CoreError::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_units("-3", 6),
            Err(CoreError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert!(matches!(
            parse_units("1.234", 2),
            Err(CoreError::TooManyDecimals { given: 3, max: 2 })
        ));
    }

    #[test]
    fn test_parse_rejects_overflow() {
        // 2^256 is about 1.16e77
        let huge = "9".repeat(80);
        assert!(matches!(
            parse_units(&huge, 0),
            Err(CoreError::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_truncate_address() {
        let addr = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
        assert_eq!(truncate_address(addr, 8, 8), "0xa0b869...3606eb48");
        assert_eq!(truncate_address("", 8, 8), "");
        assert_eq!(truncate_address("0xabcd", 8, 8), "0xabcd");
    }
}

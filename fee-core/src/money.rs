//! Rupee amounts: rounding and display.

use rust_decimal::Decimal;

/// Rounds a decimal value to exactly two decimal places using half-up rounding.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fee_core::money::round_half_up;
///
/// assert_eq!(round_half_up(dec!(123.455)), dec!(123.46));
/// assert_eq!(round_half_up(dec!(-123.455)), dec!(-123.46)); // Away from zero
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount the way the portal displays fees: a rupee sign and
/// Indian digit grouping (thousands, then lakhs and crores in pairs).
/// Paise are shown only when non-zero.
///
/// ```
/// use rust_decimal_macros::dec;
/// use fee_core::money::format_inr;
///
/// assert_eq!(format_inr(dec!(25000)), "₹25,000");
/// assert_eq!(format_inr(dec!(100000)), "₹1,00,000");
/// assert_eq!(format_inr(dec!(1234.5)), "₹1,234.50");
/// ```
pub fn format_inr(amount: Decimal) -> String {
    let rounded = round_half_up(amount);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let magnitude = rounded.abs();
    let whole = magnitude.trunc();
    let paise = magnitude - whole;

    let mut out = format!("{sign}₹{}", group_indian(&whole.to_string()));
    if !paise.is_zero() {
        let fraction = format!("{paise:.2}");
        // "0.50" -> ".50"
        out.push_str(fraction.trim_start_matches('0'));
    }
    out
}

fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);

    let mut groups = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, pair) = rest.split_at(rest.len() - 2);
        groups.push(pair);
        rest = left;
    }
    groups.push(rest);
    groups.reverse();

    format!("{},{}", groups.join(","), tail)
}

//! # Totals
//!
//! Subtotal, tax, and grand total derived from the line items and the tax
//! rate. Nothing here rounds: rounding to two decimals happens only when a
//! value is formatted for display.

use serde::Serialize;

use crate::model::LineItem;

/// Derived amounts. Never stored on the document; recomputed on change.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total: f64,
}

/// Compute totals for a set of line items at a flat percentage tax rate.
///
/// Negative quantities and prices are not rejected; they flow through the
/// arithmetic like any other value.
pub fn compute_totals(line_items: &[LineItem], tax_rate: f64) -> Totals {
    let subtotal: f64 = line_items.iter().map(LineItem::line_total).sum();
    let tax_amount = subtotal * (tax_rate / 100.0);
    Totals {
        subtotal,
        tax_amount,
        total: subtotal + tax_amount,
    }
}

/// Leniently parse a numeric form input.
///
/// Reads the longest numeric prefix (optional sign, digits, optional
/// fraction, optional exponent) after leading whitespace, so `"12abc"` is
/// `12` and `"3.5 kg"` is `3.5`. Input with no numeric prefix, or whose
/// value is not finite, yields `0`.
pub fn parse_number(input: &str) -> f64 {
    let s = input.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;

    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }

    if digits == 0 {
        return 0.0;
    }

    // Exponent only counts when at least one digit follows it.
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => 0.0,
    }
}

//! Fixed currency formatting: Indian rupees, two decimals, Indian digit
//! grouping (`₹12,34,567.80`).

pub const CURRENCY_SYMBOL: &str = "₹";

/// Format an amount for display. The model value is never modified.
pub fn format_currency(amount: f64) -> String {
    if amount.is_nan() {
        return format!("{}NaN", CURRENCY_SYMBOL);
    }
    if amount.is_infinite() {
        let sign = if amount < 0.0 { "-" } else { "" };
        return format!("{}{}∞", sign, CURRENCY_SYMBOL);
    }

    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let negative = amount < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0');
    let sign = if negative { "-" } else { "" };

    format!(
        "{}{}{}.{}",
        sign,
        CURRENCY_SYMBOL,
        group_indian(int_part),
        frac_part
    )
}

/// Insert separators: the last three digits form one group, every group
/// before that has two digits.
fn group_indian(digits: &str) -> String {
    if digits.len() <= 3 {
        return digits.to_string();
    }
    let (head, tail) = digits.split_at(digits.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut end = head.len();
    while end > 0 {
        let start = end.saturating_sub(2);
        groups.push(&head[start..end]);
        end = start;
    }
    groups.reverse();
    format!("{},{}", groups.join(","), tail)
}

//! Amount rendering for reconciliation notes

use bigdecimal::BigDecimal;

/// Render an amount with comma thousands grouping and at most three
/// fraction digits, trailing zeros dropped.
///
/// `1000` renders as `1,000`, `1234.50` as `1,234.5`.
pub fn format_amount(amount: &BigDecimal) -> String {
    let rounded = amount.round(3).to_string();
    let (sign, unsigned) = match rounded.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", rounded.as_str()),
    };

    let (int_part, frac_part) = match unsigned.split_once('.') {
        Some((i, f)) => (i, f.trim_end_matches('0')),
        None => (unsigned, ""),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if grouped.chars().all(|c| c == '0' || c == ',') && frac_part.is_empty() {
        ""
    } else {
        sign
    };

    if frac_part.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac_part}")
    }
}

/// Same as [`format_amount`] with a leading `$`
pub fn format_money(amount: &BigDecimal) -> String {
    format!("${}", format_amount(amount))
}

//! Number formatting for prompt text.

/// Format as whole dollars with thousands separators, e.g. `$15,000,000`.
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rounded = value.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    let digits = format!("{:.0}", rounded.abs());
    format!("{}${}", sign, group_thousands(&digits))
}

/// Format a percentage value with one decimal, e.g. `75.0%`.
pub fn format_percent(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.1}%", value)
}

/// Format a multiple, e.g. `1.50x`.
pub fn format_ratio(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    format!("{:.2}x", value)
}

/// Format an integer count with thousands separators.
pub fn format_count(value: f64) -> String {
    let value = if value.is_finite() { value.round() } else { 0.0 };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}", sign, group_thousands(&format!("{:.0}", value.abs())))
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

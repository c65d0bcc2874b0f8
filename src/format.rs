//! Display formatting for dashboard values.

/// Whole US dollars with thousands separators, e.g. `$474,812`.
pub fn format_currency(value: f64) -> String {
    let rounded = value.round();
    let digits = group_thousands(rounded.abs() as u64);
    if rounded < 0.0 {
        format!("-${digits}")
    } else {
        format!("${digits}")
    }
}

/// Whole-number percentage, e.g. `16%`.
pub fn format_percentage(value: f64) -> String {
    format!("{:.0}%", value.round())
}

/// One-decimal change figure without a sign prefix for positives, e.g. `-4.2`.
pub fn format_change(value: f64) -> String {
    format!("{:.1}", round_tenths(value))
}

/// Signed one-decimal change with a percent sign, e.g. `+12.5%`.
pub fn format_signed_change(value: f64) -> String {
    let value = round_tenths(value);
    if value >= 0.0 {
        format!("+{value:.1}%")
    } else {
        format!("{value:.1}%")
    }
}

pub fn format_count(value: u64) -> String {
    group_thousands(value)
}

// Halves round away from zero; `{:.1}` alone rounds them to even.
fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_is_rounded_and_grouped() {
        assert_eq!(format_currency(474812.0), "$474,812");
        assert_eq!(format_currency(1234567.6), "$1,234,568");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(-1500.0), "-$1,500");
    }

    #[test]
    fn percentages_have_no_decimals() {
        assert_eq!(format_percentage(16.0), "16%");
        assert_eq!(format_percentage(84.3), "84%");
    }

    #[test]
    fn halves_round_away_from_zero() {
        assert_eq!(format_percentage(16.5), "17%");
        assert_eq!(format_percentage(0.5), "1%");
        assert_eq!(format_currency(2.5), "$3");
        assert_eq!(format_change(0.25), "0.3");
        assert_eq!(format_signed_change(-0.25), "-0.3%");
    }

    #[test]
    fn changes_keep_one_decimal() {
        assert_eq!(format_change(-4.16666), "-4.2");
        assert_eq!(format_change(100.0), "100.0");
        assert_eq!(format_signed_change(12.54), "+12.5%");
        assert_eq!(format_signed_change(-3.0), "-3.0%");
        assert_eq!(format_signed_change(0.0), "+0.0%");
    }

    #[test]
    fn counts_are_grouped() {
        assert_eq!(format_count(768), "768");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(12345678), "12,345,678");
    }
}

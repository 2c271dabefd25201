/// Format an amount with a currency sign and thousands separators: €1,234.56
pub fn money(val: f64, sign: &str) -> String {
    let negative = val < 0.0;
    let abs = val.abs();
    let cents = format!("{:.2}", abs);
    let (int_part, dec_part) = cents.split_once('.').unwrap_or((&cents, "00"));

    let mut with_commas = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            with_commas.push(',');
        }
        with_commas.push(c);
    }
    let with_commas: String = with_commas.chars().rev().collect();

    if negative {
        format!("-{sign}{with_commas}.{dec_part}")
    } else {
        format!("{sign}{with_commas}.{dec_part}")
    }
}

/// Plain two-decimal rendering used for search matching; never carries a currency sign.
pub fn plain_amount(val: f64) -> String {
    format!("{val:.2}")
}

/// Parse an amount that may carry display decoration: a currency sign before or
/// after the number, thousands separators, surrounding whitespace.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '_' | ' ') && !is_currency_char(*c))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    let value: f64 = cleaned.parse().ok()?;
    value.is_finite().then_some(value)
}

fn is_currency_char(c: char) -> bool {
    matches!(c, '$' | '€' | '£' | '¥')
}

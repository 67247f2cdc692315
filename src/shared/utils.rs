//! Currency helpers shared across adapters and analysis

use regex::Regex;
use std::sync::LazyLock;

/// Plausible unit-price window for retail drug offers, in BRL.
/// Amounts outside this window are treated as extraction noise.
pub const MIN_PLAUSIBLE_PRICE: f64 = 1.0;
pub const MAX_PLAUSIBLE_PRICE: f64 = 1000.0;

/// Matches `R$ 12,34` / `R$12.34` / `R$ 9` style amounts
static AMOUNT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"R\$\s*([0-9]{1,4}(?:[.,][0-9]{1,2})?)").expect("valid currency regex")
});

/// Round to two-decimal (centavo) precision
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Format a BRL amount the way Brazilian storefronts print it
pub fn format_brl(value: f64) -> String {
    format!("R$ {:.2}", round_cents(value)).replace('.', ",")
}

/// Minimal query-string escaping for search terms
pub fn urlencode(term: &str) -> String {
    term.trim()
        .chars()
        .map(|c| match c {
            ' ' => "+".to_string(),
            '&' => "%26".to_string(),
            '?' => "%3F".to_string(),
            '#' => "%23".to_string(),
            '=' => "%3D".to_string(),
            '+' => "%2B".to_string(),
            other => other.to_string(),
        })
        .collect()
}

/// Extract the first plausible BRL amount from free text.
///
/// Scans every `R$`-prefixed amount, normalizes the decimal comma and
/// returns the first value inside the plausibility window. Returns `None`
/// when nothing parseable survives.
pub fn parse_brl_amount(text: &str) -> Option<f64> {
    for capture in AMOUNT_RE.captures_iter(text) {
        let raw = capture[1].replace(',', ".");
        if let Ok(value) = raw.parse::<f64>() {
            if (MIN_PLAUSIBLE_PRICE..=MAX_PLAUSIBLE_PRICE).contains(&value) {
                return Some(round_cents(value));
            }
        }
    }
    None
}

use std::sync::LazyLock;

use regex::Regex;
use relief_common::UsdEstimate;

static AMOUNT_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"AMOUNT:\s*\$?(?P<amount>[\d,]+)").expect("valid amount marker regex")
});

/// USD figure following the assessment agent's `AMOUNT:` marker.
pub fn extract_usd_amount(assessment: &str) -> UsdEstimate {
    AMOUNT_MARKER
        .captures(assessment)
        .and_then(|caps| caps["amount"].replace(',', "").parse::<u64>().ok())
        .map(UsdEstimate::Amount)
        .unwrap_or(UsdEstimate::Unknown)
}

/// USD amount expressed in the donation currency. `None` without a positive
/// quote.
pub fn convert_usd_to_crypto(usd: u64, price: Option<f64>) -> Option<f64> {
    match price {
        Some(p) if p > 0.0 && p.is_finite() => Some(usd as f64 / p),
        _ => None,
    }
}

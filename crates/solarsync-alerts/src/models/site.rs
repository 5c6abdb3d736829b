//! Site identifier normalization

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

static CANONICAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^VS-[A-Z]{3}-\d{3}$").expect("valid regex"));

static SHORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([a-zA-Z]{3})-?(\d+)$").expect("valid regex"));

/// Canonicalize a site identifier to `VS-XXX-NNN`.
///
/// `pdd001` and `pdd-1` both become `VS-PDD-001`. Identifiers that match
/// no known layout are trimmed and upper-cased.
pub fn normalize_site_id(raw: &str) -> String {
    let raw = raw.trim();

    if raw.is_empty() || CANONICAL.is_match(raw) {
        return raw.to_string();
    }

    if let Some(caps) = SHORT.captures(raw) {
        let region = caps[1].to_ascii_uppercase();
        let number = &caps[2];
        return format!("VS-{region}-{number:0>3}");
    }

    warn!(site_id = raw, "Unrecognized site id format");
    raw.to_ascii_uppercase()
}

use std::sync::OnceLock;

use chrono::NaiveDate;
use regex::Regex;

fn iso_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").unwrap())
}

fn dmy_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})[/-](\d{1,2})[/-](\d{4}|\d{2})$").unwrap())
}

fn day_month_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})$").unwrap())
}

const MONTH_NAMES: &[&str] = &[
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parse a locale-formatted date string into a canonical date.
///
/// Accepts ISO `YYYY-MM-DD`, day/month/year with `/` or `-` separators
/// (2-digit years split at a 50 pivot into 1900s/2000s), and
/// `day month-name year`. Returns `None` for anything else.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();

    if let Some(caps) = iso_re().captures(raw) {
        let y: i32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let d: u32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(caps) = dmy_re().captures(raw) {
        let d: u32 = caps[1].parse().ok()?;
        let m: u32 = caps[2].parse().ok()?;
        let mut y: i32 = caps[3].parse().ok()?;
        if y < 100 {
            y = if y < 50 { 2000 + y } else { 1900 + y };
        }
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    if let Some(caps) = day_month_name_re().captures(raw) {
        let d: u32 = caps[1].parse().ok()?;
        let name = caps[2].to_lowercase();
        let m = MONTH_NAMES
            .iter()
            .position(|n| name.starts_with(n))
            .map(|i| i as u32 + 1)?;
        let y: i32 = caps[3].parse().ok()?;
        return NaiveDate::from_ymd_opt(y, m, d);
    }

    None
}

/// Parse a currency string into a signed amount. Strips currency symbols,
/// thousands separators, quotes and whitespace; parenthesized values are
/// negative. Unparseable input yields 0.0 and the row is dropped upstream.
pub fn parse_amount(raw: &str) -> f64 {
    let s: String = raw
        .chars()
        .filter(|c| !matches!(c, '\u{20a6}' | '$' | ',' | '"') && !c.is_whitespace())
        .collect();
    if let Some(inner) = s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        return -inner.parse::<f64>().unwrap_or(0.0);
    }
    s.parse().unwrap_or(0.0)
}

/// Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug).
#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> NaiveDate {
    let base = NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    base + chrono::Duration::days(serial as i64)
}

//! Cell-level normalization: numeric coercion, permissive date parsing and
//! display formatting of aggregated numbers.
//!
//! Nothing in here fails. A cell that can't be interpreted becomes
//! [`Numeric::Missing`] (or `None` for dates) and drops out of later sums and
//! means.

use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use serde::{Serialize, Serializer};

/// Result of coercing one metric cell.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Numeric {
    Number(f64),
    #[default]
    Missing,
}

impl Numeric {
    pub fn value(self) -> Option<f64> {
        match self {
            Numeric::Number(v) => Some(v),
            Numeric::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Numeric::Missing)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Number(v) => f.write_str(&format_number(*v)),
            Numeric::Missing => f.write_str(PLACEHOLDER),
        }
    }
}

impl Serialize for Numeric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.value().serialize(serializer)
    }
}

/// Shown in place of a metric that is unavailable.
pub const PLACEHOLDER: &str = "-";

/// Strips `%` and `,` and parses what remains as a finite float.
pub fn coerce_numeric(raw: &str) -> Numeric {
    let cleaned = raw
        .chars()
        .filter(|c| !matches!(c, '%' | ','))
        .collect::<String>();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        return Numeric::Missing;
    }
    match trimmed.parse::<f64>() {
        Ok(v) if v.is_finite() => Numeric::Number(v),
        _ => Numeric::Missing,
    }
}

pub fn coerce_column<S: AsRef<str>>(values: &[S]) -> Vec<Numeric> {
    values.iter().map(|v| coerce_numeric(v.as_ref())).collect()
}

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%m-%d-%Y",
    "%d-%m-%Y",
    "%m/%d/%y",
    "%m.%d.%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %B, %Y",
    "%a, %B %d, %Y",
    "%A, %B %d, %Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
];

/// Best-effort calendar date from mixed-format text.
///
/// Month-first is preferred for ambiguous slash dates (`01/05/2024` is
/// January 5th); day-first is only used when the first field can't be a
/// month. Time of day and offsets are discarded.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }
    if let Some(date) = parse_plain_date(value) {
        return Some(date);
    }
    if let Some(date) = parse_korean_date(value) {
        return Some(date);
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, fmt)
            && plausible_year(parsed.date())
        {
            return Some(parsed.date());
        }
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.date_naive());
    }
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.date_naive());
    }
    // "2024-01-05 00:00:00+09:00" and similar: keep the leading date token.
    let head = value.split(['T', ' ']).next().unwrap_or_default();
    if head.len() < value.len() {
        return parse_plain_date(head);
    }
    None
}

fn parse_plain_date(value: &str) -> Option<NaiveDate> {
    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        let year = value[..4].parse().ok()?;
        let month = value[4..6].parse().ok()?;
        let day = value[6..].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(value, fmt)
            .ok()
            .filter(|date| plausible_year(*date))
    })
}

/// `%Y` also matches one to three digits; such years are rejected so
/// `01/05/24` reaches the two-digit-year format.
fn plausible_year(date: NaiveDate) -> bool {
    date.year() >= 1000
}

/// `2024년 1월 5일` and `2024. 1. 5.` as written by Korean-locale exports.
fn parse_korean_date(value: &str) -> Option<NaiveDate> {
    if value.contains('년') {
        let normalized = value
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '일')
            .map(|c| if c == '년' || c == '월' { '-' } else { c })
            .collect::<String>();
        return NaiveDate::parse_from_str(&normalized, "%Y-%m-%d").ok();
    }
    if value.contains(". ") || value.ends_with('.') {
        let normalized = value
            .trim_end_matches('.')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>();
        return NaiveDate::parse_from_str(&normalized, "%Y.%m.%d").ok();
    }
    None
}

/// Integers print without decimals, everything else with two.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value:.2}")
    }
}

pub fn format_optional(value: Option<f64>) -> String {
    value.map(format_number).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Fixed decimals with `,` thousands separators, e.g. `1,234,567.8`.
pub fn format_grouped(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.decimals$}", value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (rendered.as_str(), None),
    };
    let mut grouped = String::with_capacity(rendered.len() + int_part.len() / 3 + 1);
    if value < 0.0 && rendered.chars().any(|c| c.is_ascii_digit() && c != '0') {
        grouped.push('-');
    }
    for (idx, ch) in int_part.chars().enumerate() {
        if idx > 0 && (int_part.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }
    grouped
}

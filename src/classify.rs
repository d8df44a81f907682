//! Shorts / Longform classification.
//!
//! The mode is chosen once per dataset from which columns exist, then
//! applied to every row. Modes never fall through to one another: a dataset
//! with a `type` column never consults durations or titles.

use serde::Serialize;

use crate::data::Numeric;

pub const SHORTS: &str = "Shorts";
pub const LONGFORM: &str = "Longform";
pub const UNKNOWN: &str = "Unknown";

/// Upper bound (inclusive) of a Short, in seconds.
pub const SHORTS_MAX_SECONDS: f64 = 60.0;

const SHORTS_TAG: &str = "#shorts";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifierMode {
    /// An explicit `type` column; labels pass through as written.
    MappingType,
    /// A `duration_sec` column; `<= 60` seconds is a Short.
    Duration,
    /// `#shorts` in the title, otherwise unknown.
    TitleHeuristic,
}

impl ClassifierMode {
    pub fn select(has_type_column: bool, has_duration_column: bool) -> Self {
        if has_type_column {
            ClassifierMode::MappingType
        } else if has_duration_column {
            ClassifierMode::Duration
        } else {
            ClassifierMode::TitleHeuristic
        }
    }
}

/// Inputs the classifier may look at for one row.
#[derive(Debug, Clone, Copy, Default)]
pub struct RowFacts<'a> {
    pub title: Option<&'a str>,
    pub duration_sec: Numeric,
    pub mapped_type: Option<&'a str>,
}

/// Labels one row.
///
/// `MappingType` values are not restricted to [`SHORTS`]/[`LONGFORM`]; any
/// label the mapping file uses is kept as written. Empty type cells and missing
/// durations become [`UNKNOWN`].
pub fn classify(mode: ClassifierMode, facts: &RowFacts<'_>) -> String {
    match mode {
        ClassifierMode::MappingType => facts
            .mapped_type
            .filter(|label| !label.trim().is_empty())
            .unwrap_or(UNKNOWN)
            .to_string(),
        ClassifierMode::Duration => match facts.duration_sec {
            Numeric::Number(seconds) if seconds <= SHORTS_MAX_SECONDS => SHORTS.to_string(),
            Numeric::Number(_) => LONGFORM.to_string(),
            Numeric::Missing => UNKNOWN.to_string(),
        },
        ClassifierMode::TitleHeuristic => {
            let tagged = facts
                .title
                .is_some_and(|title| title.to_lowercase().contains(SHORTS_TAG));
            let label = if tagged { SHORTS } else { UNKNOWN };
            label.to_string()
        }
    }
}

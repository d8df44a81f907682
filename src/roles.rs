//! Semantic roles and column resolution.
//!
//! Exports from the analytics console use different header text depending on
//! the account language and export options ("Views", "조회수", "Video Views",
//! ...). Every downstream stage addresses columns through a [`Role`]; the
//! [`Resolution`] computed here is the only place that knows which header a
//! role landed on.

use std::{collections::BTreeMap, fmt};

use clap::ValueEnum;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::AliasConfig;

/// Literal column carrying a video length in seconds, usually from the mapping file.
pub const DURATION_COLUMN: &str = "duration_sec";
/// Literal column carrying an explicit category label.
pub const TYPE_COLUMN: &str = "type";
/// Canonical title header, also the join key of the mapping file.
pub const TITLE_COLUMN: &str = "Video title";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Title,
    Date,
    Views,
    WatchTime,
    AvgViewDuration,
    Impressions,
    Ctr,
    Subs,
}

impl Role {
    pub const ALL: [Role; 8] = [
        Role::Title,
        Role::Date,
        Role::Views,
        Role::WatchTime,
        Role::AvgViewDuration,
        Role::Impressions,
        Role::Ctr,
        Role::Subs,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Title => "title",
            Role::Date => "date",
            Role::Views => "views",
            Role::WatchTime => "watch_time",
            Role::AvgViewDuration => "avg_view_duration",
            Role::Impressions => "impressions",
            Role::Ctr => "ctr",
            Role::Subs => "subs",
        }
    }

    /// Built-in header candidates in priority order (English, then Korean exports).
    pub fn default_candidates(&self) -> &'static [&'static str] {
        match self {
            Role::Title => &["Video title", "제목", "동영상", "Video", "Title"],
            Role::Date => &["Date", "날짜", "일자"],
            Role::Views => &["Views", "조회수"],
            Role::WatchTime => &[
                "Watch time (hours)",
                "시청 시간(시간)",
                "Watch time",
                "시청 시간",
            ],
            Role::AvgViewDuration => &[
                "Average view duration",
                "평균 시청 시간",
                "Avg view duration",
            ],
            Role::Impressions => &["Impressions", "노출수"],
            Role::Ctr => &["Impressions click-through rate", "노출 대비 클릭률", "CTR"],
            Role::Subs => &["Subscribers", "구독자", "Subscribers gained", "구독자 증가"],
        }
    }

    pub fn metric(&self) -> Option<Metric> {
        match self {
            Role::Title | Role::Date => None,
            Role::Views => Some(Metric::Views),
            Role::WatchTime => Some(Metric::WatchTime),
            Role::AvgViewDuration => Some(Metric::AvgViewDuration),
            Role::Impressions => Some(Metric::Impressions),
            Role::Ctr => Some(Metric::Ctr),
            Role::Subs => Some(Metric::Subs),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a metric collapses when rows are grouped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Sum,
    Mean,
}

/// The numeric subset of [`Role`]; also the user-selectable sort keys.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum Metric {
    Views,
    WatchTime,
    AvgViewDuration,
    Impressions,
    Ctr,
    Subs,
}

impl Metric {
    pub const ALL: [Metric; 6] = [
        Metric::Views,
        Metric::WatchTime,
        Metric::AvgViewDuration,
        Metric::Impressions,
        Metric::Ctr,
        Metric::Subs,
    ];

    pub fn role(&self) -> Role {
        match self {
            Metric::Views => Role::Views,
            Metric::WatchTime => Role::WatchTime,
            Metric::AvgViewDuration => Role::AvgViewDuration,
            Metric::Impressions => Role::Impressions,
            Metric::Ctr => Role::Ctr,
            Metric::Subs => Role::Subs,
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.role().as_str()
    }

    /// Volume metrics add up across rows; rates and durations are averaged.
    pub fn aggregation(&self) -> Aggregation {
        match self {
            Metric::Views | Metric::WatchTime | Metric::Impressions | Metric::Subs => {
                Aggregation::Sum
            }
            Metric::AvgViewDuration | Metric::Ctr => Aggregation::Mean,
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Metric::Views => 0,
            Metric::WatchTime => 1,
            Metric::AvgViewDuration => 2,
            Metric::Impressions => 3,
            Metric::Ctr => 4,
            Metric::Subs => 5,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the first header matching the candidates.
///
/// Candidates are tried in order. For each candidate the rules are, in
/// priority: exact match, case-insensitive match, case-insensitive substring
/// (candidate contained in the header). Within a rule the first header in
/// table order wins.
pub fn resolve_column<'h, S>(headers: &'h [String], candidates: &[S]) -> Option<&'h str>
where
    S: AsRef<str>,
{
    let lowered = headers
        .iter()
        .map(|h| h.to_lowercase())
        .collect::<Vec<_>>();
    for candidate in candidates {
        let candidate = candidate.as_ref();
        if let Some(exact) = headers.iter().find(|h| h.as_str() == candidate) {
            return Some(exact);
        }
        let needle = candidate.to_lowercase();
        if let Some(idx) = lowered.iter().position(|h| *h == needle) {
            return Some(&headers[idx]);
        }
        if let Some(idx) = lowered.iter().position(|h| h.contains(&needle)) {
            return Some(&headers[idx]);
        }
    }
    None
}

/// Role → header mapping computed once per dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
    columns: BTreeMap<Role, String>,
}

impl Resolution {
    pub fn resolve(headers: &[String], aliases: &AliasConfig) -> Self {
        let mut columns = BTreeMap::new();
        for role in Role::ALL {
            let candidates = aliases.candidates_for(role);
            match resolve_column(headers, &candidates) {
                Some(column) => {
                    debug!("Role '{role}' resolved to column '{column}'");
                    columns.insert(role, column.to_string());
                }
                None => debug!("Role '{role}' not found among {} column(s)", headers.len()),
            }
        }
        Self { columns }
    }

    pub fn get(&self, role: Role) -> Option<&str> {
        self.columns.get(&role).map(String::as_str)
    }

    pub fn has(&self, role: Role) -> bool {
        self.columns.contains_key(&role)
    }

    pub fn metrics(&self) -> Vec<Metric> {
        Metric::ALL
            .into_iter()
            .filter(|metric| self.has(metric.role()))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Role, &str)> {
        self.columns.iter().map(|(role, col)| (*role, col.as_str()))
    }
}

/// Exact-name lookup for literal columns such as `type` and `duration_sec`.
pub fn find_exact(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h == name)
}

//! Builds the Working Table: the raw concatenated uploads with metric cells
//! coerced, dates parsed, the optional mapping file merged in and every row
//! classified.

use std::collections::HashMap;

use chrono::NaiveDate;
use log::{info, warn};
use serde::Serialize;

use crate::{
    classify::{self, ClassifierMode, RowFacts},
    config::AliasConfig,
    data::{Numeric, coerce_numeric, parse_date},
    ingest::RawTable,
    roles::{self, DURATION_COLUMN, Metric, Resolution, Role, TITLE_COLUMN, TYPE_COLUMN},
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingRow {
    pub source: String,
    pub title: Option<String>,
    pub date: Option<NaiveDate>,
    metrics: [Numeric; 6],
    pub duration_sec: Numeric,
    pub mapped_type: Option<String>,
    pub category: String,
}

impl WorkingRow {
    pub fn metric(&self, metric: Metric) -> Numeric {
        self.metrics[metric.index()]
    }
}

/// Mapping rows keyed by exact video title.
#[derive(Debug, Clone, Default)]
pub struct MappingTable {
    entries: HashMap<String, Vec<MappingEntry>>,
    has_duration: bool,
    has_type: bool,
}

#[derive(Debug, Clone)]
struct MappingEntry {
    duration_sec: Numeric,
    mapped_type: Option<String>,
}

impl MappingTable {
    /// Reads the `Video title`, `duration_sec` and `type` columns; `None`
    /// when the join column is missing.
    pub fn from_raw(table: &RawTable) -> Option<Self> {
        let title_idx = table.column_index(TITLE_COLUMN)?;
        let duration_idx = table.column_index(DURATION_COLUMN);
        let type_idx = table.column_index(TYPE_COLUMN);
        let mut entries: HashMap<String, Vec<MappingEntry>> = HashMap::new();
        for row in &table.rows {
            let title = &row.cells[title_idx];
            if title.is_empty() {
                continue;
            }
            let entry = MappingEntry {
                duration_sec: duration_idx
                    .map(|idx| coerce_numeric(&row.cells[idx]))
                    .unwrap_or_default(),
                mapped_type: type_idx.and_then(|idx| non_empty(&row.cells[idx])),
            };
            entries.entry(title.clone()).or_default().push(entry);
        }
        Some(Self {
            entries,
            has_duration: duration_idx.is_some(),
            has_type: type_idx.is_some(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkingTable {
    pub resolution: Resolution,
    pub classifier: ClassifierMode,
    pub rows: Vec<WorkingRow>,
    pub warnings: Vec<String>,
}

impl WorkingTable {
    pub fn build(raw: &RawTable, mapping: Option<&RawTable>, aliases: &AliasConfig) -> Self {
        let resolution = Resolution::resolve(&raw.headers, aliases);
        let mut warnings = Vec::new();

        let column = |role: Role| {
            resolution
                .get(role)
                .and_then(|name| raw.column_index(name))
        };
        let title_idx = column(Role::Title);
        let date_idx = column(Role::Date);
        let metric_idx = Metric::ALL.map(|metric| column(metric.role()));
        let duration_idx = roles::find_exact(&raw.headers, DURATION_COLUMN);
        let type_idx = roles::find_exact(&raw.headers, TYPE_COLUMN);

        let mut rows = raw
            .rows
            .iter()
            .map(|row| {
                let cell = |idx: Option<usize>| idx.map(|i| row.cells[i].as_str());
                WorkingRow {
                    source: row.source.clone(),
                    title: cell(title_idx).and_then(non_empty),
                    date: cell(date_idx).and_then(parse_date),
                    metrics: metric_idx.map(|idx| cell(idx).map(coerce_numeric).unwrap_or_default()),
                    duration_sec: cell(duration_idx).map(coerce_numeric).unwrap_or_default(),
                    mapped_type: cell(type_idx).and_then(non_empty),
                    category: String::new(),
                }
            })
            .collect::<Vec<_>>();

        let mut has_duration = duration_idx.is_some();
        let mut has_type = type_idx.is_some();

        if let Some(mapping_raw) = mapping {
            match (MappingTable::from_raw(mapping_raw), title_idx) {
                (None, _) => push_warning(
                    &mut warnings,
                    format!("Mapping file has no '{TITLE_COLUMN}' column; merge skipped"),
                ),
                (Some(_), None) => push_warning(
                    &mut warnings,
                    "No title column found in the uploads; mapping merge skipped".to_string(),
                ),
                (Some(table), Some(_)) => {
                    rows = merge_mapping(rows, &table);
                    has_duration |= table.has_duration;
                    has_type |= table.has_type;
                    info!(
                        "Merged {} mapping row(s); working table has {} row(s)",
                        table.len(),
                        rows.len()
                    );
                }
            }
        }

        let classifier = ClassifierMode::select(has_type, has_duration);
        for row in &mut rows {
            let facts = RowFacts {
                title: row.title.as_deref(),
                duration_sec: row.duration_sec,
                mapped_type: row.mapped_type.as_deref(),
            };
            row.category = classify::classify(classifier, &facts);
        }

        if classifier == ClassifierMode::Duration {
            let missing = rows.iter().filter(|r| r.duration_sec.is_missing()).count();
            if missing > 0 {
                push_warning(
                    &mut warnings,
                    format!(
                        "{missing} row(s) have no usable {DURATION_COLUMN}; classified as {}",
                        classify::UNKNOWN
                    ),
                );
            }
        }

        Self {
            resolution,
            classifier,
            rows,
            warnings,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Left join on title. Rows repeat once per matching mapping entry; mapping
/// columns replace any same-named export columns.
fn merge_mapping(rows: Vec<WorkingRow>, mapping: &MappingTable) -> Vec<WorkingRow> {
    let mut merged = Vec::with_capacity(rows.len());
    for row in rows {
        let matches = row
            .title
            .as_ref()
            .and_then(|title| mapping.entries.get(title));
        match matches {
            Some(entries) => {
                for entry in entries {
                    let mut joined = row.clone();
                    apply_entry(&mut joined, mapping, Some(entry));
                    merged.push(joined);
                }
            }
            None => {
                let mut unmatched = row;
                apply_entry(&mut unmatched, mapping, None);
                merged.push(unmatched);
            }
        }
    }
    merged
}

fn apply_entry(row: &mut WorkingRow, mapping: &MappingTable, entry: Option<&MappingEntry>) {
    if mapping.has_duration {
        row.duration_sec = entry.map(|e| e.duration_sec).unwrap_or_default();
    }
    if mapping.has_type {
        row.mapped_type = entry.and_then(|e| e.mapped_type.clone());
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn push_warning(warnings: &mut Vec<String>, message: String) {
    warn!("{message}");
    warnings.push(message);
}

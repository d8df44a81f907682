//! Dataset, per-category, per-title and per-day aggregation over the
//! Working Table.
//!
//! Every metric collapses with its [`Aggregation`]: volume metrics are summed,
//! rates and durations averaged. Missing cells are skipped by both. A sum over
//! a resolved column whose cells are all missing is `0`; a mean over no values
//! is unavailable.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
};

use chrono::NaiveDate;
use itertools::Itertools;
use log::{debug, info};
use serde::Serialize;

use crate::{
    data::Numeric,
    roles::{Aggregation, Metric, Role},
    working::{WorkingRow, WorkingTable},
};

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MetricAccumulator {
    sum: f64,
    count: usize,
}

impl MetricAccumulator {
    pub fn add(&mut self, value: Numeric) {
        if let Numeric::Number(v) = value {
            self.sum += v;
            self.count += 1;
        }
    }

    pub fn finish(&self, aggregation: Aggregation) -> Option<f64> {
        match aggregation {
            Aggregation::Sum => Some(self.sum),
            Aggregation::Mean if self.count > 0 => Some(self.sum / self.count as f64),
            Aggregation::Mean => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricValue {
    pub metric: Metric,
    /// `None` when the metric's column was not found, or a mean had no values.
    pub value: Option<f64>,
    pub available: bool,
}

/// Whole-dataset totals behind the summary cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub rows: usize,
    pub metrics: Vec<MetricValue>,
}

impl DatasetSummary {
    pub fn compute(table: &WorkingTable) -> Self {
        let metrics = Metric::ALL
            .into_iter()
            .map(|metric| {
                if !table.resolution.has(metric.role()) {
                    return MetricValue {
                        metric,
                        value: None,
                        available: false,
                    };
                }
                let mut acc = MetricAccumulator::default();
                for row in &table.rows {
                    acc.add(row.metric(metric));
                }
                MetricValue {
                    metric,
                    value: acc.finish(metric.aggregation()),
                    available: true,
                }
            })
            .collect();
        Self {
            rows: table.len(),
            metrics,
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics
            .iter()
            .find(|m| m.metric == metric)
            .and_then(|m| m.value)
    }

    pub fn total_views(&self) -> Option<f64> {
        self.get(Metric::Views)
    }

    pub fn total_watch_time(&self) -> Option<f64> {
        self.get(Metric::WatchTime)
    }

    pub fn average_ctr(&self) -> Option<f64> {
        self.get(Metric::Ctr)
    }

    pub fn net_subscribers(&self) -> Option<f64> {
        self.get(Metric::Subs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub key: String,
    /// First-seen category of the group (per-title summaries only).
    pub category: Option<String>,
    pub rows: usize,
    /// One entry per [`SummaryTable::metrics`], same order.
    pub values: Vec<Option<f64>>,
}

/// Grouped summary: one row per key, one column per resolved metric.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryTable {
    pub metrics: Vec<Metric>,
    pub rows: Vec<SummaryRow>,
}

impl SummaryTable {
    pub fn has_metric(&self, metric: Metric) -> bool {
        self.metrics.contains(&metric)
    }

    pub fn value(&self, row: &SummaryRow, metric: Metric) -> Option<f64> {
        let idx = self.metrics.iter().position(|m| *m == metric)?;
        row.values.get(idx).copied().flatten()
    }

    /// Whether the metric is present with at least one populated value.
    pub fn has_values(&self, metric: Metric) -> bool {
        self.rows.iter().any(|row| self.value(row, metric).is_some())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

struct GroupAccumulator {
    key: String,
    category: String,
    rows: usize,
    metrics: Vec<MetricAccumulator>,
}

/// Groups rows in first-appearance order of their key.
fn group_rows<'a, F>(rows: &'a [WorkingRow], metrics: &[Metric], key_of: F) -> Vec<GroupAccumulator>
where
    F: Fn(&'a WorkingRow) -> Option<&'a str>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<GroupAccumulator> = Vec::new();
    for row in rows {
        let Some(key) = key_of(row) else {
            continue;
        };
        let slot = *index.entry(key).or_insert_with(|| {
            groups.push(GroupAccumulator {
                key: key.to_string(),
                category: row.category.clone(),
                rows: 0,
                metrics: vec![MetricAccumulator::default(); metrics.len()],
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];
        group.rows += 1;
        for (acc, metric) in group.metrics.iter_mut().zip(metrics) {
            acc.add(row.metric(*metric));
        }
    }
    groups
}

fn finish_group(group: GroupAccumulator, metrics: &[Metric], carry_category: bool) -> SummaryRow {
    SummaryRow {
        key: group.key,
        category: carry_category.then_some(group.category),
        rows: group.rows,
        values: group
            .metrics
            .iter()
            .zip(metrics)
            .map(|(acc, metric)| acc.finish(metric.aggregation()))
            .collect(),
    }
}

/// Per-category comparison, keys in ascending order. Unresolved metrics are
/// left out of the table rather than filled with defaults.
pub fn summarize_by_category(table: &WorkingTable) -> SummaryTable {
    let metrics = table.resolution.metrics();
    let rows = group_rows(&table.rows, &metrics, |row| Some(row.category.as_str()))
        .into_iter()
        .map(|group| finish_group(group, &metrics, false))
        .sorted_by(|a, b| a.key.cmp(&b.key))
        .collect::<Vec<_>>();
    debug!("Category summary has {} group(s)", rows.len());
    SummaryTable { metrics, rows }
}

/// Per-title summary in first-appearance order, or `None` when no title
/// column was resolved. Rows without a title are left out.
pub fn summarize_by_title(table: &WorkingTable) -> Option<SummaryTable> {
    if !table.resolution.has(Role::Title) {
        return None;
    }
    let metrics = table.resolution.metrics();
    let rows = group_rows(&table.rows, &metrics, |row| row.title.as_deref())
        .into_iter()
        .map(|group| finish_group(group, &metrics, true))
        .collect();
    Some(SummaryTable { metrics, rows })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopTitles {
    pub requested: Metric,
    /// Metric actually sorted by; `None` when neither the requested metric nor
    /// views exist and first-appearance order was kept.
    pub sort_key: Option<Metric>,
    pub limit: usize,
    pub table: SummaryTable,
}

/// Stable descending sort by `requested` (falling back to views), missing
/// values last, truncated to `limit` rows.
pub fn top_titles(mut summary: SummaryTable, requested: Metric, limit: usize) -> TopTitles {
    let sort_key = if summary.has_metric(requested) {
        Some(requested)
    } else if summary.has_metric(Metric::Views) {
        info!("Sort metric '{requested}' unavailable; ranking by views");
        Some(Metric::Views)
    } else {
        info!("Neither '{requested}' nor views available; keeping upload order");
        None
    };

    if let Some(metric) = sort_key
        && let Some(idx) = summary.metrics.iter().position(|m| *m == metric)
    {
        summary
            .rows
            .sort_by(|a, b| descending_missing_last(a.values[idx], b.values[idx]));
    }
    summary.rows.truncate(limit);

    TopTitles {
        requested,
        sort_key,
        limit,
        table: summary,
    }
}

fn descending_missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub category: String,
    pub views: f64,
}

/// Views per day and category, ordered by date then category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySeries {
    pub categories: Vec<String>,
    pub points: Vec<DailyPoint>,
}

impl DailySeries {
    /// Date-major pivot: one row per date, one optional value per category.
    pub fn pivot(&self) -> Vec<(NaiveDate, Vec<Option<f64>>)> {
        self.points
            .iter()
            .chunk_by(|point| point.date)
            .into_iter()
            .map(|(date, points)| {
                let mut values = vec![None; self.categories.len()];
                for point in points {
                    if let Some(idx) = self.categories.iter().position(|c| *c == point.category) {
                        values[idx] = Some(point.views);
                    }
                }
                (date, values)
            })
            .collect()
    }
}

/// Only available when both a date and a views column were resolved. Rows
/// whose date didn't parse are dropped.
pub fn daily_views(table: &WorkingTable) -> Option<DailySeries> {
    if !table.resolution.has(Role::Date) || !table.resolution.has(Role::Views) {
        return None;
    }
    let mut buckets: BTreeMap<(NaiveDate, &str), MetricAccumulator> = BTreeMap::new();
    for row in &table.rows {
        if let Some(date) = row.date {
            buckets
                .entry((date, row.category.as_str()))
                .or_default()
                .add(row.metric(Metric::Views));
        }
    }
    let categories = buckets
        .keys()
        .map(|(_, category)| category.to_string())
        .sorted()
        .dedup()
        .collect();
    let points = buckets
        .into_iter()
        .map(|((date, category), acc)| DailyPoint {
            date,
            category: category.to_string(),
            views: acc.finish(Aggregation::Sum).unwrap_or_default(),
        })
        .collect();
    Some(DailySeries { categories, points })
}

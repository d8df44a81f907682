//! The `report` command: runs the whole pipeline and renders the result.
//!
//! ingest → resolve → normalize → merge mapping → classify → aggregate →
//! advise → render. [`analyze`] is the pure part and is what the tests drive;
//! [`execute`] adds file loading, chart export and printing.

use std::{fmt::Write as _, path::Path};

use anyhow::{Context, Result, bail};
use log::{info, warn};
use serde::Serialize;

use crate::{
    aggregate::{self, DailySeries, DatasetSummary, SummaryTable, TopTitles},
    classify::ClassifierMode,
    cli::{Mode, OutputFormat, ReportArgs},
    config::AliasConfig,
    data::{PLACEHOLDER, format_grouped, format_optional},
    error::FileFailure,
    ingest::{self, IngestOutcome, ParseOptions, RawTable, TableCache, Upload},
    insights::{self, Insight, Locale},
    io_utils,
    roles::{Metric, Resolution, TITLE_COLUMN, TYPE_COLUMN},
    table,
    working::WorkingTable,
};

#[derive(Debug, Clone, Copy)]
pub struct AnalysisOptions {
    pub sort_key: Metric,
    pub top: usize,
    pub locale: Locale,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            sort_key: Metric::Views,
            top: 10,
            locale: Locale::En,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightEntry {
    pub kind: Insight,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub files: Vec<String>,
    pub skipped_files: Vec<FileFailure>,
    pub rows: usize,
    pub resolution: Resolution,
    pub classifier: ClassifierMode,
    pub summary: DatasetSummary,
    pub categories: SummaryTable,
    pub daily: Option<DailySeries>,
    pub top: Option<TopTitles>,
    pub insights: Vec<InsightEntry>,
    pub warnings: Vec<String>,
}

/// Runs every stage after ingestion.
pub fn analyze(
    outcome: IngestOutcome,
    mapping: Option<&RawTable>,
    aliases: &AliasConfig,
    options: &AnalysisOptions,
) -> Report {
    let working = WorkingTable::build(&outcome.table, mapping, aliases);
    let summary = DatasetSummary::compute(&working);
    let categories = aggregate::summarize_by_category(&working);
    let daily = aggregate::daily_views(&working);
    let top = aggregate::summarize_by_title(&working)
        .map(|titles| aggregate::top_titles(titles, options.sort_key, options.top));
    let insights = insights::advise(top.as_ref().map(|t| &t.table))
        .into_iter()
        .map(|kind| InsightEntry {
            kind,
            message: kind.message(options.locale).to_string(),
        })
        .collect();
    info!(
        "Analyzed {} working row(s) across {} categor(ies)",
        working.len(),
        categories.len()
    );

    Report {
        files: outcome.parsed_files,
        skipped_files: outcome.failures,
        rows: working.len(),
        resolution: working.resolution,
        classifier: working.classifier,
        summary,
        categories,
        daily,
        top,
        insights,
        warnings: working.warnings,
    }
}

pub fn execute(args: &ReportArgs) -> Result<()> {
    let labels = Labels::for_locale(args.locale);
    if args.mode == Mode::Api {
        info!("API mode selected; nothing to do yet");
        println!("{}", labels.api_placeholder);
        return Ok(());
    }
    if args.inputs.is_empty() {
        bail!("At least one --input file is required in CSV mode");
    }

    let encoding = io_utils::resolve_encoding(args.input.input_encoding.as_deref())?;
    let parse_options = ParseOptions {
        delimiter: args.input.delimiter,
        encoding,
    };
    let aliases = load_aliases(args.aliases.as_deref())?;
    let mut cache = TableCache::new();

    let outcome = ingest::ingest_paths(&args.inputs, &parse_options, &mut cache)
        .context("Loading uploaded reports")?;

    let mut mapping_warnings = Vec::new();
    let mapping = match &args.mapping {
        Some(path) => match load_mapping(path, &parse_options, &mut cache) {
            Ok(table) => Some(table),
            Err(err) => {
                let message = format!("Mapping file '{}' skipped: {err:#}", path.display());
                warn!("{message}");
                mapping_warnings.push(message);
                None
            }
        },
        None => None,
    };

    let options = AnalysisOptions {
        sort_key: args.sort_key,
        top: args.top,
        locale: args.locale,
    };
    let mut report = analyze(outcome, mapping.as_ref(), &aliases, &options);
    mapping_warnings.append(&mut report.warnings);
    report.warnings = mapping_warnings;

    if let Some(path) = &args.chart_output {
        match &report.daily {
            Some(series) => {
                write_daily_series(series, path)?;
                info!("Daily series written to {path:?}");
            }
            None => warn!("Daily series unavailable (needs date and views columns); {path:?} not written"),
        }
    }

    match args.format {
        OutputFormat::Json => {
            let rendered =
                serde_json::to_string_pretty(&report).context("Serializing report as JSON")?;
            println!("{rendered}");
        }
        OutputFormat::Table => print!("{}", render_text(&report, args.locale)),
    }
    Ok(())
}

pub(crate) fn load_aliases(path: Option<&Path>) -> Result<AliasConfig> {
    match path {
        Some(path) => AliasConfig::load(path)
            .with_context(|| format!("Loading header aliases from {path:?}")),
        None => Ok(AliasConfig::default()),
    }
}

fn load_mapping(path: &Path, options: &ParseOptions, cache: &mut TableCache) -> Result<RawTable> {
    let upload = Upload::from_path(path)?;
    let parsed = cache.get_or_parse(&upload, options)?;
    Ok(RawTable::concat([(upload.name, parsed)]))
}

pub fn write_daily_series(series: &DailySeries, path: &Path) -> Result<()> {
    let delimiter = io_utils::resolve_output_delimiter(Some(path), io_utils::DEFAULT_CSV_DELIMITER);
    let mut writer = io_utils::open_csv_writer(Some(path), delimiter)?;
    writer
        .write_record(["date", TYPE_COLUMN, "views"])
        .context("Writing chart headers")?;
    for point in &series.points {
        writer
            .write_record([
                point.date.format("%Y-%m-%d").to_string(),
                point.category.clone(),
                format_optional(Some(point.views)),
            ])
            .context("Writing chart row")?;
    }
    writer.flush().context("Flushing chart output")?;
    Ok(())
}

struct Labels {
    title: &'static str,
    skipped: &'static str,
    cards: &'static str,
    total_views: &'static str,
    total_watch_time: &'static str,
    average_ctr: &'static str,
    net_subscribers: &'static str,
    comparison: &'static str,
    daily: &'static str,
    daily_unavailable: &'static str,
    top: &'static str,
    no_title: &'static str,
    tips: &'static str,
    notes: &'static str,
    api_placeholder: &'static str,
}

impl Labels {
    fn for_locale(locale: Locale) -> Self {
        match locale {
            Locale::En => Labels {
                title: "Channel analytics report",
                skipped: "Skipped files",
                cards: "1) Key metrics",
                total_views: "Total views",
                total_watch_time: "Total watch time (hours)",
                average_ctr: "Average CTR (%)",
                net_subscribers: "Subscriber change",
                comparison: "2) Longform vs Shorts",
                daily: "3) Daily views by type",
                daily_unavailable: "Daily trend needs both a date and a views column.",
                top: "4) Top videos",
                no_title: "No video title column found. Check the CSV export options.",
                tips: "5) Suggestions",
                notes: "Notes",
                api_placeholder: "API mode is not implemented yet. Start with CSV mode; analytics API support is planned for a later update.",
            },
            Locale::Ko => Labels {
                title: "채널 분석 리포트",
                skipped: "건너뛴 파일",
                cards: "1) 핵심 KPI 요약",
                total_views: "총 조회수",
                total_watch_time: "총 시청시간(시간)",
                average_ctr: "평균 CTR(%)",
                net_subscribers: "구독자 증감",
                comparison: "2) 롱폼 vs 숏츠 비교",
                daily: "3) 일자별 조회수 추이 (타입별)",
                daily_unavailable: "일자별 추이를 그리려면 날짜와 조회수 컬럼이 필요합니다.",
                top: "4) 상위 영상 분석",
                no_title: "영상 제목 컬럼을 찾지 못했습니다. CSV 내보내기 옵션을 확인해 주세요.",
                tips: "5) 간단 인사이트 제안",
                notes: "참고",
                api_placeholder: "API 모드는 준비 중입니다. CSV 모드로 먼저 시작해 보세요.",
            },
        }
    }
}

fn card_value(value: Option<f64>, decimals: usize, truncate: bool) -> String {
    match value {
        Some(v) if truncate => format_grouped(v.trunc(), decimals),
        Some(v) => format_grouped(v, decimals),
        None => PLACEHOLDER.to_string(),
    }
}

fn metric_headers(first: &str, metrics: &[Metric]) -> Vec<String> {
    std::iter::once(first.to_string())
        .chain(metrics.iter().map(|m| m.to_string()))
        .collect()
}

/// Plain-text rendering of the whole report.
pub fn render_text(report: &Report, locale: Locale) -> String {
    let labels = Labels::for_locale(locale);
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({} row(s) from {} file(s))",
        labels.title,
        report.rows,
        report.files.len()
    );

    if !report.skipped_files.is_empty() {
        let _ = writeln!(out, "\n{}", labels.skipped);
        for failure in &report.skipped_files {
            let _ = writeln!(out, "  ! {}: {}", failure.file, failure.cause);
        }
    }

    let summary = &report.summary;
    let cards = vec![
        vec![labels.total_views.to_string(), card_value(summary.total_views(), 0, true)],
        vec![
            labels.total_watch_time.to_string(),
            card_value(summary.total_watch_time(), 1, false),
        ],
        vec![labels.average_ctr.to_string(), card_value(summary.average_ctr(), 2, false)],
        vec![
            labels.net_subscribers.to_string(),
            card_value(summary.net_subscribers(), 0, true),
        ],
    ];
    out.push('\n');
    out.push_str(&table::render_section(
        labels.cards,
        &["metric".to_string(), "value".to_string()],
        &cards,
    ));

    let categories = &report.categories;
    let rows = categories
        .rows
        .iter()
        .map(|row| {
            std::iter::once(row.key.clone())
                .chain(row.values.iter().map(|v| format_optional(*v)))
                .collect()
        })
        .collect::<Vec<Vec<String>>>();
    out.push('\n');
    out.push_str(&table::render_section(
        labels.comparison,
        &metric_headers(TYPE_COLUMN, &categories.metrics),
        &rows,
    ));

    out.push('\n');
    match &report.daily {
        Some(series) => {
            let headers = std::iter::once("date".to_string())
                .chain(series.categories.iter().cloned())
                .collect::<Vec<_>>();
            let rows = series
                .pivot()
                .into_iter()
                .map(|(date, values)| {
                    std::iter::once(date.format("%Y-%m-%d").to_string())
                        .chain(values.into_iter().map(format_optional))
                        .collect()
                })
                .collect::<Vec<Vec<String>>>();
            out.push_str(&table::render_section(labels.daily, &headers, &rows));
        }
        None => {
            let _ = writeln!(out, "{}\n{}", labels.daily, labels.daily_unavailable);
        }
    }

    out.push('\n');
    match &report.top {
        Some(top) => {
            let mut headers = metric_headers(TITLE_COLUMN, &top.table.metrics);
            headers.push(TYPE_COLUMN.to_string());
            let rows = top
                .table
                .rows
                .iter()
                .map(|row| {
                    std::iter::once(row.key.clone())
                        .chain(row.values.iter().map(|v| format_optional(*v)))
                        .chain(std::iter::once(row.category.clone().unwrap_or_default()))
                        .collect()
                })
                .collect::<Vec<Vec<String>>>();
            let heading = match top.sort_key {
                Some(key) => format!("{} (by {key}, top {})", labels.top, top.limit),
                None => format!("{} (top {})", labels.top, top.limit),
            };
            out.push_str(&table::render_section(&heading, &headers, &rows));
        }
        None => {
            let _ = writeln!(out, "{}\n{}", labels.top, labels.no_title);
        }
    }

    let _ = writeln!(out, "\n{}", labels.tips);
    for tip in &report.insights {
        let _ = writeln!(out, "  • {}", tip.message);
    }

    if !report.warnings.is_empty() {
        let _ = writeln!(out, "\n{}", labels.notes);
        for warning in &report.warnings {
            let _ = writeln!(out, "  - {warning}");
        }
    }
    out
}

mod common;

use chrono::NaiveDate;
use proptest::prelude::*;

use common::{ingest_texts, working_from};
use yt_mini_analytics::{
    aggregate::{self, DatasetSummary},
    config::AliasConfig,
    roles::Metric,
    working::WorkingTable,
};

const HEADER: &str = "Video title,Views,Watch time (hours)\n";

fn export(rows: &[(String, u32, u32)]) -> String {
    let mut text = HEADER.to_string();
    for (title, views, hours) in rows {
        text.push_str(&format!("{title},{views},{hours}\n"));
    }
    text
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

#[test]
fn dataset_summary_sums_volumes_and_averages_rates() {
    let table = working_from(
        "Video title,Views,CTR,Subscribers\nA,100,4.0,3\nB,1,2.0,-1\nC,n/a,6.0,\n",
    );
    let summary = DatasetSummary::compute(&table);
    assert_eq!(summary.rows, 3);
    assert_eq!(summary.total_views(), Some(101.0));
    assert_eq!(summary.average_ctr(), Some(4.0));
    assert_eq!(summary.net_subscribers(), Some(2.0));
    assert_eq!(summary.total_watch_time(), None);
    let watch = summary
        .metrics
        .iter()
        .find(|m| m.metric == Metric::WatchTime)
        .expect("watch time entry");
    assert!(!watch.available);
}

#[test]
fn category_summary_omits_unresolved_metrics() {
    let table = working_from("Video title,Views,CTR\nA #shorts,10,5\nB,20,3\nC #shorts,30,\n");
    let summary = aggregate::summarize_by_category(&table);
    assert_eq!(summary.metrics, vec![Metric::Views, Metric::Ctr]);
    let keys = summary.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["Shorts", "Unknown"]);

    let shorts = &summary.rows[0];
    assert_eq!(shorts.rows, 2);
    assert_eq!(summary.value(shorts, Metric::Views), Some(40.0));
    assert_eq!(summary.value(shorts, Metric::Ctr), Some(5.0));
    assert_eq!(summary.value(shorts, Metric::Subs), None);
}

#[test]
fn top_three_of_ten_keeps_ties_in_upload_order() {
    let views = ["5", "9", "9", "1", "", "7", "9", "3", "2", "8"];
    let mut text = String::from("Video title,Views\n");
    for (idx, v) in views.iter().enumerate() {
        text.push_str(&format!("T{idx},{v}\n"));
    }
    let table = working_from(&text);
    let titles = aggregate::summarize_by_title(&table).expect("title column");

    let top = aggregate::top_titles(titles.clone(), Metric::Views, 3);
    assert_eq!(top.sort_key, Some(Metric::Views));
    let keys = top.table.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["T1", "T2", "T6"]);

    let all = aggregate::top_titles(titles, Metric::Views, 10);
    let keys = all.table.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
    assert_eq!(
        keys,
        vec!["T1", "T2", "T6", "T9", "T5", "T0", "T7", "T8", "T3", "T4"]
    );
}

#[test]
fn per_title_summary_merges_repeated_titles() {
    let table = working_from("Video title,Views,CTR\nA,10,2\nB,5,8\nA,30,4\n,99,1\n");
    let titles = aggregate::summarize_by_title(&table).expect("title column");
    let keys = titles.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["A", "B"]);
    assert_eq!(titles.value(&titles.rows[0], Metric::Views), Some(40.0));
    assert_eq!(titles.value(&titles.rows[0], Metric::Ctr), Some(3.0));
    assert_eq!(titles.rows[0].category.as_deref(), Some("Unknown"));
}

#[test]
fn unavailable_sort_metric_falls_back_to_views() {
    let table = working_from("Video title,Views\nA,1\nB,3\nC,2\n");
    let titles = aggregate::summarize_by_title(&table).expect("title column");
    let top = aggregate::top_titles(titles, Metric::Ctr, 5);
    assert_eq!(top.requested, Metric::Ctr);
    assert_eq!(top.sort_key, Some(Metric::Views));
    let keys = top.table.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["B", "C", "A"]);
}

#[test]
fn without_views_or_requested_metric_order_is_kept() {
    let table = working_from("Video title,CTR\nA,1\nB,3\n");
    let titles = aggregate::summarize_by_title(&table).expect("title column");
    let top = aggregate::top_titles(titles, Metric::Subs, 5);
    assert_eq!(top.sort_key, None);
    let keys = top.table.rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>();
    assert_eq!(keys, vec!["A", "B"]);
}

#[test]
fn no_title_column_means_no_title_summary() {
    let table = working_from("Views\n1\n2\n");
    assert!(aggregate::summarize_by_title(&table).is_none());
}

#[test]
fn daily_views_group_by_date_and_category() {
    let table = working_from(
        "Date,Video title,Views\n\
         2024-01-02,A #shorts,5\n\
         2024-01-01,B,10\n\
         \"Jan 1, 2024\",C #shorts,3\n\
         2024-01-02,B,1\n\
         bad,D,100\n",
    );
    let series = aggregate::daily_views(&table).expect("date and views resolved");
    assert_eq!(series.categories, vec!["Shorts", "Unknown"]);
    assert_eq!(series.points.len(), 4);
    assert_eq!(
        series.pivot(),
        vec![
            (date(2024, 1, 1), vec![Some(3.0), Some(10.0)]),
            (date(2024, 1, 2), vec![Some(5.0), Some(1.0)]),
        ]
    );
}

#[test]
fn daily_views_need_a_date_column() {
    let table = working_from("Video title,Views\nA,1\n");
    assert!(aggregate::daily_views(&table).is_none());
}

proptest! {
    #[test]
    fn sums_survive_splitting_across_uploads(
        rows in prop::collection::vec((any::<bool>(), 0u32..100_000, 0u32..500), 0..40),
        split in 0usize..40,
    ) {
        let rows = rows
            .into_iter()
            .enumerate()
            .map(|(idx, (short, views, hours))| {
                let title = if short { format!("clip {idx} #shorts") } else { format!("video {idx}") };
                (title, views, hours)
            })
            .collect::<Vec<_>>();
        let split = split.min(rows.len());
        let (left, right) = rows.split_at(split);

        let whole = working_from(&export(&rows));
        let (left_text, right_text) = (export(left), export(right));
        let parts = ingest_texts(&[("left.csv", left_text.as_str()), ("right.csv", right_text.as_str())]);
        let joined = WorkingTable::build(&parts.table, None, &AliasConfig::default());

        let whole_summary = DatasetSummary::compute(&whole);
        let joined_summary = DatasetSummary::compute(&joined);
        let left_summary = DatasetSummary::compute(&working_from(&left_text));
        let right_summary = DatasetSummary::compute(&working_from(&right_text));

        prop_assert_eq!(joined.len(), whole.len());
        for metric in [Metric::Views, Metric::WatchTime] {
            let expected = whole_summary.get(metric);
            prop_assert_eq!(joined_summary.get(metric), expected);
            let split_total = left_summary.get(metric).unwrap_or_default()
                + right_summary.get(metric).unwrap_or_default();
            prop_assert_eq!(Some(split_total), expected);
        }
        prop_assert_eq!(
            aggregate::summarize_by_category(&joined),
            aggregate::summarize_by_category(&whole)
        );
    }
}

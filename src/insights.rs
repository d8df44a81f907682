use clap::ValueEnum;
use serde::Serialize;

use crate::{aggregate::SummaryTable, roles::Metric};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Locale {
    #[default]
    En,
    Ko,
}

/// Canned suggestions, in the order they are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
    TopCtrPatterns,
    OpeningPacing,
    ThumbnailAbTest,
    KeywordsByType,
    EnrichExport,
}

impl Insight {
    pub fn message(&self, locale: Locale) -> &'static str {
        match (self, locale) {
            (Insight::TopCtrPatterns, Locale::En) => {
                "Benchmark the thumbnail/title pattern of the top-3 CTR videos in your next uploads."
            }
            (Insight::TopCtrPatterns, Locale::Ko) => {
                "CTR 상위 영상의 제목/썸네일 공통 패턴을 다음 업로드에 반영해 보세요."
            }
            (Insight::OpeningPacing, Locale::En) => {
                "Benchmark the opening pacing and length of videos with high average view duration."
            }
            (Insight::OpeningPacing, Locale::Ko) => {
                "평균 시청시간이 높은 영상의 오프닝 길이와 전환 타이밍을 벤치마킹하세요."
            }
            (Insight::ThumbnailAbTest, Locale::En) => {
                "Videos with high impressions but low CTR are candidates for thumbnail/title A/B testing."
            }
            (Insight::ThumbnailAbTest, Locale::Ko) => {
                "노출수는 높지만 CTR이 낮은 영상은 썸네일/제목 A/B 테스트 대상입니다."
            }
            (Insight::KeywordsByType, Locale::En) => {
                "Compare the common keywords of the top-5 Shorts and top-5 Longform videos."
            }
            (Insight::KeywordsByType, Locale::Ko) => {
                "Shorts와 Longform 각각 TOP5의 공통 키워드를 비교해 보세요."
            }
            (Insight::EnrichExport, Locale::En) => {
                "Upload a CSV export with more metric columns to unlock more insights."
            }
            (Insight::EnrichExport, Locale::Ko) => {
                "데이터 열 이름을 더 풍부하게 포함한 CSV를 업로드하면 인사이트가 늘어납니다."
            }
        }
    }
}

/// Picks suggestions from the columns present in the ranked per-title table.
///
/// No thresholds are computed; presence alone triggers a tip. Without a
/// per-title table only the fallback is returned.
pub fn advise(titles: Option<&SummaryTable>) -> Vec<Insight> {
    let mut tips = Vec::new();
    if let Some(table) = titles {
        if table.has_values(Metric::Ctr) {
            tips.push(Insight::TopCtrPatterns);
        }
        if table.has_metric(Metric::AvgViewDuration) {
            tips.push(Insight::OpeningPacing);
        }
        if table.has_metric(Metric::Impressions) && table.has_metric(Metric::Ctr) {
            tips.push(Insight::ThumbnailAbTest);
        }
        // Per-title rows always carry their category.
        tips.push(Insight::KeywordsByType);
    }
    if tips.is_empty() {
        tips.push(Insight::EnrichExport);
    }
    tips
}

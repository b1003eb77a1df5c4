use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

use crate::analyzer::records::records_from_dataframe;
use crate::analyzer::statistics::{
    DistributionSummary, HistogramBin, LinearFit, describe, histogram, iqr_upper_bound,
    linear_fit, pearson,
};
use crate::config::AnalysisSection;
use crate::models::{CleanedRecord, columns};
use crate::processor::frame_access::text_column;

/// Label given to videos whose tags mention none of the brand keywords
pub const OTHER_BRAND: &str = "others";

const VALUE: &str = "value";
const BRAND: &str = "brand";
const VIDEOS: &str = "videos";
const TOTAL_VIEWS: &str = "total_views";
const MEDIAN_VIEWS: &str = "median_views";

#[derive(Debug, Clone, PartialEq)]
pub struct RankedEntry {
    pub label: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub labels: Vec<String>,
    /// Row-major; `None` where the coefficient is undefined
    pub values: Vec<Vec<Option<f64>>>,
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        self.values[i][j]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryViews {
    pub category: String,
    pub views: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrandStats {
    pub brand: String,
    pub videos: usize,
    pub total_views: f64,
    pub median_views: Option<f64>,
}

/// Everything the reporter prints and the chart renderer draws
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    /// `None` when the cleaned table has no rows
    pub view_summary: Option<DistributionSummary>,
    pub view_histogram: Vec<HistogramBin>,
    pub likes_fit: Option<LinearFit>,
    pub correlation: CorrelationMatrix,
    pub category_views: Vec<CategoryViews>,
    pub outlier_threshold: Option<f64>,
    pub outlier_count: usize,
    pub top_categories_by_total: Vec<RankedEntry>,
    pub top_categories_by_median: Vec<RankedEntry>,
    pub top_upload_hours: Vec<RankedEntry>,
    pub top_channels: Vec<RankedEntry>,
    pub focus_category: String,
    pub top_focus_channels: Vec<RankedEntry>,
    pub brand_comparison: Vec<BrandStats>,
}

/// Read-only queries answering the fixed questions about the cleaned table
pub struct TrendingAnalyzer {
    settings: AnalysisSection,
}

impl TrendingAnalyzer {
    pub fn new(settings: AnalysisSection) -> Self {
        Self { settings }
    }

    pub fn analyze(&self, cleaned: &DataFrame) -> Result<AnalysisReport> {
        let records = records_from_dataframe(cleaned)?;
        info!("Analysing {} cleaned records", records.len());

        let views = view_counts(&records);
        let view_summary = match describe(&views) {
            Ok(summary) => Some(summary),
            Err(e) => {
                warn!("⚠️ View count summary unavailable: {}", e);
                None
            }
        };
        let outlier_threshold = iqr_upper_bound(&views, self.settings.outlier_iqr_multiplier);
        let outlier_count = outlier_threshold
            .map(|bound| views.iter().filter(|&&v| v > bound).count())
            .unwrap_or(0);

        let (like_views, likes): (Vec<f64>, Vec<f64>) = records
            .iter()
            .filter_map(|r| r.likes.map(|l| (r.view_count as f64, l as f64)))
            .unzip();

        Ok(AnalysisReport {
            view_histogram: histogram(&views, self.settings.histogram_bins),
            view_summary,
            likes_fit: linear_fit(&like_views, &likes),
            correlation: self.engagement_correlation(&records),
            category_views: self.category_views(&records),
            outlier_threshold,
            outlier_count,
            top_categories_by_total: self.top_categories_by_total(cleaned)?,
            top_categories_by_median: self.top_categories_by_median(cleaned)?,
            top_upload_hours: self.top_upload_hours(cleaned)?,
            top_channels: self.top_channels(cleaned, None)?,
            focus_category: self.settings.focus_category.clone(),
            top_focus_channels: self
                .top_channels(cleaned, Some(self.settings.focus_category.as_str()))?,
            brand_comparison: self.brand_comparison(cleaned)?,
        })
    }

    /// Pearson coefficients among likes, comments and views, each pair over
    /// the rows where both values are present.
    pub fn engagement_correlation(&self, records: &[CleanedRecord]) -> CorrelationMatrix {
        let fields: [(&str, fn(&CleanedRecord) -> Option<f64>); 3] = [
            ("likes", |r| r.likes.map(|v| v as f64)),
            ("comment_count", |r| r.comment_count.map(|v| v as f64)),
            ("view_count", |r| Some(r.view_count as f64)),
        ];

        let values = fields
            .iter()
            .map(|(_, fx)| {
                fields
                    .iter()
                    .map(|(_, fy)| {
                        let (xs, ys): (Vec<f64>, Vec<f64>) = records
                            .iter()
                            .filter_map(|r| Some((fx(r)?, fy(r)?)))
                            .unzip();
                        pearson(&xs, &ys)
                    })
                    .collect()
            })
            .collect();

        CorrelationMatrix {
            labels: fields.iter().map(|(name, _)| name.to_string()).collect(),
            values,
        }
    }

    /// Every view count grouped by category, categories in name order
    pub fn category_views(&self, records: &[CleanedRecord]) -> Vec<CategoryViews> {
        let mut grouped: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
        for record in records {
            grouped
                .entry(record.category_name.as_str())
                .or_default()
                .push(record.view_count as f64);
        }

        grouped
            .into_iter()
            .map(|(category, views)| CategoryViews {
                category: category.to_string(),
                views,
            })
            .collect()
    }

    pub fn top_categories_by_total(&self, cleaned: &DataFrame) -> Result<Vec<RankedEntry>> {
        ranked(
            cleaned.clone().lazy(),
            columns::CATEGORY_NAME,
            views().sum(),
            self.settings.top_categories,
        )
    }

    pub fn top_categories_by_median(&self, cleaned: &DataFrame) -> Result<Vec<RankedEntry>> {
        ranked(
            cleaned.clone().lazy(),
            columns::CATEGORY_NAME,
            views().median(),
            self.settings.top_categories,
        )
    }

    /// Video count per publish hour; the missing-hour marker counts as its
    /// own group.
    pub fn top_upload_hours(&self, cleaned: &DataFrame) -> Result<Vec<RankedEntry>> {
        ranked(
            cleaned.clone().lazy(),
            columns::HOUR,
            len(),
            self.settings.top_hours,
        )
    }

    /// Total views per channel, optionally restricted to one category.
    /// Rows without a channel title are not grouped.
    pub fn top_channels(&self, cleaned: &DataFrame, category: Option<&str>) -> Result<Vec<RankedEntry>> {
        let mut frame = cleaned
            .clone()
            .lazy()
            .filter(col(columns::CHANNEL_TITLE).is_not_null());
        if let Some(category) = category {
            frame = frame.filter(col(columns::CATEGORY_NAME).eq(lit(category)));
        }
        ranked(frame, columns::CHANNEL_TITLE, views().sum(), self.settings.top_channels)
    }

    pub fn classify_brand<'a>(&'a self, tags: Option<&str>) -> &'a str {
        classify_brand(tags, &self.settings.brand_keywords)
    }

    /// Video count, total and median views per configured brand, in keyword
    /// order. Videos tagged as neither brand are left out.
    pub fn brand_comparison(&self, cleaned: &DataFrame) -> Result<Vec<BrandStats>> {
        let brands: Vec<&str> = text_column(cleaned, columns::TAGS)?
            .iter()
            .map(|tags| self.classify_brand(tags.as_deref()))
            .collect();

        let mut tagged = cleaned.select([columns::VIEW_COUNT])?;
        tagged.with_column(Series::new(BRAND.into(), brands))?;

        let grouped = tagged
            .lazy()
            .filter(col(BRAND).neq(lit(OTHER_BRAND)))
            .group_by([col(BRAND)])
            .agg([
                len().cast(DataType::UInt64).alias(VIDEOS),
                views().sum().alias(TOTAL_VIEWS),
                views().median().alias(MEDIAN_VIEWS),
            ])
            .collect()
            .context("Failed to aggregate views per brand")?;

        let names = text_column(&grouped, BRAND)?;
        let videos = grouped.column(VIDEOS)?.u64()?;
        let totals = grouped.column(TOTAL_VIEWS)?.f64()?;
        let medians = grouped.column(MEDIAN_VIEWS)?.f64()?;

        let mut stats: HashMap<String, BrandStats> = names
            .into_iter()
            .zip(videos.into_iter().zip(totals.into_iter().zip(medians.into_iter())))
            .filter_map(|(brand, (videos, (total, median)))| {
                let brand = brand?;
                Some((
                    brand.clone(),
                    BrandStats {
                        brand,
                        videos: videos.unwrap_or(0) as usize,
                        total_views: total.unwrap_or(0.0),
                        median_views: median,
                    },
                ))
            })
            .collect();

        Ok(self
            .settings
            .brand_keywords
            .iter()
            .map(|brand| {
                stats.remove(brand).unwrap_or_else(|| BrandStats {
                    brand: brand.clone(),
                    videos: 0,
                    total_views: 0.0,
                    median_views: None,
                })
            })
            .collect())
    }
}

/// First keyword occurring in `tags` (case-sensitive), else [`OTHER_BRAND`]
pub fn classify_brand<'a>(tags: Option<&str>, keywords: &'a [String]) -> &'a str {
    tags.and_then(|tags| keywords.iter().find(|k| tags.contains(k.as_str())))
        .map(String::as_str)
        .unwrap_or(OTHER_BRAND)
}

fn views() -> Expr {
    col(columns::VIEW_COUNT).cast(DataType::Float64)
}

fn view_counts(records: &[CleanedRecord]) -> Vec<f64> {
    records.iter().map(|r| r.view_count as f64).collect()
}

/// Aggregate `value` per `label` group and keep the `limit` largest groups.
/// Ties are ordered by label so output is stable.
fn ranked(frame: LazyFrame, label: &str, value: Expr, limit: usize) -> Result<Vec<RankedEntry>> {
    let ranking = frame
        .group_by([col(label)])
        .agg([value.cast(DataType::Float64).alias(VALUE)])
        .sort_by_exprs(
            [col(VALUE), col(label)],
            SortMultipleOptions::default().with_order_descending_multi([true, false]),
        )
        .limit(limit as IdxSize)
        .collect()
        .with_context(|| format!("Failed to rank {}", label))?;

    let labels = text_column(&ranking, label)?;
    let values = ranking.column(VALUE)?.f64()?;

    Ok(labels
        .into_iter()
        .zip(values.into_iter())
        .filter_map(|(label, value)| {
            Some(RankedEntry {
                label: label?,
                value: value?,
            })
        })
        .collect())
}

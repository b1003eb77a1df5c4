use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use polars::prelude::*;
use tracing::{debug, info};

use crate::models::{PublishHour, columns};
use crate::processor::frame_access::{count_column, source_rows, text_column};

const TIMESTAMP_FALLBACKS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];

/// Columns the cleaner reads from the joined frame
const REQUIRED: [&str; 10] = [
    columns::VIDEO_ID,
    columns::PUBLISHED_AT,
    columns::CHANNEL_TITLE,
    columns::TITLE,
    columns::CATEGORY_NAME,
    columns::TAGS,
    columns::VIEW_COUNT,
    columns::LIKES,
    columns::DISLIKES,
    columns::COMMENT_COUNT,
];

/// Dataset columns kept as text in the cleaned table
const TEXT: [&str; 6] = [
    columns::VIDEO_ID,
    columns::PUBLISHED_AT,
    columns::CHANNEL_TITLE,
    columns::TITLE,
    columns::CATEGORY_NAME,
    columns::TAGS,
];

pub struct RecordCleaner;

impl RecordCleaner {
    pub fn new() -> Self {
        RecordCleaner
    }

    /// Turn the joined frame into the cleaned table: projection, count
    /// coercion, per-video dedup, date/hour derivation and hour imputation.
    /// `video_id` and `publishedat` do not survive.
    pub fn clean_dataframe(&self, df: &DataFrame) -> Result<DataFrame> {
        for name in REQUIRED {
            if df.column(name).is_err() {
                return Err(anyhow!("Missing required column: {}", name));
            }
        }

        let rows: Vec<u64> = source_rows(df)?.into_iter().map(|r| r as u64).collect();
        let mut typed = df.select(REQUIRED)?;
        for name in columns::COUNTS {
            typed.with_column(Series::new(name.into(), count_column(df, name)?))?;
        }
        typed.with_column(Series::new(columns::SOURCE_ROW.into(), rows))?;

        let text: Vec<Expr> = TEXT.iter().map(|&name| col(name).cast(DataType::String)).collect();
        let mut kept = typed
            .lazy()
            .with_columns(text)
            .filter(earliest_snapshot())
            .collect()
            .context("Failed to deduplicate trending snapshots")?;

        info!(
            "Deduplicated snapshots: kept {} of {} rows",
            kept.height(),
            df.height()
        );

        let published = text_column(&kept, columns::PUBLISHED_AT)?;
        let kept_rows = source_rows(&kept)?;
        let mut dates = Vec::with_capacity(kept.height());
        let mut hours = Vec::with_capacity(kept.height());
        for (raw, row) in published.iter().zip(kept_rows) {
            let (date, hour) = match raw.as_deref().map(str::trim) {
                None | Some("") => (None, PublishHour::NoInformation),
                Some(raw) => {
                    let ts = parse_timestamp(raw).map_err(|e| {
                        anyhow!("Column {} data row {}: {}", columns::PUBLISHED_AT, row, e)
                    })?;
                    (
                        Some(ts.format("%Y-%m-%d").to_string()),
                        PublishHour::Hour(ts.hour()),
                    )
                }
            };
            dates.push(date);
            hours.push(hour.to_string());
        }

        let missing_hours = hours
            .iter()
            .filter(|h| h.as_str() == crate::models::MISSING_HOUR)
            .count();
        if missing_hours > 0 {
            debug!("Filled {} missing publish hours", missing_hours);
        }

        kept.with_column(Series::new(columns::DATE.into(), dates))?;
        kept.with_column(Series::new(columns::HOUR.into(), hours))?;

        kept.select(columns::CLEANED)
            .map_err(|e| anyhow!("Failed to create cleaned DataFrame: {}", e))
    }
}

/// Row filter keeping, for every video, the rows whose view count equals the
/// smallest non-zero view count seen for that video. Rows without a video id
/// or with zero/missing views never pass.
pub fn earliest_snapshot() -> Expr {
    let views = col(columns::VIEW_COUNT);
    let min_non_zero = views
        .clone()
        .filter(views.clone().neq(lit(0i64)))
        .min()
        .over([col(columns::VIDEO_ID)]);

    col(columns::VIDEO_ID)
        .is_not_null()
        .and(views.clone().neq(lit(0i64)))
        .and(views.eq(min_non_zero))
}

impl Default for RecordCleaner {
    fn default() -> Self {
        Self::new()
    }
}

pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    for format in TIMESTAMP_FALLBACKS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }

    Err(anyhow!("cannot parse {:?} as a publish timestamp", raw))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MISSING_HOUR;

    fn joined_frame(
        ids: Vec<&str>,
        published: Vec<Option<&str>>,
        views: Vec<Option<&str>>,
        tags: Vec<Option<&str>>,
    ) -> DataFrame {
        let n = ids.len();
        DataFrame::new(vec![
            Series::new("video_id".into(), ids).into(),
            Series::new("publishedat".into(), published).into(),
            Series::new("channeltitle".into(), vec!["Channel"; n]).into(),
            Series::new("title".into(), vec!["Title"; n]).into(),
            Series::new("categoryid".into(), vec!["10"; n]).into(),
            Series::new("category_name".into(), vec!["Music"; n]).into(),
            Series::new("tags".into(), tags).into(),
            Series::new("view_count".into(), views).into(),
            Series::new("likes".into(), vec![Some("5"); n]).into(),
            Series::new("dislikes".into(), vec![None::<&str>; n]).into(),
            Series::new("comment_count".into(), vec![Some("1"); n]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_zero_view_snapshot_is_not_the_minimum() {
        let df = joined_frame(
            vec!["A", "A"],
            vec![Some("2020-08-11T19:20:14Z"), Some("2020-08-11T19:20:14Z")],
            vec![Some("0"), Some("500")],
            vec![None, None],
        );

        let cleaned = RecordCleaner::new().clean_dataframe(&df).unwrap();

        assert_eq!(cleaned.height(), 1);
        assert_eq!(count_column(&cleaned, "view_count").unwrap(), vec![Some(500)]);
    }

    #[test]
    fn test_keeps_minimum_and_drops_zero_only_videos() {
        let df = joined_frame(
            vec!["A", "A", "A", "B", "C", "C"],
            vec![Some("2020-08-11T19:20:14Z"); 6],
            vec![Some("900"), Some("300"), Some("300"), Some("0"), Some("70"), Some("")],
            vec![None; 6],
        );

        let cleaned = RecordCleaner::new().clean_dataframe(&df).unwrap();

        // Both A rows at the minimum survive; B had only a zero-view snapshot.
        assert_eq!(
            count_column(&cleaned, "view_count").unwrap(),
            vec![Some(300), Some(300), Some(70)]
        );
    }

    #[test]
    fn test_filter_ignores_rows_without_video_id() {
        let df = DataFrame::new(vec![
            Series::new("video_id".into(), vec![None, Some("A"), Some("A"), Some("B")]).into(),
            Series::new("view_count".into(), vec![Some(10i64), Some(20), Some(30), None]).into(),
        ])
        .unwrap();

        let kept = df.lazy().filter(earliest_snapshot()).collect().unwrap();

        assert_eq!(count_column(&kept, "view_count").unwrap(), vec![Some(20)]);
    }

    #[test]
    fn test_error_rows_point_into_the_input_file() {
        let mut bad_views = joined_frame(
            vec!["A", "B"],
            vec![Some("2020-08-11T19:20:14Z"); 2],
            vec![Some("5"), Some("many")],
            vec![None, None],
        );
        bad_views
            .with_column(Series::new(columns::SOURCE_ROW.into(), vec![4u32, 11]))
            .unwrap();
        let err = RecordCleaner::new().clean_dataframe(&bad_views).unwrap_err();
        assert!(err.to_string().contains("data row 11"), "{}", err);

        let mut bad_time = joined_frame(
            vec!["A", "B"],
            vec![Some("2020-08-11T19:20:14Z"), Some("soon")],
            vec![Some("5"), Some("6")],
            vec![None, None],
        );
        bad_time
            .with_column(Series::new(columns::SOURCE_ROW.into(), vec![2u32, 7]))
            .unwrap();
        let err = RecordCleaner::new().clean_dataframe(&bad_time).unwrap_err();
        assert!(err.to_string().contains("data row 7"), "{}", err);
    }

    #[test]
    fn test_date_and_hour_derivation() {
        let df = joined_frame(
            vec!["A", "B", "C"],
            vec![
                Some("2020-08-11T19:20:14Z"),
                None,
                Some("2021-01-02 03:04:05"),
            ],
            vec![Some("10"), Some("20"), Some("30")],
            vec![Some("x"), None, Some("y")],
        );

        let cleaned = RecordCleaner::new().clean_dataframe(&df).unwrap();

        let names: Vec<String> = cleaned.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, columns::CLEANED.to_vec());

        assert_eq!(
            text_column(&cleaned, "date").unwrap(),
            vec![Some("2020-08-11".to_string()), None, Some("2021-01-02".to_string())]
        );
        assert_eq!(
            text_column(&cleaned, "hour").unwrap(),
            vec![
                Some("19".to_string()),
                Some(MISSING_HOUR.to_string()),
                Some("3".to_string())
            ]
        );
        // Only the hour is imputed; tags stay missing.
        assert_eq!(text_column(&cleaned, "tags").unwrap()[1], None);
        assert_eq!(count_column(&cleaned, "dislikes").unwrap(), vec![None, None, None]);
    }

    #[test]
    fn test_every_hour_is_populated() {
        let df = joined_frame(
            vec!["A", "B", "C", "D"],
            vec![Some("2020-08-11T00:00:00Z"), Some(""), None, Some("2020-08-11T23:59:59+00:00")],
            vec![Some("1"), Some("2"), Some("3"), Some("4")],
            vec![None; 4],
        );

        let cleaned = RecordCleaner::new().clean_dataframe(&df).unwrap();

        for hour in text_column(&cleaned, "hour").unwrap() {
            let hour = hour.expect("hour must never be missing");
            assert!(hour.parse::<PublishHour>().is_ok(), "unexpected hour {:?}", hour);
        }
    }

    #[test]
    fn test_timestamp_offsets_are_converted_to_utc() {
        let ts = parse_timestamp("2020-08-11T23:30:00-02:00").unwrap();
        assert_eq!(ts.hour(), 1);
        assert_eq!(ts.format("%Y-%m-%d").to_string(), "2020-08-12");
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_malformed_input_is_fatal() {
        let bad_views = joined_frame(
            vec!["A"],
            vec![Some("2020-08-11T19:20:14Z")],
            vec![Some("many")],
            vec![None],
        );
        assert!(RecordCleaner::new().clean_dataframe(&bad_views).is_err());

        let bad_time = joined_frame(vec!["A"], vec![Some("soon")], vec![Some("5")], vec![None]);
        assert!(RecordCleaner::new().clean_dataframe(&bad_time).is_err());

        let missing = df_without_tags();
        assert!(RecordCleaner::new().clean_dataframe(&missing).is_err());
    }

    fn df_without_tags() -> DataFrame {
        let df = joined_frame(vec!["A"], vec![None], vec![Some("5")], vec![None]);
        df.drop("tags").unwrap()
    }
}

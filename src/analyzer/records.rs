use anyhow::{Result, anyhow};
use polars::prelude::*;

use crate::models::{CleanedRecord, PublishHour, columns};
use crate::processor::frame_access::{count_column, text_column};

/// Materialise the cleaned table (in memory or read back from disk) as typed
/// rows for the analyzer.
pub fn records_from_dataframe(df: &DataFrame) -> Result<Vec<CleanedRecord>> {
    let channels = text_column(df, columns::CHANNEL_TITLE)?;
    let titles = text_column(df, columns::TITLE)?;
    let categories = text_column(df, columns::CATEGORY_NAME)?;
    let tags = text_column(df, columns::TAGS)?;
    let views = count_column(df, columns::VIEW_COUNT)?;
    let likes = count_column(df, columns::LIKES)?;
    let dislikes = count_column(df, columns::DISLIKES)?;
    let comments = count_column(df, columns::COMMENT_COUNT)?;
    let dates = text_column(df, columns::DATE)?;
    let hours = text_column(df, columns::HOUR)?;

    let mut records = Vec::with_capacity(df.height());
    for row in 0..df.height() {
        let category_name = categories[row]
            .clone()
            .ok_or_else(|| anyhow!("Row {}: missing {}", row, columns::CATEGORY_NAME))?;
        let view_count =
            views[row].ok_or_else(|| anyhow!("Row {}: missing {}", row, columns::VIEW_COUNT))?;
        let hour: PublishHour = hours[row]
            .as_deref()
            .ok_or_else(|| anyhow!("Row {}: missing {}", row, columns::HOUR))?
            .parse()
            .map_err(|e| anyhow!("Row {}: {}", row, e))?;

        records.push(CleanedRecord {
            channel_title: channels[row].clone(),
            title: titles[row].clone(),
            category_name,
            tags: tags[row].clone(),
            view_count,
            likes: likes[row],
            dislikes: dislikes[row],
            comment_count: comments[row],
            date: dates[row].clone(),
            hour,
        });
    }

    Ok(records)
}

/// Cleaned-table frame holding `records`, for tests that start from typed rows
#[cfg(test)]
pub(crate) fn cleaned_frame(records: &[CleanedRecord]) -> DataFrame {
    let text = |field: fn(&CleanedRecord) -> Option<String>| -> Vec<Option<String>> {
        records.iter().map(field).collect()
    };
    let count = |field: fn(&CleanedRecord) -> Option<i64>| -> Vec<Option<i64>> {
        records.iter().map(field).collect()
    };

    DataFrame::new(vec![
        Series::new(columns::CHANNEL_TITLE.into(), text(|r| r.channel_title.clone())).into(),
        Series::new(columns::TITLE.into(), text(|r| r.title.clone())).into(),
        Series::new(columns::CATEGORY_NAME.into(), text(|r| Some(r.category_name.clone()))).into(),
        Series::new(columns::TAGS.into(), text(|r| r.tags.clone())).into(),
        Series::new(columns::VIEW_COUNT.into(), count(|r| Some(r.view_count))).into(),
        Series::new(columns::LIKES.into(), count(|r| r.likes)).into(),
        Series::new(columns::DISLIKES.into(), count(|r| r.dislikes)).into(),
        Series::new(columns::COMMENT_COUNT.into(), count(|r| r.comment_count)).into(),
        Series::new(columns::DATE.into(), text(|r| r.date.clone())).into(),
        Series::new(columns::HOUR.into(), text(|r| Some(r.hour.to_string()))).into(),
    ])
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_typed_rows_from_text_frame() {
        let df = DataFrame::new(vec![
            Series::new("channeltitle".into(), vec![Some("Chan"), None]).into(),
            Series::new("title".into(), vec!["One", "Two"]).into(),
            Series::new("category_name".into(), vec!["Music", "Gaming"]).into(),
            Series::new("tags".into(), vec![Some("samsung"), None]).into(),
            Series::new("view_count".into(), vec!["500", "20"]).into(),
            Series::new("likes".into(), vec![Some("5"), None]).into(),
            Series::new("dislikes".into(), vec![Some("1"), Some("0")]).into(),
            Series::new("comment_count".into(), vec![Some("2"), None]).into(),
            Series::new("date".into(), vec![Some("2020-08-11"), None]).into(),
            Series::new("hour".into(), vec!["19", "No information"]).into(),
        ])
        .unwrap();

        let records = records_from_dataframe(&df).unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].view_count, 500);
        assert_eq!(records[0].hour, PublishHour::Hour(19));
        assert_eq!(records[1].channel_title, None);
        assert_eq!(records[1].likes, None);
        assert_eq!(records[1].hour, PublishHour::NoInformation);
    }

    #[test]
    fn test_missing_views_rejected() {
        let df = DataFrame::new(vec![
            Series::new("channeltitle".into(), vec!["Chan"]).into(),
            Series::new("title".into(), vec!["One"]).into(),
            Series::new("category_name".into(), vec!["Music"]).into(),
            Series::new("tags".into(), vec![None::<&str>]).into(),
            Series::new("view_count".into(), vec![None::<&str>]).into(),
            Series::new("likes".into(), vec!["1"]).into(),
            Series::new("dislikes".into(), vec!["1"]).into(),
            Series::new("comment_count".into(), vec!["1"]).into(),
            Series::new("date".into(), vec!["2020-08-11"]).into(),
            Series::new("hour".into(), vec!["3"]).into(),
        ])
        .unwrap();

        assert!(records_from_dataframe(&df).is_err());
    }

    #[test]
    fn test_cleaned_frame_reads_back() {
        let record = CleanedRecord {
            channel_title: None,
            title: Some("One".to_string()),
            category_name: "Music".to_string(),
            tags: None,
            view_count: 42,
            likes: Some(3),
            dislikes: None,
            comment_count: None,
            date: None,
            hour: PublishHour::NoInformation,
        };

        let df = cleaned_frame(std::slice::from_ref(&record));

        assert_eq!(records_from_dataframe(&df).unwrap(), vec![record]);
    }
}

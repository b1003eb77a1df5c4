use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Column names of the trending dataset after lowercase normalization
pub mod columns {
    pub const VIDEO_ID: &str = "video_id";
    pub const PUBLISHED_AT: &str = "publishedat";
    pub const CHANNEL_TITLE: &str = "channeltitle";
    pub const TITLE: &str = "title";
    pub const CATEGORY_ID: &str = "categoryid";
    pub const CATEGORY_NAME: &str = "category_name";
    pub const TAGS: &str = "tags";
    pub const VIEW_COUNT: &str = "view_count";
    pub const LIKES: &str = "likes";
    pub const DISLIKES: &str = "dislikes";
    pub const COMMENT_COUNT: &str = "comment_count";
    pub const DATE: &str = "date";
    pub const HOUR: &str = "hour";
    /// 1-based data row of the trending file, carried through the join
    pub const SOURCE_ROW: &str = "source_row";

    /// Columns of the cleaned output file, in write order
    pub const CLEANED: [&str; 10] = [
        CHANNEL_TITLE,
        TITLE,
        CATEGORY_NAME,
        TAGS,
        VIEW_COUNT,
        LIKES,
        DISLIKES,
        COMMENT_COUNT,
        DATE,
        HOUR,
    ];

    pub const COUNTS: [&str; 4] = [VIEW_COUNT, LIKES, DISLIKES, COMMENT_COUNT];
}

/// Literal written in place of a publish hour that could not be derived
pub const MISSING_HOUR: &str = "No information";

/// Category lookup document as published by the platform
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryDocument {
    pub kind: Option<String>,
    pub etag: Option<String>,
    pub items: Vec<CategoryItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategoryItem {
    pub kind: Option<String>,
    pub etag: Option<String>,
    /// Usually a string, occasionally a bare number
    pub id: Option<Value>,
    pub snippet: Option<CategorySnippet>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CategorySnippet {
    #[serde(rename = "channelId")]
    pub channel_id: Option<String>,
    pub title: Option<String>,
    pub assignable: Option<bool>,
}

/// Hour of day a video was published, or the explicit missing marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PublishHour {
    Hour(u32),
    NoInformation,
}

impl fmt::Display for PublishHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PublishHour::Hour(h) => write!(f, "{}", h),
            PublishHour::NoInformation => f.write_str(MISSING_HOUR),
        }
    }
}

impl FromStr for PublishHour {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed == MISSING_HOUR {
            return Ok(PublishHour::NoInformation);
        }

        let hour: u32 = trimmed
            .parse()
            .map_err(|_| anyhow::anyhow!("Invalid publish hour: {:?}", s))?;
        if hour > 23 {
            return Err(anyhow::anyhow!("Publish hour out of range: {}", hour));
        }
        Ok(PublishHour::Hour(hour))
    }
}

/// One row of the cleaned table, as consumed by the analyzer
#[derive(Debug, Clone, PartialEq)]
pub struct CleanedRecord {
    pub channel_title: Option<String>,
    pub title: Option<String>,
    pub category_name: String,
    pub tags: Option<String>,
    pub view_count: i64,
    pub likes: Option<i64>,
    pub dislikes: Option<i64>,
    pub comment_count: Option<i64>,
    pub date: Option<String>,
    pub hour: PublishHour,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_publish_hour_text_form() {
        assert_eq!(PublishHour::Hour(7).to_string(), "7");
        assert_eq!(PublishHour::NoInformation.to_string(), "No information");
        assert_eq!("19".parse::<PublishHour>().unwrap(), PublishHour::Hour(19));
        assert_eq!(
            "No information".parse::<PublishHour>().unwrap(),
            PublishHour::NoInformation
        );
        assert!("24".parse::<PublishHour>().is_err());
        assert!("noon".parse::<PublishHour>().is_err());
    }

    #[test]
    fn test_category_document_accepts_numeric_and_text_ids() {
        let doc: CategoryDocument = serde_json::from_value(json!({
            "kind": "youtube#videoCategoryListResponse",
            "items": [
                {"id": "1", "snippet": {"title": "Film & Animation", "assignable": true}},
                {"id": 10, "snippet": {"title": "Music"}}
            ]
        }))
        .unwrap();

        assert_eq!(doc.items.len(), 2);
        assert_eq!(doc.items[1].id, Some(json!(10)));
        assert_eq!(
            doc.items[0].snippet.as_ref().unwrap().title.as_deref(),
            Some("Film & Animation")
        );
    }
}

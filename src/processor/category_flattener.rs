use anyhow::{Result, anyhow};
use polars::prelude::*;
use serde_json::Value;
use std::collections::HashSet;
use tracing::{info, warn};

use crate::models::{CategoryDocument, CategoryItem};
use crate::processor::frame_access::whole_number;

pub const LOOKUP_ID: &str = "id";
pub const LOOKUP_NAME: &str = "category_name";

/// Render a category identifier as join-key text.
///
/// Whole numbers written as decimals collapse to their integer form so that
/// `"10"`, `10` and `"10.0"` all address the same category.
pub fn category_key(raw: &str) -> String {
    let trimmed = raw.trim();
    if !trimmed.contains('.') {
        return trimmed.to_string();
    }
    match trimmed.parse::<f64>().ok().and_then(whole_number) {
        Some(n) => n.to_string(),
        None => trimmed.to_string(),
    }
}

pub struct CategoryFlattener;

impl CategoryFlattener {
    pub fn new() -> Self {
        CategoryFlattener
    }

    /// Flatten the nested lookup document into `(id, category_name)` rows
    pub fn flatten_to_dataframe(&self, document: &CategoryDocument) -> Result<DataFrame> {
        let mut ids = Vec::with_capacity(document.items.len());
        let mut names = Vec::with_capacity(document.items.len());
        let mut seen = HashSet::new();

        for (index, item) in document.items.iter().enumerate() {
            let (id, name) = self
                .extract_pair(item)
                .map_err(|e| anyhow!("Invalid category item at index {}: {}", index, e))?;

            if !seen.insert(id.clone()) {
                warn!(
                    "Duplicate category id {} at index {} ignored (keeping first entry)",
                    id, index
                );
                continue;
            }

            ids.push(id);
            names.push(name);
        }

        info!("Flattened category lookup into {} entries", ids.len());

        DataFrame::new(vec![
            Series::new(LOOKUP_ID.into(), ids).into(),
            Series::new(LOOKUP_NAME.into(), names).into(),
        ])
        .map_err(|e| anyhow!("Failed to create category DataFrame: {}", e))
    }

    pub fn extract_pair(&self, item: &CategoryItem) -> Result<(String, String)> {
        let id = match item.id.as_ref() {
            Some(Value::String(s)) if !s.trim().is_empty() => category_key(s),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => i.to_string(),
                None => category_key(&n.to_string()),
            },
            Some(other) => return Err(anyhow!("unsupported id value {}", other)),
            None => return Err(anyhow!("missing id")),
        };

        let name = item
            .snippet
            .as_ref()
            .and_then(|snippet| snippet.title.as_deref())
            .ok_or_else(|| anyhow!("missing snippet.title for id {}", id))?;

        Ok((id, name.to_string()))
    }
}

impl Default for CategoryFlattener {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: Value) -> CategoryDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_category_key_normalization() {
        assert_eq!(category_key("10"), "10");
        assert_eq!(category_key(" 24 "), "24");
        assert_eq!(category_key("10.0"), "10");
        assert_eq!(category_key("10.5"), "10.5");
        assert_eq!(category_key("music"), "music");
        // Too large for an integer key: kept as written
        assert_eq!(category_key("100000000000000000000.0"), "100000000000000000000.0");
    }

    #[test]
    fn test_flatten_youtube_category_document() {
        let doc = document(json!({
            "kind": "youtube#videoCategoryListResponse",
            "items": [
                {
                    "kind": "youtube#videoCategory",
                    "id": "1",
                    "snippet": {"channelId": "UCBR8-60-B28hp2BmDPdntcQ", "title": "Film & Animation", "assignable": true}
                },
                {"id": 10, "snippet": {"title": "Music"}},
                {"id": "24", "snippet": {"title": "Entertainment"}}
            ]
        }));

        let df = CategoryFlattener::new().flatten_to_dataframe(&doc).unwrap();

        assert_eq!(df.height(), 3);
        let ids: Vec<&str> = df.column(LOOKUP_ID).unwrap().str().unwrap().into_no_null_iter().collect();
        let names: Vec<&str> = df.column(LOOKUP_NAME).unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(ids, vec!["1", "10", "24"]);
        assert_eq!(names, vec!["Film & Animation", "Music", "Entertainment"]);
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let doc = document(json!({
            "items": [
                {"id": "10", "snippet": {"title": "Music"}},
                {"id": 10, "snippet": {"title": "Music (again)"}}
            ]
        }));

        let df = CategoryFlattener::new().flatten_to_dataframe(&doc).unwrap();
        assert_eq!(df.height(), 1);
        let names: Vec<&str> = df.column(LOOKUP_NAME).unwrap().str().unwrap().into_no_null_iter().collect();
        assert_eq!(names, vec!["Music"]);
    }

    #[test]
    fn test_incomplete_items_are_rejected() {
        let flattener = CategoryFlattener::new();

        let missing_title = document(json!({"items": [{"id": "1", "snippet": {}}]}));
        assert!(flattener.flatten_to_dataframe(&missing_title).is_err());

        let missing_id = document(json!({"items": [{"snippet": {"title": "Music"}}]}));
        assert!(flattener.flatten_to_dataframe(&missing_id).is_err());

        let nested_id = document(json!({"items": [{"id": {"x": 1}, "snippet": {"title": "Music"}}]}));
        assert!(flattener.flatten_to_dataframe(&nested_id).is_err());
    }
}

use anyhow::{Result, anyhow};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::debug;

/// Lowercases dataset headers so downstream stages can address columns by a
/// single spelling (`categoryId` becomes `categoryid`, `channelTitle` becomes
/// `channeltitle`).
pub struct ColumnNormalizer;

impl ColumnNormalizer {
    pub fn new() -> Self {
        ColumnNormalizer
    }

    pub fn normalize_column_name(&self, name: &str) -> String {
        name.trim().to_lowercase()
    }

    pub fn normalize_dataframe(&self, df: &mut DataFrame) -> Result<()> {
        let column_names: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut targets = HashSet::new();
        for col_name in &column_names {
            let normalized = self.normalize_column_name(col_name);
            if !targets.insert(normalized.clone()) {
                return Err(anyhow!(
                    "Columns collide after lowercasing: {:?} maps to existing {:?}",
                    col_name,
                    normalized
                ));
            }
        }

        for col_name in column_names {
            let normalized = self.normalize_column_name(&col_name);
            if normalized != col_name {
                debug!("Renaming column {:?} -> {:?}", col_name, normalized);
                df.rename(&col_name, normalized.into())?;
            }
        }

        Ok(())
    }
}

impl Default for ColumnNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let normalizer = ColumnNormalizer::new();

        assert_eq!(normalizer.normalize_column_name("categoryId"), "categoryid");
        assert_eq!(normalizer.normalize_column_name("publishedAt"), "publishedat");
        assert_eq!(normalizer.normalize_column_name(" view_count "), "view_count");
    }

    #[test]
    fn test_dataframe_headers_lowercased() {
        let mut df = DataFrame::new(vec![
            Series::new("video_id".into(), vec!["a"]).into(),
            Series::new("channelTitle".into(), vec!["Chan"]).into(),
            Series::new("categoryId".into(), vec!["10"]).into(),
        ])
        .unwrap();

        ColumnNormalizer::new().normalize_dataframe(&mut df).unwrap();

        let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["video_id", "channeltitle", "categoryid"]);
    }

    #[test]
    fn test_colliding_headers_rejected() {
        let mut df = DataFrame::new(vec![
            Series::new("Title".into(), vec!["a"]).into(),
            Series::new("title".into(), vec!["b"]).into(),
        ])
        .unwrap();

        assert!(ColumnNormalizer::new().normalize_dataframe(&mut df).is_err());
    }
}

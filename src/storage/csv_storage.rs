use anyhow::{Context, Result, anyhow};
use polars::prelude::*;
use std::fs::{self, File};
use std::path::Path;
use tracing::info;

/// Flat-file storage for the cleaned table
pub struct CsvStorage;

impl CsvStorage {
    pub fn new() -> Self {
        CsvStorage
    }

    /// Write the cleaned table with a header row and no index column.
    /// Missing values become empty cells.
    pub fn write_cleaned(&self, df: &mut DataFrame, path: &Path) -> Result<()> {
        ensure_parent_dir(path)?;

        let mut file = File::create(path)
            .with_context(|| format!("Failed to create cleaned output: {}", path.display()))?;

        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(df)
            .with_context(|| format!("Failed to write cleaned output: {}", path.display()))?;

        info!("Stored cleaned table ({} rows) at: {}", df.height(), path.display());
        Ok(())
    }

    pub fn read_cleaned(&self, path: &Path) -> Result<DataFrame> {
        CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to open cleaned output: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to parse cleaned output: {}", path.display()))
    }

    /// Re-read the written file and check it carries the same columns and
    /// row count as the in-memory table.
    pub fn verify_round_trip(&self, df: &DataFrame, path: &Path) -> Result<()> {
        let stored = self.read_cleaned(path)?;

        let expected: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
        let actual: Vec<String> = stored.get_column_names().iter().map(|s| s.to_string()).collect();

        if expected != actual {
            return Err(anyhow!(
                "Round-trip column mismatch for {}: wrote {:?}, read {:?}",
                path.display(),
                expected,
                actual
            ));
        }

        if df.height() != stored.height() {
            return Err(anyhow!(
                "Round-trip row count mismatch for {}: wrote {}, read {}",
                path.display(),
                df.height(),
                stored.height()
            ));
        }

        info!("Verified cleaned output round-trip: {}", path.display());
        Ok(())
    }
}

impl Default for CsvStorage {
    fn default() -> Self {
        Self::new()
    }
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::frame_access::{count_column, text_column};
    use std::path::PathBuf;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("trending_storage_{}", std::process::id()))
            .join(name)
    }

    fn cleaned_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("channeltitle".into(), vec!["Chan, Inc.", "Other"]).into(),
            Series::new("title".into(), vec!["Say \"hi\"", "Plain"]).into(),
            Series::new("category_name".into(), vec!["Music", "Gaming"]).into(),
            Series::new("tags".into(), vec![Some("a|b"), None]).into(),
            Series::new("view_count".into(), vec![500i64, 20]).into(),
            Series::new("likes".into(), vec![Some(5i64), None]).into(),
            Series::new("dislikes".into(), vec![Some(1i64), Some(0)]).into(),
            Series::new("comment_count".into(), vec![Some(2i64), Some(3)]).into(),
            Series::new("date".into(), vec![Some("2020-08-11"), None]).into(),
            Series::new("hour".into(), vec!["19", "No information"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_round_trip_preserves_columns_and_rows() {
        let path = scratch_path("round_trip/cleaned.csv");
        let storage = CsvStorage::new();
        let mut df = cleaned_frame();

        storage.write_cleaned(&mut df, &path).unwrap();
        storage.verify_round_trip(&df, &path).unwrap();

        let stored = storage.read_cleaned(&path).unwrap();
        assert_eq!(stored.height(), 2);
        assert_eq!(
            text_column(&stored, "channeltitle").unwrap()[0].as_deref(),
            Some("Chan, Inc.")
        );
        assert_eq!(count_column(&stored, "likes").unwrap(), vec![Some(5), None]);
        assert_eq!(
            text_column(&stored, "hour").unwrap()[1].as_deref(),
            Some("No information")
        );

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_header_has_no_index_column() {
        let path = scratch_path("header/cleaned.csv");
        let mut df = cleaned_frame();

        CsvStorage::new().write_cleaned(&mut df, &path).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let header = content.lines().next().unwrap();
        assert_eq!(
            header,
            "channeltitle,title,category_name,tags,view_count,likes,dislikes,comment_count,date,hour"
        );

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[test]
    fn test_round_trip_detects_mismatch() {
        let path = scratch_path("mismatch/cleaned.csv");
        let storage = CsvStorage::new();
        let mut df = cleaned_frame();
        storage.write_cleaned(&mut df, &path).unwrap();

        let shorter = df.head(Some(1));
        assert!(storage.verify_round_trip(&shorter, &path).is_err());

        fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}

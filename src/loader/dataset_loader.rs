use anyhow::{Context, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::info;

use crate::models::CategoryDocument;

pub struct DatasetLoader {
    delimiter: u8,
}

impl DatasetLoader {
    pub fn new(delimiter: u8) -> Self {
        DatasetLoader { delimiter }
    }

    /// Read the trending export with every column kept as text.
    /// Numeric coercion happens later, column by column, in the cleaner.
    pub fn load_trending_dataset(&self, path: &Path) -> Result<DataFrame> {
        let delimiter = self.delimiter;
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .map_parse_options(|opts| opts.with_separator(delimiter))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))
            .with_context(|| format!("Failed to open trending dataset: {}", path.display()))?
            .finish()
            .with_context(|| format!("Failed to parse trending dataset: {}", path.display()))?;

        info!(
            "Loaded trending dataset {} with {} rows and {} columns",
            path.display(),
            df.height(),
            df.width()
        );

        Ok(df)
    }

    pub fn load_category_document(&self, path: &Path) -> Result<CategoryDocument> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read category lookup: {}", path.display()))?;

        let document: CategoryDocument = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse category lookup: {}", path.display()))?;

        info!(
            "Loaded category lookup {} with {} items",
            path.display(),
            document.items.len()
        );

        Ok(document)
    }
}

impl Default for DatasetLoader {
    fn default() -> Self {
        Self::new(b',')
    }
}

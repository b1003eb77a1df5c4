use anyhow::{Context, Result};
use polars::prelude::*;
use tracing::info;

use crate::models::columns;
use crate::processor::category_flattener::{LOOKUP_ID, LOOKUP_NAME, category_key};
use crate::processor::frame_access::text_column;

const JOIN_KEY: &str = "category_key";

pub struct CategoryJoiner;

impl CategoryJoiner {
    pub fn new() -> Self {
        CategoryJoiner
    }

    /// Inner join of the dataset's `categoryid` with the flattened lookup.
    ///
    /// Both keys are compared as normalized text (see [`category_key`]).
    /// Rows whose category has no lookup entry are dropped; surviving rows
    /// keep their original order, gain a `category_name` column and a
    /// `source_row` column holding their 1-based data row in the input.
    /// Lookup ids are expected to be unique, as the flattener leaves them.
    pub fn join(&self, df: &DataFrame, lookup: &DataFrame) -> Result<DataFrame> {
        let trending = with_join_key(df, columns::CATEGORY_ID)?;
        let lookup = with_join_key(lookup, LOOKUP_ID)?
            .lazy()
            .select([col(JOIN_KEY), col(LOOKUP_NAME).alias(columns::CATEGORY_NAME)]);

        let joined = trending
            .lazy()
            .with_row_index(columns::SOURCE_ROW, Some(1))
            .join(
                lookup,
                [col(JOIN_KEY)],
                [col(JOIN_KEY)],
                JoinArgs::new(JoinType::Inner),
            )
            .sort_by_exprs([col(columns::SOURCE_ROW)], SortMultipleOptions::default())
            .collect()
            .context("Failed to join trending rows with the category lookup")?
            .drop(JOIN_KEY)?;

        info!(
            "Joined categories: {} of {} rows matched, {} dropped",
            joined.height(),
            df.height(),
            df.height() - joined.height()
        );

        Ok(joined)
    }
}

impl Default for CategoryJoiner {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of `df` with the normalized text form of `key` added as the join key
fn with_join_key(df: &DataFrame, key: &str) -> Result<DataFrame> {
    let keys: Vec<Option<String>> = text_column(df, key)?
        .into_iter()
        .map(|k| k.as_deref().map(category_key))
        .collect();

    let mut keyed = df.clone();
    keyed.with_column(Series::new(JOIN_KEY.into(), keys))?;
    Ok(keyed)
}

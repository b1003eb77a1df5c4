use anyhow::{Result, anyhow};
use polars::prelude::*;

use crate::models::columns;

/// Materialise a column as optional text, casting non-text columns first
pub fn text_column(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df
        .column(name)
        .map_err(|_| anyhow!("Missing required column: {}", name))?;

    let column = if column.dtype() == &DataType::String {
        column.clone()
    } else {
        column.cast(&DataType::String)?
    };

    Ok(column
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect())
}

/// Data row numbers (1-based, header excluded) of the input file for each
/// row of `df`. Frames that never went through the join are numbered by
/// position.
pub fn source_rows(df: &DataFrame) -> Result<Vec<usize>> {
    match df.column(columns::SOURCE_ROW) {
        Ok(column) => {
            let column = column.cast(&DataType::UInt64)?;
            Ok(column
                .u64()?
                .into_iter()
                .enumerate()
                .map(|(pos, row)| row.map(|r| r as usize).unwrap_or(pos + 1))
                .collect())
        }
        Err(_) => Ok((1..=df.height()).collect()),
    }
}

/// Materialise a count column as optional integers.
///
/// Text cells go through [`parse_count`], so an unparseable cell aborts with
/// the column name and the input data row; integer columns are read as they are.
pub fn count_column(df: &DataFrame, name: &str) -> Result<Vec<Option<i64>>> {
    let column = df
        .column(name)
        .map_err(|_| anyhow!("Missing required column: {}", name))?;

    match column.dtype() {
        DataType::String => {
            let rows = source_rows(df)?;
            column
                .str()?
                .into_iter()
                .zip(rows)
                .map(|(raw, row)| parse_count(raw, name, row))
                .collect()
        }
        DataType::Int64 => Ok(column.i64()?.into_iter().collect()),
        _ => {
            let cast = column.cast(&DataType::Int64)?;
            Ok(cast.i64()?.into_iter().collect())
        }
    }
}

/// Parse one count cell. Empty cells are missing; whole-number decimals such
/// as `"12.0"` are accepted.
pub fn parse_count(raw: Option<&str>, column: &str, row: usize) -> Result<Option<i64>> {
    let trimmed = match raw.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(s) => s,
    };

    if let Ok(n) = trimmed.parse::<i64>() {
        return Ok(Some(n));
    }

    match trimmed.parse::<f64>().ok().and_then(whole_number) {
        Some(n) => Ok(Some(n)),
        None => Err(anyhow!(
            "Column {} data row {}: cannot parse {:?} as a count",
            column,
            row,
            trimmed
        )),
    }
}

/// `f` as an integer when it is finite, has no fractional part and fits i64
pub fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

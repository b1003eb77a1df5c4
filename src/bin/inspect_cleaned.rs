use anyhow::{Context, Result};
use polars::prelude::*;
use std::env;
use std::path::PathBuf;

const DEFAULT_CLEANED: &str = "output/youtube_trending_clean.csv";
const EXPECTED_COLUMNS: [&str; 10] = [
    "channeltitle",
    "title",
    "category_name",
    "tags",
    "view_count",
    "likes",
    "dislikes",
    "comment_count",
    "date",
    "hour",
];

fn main() -> Result<()> {
    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CLEANED));

    println!("=== INSPECTING CLEANED OUTPUT: {} ===\n", path.display());

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.clone()))
        .with_context(|| format!("Failed to open {}", path.display()))?
        .finish()
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    println!("Rows: {}", df.height());
    println!("Columns: {:?}", df.get_column_names());

    let names: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    if names == EXPECTED_COLUMNS {
        println!("✅ Column layout matches the cleaned schema");
    } else {
        println!("❌ Unexpected column layout, expected {:?}", EXPECTED_COLUMNS);
    }

    println!("\nMissing values per column:");
    for column in df.get_columns() {
        println!("   {}: {}", column.name(), column.null_count());
    }

    if let Ok(hours) = df.column("hour") {
        let hours = hours.str()?;
        let invalid = hours
            .into_iter()
            .filter(|h| match h {
                Some("No information") => false,
                Some(h) => h.parse::<u32>().map(|v| v > 23).unwrap_or(true),
                None => true,
            })
            .count();
        if invalid == 0 {
            println!("\n✅ Every row has a valid hour");
        } else {
            println!("\n❌ {} rows carry an invalid or missing hour", invalid);
        }
    }

    println!("\nFirst rows:");
    println!("{}", df.head(Some(5)));

    Ok(())
}

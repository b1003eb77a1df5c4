use comfy_table::Table;
use tracing::info;

use crate::analyzer::trending_analysis::{AnalysisReport, RankedEntry};

pub struct Reporter;

impl Reporter {
    pub fn new() -> Self {
        Reporter
    }

    pub fn print_report(&self, report: &AnalysisReport) {
        if let Some(summary) = &report.view_summary {
            info!(
                "View count: median {:.0}, mean {:.0}, max {:.0}",
                summary.median, summary.mean, summary.max
            );
        }
        if let Some(bound) = report.outlier_threshold {
            info!(
                "Upper outlier threshold (IQR): {:.1} ({} videos above)",
                bound, report.outlier_count
            );
        }
        if let Some(fit) = report.likes_fit {
            info!("Likes ≈ {:.4} × views + {:.1}", fit.slope, fit.intercept);
        }
        if let Some(best) = report.top_upload_hours.first() {
            info!("Best upload hour: {} ({:.0} videos)", best.label, best.value);
        }

        for (title, table) in self.sections(report) {
            println!("\n=== {} ===", title);
            println!("{table}");
        }
    }

    pub fn sections(&self, report: &AnalysisReport) -> Vec<(String, Table)> {
        vec![
            ("View count summary".to_string(), self.summary_table(report)),
            ("Engagement correlation (Pearson)".to_string(), self.correlation_table(report)),
            ("Outlier threshold".to_string(), self.outlier_table(report)),
            (
                "Top categories by total views".to_string(),
                ranking_table("Category", "Total views", &report.top_categories_by_total),
            ),
            (
                "Top categories by median views".to_string(),
                ranking_table("Category", "Median views", &report.top_categories_by_median),
            ),
            (
                "Top upload hours".to_string(),
                ranking_table("Hour", "Videos", &report.top_upload_hours),
            ),
            (
                "Top channels by total views".to_string(),
                ranking_table("Channel", "Total views", &report.top_channels),
            ),
            (
                format!("Top {} channels by total views", report.focus_category),
                ranking_table("Channel", "Total views", &report.top_focus_channels),
            ),
            ("Phone brand mentions".to_string(), self.brand_table(report)),
        ]
    }

    fn summary_table(&self, report: &AnalysisReport) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["count", "mean", "std", "min", "25%", "50%", "75%", "max"]);
        let Some(s) = &report.view_summary else {
            table.add_row(vec!["0", "NaN", "NaN", "NaN", "NaN", "NaN", "NaN", "NaN"]);
            return table;
        };
        table.add_row(vec![
            s.count.to_string(),
            format!("{:.1}", s.mean),
            s.std_dev.map(|v| format!("{:.1}", v)).unwrap_or_else(|| "NaN".to_string()),
            format!("{:.0}", s.min),
            format!("{:.1}", s.q1),
            format!("{:.1}", s.median),
            format!("{:.1}", s.q3),
            format!("{:.0}", s.max),
        ]);
        table
    }

    fn correlation_table(&self, report: &AnalysisReport) -> Table {
        let matrix = &report.correlation;
        let mut table = Table::new();

        let mut header = vec![String::new()];
        header.extend(matrix.labels.iter().cloned());
        table.set_header(header);

        for (label, row) in matrix.labels.iter().zip(&matrix.values) {
            let mut cells = vec![label.clone()];
            cells.extend(row.iter().map(|v| match v {
                Some(r) => format!("{:.3}", r),
                None => "NaN".to_string(),
            }));
            table.add_row(cells);
        }
        table
    }

    fn outlier_table(&self, report: &AnalysisReport) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Q1", "Q3", "IQR", "upper bound", "videos above"]);
        match (&report.view_summary, report.outlier_threshold) {
            (Some(s), Some(bound)) => table.add_row(vec![
                format!("{:.1}", s.q1),
                format!("{:.1}", s.q3),
                format!("{:.1}", s.q3 - s.q1),
                format!("{:.1}", bound),
                report.outlier_count.to_string(),
            ]),
            _ => table.add_row(vec!["NaN", "NaN", "NaN", "NaN", "0"]),
        };
        table
    }

    fn brand_table(&self, report: &AnalysisReport) -> Table {
        let mut table = Table::new();
        table.set_header(vec!["Brand", "Videos", "Total views", "Median views"]);
        for brand in &report.brand_comparison {
            table.add_row(vec![
                brand.brand.clone(),
                brand.videos.to_string(),
                format!("{:.0}", brand.total_views),
                brand
                    .median_views
                    .map(|m| format!("{:.1}", m))
                    .unwrap_or_else(|| "NaN".to_string()),
            ]);
        }
        table
    }
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new()
    }
}

fn ranking_table(label_header: &str, value_header: &str, entries: &[RankedEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["#", label_header, value_header]);
    for (rank, entry) in entries.iter().enumerate() {
        table.add_row(vec![
            (rank + 1).to_string(),
            entry.label.clone(),
            format!("{:.0}", entry.value),
        ]);
    }
    table
}

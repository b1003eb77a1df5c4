// Analyzer module: read-only queries, charts and printed report over the cleaned table.

pub mod charts;
pub mod records;
pub mod report;
pub mod statistics;
pub mod trending_analysis;

pub use charts::ChartRenderer;
pub use report::Reporter;
pub use trending_analysis::TrendingAnalyzer;

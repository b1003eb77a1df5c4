use anyhow::{Context, Result};
use plotters::coord::Shift;
use plotters::prelude::*;
use polars::prelude::{DataFrame, DataType, IntoLazy, col};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::analyzer::trending_analysis::{AnalysisReport, BrandStats, RankedEntry};
use crate::models::columns;
use crate::processor::frame_access::text_column;
use crate::storage::{StorageManager, ensure_parent_dir};

const CHART_SIZE: (u32, u32) = (1280, 720);
const CAPTION_FONT: (&str, u32) = ("sans-serif", 28);

type Canvas<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Renders the analysis charts as SVG files under one directory
pub struct ChartRenderer {
    chart_dir: PathBuf,
}

impl ChartRenderer {
    pub fn new(chart_dir: &Path) -> Self {
        Self {
            chart_dir: chart_dir.to_path_buf(),
        }
    }

    pub fn render_all(&self, report: &AnalysisReport, cleaned: &DataFrame) -> Result<Vec<PathBuf>> {
        info!("📈 Rendering charts into {}", self.chart_dir.display());

        let mut written = vec![
            self.view_histogram(report)?,
            self.views_vs_likes(report, cleaned)?,
            self.category_strip(report)?,
        ];

        written.push(self.ranked_bars(
            "top_categories_median_views",
            "Top categories by median views",
            "Median views",
            &report.top_categories_by_median,
        )?);
        written.push(self.ranked_bars(
            "top_upload_hours",
            "Best upload hours (video count)",
            "Videos",
            &report.top_upload_hours,
        )?);
        written.push(self.ranked_bars(
            "top_channels",
            "Top channels by total views",
            "Total views",
            &report.top_channels,
        )?);
        written.push(self.ranked_bars(
            &format!("top_channels_{}", report.focus_category),
            &format!("Top {} channels by total views", report.focus_category),
            "Total views",
            &report.top_focus_channels,
        )?);
        written.push(self.brand_views(report)?);

        info!("📊 Rendered {} charts", written.len());
        Ok(written)
    }

    /// Create `<chart_dir>/<name>.svg`, let `draw` paint it and flush it to disk
    fn render<F>(&self, name: &str, draw: F) -> Result<PathBuf>
    where
        F: FnOnce(&Canvas<'_>) -> Result<()>,
    {
        let path = StorageManager::chart_path(&self.chart_dir, name);
        ensure_parent_dir(&path)?;

        {
            let root = SVGBackend::new(&path, CHART_SIZE).into_drawing_area();
            root.fill(&WHITE)?;
            draw(&root)?;
            root.present()
                .with_context(|| format!("Failed to write chart {}", path.display()))?;
        }

        Ok(path)
    }

    pub fn view_histogram(&self, report: &AnalysisReport) -> Result<PathBuf> {
        let bins = &report.view_histogram;
        let x_min = bins.first().map(|b| b.lower).unwrap_or(0.0);
        let x_max = bins.last().map(|b| b.upper).unwrap_or(1.0);
        let y_max = bins.iter().map(|b| b.count).max().unwrap_or(0).max(1) as f64 * 1.05;

        self.render("view_count_histogram", |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Distribution of view counts", CAPTION_FONT)
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(x_min..x_max, 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_desc("Views")
                .y_desc("Videos")
                .x_label_formatter(&|v| compact(*v))
                .draw()?;

            chart.draw_series(bins.iter().map(|bin| {
                Rectangle::new(
                    [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                    BLUE.mix(0.6).filled(),
                )
            }))?;
            Ok(())
        })
    }

    /// Scatter of views against likes, one color per category, with the
    /// least-squares line on top. Rows missing likes are not drawn.
    pub fn views_vs_likes(&self, report: &AnalysisReport, cleaned: &DataFrame) -> Result<PathBuf> {
        let by_category = engagement_points(cleaned)?;

        let points = by_category.values().flatten();
        let x_max = points.clone().map(|p| p.0).fold(1.0, f64::max) * 1.05;
        let y_max = points.map(|p| p.1).fold(1.0, f64::max) * 1.05;

        self.render("views_vs_likes", |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Views vs likes by category", CAPTION_FONT)
                .margin(10)
                .x_label_area_size(50)
                .y_label_area_size(70)
                .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

            chart
                .configure_mesh()
                .x_desc("Views")
                .y_desc("Likes")
                .x_label_formatter(&|v| compact(*v))
                .y_label_formatter(&|v| compact(*v))
                .draw()?;

            for (idx, (category, points)) in by_category.iter().enumerate() {
                let color = Palette99::pick(idx).to_rgba();
                chart
                    .draw_series(
                        points
                            .iter()
                            .map(move |&(x, y)| Circle::new((x, y), 3, color.mix(0.6).filled())),
                    )?
                    .label(category.as_str())
                    .legend(move |(x, y)| Circle::new((x, y), 4, color.filled()));
            }

            if let Some(fit) = report.likes_fit {
                chart
                    .draw_series(LineSeries::new(
                        vec![(0.0, fit.predict(0.0)), (x_max, fit.predict(x_max))],
                        BLACK.stroke_width(2),
                    ))?
                    .label("linear fit")
                    .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLACK));
            }

            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperLeft)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .draw()?;
            Ok(())
        })
    }

    /// Strip chart: every video's views plotted above its category, with the
    /// IQR outlier bound drawn as a red reference line.
    pub fn category_strip(&self, report: &AnalysisReport) -> Result<PathBuf> {
        let groups = &report.category_views;
        let labels: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();

        let y_max = groups
            .iter()
            .flat_map(|g| g.views.iter().copied())
            .fold(report.outlier_threshold.unwrap_or(0.0), f64::max)
            .max(1.0)
            * 1.05;

        self.render("category_views_strip", |root| {
            let mut chart = ChartBuilder::on(root)
                .caption("Views per category", CAPTION_FONT)
                .margin(10)
                .x_label_area_size(60)
                .y_label_area_size(70)
                .build_cartesian_2d((0u32..groups.len().max(1) as u32).into_segmented(), 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(groups.len().max(1))
                .x_label_formatter(&|v| segment_label(v, &labels))
                .x_label_style(("sans-serif", 12))
                .y_desc("Views")
                .y_label_formatter(&|v| compact(*v))
                .draw()?;

            for (idx, group) in groups.iter().enumerate() {
                let color = Palette99::pick(idx).to_rgba();
                chart.draw_series(group.views.iter().map(move |&v| {
                    Circle::new(
                        (SegmentValue::CenterOf(idx as u32), v),
                        2,
                        color.mix(0.5).filled(),
                    )
                }))?;
            }

            if let Some(bound) = report.outlier_threshold.filter(|_| !groups.is_empty()) {
                chart.draw_series(LineSeries::new(
                    vec![
                        (SegmentValue::Exact(0u32), bound),
                        (SegmentValue::Last, bound),
                    ],
                    RED.stroke_width(2),
                ))?;
            }
            Ok(())
        })
    }

    /// Vertical bar chart of a ranking, bars in ranking order
    pub fn ranked_bars(
        &self,
        name: &str,
        caption: &str,
        y_desc: &str,
        entries: &[RankedEntry],
    ) -> Result<PathBuf> {
        self.render(name, |root| draw_ranked(root, caption, y_desc, entries))
    }

    /// Side-by-side bars of total and median views per phone brand
    pub fn brand_views(&self, report: &AnalysisReport) -> Result<PathBuf> {
        let brand_values = |value: fn(&BrandStats) -> f64| {
            report
                .brand_comparison
                .iter()
                .map(|b| RankedEntry {
                    label: b.brand.clone(),
                    value: value(b),
                })
                .collect::<Vec<_>>()
        };
        let totals = brand_values(|b| b.total_views);
        let medians = brand_values(|b| b.median_views.unwrap_or(0.0));

        self.render("phone_brand_views", |root| {
            let panels = root.split_evenly((1, 2));
            draw_ranked(&panels[0], "Total views by phone brand mention", "Total views", &totals)?;
            draw_ranked(&panels[1], "Median views by phone brand mention", "Median views", &medians)?;
            Ok(())
        })
    }
}

fn draw_ranked(root: &Canvas<'_>, caption: &str, y_desc: &str, entries: &[RankedEntry]) -> Result<()> {
    let labels: Vec<&str> = entries.iter().map(|e| e.label.as_str()).collect();
    let y_max = entries.iter().map(|e| e.value).fold(1.0, f64::max) * 1.1;

    let mut chart = ChartBuilder::on(root)
        .caption(caption, CAPTION_FONT)
        .margin(10)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d((0u32..entries.len().max(1) as u32).into_segmented(), 0f64..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(entries.len().max(1))
        .x_label_formatter(&|v| segment_label(v, &labels))
        .y_desc(y_desc)
        .y_label_formatter(&|v| compact(*v))
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BLUE.mix(0.7).filled())
            .margin(12)
            .data(entries.iter().enumerate().map(|(i, e)| (i as u32, e.value))),
    )?;
    Ok(())
}

/// (views, likes) pairs per category, categories in name order
fn engagement_points(cleaned: &DataFrame) -> Result<BTreeMap<String, Vec<(f64, f64)>>> {
    let points = cleaned
        .clone()
        .lazy()
        .select([
            col(columns::CATEGORY_NAME),
            col(columns::VIEW_COUNT).cast(DataType::Float64),
            col(columns::LIKES).cast(DataType::Float64),
        ])
        .drop_nulls(None)
        .collect()
        .context("Failed to select views and likes")?;

    let categories = text_column(&points, columns::CATEGORY_NAME)?;
    let views = points.column(columns::VIEW_COUNT)?.f64()?;
    let likes = points.column(columns::LIKES)?.f64()?;

    let mut grouped: BTreeMap<String, Vec<(f64, f64)>> = BTreeMap::new();
    for ((category, views), likes) in categories.into_iter().zip(views).zip(likes) {
        if let (Some(category), Some(views), Some(likes)) = (category, views, likes) {
            grouped.entry(category).or_default().push((views, likes));
        }
    }
    Ok(grouped)
}

fn segment_label(value: &SegmentValue<u32>, labels: &[&str]) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).map(|s| s.to_string()).unwrap_or_default(),
        _ => String::new(),
    }
}

/// Short axis label for large counts: 1.2K, 3.4M, 5.6B
pub fn compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}

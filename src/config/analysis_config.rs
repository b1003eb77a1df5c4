use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration for a single analysis run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub paths: PathsConfig,
    pub analysis: AnalysisSection,
}

/// Input and output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub dataset: PathBuf,
    pub categories: PathBuf,
    pub cleaned_output: PathBuf,
    pub chart_dir: PathBuf,
    /// Single-byte field separator of the trending dataset
    pub delimiter: char,
}

/// Parameters of the fixed analytical questions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSection {
    pub top_categories: usize,
    pub top_hours: usize,
    pub top_channels: usize,
    pub histogram_bins: usize,
    pub outlier_iqr_multiplier: f64,
    pub focus_category: String,
    /// Checked in order; the first keyword found in a video's tags wins
    pub brand_keywords: Vec<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/US_youtube_trending_data.csv"),
            categories: PathBuf::from("data/US_category_id.json"),
            cleaned_output: PathBuf::from("output/youtube_trending_clean.csv"),
            chart_dir: PathBuf::from("output/charts"),
            delimiter: ',',
        }
    }
}

impl Default for AnalysisSection {
    fn default() -> Self {
        Self {
            top_categories: 10,
            top_hours: 5,
            top_channels: 5,
            histogram_bins: 50,
            outlier_iqr_multiplier: 1.5,
            focus_category: "Music".to_string(),
            brand_keywords: vec!["samsung".to_string(), "iphone".to_string()],
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from an explicit TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read analysis config file: {}", path))?;

        let config: AnalysisConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse analysis config file: {}", path))?;

        config.validate()?;
        Ok(config)
    }

    /// Layered load: built-in defaults, then `trending.toml` if present, then
    /// `TRENDING__SECTION__KEY` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_layered(Self::environment())
    }

    fn environment() -> ::config::Environment {
        ::config::Environment::with_prefix("TRENDING")
            .prefix_separator("__")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("analysis.brand_keywords")
            .try_parsing(true)
    }

    fn load_layered(environment: ::config::Environment) -> Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::with_name("trending").required(false))
            .add_source(environment)
            .build()
            .context("Failed to assemble analysis configuration")?;

        let config: AnalysisConfig = settings
            .try_deserialize()
            .context("Failed to deserialize analysis configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn delimiter_byte(&self) -> Result<u8> {
        let c = self.paths.delimiter;
        if c.is_ascii() {
            Ok(c as u8)
        } else {
            Err(anyhow!("Dataset delimiter must be a single ASCII character, got {:?}", c))
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.paths.dataset.as_os_str().is_empty() {
            return Err(anyhow!("Dataset path cannot be empty"));
        }

        if self.paths.categories.as_os_str().is_empty() {
            return Err(anyhow!("Category lookup path cannot be empty"));
        }

        if self.paths.cleaned_output.as_os_str().is_empty() {
            return Err(anyhow!("Cleaned output path cannot be empty"));
        }

        self.delimiter_byte()?;

        let section = &self.analysis;
        if section.top_categories == 0 || section.top_hours == 0 || section.top_channels == 0 {
            return Err(anyhow!("Top-N limits must be greater than zero"));
        }

        if section.histogram_bins == 0 {
            return Err(anyhow!("Histogram bin count must be greater than zero"));
        }

        if !section.outlier_iqr_multiplier.is_finite() || section.outlier_iqr_multiplier < 0.0 {
            return Err(anyhow!(
                "Outlier IQR multiplier must be a non-negative number, got {}",
                section.outlier_iqr_multiplier
            ));
        }

        if section.brand_keywords.is_empty()
            || section.brand_keywords.iter().any(|k| k.is_empty())
        {
            return Err(anyhow!("Brand keywords must be a non-empty list of non-empty strings"));
        }

        Ok(())
    }
}

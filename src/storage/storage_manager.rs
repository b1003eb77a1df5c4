use std::path::{Path, PathBuf};

pub struct StorageManager;

impl StorageManager {
    /// `<chart_dir>/<name>.svg`, with the name reduced to a filesystem-safe slug
    pub fn chart_path(chart_dir: &Path, name: &str) -> PathBuf {
        let slug: String = name
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        chart_dir.join(format!("{}.svg", slug))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_path_slug() {
        let dir = Path::new("output/charts");
        assert_eq!(
            StorageManager::chart_path(dir, "top_channels"),
            PathBuf::from("output/charts/top_channels.svg")
        );
        assert_eq!(
            StorageManager::chart_path(dir, "top_channels_Music & Dance"),
            PathBuf::from("output/charts/top_channels_music___dance.svg")
        );
    }
}

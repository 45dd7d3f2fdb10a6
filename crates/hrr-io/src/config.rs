//! Settings for one analysis directory.

use std::path::{Path, PathBuf};

use hrr_export::HistogramOptions;
use serde::{Deserialize, Serialize};

/// Where the results table lives, which files count as images, and how
/// histogram figures are laid out.
///
/// Every field has a default, so a partial JSON object such as
/// `{"results_file": "study.csv"}` is a complete configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Results table file name, relative to the analysis directory.
    pub results_file: String,

    /// File extensions (without the dot) picked up by the directory
    /// scan. Matched case-insensitively.
    pub image_extensions: Vec<String>,

    /// Sub-directory receiving `<image file name>_histogram.png`
    /// figures during batch runs.
    pub histogram_dir: String,

    /// Histogram figure layout.
    pub histogram: HistogramOptions,
}

impl AnalysisConfig {
    /// Default results table name.
    pub const DEFAULT_RESULTS_FILE: &'static str = "LRR_results.csv";
    /// Default image extensions.
    pub const DEFAULT_IMAGE_EXTENSIONS: [&'static str; 2] = ["tif", "tiff"];
    /// Default histogram sub-directory.
    pub const DEFAULT_HISTOGRAM_DIR: &'static str = "results";

    /// Path of the results table inside `dir`.
    #[must_use]
    pub fn results_path(&self, dir: &Path) -> PathBuf {
        dir.join(&self.results_file)
    }

    /// Destination of the histogram figure for the image at `file_path`.
    ///
    /// Only the image's file name is used, so records stored with
    /// absolute paths still land inside `dir`.
    #[must_use]
    pub fn histogram_path(&self, dir: &Path, file_path: &str) -> PathBuf {
        let name = Path::new(file_path)
            .file_name()
            .map_or_else(|| file_path.into(), |n| n.to_string_lossy());
        dir.join(&self.histogram_dir)
            .join(format!("{name}_histogram.png"))
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            results_file: Self::DEFAULT_RESULTS_FILE.to_owned(),
            image_extensions: Self::DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|&e| e.to_owned())
                .collect(),
            histogram_dir: Self::DEFAULT_HISTOGRAM_DIR.to_owned(),
            histogram: HistogramOptions::default(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.results_file, "LRR_results.csv");
        assert_eq!(config.image_extensions, vec!["tif", "tiff"]);
        assert_eq!(config.histogram_dir, "results");
        assert_eq!(config.histogram.bins, 30);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"results_file": "study.csv", "histogram": {"bins": 12}}"#)
                .unwrap();
        assert_eq!(config.results_file, "study.csv");
        assert_eq!(config.image_extensions, vec!["tif", "tiff"]);
        assert_eq!(config.histogram.bins, 12);
        assert_eq!(
            config.histogram.panel_width,
            HistogramOptions::DEFAULT_PANEL_WIDTH
        );
    }

    #[test]
    fn results_path_joins_dir() {
        let config = AnalysisConfig::default();
        assert_eq!(
            config.results_path(Path::new("/data/scan")),
            PathBuf::from("/data/scan/LRR_results.csv")
        );
    }

    #[test]
    fn histogram_path_uses_file_name_only() {
        let config = AnalysisConfig::default();
        assert_eq!(
            config.histogram_path(Path::new("/data/scan"), "/data/scan/p01.tif"),
            PathBuf::from("/data/scan/results/p01.tif_histogram.png")
        );
        assert_eq!(
            config.histogram_path(Path::new("out"), "p02.tiff"),
            PathBuf::from("out/results/p02.tiff_histogram.png")
        );
    }
}

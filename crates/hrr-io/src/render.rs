//! Histogram figure output for batch runs.

use std::path::{Path, PathBuf};

use hrr_export::{HistogramError, HistogramOptions, render_comparison_png};
use hrr_pipeline::Samples;

/// Errors that can occur while writing a histogram figure.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The figure could not be drawn or encoded.
    #[error(transparent)]
    Histogram(#[from] HistogramError),

    /// The figure could not be written.
    #[error("failed to write {}: {source}", .path.display())]
    Io {
        /// Destination path.
        path: PathBuf,
        /// Underlying cause.
        #[source]
        source: std::io::Error,
    },
}

/// Draws a record's liver and kidney samples to `destination`.
pub trait HistogramRenderer {
    /// Render the comparison figure for `file_path`.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the figure cannot be produced or
    /// written.
    fn render(
        &self,
        file_path: &str,
        samples: &Samples,
        destination: &Path,
    ) -> Result<(), RenderError>;
}

/// Writes side-by-side histograms as PNG files, creating the destination
/// directory as needed.
#[derive(Debug, Clone, Default)]
pub struct PngHistogramRenderer {
    options: HistogramOptions,
}

impl PngHistogramRenderer {
    /// A renderer using the given figure layout.
    #[must_use]
    pub const fn new(options: HistogramOptions) -> Self {
        Self { options }
    }
}

impl HistogramRenderer for PngHistogramRenderer {
    fn render(
        &self,
        file_path: &str,
        samples: &Samples,
        destination: &Path,
    ) -> Result<(), RenderError> {
        let png = render_comparison_png(&samples.liver, &samples.kidney, &self.options)?;

        let io_err = |source| RenderError::Io {
            path: destination.to_path_buf(),
            source,
        };
        if let Some(parent) = destination.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(destination, png).map_err(io_err)?;
        log::debug!("{file_path}: histogram written to {}", destination.display());
        Ok(())
    }
}

//! Recompute every record of a store in one pass.
//!
//! Per-record problems (an incomplete annotation, an unreadable image, a
//! histogram that could not be written) are logged and counted in the
//! [`BatchSummary`], never raised. Only a failure to save the table
//! aborts the run.

use hrr_pipeline::{RasterSource, RecomputeStatus};
use serde::Serialize;

use crate::render::HistogramRenderer;
use crate::store::{ResultStore, StoreError};

/// Outcome counts of one batch run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Records whose statistics were recomputed.
    pub computed: usize,
    /// Records skipped for lacking liver or kidney ROIs.
    pub incomplete: usize,
    /// Records whose image could not be read.
    pub failed: usize,
    /// Histograms that could not be rendered or written.
    pub render_failures: usize,
}

/// Drives records through recompute, optional histogram output, and a
/// single save.
#[derive(Debug, Clone)]
pub struct BatchProcessor<S, R> {
    source: S,
    renderer: R,
}

impl<S: RasterSource, R: HistogramRenderer> BatchProcessor<S, R> {
    /// A processor reading rasters from `source` and drawing histograms
    /// with `renderer`.
    #[must_use]
    pub const fn new(source: S, renderer: R) -> Self {
        Self { source, renderer }
    }

    /// Recompute every record in `store`, then save them all at once.
    ///
    /// With `render_histograms`, each successfully recomputed record also
    /// gets a figure at [`AnalysisConfig::histogram_path`](crate::AnalysisConfig::histogram_path).
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the table cannot be saved. Nothing
    /// else aborts the run.
    pub fn run_all(
        &self,
        store: &mut ResultStore,
        render_histograms: bool,
    ) -> Result<BatchSummary, StoreError> {
        let mut records = store.records().to_vec();
        let mut summary = BatchSummary::default();

        for record in &mut records {
            match record.recompute(&self.source) {
                Ok(RecomputeStatus::IncompleteAnnotation) => {
                    log::debug!("{}: skipped, annotation incomplete", record.file_path());
                    summary.incomplete += 1;
                }
                Ok(RecomputeStatus::Computed { ratio_defined }) => {
                    summary.computed += 1;
                    if !ratio_defined {
                        log::warn!("{}: ratio undefined", record.file_path());
                    }
                    if !render_histograms {
                        continue;
                    }
                    let Some(samples) = record.samples() else {
                        continue;
                    };
                    let destination = store
                        .config()
                        .histogram_path(store.directory(), record.file_path());
                    if let Err(e) = self
                        .renderer
                        .render(record.file_path(), samples, &destination)
                    {
                        log::warn!("{}: histogram not written: {e}", record.file_path());
                        summary.render_failures += 1;
                    }
                }
                Err(e) => {
                    log::warn!("{e}");
                    summary.failed += 1;
                }
            }
        }

        store.upsert_all(&records)?;
        log::info!(
            "batch: {} computed, {} incomplete, {} failed, {} histogram failures",
            summary.computed,
            summary.incomplete,
            summary.failed,
            summary.render_failures,
        );
        Ok(summary)
    }
}

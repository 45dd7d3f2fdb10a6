//! Filesystem-backed raster loading.
//!
//! Reads the file behind a record's `file_path` and hands the bytes to
//! the pipeline's decoder, which converts to 8-bit grayscale.

use hrr_pipeline::grayscale::decode_and_grayscale;
use hrr_pipeline::{GrayImage, PipelineError, RasterSource};

/// Loads rasters from the local filesystem, resolving `file_path` as
/// given (absolute, or relative to the working directory).
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRasters;

impl RasterSource for FileRasters {
    fn load(&self, path: &str) -> Result<GrayImage, PipelineError> {
        let bytes = std::fs::read(path).map_err(|e| PipelineError::image_read(path, e))?;
        decode_and_grayscale(&bytes).map_err(|e| PipelineError::image_read(path, e))
    }
}

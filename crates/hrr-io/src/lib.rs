//! hrr-io: Filesystem side of the hepatic-renal ratio workflow.
//!
//! Scans an analysis directory for images, keeps the per-directory
//! results table in step with the in-memory records, loads rasters from
//! disk, and runs batch recomputes with optional histogram figures.

pub mod batch;
pub mod config;
pub mod raster;
pub mod render;
pub mod scan;
pub mod store;
pub mod table;

pub use batch::{BatchProcessor, BatchSummary};
pub use config::AnalysisConfig;
pub use raster::FileRasters;
pub use render::{HistogramRenderer, PngHistogramRenderer, RenderError};
pub use scan::scan_images;
pub use store::{COLUMNS, KEY_COLUMN, ResultStore, StoreError};
pub use table::Table;

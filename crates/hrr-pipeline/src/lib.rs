//! hrr-pipeline: Pure ROI sampling and hepatic-renal ratio statistics (sans-IO).
//!
//! Turns elliptical regions of interest drawn over a grayscale
//! ultrasound image into per-structure brightness statistics:
//! ROIs -> pixel samples (union per structure) -> mean / population
//! standard deviation -> liver/kidney ratio with propagated uncertainty.
//!
//! This crate has **no filesystem dependencies**: rasters come in through
//! the [`RasterSource`] trait or as in-memory bytes, and persisted rows
//! are exchanged as [`RecordSnapshot`]s. The result table, directory
//! scans, and batch runs live in `hrr-io`.

pub mod codec;
pub mod grayscale;
pub mod record;
pub mod roi;
pub mod sample;
pub mod stats;
pub mod types;

pub use codec::{RoiCell, decode_rois, encode_rois};
pub use record::{
    AnnotationStatus, ClearTarget, ImageRecord, RasterSource, RecomputeStatus, RecordSnapshot,
    Samples, Statistics,
};
pub use roi::{EllipseRoi, RoiSet};
pub use stats::{Ratio, Summary, describe, ratio};
pub use types::{GrayImage, PipelineError, RasterError, Structure};

/// Samples and statistics for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    /// Pixel intensities under each structure's ROIs.
    pub samples: Samples,
    /// Statistics derived from those samples.
    pub statistics: Statistics,
}

/// Measure both structures on one raster.
///
/// # Steps
///
/// 1. Sample the union of the liver ROIs
/// 2. Sample the union of the kidney ROIs
/// 3. Describe each sample (mean, population std)
/// 4. Liver/kidney ratio with propagated std
///
/// A pixel may fall under both a liver and a kidney ROI; it is then
/// counted in both samples.
#[must_use]
pub fn measure(image: &GrayImage, liver: &[EllipseRoi], kidney: &[EllipseRoi]) -> Measurement {
    let samples = Samples {
        liver: sample::sample(image, liver),
        kidney: sample::sample(image, kidney),
    };

    let liver_summary = describe(&samples.liver);
    let kidney_summary = describe(&samples.kidney);
    let statistics = Statistics {
        liver: liver_summary,
        kidney: kidney_summary,
        ratio: ratio(liver_summary, kidney_summary),
    };

    Measurement {
        samples,
        statistics,
    }
}

//! Per-image annotation state and its measured statistics.
//!
//! An [`ImageRecord`] owns the liver and kidney ROI sequences for one
//! image file. Every ROI edit drops all derived values, and
//! [`ImageRecord::recompute`] replaces them in one assignment, so the
//! statistics a record reports always describe its current ROIs or are
//! absent.

use std::collections::HashMap;
use std::hash::BuildHasher;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::codec::RoiCell;
use crate::roi::{EllipseRoi, RoiSet};
use crate::stats::{Ratio, Summary};
use crate::types::{PipelineError, RasterError, Structure};

/// Supplies the grayscale raster behind a record's `file_path`.
///
/// The filesystem implementation lives in `hrr-io`; the map
/// implementation below serves tests and in-memory callers.
pub trait RasterSource {
    /// Load the raster for `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ImageRead`] if the raster is missing or
    /// cannot be decoded.
    fn load(&self, path: &str) -> Result<GrayImage, PipelineError>;
}

impl<S: BuildHasher> RasterSource for HashMap<String, GrayImage, S> {
    fn load(&self, path: &str) -> Result<GrayImage, PipelineError> {
        self.get(path).cloned().ok_or_else(|| {
            PipelineError::image_read(
                path,
                RasterError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "no raster registered for this path",
                )),
            )
        })
    }
}

/// Which ROI sequence(s) [`ImageRecord::clear`] empties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearTarget {
    /// A single structure.
    Only(Structure),
    /// Liver and kidney.
    Both,
}

impl From<Structure> for ClearTarget {
    fn from(structure: Structure) -> Self {
        Self::Only(structure)
    }
}

/// Outcome of [`ImageRecord::recompute`] that is not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecomputeStatus {
    /// At least one structure has no ROIs; nothing was measured.
    IncompleteAnnotation,
    /// Both structures were sampled. `ratio_defined` is `false` when the
    /// kidney was unmeasurable or not strictly positive.
    Computed {
        /// Whether `ratio` is set.
        ratio_defined: bool,
    },
}

/// Coarse progress of a record, for listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnnotationStatus {
    /// One or both structures have no ROIs.
    Unannotated,
    /// Both structures annotated but a structure mean is missing.
    Pending,
    /// Both structure means are available.
    Measured,
}

/// Pixel intensities sampled for each structure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Samples {
    /// Intensities under the liver ROIs.
    pub liver: Vec<u8>,
    /// Intensities under the kidney ROIs.
    pub kidney: Vec<u8>,
}

impl Samples {
    /// Samples for one structure.
    #[must_use]
    pub fn get(&self, structure: Structure) -> &[u8] {
        match structure {
            Structure::Liver => &self.liver,
            Structure::Kidney => &self.kidney,
        }
    }
}

/// Statistics derived from both structures.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    /// `None` when the liver sample was empty.
    pub liver: Option<Summary>,
    /// `None` when the kidney sample was empty.
    pub kidney: Option<Summary>,
    /// `None` when the ratio is undefined.
    pub ratio: Option<Ratio>,
}

impl Statistics {
    /// Summary for one structure.
    #[must_use]
    pub const fn get(&self, structure: Structure) -> Option<Summary> {
        match structure {
            Structure::Liver => self.liver,
            Structure::Kidney => self.kidney,
        }
    }
}

/// Flat view of a record as stored in one dataset row.
///
/// Raw samples are never part of a snapshot. ROI columns may arrive as
/// text (from a file) or already structured (from memory).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSnapshot {
    /// Natural key: the image path.
    pub file_path: String,
    /// Liver ROIs.
    pub liver_locations: RoiCell,
    /// Kidney ROIs.
    pub kidney_locations: RoiCell,
    /// Liver mean intensity.
    pub mean_liver: Option<f64>,
    /// Liver population standard deviation.
    pub std_liver: Option<f64>,
    /// Kidney mean intensity.
    pub mean_kidney: Option<f64>,
    /// Kidney population standard deviation.
    pub std_kidney: Option<f64>,
    /// Hepatic-renal ratio.
    pub ratio: Option<f64>,
    /// Propagated standard deviation of the ratio.
    pub ratio_std: Option<f64>,
}

/// Annotation and measurement state for one image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRecord {
    file_path: String,
    liver: RoiSet,
    kidney: RoiSet,
    statistics: Option<Statistics>,
    samples: Option<Samples>,
}

impl ImageRecord {
    /// A freshly discovered image: no ROIs, nothing measured.
    #[must_use]
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            liver: RoiSet::default(),
            kidney: RoiSet::default(),
            statistics: None,
            samples: None,
        }
    }

    /// Rebuild a record from a persisted row.
    ///
    /// Text ROI cells are decoded, structured ones taken as-is. Stored
    /// statistics are restored; samples are not, and are reproduced by
    /// the next [`recompute`](Self::recompute).
    ///
    /// A mean is restored only together with its standard deviation, and
    /// `ratio_std` only together with `ratio`; an unpaired value is
    /// dropped. The results store rejects such rows before they get here.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RoiDecode`] if an ROI cell is malformed.
    pub fn from_snapshot(snapshot: RecordSnapshot) -> Result<Self, PipelineError> {
        let liver = RoiSet::from(snapshot.liver_locations.into_rois()?);
        let kidney = RoiSet::from(snapshot.kidney_locations.into_rois()?);

        let summary = |mean: Option<f64>, std: Option<f64>| {
            mean.zip(std).map(|(mean, std)| Summary { mean, std })
        };
        let stored = [
            snapshot.mean_liver,
            snapshot.std_liver,
            snapshot.mean_kidney,
            snapshot.std_kidney,
            snapshot.ratio,
            snapshot.ratio_std,
        ];
        let statistics = stored.iter().any(Option::is_some).then(|| Statistics {
            liver: summary(snapshot.mean_liver, snapshot.std_liver),
            kidney: summary(snapshot.mean_kidney, snapshot.std_kidney),
            ratio: snapshot.ratio.map(|value| Ratio {
                value,
                std: snapshot.ratio_std,
            }),
        });

        Ok(Self {
            file_path: snapshot.file_path,
            liver,
            kidney,
            statistics,
            samples: None,
        })
    }

    /// Flatten into a row snapshot with structured ROI cells.
    #[must_use]
    pub fn snapshot(&self) -> RecordSnapshot {
        let stats = self.statistics.unwrap_or_default();
        RecordSnapshot {
            file_path: self.file_path.clone(),
            liver_locations: RoiCell::Decoded(self.liver.as_slice().to_vec()),
            kidney_locations: RoiCell::Decoded(self.kidney.as_slice().to_vec()),
            mean_liver: stats.liver.map(|s| s.mean),
            std_liver: stats.liver.map(|s| s.std),
            mean_kidney: stats.kidney.map(|s| s.mean),
            std_kidney: stats.kidney.map(|s| s.std),
            ratio: stats.ratio.map(|r| r.value),
            ratio_std: stats.ratio.and_then(|r| r.std),
        }
    }

    /// The image path, also the record's key in the dataset.
    #[must_use]
    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// ROIs for one structure, in append order.
    #[must_use]
    pub fn rois(&self, structure: Structure) -> &[EllipseRoi] {
        self.roi_set(structure).as_slice()
    }

    /// Append an ROI to a structure and drop all derived values.
    pub fn add_roi(&mut self, structure: Structure, roi: EllipseRoi) {
        self.roi_set_mut(structure).push(roi);
        self.invalidate();
    }

    /// Validate raw ellipse parameters, then [`add_roi`](Self::add_roi).
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidRoi`] for a degenerate ellipse;
    /// the record is left untouched.
    pub fn add_roi_parts(
        &mut self,
        structure: Structure,
        center_x: f64,
        center_y: f64,
        radius_x: f64,
        radius_y: f64,
    ) -> Result<(), PipelineError> {
        let roi = EllipseRoi::new(center_x, center_y, radius_x, radius_y)?;
        self.add_roi(structure, roi);
        Ok(())
    }

    /// Remove the most recently added ROI of a structure.
    ///
    /// Returns the removed ROI; an empty sequence is a no-op returning
    /// `None`. Derived values are dropped either way.
    pub fn remove_last_roi(&mut self, structure: Structure) -> Option<EllipseRoi> {
        let removed = self.roi_set_mut(structure).pop();
        self.invalidate();
        removed
    }

    /// Empty one or both ROI sequences and drop all derived values.
    pub fn clear(&mut self, target: impl Into<ClearTarget>) {
        match target.into() {
            ClearTarget::Only(structure) => self.roi_set_mut(structure).clear(),
            ClearTarget::Both => {
                self.liver.clear();
                self.kidney.clear();
            }
        }
        self.invalidate();
    }

    /// Whether both structures have at least one ROI.
    #[must_use]
    pub const fn is_annotated(&self) -> bool {
        !self.liver.is_empty() && !self.kidney.is_empty()
    }

    /// Coarse progress for listings.
    #[must_use]
    pub fn status(&self) -> AnnotationStatus {
        if !self.is_annotated() {
            return AnnotationStatus::Unannotated;
        }
        match self.statistics {
            Some(Statistics {
                liver: Some(_),
                kidney: Some(_),
                ..
            }) => AnnotationStatus::Measured,
            _ => AnnotationStatus::Pending,
        }
    }

    /// Sample both structures and replace all derived values.
    ///
    /// With an empty ROI sequence on either structure, derived values are
    /// cleared and [`RecomputeStatus::IncompleteAnnotation`] is returned
    /// without touching the raster.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::ImageRead`] if `source` cannot supply the
    /// raster. The record is left exactly as it was.
    pub fn recompute(
        &mut self,
        source: &impl RasterSource,
    ) -> Result<RecomputeStatus, PipelineError> {
        if !self.is_annotated() {
            self.invalidate();
            return Ok(RecomputeStatus::IncompleteAnnotation);
        }

        let image = source.load(&self.file_path)?;
        let measurement = crate::measure(&image, self.liver.as_slice(), self.kidney.as_slice());
        log::debug!(
            "{}: {} liver / {} kidney pixels sampled",
            self.file_path,
            measurement.samples.liver.len(),
            measurement.samples.kidney.len(),
        );

        let ratio_defined = measurement.statistics.ratio.is_some();
        self.statistics = Some(measurement.statistics);
        self.samples = Some(measurement.samples);
        Ok(RecomputeStatus::Computed { ratio_defined })
    }

    /// Last computed (or loaded) statistics.
    #[must_use]
    pub const fn statistics(&self) -> Option<&Statistics> {
        self.statistics.as_ref()
    }

    /// Samples from the last [`recompute`](Self::recompute), if any.
    #[must_use]
    pub const fn samples(&self) -> Option<&Samples> {
        self.samples.as_ref()
    }

    /// Mean intensity of one structure.
    #[must_use]
    pub fn mean(&self, structure: Structure) -> Option<f64> {
        self.summary(structure).map(|s| s.mean)
    }

    /// Population standard deviation of one structure.
    #[must_use]
    pub fn std(&self, structure: Structure) -> Option<f64> {
        self.summary(structure).map(|s| s.std)
    }

    /// Hepatic-renal ratio.
    #[must_use]
    pub fn ratio(&self) -> Option<f64> {
        self.statistics.and_then(|s| s.ratio).map(|r| r.value)
    }

    /// Propagated standard deviation of the ratio.
    #[must_use]
    pub fn ratio_std(&self) -> Option<f64> {
        self.statistics.and_then(|s| s.ratio).and_then(|r| r.std)
    }

    fn summary(&self, structure: Structure) -> Option<Summary> {
        self.statistics.and_then(|s| s.get(structure))
    }

    fn invalidate(&mut self) {
        self.statistics = None;
        self.samples = None;
    }

    const fn roi_set(&self, structure: Structure) -> &RoiSet {
        match structure {
            Structure::Liver => &self.liver,
            Structure::Kidney => &self.kidney,
        }
    }

    const fn roi_set_mut(&mut self, structure: Structure) -> &mut RoiSet {
        match structure {
            Structure::Liver => &mut self.liver,
            Structure::Kidney => &mut self.kidney,
        }
    }
}

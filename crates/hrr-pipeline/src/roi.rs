//! Elliptical regions of interest and the per-structure ROI sequence.
//!
//! All coordinates are in source-image pixels: `x` is the column, `y`
//! the row. An [`EllipseRoi`] can only be built through a validating
//! constructor, so a degenerate ellipse never reaches a record or the
//! dataset.

use serde::{Deserialize, Serialize};

use crate::types::PipelineError;

/// An axis-aligned ellipse in image-pixel coordinates.
///
/// Serialized as a 4-element array `[center_x, center_y, radius_x,
/// radius_y]`; deserialization goes through [`EllipseRoi::new`] and
/// therefore rejects degenerate radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(into = "[f64; 4]", try_from = "[f64; 4]")]
pub struct EllipseRoi {
    center_x: f64,
    center_y: f64,
    radius_x: f64,
    radius_y: f64,
}

impl EllipseRoi {
    /// Create an ROI, rejecting non-positive radii and non-finite values.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InvalidRoi`] if either radius is `<= 0`
    /// or any component is NaN or infinite.
    pub fn new(
        center_x: f64,
        center_y: f64,
        radius_x: f64,
        radius_y: f64,
    ) -> Result<Self, PipelineError> {
        let finite = [center_x, center_y, radius_x, radius_y]
            .iter()
            .all(|v| v.is_finite());
        if !finite || radius_x <= 0.0 || radius_y <= 0.0 {
            return Err(PipelineError::InvalidRoi {
                center_x,
                center_y,
                radius_x,
                radius_y,
            });
        }
        Ok(Self {
            center_x,
            center_y,
            radius_x,
            radius_y,
        })
    }

    /// Horizontal center (column).
    #[must_use]
    pub const fn center_x(&self) -> f64 {
        self.center_x
    }

    /// Vertical center (row).
    #[must_use]
    pub const fn center_y(&self) -> f64 {
        self.center_y
    }

    /// Horizontal semi-axis in pixels.
    #[must_use]
    pub const fn radius_x(&self) -> f64 {
        self.radius_x
    }

    /// Vertical semi-axis in pixels.
    #[must_use]
    pub const fn radius_y(&self) -> f64 {
        self.radius_y
    }

    /// Normalized-ellipse membership test.
    ///
    /// A point is inside when
    /// `((x - cx) / rx)^2 + ((y - cy) / ry)^2 <= 1`; points exactly on
    /// the boundary are inside.
    ///
    /// Evaluated as `(dx * ry)^2 + (dy * rx)^2 <= (rx * ry)^2`, which has
    /// no division and so stays exact for integer offsets and radii.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        let a = (x - self.center_x) * self.radius_y;
        let b = (y - self.center_y) * self.radius_x;
        let r = self.radius_x * self.radius_y;
        a.mul_add(a, b * b) <= r * r
    }

    /// Inclusive pixel bounds `(x_min, y_min, x_max, y_max)` of the
    /// ellipse, padded by one pixel so float rounding at the rim can
    /// never exclude a pixel the membership test would accept.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pixel_bounds(&self) -> (i64, i64, i64, i64) {
        (
            (self.center_x - self.radius_x).floor() as i64 - 1,
            (self.center_y - self.radius_y).floor() as i64 - 1,
            (self.center_x + self.radius_x).ceil() as i64 + 1,
            (self.center_y + self.radius_y).ceil() as i64 + 1,
        )
    }
}

impl From<EllipseRoi> for [f64; 4] {
    fn from(roi: EllipseRoi) -> Self {
        [roi.center_x, roi.center_y, roi.radius_x, roi.radius_y]
    }
}

impl TryFrom<[f64; 4]> for EllipseRoi {
    type Error = PipelineError;

    fn try_from([cx, cy, rx, ry]: [f64; 4]) -> Result<Self, Self::Error> {
        Self::new(cx, cy, rx, ry)
    }
}

/// Ordered ROIs for one structure of one record.
///
/// Append order is kept; removal is last-in-first-out. Mutation is
/// crate-private so that [`ImageRecord`](crate::ImageRecord) can
/// invalidate its statistics on every edit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoiSet(Vec<EllipseRoi>);

impl RoiSet {
    /// Returns `true` if no ROI has been drawn.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of ROIs.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.0.len()
    }

    /// The ROIs in append order.
    #[must_use]
    pub fn as_slice(&self) -> &[EllipseRoi] {
        &self.0
    }

    /// Most recently added ROI.
    #[must_use]
    pub fn last(&self) -> Option<&EllipseRoi> {
        self.0.last()
    }

    pub(crate) fn push(&mut self, roi: EllipseRoi) {
        self.0.push(roi);
    }

    pub(crate) fn pop(&mut self) -> Option<EllipseRoi> {
        self.0.pop()
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

impl From<Vec<EllipseRoi>> for RoiSet {
    fn from(rois: Vec<EllipseRoi>) -> Self {
        Self(rois)
    }
}

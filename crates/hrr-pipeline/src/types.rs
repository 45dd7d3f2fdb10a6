//! Shared types for the hrr analysis core.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Re-export `GrayImage` so downstream crates can hand rasters to the
/// sampler without depending on `image` directly.
pub use image::GrayImage;

/// One of the two anatomic structures annotated on every image.
///
/// The liver is the numerator of the hepatic-renal ratio, the kidney
/// the denominator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Structure {
    /// Structure A: hepatic parenchyma.
    Liver,
    /// Structure B: renal cortex.
    Kidney,
}

impl Structure {
    /// Both structures, numerator first.
    pub const ALL: [Self; 2] = [Self::Liver, Self::Kidney];

    /// Lowercase name used in column headers and on the command line.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Liver => "liver",
            Self::Kidney => "kidney",
        }
    }
}

impl fmt::Display for Structure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Structure {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "liver" => Ok(Self::Liver),
            "kidney" => Ok(Self::Kidney),
            _ => Err(PipelineError::UnknownStructure(s.to_owned())),
        }
    }
}

/// Why a raster could not be turned into a grayscale grid.
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    /// The file exists but holds no bytes.
    #[error("image data is empty")]
    EmptyInput,

    /// The file could not be read.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The bytes are not a recognised image format.
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
}

/// Errors that can occur while annotating or measuring a record.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A proposed ROI has a non-positive (or non-finite) radius or a
    /// non-finite center.
    #[error(
        "invalid ROI ({center_x}, {center_y}, {radius_x}, {radius_y}): radii must be positive and all values finite"
    )]
    InvalidRoi {
        /// Proposed center column.
        center_x: f64,
        /// Proposed center row.
        center_y: f64,
        /// Proposed horizontal radius.
        radius_x: f64,
        /// Proposed vertical radius.
        radius_y: f64,
    },

    /// The backing raster for a record could not be loaded.
    #[error("failed to read image {path}: {source}")]
    ImageRead {
        /// Path the raster was requested under.
        path: String,
        /// Underlying cause.
        #[source]
        source: RasterError,
    },

    /// A persisted ROI cell could not be parsed back into ROIs.
    #[error("invalid ROI encoding {text:?}: {reason}")]
    RoiDecode {
        /// The offending cell text.
        text: String,
        /// Parser message.
        reason: String,
    },

    /// ROIs could not be serialized for a table cell.
    #[error("failed to encode ROIs: {0}")]
    RoiEncode(#[source] serde_json::Error),

    /// A structure name did not match `liver` or `kidney`.
    #[error("unknown structure {0:?}, expected \"liver\" or \"kidney\"")]
    UnknownStructure(String),
}

impl PipelineError {
    /// Wrap a raster failure with the path it was loaded from.
    #[must_use]
    pub fn image_read(path: impl Into<String>, source: impl Into<RasterError>) -> Self {
        Self::ImageRead {
            path: path.into(),
            source: source.into(),
        }
    }
}

//! Text encoding of ROI sequences for flat table cells.
//!
//! A sequence is written as a JSON array of `[center_x, center_y,
//! radius_x, radius_y]` arrays:
//!
//! ```text
//! []
//! [[120.0,88.0,14.0,9.5],[131.5,90.0,6.0,6.0]]
//! ```
//!
//! Decoding is the structural inverse: `decode_rois(&encode_rois(s)) == s`
//! for every sequence of valid ROIs, the empty one included. It also
//! accepts an empty cell (as an empty sequence) and tuple notation such
//! as `[(120, 88, 14, 9.5)]`.
//!
//! [`RoiCell`] carries a value that may still be text or may already be
//! structured; only text goes through the decoder.

use crate::roi::EllipseRoi;
use crate::types::PipelineError;

/// Encode ROIs as a JSON array of 4-element arrays.
///
/// # Errors
///
/// Returns [`PipelineError::RoiEncode`] if serialization fails.
pub fn encode_rois(rois: &[EllipseRoi]) -> Result<String, PipelineError> {
    serde_json::to_string(rois).map_err(PipelineError::RoiEncode)
}

/// Decode a cell produced by [`encode_rois`] (or the tuple form).
///
/// # Errors
///
/// Returns [`PipelineError::RoiDecode`] if the text is not a list of
/// 4-number entries, or if any entry is a degenerate ellipse.
pub fn decode_rois(text: &str) -> Result<Vec<EllipseRoi>, PipelineError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let normalized = if trimmed.contains('(') {
        trimmed.replace('(', "[").replace(')', "]")
    } else {
        trimmed.to_owned()
    };

    serde_json::from_str(&normalized).map_err(|e| PipelineError::RoiDecode {
        text: text.to_owned(),
        reason: e.to_string(),
    })
}

/// An ROI column value that is either still encoded or already decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum RoiCell {
    /// Raw cell text, decoded on demand.
    Encoded(String),
    /// Structured ROIs, passed through unchanged.
    Decoded(Vec<EllipseRoi>),
}

impl RoiCell {
    /// Resolve to structured ROIs, decoding only if the cell is text.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RoiDecode`] if an encoded cell is malformed.
    pub fn into_rois(self) -> Result<Vec<EllipseRoi>, PipelineError> {
        match self {
            Self::Encoded(text) => decode_rois(&text),
            Self::Decoded(rois) => Ok(rois),
        }
    }

    /// Text form of the cell, encoding only if it is structured.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::RoiEncode`] if a structured cell cannot
    /// be serialized.
    pub fn to_text(&self) -> Result<String, PipelineError> {
        match self {
            Self::Encoded(text) => Ok(text.clone()),
            Self::Decoded(rois) => encode_rois(rois),
        }
    }
}

impl Default for RoiCell {
    fn default() -> Self {
        Self::Decoded(Vec::new())
    }
}

impl From<Vec<EllipseRoi>> for RoiCell {
    fn from(rois: Vec<EllipseRoi>) -> Self {
        Self::Decoded(rois)
    }
}

impl From<String> for RoiCell {
    fn from(text: String) -> Self {
        Self::Encoded(text)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn roi(cx: f64, cy: f64, rx: f64, ry: f64) -> EllipseRoi {
        EllipseRoi::new(cx, cy, rx, ry).unwrap()
    }

    #[test]
    fn empty_sequence_round_trips() {
        let text = encode_rois(&[]).unwrap();
        assert_eq!(text, "[]");
        assert!(decode_rois(&text).unwrap().is_empty());
    }

    #[test]
    fn sequence_round_trips_structurally() {
        let rois = vec![
            roi(120.0, 88.0, 14.0, 9.5),
            roi(0.1, 1e-7, 0.3, 123_456.789),
            roi(-4.0, 2.0 / 3.0, 1.0 / 7.0, 5.0),
        ];
        assert_eq!(decode_rois(&encode_rois(&rois).unwrap()).unwrap(), rois);
    }

    #[test]
    fn encoding_is_a_json_array_of_quadruples() {
        let text = encode_rois(&[roi(1.0, 2.0, 3.0, 4.0), roi(5.5, 6.0, 7.0, 8.0)]).unwrap();
        assert_eq!(text, "[[1.0,2.0,3.0,4.0],[5.5,6.0,7.0,8.0]]");
    }

    #[test]
    fn encoding_matches_serde_serialization() {
        let rois = vec![roi(0.1, 1e-7, 0.3, 123_456.789)];
        assert_eq!(
            encode_rois(&rois).unwrap(),
            serde_json::to_string(&[[0.1, 1e-7, 0.3, 123_456.789]]).unwrap()
        );
    }

    #[test]
    fn blank_cell_decodes_to_empty() {
        assert!(decode_rois("").unwrap().is_empty());
        assert!(decode_rois("   ").unwrap().is_empty());
    }

    #[test]
    fn tuple_notation_is_accepted() {
        let rois = decode_rois("[(10, 20, 5, 5), (30, 40, 3.5, 2)]").unwrap();
        assert_eq!(rois, vec![roi(10.0, 20.0, 5.0, 5.0), roi(30.0, 40.0, 3.5, 2.0)]);
    }

    #[test]
    fn malformed_text_is_rejected() {
        assert!(matches!(
            decode_rois("[[1, 2, 3]]"),
            Err(PipelineError::RoiDecode { .. })
        ));
        assert!(decode_rois("not a list").is_err());
    }

    #[test]
    fn degenerate_entry_is_rejected() {
        assert!(decode_rois("[[1, 2, 0, 3]]").is_err());
    }

    #[test]
    fn structured_cell_passes_through() {
        let rois = vec![roi(3.0, 4.0, 1.0, 2.0)];
        let cell = RoiCell::from(rois.clone());
        assert_eq!(cell.into_rois().unwrap(), rois);
    }

    #[test]
    fn text_cell_is_decoded() {
        let cell = RoiCell::from("[[3.0,4.0,1.0,2.0]]".to_owned());
        assert_eq!(cell.into_rois().unwrap(), vec![roi(3.0, 4.0, 1.0, 2.0)]);
    }

    #[test]
    fn to_text_encodes_structured_cells() {
        let cell = RoiCell::Decoded(vec![roi(3.0, 4.0, 1.0, 2.0)]);
        assert_eq!(cell.to_text().unwrap(), "[[3.0,4.0,1.0,2.0]]");
        assert_eq!(RoiCell::Encoded("[]".to_owned()).to_text().unwrap(), "[]");
    }
}

//! Face Mesh Landmark Ingestion
//!
//! Fixes landmark coordinates to pixel space at the detector boundary and
//! maps the 16-point eye contours out of the raw mesh. The mesh indices live
//! here and nowhere else.

use serde::{Deserialize, Serialize};

/// MediaPipe Face Mesh indices used by the pipeline
pub mod indices {
    /// Left eye contour, outer corner first, lower lid then upper lid
    pub const LEFT_EYE_CONTOUR: [usize; 16] = [
        33, 7, 163, 144, 145, 153, 154, 155, 133, 173, 157, 158, 159, 160, 161, 246,
    ];
    /// Right eye contour, inner corner first, lower lid then upper lid
    pub const RIGHT_EYE_CONTOUR: [usize; 16] = [
        362, 382, 381, 380, 374, 373, 390, 249, 263, 466, 388, 387, 386, 385, 384, 398,
    ];
    /// Nose bridge (between the eyes)
    pub const NOSE_BRIDGE: usize = 6;
}

/// One detected face's landmarks for one video frame, in pixel coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Landmark points in video pixels
    pub points: Vec<[f32; 2]>,
    /// Video width in pixels
    pub width: f32,
    /// Video height in pixels
    pub height: f32,
}

impl LandmarkFrame {
    /// Ingest detector output normalized to 0..1, scaling by the video size.
    pub fn from_normalized(points: &[[f32; 2]], width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        Self {
            points: points.iter().map(|[x, y]| [x * w, y * h]).collect(),
            width: w,
            height: h,
        }
    }

    /// Ingest detector output already in pixel space.
    pub fn from_pixels(points: Vec<[f32; 2]>, width: u32, height: u32) -> Self {
        Self {
            points,
            width: width as f32,
            height: height as f32,
        }
    }

    pub fn get(&self, idx: usize) -> Option<[f32; 2]> {
        self.points.get(idx).copied()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn left_eye(&self) -> EyeContour {
        EyeContour::collect(self, &indices::LEFT_EYE_CONTOUR)
    }

    pub fn right_eye(&self) -> EyeContour {
        EyeContour::collect(self, &indices::RIGHT_EYE_CONTOUR)
    }

    /// Horizontal face center: nose bridge when present, else the frame center.
    pub fn face_center_x(&self) -> f32 {
        self.get(indices::NOSE_BRIDGE)
            .map(|[x, _]| x)
            .unwrap_or(self.width / 2.0)
    }
}

/// Contour points of one eye, one slot per contour index.
///
/// Slots whose landmark is missing from a short mesh stay `None`, so slot
/// positions always match [`indices`] order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EyeContour {
    pub slots: Vec<Option<[f32; 2]>>,
}

impl EyeContour {
    pub const FULL_LEN: usize = 16;

    fn collect(frame: &LandmarkFrame, contour: &[usize]) -> Self {
        Self {
            slots: contour.iter().map(|&idx| frame.get(idx)).collect(),
        }
    }

    /// Build a contour where every slot is present.
    pub fn from_points(points: &[[f32; 2]]) -> Self {
        Self {
            slots: points.iter().copied().map(Some).collect(),
        }
    }

    /// Point at contour slot `slot`, if present.
    pub fn slot(&self, slot: usize) -> Option<[f32; 2]> {
        self.slots.get(slot).copied().flatten()
    }

    /// Present points in contour order.
    pub fn points(&self) -> impl Iterator<Item = [f32; 2]> + '_ {
        self.slots.iter().filter_map(|p| *p)
    }

    /// Number of present points
    pub fn len(&self) -> usize {
        self.points().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fraction of the full contour that was present (0-1).
    pub fn completeness(&self) -> f32 {
        (self.len() as f32 / Self::FULL_LEN as f32).min(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_dummy_landmarks() -> Vec<[f32; 2]> {
        let mut landmarks = vec![[0.5, 0.5]; 468];
        landmarks[indices::LEFT_EYE_CONTOUR[0]] = [0.25, 0.4];
        landmarks[indices::RIGHT_EYE_CONTOUR[0]] = [0.75, 0.4];
        landmarks
    }

    #[test]
    fn test_normalized_scaled_at_ingestion() {
        let frame = LandmarkFrame::from_normalized(&make_dummy_landmarks(), 640, 480);
        assert_eq!(frame.get(33), Some([160.0, 192.0]));
        assert_eq!(frame.get(362), Some([480.0, 192.0]));
    }

    #[test]
    fn test_contours_are_full_on_complete_mesh() {
        let frame = LandmarkFrame::from_normalized(&make_dummy_landmarks(), 640, 480);
        assert_eq!(frame.left_eye().len(), 16);
        assert_eq!(frame.right_eye().len(), 16);
        assert!((frame.left_eye().completeness() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_short_mesh_skips_missing_points() {
        // Only indices < 160 exist: left contour loses 163, 173, 160, 161, 246
        let frame = LandmarkFrame::from_pixels(vec![[1.0, 1.0]; 160], 640, 480);
        let left = frame.left_eye();
        assert_eq!(left.len(), 11);
        assert_eq!(left.slots.len(), 16);
        // 163 sits at slot 2; slot 3 still holds landmark 144
        assert_eq!(left.slot(2), None);
        assert_eq!(left.slot(3), Some([1.0, 1.0]));
        assert!(frame.right_eye().is_empty());
    }

    #[test]
    fn test_face_center_falls_back_to_frame_center() {
        let frame = LandmarkFrame::from_pixels(vec![], 640, 480);
        assert_eq!(frame.face_center_x(), 320.0);

        let mut points = vec![[0.0, 0.0]; 10];
        points[indices::NOSE_BRIDGE] = [300.0, 200.0];
        let frame = LandmarkFrame::from_pixels(points, 640, 480);
        assert_eq!(frame.face_center_x(), 300.0);
    }

    #[test]
    fn test_contour_indices_unique() {
        let mut all: Vec<usize> = indices::LEFT_EYE_CONTOUR
            .iter()
            .chain(indices::RIGHT_EYE_CONTOUR.iter())
            .copied()
            .collect();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), 32);
    }
}

//! Eye Geometry Extraction
//!
//! Reduces a landmark frame to per-eye centers and openness ratios:
//! - Eye center = mean of the eye's contour points (pixels)
//! - Openness = vertical lid span / horizontal span (eye aspect ratio)

use crate::landmarks::{EyeContour, LandmarkFrame};

/// Contour slots used for the openness ratio
mod slots {
    pub const HORIZONTAL_A: usize = 0;
    pub const UPPER: usize = 1;
    pub const HORIZONTAL_B: usize = 3;
    pub const LOWER: usize = 5;
}

/// Minimum contour points needed for an openness measurement
pub const MIN_OPENNESS_POINTS: usize = 6;

/// Openness reported when it cannot be measured
pub const FULLY_OPEN: f32 = 1.0;

/// Geometry of one eye
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EyeGeometry {
    /// Contour centroid in pixels
    pub center: [f32; 2],
    /// Eye aspect ratio (0 = closed)
    pub openness: f32,
    /// Fraction of the contour present in the frame (0-1)
    pub completeness: f32,
}

/// Geometry of both eyes plus the face reference used for drift analysis
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    pub left: EyeGeometry,
    pub right: EyeGeometry,
    /// Horizontal face center in pixels
    pub face_center_x: f32,
    /// Video width in pixels
    pub frame_width: f32,
}

impl FaceGeometry {
    /// Mean openness of both eyes
    pub fn avg_openness(&self) -> f32 {
        (self.left.openness + self.right.openness) / 2.0
    }
}

/// Stateless extractor from landmarks to eye geometry
#[derive(Debug, Clone, Copy, Default)]
pub struct EyeGeometryExtractor;

impl EyeGeometryExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract both eyes. Returns `None` if either eye has no contour points.
    pub fn extract(&self, frame: &LandmarkFrame) -> Option<FaceGeometry> {
        let left = self.eye(&frame.left_eye())?;
        let right = self.eye(&frame.right_eye())?;

        Some(FaceGeometry {
            left,
            right,
            face_center_x: frame.face_center_x(),
            frame_width: frame.width,
        })
    }

    /// Geometry of a single eye contour.
    pub fn eye(&self, contour: &EyeContour) -> Option<EyeGeometry> {
        let center = eye_center(contour)?;
        Some(EyeGeometry {
            center,
            openness: eye_openness(contour),
            completeness: contour.completeness(),
        })
    }
}

/// Arithmetic mean of the present contour points.
pub fn eye_center(contour: &EyeContour) -> Option<[f32; 2]> {
    let (n, sx, sy) = contour
        .points()
        .fold((0usize, 0.0f32, 0.0f32), |(n, sx, sy), [x, y]| (n + 1, sx + x, sy + y));
    if n == 0 {
        return None;
    }
    Some([sx / n as f32, sy / n as f32])
}

/// Vertical span over horizontal span of the contour.
///
/// Fewer than [`MIN_OPENNESS_POINTS`] points, a missing corner or lid slot,
/// or a degenerate horizontal span reads as fully open.
pub fn eye_openness(contour: &EyeContour) -> f32 {
    if contour.len() < MIN_OPENNESS_POINTS {
        log::debug!(
            "insufficient eye landmarks ({} < {}), assuming open",
            contour.len(),
            MIN_OPENNESS_POINTS
        );
        return FULLY_OPEN;
    }

    let (Some(a), Some(upper), Some(b), Some(lower)) = (
        contour.slot(slots::HORIZONTAL_A),
        contour.slot(slots::UPPER),
        contour.slot(slots::HORIZONTAL_B),
        contour.slot(slots::LOWER),
    ) else {
        log::debug!("eye corner or lid landmark missing, assuming open");
        return FULLY_OPEN;
    };

    let height = (upper[1] - lower[1]).abs();
    let width = (b[0] - a[0]).abs();

    if width < 1e-3 {
        return FULLY_OPEN;
    }

    height / width
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::indices;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn contour(points: &[[f32; 2]]) -> EyeContour {
        EyeContour::from_points(points)
    }

    /// Mesh with the left eye's corners 40 px apart and lids 12 px apart.
    fn measured_left_eye(mesh_len: usize) -> LandmarkFrame {
        let mut points = vec![[100.0, 100.0]; 468];
        let c = indices::LEFT_EYE_CONTOUR;
        points[c[0]] = [80.0, 100.0];
        points[c[1]] = [90.0, 106.0];
        points[c[3]] = [120.0, 100.0];
        points[c[5]] = [110.0, 94.0];
        points.truncate(mesh_len);
        LandmarkFrame::from_pixels(points, 640, 480)
    }

    #[test]
    fn test_center_is_mean() {
        let c = contour(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        assert_eq!(eye_center(&c), Some([5.0, 5.0]));
        assert_eq!(eye_center(&EyeContour::default()), None);
    }

    #[test]
    fn test_openness_ratio() {
        // slot 0 x=0, slot 3 x=40 -> width 40; slot 1 y=10, slot 5 y=22 -> height 12
        let c = contour(&[
            [0.0, 15.0],
            [10.0, 10.0],
            [20.0, 15.0],
            [40.0, 15.0],
            [30.0, 20.0],
            [20.0, 22.0],
        ]);
        assert_relative_eq!(eye_openness(&c), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_insufficient_points_defaults_open() {
        let c = contour(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]]);
        assert_eq!(eye_openness(&c), FULLY_OPEN);
    }

    #[test]
    fn test_zero_width_defaults_open() {
        let c = contour(&[[5.0, 0.0]; 6]);
        assert_eq!(eye_openness(&c), FULLY_OPEN);
    }

    #[test]
    fn test_openness_reads_fixed_slots_on_short_mesh() {
        let full = measured_left_eye(468).left_eye();
        assert_relative_eq!(eye_openness(&full), 0.3, epsilon = 1e-6);

        // 163 mesh points: landmarks 163, 173 and 246 are gone
        let short = measured_left_eye(163).left_eye();
        assert_eq!(short.len(), 13);
        assert_relative_eq!(eye_openness(&short), 0.3, epsilon = 1e-6);
    }

    #[test]
    fn test_missing_lid_slot_defaults_open() {
        let mut c = contour(&[[0.0, 15.0]; 16]);
        c.slots[slots::UPPER] = None;
        assert_eq!(c.len(), 15);
        assert_eq!(eye_openness(&c), FULLY_OPEN);
    }

    #[test]
    fn test_center_skips_missing_slots() {
        let mut c = contour(&[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        c.slots.push(None);
        assert_eq!(eye_center(&c), Some([5.0, 5.0]));
    }

    #[test]
    fn test_extract_from_frame() {
        let mut points = vec![[0.0, 0.0]; 468];
        for &i in indices::LEFT_EYE_CONTOUR.iter() {
            points[i] = [200.0, 100.0];
        }
        for &i in indices::RIGHT_EYE_CONTOUR.iter() {
            points[i] = [260.0, 110.0];
        }
        points[indices::NOSE_BRIDGE] = [230.0, 105.0];
        let frame = LandmarkFrame::from_pixels(points, 640, 480);

        let face = EyeGeometryExtractor::new().extract(&frame).unwrap();
        assert_eq!(face.left.center, [200.0, 100.0]);
        assert_eq!(face.right.center, [260.0, 110.0]);
        assert_eq!(face.face_center_x, 230.0);
        assert_eq!(face.frame_width, 640.0);
        assert!((face.left.completeness - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_extract_without_eyes() {
        let frame = LandmarkFrame::from_pixels(vec![[1.0, 1.0]; 100], 640, 480);
        assert!(EyeGeometryExtractor::new().extract(&frame).is_none());
    }

    proptest! {
        #[test]
        fn test_center_within_contour_bounds(
            points in proptest::collection::vec((0.0f32..1920.0, 0.0f32..1080.0), 6..16)
        ) {
            let pts: Vec<[f32; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
            let c = contour(&pts);
            let [cx, cy] = eye_center(&c).unwrap();

            let min_x = pts.iter().map(|p| p[0]).fold(f32::INFINITY, f32::min);
            let max_x = pts.iter().map(|p| p[0]).fold(f32::NEG_INFINITY, f32::max);
            let min_y = pts.iter().map(|p| p[1]).fold(f32::INFINITY, f32::min);
            let max_y = pts.iter().map(|p| p[1]).fold(f32::NEG_INFINITY, f32::max);

            let tol = 1e-2;
            prop_assert!(cx >= min_x - tol && cx <= max_x + tol);
            prop_assert!(cy >= min_y - tol && cy <= max_y + tol);
        }

        #[test]
        fn test_openness_finite_and_non_negative(
            points in proptest::collection::vec((0.0f32..1920.0, 0.0f32..1080.0), 0..16)
        ) {
            let pts: Vec<[f32; 2]> = points.iter().map(|&(x, y)| [x, y]).collect();
            let o = eye_openness(&contour(&pts));
            prop_assert!(o.is_finite());
            prop_assert!(o >= 0.0);
        }
    }
}

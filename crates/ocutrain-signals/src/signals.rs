//! Per-frame Eye Signals
//!
//! Turns eye geometry into the therapeutic signal snapshot:
//! - Gaze direction (eye-midpoint proxy)
//! - Eye alignment (vertical offset band)
//! - Blink rate (rolling closed-eye history)
//!
//! The gaze vector is the midpoint of the two eye centers relative to a fixed
//! reference frame. It tracks head and eye position together, not pupil
//! direction; pupil-relative gaze needs iris landmarks.

use serde::{Deserialize, Serialize};

use crate::config::{BlinkRateMode, FrameDims, TrackerConfig};
use crate::geometry::FaceGeometry;
use crate::history::RingBuffer;

/// Base confidence for a fully visible eye contour
pub const BASE_EYE_CONFIDENCE: f32 = 0.9;

/// Eye center with confidence
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EyePoint {
    pub x: f32,
    pub y: f32,
    /// Confidence score (0-1)
    pub confidence: f32,
}

/// Gaze direction, each axis in [-1, 1]
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GazeVector {
    pub x: f32,
    pub y: f32,
}

/// Signal snapshot for one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EyeData {
    pub left_eye: EyePoint,
    pub right_eye: EyePoint,
    pub gaze_direction: GazeVector,
    /// 1 = level eyes, 0 = at or beyond the tolerance band
    pub eye_alignment: f32,
    /// Blinks per minute
    pub blink_rate: f32,
}

impl EyeData {
    pub fn alignment_quality(&self) -> AlignmentQuality {
        AlignmentQuality::from_score(self.eye_alignment)
    }

    /// Horizontal distance between eye centers (px)
    pub fn interocular_distance(&self) -> f32 {
        (self.right_eye.x - self.left_eye.x).abs()
    }
}

/// Alignment banding used for overlay feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlignmentQuality {
    Good,
    Fair,
    Poor,
}

impl AlignmentQuality {
    pub fn from_score(alignment: f32) -> Self {
        if alignment > 0.8 {
            Self::Good
        } else if alignment > 0.5 {
            Self::Fair
        } else {
            Self::Poor
        }
    }
}

/// `max(0, 1 - |left_y - right_y| / tolerance)`
pub fn alignment_score(left_y: f32, right_y: f32, tolerance_px: f32) -> f32 {
    let diff = (left_y - right_y).abs();
    (1.0 - diff / tolerance_px).clamp(0.0, 1.0)
}

/// Eye midpoint relative to the reference frame center, clamped to [-1, 1].
pub fn gaze_direction(left: [f32; 2], right: [f32; 2], reference: FrameDims) -> GazeVector {
    let half_w = reference.width / 2.0;
    let half_h = reference.height / 2.0;
    let cx = (left[0] + right[0]) / 2.0;
    let cy = (left[1] + right[1]) / 2.0;

    GazeVector {
        x: ((cx - half_w) / half_w).clamp(-1.0, 1.0),
        y: ((cy - half_h) / half_h).clamp(-1.0, 1.0),
    }
}

/// Produces one `EyeData` per frame and owns the blink and position histories.
pub struct SignalComputer {
    reference_frame: FrameDims,
    alignment_tolerance_px: f32,
    closed_threshold: f32,
    sampling_fps: f32,
    blink_rate_mode: BlinkRateMode,
    blink_history: RingBuffer<bool>,
    position_history: RingBuffer<([f32; 2], [f32; 2])>,
}

impl SignalComputer {
    pub fn new() -> Self {
        Self::with_config(&TrackerConfig::default())
    }

    pub fn with_config(config: &TrackerConfig) -> Self {
        Self {
            reference_frame: config.reference_frame,
            alignment_tolerance_px: config.alignment_tolerance_px,
            closed_threshold: config.blink_closed_threshold,
            sampling_fps: config.sampling_fps,
            blink_rate_mode: config.blink_rate_mode,
            blink_history: RingBuffer::with_capacity(config.blink_window),
            position_history: RingBuffer::with_capacity(config.position_window),
        }
    }

    /// Compute the snapshot for one frame and append to the histories.
    pub fn compute(&mut self, face: &FaceGeometry) -> EyeData {
        let left = face.left.center;
        let right = face.right.center;

        let gaze = gaze_direction(left, right, self.reference_frame);
        let eye_alignment = alignment_score(left[1], right[1], self.alignment_tolerance_px);

        self.blink_history
            .push(face.avg_openness() < self.closed_threshold);
        self.position_history.push((left, right));

        EyeData {
            left_eye: EyePoint {
                x: left[0],
                y: left[1],
                confidence: BASE_EYE_CONFIDENCE * face.left.completeness,
            },
            right_eye: EyePoint {
                x: right[0],
                y: right[1],
                confidence: BASE_EYE_CONFIDENCE * face.right.completeness,
            },
            gaze_direction: gaze,
            eye_alignment,
            blink_rate: self.blink_rate(),
        }
    }

    /// Blink rate in blinks per minute from the current blink history.
    pub fn blink_rate(&self) -> f32 {
        if self.blink_history.is_empty() {
            return 0.0;
        }
        match self.blink_rate_mode {
            BlinkRateMode::PerFrameFraction => {
                self.blink_history.true_fraction() * 60.0 * self.sampling_fps
            }
            BlinkRateMode::WindowDuration => {
                let window_sec = self.blink_history.len() as f32 / self.sampling_fps;
                let blinks = self
                    .blink_history
                    .iter()
                    .zip(self.blink_history.iter().skip(1))
                    .filter(|&(&closed, &next_closed)| closed && !next_closed)
                    .count();
                blinks as f32 * 60.0 / window_sec
            }
        }
    }

    /// Set the effective sampling rate (e.g. after measuring frame drops).
    pub fn set_sampling_fps(&mut self, fps: f32) {
        if fps > 0.0 {
            self.sampling_fps = fps;
        }
    }

    pub fn blink_history(&self) -> &RingBuffer<bool> {
        &self.blink_history
    }

    /// Recent (left, right) eye centers, oldest first.
    pub fn position_history(&self) -> &RingBuffer<([f32; 2], [f32; 2])> {
        &self.position_history
    }

    /// Inject a closed/open observation directly (replay and calibration).
    pub fn record_blink_sample(&mut self, closed: bool) {
        self.blink_history.push(closed);
    }

    /// Reset computer state
    pub fn reset(&mut self) {
        self.blink_history.clear();
        self.position_history.clear();
    }
}

impl Default for SignalComputer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::EyeGeometry;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn face(left: [f32; 2], right: [f32; 2], openness: f32) -> FaceGeometry {
        let eye = |center| EyeGeometry {
            center,
            openness,
            completeness: 1.0,
        };
        FaceGeometry {
            left: eye(left),
            right: eye(right),
            face_center_x: 320.0,
            frame_width: 640.0,
        }
    }

    #[test]
    fn test_level_eyes_fully_aligned() {
        let mut computer = SignalComputer::new();
        let data = computer.compute(&face([290.0, 100.0], [350.0, 100.0], 0.4));
        assert_relative_eq!(data.eye_alignment, 1.0);
        assert_eq!(data.alignment_quality(), AlignmentQuality::Good);
        assert_relative_eq!(data.left_eye.confidence, BASE_EYE_CONFIDENCE);
        assert_relative_eq!(data.interocular_distance(), 60.0);
    }

    #[test]
    fn test_alignment_band() {
        assert_relative_eq!(alignment_score(100.0, 110.0, 20.0), 0.5);
        assert_relative_eq!(alignment_score(100.0, 130.0, 20.0), 0.0);
        assert_eq!(AlignmentQuality::from_score(0.5), AlignmentQuality::Poor);
        assert_eq!(AlignmentQuality::from_score(0.6), AlignmentQuality::Fair);
    }

    #[test]
    fn test_gaze_centered_on_reference_frame() {
        let gaze = gaze_direction([290.0, 240.0], [350.0, 240.0], FrameDims::default());
        assert_relative_eq!(gaze.x, 0.0);
        assert_relative_eq!(gaze.y, 0.0);

        // Midpoint at (480, 360) on a 640x480 reference
        let gaze = gaze_direction([450.0, 360.0], [510.0, 360.0], FrameDims::default());
        assert_relative_eq!(gaze.x, 0.5);
        assert_relative_eq!(gaze.y, 0.5);
    }

    #[test]
    fn test_gaze_clamped_for_large_frames() {
        let gaze = gaze_direction([1800.0, 1000.0], [1900.0, 1000.0], FrameDims::default());
        assert_eq!(gaze.x, 1.0);
        assert_eq!(gaze.y, 1.0);
    }

    #[test]
    fn test_blink_rate_fraction_formula() {
        let mut computer = SignalComputer::new();
        for i in 0..60 {
            computer.record_blink_sample(i < 30);
        }
        // 0.5 × 60 × 30
        assert_relative_eq!(computer.blink_rate(), 900.0);
    }

    #[test]
    fn test_blink_rate_uses_configured_fps() {
        let mut config = TrackerConfig::default();
        config.sampling_fps = 15.0;
        let mut computer = SignalComputer::with_config(&config);
        for i in 0..60 {
            computer.record_blink_sample(i % 4 == 0);
        }
        assert_relative_eq!(computer.blink_rate(), 0.25 * 60.0 * 15.0);
    }

    #[test]
    fn test_blink_rate_window_duration() {
        let mut config = TrackerConfig::default();
        config.blink_rate_mode = BlinkRateMode::WindowDuration;
        let mut computer = SignalComputer::with_config(&config);
        // Two blinks (closed -> open) within 60 frames = 2 s at 30 fps
        for i in 0..60 {
            computer.record_blink_sample(matches!(i, 10 | 11 | 40 | 41 | 42));
        }
        assert_relative_eq!(computer.blink_rate(), 60.0);
    }

    #[test]
    fn test_closed_eyes_recorded() {
        let mut computer = SignalComputer::new();
        computer.compute(&face([290.0, 100.0], [350.0, 100.0], 0.1));
        computer.compute(&face([290.0, 100.0], [350.0, 100.0], 0.5));
        let history: Vec<bool> = computer.blink_history().iter().copied().collect();
        assert_eq!(history, vec![true, false]);
        assert_eq!(computer.position_history().len(), 2);
    }

    #[test]
    fn test_reset() {
        let mut computer = SignalComputer::new();
        computer.compute(&face([290.0, 100.0], [350.0, 100.0], 0.1));
        computer.reset();
        assert!(computer.blink_history().is_empty());
        assert!(computer.position_history().is_empty());
        assert_eq!(computer.blink_rate(), 0.0);
    }

    proptest! {
        #[test]
        fn test_alignment_monotonic_and_bounded(
            base in 0.0f32..1000.0,
            d1 in 0.0f32..100.0,
            d2 in 0.0f32..100.0,
        ) {
            let (small, large) = if d1 <= d2 { (d1, d2) } else { (d2, d1) };
            let a_small = alignment_score(base, base + small, 20.0);
            let a_large = alignment_score(base, base + large, 20.0);
            prop_assert!((0.0..=1.0).contains(&a_small));
            prop_assert!((0.0..=1.0).contains(&a_large));
            prop_assert!(a_large <= a_small + 1e-6);
        }

        #[test]
        fn test_blink_history_bounded(closed in proptest::collection::vec(any::<bool>(), 0..300)) {
            let mut computer = SignalComputer::new();
            for c in closed {
                computer.record_blink_sample(c);
                prop_assert!(computer.blink_history().len() <= 60);
            }
        }
    }
}

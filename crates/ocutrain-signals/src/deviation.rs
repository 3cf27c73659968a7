//! Lazy-Eye Drift Analysis
//!
//! Classifies persistent drift of one eye from a rolling deviation history.
//!
//! Per-frame deviation:
//! `w_v·|left.y − right.y| + w_m·|midpoint.x − face_center.x| + w_i·|iod − expected_iod|`
//!
//! The classifier holds `None` until a full window of samples is buffered,
//! then compares the recent average against the drift threshold and picks the
//! drifting side from horizontal or vertical eye offsets.

use serde::{Deserialize, Serialize};

use crate::config::DeviationConfig;
use crate::geometry::FaceGeometry;
use crate::history::RingBuffer;
use crate::signals::EyeData;

/// Which eye, if any, is drifting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LazyEye {
    #[default]
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Moderate,
    Severe,
}

/// Current lazy-eye classification
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Classification {
    pub lazy_eye: LazyEye,
    /// Present only while an eye is flagged
    pub severity: Option<Severity>,
    /// Mean deviation over the averaging window (0 during cold start)
    pub avg_deviation: f32,
}

impl Classification {
    pub fn is_flagged(&self) -> bool {
        self.lazy_eye != LazyEye::None
    }
}

/// Rolling drift classifier
pub struct DeviationAnalyzer {
    config: DeviationConfig,
    deviations: RingBuffer<f32>,
    positions: RingBuffer<([f32; 2], [f32; 2])>,
    frame_width: f32,
    classification: Classification,
}

impl DeviationAnalyzer {
    pub fn new() -> Self {
        Self::with_config(DeviationConfig::default())
    }

    pub fn with_config(config: DeviationConfig) -> Self {
        Self {
            deviations: RingBuffer::with_capacity(config.window),
            positions: RingBuffer::with_capacity(config.averaging_window),
            frame_width: 0.0,
            classification: Classification::default(),
            config,
        }
    }

    /// Weighted deviation for one frame.
    pub fn deviation(&self, left: [f32; 2], right: [f32; 2], face_center_x: f32) -> f32 {
        let vertical = (left[1] - right[1]).abs();
        let midpoint_x = (left[0] + right[0]) / 2.0;
        let midpoint_offset = (midpoint_x - face_center_x).abs();
        let interocular = (right[0] - left[0]).abs();
        let iod_error = (interocular - self.config.expected_interocular_px).abs();

        self.config.vertical_weight * vertical
            + self.config.midpoint_weight * midpoint_offset
            + self.config.interocular_weight * iod_error
    }

    /// Feed one frame and re-classify.
    pub fn observe(&mut self, data: &EyeData, face: &FaceGeometry) -> Classification {
        self.observe_positions(
            [data.left_eye.x, data.left_eye.y],
            [data.right_eye.x, data.right_eye.y],
            face.face_center_x,
            face.frame_width,
        )
    }

    /// Feed raw eye centers and re-classify.
    pub fn observe_positions(
        &mut self,
        left: [f32; 2],
        right: [f32; 2],
        face_center_x: f32,
        frame_width: f32,
    ) -> Classification {
        let sample = self.deviation(left, right, face_center_x);
        self.deviations.push(sample);
        self.positions.push((left, right));
        self.frame_width = frame_width;

        let next = self.classify(sample);
        if next.lazy_eye != self.classification.lazy_eye {
            log::info!(
                "lazy-eye classification {:?} -> {:?} (avg deviation {:.1})",
                self.classification.lazy_eye,
                next.lazy_eye,
                next.avg_deviation
            );
        }
        self.classification = next;
        next
    }

    fn classify(&self, latest: f32) -> Classification {
        if self.deviations.len() < self.config.window {
            return Classification::default();
        }

        let avg_deviation = self
            .deviations
            .mean_recent(self.config.averaging_window)
            .unwrap_or(0.0);

        if avg_deviation <= self.config.drift_threshold {
            return Classification {
                avg_deviation,
                ..Classification::default()
            };
        }

        let lazy_eye = self
            .drifting_side()
            .unwrap_or(self.classification.lazy_eye);

        let severity = (lazy_eye != LazyEye::None).then(|| {
            if latest > self.config.severe_threshold {
                Severity::Severe
            } else {
                Severity::Moderate
            }
        });

        Classification {
            lazy_eye,
            severity,
            avg_deviation,
        }
    }

    /// Side rule over the averaged recent eye positions.
    ///
    /// Vertical offset wins when it exceeds its threshold and is at least the
    /// horizontal offset difference; the lower eye (larger y) is flagged.
    /// Otherwise the eye further from its expected x by more than the margin
    /// is flagged. `None` when neither rule decides.
    fn drifting_side(&self) -> Option<LazyEye> {
        let n = self.positions.len();
        if n == 0 {
            return None;
        }
        let (sum_l, sum_r) = self.positions.iter().fold(
            ([0.0f32; 2], [0.0f32; 2]),
            |(l, r), (pl, pr)| {
                (
                    [l[0] + pl[0], l[1] + pl[1]],
                    [r[0] + pr[0], r[1] + pr[1]],
                )
            },
        );
        let n = n as f32;
        let left = [sum_l[0] / n, sum_l[1] / n];
        let right = [sum_r[0] / n, sum_r[1] / n];

        let left_offset = (left[0] - self.frame_width * self.config.left_eye_expected_frac).abs();
        let right_offset =
            (right[0] - self.frame_width * self.config.right_eye_expected_frac).abs();
        let horizontal_diff = left_offset - right_offset;
        let vertical = (left[1] - right[1]).abs();

        if vertical > self.config.vertical_threshold_px && vertical >= horizontal_diff.abs() {
            return Some(if left[1] > right[1] {
                LazyEye::Left
            } else {
                LazyEye::Right
            });
        }

        if horizontal_diff > self.config.horizontal_margin_px {
            Some(LazyEye::Left)
        } else if -horizontal_diff > self.config.horizontal_margin_px {
            Some(LazyEye::Right)
        } else {
            None
        }
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn deviation_history(&self) -> &RingBuffer<f32> {
        &self.deviations
    }

    /// Samples still needed before classification can leave `None`
    pub fn samples_until_ready(&self) -> usize {
        self.config.window.saturating_sub(self.deviations.len())
    }

    /// Reset analyzer state
    pub fn reset(&mut self) {
        self.deviations.clear();
        self.positions.clear();
        self.classification = Classification::default();
    }
}

impl Default for DeviationAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

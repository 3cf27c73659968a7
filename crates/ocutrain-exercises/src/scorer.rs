//! Exercise Scoring
//!
//! Compares recorded gaze against the active target at exercise end.
//!
//! Response time is the mean interval between buffered gaze samples. It is a
//! latency proxy, not a stimulus-to-saccade measurement.

use ocutrain_signals::{EyeData, GazeVector, RingBuffer};
use serde::{Deserialize, Serialize};

use crate::target::ExerciseTarget;

/// Gaze samples kept while an exercise runs
pub const GAZE_BUFFER_CAPACITY: usize = 50;

/// One gaze observation in [-1, 1] gaze space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GazeSample {
    pub x: f32,
    pub y: f32,
    pub timestamp_ms: u64,
}

impl GazeSample {
    pub fn from_gaze(gaze: &GazeVector, timestamp_ms: u64) -> Self {
        Self {
            x: gaze.x,
            y: gaze.y,
            timestamp_ms,
        }
    }
}

/// Bounded rolling gaze buffer for the active exercise
#[derive(Debug, Clone)]
pub struct GazeRecorder {
    samples: RingBuffer<GazeSample>,
}

impl GazeRecorder {
    pub fn new() -> Self {
        Self::with_capacity(GAZE_BUFFER_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: RingBuffer::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, sample: GazeSample) {
        self.samples.push(sample);
    }

    pub fn record_gaze(&mut self, gaze: &GazeVector, timestamp_ms: u64) {
        self.record(GazeSample::from_gaze(gaze, timestamp_ms));
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = &GazeSample> + '_ {
        self.samples.iter()
    }

    /// Hand the buffered samples to the scorer, leaving the buffer empty.
    pub fn take(&mut self) -> Vec<GazeSample> {
        self.samples.drain()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

impl Default for GazeRecorder {
    fn default() -> Self {
        Self::new()
    }
}

/// Summary of one exercise run
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseResult {
    /// 0-1
    pub accuracy: f32,
    pub response_time_ms: f32,
    /// 0-1, from the latest signal snapshot
    pub eye_alignment: f32,
    pub completed: bool,
}

impl ExerciseResult {
    /// Result for a run with nothing to score
    pub fn incomplete() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ExerciseScorer;

impl ExerciseScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score buffered gaze against the final target.
    pub fn score(
        &self,
        samples: &[GazeSample],
        target: Option<&ExerciseTarget>,
        latest: Option<&EyeData>,
    ) -> ExerciseResult {
        let Some(target) = target else {
            log::debug!("no active target at scoring time");
            return ExerciseResult::incomplete();
        };
        if samples.is_empty() {
            log::debug!("empty gaze buffer at scoring time");
            return ExerciseResult::incomplete();
        }

        let [tx, ty] = target.normalized();
        let accuracy = samples
            .iter()
            .map(|s| {
                let distance = ((s.x - tx).powi(2) + (s.y - ty).powi(2)).sqrt();
                1.0 - distance.min(1.0)
            })
            .sum::<f32>()
            / samples.len() as f32;

        ExerciseResult {
            accuracy,
            response_time_ms: mean_interval_ms(samples),
            eye_alignment: latest.map(|d| d.eye_alignment).unwrap_or(0.0),
            completed: true,
        }
    }
}

/// Total span of the samples divided by their count.
fn mean_interval_ms(samples: &[GazeSample]) -> f32 {
    match (samples.first(), samples.last()) {
        (Some(first), Some(last)) if samples.len() > 1 => {
            last.timestamp_ms.saturating_sub(first.timestamp_ms) as f32 / samples.len() as f32
        }
        _ => 0.0,
    }
}

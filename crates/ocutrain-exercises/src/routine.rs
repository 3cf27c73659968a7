//! Guided five-step routine
//!
//! Look up, look down, look left, look right, then follow a circle. Each
//! step is held for a fixed interval; the whole routine is five steps.

use serde::{Deserialize, Serialize};

use crate::target::{ExerciseTarget, Rgb};

const TARGET_SIZE: f32 = 30.0;
const TARGET_COLOR: Rgb = Rgb::from_hex(0x3B82F6);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GuidedStep {
    LookUp,
    LookDown,
    LookLeft,
    LookRight,
    Circular,
}

impl GuidedStep {
    pub const ALL: [GuidedStep; 5] = [
        GuidedStep::LookUp,
        GuidedStep::LookDown,
        GuidedStep::LookLeft,
        GuidedStep::LookRight,
        GuidedStep::Circular,
    ];

    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % Self::ALL.len()]
    }

    /// Target position (percent) at `elapsed_ms` into the routine.
    pub fn position(&self, elapsed_ms: u64) -> [f32; 2] {
        match self {
            GuidedStep::LookUp => [50.0, 20.0],
            GuidedStep::LookDown => [50.0, 80.0],
            GuidedStep::LookLeft => [20.0, 50.0],
            GuidedStep::LookRight => [80.0, 50.0],
            GuidedStep::Circular => {
                let t = elapsed_ms as f64 / 1000.0;
                [(50.0 + 30.0 * t.sin()) as f32, (50.0 + 30.0 * t.cos()) as f32]
            }
        }
    }
}

/// Fixed-length routine timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GuidedRoutine {
    pub step_duration_ms: u64,
    /// Target refresh interval
    pub refresh_ms: u32,
}

impl Default for GuidedRoutine {
    fn default() -> Self {
        Self {
            step_duration_ms: 60_000,
            refresh_ms: 100,
        }
    }
}

impl GuidedRoutine {
    pub fn total_duration_ms(&self) -> u64 {
        self.step_duration_ms * GuidedStep::ALL.len() as u64
    }

    pub fn step_at(&self, elapsed_ms: u64) -> GuidedStep {
        GuidedStep::from_index((elapsed_ms / self.step_duration_ms.max(1)) as usize)
    }

    pub fn target_at(&self, elapsed_ms: u64) -> ExerciseTarget {
        let [x, y] = self.step_at(elapsed_ms).position(elapsed_ms);
        ExerciseTarget {
            x,
            y,
            size: TARGET_SIZE,
            color: TARGET_COLOR,
            duration_ms: self.refresh_ms,
        }
    }

    /// Percent complete, capped at 100.
    pub fn progress(&self, elapsed_ms: u64) -> f32 {
        let total = self.total_duration_ms().max(1);
        (elapsed_ms.min(total) as f64 / total as f64 * 100.0) as f32
    }

    pub fn remaining_ms(&self, elapsed_ms: u64) -> u64 {
        self.total_duration_ms().saturating_sub(elapsed_ms)
    }

    pub fn is_complete(&self, elapsed_ms: u64) -> bool {
        elapsed_ms >= self.total_duration_ms()
    }
}

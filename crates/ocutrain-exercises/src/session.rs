//! Exercise Session Clock
//!
//! Drives one exercise run on its own step clock, independent of the frame
//! cadence:
//! - Advances the step each time the current target's duration elapses
//! - Records gaze from the latest signal snapshot while running
//! - Stops on a [`StopPolicy`] and scores exactly once
//!
//! Cancel clears every buffer and target so a restart begins clean.

use ocutrain_signals::EyeData;
use serde::{Deserialize, Serialize};

use crate::config::ExerciseConfig;
use crate::patterns::ExercisePatternGenerator;
use crate::scorer::{ExerciseResult, ExerciseScorer, GazeRecorder};
use crate::target::{ExerciseKind, ExerciseTarget};

/// When a run ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "kebab-case")]
pub enum StopPolicy {
    /// One pass through the pattern
    #[default]
    OneCycle,
    /// Fixed number of steps
    Steps { count: usize },
    /// Fixed wall-clock duration
    Duration { ms: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// What the session shows after an update
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Idle,
    Active(ExerciseTarget),
    Completed(ExerciseResult),
    Cancelled,
}

pub struct ExerciseSession {
    kind: ExerciseKind,
    generator: ExercisePatternGenerator,
    scorer: ExerciseScorer,
    stop: StopPolicy,
    state: SessionState,
    started_at_ms: u64,
    step: usize,
    step_started_ms: u64,
    current_target: Option<ExerciseTarget>,
    recorder: GazeRecorder,
    latest_eye: Option<EyeData>,
    result: Option<ExerciseResult>,
}

impl ExerciseSession {
    pub fn new(config: &ExerciseConfig) -> Self {
        Self {
            kind: config.kind,
            generator: ExercisePatternGenerator::with_config(config),
            scorer: ExerciseScorer::new(),
            stop: config.stop,
            state: SessionState::Idle,
            started_at_ms: 0,
            step: 0,
            step_started_ms: 0,
            current_target: None,
            recorder: GazeRecorder::new(),
            latest_eye: None,
            result: None,
        }
    }

    /// Begin a fresh run at `now_ms`.
    pub fn start(&mut self, now_ms: u64) -> ExerciseTarget {
        self.clear();
        self.state = SessionState::Running;
        self.started_at_ms = now_ms;
        self.step_started_ms = now_ms;

        let target = self.generator.target(self.kind, 0, 0);
        self.current_target = Some(target);
        log::info!("exercise {} started ({:?})", self.kind, self.stop);
        target
    }

    /// Advance the step clock to `now_ms`.
    pub fn update(&mut self, now_ms: u64) -> SessionStatus {
        match self.state {
            SessionState::Idle => return SessionStatus::Idle,
            SessionState::Cancelled => return SessionStatus::Cancelled,
            SessionState::Completed => {
                return SessionStatus::Completed(self.result.unwrap_or_default())
            }
            SessionState::Running => {}
        }

        loop {
            let duration = self
                .current_target
                .map(|t| t.duration_ms as u64)
                .unwrap_or(1)
                .max(1);
            if now_ms.saturating_sub(self.step_started_ms) < duration {
                break;
            }
            self.step += 1;
            self.step_started_ms += duration;
            if self.stop_reached(self.step_started_ms) {
                return SessionStatus::Completed(self.finish());
            }
            let elapsed = self.step_started_ms - self.started_at_ms;
            self.current_target = Some(self.generator.target(self.kind, self.step, elapsed));
        }

        if self.stop_reached(now_ms) {
            return SessionStatus::Completed(self.finish());
        }

        let elapsed = now_ms.saturating_sub(self.started_at_ms);
        let target = self.generator.target(self.kind, self.step, elapsed);
        self.current_target = Some(target);
        SessionStatus::Active(target)
    }

    fn stop_reached(&self, now_ms: u64) -> bool {
        match self.stop {
            StopPolicy::OneCycle => self.step >= self.generator.sequence_len(self.kind),
            StopPolicy::Steps { count } => self.step >= count,
            StopPolicy::Duration { ms } => now_ms.saturating_sub(self.started_at_ms) >= ms,
        }
    }

    /// Snapshot the latest signal. `None` (face lost) drops the snapshot.
    pub fn observe(&mut self, eye: Option<&EyeData>, now_ms: u64) {
        if self.state != SessionState::Running {
            return;
        }
        match eye {
            Some(data) => {
                self.recorder.record_gaze(&data.gaze_direction, now_ms);
                self.latest_eye = Some(data.clone());
            }
            None => self.latest_eye = None,
        }
    }

    /// End the run and score it. Later calls return the same result.
    pub fn finish(&mut self) -> ExerciseResult {
        match self.state {
            SessionState::Completed => self.result.unwrap_or_default(),
            SessionState::Running => {
                let samples = self.recorder.take();
                let result = self.scorer.score(
                    &samples,
                    self.current_target.as_ref(),
                    self.latest_eye.as_ref(),
                );
                log::info!(
                    "exercise {} finished after {} steps: accuracy {:.2}, completed {}",
                    self.kind,
                    self.step,
                    result.accuracy,
                    result.completed
                );
                self.result = Some(result);
                self.state = SessionState::Completed;
                result
            }
            SessionState::Idle | SessionState::Cancelled => ExerciseResult::incomplete(),
        }
    }

    /// Abandon the run and clear all state. Safe to call repeatedly.
    pub fn cancel(&mut self) {
        if matches!(self.state, SessionState::Running | SessionState::Completed) {
            log::info!("exercise {} cancelled at step {}", self.kind, self.step);
        }
        self.clear();
        self.state = SessionState::Cancelled;
    }

    fn clear(&mut self) {
        self.recorder.clear();
        self.latest_eye = None;
        self.current_target = None;
        self.result = None;
        self.step = 0;
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn kind(&self) -> ExerciseKind {
        self.kind
    }

    /// Absolute step count since start (not wrapped)
    pub fn step(&self) -> usize {
        self.step
    }

    pub fn current_target(&self) -> Option<&ExerciseTarget> {
        self.current_target.as_ref()
    }

    pub fn result(&self) -> Option<&ExerciseResult> {
        self.result.as_ref()
    }

    pub fn recorder(&self) -> &GazeRecorder {
        &self.recorder
    }
}

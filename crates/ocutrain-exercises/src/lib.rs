//! # ocutrain-exercises
//!
//! Visual training exercises driven by eye-tracking signals.
//!
//! This crate provides:
//! - **Targets**: exercise kinds, pursuit sub-modes and on-screen stimuli
//! - **Patterns**: pure `(kind, step, elapsed) → target` generation
//! - **Scoring**: bounded gaze recording and end-of-run accuracy
//! - **Sessions**: step clock with stop policies and idempotent cancel
//! - **Guided routine**: the five-step look-up/down/left/right/circle drill
//! - **Config**: layered TOML session configuration
//!
//! ## Example
//!
//! ```ignore
//! use ocutrain_exercises::{ExerciseSession, SessionConfig, SessionStatus};
//! use ocutrain_signals::EyeTrackingPipeline;
//!
//! let config = SessionConfig::load_layered(None, Some(user_path))?;
//! let mut pipeline = EyeTrackingPipeline::with_config(config.tracker.clone());
//! let mut session = ExerciseSession::new(&config.exercise);
//!
//! session.start(now_ms);
//! // per frame
//! pipeline.tick(&mut detector, now_ms);
//! session.observe(pipeline.latest(), now_ms);
//! // per exercise timer tick
//! if let SessionStatus::Completed(result) = session.update(now_ms) {
//!     ui.show(result.to_json()?);
//! }
//! ```

pub mod config;
pub mod patterns;
pub mod routine;
pub mod scorer;
pub mod session;
pub mod target;

pub use config::{ExerciseConfig, SessionConfig};
pub use patterns::{ExercisePatternGenerator, PursuitParams};
pub use routine::{GuidedRoutine, GuidedStep};
pub use scorer::{ExerciseResult, ExerciseScorer, GazeRecorder, GazeSample};
pub use session::{ExerciseSession, SessionState, SessionStatus, StopPolicy};
pub use target::{
    ExerciseKind, ExerciseTarget, PursuitMode, Rgb, UnknownExerciseKind, UnknownPursuitMode,
};

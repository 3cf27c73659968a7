//! # ocutrain-signals
//!
//! Eye-tracking signal pipeline for amblyopia (lazy-eye) training.
//!
//! This crate provides:
//! - **Landmark ingestion**: pixel-space `LandmarkFrame` and the eye-contour mapping
//! - **Eye geometry**: per-eye center and openness ratio
//! - **Signals**: gaze direction, eye alignment, blink rate and position history
//! - **Deviation analysis**: persistent lazy-eye drift classification
//! - **Pipeline**: one serialized pass per frame with frame-drop backpressure
//!
//! ## Example
//!
//! ```ignore
//! use ocutrain_signals::{EyeTrackingPipeline, FrameOutcome, TrackerConfig};
//!
//! let mut pipeline = EyeTrackingPipeline::with_config(TrackerConfig::default());
//!
//! // Once per video frame, from whatever scheduler the host provides
//! match pipeline.tick(&mut detector, now_ms) {
//!     FrameOutcome::Signal(eye_data) => overlay.draw(&eye_data),
//!     FrameOutcome::NoFace => overlay.clear(),
//!     _ => {}
//! }
//! println!("lazy eye: {:?}", pipeline.classification());
//! ```

pub mod config;
pub mod deviation;
pub mod geometry;
pub mod history;
pub mod landmarks;
pub mod pipeline;
pub mod signals;

pub use config::{BlinkRateMode, ConfigError, DeviationConfig, FrameDims, TrackerConfig};
pub use deviation::{Classification, DeviationAnalyzer, LazyEye, Severity};
pub use geometry::{EyeGeometry, EyeGeometryExtractor, FaceGeometry};
pub use history::RingBuffer;
pub use landmarks::{EyeContour, LandmarkFrame};
pub use pipeline::{
    DetectionError, EyeTrackingPipeline, FrameOutcome, FrameScheduler, FrameTicket,
    LandmarkSource, PipelineStats,
};
pub use signals::{AlignmentQuality, EyeData, EyePoint, GazeVector, SignalComputer};

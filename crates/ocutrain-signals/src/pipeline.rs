//! Eye-Tracking Pipeline
//!
//! Per-frame orchestration from landmark detection to therapeutic signals:
//! - Frame scheduling with drop-on-busy backpressure
//! - Landmark source integration (pluggable)
//! - Geometry → signals → drift classification
//!
//! One frame is processed at a time. A tick that arrives while a detection is
//! still in flight is dropped rather than queued, and a detection that
//! outlives `detection_timeout_ms` is abandoned so its late result cannot
//! overwrite newer state.

use serde::Serialize;
use thiserror::Error;

use crate::config::TrackerConfig;
use crate::deviation::{Classification, DeviationAnalyzer};
use crate::geometry::EyeGeometryExtractor;
use crate::landmarks::LandmarkFrame;
use crate::signals::{EyeData, SignalComputer};

/// Landmark detector failure. Never fatal: the pipeline treats it as a miss.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DetectionError {
    #[error("landmark backend error: {0}")]
    Backend(String),
    #[error("landmark detection timed out")]
    Timeout,
}

/// Pluggable landmark detector
///
/// Implementations wrap the face-mesh model. `Ok(None)` means no face in the
/// frame.
pub trait LandmarkSource: Send {
    /// Detect landmarks for the current video frame, in pixel space.
    fn detect(&mut self) -> Result<Option<LandmarkFrame>, DetectionError>;
}

/// What one tick produced
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// Face found, signals computed
    Signal(EyeData),
    /// No face (or detector failure); overlays should clear
    NoFace,
    /// Tick skipped because a detection was still in flight
    Dropped,
    /// Result arrived for an abandoned detection and was ignored
    Stale,
}

impl FrameOutcome {
    pub fn eye_data(&self) -> Option<&EyeData> {
        match self {
            FrameOutcome::Signal(data) => Some(data),
            _ => None,
        }
    }
}

/// Handle for one in-flight detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTicket {
    id: u64,
    issued_at_ms: u64,
}

impl FrameTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn issued_at_ms(&self) -> u64 {
        self.issued_at_ms
    }
}

/// Issues at most one outstanding frame ticket.
#[derive(Debug, Clone)]
pub struct FrameScheduler {
    timeout_ms: u64,
    next_id: u64,
    in_flight: Option<FrameTicket>,
}

impl FrameScheduler {
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            timeout_ms,
            next_id: 0,
            in_flight: None,
        }
    }

    /// Abandon the in-flight detection if it has outlived the timeout.
    ///
    /// Returns the abandoned ticket.
    pub fn expire(&mut self, now_ms: u64) -> Option<FrameTicket> {
        match self.in_flight {
            Some(ticket) if now_ms.saturating_sub(ticket.issued_at_ms) >= self.timeout_ms => {
                self.in_flight = None;
                Some(ticket)
            }
            _ => None,
        }
    }

    /// Start a detection, or `None` if one is already in flight.
    pub fn try_begin(&mut self, now_ms: u64) -> Option<FrameTicket> {
        if self.in_flight.is_some() {
            return None;
        }
        let ticket = FrameTicket {
            id: self.next_id,
            issued_at_ms: now_ms,
        };
        self.next_id += 1;
        self.in_flight = Some(ticket);
        Some(ticket)
    }

    /// Close a detection. `false` if the ticket is no longer current.
    pub fn complete(&mut self, ticket: FrameTicket) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            true
        } else {
            false
        }
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn reset(&mut self) {
        self.in_flight = None;
    }
}

/// Frame counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    /// Frames that produced signals
    pub frames_processed: u64,
    /// Ticks skipped while a detection was in flight
    pub frames_dropped: u64,
    /// Frames with no face or a detector failure
    pub frames_missed: u64,
    /// Detections abandoned after the timeout
    pub detections_timed_out: u64,
    /// Late results ignored
    pub stale_results: u64,
}

impl PipelineStats {
    /// Fraction of ticks that were dropped (0-1)
    pub fn drop_rate(&self) -> f32 {
        let total = self.frames_processed + self.frames_dropped + self.frames_missed;
        if total == 0 {
            0.0
        } else {
            self.frames_dropped as f32 / total as f32
        }
    }
}

/// Eye-Tracking Pipeline
///
/// Owns every history buffer; constructed once per session and reset on
/// cleanup.
pub struct EyeTrackingPipeline {
    config: TrackerConfig,
    extractor: EyeGeometryExtractor,
    signals: SignalComputer,
    deviation: DeviationAnalyzer,
    scheduler: FrameScheduler,
    latest: Option<EyeData>,
    stats: PipelineStats,
}

impl EyeTrackingPipeline {
    pub fn new() -> Self {
        Self::with_config(TrackerConfig::default())
    }

    pub fn with_config(config: TrackerConfig) -> Self {
        Self {
            extractor: EyeGeometryExtractor::new(),
            signals: SignalComputer::with_config(&config),
            deviation: DeviationAnalyzer::with_config(config.deviation.clone()),
            scheduler: FrameScheduler::new(config.detection_timeout_ms),
            latest: None,
            stats: PipelineStats::default(),
            config,
        }
    }

    /// Run one full tick against a synchronous source.
    pub fn tick(&mut self, source: &mut dyn LandmarkSource, now_ms: u64) -> FrameOutcome {
        match self.begin_frame(now_ms) {
            Some(ticket) => {
                let result = source.detect();
                self.finish_frame(ticket, result)
            }
            None => FrameOutcome::Dropped,
        }
    }

    /// Request a ticket for a new detection.
    ///
    /// `None` means the tick is dropped.
    pub fn begin_frame(&mut self, now_ms: u64) -> Option<FrameTicket> {
        if let Some(abandoned) = self.scheduler.expire(now_ms) {
            self.stats.detections_timed_out += 1;
            log::warn!(
                "landmark detection {} timed out after {} ms, abandoning",
                abandoned.id,
                now_ms.saturating_sub(abandoned.issued_at_ms)
            );
        }

        let ticket = self.scheduler.try_begin(now_ms);
        if ticket.is_none() {
            self.stats.frames_dropped += 1;
            log::debug!("detection in flight, dropping frame at {} ms", now_ms);
        }
        ticket
    }

    /// Deliver a detection result for a ticket from [`Self::begin_frame`].
    pub fn finish_frame(
        &mut self,
        ticket: FrameTicket,
        result: Result<Option<LandmarkFrame>, DetectionError>,
    ) -> FrameOutcome {
        if !self.scheduler.complete(ticket) {
            self.stats.stale_results += 1;
            log::debug!("ignoring stale detection result {}", ticket.id);
            return FrameOutcome::Stale;
        }

        match result {
            Ok(frame) => self.process(frame.as_ref()),
            Err(err) => {
                match err {
                    DetectionError::Timeout => log::warn!("{}", err),
                    DetectionError::Backend(_) => log::debug!("{}", err),
                }
                self.process(None)
            }
        }
    }

    /// Single processing pass for one frame's landmarks.
    pub fn process(&mut self, frame: Option<&LandmarkFrame>) -> FrameOutcome {
        let face = frame.and_then(|f| self.extractor.extract(f));

        let Some(face) = face else {
            self.handle_face_lost();
            return FrameOutcome::NoFace;
        };

        let data = self.signals.compute(&face);
        self.deviation.observe(&data, &face);
        self.stats.frames_processed += 1;
        self.latest = Some(data.clone());
        FrameOutcome::Signal(data)
    }

    fn handle_face_lost(&mut self) {
        self.stats.frames_missed += 1;
        self.latest = None;
        if self.config.clear_history_on_face_lost {
            self.signals.reset();
            self.deviation.reset();
        }
        log::debug!("no face this frame");
    }

    /// Most recent snapshot, `None` after a miss.
    pub fn latest(&self) -> Option<&EyeData> {
        self.latest.as_ref()
    }

    pub fn classification(&self) -> Classification {
        self.deviation.classification()
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    pub fn signals(&self) -> &SignalComputer {
        &self.signals
    }

    pub fn deviation(&self) -> &DeviationAnalyzer {
        &self.deviation
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Update the effective capture rate used for blink-rate scaling.
    pub fn set_sampling_fps(&mut self, fps: f32) {
        self.signals.set_sampling_fps(fps);
    }

    /// Reset pipeline state
    pub fn reset(&mut self) {
        self.signals.reset();
        self.deviation.reset();
        self.scheduler.reset();
        self.latest = None;
        self.stats = PipelineStats::default();
    }
}

impl Default for EyeTrackingPipeline {
    fn default() -> Self {
        Self::new()
    }
}

//! Exercise Pattern Generator
//!
//! Deterministic stimulus sequences for visual training:
//! - **saccades**: five fixation points (four corners at 20/80%, then center)
//! - **smooth-pursuit**: continuous figure-eight or circular path
//! - **convergence**: central target shrinking 50 → 15 over four steps
//! - **binocular**: four off-center points
//!
//! `target(kind, step, elapsed_ms)` is a pure function. Steps wrap modulo the
//! pattern length so a sequence loops until the caller stops it.

use crate::config::ExerciseConfig;
use crate::target::{ExerciseKind, ExerciseTarget, PursuitMode, Rgb};

const SACCADE_POINTS: [([f32; 2], Rgb); 5] = [
    ([20.0, 20.0], Rgb::from_hex(0x3B82F6)),
    ([80.0, 20.0], Rgb::from_hex(0xEF4444)),
    ([20.0, 80.0], Rgb::from_hex(0x10B981)),
    ([80.0, 80.0], Rgb::from_hex(0xF59E0B)),
    ([50.0, 50.0], Rgb::from_hex(0x8B5CF6)),
];
const SACCADE_SIZE: f32 = 30.0;
const SACCADE_DURATION_MS: u32 = 1000;

const PURSUIT_SIZE: f32 = 25.0;
const PURSUIT_COLOR: Rgb = Rgb::from_hex(0x06B6D4);

const CONVERGENCE_SIZES: [f32; 4] = [50.0, 30.0, 20.0, 15.0];
const CONVERGENCE_COLOR: Rgb = Rgb::from_hex(0xDC2626);
const CONVERGENCE_DURATION_MS: u32 = 2000;

const BINOCULAR_POINTS: [[f32; 2]; 4] = [[30.0, 50.0], [70.0, 50.0], [50.0, 30.0], [50.0, 70.0]];
const BINOCULAR_SIZE: f32 = 25.0;
const BINOCULAR_COLOR: Rgb = Rgb::from_hex(0x7C3AED);
const BINOCULAR_DURATION_MS: u32 = 1500;

/// Smooth-pursuit path parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PursuitParams {
    pub mode: PursuitMode,
    /// rad/s
    pub angular_speed: f32,
    pub refresh_ms: u32,
    pub run_ms: u32,
}

impl Default for PursuitParams {
    fn default() -> Self {
        Self::from(&ExerciseConfig::default())
    }
}

impl From<&ExerciseConfig> for PursuitParams {
    fn from(config: &ExerciseConfig) -> Self {
        Self {
            mode: config.pursuit_mode,
            angular_speed: config.pursuit_angular_speed,
            refresh_ms: config.pursuit_refresh_ms,
            run_ms: config.pursuit_run_ms,
        }
    }
}

/// Stateless target generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ExercisePatternGenerator {
    pursuit: PursuitParams,
}

impl ExercisePatternGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ExerciseConfig) -> Self {
        Self {
            pursuit: PursuitParams::from(config),
        }
    }

    pub fn pursuit(&self) -> PursuitParams {
        self.pursuit
    }

    /// Number of distinct steps before the pattern repeats.
    pub fn sequence_len(&self, kind: ExerciseKind) -> usize {
        match kind {
            ExerciseKind::Saccades => SACCADE_POINTS.len(),
            ExerciseKind::SmoothPursuit => {
                (self.pursuit.run_ms / self.pursuit.refresh_ms.max(1)).max(1) as usize
            }
            ExerciseKind::Convergence => CONVERGENCE_SIZES.len(),
            ExerciseKind::Binocular => BINOCULAR_POINTS.len(),
        }
    }

    /// Duration of one full cycle (ms).
    pub fn cycle_duration_ms(&self, kind: ExerciseKind) -> u64 {
        (0..self.sequence_len(kind))
            .map(|step| self.target(kind, step, 0).duration_ms as u64)
            .sum()
    }

    /// Target for `step` at `elapsed_ms` since the exercise started.
    ///
    /// Only smooth pursuit depends on `elapsed_ms`; the stepped patterns
    /// depend only on `step`.
    pub fn target(&self, kind: ExerciseKind, step: usize, elapsed_ms: u64) -> ExerciseTarget {
        let step = step % self.sequence_len(kind);
        match kind {
            ExerciseKind::Saccades => {
                let ([x, y], color) = SACCADE_POINTS[step];
                ExerciseTarget {
                    x,
                    y,
                    size: SACCADE_SIZE,
                    color,
                    duration_ms: SACCADE_DURATION_MS,
                }
            }
            ExerciseKind::SmoothPursuit => {
                let [x, y] = self.pursuit_position(elapsed_ms);
                ExerciseTarget {
                    x,
                    y,
                    size: PURSUIT_SIZE,
                    color: PURSUIT_COLOR,
                    duration_ms: self.pursuit.refresh_ms,
                }
            }
            ExerciseKind::Convergence => ExerciseTarget {
                x: 50.0,
                y: 50.0,
                size: CONVERGENCE_SIZES[step],
                color: CONVERGENCE_COLOR,
                duration_ms: CONVERGENCE_DURATION_MS,
            },
            ExerciseKind::Binocular => {
                let [x, y] = BINOCULAR_POINTS[step];
                ExerciseTarget {
                    x,
                    y,
                    size: BINOCULAR_SIZE,
                    color: BINOCULAR_COLOR,
                    duration_ms: BINOCULAR_DURATION_MS,
                }
            }
        }
    }

    /// Pursuit position in percent at `elapsed_ms`.
    ///
    /// The figure-eight runs at the configured angular speed; the circle
    /// takes `t` in seconds.
    pub fn pursuit_position(&self, elapsed_ms: u64) -> [f32; 2] {
        let t = elapsed_ms as f64 / 1000.0;
        let (x, y) = match self.pursuit.mode {
            PursuitMode::FigureEight => {
                let phase = self.pursuit.angular_speed as f64 * t;
                (50.0 + 30.0 * phase.sin(), 50.0 + 20.0 * (2.0 * phase).sin())
            }
            PursuitMode::Circular => (50.0 + 30.0 * t.sin(), 50.0 + 30.0 * t.cos()),
        };
        [x as f32, y as f32]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn generator(mode: PursuitMode) -> ExercisePatternGenerator {
        let config = ExerciseConfig {
            pursuit_mode: mode,
            ..ExerciseConfig::default()
        };
        ExercisePatternGenerator::with_config(&config)
    }

    #[test]
    fn test_saccade_sequence() {
        let gen = ExercisePatternGenerator::new();
        let positions: Vec<[f32; 2]> = (0..5)
            .map(|step| {
                let t = gen.target(ExerciseKind::Saccades, step, 0);
                [t.x, t.y]
            })
            .collect();
        assert_eq!(
            positions,
            vec![[20.0, 20.0], [80.0, 20.0], [20.0, 80.0], [80.0, 80.0], [50.0, 50.0]]
        );
        assert_eq!(gen.target(ExerciseKind::Saccades, 0, 0).duration_ms, 1000);
    }

    #[test]
    fn test_steps_wrap() {
        let gen = ExercisePatternGenerator::new();
        assert_eq!(
            gen.target(ExerciseKind::Saccades, 7, 123),
            gen.target(ExerciseKind::Saccades, 2, 0)
        );
        assert_eq!(
            gen.target(ExerciseKind::Binocular, 5, 0),
            gen.target(ExerciseKind::Binocular, 1, 0)
        );
    }

    #[test]
    fn test_convergence_shrinks_at_center() {
        let gen = ExercisePatternGenerator::new();
        let sizes: Vec<f32> = (0..4)
            .map(|step| {
                let t = gen.target(ExerciseKind::Convergence, step, 0);
                assert_eq!((t.x, t.y), (50.0, 50.0));
                assert_eq!(t.duration_ms, 2000);
                t.size
            })
            .collect();
        assert_eq!(sizes, vec![50.0, 30.0, 20.0, 15.0]);
    }

    #[test]
    fn test_figure_eight_path() {
        let gen = generator(PursuitMode::FigureEight);
        assert_eq!(gen.pursuit_position(0), [50.0, 50.0]);

        // ωt = π/2 at ω = 0.6 rad/s
        let quarter_ms = (std::f64::consts::FRAC_PI_2 / 0.6 * 1000.0).round() as u64;
        let [x, y] = gen.pursuit_position(quarter_ms);
        assert_relative_eq!(x, 80.0, epsilon = 1e-2);
        assert_relative_eq!(y, 50.0, epsilon = 1e-2);
    }

    #[test]
    fn test_circular_path() {
        let gen = generator(PursuitMode::Circular);
        assert_eq!(gen.pursuit_position(0), [50.0, 80.0]);

        // t = π/2 s, independent of the figure-eight angular speed
        let quarter_ms = (std::f64::consts::FRAC_PI_2 * 1000.0).round() as u64;
        let [x, y] = gen.pursuit_position(quarter_ms);
        assert_relative_eq!(x, 80.0, epsilon = 1e-2);
        assert_relative_eq!(y, 50.0, epsilon = 1e-2);

        let [x, y] = gen.pursuit_position((std::f64::consts::PI * 1000.0).round() as u64);
        assert_relative_eq!(x, 50.0, epsilon = 1e-2);
        assert_relative_eq!(y, 20.0, epsilon = 1e-2);
    }

    #[test]
    fn test_pursuit_sequence_covers_run() {
        let gen = ExercisePatternGenerator::new();
        assert_eq!(gen.sequence_len(ExerciseKind::SmoothPursuit), 100);
        assert_eq!(gen.cycle_duration_ms(ExerciseKind::SmoothPursuit), 10_000);
        assert_eq!(gen.cycle_duration_ms(ExerciseKind::Binocular), 6_000);
    }

    proptest! {
        #[test]
        fn test_target_is_pure(
            kind_idx in 0usize..4,
            step in 0usize..10_000,
            elapsed in 0u64..10_000_000,
        ) {
            let kind = ExerciseKind::ALL[kind_idx];
            let gen = ExercisePatternGenerator::new();
            prop_assert_eq!(gen.target(kind, step, elapsed), gen.target(kind, step, elapsed));
        }

        #[test]
        fn test_targets_stay_on_screen(
            kind_idx in 0usize..4,
            step in 0usize..1_000,
            elapsed in 0u64..10_000_000,
        ) {
            let kind = ExerciseKind::ALL[kind_idx];
            let t = ExercisePatternGenerator::new().target(kind, step, elapsed);
            prop_assert!((0.0..=100.0).contains(&t.x));
            prop_assert!((0.0..=100.0).contains(&t.y));
            prop_assert!(t.duration_ms > 0);
        }
    }
}

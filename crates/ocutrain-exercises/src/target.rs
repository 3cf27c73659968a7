//! Exercise target model

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Visual training exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExerciseKind {
    /// Fast jumps between fixed fixation points
    #[default]
    Saccades,
    /// Continuous tracking of a moving target
    SmoothPursuit,
    /// Shrinking central target for near/far focus
    Convergence,
    /// Coordinated movement between off-center points
    Binocular,
}

impl ExerciseKind {
    pub const ALL: [ExerciseKind; 4] = [
        ExerciseKind::Saccades,
        ExerciseKind::SmoothPursuit,
        ExerciseKind::Convergence,
        ExerciseKind::Binocular,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExerciseKind::Saccades => "saccades",
            ExerciseKind::SmoothPursuit => "smooth-pursuit",
            ExerciseKind::Convergence => "convergence",
            ExerciseKind::Binocular => "binocular",
        }
    }
}

impl fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown exercise kind: {0}")]
pub struct UnknownExerciseKind(pub String);

impl FromStr for ExerciseKind {
    type Err = UnknownExerciseKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExerciseKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownExerciseKind(s.to_string()))
    }
}

/// Smooth-pursuit path shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PursuitMode {
    /// `x = 50 + 30·sin(ωt)`, `y = 50 + 20·sin(2ωt)`
    #[default]
    FigureEight,
    /// `x = 50 + 30·sin(t)`, `y = 50 + 30·cos(t)`, `t` in seconds
    Circular,
}

impl PursuitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            PursuitMode::FigureEight => "figure-eight",
            PursuitMode::Circular => "circular",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown pursuit mode: {0}")]
pub struct UnknownPursuitMode(pub String);

impl FromStr for PursuitMode {
    type Err = UnknownPursuitMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [PursuitMode::FigureEight, PursuitMode::Circular]
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| UnknownPursuitMode(s.to_string()))
    }
}

/// Target colour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// From a `0xRRGGBB` literal
    pub const fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xFF) as u8,
            g: ((hex >> 8) & 0xFF) as u8,
            b: (hex & 0xFF) as u8,
        }
    }

    /// CSS-style `#RRGGBB`
    pub fn to_hex_string(&self) -> String {
        format!("#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// On-screen stimulus. Position is in percent of the exercise area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseTarget {
    /// 0-100
    pub x: f32,
    /// 0-100
    pub y: f32,
    pub size: f32,
    pub color: Rgb,
    pub duration_ms: u32,
}

impl ExerciseTarget {
    /// Position remapped from percent space to the [-1, 1] gaze space.
    pub fn normalized(&self) -> [f32; 2] {
        [(self.x - 50.0) / 50.0, (self.y - 50.0) / 50.0]
    }
}

//! Optotype vocabulary -- directions, eyes and viewing distances.
//!
//! # Serialization
//!
//! All three enums serialize as lowercase strings (`"up"`, `"right"`,
//! `"3m"`, ...). These strings are what the result store writes to disk and
//! what the CLI accepts, so they are part of the on-disk format. Do not
//! rename variants without a migration.
//!
//! # Parsing
//!
//! [`Direction`], [`Eye`] and [`DistanceCategory`] implement [`FromStr`].
//! Parsing is the only place a raw value from an input channel can be
//! rejected; once a typed [`Direction`] exists it is always one of the four
//! cardinal directions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// Direction
// ---------------------------------------------------------------------------

/// Orientation of the Landolt C gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// All four directions in a fixed order. Index into this with a uniform
    /// random value to draw a target.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Next direction clockwise. Used by the simulated observer to produce a
    /// wrong answer that is guaranteed to differ from the target.
    pub fn clockwise(&self) -> Direction {
        match self {
            Direction::Up => Direction::Right,
            Direction::Right => Direction::Down,
            Direction::Down => Direction::Left,
            Direction::Left => Direction::Up,
        }
    }

    /// Unit vector of the gap in screen coordinates (y grows downward).
    pub fn unit_vector(&self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = ParseDirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" => Ok(Direction::Up),
            "down" | "d" => Ok(Direction::Down),
            "left" | "l" => Ok(Direction::Left),
            "right" | "r" => Ok(Direction::Right),
            _ => Err(ParseDirectionError {
                input: s.to_string(),
            }),
        }
    }
}

/// Error returned when a raw value is not one of the four directions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDirectionError {
    /// The rejected input.
    pub input: String,
}

impl fmt::Display for ParseDirectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid direction {:?} (expected up, down, left, or right)",
            self.input
        )
    }
}

impl std::error::Error for ParseDirectionError {}

// ---------------------------------------------------------------------------
// Eye
// ---------------------------------------------------------------------------

/// Which eye is under test. A session always tests right, then left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Eye {
    Right,
    Left,
}

impl Eye {
    pub fn as_str(&self) -> &'static str {
        match self {
            Eye::Right => "right",
            Eye::Left => "left",
        }
    }
}

impl fmt::Display for Eye {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Eye {
    type Err = ParseEyeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "right" | "r" => Ok(Eye::Right),
            "left" | "l" => Ok(Eye::Left),
            _ => Err(ParseEyeError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid eye string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEyeError(pub String);

impl fmt::Display for ParseEyeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid eye: {:?} (expected right or left)", self.0)
    }
}

impl std::error::Error for ParseEyeError {}

// ---------------------------------------------------------------------------
// DistanceCategory
// ---------------------------------------------------------------------------

/// Viewing distance between the subject and the display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DistanceCategory {
    /// Arm's length, phone or laptop held in hand.
    #[serde(rename = "30cm")]
    #[default]
    Near30Cm,
    /// Across a room.
    #[serde(rename = "3m")]
    Far3M,
}

impl DistanceCategory {
    /// Viewing distance in meters.
    pub fn meters(&self) -> f64 {
        match self {
            DistanceCategory::Near30Cm => 0.3,
            DistanceCategory::Far3M => 3.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceCategory::Near30Cm => "30cm",
            DistanceCategory::Far3M => "3m",
        }
    }
}

impl fmt::Display for DistanceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DistanceCategory {
    type Err = ParseDistanceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "30cm" | "0.3m" | "near" => Ok(DistanceCategory::Near30Cm),
            "3m" | "300cm" | "far" => Ok(DistanceCategory::Far3M),
            _ => Err(ParseDistanceError(s.to_string())),
        }
    }
}

/// Error returned when parsing an invalid distance category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseDistanceError(pub String);

impl fmt::Display for ParseDistanceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid distance: {:?} (expected 30cm or 3m)", self.0)
    }
}

impl std::error::Error for ParseDistanceError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

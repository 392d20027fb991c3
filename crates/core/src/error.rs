//! Errors raised while building level sets

use crate::core_types::Real;

/// Errors that can occur while constructing a level set
#[derive(Debug, Clone, PartialEq)]
pub enum LevelSetError {
    /// The exact geometry reported itself as invalid
    InvalidGeometry(String),
    /// Data spacing must be finite and positive
    InvalidSpacing(Real),
    /// Buffer width must be at least one cell
    InvalidBufferWidth(usize),
    /// The kernel has no normalization for this dimension
    UnsupportedDimension(usize),
    /// A multi-level set needs at least one level
    NoLevels,
    /// Resolution ratios must strictly increase from coarse to fine
    UnorderedLevels {
        /// Index of the offending level
        level: usize,
        /// Its resolution ratio
        ratio: Real,
        /// Resolution ratio of the level before it
        previous: Real,
    },
}

impl std::fmt::Display for LevelSetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LevelSetError::InvalidGeometry(msg) => write!(f, "Invalid geometry: {msg}"),
            LevelSetError::InvalidSpacing(spacing) => {
                write!(f, "Data spacing must be finite and positive, got {spacing}")
            }
            LevelSetError::InvalidBufferWidth(width) => {
                write!(f, "Buffer width must be at least 1 cell, got {width}")
            }
            LevelSetError::UnsupportedDimension(dim) => {
                write!(f, "No kernel normalization for {dim} dimensions")
            }
            LevelSetError::NoLevels => write!(f, "Multi-level set needs at least one level"),
            LevelSetError::UnorderedLevels {
                level,
                ratio,
                previous,
            } => write!(
                f,
                "Level {level} has resolution ratio {ratio}, not above previous level's {previous}"
            ),
        }
    }
}

impl std::error::Error for LevelSetError {}

//! Error types for mirrors.

use bevy_math::Vec3;
use thiserror::Error;

/// Errors reported by the fallible parts of the mirror pipeline.
///
/// None of them are fatal, systems log them and carry on with the next frame.
#[derive(Error, Debug)]
pub enum MirrorError {
    /// The plane probe hit nothing, the mirror's collision geometry does not match
    /// its rendered position.
    #[error("mirror plane probe from {start} to {end} hit nothing, is the mirror collider aligned with its mesh?")]
    NoProbeHit { start: Vec3, end: Vec3 },

    #[error("unknown console command '{0}'")]
    UnknownCommand(String),

    #[error("console command '{0}' expects a boolean argument")]
    MissingArgument(String),

    #[error("'{0}' is not a valid toggle value, expected 0/1, true/false or on/off")]
    InvalidToggle(String),

    /// A replicated mirror snapshot carries a rotation that can't be normalized.
    #[error("mirror snapshot rotation {0:?} is not a valid orientation")]
    InvalidRotation([f32; 4]),

    /// A replicated mirror snapshot could not be encoded or decoded.
    #[error("mirror snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

/// A specialized Result type for mirror operations.
pub type Result<T> = std::result::Result<T, MirrorError>;

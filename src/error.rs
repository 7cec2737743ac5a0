//! Error types
//!
//! Only setup failures are allowed to abort. Everything else is logged and
//! degrades (missing level, bad sprite payload).

use thiserror::Error;

use crate::renderer::assets::SpriteId;

/// The level provider has no level with this number
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("level {0} is not defined")]
    NotFound(u32),
}

/// Irrecoverable startup failures (window, canvas, GPU surface)
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("no browser window available")]
    NoWindow,
    #[error("canvas element `{0}` not found")]
    NoCanvas(String),
    #[error("failed to create rendering surface: {0}")]
    Surface(String),
    #[error("no compatible GPU adapter")]
    Adapter,
    #[error("failed to create GPU device: {0}")]
    Device(String),
}

/// Sprite payload problems reported to the asset registry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssetError {
    #[error("sprite {id:?} could not be decoded: {reason}")]
    Decode { id: SpriteId, reason: String },
}

//! Error types: [`TileError`], [`HardwareError`], [`TileFault`].

use std::fmt;
use std::io;

use crate::geom::{MatrixSize, Range};
use crate::manager::TileId;

/// A failure reported by a hardware matrix, usually while flushing.
#[derive(Debug)]
pub struct HardwareError {
    message: String,
    source: Option<io::Error>,
}

impl HardwareError {
    /// An error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// An error caused by an I/O failure.
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            message: message.into(),
            source: Some(source),
        }
    }

    /// The operation is not supported by this matrix type.
    pub fn unsupported(what: &str) -> Self {
        Self::new(format!("{what} is not supported by this matrix"))
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for HardwareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(e) => write!(f, "{}: {e}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

impl std::error::Error for HardwareError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl From<io::Error> for HardwareError {
    fn from(e: io::Error) -> Self {
        Self::io("hardware I/O failed", e)
    }
}

/// A tile's redraw or data hook failed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileFault(String);

impl TileFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }

    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TileFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tile fault: {}", self.0)
    }
}

impl std::error::Error for TileFault {}

/// Errors raised by the tile manager.
#[derive(Debug)]
pub enum TileError {
    /// A size was not positive or a position was negative.
    InvalidGeometry(String),
    /// A placement does not fit inside the matrix.
    OutOfBounds { placement: Range, matrix: MatrixSize },
    /// A placement overlaps an existing tile while overlap is rejected.
    OverlapRejected { placement: Range, existing: TileId },
    /// The tile handle is already registered with this manager.
    AlreadyRegistered(TileId),
    /// No tile with this id is registered.
    UnknownTile(TileId),
    /// A frame rate that is not a positive, finite number.
    InvalidFrameRate(f64),
    /// The hardware flush failed.
    Hardware(HardwareError),
    /// A single tile failed while drawing or taking data.
    Tile { id: TileId, fault: TileFault },
    /// The animation thread could not be spawned.
    Scheduler(io::Error),
}

impl fmt::Display for TileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidGeometry(s) => write!(f, "invalid geometry: {s}"),
            Self::OutOfBounds { placement, matrix } => {
                write!(f, "placement {placement} does not fit a {matrix} matrix")
            }
            Self::OverlapRejected {
                placement,
                existing,
            } => write!(f, "placement {placement} overlaps tile {existing}"),
            Self::AlreadyRegistered(id) => write!(f, "tile is already registered as {id}"),
            Self::UnknownTile(id) => write!(f, "no tile registered as {id}"),
            Self::InvalidFrameRate(fps) => write!(f, "invalid frame rate {fps}"),
            Self::Hardware(e) => write!(f, "hardware error: {e}"),
            Self::Tile { id, fault } => write!(f, "tile {id}: {fault}"),
            Self::Scheduler(e) => write!(f, "failed to start animation thread: {e}"),
        }
    }
}

impl std::error::Error for TileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Hardware(e) => Some(e),
            Self::Tile { fault, .. } => Some(fault),
            Self::Scheduler(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HardwareError> for TileError {
    fn from(e: HardwareError) -> Self {
        Self::Hardware(e)
    }
}

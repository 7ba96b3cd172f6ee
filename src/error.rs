//! Error type shared by every engine operation.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no pieces to search; add some pieces first")]
    NoPieces,

    #[error("board dimensions must be positive, got {width}x{height}")]
    EmptyBoard { width: usize, height: usize },

    #[error("board {width}x{height} has more cells than can be addressed")]
    BoardTooLarge { width: usize, height: usize },

    #[error("board dimensions {width}x{height} must be between {min}x{min} and {max}x{max}")]
    BoardOutOfRange {
        width: usize,
        height: usize,
        min: usize,
        max: usize,
    },

    #[error("invalid piece shape: {0}")]
    InvalidShape(String),

    #[error("piece {index} cannot sit at ({x}, {y}): out of bounds or overlapping")]
    InvalidPlacement { index: usize, x: i32, y: i32 },

    #[error("too many pieces: {count} (at most {max})")]
    TooManyPieces { count: usize, max: usize },

    #[error("state key has {found} cells, board has {expected}")]
    KeyLength { expected: usize, found: usize },

    #[error("malformed state key: {0}")]
    MalformedKey(String),

    #[error("aggregation chunk size must be at least 1")]
    ZeroChunkSize,

    #[error("state {0} has no layout position")]
    Unpositioned(String),

    #[error("unknown preset {0}")]
    UnknownPreset(String),

    #[error("unknown layout {0}")]
    UnknownLayout(String),

    #[error("corrupt state space file: {0}")]
    CorruptFile(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

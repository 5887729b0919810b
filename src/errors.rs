use thiserror::Error;

/// Reasons a FEN record can be rejected.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    MissingFields(usize),
    #[error("malformed piece placement field: {0}")]
    InvalidPlacement(String),
    #[error("piece placement does not describe 64 squares")]
    WrongSquareCount,
    #[error("invalid side to move: {0}")]
    InvalidSideToMove(String),
    #[error("invalid en passant square: {0}")]
    InvalidEnPassant(String),
    #[error("invalid clock field: {0}")]
    InvalidClock(String),
}

/// Reasons a coordinate-notation move can be rejected against a
/// position.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MoveError {
    /// The string is not well formed coordinate notation.
    #[error("malformed move: {0}")]
    Malformed(String),
    /// The move parses but is not legal in the current position.
    #[error("illegal move: {0}")]
    Illegal(String),
}

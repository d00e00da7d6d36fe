use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("validation error: {0}")]
    Validation(String),
    #[error("malformed position {0:?}: expected a row letter followed by a 1-based column")]
    MalformedPosition(String),
    #[error("unknown rack {0:?}")]
    UnknownRack(String),
    #[error("position {position} is outside rack {rack:?} ({rows} rows x {columns} columns)")]
    OutOfBounds { rack: String, position: String, rows: u8, columns: u16 },
}

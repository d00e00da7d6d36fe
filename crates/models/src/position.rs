//! Grid coordinates inside a rack.
//!
//! A position is written as a row letter followed by a 1-based column,
//! e.g. `A1` or `P5`. Rows are limited to the 26 letters of the alphabet.

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::ModelError;

/// Highest number of rows a rack can declare (`A` through `Z`).
pub const MAX_ROWS: u8 = 26;

/// A cell address: zero-based row index plus one-based column.
///
/// Ordering is row-major, so `A2 < A10 < B1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    row: u8,
    column: u16,
}

impl Position {
    /// Build a position from a zero-based row index and a one-based column.
    pub fn new(row: u8, column: u16) -> Result<Self, ModelError> {
        if row >= MAX_ROWS || column == 0 {
            return Err(ModelError::MalformedPosition(format!("row {row}, column {column}")));
        }
        Ok(Self { row, column })
    }

    /// Zero-based row index (`A` is 0).
    pub fn row(&self) -> u8 { self.row }

    /// One-based column number.
    pub fn column(&self) -> u16 { self.column }

    pub fn row_letter(&self) -> char {
        char::from(b'A' + self.row)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.row_letter(), self.column)
    }
}

impl FromStr for Position {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ModelError::MalformedPosition(s.to_string());

        let mut chars = s.chars();
        let letter = chars.next().ok_or_else(malformed)?.to_ascii_uppercase();
        if !letter.is_ascii_uppercase() {
            return Err(malformed());
        }
        let digits = chars.as_str();
        // Canonical form only: no sign, no leading zero.
        if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let column: u16 = digits.parse().map_err(|_| malformed())?;
        let row = letter as u8 - b'A';
        Position::new(row, column).map_err(|_| malformed())
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Position {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

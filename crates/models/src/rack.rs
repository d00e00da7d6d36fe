//! Static rack geometry.
//!
//! Racks and their dimensions are fixed at deployment time; the stored
//! document never adds or resizes racks.

use serde::{Deserialize, Serialize};

use crate::errors::ModelError;
use crate::position::{Position, MAX_ROWS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RackSpec {
    pub name: String,
    pub rows: u8,
    pub columns: u16,
}

impl RackSpec {
    pub fn new(name: impl Into<String>, rows: u8, columns: u16) -> Self {
        Self { name: name.into(), rows, columns }
    }

    pub fn contains(&self, position: &Position) -> bool {
        position.row() < self.rows && position.column() <= self.columns
    }

    /// All positions of the rack in row-major order.
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.rows).flat_map(move |row| {
            (1..=self.columns).filter_map(move |column| Position::new(row, column).ok())
        })
    }

    fn check(&self, position: &Position) -> Result<(), ModelError> {
        if self.contains(position) {
            return Ok(());
        }
        Err(ModelError::OutOfBounds {
            rack: self.name.clone(),
            position: position.to_string(),
            rows: self.rows,
            columns: self.columns,
        })
    }
}

/// The configured set of racks, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct RackLayout {
    racks: Vec<RackSpec>,
}

impl RackLayout {
    /// Validate and build a layout: at least one rack, unique non-empty
    /// names, 1..=26 rows and at least one column each.
    pub fn new(racks: Vec<RackSpec>) -> Result<Self, ModelError> {
        if racks.is_empty() {
            return Err(ModelError::Validation("at least one rack must be configured".into()));
        }
        for (i, rack) in racks.iter().enumerate() {
            if rack.name.trim().is_empty() {
                return Err(ModelError::Validation("rack name must not be empty".into()));
            }
            if rack.rows == 0 || rack.rows > MAX_ROWS {
                return Err(ModelError::Validation(format!(
                    "rack {:?}: rows must be in 1..={MAX_ROWS}, got {}",
                    rack.name, rack.rows
                )));
            }
            if rack.columns == 0 {
                return Err(ModelError::Validation(format!("rack {:?}: columns must be >= 1", rack.name)));
            }
            if racks[..i].iter().any(|r| r.name == rack.name) {
                return Err(ModelError::Validation(format!("duplicate rack name {:?}", rack.name)));
            }
        }
        Ok(Self { racks })
    }

    pub fn racks(&self) -> &[RackSpec] {
        &self.racks
    }

    pub fn get(&self, name: &str) -> Option<&RackSpec> {
        self.racks.iter().find(|r| r.name == name)
    }

    /// Resolve a rack by name or fail with `UnknownRack`.
    pub fn rack(&self, name: &str) -> Result<&RackSpec, ModelError> {
        self.get(name).ok_or_else(|| ModelError::UnknownRack(name.to_string()))
    }

    /// Check that `position` lies inside the named rack.
    pub fn check(&self, rack: &str, position: &Position) -> Result<(), ModelError> {
        self.rack(rack)?.check(position)
    }

    /// Parse a position string and check it against the named rack.
    pub fn resolve(&self, rack: &str, position: &str) -> Result<Position, ModelError> {
        let spec = self.rack(rack)?;
        let position: Position = position.parse()?;
        spec.check(&position)?;
        Ok(position)
    }
}

impl Default for RackLayout {
    /// Four tall 16x5 racks and a 10x10 stock box.
    fn default() -> Self {
        Self {
            racks: vec![
                RackSpec::new("No1", 16, 5),
                RackSpec::new("No2", 16, 5),
                RackSpec::new("No3", 16, 5),
                RackSpec::new("No4", 16, 5),
                RackSpec::new("Stock Box", 10, 10),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout_bounds() {
        let layout = RackLayout::default();
        assert!(layout.resolve("No1", "P5").is_ok());
        assert!(matches!(layout.resolve("No1", "Q1"), Err(ModelError::OutOfBounds { .. })));
        assert!(matches!(layout.resolve("No1", "A6"), Err(ModelError::OutOfBounds { .. })));
        assert!(layout.resolve("Stock Box", "J10").is_ok());
        assert!(layout.resolve("Stock Box", "K1").is_err());
        assert!(matches!(layout.resolve("No9", "A1"), Err(ModelError::UnknownRack(_))));
    }

    #[test]
    fn positions_cover_the_grid() {
        let rack = RackSpec::new("tiny", 2, 3);
        let all: Vec<String> = rack.positions().map(|p| p.to_string()).collect();
        assert_eq!(all, ["A1", "A2", "A3", "B1", "B2", "B3"]);
        assert_eq!(RackLayout::default().rack("No1").unwrap().positions().count(), 80);
    }

    #[test]
    fn rejects_invalid_layouts() {
        assert!(RackLayout::new(vec![]).is_err());
        assert!(RackLayout::new(vec![RackSpec::new(" ", 1, 1)]).is_err());
        assert!(RackLayout::new(vec![RackSpec::new("a", 27, 1)]).is_err());
        assert!(RackLayout::new(vec![RackSpec::new("a", 1, 0)]).is_err());
        assert!(RackLayout::new(vec![RackSpec::new("a", 1, 1), RackSpec::new("a", 2, 2)]).is_err());
        assert!(RackLayout::new(vec![RackSpec::new("a", 26, 12)]).is_ok());
    }
}

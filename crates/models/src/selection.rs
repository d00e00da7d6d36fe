use serde::Serialize;

use crate::errors::ModelError;
use crate::position::Position;
use crate::rack::RackLayout;

/// The rack cell a user is currently editing.
///
/// Passed explicitly into view building and edits; there is no process-wide
/// "current selection".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub rack: String,
    pub position: Position,
}

impl Selection {
    /// Validate a rack name and position string against the layout.
    pub fn resolve(layout: &RackLayout, rack: &str, position: &str) -> Result<Self, ModelError> {
        let position = layout.resolve(rack, position)?;
        Ok(Self { rack: rack.to_string(), position })
    }

    pub fn is(&self, rack: &str, position: &Position) -> bool {
        self.rack == rack && self.position == *position
    }
}

//! The persisted rack document and its version token.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::ModelError;
use crate::position::Position;
use crate::rack::RackLayout;
use crate::record::ReagentRecord;

/// Records of one rack keyed by position.
pub type RackContents = BTreeMap<Position, ReagentRecord>;

/// Rack name -> position -> record. This is the whole stored state.
///
/// Only built through [`Document::empty`] or [`Document::from_json`], so it
/// always holds an entry for every configured rack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Document {
    racks: BTreeMap<String, RackContents>,
}

impl Document {
    /// One empty mapping per configured rack.
    pub fn empty(layout: &RackLayout) -> Self {
        let racks = layout.racks().iter().map(|r| (r.name.clone(), RackContents::new())).collect();
        Self { racks }
    }

    /// Parse stored JSON bytes against `layout`.
    ///
    /// Racks missing from the bytes come back empty. Position keys are
    /// normalised, and two keys naming the same cell (`a1` and `A1`) are
    /// rejected rather than merged.
    pub fn from_json(bytes: &[u8], layout: &RackLayout) -> Result<Self, ModelError> {
        let raw: Map<String, Value> = serde_json::from_slice(bytes)
            .map_err(|e| ModelError::Validation(format!("document is not a JSON object: {e}")))?;

        let mut racks = BTreeMap::new();
        for (rack, contents) in raw {
            let entries: Map<String, Value> = serde_json::from_value(contents)
                .map_err(|e| ModelError::Validation(format!("rack {rack:?} is not a JSON object: {e}")))?;
            let mut parsed = RackContents::new();
            for (key, value) in entries {
                let position: Position = key.parse()?;
                let record: ReagentRecord = serde_json::from_value(value)
                    .map_err(|e| ModelError::Validation(format!("record {rack:?}/{key}: {e}")))?;
                if parsed.insert(position, record).is_some() {
                    return Err(ModelError::Validation(format!("rack {rack:?} lists position {position} more than once")));
                }
            }
            racks.insert(rack, parsed);
        }

        let mut document = Self { racks };
        document.validate(layout)?;
        document.fill_missing_racks(layout);
        Ok(document)
    }

    /// Pretty-printed JSON (two-space indent), the on-disk format.
    pub fn to_json_pretty(&self) -> Result<Vec<u8>, ModelError> {
        serde_json::to_vec_pretty(self).map_err(|e| ModelError::Validation(e.to_string()))
    }

    /// Every rack must be configured and every position inside its rack.
    pub fn validate(&self, layout: &RackLayout) -> Result<(), ModelError> {
        for (rack, contents) in &self.racks {
            let spec = layout.rack(rack)?;
            for position in contents.keys() {
                if !spec.contains(position) {
                    return Err(ModelError::OutOfBounds {
                        rack: rack.clone(),
                        position: position.to_string(),
                        rows: spec.rows,
                        columns: spec.columns,
                    });
                }
            }
        }
        Ok(())
    }

    fn fill_missing_racks(&mut self, layout: &RackLayout) {
        for spec in layout.racks() {
            self.racks.entry(spec.name.clone()).or_default();
        }
    }

    /// Store `record` at `position` after checking the rack and bounds.
    pub fn set_record(
        &mut self,
        layout: &RackLayout,
        rack: &str,
        position: Position,
        record: ReagentRecord,
    ) -> Result<(), ModelError> {
        layout.check(rack, &position)?;
        self.racks.entry(rack.to_string()).or_default().insert(position, record);
        Ok(())
    }

    /// The record at a position; absent records read as empty.
    pub fn record(&self, rack: &str, position: &Position) -> ReagentRecord {
        self.racks
            .get(rack)
            .and_then(|contents| contents.get(position))
            .cloned()
            .unwrap_or_default()
    }

    pub fn rack(&self, name: &str) -> Option<&RackContents> {
        self.racks.get(name)
    }

    pub fn racks(&self) -> impl Iterator<Item = (&String, &RackContents)> {
        self.racks.iter()
    }

    /// Number of stored records across all racks.
    pub fn len(&self) -> usize {
        self.racks.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Revision of the remote document used for optimistic concurrency.
///
/// `Absent` means the remote object does not exist yet. On the wire this is
/// `null` or the opaque revision string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "Option<String>", into = "Option<String>")]
pub enum VersionToken {
    Absent,
    Revision(String),
}

impl VersionToken {
    pub fn is_absent(&self) -> bool {
        matches!(self, VersionToken::Absent)
    }

    pub fn as_revision(&self) -> Option<&str> {
        match self {
            VersionToken::Absent => None,
            VersionToken::Revision(r) => Some(r),
        }
    }
}

impl From<Option<String>> for VersionToken {
    fn from(value: Option<String>) -> Self {
        value.map_or(VersionToken::Absent, VersionToken::Revision)
    }
}

impl From<VersionToken> for Option<String> {
    fn from(value: VersionToken) -> Self {
        match value {
            VersionToken::Absent => None,
            VersionToken::Revision(r) => Some(r),
        }
    }
}

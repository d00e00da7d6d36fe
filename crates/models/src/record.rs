use serde::{Deserialize, Serialize};

/// One antibody reagent stored at a rack position.
///
/// Every field defaults when missing from the stored JSON, so an absent
/// record and `ReagentRecord::default()` mean the same thing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReagentRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub clone: String,
    #[serde(default, rename = "fluor")]
    pub fluorophore: String,
    #[serde(default)]
    pub in_use: bool,
}

impl ReagentRecord {
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.clone.is_empty() && self.fluorophore.is_empty() && !self.in_use
    }

    /// Text the search box is matched against.
    pub fn search_text(&self) -> String {
        format!("{} {} {}", self.name, self.clone, self.fluorophore)
    }
}

//! Case-insensitive search over reagent name, clone and fluorophore.

use serde::Serialize;

use crate::document::Document;
use crate::position::Position;
use crate::rack::RackLayout;
use crate::record::ReagentRecord;

/// Normalised search needle. A blank query matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
}

impl SearchQuery {
    pub fn new(raw: &str) -> Self {
        Self { needle: raw.trim().to_lowercase() }
    }

    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    pub fn matches(&self, record: &ReagentRecord) -> bool {
        !self.is_empty() && record.search_text().to_lowercase().contains(&self.needle)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchHit {
    pub rack: String,
    pub position: Position,
    pub record: ReagentRecord,
}

/// All matching records, in layout rack order and row-major position order.
pub fn search(layout: &RackLayout, document: &Document, query: &SearchQuery) -> Vec<SearchHit> {
    if query.is_empty() {
        return Vec::new();
    }
    layout
        .racks()
        .iter()
        .filter_map(|spec| document.rack(&spec.name).map(|contents| (spec, contents)))
        .flat_map(|(spec, contents)| {
            contents
                .iter()
                .filter(move |(_, record)| query.matches(record))
                .map(move |(position, record)| SearchHit {
                    rack: spec.name.clone(),
                    position: *position,
                    record: record.clone(),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, clone: &str, fluor: &str) -> ReagentRecord {
        ReagentRecord { name: name.into(), clone: clone.into(), fluorophore: fluor.into(), in_use: false }
    }

    #[test]
    fn matches_any_field_case_insensitively() {
        let r = record("CD45RA", "HI100", "PE-Cy7");
        assert!(SearchQuery::new("cd45").matches(&r));
        assert!(SearchQuery::new("hi100").matches(&r));
        assert!(SearchQuery::new(" pe-cy7 ").matches(&r));
        assert!(!SearchQuery::new("APC").matches(&r));
    }

    #[test]
    fn blank_query_matches_nothing() {
        let r = record("CD3", "", "");
        assert!(!SearchQuery::new("").matches(&r));
        assert!(!SearchQuery::new("   ").matches(&r));
    }

    #[test]
    fn hits_follow_layout_order() {
        let layout = RackLayout::default();
        let mut doc = Document::empty(&layout);
        doc.set_record(&layout, "Stock Box", "A1".parse().unwrap(), record("CD4 backup", "", "")).unwrap();
        doc.set_record(&layout, "No2", "B1".parse().unwrap(), record("CD4", "", "")).unwrap();
        doc.set_record(&layout, "No2", "A3".parse().unwrap(), record("CD4", "", "BV421")).unwrap();
        doc.set_record(&layout, "No1", "A1".parse().unwrap(), record("CD8", "", "")).unwrap();

        let hits = search(&layout, &doc, &SearchQuery::new("cd4"));
        let found: Vec<String> = hits.iter().map(|h| format!("{}:{}", h.rack, h.position)).collect();
        assert_eq!(found, ["No2:A3", "No2:B1", "Stock Box:A1"]);
    }
}

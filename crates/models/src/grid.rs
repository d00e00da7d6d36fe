//! Grid view of a rack: one cell per position, ready for a button grid.

use serde::Serialize;

use crate::document::Document;
use crate::position::Position;
use crate::rack::{RackLayout, RackSpec};
use crate::search::SearchQuery;
use crate::selection::Selection;

/// Prefix added to the label of a record that is in use.
pub const IN_USE_MARKER: &str = "✅ ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Cell {
    pub position: Position,
    pub label: String,
    pub in_use: bool,
    pub highlighted: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RackGrid {
    pub name: String,
    pub rows: u8,
    pub columns: u16,
    /// `cells[row][column - 1]`
    pub cells: Vec<Vec<Cell>>,
}

/// Build the grid for one rack.
pub fn build_grid(
    spec: &RackSpec,
    document: &Document,
    query: &SearchQuery,
    selection: Option<&Selection>,
) -> RackGrid {
    let cells = (0..spec.rows)
        .map(|row| {
            (1..=spec.columns)
                .filter_map(|column| Position::new(row, column).ok())
                .map(|position| {
                    let record = document.record(&spec.name, &position);
                    let base = if record.name.is_empty() { position.to_string() } else { record.name.clone() };
                    let label = if record.in_use { format!("{IN_USE_MARKER}{base}") } else { base };
                    Cell {
                        position,
                        label,
                        in_use: record.in_use,
                        highlighted: query.matches(&record),
                        selected: selection.is_some_and(|s| s.is(&spec.name, &position)),
                    }
                })
                .collect()
        })
        .collect();

    RackGrid { name: spec.name.clone(), rows: spec.rows, columns: spec.columns, cells }
}

/// Grids for every configured rack, in layout order.
pub fn build_grids(
    layout: &RackLayout,
    document: &Document,
    query: &SearchQuery,
    selection: Option<&Selection>,
) -> Vec<RackGrid> {
    layout.racks().iter().map(|spec| build_grid(spec, document, query, selection)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ReagentRecord;

    #[test]
    fn labels_highlights_and_selection() {
        let layout = RackLayout::default();
        let mut doc = Document::empty(&layout);
        let b2: Position = "B2".parse().unwrap();
        doc.set_record(
            &layout,
            "No1",
            b2,
            ReagentRecord { name: "CD19".into(), clone: "HIB19".into(), fluorophore: "APC".into(), in_use: true },
        )
        .unwrap();
        let selection = Selection::resolve(&layout, "No1", "A1").unwrap();

        let grid = build_grid(layout.rack("No1").unwrap(), &doc, &SearchQuery::new("apc"), Some(&selection));
        assert_eq!(grid.cells.len(), 16);
        assert!(grid.cells.iter().all(|row| row.len() == 5));

        let a1 = &grid.cells[0][0];
        assert_eq!(a1.label, "A1");
        assert!(a1.selected);
        assert!(!a1.highlighted);

        let cell = &grid.cells[1][1];
        assert_eq!(cell.position, b2);
        assert_eq!(cell.label, "✅ CD19");
        assert!(cell.in_use);
        assert!(cell.highlighted);
        assert!(!cell.selected);
    }

    #[test]
    fn selection_in_another_rack_marks_nothing() {
        let layout = RackLayout::default();
        let doc = Document::empty(&layout);
        let selection = Selection::resolve(&layout, "No2", "A1").unwrap();
        let grids = build_grids(&layout, &doc, &SearchQuery::default(), Some(&selection));
        assert_eq!(grids.len(), 5);
        assert!(grids[0].cells.iter().flatten().all(|c| !c.selected));
        assert!(grids[1].cells[0][0].selected);
        assert_eq!(grids[4].cells.len(), 10);
    }
}

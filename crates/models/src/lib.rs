//! Domain model for the antibody rack tracker.
//! - Rack geometry is static configuration; the document only holds records.
//! - Everything here is pure and synchronous; persistence lives in `service`.

pub mod errors;
pub mod position;
pub mod record;
pub mod rack;
pub mod document;
pub mod selection;
pub mod search;
pub mod grid;

pub use document::{Document, VersionToken};
pub use errors::ModelError;
pub use position::Position;
pub use rack::{RackLayout, RackSpec};
pub use record::ReagentRecord;
pub use selection::Selection;

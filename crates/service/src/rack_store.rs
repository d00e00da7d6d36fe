//! Rack store: read-modify-write of the rack document with optimistic
//! concurrency.
//!
//! Every interaction performs at most one `load` and one conditional `save`.
//! Nothing is retried; a failed save leaves the remote document untouched.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use models::grid::{build_grids, RackGrid};
use models::search::{search, SearchHit, SearchQuery};
use models::{Document, Position, RackLayout, ReagentRecord, Selection, VersionToken};

use crate::errors::ServiceError;
use crate::storage::{StorageError, VersionedFileStore};

/// Default location of the document inside the versioned store.
pub const DEFAULT_DOCUMENT_PATH: &str = "rack.json";

/// Explicit per-request view state: search text and the selected cell.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    pub query: SearchQuery,
    pub selection: Option<Selection>,
}

/// The record being edited, if a cell is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectedRecord {
    pub rack: String,
    pub position: Position,
    pub record: ReagentRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct RackView {
    pub version: VersionToken,
    pub racks: Vec<RackGrid>,
    pub selected: Option<SelectedRecord>,
}

#[derive(Clone)]
pub struct RackStore {
    backend: Arc<dyn VersionedFileStore>,
    layout: RackLayout,
    path: String,
}

impl RackStore {
    pub fn new(backend: Arc<dyn VersionedFileStore>, layout: RackLayout, path: impl Into<String>) -> Self {
        Self { backend, layout, path: path.into() }
    }

    pub fn layout(&self) -> &RackLayout {
        &self.layout
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Fetch the document and its version. A missing remote file is an empty
    /// document with an `Absent` token, not an error.
    pub async fn load(&self) -> Result<(Document, VersionToken), ServiceError> {
        let file = match self.backend.get(&self.path).await {
            Ok(file) => file,
            Err(StorageError::NotFound(_)) => {
                debug!(path = %self.path, "rack document absent; starting empty");
                return Ok((Document::empty(&self.layout), VersionToken::Absent));
            }
            Err(StorageError::VersionMismatch) => {
                return Err(ServiceError::StorageUnavailable("unexpected version mismatch on read".into()))
            }
            Err(StorageError::Unavailable(msg)) => {
                warn!(path = %self.path, error = %msg, "rack document load failed");
                return Err(ServiceError::StorageUnavailable(msg));
            }
        };

        let document = Document::from_json(&file.content, &self.layout)
            .map_err(|e| ServiceError::InvalidDocument(e.to_string()))?;
        debug!(path = %self.path, version = %file.version, records = document.len(), "rack document loaded");
        Ok((document, VersionToken::Revision(file.version)))
    }

    /// Write the document back if the remote is still at `expected`.
    pub async fn save(&self, document: &Document, expected: &VersionToken) -> Result<VersionToken, ServiceError> {
        self.commit(document, expected, "update rack document").await
    }

    /// Store `record` at `rack`/`position` in memory after bounds checks.
    pub fn set_record(
        &self,
        document: &mut Document,
        rack: &str,
        position: &str,
        record: ReagentRecord,
    ) -> Result<(), ServiceError> {
        let position = self.layout.resolve(rack, position)?;
        document.set_record(&self.layout, rack, position, record)?;
        Ok(())
    }

    /// One edit interaction: load, check the caller saw the current version,
    /// set the record, save conditioned on that version.
    pub async fn apply_edit(
        &self,
        selection: &Selection,
        record: ReagentRecord,
        expected: &VersionToken,
    ) -> Result<VersionToken, ServiceError> {
        let (mut document, current) = self.load().await?;
        if &current != expected {
            info!(rack = %selection.rack, position = %selection.position, "edit rejected: stale version");
            return Err(ServiceError::Conflict);
        }
        document.set_record(&self.layout, &selection.rack, selection.position, record)?;
        let verb = if current.is_absent() { "create" } else { "update" };
        let message = format!("{verb} {} {}", selection.rack, selection.position);
        self.commit(&document, &current, &message).await
    }

    /// Load and build the grid of every rack for one page view.
    pub async fn view(&self, context: &ViewContext) -> Result<RackView, ServiceError> {
        let (document, version) = self.load().await?;
        let racks = build_grids(&self.layout, &document, &context.query, context.selection.as_ref());
        let selected = context.selection.as_ref().map(|s| SelectedRecord {
            rack: s.rack.clone(),
            position: s.position,
            record: document.record(&s.rack, &s.position),
        });
        Ok(RackView { version, racks, selected })
    }

    pub async fn search(&self, query: &SearchQuery) -> Result<(Vec<SearchHit>, VersionToken), ServiceError> {
        let (document, version) = self.load().await?;
        Ok((search(&self.layout, &document, query), version))
    }

    async fn commit(&self, document: &Document, expected: &VersionToken, message: &str) -> Result<VersionToken, ServiceError> {
        document.validate(&self.layout)?;
        let content = document.to_json_pretty()?;

        let written = match expected {
            VersionToken::Absent => self.backend.create(&self.path, content, message).await,
            VersionToken::Revision(rev) => self.backend.update(&self.path, content, rev, message).await,
        };
        match written {
            Ok(version) => {
                info!(path = %self.path, %version, commit_message = %message, "rack document saved");
                Ok(VersionToken::Revision(version))
            }
            Err(e) => {
                let err = match (e, expected) {
                    // create hit a missing repo or branch, or a token that cannot see it
                    (StorageError::NotFound(what), VersionToken::Absent) => {
                        ServiceError::StorageUnavailable(format!("{what} not reachable for create"))
                    }
                    (e, _) => ServiceError::from(e),
                };
                warn!(path = %self.path, code = err.code(), error = %err, "rack document save failed");
                Err(err)
            }
        }
    }
}

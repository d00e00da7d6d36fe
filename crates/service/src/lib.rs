//! Service layer for the rack tracker.
//! - `rack_store` owns the load / set / save protocol against the document.
//! - `storage` abstracts the versioned file store and its backends.
//! - Errors are mapped into `ServiceError` with stable codes.

pub mod errors;
pub mod rack_store;
pub mod storage;

pub use errors::ServiceError;
pub use rack_store::{RackStore, RackView, SelectedRecord, ViewContext, DEFAULT_DOCUMENT_PATH};

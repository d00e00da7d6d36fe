use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use models::search::{SearchHit, SearchQuery};
use models::{RackSpec, ReagentRecord, Selection, VersionToken};
use service::{RackView, ViewContext};

use crate::errors::JsonApiError;
use crate::metrics;
use crate::routes::AppState;

#[derive(Debug, Deserialize)]
pub struct ViewParams {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default)]
    pub rack: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct LayoutResponse {
    pub racks: Vec<RackSpec>,
}

#[derive(Debug, Serialize)]
pub struct RecordResponse {
    pub rack: String,
    pub position: String,
    pub record: ReagentRecord,
    pub version: VersionToken,
}

/// Edit submission. `version` is the token the client last saw; `null` or
/// missing means the document did not exist yet.
#[derive(Debug, Deserialize)]
pub struct EditRequest {
    pub record: ReagentRecord,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EditResponse {
    pub rack: String,
    pub position: String,
    pub version: VersionToken,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub hits: Vec<SearchHit>,
    pub version: VersionToken,
}

fn selection_from(state: &AppState, rack: Option<&str>, position: Option<&str>) -> Result<Option<Selection>, JsonApiError> {
    match (rack, position) {
        (None, None) => Ok(None),
        (Some(rack), Some(position)) => Selection::resolve(state.store.layout(), rack, position)
            .map(Some)
            .map_err(|e| JsonApiError::from(service::ServiceError::from(e))),
        _ => Err(JsonApiError::bad_request("rack and position must be given together")),
    }
}

/// Configured racks and their dimensions
#[utoipa::path(get, path = "/api/layout", tag = "racks", responses((status = 200, description = "OK")))]
pub async fn layout(State(state): State<AppState>) -> Json<LayoutResponse> {
    Json(LayoutResponse { racks: state.store.layout().racks().to_vec() })
}

/// Page view: every rack grid, search highlighting and the selected record
#[utoipa::path(
    get,
    path = "/api/racks",
    tag = "racks",
    params(
        ("q" = Option<String>, Query, description = "search text"),
        ("rack" = Option<String>, Query, description = "selected rack"),
        ("position" = Option<String>, Query, description = "selected position, e.g. A1")
    ),
    responses((status = 200, description = "OK"), (status = 400, description = "Invalid selection"), (status = 502, description = "Storage unavailable"))
)]
pub async fn view(
    State(state): State<AppState>,
    Query(params): Query<ViewParams>,
) -> Result<Json<RackView>, JsonApiError> {
    let selection = selection_from(&state, params.rack.as_deref(), params.position.as_deref())?;
    let context = ViewContext { query: SearchQuery::new(params.q.as_deref().unwrap_or_default()), selection };
    let result = state.store.view(&context).await;
    metrics::observe_load(&result);
    Ok(Json(result?))
}

/// Record at one position; an empty record when nothing is stored there
#[utoipa::path(
    get,
    path = "/api/racks/{rack}/{position}",
    tag = "racks",
    params(("rack" = String, Path, description = "rack name"), ("position" = String, Path, description = "position, e.g. A1")),
    responses((status = 200, description = "OK"), (status = 400, description = "Invalid position"), (status = 502, description = "Storage unavailable"))
)]
pub async fn get_record(
    State(state): State<AppState>,
    Path((rack, position)): Path<(String, String)>,
) -> Result<Json<RecordResponse>, JsonApiError> {
    let selection = Selection::resolve(state.store.layout(), &rack, &position).map_err(service::ServiceError::from)?;
    let result = state.store.load().await;
    metrics::observe_load(&result);
    let (document, version) = result?;
    Ok(Json(RecordResponse {
        record: document.record(&selection.rack, &selection.position),
        rack: selection.rack,
        position: selection.position.to_string(),
        version,
    }))
}

/// Save one record, conditioned on the version the client loaded
#[utoipa::path(
    put,
    path = "/api/racks/{rack}/{position}",
    tag = "racks",
    params(("rack" = String, Path, description = "rack name"), ("position" = String, Path, description = "position, e.g. A1")),
    request_body = crate::openapi::EditRequestDoc,
    responses(
        (status = 200, description = "Saved"),
        (status = 400, description = "Invalid position"),
        (status = 409, description = "Document changed since it was loaded; reload required"),
        (status = 502, description = "Storage unavailable")
    )
)]
pub async fn put_record(
    State(state): State<AppState>,
    Path((rack, position)): Path<(String, String)>,
    Json(input): Json<EditRequest>,
) -> Result<Json<EditResponse>, JsonApiError> {
    let selection = Selection::resolve(state.store.layout(), &rack, &position).map_err(service::ServiceError::from)?;
    let expected = VersionToken::from(input.version);
    let result = state.store.apply_edit(&selection, input.record, &expected).await;
    metrics::observe_edit(&result);
    let version = result?;
    info!(rack = %selection.rack, position = %selection.position, "record saved");
    Ok(Json(EditResponse { rack: selection.rack, position: selection.position.to_string(), version }))
}

/// Case-insensitive search over name, clone and fluorophore
#[utoipa::path(
    get,
    path = "/api/search",
    tag = "racks",
    params(("q" = String, Query, description = "search text")),
    responses((status = 200, description = "OK"), (status = 502, description = "Storage unavailable"))
)]
pub async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, JsonApiError> {
    let result = state.store.search(&SearchQuery::new(&params.q)).await;
    metrics::observe_load(&result);
    let (hits, version) = result?;
    Ok(Json(SearchResponse { query: params.q, hits, version }))
}

use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct ReagentRecordDoc {
    pub name: String,
    pub clone: String,
    pub fluor: String,
    pub in_use: bool,
}

#[derive(ToSchema)]
pub struct EditRequestDoc {
    pub record: ReagentRecordDoc,
    /// Version token from the last load; null when the document did not exist
    pub version: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::racks::layout,
        crate::routes::racks::view,
        crate::routes::racks::get_record,
        crate::routes::racks::put_record,
        crate::routes::racks::search,
    ),
    components(
        schemas(
            HealthResponse,
            ReagentRecordDoc,
            EditRequestDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "racks")
    )
)]
pub struct ApiDoc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::apps::AppRecord;
use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::manifests::ManifestUrlRequest;
use crate::server::ServerState;

#[derive(Debug, Serialize, ToSchema)]
pub struct InstallAppResponse {
    pub ok: bool,
    pub app: AppRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AppsResponse {
    pub ok: bool,
    pub count: usize,
    pub apps: Vec<AppRecord>,
}

#[utoipa::path(
    post,
    path = "/apps/install",
    tag = "apps",
    request_body = ManifestUrlRequest,
    responses(
        (status = 200, body = InstallAppResponse),
        (status = 400, body = ApiErrorResponse),
        (status = 409, body = ApiErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn install_app(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ManifestUrlRequest>,
) -> Result<Json<InstallAppResponse>, ApiError> {
    let app = state.host.install(&payload.manifest_url).await?;
    Ok(Json(InstallAppResponse { ok: true, app }))
}

#[utoipa::path(
    get,
    path = "/apps",
    tag = "apps",
    responses((status = 200, body = AppsResponse))
)]
pub(crate) async fn list_apps(State(state): State<Arc<ServerState>>) -> Json<AppsResponse> {
    let apps = state.host.registry().list().await;
    Json(AppsResponse {
        ok: true,
        count: apps.len(),
        apps,
    })
}

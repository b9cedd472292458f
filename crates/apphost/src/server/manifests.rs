use axum::extract::State;
use axum::Json;
use manifest::{manifest_json_schema, Manifest, ValidationMode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use utoipa::ToSchema;

use crate::server::error::{ApiError, ApiErrorResponse};
use crate::server::ServerState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateManifestRequest {
    #[schema(value_type = Object)]
    pub manifest: Value,
    /// Enforce `requiredSaleorVersion` against the host version.
    #[serde(default)]
    pub strict: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestUrlRequest {
    pub manifest_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManifestResponse {
    pub ok: bool,
    #[schema(value_type = Object)]
    pub manifest: Manifest,
    pub required_saleor_version: Option<VersionRequirement>,
}

/// The declared version range and whether this host satisfies it.
#[derive(Debug, Serialize, ToSchema)]
pub struct VersionRequirement {
    pub constraint: String,
    pub satisfied: bool,
}

fn manifest_response(state: &ServerState, manifest: Manifest) -> ManifestResponse {
    let host_version = state.host.validator().host_version();
    let required_saleor_version =
        manifest
            .required_saleor_version
            .as_ref()
            .map(|range| VersionRequirement {
                constraint: range.to_string(),
                satisfied: range.matches(host_version),
            });
    ManifestResponse {
        ok: true,
        manifest,
        required_saleor_version,
    }
}

#[utoipa::path(
    post,
    path = "/manifest/validate",
    tag = "manifest",
    request_body = ValidateManifestRequest,
    responses(
        (status = 200, body = ManifestResponse),
        (status = 400, body = ApiErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn validate_manifest(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ValidateManifestRequest>,
) -> Result<Json<ManifestResponse>, ApiError> {
    let mode = if payload.strict {
        ValidationMode::Strict
    } else {
        ValidationMode::Lenient
    };
    let manifest = state.host.validate(&payload.manifest, mode)?;
    Ok(Json(manifest_response(&state, manifest)))
}

#[utoipa::path(
    post,
    path = "/manifest/fetch",
    tag = "manifest",
    request_body = ManifestUrlRequest,
    responses(
        (status = 200, body = ManifestResponse),
        (status = 400, body = ApiErrorResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub(crate) async fn fetch_manifest(
    State(state): State<Arc<ServerState>>,
    Json(payload): Json<ManifestUrlRequest>,
) -> Result<Json<ManifestResponse>, ApiError> {
    let manifest = state.host.fetch_manifest(&payload.manifest_url).await?;
    Ok(Json(manifest_response(&state, manifest)))
}

#[utoipa::path(
    get,
    path = "/manifest/schema",
    tag = "manifest",
    responses((status = 200, description = "JSON Schema document for app manifests"))
)]
pub(crate) async fn manifest_schema() -> Json<Value> {
    Json(manifest_json_schema())
}

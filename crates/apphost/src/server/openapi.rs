use utoipa::OpenApi;

use crate::apps::{AppRecord, ExtensionSummary, WebhookSummary};
use crate::server::apps::{AppsResponse, InstallAppResponse};
use crate::server::error::{ApiErrorBody, ApiErrorResponse};
use crate::server::manifests::{
    ManifestResponse, ManifestUrlRequest, ValidateManifestRequest, VersionRequirement,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "App Host API",
        version = "0.1.0",
        description = "Validation and installation of third-party app manifests"
    ),
    paths(
        crate::server::manifests::validate_manifest,
        crate::server::manifests::fetch_manifest,
        crate::server::manifests::manifest_schema,
        crate::server::apps::install_app,
        crate::server::apps::list_apps,
    ),
    components(schemas(
        // Error
        ApiErrorResponse,
        ApiErrorBody,
        // Manifest
        ValidateManifestRequest,
        ManifestUrlRequest,
        ManifestResponse,
        VersionRequirement,
        // Apps
        InstallAppResponse,
        AppsResponse,
        AppRecord,
        WebhookSummary,
        ExtensionSummary,
    )),
    tags(
        (name = "manifest", description = "Manifest validation and preview"),
        (name = "apps", description = "App installation"),
    )
)]
pub struct ApiDoc;

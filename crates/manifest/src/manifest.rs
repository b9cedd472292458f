//! Manifest model and the validator that builds it from untrusted JSON.

mod fields;

use std::fmt;
use std::sync::Arc;

use semver::Version;
use serde::Serialize;
use serde_json::Value;

use crate::error::{
    AppErrorCode, FieldError, ManifestError, Result, ValidationErrors, NON_FIELD_ERRORS,
};
use crate::extension::{Extension, ExtensionMount, ExtensionTarget, ExtensionUrl};
use crate::permissions::{Permission, PermissionRegistry};
use crate::url::{validate_url, validate_url_path, HTTP_URL, WEBHOOK_TARGET_URL};
use crate::version::VersionReq;
use crate::webhook::{
    DefaultHeaderPolicy, EventKind, EventType, HeaderPolicy, SubscriptionQuery, Webhook,
};
use fields::{coerce_str, Fields};

const PERMISSION_MISSING: &str = "Given permission don't exist.";
const EVENT_MISSING: &str = "Given event type doesn't exist.";
const INVALID_VERSION_RANGE: &str = "Invalid value. Version range required in the semver format.";
const OUT_OF_SCOPE: &str = "Extension permission must be listed in App's permissions.";
const RELATIVE_URL_NEEDS_APP_PAGE: &str = "Incorrect relation between extension's target and \
    URL fields. APP_PAGE can be used only with relative URL path.";
const APP_PAGE_ABSOLUTE_URL: &str = "Url cannot start with protocol when target == APP_PAGE";

/// A validated app manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub id: String,
    pub version: String,
    pub name: String,
    pub token_target_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_saleor_version: Option<VersionReq>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_url: Option<String>,
    /// Deprecated in favour of `app_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration_url: Option<String>,
    /// Deprecated in favour of `data_privacy_url`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_privacy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_privacy_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub homepage_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub support_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
    pub permissions: Vec<Permission>,
    pub webhooks: Vec<Webhook>,
    pub extensions: Vec<Extension>,
}

impl Manifest {
    /// Whether the declared version range admits `version`. A manifest
    /// without a range supports every version.
    pub fn supports(&self, version: &Version) -> bool {
        self.required_saleor_version
            .as_ref()
            .map_or(true, |range| range.matches(version))
    }
}

/// How strictly `requiredSaleorVersion` is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationMode {
    /// Used when previewing a manifest; an unsupported host version is not an error.
    #[default]
    Lenient,
    /// Used at installation; the host version must satisfy the declared range.
    Strict,
}

/// Validates manifests against the host's version, permissions and header policy.
///
/// The validator holds only immutable state and can be shared across threads.
#[derive(Clone)]
pub struct ManifestValidator {
    host_version: Version,
    permissions: Arc<PermissionRegistry>,
    header_policy: Arc<dyn HeaderPolicy>,
}

impl fmt::Debug for ManifestValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManifestValidator")
            .field("host_version", &self.host_version)
            .field("permissions", &self.permissions.len())
            .finish_non_exhaustive()
    }
}

impl ManifestValidator {
    pub fn new(host_version: Version) -> Self {
        Self {
            host_version,
            permissions: Arc::new(PermissionRegistry::default()),
            header_policy: Arc::new(DefaultHeaderPolicy),
        }
    }

    pub fn with_permissions(mut self, permissions: PermissionRegistry) -> Self {
        self.permissions = Arc::new(permissions);
        self
    }

    pub fn with_header_policy(mut self, policy: impl HeaderPolicy + 'static) -> Self {
        self.header_policy = Arc::new(policy);
        self
    }

    pub fn host_version(&self) -> &Version {
        &self.host_version
    }

    pub fn permissions(&self) -> &PermissionRegistry {
        &self.permissions
    }

    /// Parses raw manifest text, reporting malformed JSON as [`ManifestError::Json`].
    pub fn parse_str(&self, raw: &str, mode: ValidationMode) -> Result<Manifest> {
        let value: Value = serde_json::from_str(raw)?;
        self.parse(&value, mode).map_err(ManifestError::Validation)
    }

    /// Validates a manifest document, accumulating every field error.
    #[tracing::instrument(skip_all, fields(mode = ?mode))]
    pub fn parse(
        &self,
        raw: &Value,
        mode: ValidationMode,
    ) -> std::result::Result<Manifest, ValidationErrors> {
        let Some(object) = raw.as_object() else {
            return Err(ValidationErrors::single(
                NON_FIELD_ERRORS,
                FieldError::invalid("Manifest must be a JSON object"),
            ));
        };
        let fields = Fields::root(object);
        let mut errors = ValidationErrors::new();

        let id = fields.required_str("id", Some(256), &mut errors);
        let version = fields.required_str("version", Some(60), &mut errors);
        let name = fields.required_str("name", Some(60), &mut errors);
        let token_target_url = fields.required_url("tokenTargetUrl", &HTTP_URL, &mut errors);
        let about = fields.optional_str("about", None, &mut errors);
        let required_saleor_version = self.read_version_range(&fields, mode, &mut errors);
        let author = read_author(&fields, &mut errors);
        let app_url = fields.optional_url("appUrl", &HTTP_URL, &mut errors);
        let configuration_url = fields.optional_url("configurationUrl", &HTTP_URL, &mut errors);
        let data_privacy = fields.optional_str("dataPrivacy", None, &mut errors);
        let data_privacy_url = fields.optional_url("dataPrivacyUrl", &HTTP_URL, &mut errors);
        let homepage_url = fields.optional_url("homepageUrl", &HTTP_URL, &mut errors);
        let support_url = fields.optional_url("supportUrl", &HTTP_URL, &mut errors);
        let audience = fields.optional_str("audience", Some(256), &mut errors);
        let permissions = self.read_permissions(&fields, "permissions", &mut errors);

        let mut webhooks = Vec::new();
        if let Some(items) = fields.list("webhooks", &mut errors) {
            for (index, item) in items.iter().enumerate() {
                if let Some(webhook) = self.read_webhook(item, index, &mut errors) {
                    webhooks.push(webhook);
                }
            }
        }

        let mut extensions = Vec::new();
        if let Some(items) = fields.list("extensions", &mut errors) {
            for (index, item) in items.iter().enumerate() {
                let Some(extension) = self.read_extension(item, index, &mut errors) else {
                    continue;
                };
                if let Err(error) = check_extension(&extension, &permissions, app_url.as_deref())
                {
                    errors.add(format!("extensions.{index}"), error);
                    continue;
                }
                extensions.push(extension);
            }
        }

        match (id, version, name, token_target_url) {
            (Some(id), Some(version), Some(name), Some(token_target_url)) if errors.is_empty() => {
                tracing::debug!(app = %id, "manifest accepted");
                Ok(Manifest {
                    id,
                    version,
                    name,
                    token_target_url,
                    about,
                    required_saleor_version,
                    author,
                    app_url,
                    configuration_url,
                    data_privacy,
                    data_privacy_url,
                    homepage_url,
                    support_url,
                    audience,
                    permissions,
                    webhooks,
                    extensions,
                })
            }
            _ => {
                tracing::debug!(fields = errors.len(), "manifest rejected");
                Err(errors)
            }
        }
    }

    fn read_version_range(
        &self,
        fields: &Fields<'_>,
        mode: ValidationMode,
        errors: &mut ValidationErrors,
    ) -> Option<VersionReq> {
        const FIELD: &str = "requiredSaleorVersion";
        let text = fields.optional_str(FIELD, None, errors)?;
        let range = fields.record(
            FIELD,
            VersionReq::parse(&text).map_err(|_| FieldError::invalid(INVALID_VERSION_RANGE)),
            errors,
        )?;
        if mode == ValidationMode::Strict && !range.matches(&self.host_version) {
            errors.add(
                fields.path(FIELD),
                FieldError::new(
                    AppErrorCode::UnsupportedSaleorVersion,
                    format!(
                        "Saleor version {} is not supported by the app.",
                        self.host_version
                    ),
                ),
            );
            return None;
        }
        Some(range)
    }

    /// Returns the recognised permissions; unknown entries are reported by index.
    fn read_permissions(
        &self,
        fields: &Fields<'_>,
        field: &str,
        errors: &mut ValidationErrors,
    ) -> Vec<Permission> {
        let Some(items) = fields.list(field, errors) else {
            return Vec::new();
        };
        let base = fields.path(field);
        let mut permissions = Vec::new();
        for (index, item) in items.iter().enumerate() {
            match item.as_str().and_then(|name| self.permissions.get(name)) {
                Some(permission) => permissions.push(permission),
                None => errors.add(
                    format!("{base}.{index}"),
                    FieldError::new(AppErrorCode::InvalidPermission, PERMISSION_MISSING),
                ),
            }
        }
        permissions
    }

    fn read_webhook(
        &self,
        item: &Value,
        index: usize,
        errors: &mut ValidationErrors,
    ) -> Option<Webhook> {
        let mut local = ValidationErrors::new();
        let fields = Fields::nested(item, format!("webhooks.{index}"), &mut local);
        let webhook = fields.and_then(|fields| self.read_webhook_fields(&fields, &mut local));
        let valid = local.is_empty();
        errors.merge(local);
        webhook.filter(|_| valid)
    }

    fn read_webhook_fields(
        &self,
        fields: &Fields<'_>,
        errors: &mut ValidationErrors,
    ) -> Option<Webhook> {
        let name = fields.required_str("name", Some(255), errors);
        let is_active = fields.bool_or("isActive", true, errors);
        let target_url = fields.required_url("targetUrl", &WEBHOOK_TARGET_URL, errors);
        let query = fields.required_str("query", None, errors).and_then(|text| {
            let query = SubscriptionQuery::new(text);
            let checked = match query.error_msg() {
                None => Ok(query),
                Some(message) => Err(FieldError::invalid(message)),
            };
            fields.record("query", checked, errors)
        });
        let async_events = read_events(fields, "asyncEvents", EventKind::Async, errors);
        let sync_events = read_events(fields, "syncEvents", EventKind::Sync, errors);
        let custom_headers = fields
            .string_map("customHeaders", errors)
            .and_then(|headers| {
                let checked = self.header_policy.check(&headers).map_err(|error| {
                    FieldError::new(AppErrorCode::InvalidCustomHeaders, error.to_string())
                });
                fields.record("customHeaders", checked, errors)
            });

        Some(Webhook {
            name: name?,
            is_active: is_active?,
            target_url: target_url?,
            query: query?,
            async_events: async_events?,
            sync_events: sync_events?,
            custom_headers: custom_headers?,
        })
    }

    fn read_extension(
        &self,
        item: &Value,
        index: usize,
        errors: &mut ValidationErrors,
    ) -> Option<Extension> {
        let mut local = ValidationErrors::new();
        let fields = Fields::nested(item, format!("extensions.{index}"), &mut local);
        let extension = fields.and_then(|fields| self.read_extension_fields(&fields, &mut local));
        let valid = local.is_empty();
        errors.merge(local);
        extension.filter(|_| valid)
    }

    fn read_extension_fields(
        &self,
        fields: &Fields<'_>,
        errors: &mut ValidationErrors,
    ) -> Option<Extension> {
        let label = fields.required_str("label", Some(256), errors);
        let target = match fields.optional_str("target", None, errors) {
            Some(text) => {
                let parsed = text.parse::<ExtensionTarget>().map_err(|_| {
                    not_an_enum_member(ExtensionTarget::ALL.iter().map(|t| t.as_str()))
                });
                fields.record("target", parsed, errors)
            }
            None if errors.get(&fields.path("target")).is_some() => None,
            None => Some(ExtensionTarget::default()),
        };
        let mount = fields.required_str("mount", None, errors).and_then(|text| {
            let parsed = text
                .parse::<ExtensionMount>()
                .map_err(|_| not_an_enum_member(ExtensionMount::ALL.iter().map(|m| m.as_str())));
            fields.record("mount", parsed, errors)
        });
        let url = fields
            .required_str("url", None, errors)
            .and_then(|text| fields.record("url", read_extension_url(&text, target), errors));
        let permissions = self.read_permissions(fields, "permissions", errors);

        Some(Extension {
            label: label?,
            target: target?,
            mount: mount?,
            url: url?,
            permissions,
        })
    }
}

fn read_author(fields: &Fields<'_>, errors: &mut ValidationErrors) -> Option<String> {
    let author = fields.optional_str("author", None, errors)?;
    let author = author.trim();
    let checked = match author.chars().count() {
        0 => Err(FieldError::invalid("ensure this value has at least 1 characters")),
        length if length > 60 => Err(FieldError::invalid(
            "ensure this value has at most 60 characters",
        )),
        _ => Ok(author.to_string()),
    };
    fields.record("author", checked, errors)
}

/// `None` when the list itself is malformed; unknown names are reported by index.
fn read_events(
    fields: &Fields<'_>,
    field: &str,
    kind: EventKind,
    errors: &mut ValidationErrors,
) -> Option<Vec<EventType>> {
    let items = fields.list(field, errors)?;
    let base = fields.path(field);
    let mut events = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let event = coerce_str(item)
            .ok()
            .and_then(|name| EventType::lookup(kind, &name));
        match event {
            Some(event) => events.push(event),
            None => errors.add(
                format!("{base}.{index}"),
                FieldError::new(AppErrorCode::InvalidPermission, EVENT_MISSING),
            ),
        }
    }
    Some(events)
}

/// Paths become [`ExtensionUrl::Relative`]; anything else must be an HTTP(S) URL.
fn read_extension_url(
    text: &str,
    target: Option<ExtensionTarget>,
) -> std::result::Result<ExtensionUrl, FieldError> {
    if text.starts_with('/') {
        return validate_url_path(text).map(ExtensionUrl::Relative);
    }
    let url = validate_url(text, &HTTP_URL)?;
    if target == Some(ExtensionTarget::AppPage) {
        return Err(FieldError::invalid_url(APP_PAGE_ABSOLUTE_URL));
    }
    Ok(ExtensionUrl::Absolute(url))
}

/// Rules tying an extension to the rest of the manifest.
fn check_extension(
    extension: &Extension,
    manifest_permissions: &[Permission],
    app_url: Option<&str>,
) -> std::result::Result<(), FieldError> {
    if extension
        .permissions
        .iter()
        .any(|permission| !manifest_permissions.contains(permission))
    {
        return Err(FieldError::new(
            AppErrorCode::OutOfScopePermission,
            OUT_OF_SCOPE,
        ));
    }
    if extension.url.is_relative()
        && extension.target != ExtensionTarget::AppPage
        && app_url.is_none()
    {
        return Err(FieldError::invalid_url(RELATIVE_URL_NEEDS_APP_PAGE));
    }
    Ok(())
}

fn not_an_enum_member<'a>(permitted: impl Iterator<Item = &'a str>) -> FieldError {
    let permitted: Vec<String> = permitted.map(|name| format!("'{name}'")).collect();
    FieldError::invalid(format!(
        "value is not a valid enumeration member; permitted: {}",
        permitted.join(", ")
    ))
}

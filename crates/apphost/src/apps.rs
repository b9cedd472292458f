//! Installed application records.

use chrono::{DateTime, Utc};
use manifest::{Extension, Manifest, Permission, Webhook};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AppRecord {
    pub id: Uuid,
    /// Manifest `id`, unique among installed apps.
    pub identifier: String,
    pub name: String,
    pub version: String,
    pub about: Option<String>,
    pub author: Option<String>,
    pub manifest_url: String,
    pub token_target_url: String,
    pub app_url: Option<String>,
    pub required_saleor_version: Option<String>,
    pub permissions: Vec<String>,
    pub webhooks: Vec<WebhookSummary>,
    pub extensions: Vec<ExtensionSummary>,
    pub installed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSummary {
    pub name: String,
    pub target_url: String,
    pub is_active: bool,
    pub events: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ExtensionSummary {
    pub label: String,
    pub mount: String,
    pub target: String,
    pub url: String,
    pub permissions: Vec<String>,
}

impl AppRecord {
    pub fn from_manifest(manifest: &Manifest, manifest_url: &str) -> Self {
        Self {
            id: Uuid::now_v7(),
            identifier: manifest.id.clone(),
            name: manifest.name.clone(),
            version: manifest.version.clone(),
            about: manifest.about.clone(),
            author: manifest.author.clone(),
            manifest_url: manifest_url.to_string(),
            token_target_url: manifest.token_target_url.clone(),
            app_url: manifest.app_url.clone(),
            required_saleor_version: manifest
                .required_saleor_version
                .as_ref()
                .map(ToString::to_string),
            permissions: permission_names(&manifest.permissions),
            webhooks: manifest.webhooks.iter().map(summarize_webhook).collect(),
            extensions: manifest.extensions.iter().map(summarize_extension).collect(),
            installed_at: Utc::now(),
        }
    }
}

fn summarize_webhook(webhook: &Webhook) -> WebhookSummary {
    WebhookSummary {
        name: webhook.name.clone(),
        target_url: webhook.target_url.clone(),
        is_active: webhook.is_active,
        events: webhook.events().into_iter().map(str::to_string).collect(),
    }
}

fn summarize_extension(extension: &Extension) -> ExtensionSummary {
    ExtensionSummary {
        label: extension.label.clone(),
        mount: extension.mount.to_string(),
        target: extension.target.to_string(),
        url: extension.url.to_string(),
        permissions: permission_names(&extension.permissions),
    }
}

/// Granted permissions form a set; repeats in the manifest collapse here.
fn permission_names(permissions: &[Permission]) -> Vec<String> {
    let mut names: Vec<String> = Vec::with_capacity(permissions.len());
    for permission in permissions {
        let name = permission.to_string();
        if !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

/// In-memory registry of installed apps, in installation order.
#[derive(Debug, Default)]
pub struct AppRegistry {
    apps: RwLock<Vec<AppRecord>>,
}

impl AppRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `record`, refusing a second app with the same identifier.
    pub async fn insert(&self, record: AppRecord) -> CoreResult<AppRecord> {
        let mut apps = self.apps.write().await;
        if apps.iter().any(|app| app.identifier == record.identifier) {
            return Err(CoreError::Conflict(format!(
                "app {} is already installed",
                record.identifier
            )));
        }
        apps.push(record.clone());
        Ok(record)
    }

    pub async fn list(&self) -> Vec<AppRecord> {
        self.apps.read().await.clone()
    }

    pub async fn get(&self, identifier: &str) -> Option<AppRecord> {
        self.apps
            .read()
            .await
            .iter()
            .find(|app| app.identifier == identifier)
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.apps.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use manifest::{ManifestValidator, ValidationMode, Version};
    use serde_json::json;

    fn manifest(id: &str) -> Manifest {
        ManifestValidator::new(Version::new(3, 20, 0))
            .parse(
                &json!({
                    "id": id,
                    "version": "1.2.0",
                    "name": "Orders",
                    "requiredSaleorVersion": ">=3.13",
                    "tokenTargetUrl": "https://orders.example.com/register",
                    "permissions": ["MANAGE_ORDERS"],
                    "webhooks": [{
                        "name": "created",
                        "targetUrl": "https://orders.example.com/hooks",
                        "query": "subscription { event { ... on OrderCreated { order { id } } } }"
                    }],
                    "extensions": [{
                        "label": "Open",
                        "mount": "ORDER_DETAILS_MORE_ACTIONS",
                        "target": "APP_PAGE",
                        "url": "/orders",
                        "permissions": ["MANAGE_ORDERS"]
                    }]
                }),
                ValidationMode::Strict,
            )
            .expect("valid manifest")
    }

    #[test]
    fn record_summarizes_manifest() {
        let record = AppRecord::from_manifest(&manifest("orders.app"), "https://orders.example.com/m");

        assert_eq!(record.identifier, "orders.app");
        assert_eq!(record.version, "1.2.0");
        assert_eq!(record.required_saleor_version.as_deref(), Some(">=3.13"));
        assert_eq!(record.permissions, vec!["MANAGE_ORDERS"]);
        assert_eq!(record.webhooks[0].events, vec!["ORDER_CREATED"]);
        assert!(record.webhooks[0].is_active);
        assert_eq!(record.extensions[0].target, "APP_PAGE");
        assert_eq!(record.extensions[0].mount, "ORDER_DETAILS_MORE_ACTIONS");
        assert_eq!(record.manifest_url, "https://orders.example.com/m");
    }

    #[test]
    fn record_collapses_repeated_permissions() {
        let manifest = ManifestValidator::new(Version::new(3, 20, 0))
            .parse(
                &json!({
                    "id": "users.app",
                    "version": "1",
                    "name": "Users",
                    "tokenTargetUrl": "https://users.example.com/register",
                    "permissions": ["MANAGE_USERS", "MANAGE_ORDERS", "MANAGE_USERS"]
                }),
                ValidationMode::Lenient,
            )
            .expect("valid manifest");
        assert_eq!(manifest.permissions.len(), 3);

        let record = AppRecord::from_manifest(&manifest, "https://users.example.com/m");
        assert_eq!(record.permissions, vec!["MANAGE_USERS", "MANAGE_ORDERS"]);
    }

    #[test]
    fn records_get_distinct_ids() {
        let manifest = manifest("orders.app");
        let first = AppRecord::from_manifest(&manifest, "https://a");
        let second = AppRecord::from_manifest(&manifest, "https://a");
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn registry_rejects_duplicate_identifiers() {
        let registry = AppRegistry::new();
        registry
            .insert(AppRecord::from_manifest(&manifest("orders.app"), "https://a"))
            .await
            .expect("first install");
        registry
            .insert(AppRecord::from_manifest(&manifest("other.app"), "https://b"))
            .await
            .expect("second install");

        let err = registry
            .insert(AppRecord::from_manifest(&manifest("orders.app"), "https://c"))
            .await
            .expect_err("duplicate");
        assert!(matches!(err, CoreError::Conflict(_)));

        assert_eq!(registry.len().await, 2);
        let identifiers: Vec<String> = registry
            .list()
            .await
            .into_iter()
            .map(|app| app.identifier)
            .collect();
        assert_eq!(identifiers, vec!["orders.app", "other.app"]);
        assert_eq!(
            registry.get("other.app").await.map(|app| app.manifest_url),
            Some("https://b".to_string())
        );
    }
}

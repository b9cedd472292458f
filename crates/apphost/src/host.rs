//! Manifest preview and installation flows.

use std::sync::Arc;

use manifest::{Manifest, ManifestValidator, ValidationMode};
use serde_json::Value;

use crate::apps::{AppRecord, AppRegistry};
use crate::config::HostConfig;
use crate::error::{CoreError, CoreResult};
use crate::fetch::{clean_manifest_url, HttpManifestSource, ManifestSource};

pub struct AppHost {
    validator: ManifestValidator,
    source: Arc<dyn ManifestSource>,
    registry: AppRegistry,
}

impl AppHost {
    pub fn new(validator: ManifestValidator, source: Arc<dyn ManifestSource>) -> Self {
        Self {
            validator,
            source,
            registry: AppRegistry::new(),
        }
    }

    pub fn from_config(config: &HostConfig) -> CoreResult<Self> {
        let source = HttpManifestSource::new(config.fetch_timeout())?;
        Ok(Self::new(config.validator()?, Arc::new(source)))
    }

    pub fn validator(&self) -> &ManifestValidator {
        &self.validator
    }

    pub fn registry(&self) -> &AppRegistry {
        &self.registry
    }

    pub fn validate(&self, manifest: &Value, mode: ValidationMode) -> CoreResult<Manifest> {
        self.validator
            .parse(manifest, mode)
            .map_err(CoreError::Manifest)
    }

    /// Fetches a manifest for preview; an unsupported host version is tolerated.
    #[tracing::instrument(skip(self))]
    pub async fn fetch_manifest(&self, manifest_url: &str) -> CoreResult<Manifest> {
        let (_, manifest) = self.load(manifest_url, ValidationMode::Lenient).await?;
        Ok(manifest)
    }

    /// Fetches, strictly validates and records an app.
    #[tracing::instrument(skip(self))]
    pub async fn install(&self, manifest_url: &str) -> CoreResult<AppRecord> {
        let (url, manifest) = self.load(manifest_url, ValidationMode::Strict).await?;
        let record = self
            .registry
            .insert(AppRecord::from_manifest(&manifest, &url))
            .await?;
        tracing::info!(app = %record.identifier, id = %record.id, "app installed");
        Ok(record)
    }

    async fn load(&self, manifest_url: &str, mode: ValidationMode) -> CoreResult<(String, Manifest)> {
        let url = clean_manifest_url(manifest_url)?;
        let raw = self.source.fetch(&url).await.map_err(|failure| {
            tracing::warn!("failed to fetch manifest from {url}: {failure:?}");
            CoreError::Manifest(failure.into_errors())
        })?;
        let manifest = self.validate(&raw, mode)?;
        Ok((url, manifest))
    }
}

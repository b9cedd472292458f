//! App manifest parsing and validation.
//!
//! This crate turns an untrusted JSON manifest published by a third-party app
//! into a validated [`Manifest`], or a [`ValidationErrors`] report keyed by
//! field path:
//! - Field validators (strings, URLs, enums, permissions, headers)
//! - NPM-style version ranges with a natural prerelease policy
//! - Subscription query grammar and event extraction
//! - Cross-field rules between extensions and the manifest
//! - JSON schema export for app developers

pub mod error;
pub mod extension;
pub mod manifest;
pub mod permissions;
pub mod schema;
pub mod url;
pub mod version;
pub mod webhook;

// Re-export main types
pub use error::{AppErrorCode, FieldError, ManifestError, ValidationErrors};
pub use extension::{Extension, ExtensionMount, ExtensionTarget, ExtensionUrl};
pub use manifest::{Manifest, ManifestValidator, ValidationMode};
pub use permissions::{Permission, PermissionRegistry};
pub use schema::manifest_json_schema;
pub use version::{VersionReq, VersionReqError};
pub use webhook::{
    DefaultHeaderPolicy, EventKind, EventType, HeaderPolicy, HeaderPolicyError, QueryError,
    SubscriptionQuery, Webhook,
};

/// Re-exported so callers can build a host version without a direct dependency.
pub use semver::Version;

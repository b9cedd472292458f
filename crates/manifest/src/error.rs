use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Field key used for errors that are not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Machine-readable error codes surfaced to API clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppErrorCode {
    Invalid,
    Required,
    InvalidUrlFormat,
    InvalidPermission,
    OutOfScopePermission,
    InvalidCustomHeaders,
    UnsupportedSaleorVersion,
    ManifestUrlCantConnect,
    InvalidManifestFormat,
}

impl AppErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "INVALID",
            Self::Required => "REQUIRED",
            Self::InvalidUrlFormat => "INVALID_URL_FORMAT",
            Self::InvalidPermission => "INVALID_PERMISSION",
            Self::OutOfScopePermission => "OUT_OF_SCOPE_PERMISSION",
            Self::InvalidCustomHeaders => "INVALID_CUSTOM_HEADERS",
            Self::UnsupportedSaleorVersion => "UNSUPPORTED_SALEOR_VERSION",
            Self::ManifestUrlCantConnect => "MANIFEST_URL_CANT_CONNECT",
            Self::InvalidManifestFormat => "INVALID_MANIFEST_FORMAT",
        }
    }
}

impl fmt::Display for AppErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single error attached to a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub code: AppErrorCode,
    pub message: String,
}

impl FieldError {
    /// Builds an error, normalising the message to a capitalised sentence.
    pub fn new(code: AppErrorCode, message: impl AsRef<str>) -> Self {
        Self {
            code,
            message: prepare_error_message(message.as_ref()),
        }
    }

    pub fn invalid(message: impl AsRef<str>) -> Self {
        Self::new(AppErrorCode::Invalid, message)
    }

    pub fn required() -> Self {
        Self::new(AppErrorCode::Required, "Field required.")
    }

    pub fn invalid_url(message: impl AsRef<str>) -> Self {
        Self::new(AppErrorCode::InvalidUrlFormat, message)
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

/// Upper-cases the first letter and terminates the message with a period.
pub fn prepare_error_message(message: &str) -> String {
    let mut chars = message.chars();
    let mut prepared = match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
        None => String::new(),
    };
    if !prepared.is_empty() && !prepared.ends_with('.') {
        prepared.push('.');
    }
    prepared
}

/// Field errors collected during validation, keyed by dotted field path.
///
/// Paths use the wire (camelCase) field names and list indices, e.g.
/// `webhooks.0.targetUrl` or `extensions.2`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationErrors {
    fields: BTreeMap<String, Vec<FieldError>>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shorthand for a report holding one error.
    pub fn single(field: impl Into<String>, error: FieldError) -> Self {
        let mut errors = Self::new();
        errors.add(field, error);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, error: FieldError) {
        self.fields.entry(field.into()).or_default().push(error);
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, errors) in other.fields {
            self.fields.entry(field).or_default().extend(errors);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&[FieldError]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Whether `field` carries an error with the given code.
    pub fn has(&self, field: &str, code: AppErrorCode) -> bool {
        self.get(field)
            .is_some_and(|errors| errors.iter().any(|error| error.code == code))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldError)> {
        self.fields
            .iter()
            .flat_map(|(field, errors)| errors.iter().map(move |error| (field.as_str(), error)))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, error) in self.iter() {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("Manifest is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Manifest validation failed: {0}")]
    Validation(#[from] ValidationErrors),
}

pub type Result<T> = std::result::Result<T, ManifestError>;

//! Retrieval of manifest documents from app-supplied URLs.

use std::time::Duration;

use async_trait::async_trait;
use manifest::url::{validate_url, UrlRules};
use manifest::{AppErrorCode, FieldError, ValidationErrors};
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

/// Field that fetch failures are reported under.
pub const MANIFEST_URL_FIELD: &str = "manifestUrl";
/// Largest manifest body read from a remote host.
pub const MAX_MANIFEST_BYTES: usize = 1024 * 1024;

const MANIFEST_URL: UrlRules = UrlRules {
    allowed_schemes: &["http", "https"],
    max_length: 2048,
};

/// Checks a caller-supplied manifest URL before anything is fetched.
pub fn clean_manifest_url(url: &str) -> Result<String, ValidationErrors> {
    validate_url(url, &MANIFEST_URL).map_err(|_| {
        ValidationErrors::single(MANIFEST_URL_FIELD, FieldError::invalid_url("Enter a valid URL."))
    })
}

/// Why a manifest could not be retrieved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchFailure {
    TimedOut,
    /// The server answered with an error status.
    Status(u16),
    /// The body is not a JSON document.
    InvalidFormat,
    Unavailable(String),
}

impl FetchFailure {
    pub fn field_error(&self) -> FieldError {
        match self {
            FetchFailure::TimedOut => FieldError::new(
                AppErrorCode::ManifestUrlCantConnect,
                "The request to fetch manifest data timed out.",
            ),
            FetchFailure::Status(_) => FieldError::new(
                AppErrorCode::ManifestUrlCantConnect,
                "Unable to fetch manifest data.",
            ),
            FetchFailure::InvalidFormat => FieldError::new(
                AppErrorCode::InvalidManifestFormat,
                "Incorrect structure of manifest.",
            ),
            FetchFailure::Unavailable(_) => {
                FieldError::invalid("Can't fetch manifest data. Please try later.")
            }
        }
    }

    pub fn into_errors(self) -> ValidationErrors {
        ValidationErrors::single(MANIFEST_URL_FIELD, self.field_error())
    }
}

/// Source of raw manifest documents.
#[async_trait]
pub trait ManifestSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, FetchFailure>;
}

/// Fetches manifests over HTTP without following redirects.
#[derive(Debug, Clone)]
pub struct HttpManifestSource {
    client: reqwest::Client,
}

impl HttpManifestSource {
    pub fn new(timeout: Duration) -> CoreResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("apphost/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CoreError::Internal(format!("failed to build http client: {e}")))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    #[tracing::instrument(skip(self))]
    async fn fetch(&self, url: &str) -> Result<Value, FetchFailure> {
        let mut response = self.client.get(url).send().await.map_err(classify)?;
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            tracing::warn!("manifest request returned {status}");
            return Err(FetchFailure::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|length| length > MAX_MANIFEST_BYTES as u64)
        {
            tracing::warn!("manifest body exceeds {MAX_MANIFEST_BYTES} bytes");
            return Err(FetchFailure::InvalidFormat);
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(classify)? {
            if body.len() + chunk.len() > MAX_MANIFEST_BYTES {
                tracing::warn!("manifest body exceeds {MAX_MANIFEST_BYTES} bytes");
                return Err(FetchFailure::InvalidFormat);
            }
            body.extend_from_slice(&chunk);
        }
        serde_json::from_slice(&body).map_err(|_| FetchFailure::InvalidFormat)
    }
}

fn classify(error: reqwest::Error) -> FetchFailure {
    if error.is_timeout() {
        FetchFailure::TimedOut
    } else {
        tracing::warn!("manifest request failed: {error}");
        FetchFailure::Unavailable(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::net::SocketAddr;
    use tokio::net::TcpListener;

    async fn serve(app: Router) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        addr
    }

    async fn fixture_server() -> SocketAddr {
        let app = Router::new()
            .route("/manifest", get(|| async { Json(json!({ "id": "app" })) }))
            .route("/text", get(|| async { "definitely not json" }))
            .route(
                "/huge",
                get(|| async { Json(json!({ "about": "x".repeat(MAX_MANIFEST_BYTES) })) }),
            )
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route(
                "/moved",
                get(|| async {
                    (StatusCode::FOUND, [(header::LOCATION, "/manifest")]).into_response()
                }),
            )
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(2)).await;
                    Json(json!({}))
                }),
            );
        serve(app).await
    }

    fn source() -> HttpManifestSource {
        HttpManifestSource::new(Duration::from_millis(300)).expect("client")
    }

    #[test]
    fn cleans_manifest_urls() {
        assert_eq!(
            clean_manifest_url(" https://apps.example.com/manifest ").unwrap(),
            "https://apps.example.com/manifest"
        );
        let errors = clean_manifest_url("ftp://apps.example.com").unwrap_err();
        assert!(errors.has(MANIFEST_URL_FIELD, AppErrorCode::InvalidUrlFormat));
        assert!(clean_manifest_url("manifest.json").is_err());
    }

    #[test]
    fn failures_map_to_field_errors() {
        let errors = FetchFailure::TimedOut.into_errors();
        assert_eq!(
            errors.get(MANIFEST_URL_FIELD).unwrap()[0].message,
            "The request to fetch manifest data timed out."
        );
        assert!(FetchFailure::Status(500)
            .into_errors()
            .has(MANIFEST_URL_FIELD, AppErrorCode::ManifestUrlCantConnect));
        assert!(FetchFailure::InvalidFormat
            .into_errors()
            .has(MANIFEST_URL_FIELD, AppErrorCode::InvalidManifestFormat));
        assert!(FetchFailure::Unavailable("refused".to_string())
            .into_errors()
            .has(MANIFEST_URL_FIELD, AppErrorCode::Invalid));
    }

    #[tokio::test]
    async fn fetches_json_documents() {
        let addr = fixture_server().await;
        let value = source()
            .fetch(&format!("http://{addr}/manifest"))
            .await
            .expect("manifest");
        assert_eq!(value, json!({ "id": "app" }));
    }

    #[tokio::test]
    async fn reports_error_statuses_and_bad_bodies() {
        let addr = fixture_server().await;
        let source = source();

        assert_eq!(
            source.fetch(&format!("http://{addr}/missing")).await,
            Err(FetchFailure::Status(404))
        );
        assert_eq!(
            source.fetch(&format!("http://{addr}/text")).await,
            Err(FetchFailure::InvalidFormat)
        );
    }

    #[tokio::test]
    async fn rejects_oversized_bodies() {
        let addr = fixture_server().await;
        assert_eq!(
            source().fetch(&format!("http://{addr}/huge")).await,
            Err(FetchFailure::InvalidFormat)
        );
    }

    #[tokio::test]
    async fn does_not_follow_redirects() {
        let addr = fixture_server().await;
        assert_eq!(
            source().fetch(&format!("http://{addr}/moved")).await,
            Err(FetchFailure::InvalidFormat)
        );
    }

    #[tokio::test]
    async fn times_out_slow_servers() {
        let addr = fixture_server().await;
        assert_eq!(
            source().fetch(&format!("http://{addr}/slow")).await,
            Err(FetchFailure::TimedOut)
        );
    }

    #[tokio::test]
    async fn unreachable_hosts_are_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let result = source().fetch(&format!("http://{addr}/manifest")).await;
        assert!(matches!(result, Err(FetchFailure::Unavailable(_))));
    }
}

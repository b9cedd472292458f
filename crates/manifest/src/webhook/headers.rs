//! Custom header policy for webhook deliveries.

use std::collections::BTreeMap;

use http::{HeaderName, HeaderValue};
use thiserror::Error;

pub const MAX_HEADERS: usize = 5;
/// Limit on `name.len() + value.len()` for a single header line.
pub const MAX_HEADER_LENGTH: usize = 998;

const ALLOWED_PREFIXES: &[&str] = &["x-", "authorization"];
const ALLOWED_NAMES: &[&str] = &["brokerproperties"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderPolicyError {
    #[error("Number of headers exceeds the limit of {max}.")]
    TooMany { max: usize },
    #[error("\"{name}\" does not match allowed key pattern: \"X-*\", \"Authorization*\", or \"BrokerProperties\".")]
    NotAllowed { name: String },
    #[error("Header \"{name}\" must consist of at most {max} characters.")]
    TooLong { name: String, max: usize },
    #[error("Header name \"{name}\" is not a valid HTTP header name.")]
    InvalidName { name: String },
    #[error("Header \"{name}\" has an invalid value.")]
    InvalidValue { name: String },
}

/// Decides which custom headers a webhook may send.
///
/// Implementations return the headers as they should be stored, so a policy
/// may normalise names.
pub trait HeaderPolicy: Send + Sync {
    fn check(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, HeaderPolicyError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultHeaderPolicy;

impl HeaderPolicy for DefaultHeaderPolicy {
    fn check(
        &self,
        headers: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, String>, HeaderPolicyError> {
        if headers.len() > MAX_HEADERS {
            return Err(HeaderPolicyError::TooMany { max: MAX_HEADERS });
        }

        let mut cleaned = BTreeMap::new();
        for (name, value) in headers {
            let lowered = name.to_ascii_lowercase();
            let allowed = ALLOWED_PREFIXES
                .iter()
                .any(|prefix| lowered.starts_with(prefix))
                || ALLOWED_NAMES.contains(&lowered.as_str());
            if !allowed {
                return Err(HeaderPolicyError::NotAllowed { name: name.clone() });
            }
            if name.len() + value.len() > MAX_HEADER_LENGTH {
                return Err(HeaderPolicyError::TooLong {
                    name: name.clone(),
                    max: MAX_HEADER_LENGTH,
                });
            }
            HeaderName::from_bytes(lowered.as_bytes())
                .map_err(|_| HeaderPolicyError::InvalidName { name: name.clone() })?;
            HeaderValue::from_str(value)
                .map_err(|_| HeaderPolicyError::InvalidValue { name: name.clone() })?;
            cleaned.insert(lowered, value.clone());
        }
        Ok(cleaned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn accepts_allowed_names_and_lowercases_them() {
        let cleaned = DefaultHeaderPolicy
            .check(&headers(&[
                ("X-Api-Key", "secret"),
                ("Authorization", "Bearer token"),
                ("BrokerProperties", "{}"),
            ]))
            .unwrap();
        assert_eq!(
            cleaned.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["authorization", "brokerproperties", "x-api-key"]
        );
    }

    #[test]
    fn rejects_names_outside_the_allow_list() {
        let error = DefaultHeaderPolicy
            .check(&headers(&[("Content-Type", "text/plain")]))
            .unwrap_err();
        assert_eq!(
            error,
            HeaderPolicyError::NotAllowed {
                name: "Content-Type".to_string()
            }
        );
        assert!(DefaultHeaderPolicy
            .check(&headers(&[("BrokerPropertiesExtra", "1")]))
            .is_err());
    }

    #[test]
    fn limits_header_count() {
        let many: Vec<(String, String)> = (0..6)
            .map(|index| (format!("X-Header-{index}"), "v".to_string()))
            .collect();
        let error = DefaultHeaderPolicy
            .check(&many.into_iter().collect())
            .unwrap_err();
        assert_eq!(error, HeaderPolicyError::TooMany { max: 5 });
    }

    #[test]
    fn limits_header_length() {
        let value = "v".repeat(MAX_HEADER_LENGTH);
        let error = DefaultHeaderPolicy
            .check(&headers(&[("X-Long", value.as_str())]))
            .unwrap_err();
        assert!(matches!(error, HeaderPolicyError::TooLong { .. }));
    }

    #[test]
    fn rejects_illegal_tokens() {
        assert!(matches!(
            DefaultHeaderPolicy.check(&headers(&[("X-Bad Name", "v")])),
            Err(HeaderPolicyError::InvalidName { .. })
        ));
        assert!(matches!(
            DefaultHeaderPolicy.check(&headers(&[("X-Ok", "line\nbreak")])),
            Err(HeaderPolicyError::InvalidValue { .. })
        ));
    }
}

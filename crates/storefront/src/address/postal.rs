//! Pincode lookup against the India Post postal API.
//!
//! The API returns an array of envelopes, each wrapping a list of post
//! offices. A lookup succeeds when the first envelope reports `Success`
//! and carries at least one office; the city prefers the office block and
//! falls back to its district.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use kirana_core::Pincode;
use moka::future::Cache;
use serde::Deserialize;
use tracing::debug;

/// Public India Post lookup endpoint; the pincode is appended as a path
/// segment.
pub const DEFAULT_API_URL: &str = "https://api.postalpincode.in/pincode";

/// Per-request timeout for lookup calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// A failed pincode lookup.
#[derive(Debug, thiserror::Error)]
pub enum PostalLookupError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("postal lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success HTTP status.
    #[error("postal lookup returned status {status}")]
    Status {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not the expected JSON shape.
    #[error("postal lookup response was not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The API answered but knows no post office for this pincode.
    #[error("no postal records found for {pincode}")]
    NoRecords {
        /// The pincode that was looked up.
        pincode: String,
    },
}

/// City and state resolved from a pincode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalAddress {
    /// Block of the first post office, or its district when the block is
    /// absent. May be empty when the API carries neither.
    pub city: String,
    /// State of the first post office.
    pub state: String,
}

/// Resolves a pincode to a [`PostalAddress`].
///
/// The address form is generic over this trait so tests can script
/// lookups without a network.
#[async_trait]
pub trait PostalResolver: Send + Sync {
    /// Look up city and state for a pincode.
    ///
    /// # Errors
    ///
    /// Returns a [`PostalLookupError`] when the lookup cannot produce an
    /// address, including the no-records case.
    async fn resolve(&self, pincode: &Pincode) -> Result<PostalAddress, PostalLookupError>;
}

/// India Post API client with an in-memory response cache.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
#[derive(Clone)]
pub struct PostalClient {
    inner: Arc<PostalClientInner>,
}

struct PostalClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<String, PostalAddress>,
}

impl PostalClient {
    /// Create a client for the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(PostalClientInner {
                client: reqwest::Client::new(),
                base_url: base_url.into(),
                cache: Cache::builder()
                    .max_capacity(1000)
                    .time_to_live(Duration::from_secs(300)) // 5 minutes
                    .build(),
            }),
        }
    }

    async fn fetch(&self, pincode: &Pincode) -> Result<PostalAddress, PostalLookupError> {
        let url = format!("{}/{}", self.inner.base_url, pincode);
        debug!(%pincode, "fetching postal data");

        let response = self
            .inner
            .client
            .get(&url)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PostalLookupError::Status {
                status: response.status().as_u16(),
            });
        }

        let body = response.text().await?;
        parse_lookup_body(&body, pincode)
    }
}

#[async_trait]
impl PostalResolver for PostalClient {
    async fn resolve(&self, pincode: &Pincode) -> Result<PostalAddress, PostalLookupError> {
        let key = pincode.as_str().to_owned();
        if let Some(cached) = self.inner.cache.get(&key).await {
            debug!(%pincode, "postal cache hit");
            return Ok(cached);
        }

        let address = self.fetch(pincode).await?;
        self.inner.cache.insert(key, address.clone()).await;
        Ok(address)
    }
}

// ============ Wire Format ============

#[derive(Debug, Deserialize)]
struct LookupEnvelope {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "PostOffice")]
    post_offices: Option<Vec<PostOffice>>,
}

#[derive(Debug, Deserialize)]
struct PostOffice {
    #[serde(rename = "Block")]
    block: Option<String>,
    #[serde(rename = "District")]
    district: Option<String>,
    #[serde(rename = "State")]
    state: String,
}

impl PostOffice {
    /// Block when present and non-empty, district otherwise.
    fn city(&self) -> String {
        match &self.block {
            Some(block) if !block.is_empty() => block.clone(),
            _ => self.district.clone().unwrap_or_default(),
        }
    }
}

fn parse_lookup_body(body: &str, pincode: &Pincode) -> Result<PostalAddress, PostalLookupError> {
    let no_records = || PostalLookupError::NoRecords {
        pincode: pincode.as_str().to_owned(),
    };

    let envelopes: Vec<LookupEnvelope> = serde_json::from_str(body)?;
    let envelope = envelopes.into_iter().next().ok_or_else(no_records)?;
    if envelope.status != "Success" {
        return Err(no_records());
    }

    let office = envelope
        .post_offices
        .and_then(|offices| offices.into_iter().next())
        .ok_or_else(no_records)?;

    Ok(PostalAddress {
        city: office.city(),
        state: office.state,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn pincode() -> Pincode {
        Pincode::parse("400001").unwrap()
    }

    #[test]
    fn test_parse_success_prefers_block() {
        let body = r#"[{
            "Message": "Number of pincode(s) found:1",
            "Status": "Success",
            "PostOffice": [
                {"Name": "Town Hall", "Block": "Mumbai", "District": "Mumbai City", "State": "Maharashtra"}
            ]
        }]"#;
        let address = parse_lookup_body(body, &pincode()).unwrap();
        assert_eq!(address.city, "Mumbai");
        assert_eq!(address.state, "Maharashtra");
    }

    #[test]
    fn test_parse_empty_block_falls_back_to_district() {
        let body = r#"[{
            "Status": "Success",
            "PostOffice": [
                {"Block": "", "District": "Mumbai City", "State": "Maharashtra"}
            ]
        }]"#;
        let address = parse_lookup_body(body, &pincode()).unwrap();
        assert_eq!(address.city, "Mumbai City");
    }

    #[test]
    fn test_parse_missing_block_falls_back_to_district() {
        let body = r#"[{
            "Status": "Success",
            "PostOffice": [
                {"District": "Nicobar", "State": "Andaman and Nicobar Islands"}
            ]
        }]"#;
        let address = parse_lookup_body(body, &pincode()).unwrap();
        assert_eq!(address.city, "Nicobar");
    }

    #[test]
    fn test_parse_missing_block_and_district_gives_empty_city() {
        let body = r#"[{
            "Status": "Success",
            "PostOffice": [{"State": "Maharashtra"}]
        }]"#;
        let address = parse_lookup_body(body, &pincode()).unwrap();
        assert_eq!(address.city, "");
        assert_eq!(address.state, "Maharashtra");
    }

    #[test]
    fn test_parse_uses_first_post_office() {
        let body = r#"[{
            "Status": "Success",
            "PostOffice": [
                {"Block": "First", "District": "First District", "State": "Kerala"},
                {"Block": "Second", "District": "Second District", "State": "Kerala"}
            ]
        }]"#;
        let address = parse_lookup_body(body, &pincode()).unwrap();
        assert_eq!(address.city, "First");
    }

    #[test]
    fn test_parse_error_status_is_no_records() {
        let body = r#"[{"Message": "No records found", "Status": "Error", "PostOffice": null}]"#;
        let err = parse_lookup_body(body, &pincode()).unwrap_err();
        assert!(matches!(err, PostalLookupError::NoRecords { .. }));
    }

    #[test]
    fn test_parse_success_without_offices_is_no_records() {
        let body = r#"[{"Status": "Success", "PostOffice": []}]"#;
        let err = parse_lookup_body(body, &pincode()).unwrap_err();
        assert!(matches!(err, PostalLookupError::NoRecords { .. }));
    }

    #[test]
    fn test_parse_empty_array_is_no_records() {
        let err = parse_lookup_body("[]", &pincode()).unwrap_err();
        assert!(matches!(err, PostalLookupError::NoRecords { .. }));
    }

    #[test]
    fn test_parse_malformed_body() {
        let err = parse_lookup_body("<html>gateway timeout</html>", &pincode()).unwrap_err();
        assert!(matches!(err, PostalLookupError::Malformed(_)));
    }
}

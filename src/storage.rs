//! Object-store read path.
//!
//! Inbound emails land in a bucket; the pipeline fetches them by key over
//! the store's HTTP surface. Read-only, no retry: a missing or unreadable
//! object aborts the invocation.

use async_trait::async_trait;

use crate::error::StorageError;

/// Fetch-by-key abstraction over the object store.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError>;
}

/// Object store speaking plain HTTP GET `{base}/{bucket}/{key}`.
pub struct HttpObjectStore {
    base_url: String,
    client: reqwest::Client,
}

impl HttpObjectStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            client: reqwest::Client::new(),
        }
    }

    fn object_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/{bucket}/{key}", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ObjectStore for HttpObjectStore {
    async fn fetch(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(bucket, key);
        tracing::debug!(%url, "Fetching object");

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| StorageError::Http(e.to_string()))?;

        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            });
        }
        if !resp.status().is_success() {
            return Err(StorageError::FetchFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: format!("status {}", resp.status()),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| StorageError::FetchFailed {
                bucket: bucket.to_string(),
                key: key.to_string(),
                reason: e.to_string(),
            })?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn object_url_joins_bucket_and_key() {
        let store = HttpObjectStore::new("http://store.local");
        assert_eq!(
            store.object_url("inbox", "msg1"),
            "http://store.local/inbox/msg1"
        );
    }

    #[test]
    fn object_url_tolerates_trailing_slash() {
        let store = HttpObjectStore::new("http://store.local/");
        assert_eq!(
            store.object_url("inbox", "msg1"),
            "http://store.local/inbox/msg1"
        );
    }
}

//! Fetching of the initial resource list.

use serde_json::Value;
use tokio::fs;
use url::Url;

pub use reqwest::Client;

use crate::Error;

/// Resource list fetcher.
///
/// Supports `http(s)://` addresses through an HTTP client and `file://` addresses from the local storage.
/// A fetch is a single attempt: any failure is returned as is and never retried here.
#[derive(Debug, Default)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_client(self, client: Client) -> Self {
        Self { client }
    }

    /// Fetch the raw resources listed at `url`.
    ///
    /// The body must be a JSON array. Its elements are returned unvalidated.
    pub async fn fetch(&self, url: &Url) -> Result<Vec<Value>, Error> {
        tracing::debug!("Fetching resources from `{url}`");

        let body = match url.scheme() {
            "http" | "https" => self.client.get(url.clone()).send().await?.error_for_status()?.bytes().await?.to_vec(),
            "file" => {
                let path = url.to_file_path().map_err(|()| Error::UnsupportedScheme(url.to_string()))?;
                fs::read(path).await?
            }
            scheme => return Err(Error::UnsupportedScheme(scheme.to_owned())),
        };

        let resources: Vec<Value> = serde_json::from_slice(&body).map_err(Error::Decode)?;

        tracing::debug!("Fetched {} resources from `{url}`", resources.len());

        Ok(resources)
    }
}

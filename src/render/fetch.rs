//! Blocking render fetch.

use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use thiserror::Error;

/// Render fetch failures, always carrying the link that failed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to create HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("can't fetch output from {link}")]
    Transport {
        link: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("wrong status code {status}, when fetching link: {link}")]
    Status { status: StatusCode, link: String },
}

/// Fetches rendered diagrams and returns the bytes verbatim.
pub struct RenderClient {
    client: Client,
}

impl RenderClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client })
    }

    /// GET `link`; anything but 200 is an error.
    pub fn fetch(&self, link: &str) -> Result<Vec<u8>, FetchError> {
        let transport = |source| FetchError::Transport {
            link: link.to_string(),
            source,
        };

        let response = self.client.get(link).send().map_err(transport)?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                status,
                link: link.to_string(),
            });
        }

        let body = response.bytes().map_err(transport)?;
        Ok(body.to_vec())
    }
}

//! Client for the Aidge virtual try-on API.
//!
//! Calls are signed with [`auth::Signer`], a job is submitted through
//! [`TryOnClient::submit`], and [`TryOnClient::wait_for_result`] polls the
//! results endpoint until the task is finished, the caller interrupts, or a
//! configured bound is reached.
//!
//! ```no_run
//! use aidge_tryon_client::tryon::{Garment, PollOutcome};
//! use aidge_tryon_client::{Config, TryOnClient, TryOnRequest};
//!
//! # async fn run() -> aidge_tryon_client::Result<()> {
//! let client = TryOnClient::new(Config::from_env()?)?;
//! let request = TryOnRequest::builder()
//!     .clothes_list(vec![Garment::new("https://example.com/shirt.jpg", "tops")])
//!     .build();
//!
//! if let PollOutcome::Finished(response) = client.run(&[request]).await? {
//!     let _body = response.into_body();
//! }
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod polling;
pub mod tryon;

use reqwest::{Client as ReqwestClient, Request};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Unix time in milliseconds, as used in the signed query string.
pub type Timestamp = i64;

pub use auth::{Credentials, SignedRequest, Signer};
pub use config::{ApiHost, Config, Region};
pub use polling::{FixedInterval, Immediate, PollPolicy, Wait};
pub use tryon::{TryOnClient, TryOnRequest};

/// A gateway response: the verbatim body and its parsed JSON.
///
/// Business failures (exhausted quota, bad parameters) are only visible in the
/// body, whatever the HTTP status was.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq)]
pub struct ApiResponse {
    body: String,
    json: Value,
}

impl ApiResponse {
    /// Parses `body` as JSON. A body that is not JSON is an error.
    pub fn parse(body: String) -> Result<Self> {
        let json = serde_json::from_str(&body)?;
        Ok(Self { body, json })
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }

    #[must_use]
    pub fn json(&self) -> &Value {
        &self.json
    }

    #[must_use]
    pub fn into_body(self) -> String {
        self.body
    }

    /// Decodes the JSON into `T`. Absent optional fields come back as `None`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T> {
        #[cfg(feature = "tracing")]
        let value = serde_path_to_error::deserialize(&self.json)?;
        #[cfg(not(feature = "tracing"))]
        let value = serde::Deserialize::deserialize(&self.json)?;

        Ok(value)
    }
}

/// Sends an already-signed request and parses the JSON body.
///
/// The gateway reports business failures as JSON, sometimes with a non-2xx
/// status. Those bodies are returned like any other response; only a non-2xx
/// status without a JSON body is a [`Kind::Status`](error::Kind::Status) error.
pub(crate) async fn request(client: &ReqwestClient, request: Request) -> Result<ApiResponse> {
    let method = request.method().clone();
    let path = request.url().path().to_owned();

    let response = client.execute(request).await?;
    let status_code = response.status();
    let body = response.text().await?;

    if status_code.is_success() {
        #[cfg(feature = "tracing")]
        tracing::info!(method = %method, path = %path, body = %body, "API response");

        return ApiResponse::parse(body);
    }

    #[cfg(feature = "tracing")]
    tracing::warn!(
        status = %status_code,
        method = %method,
        path = %path,
        message = %body,
        "API request failed"
    );

    match serde_json::from_str(&body) {
        Ok(json) => Ok(ApiResponse { body, json }),
        Err(_) => Err(Error::status(status_code, method, path, body)),
    }
}

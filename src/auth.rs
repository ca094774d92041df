//! Request signing for the Aidge REST gateway.
//!
//! Every call carries `app_key`, a millisecond `timestamp`, and an upper-case
//! hex HMAC-SHA256 `sign` in its query string. The signature covers only the
//! secret and the timestamp, so a [`SignedRequest`] is valid for exactly one
//! timestamp and is rebuilt for every call.

use std::fmt;

use chrono::Utc;
use hmac::{Hmac, Mac as _};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client as ReqwestClient, Method, Request};
use secrecy::{ExposeSecret as _, SecretString};
use sha2::Sha256;
use url::Url;

use crate::{Result, Timestamp};

pub const PARTNER_ID: &str = "aidge";
pub const SIGN_METHOD: &str = "sha256";
pub const SIGN_VERSION: &str = "v2";

/// Header toggling the trial quota on the remote side.
pub const TRIAL_HEADER: &str = "x-iop-trial";

/// API key pair issued by the Aidge console.
#[non_exhaustive]
#[derive(Clone)]
pub struct Credentials {
    pub key_id: String,
    pub key_secret: SecretString,
}

impl Credentials {
    #[must_use]
    pub fn new(key_id: String, key_secret: SecretString) -> Self {
        Self { key_id, key_secret }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("key_id", &self.key_id)
            .field("key_secret", &"[REDACTED]")
            .finish()
    }
}

/// A fully authenticated call, ready to hand to the HTTP client.
#[non_exhaustive]
#[derive(Clone, Debug)]
pub struct SignedRequest {
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl SignedRequest {
    /// Builds a `POST` request carrying the signed url, headers and body.
    pub fn into_request(self, client: &ReqwestClient) -> Result<Request> {
        Ok(client
            .request(Method::POST, self.url)
            .headers(self.headers)
            .body(self.body)
            .build()?)
    }
}

/// Signs calls against a single API host with one set of credentials.
#[derive(Clone, Debug)]
pub struct Signer {
    host: Url,
    credentials: Credentials,
    use_trial: bool,
}

impl Signer {
    #[must_use]
    pub fn new(host: Url, credentials: Credentials, use_trial: bool) -> Self {
        Self {
            host,
            credentials,
            use_trial,
        }
    }

    #[must_use]
    pub fn host(&self) -> &Url {
        &self.host
    }

    #[must_use]
    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Signs a call to `endpoint` (e.g. `/ai/virtual/tryon-pro`) with the current time.
    pub fn sign(&self, endpoint: &str, body: Vec<u8>) -> Result<SignedRequest> {
        self.sign_at(endpoint, body, Utc::now().timestamp_millis())
    }

    /// Signs a call with an explicit millisecond timestamp.
    pub fn sign_at(
        &self,
        endpoint: &str,
        body: Vec<u8>,
        timestamp: Timestamp,
    ) -> Result<SignedRequest> {
        let timestamp = timestamp.to_string();
        let sign = signature(&self.credentials.key_secret, &timestamp)?;

        let mut url = self.host.join(&format!("rest{endpoint}"))?;
        url.query_pairs_mut()
            .clear()
            .append_pair("partner_id", PARTNER_ID)
            .append_pair("sign_method", SIGN_METHOD)
            .append_pair("sign_ver", SIGN_VERSION)
            .append_pair("app_key", &self.credentials.key_id)
            .append_pair("timestamp", &timestamp)
            .append_pair("sign", &sign);

        Ok(SignedRequest {
            url,
            headers: headers(self.use_trial),
            body,
        })
    }
}

/// Upper-case hex HMAC-SHA256 keyed by `secret` over `secret ‖ timestamp`.
pub fn signature(secret: &SecretString, timestamp: &str) -> Result<String> {
    let secret = secret.expose_secret();

    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())?;
    mac.update(secret.as_bytes());
    mac.update(timestamp.as_bytes());
    let result = mac.finalize().into_bytes();

    Ok(hex::encode_upper(result))
}

fn headers(use_trial: bool) -> HeaderMap {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    map.insert(
        HeaderName::from_static(TRIAL_HEADER),
        HeaderValue::from_static(if use_trial { "true" } else { "false" }),
    );
    map
}

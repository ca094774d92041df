use std::str::FromStr;
use std::time::Duration;

use bon::Builder;
use secrecy::SecretString;
use strum_macros::Display;
use url::Url;

use crate::Result;
use crate::auth::Credentials;
use crate::error::Error;
use crate::polling::PollPolicy;

pub const KEY_NAME_VAR: &str = "key_name";
pub const KEY_SECRET_VAR: &str = "key_secret";
pub const API_DOMAIN_VAR: &str = "api_domain";
pub const USE_TRIAL_VAR: &str = "use_trial_resource";

/// Site the API key was purchased on. Keys only work against their own site.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, Default, Display, Eq, PartialEq)]
#[strum(serialize_all = "lowercase")]
pub enum Region {
    #[default]
    Global,
    China,
}

impl Region {
    pub fn parse(value: &str) -> Result<Region> {
        match value.trim().to_ascii_lowercase().as_str() {
            "global" | "intl" => Ok(Region::Global),
            "china" | "cn" => Ok(Region::China),
            other => Err(Error::validation(format!(
                "invalid region `{other}`; expected one of: global|china"
            ))),
        }
    }

    #[must_use]
    pub const fn domain(self) -> &'static str {
        match self {
            Region::Global => "api.aidc-ai.com",
            Region::China => "cn-api.aidc-ai.com",
        }
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Region::parse(s)
    }
}

/// Where signed calls are sent.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ApiHost {
    Region(Region),
    /// Bare host name, reached over https.
    Domain(String),
    /// Full base url, used as-is. Mostly for local mocks.
    Url(Url),
}

impl Default for ApiHost {
    fn default() -> Self {
        ApiHost::Region(Region::default())
    }
}

impl ApiHost {
    /// Resolves to a base url whose path ends in `/`, so endpoint paths join under it.
    pub fn base_url(&self) -> Result<Url> {
        let mut url = match self {
            ApiHost::Region(region) => Url::parse(&format!("https://{}/", region.domain()))?,
            ApiHost::Domain(domain) => {
                let domain = domain.trim();
                if domain.is_empty() || domain.contains('/') {
                    return Err(Error::validation(format!(
                        "invalid api domain `{domain}`; expected a bare host name"
                    )));
                }
                Url::parse(&format!("https://{domain}/"))?
            }
            ApiHost::Url(url) => url.clone(),
        };

        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        url.set_query(None);
        Ok(url)
    }
}

/// Client configuration, built once at startup and passed into the client.
#[non_exhaustive]
#[derive(Clone, Debug, Builder)]
pub struct Config {
    pub credentials: Credentials,
    #[builder(default)]
    pub host: ApiHost,
    /// Draw from the trial quota instead of purchased calls.
    #[builder(default = true)]
    pub use_trial: bool,
    /// Per-call HTTP timeout. `None` lets a call block until the remote answers.
    pub request_timeout: Option<Duration>,
    #[builder(default)]
    pub poll: PollPolicy,
}

impl Config {
    /// Loads credentials and host settings from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which maps a variable name to its value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name).ok_or_else(|| {
                Error::validation(format!("missing required environment variable `{name}`"))
            })
        };

        let key_id = required(KEY_NAME_VAR)?;
        let key_secret = SecretString::from(required(KEY_SECRET_VAR)?);
        let host = lookup(API_DOMAIN_VAR)
            .map(ApiHost::Domain)
            .unwrap_or_default();
        let use_trial = lookup(USE_TRIAL_VAR)
            .map(|value| parse_bool(USE_TRIAL_VAR, &value))
            .transpose()?
            .unwrap_or(true);

        Ok(Self::builder()
            .credentials(Credentials::new(key_id, key_secret))
            .host(host)
            .use_trial(use_trial)
            .build())
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::validation(format!(
            "invalid `{name}` value `{other}`; expected true|false"
        ))),
    }
}

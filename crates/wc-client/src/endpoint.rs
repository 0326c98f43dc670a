//! Service endpoint parsing and normalization.

use std::fmt;
use url::Url;
use wc_core::{ConsoleError, Result};

/// A validated service endpoint plus the optional credential used to reach it.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    url: String,
    scheme: String,
    host: String,
    port: u16,
    api_key: Option<String>,
}

impl Endpoint {
    /// Normalizes a candidate URL.
    ///
    /// URLs without a scheme are assumed to be `http://`. Only `http` and
    /// `https` are accepted, a host is required, query strings and fragments
    /// are rejected, and trailing slashes are dropped.
    pub fn normalize(candidate: &str) -> Result<String> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(ConsoleError::validation("URL is required"));
        }

        let with_scheme = match trimmed.split_once("://") {
            Some((scheme, _)) => {
                let scheme = scheme.to_ascii_lowercase();
                if scheme != "http" && scheme != "https" {
                    return Err(ConsoleError::validation(format!(
                        "Invalid URL format: unsupported scheme '{scheme}'"
                    )));
                }
                trimmed.to_string()
            }
            None => format!("http://{trimmed}"),
        };

        let parsed = Url::parse(&with_scheme)
            .map_err(|e| ConsoleError::validation(format!("Invalid URL format: {e}")))?;
        if parsed.host_str().map_or(true, str::is_empty) {
            return Err(ConsoleError::validation("Invalid URL format: missing host"));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(ConsoleError::validation(
                "Invalid URL format: query strings and fragments are not allowed",
            ));
        }

        Ok(parsed.as_str().trim_end_matches('/').to_string())
    }

    pub fn parse(candidate: &str, api_key: Option<String>) -> Result<Self> {
        let url = Self::normalize(candidate)?;
        let parsed = Url::parse(&url)
            .map_err(|e| ConsoleError::validation(format!("Invalid URL format: {e}")))?;

        let host = parsed
            .host_str()
            .ok_or_else(|| ConsoleError::validation("Invalid URL format: missing host"))?
            .to_string();
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| ConsoleError::validation("Invalid URL format: missing port"))?;

        Ok(Self {
            scheme: parsed.scheme().to_string(),
            host,
            port,
            url,
            api_key: api_key.filter(|k| !k.is_empty()),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_secure(&self) -> bool {
        self.scheme == "https"
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    /// Absolute URL for a path below the endpoint, e.g. `/v1/schema`.
    pub fn join(&self, path: &str) -> String {
        format!("{}/{}", self.url, path.trim_start_matches('/'))
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("url", &self.url)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#![forbid(unsafe_code)]

use crate::source::{DataSource, Page, SourceError, decode_page};
use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use rp_core::entity::EntityType;
use rp_core::ids::Cursor;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.repsly.com/v3/export/";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct HttpSourceConfig {
    pub api_base: String,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

impl std::fmt::Debug for HttpSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSourceConfig")
            .field("api_base", &self.api_base)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Export API client: `GET {api_base}{endpoint}/{cursor}` with HTTP Basic auth.
pub struct HttpSource {
    client: Client,
    api_base: String,
    username: String,
    password: String,
}

impl HttpSource {
    /// Validates the configuration and builds the client. Fails before any
    /// request is made, so a bad base URL never reaches the sync loop.
    pub fn new(config: HttpSourceConfig) -> Result<Self, SourceError> {
        let api_base = config.api_base.trim();
        if api_base.is_empty() {
            return Err(SourceError::Config("api base is empty".to_string()));
        }
        let parsed = reqwest::Url::parse(api_base)
            .map_err(|err| SourceError::Config(format!("api base {api_base:?}: {err}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SourceError::Config(format!(
                "api base {api_base:?} must be http or https"
            )));
        }
        if config.username.trim().is_empty() {
            return Err(SourceError::Config("username is empty".to_string()));
        }
        if config.timeout.is_zero() {
            return Err(SourceError::Config("timeout must be > 0".to_string()));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|err| SourceError::Config(format!("build http client: {err}")))?;

        let api_base = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };

        Ok(Self {
            client,
            api_base,
            username: config.username,
            password: config.password,
        })
    }

    fn page_url(&self, entity: EntityType, after: Cursor) -> String {
        format!("{}{}/{}", self.api_base, entity.endpoint(), after)
    }
}

impl std::fmt::Debug for HttpSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpSource")
            .field("api_base", &self.api_base)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl DataSource for HttpSource {
    fn fetch_page(&self, entity: EntityType, after: Cursor) -> Result<Page, SourceError> {
        let url = self.page_url(entity, after);
        log::debug!("GET {url}");

        let resp = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .header(ACCEPT, "application/json")
            .send()
            .map_err(|err| SourceError::Transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Status {
                entity,
                status: status.as_u16(),
            });
        }

        let body = resp
            .bytes()
            .map_err(|err| SourceError::Transport(err.to_string()))?;
        decode_page(entity, &body)
    }
}

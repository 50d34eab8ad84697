//! qBittorrent Web API collaborator.

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::config::QBittorrentConfig;
use crate::hooks::{HookError, TorrentRemover};

/// Removes finished torrents over the qBittorrent Web API.
pub struct QbClient {
    client: Client,
    config: QBittorrentConfig,
}

impl QbClient {
    pub fn new(config: QBittorrentConfig) -> Result<Self, HookError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| HookError::ConnectionFailed(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login; the session cookie lands in the cookie jar.
    fn login(&self) -> Result<(), HookError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());
        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .map_err(map_request_error)?;

        let status = response.status();
        let body = response.text().unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(HookError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(HookError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }
}

fn map_request_error(e: reqwest::Error) -> HookError {
    if e.is_timeout() {
        HookError::Timeout
    } else if e.is_connect() {
        HookError::ConnectionFailed(e.to_string())
    } else {
        HookError::ApiError(e.to_string())
    }
}

impl TorrentRemover for QbClient {
    fn name(&self) -> &str {
        "qbittorrent"
    }

    fn remove(&self, hash: &str) -> Result<(), HookError> {
        debug!("Removing torrent {}", hash);
        self.login()?;

        let hash_lower = hash.to_lowercase();
        let url = format!("{}/api/v2/torrents/delete", self.base_url());
        let response = self
            .client
            .post(&url)
            .form(&[("hashes", hash_lower.as_str()), ("deleteFiles", "false")])
            .send()
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(HookError::ApiError(format!("HTTP {}: {}", status, body)));
        }
        Ok(())
    }
}

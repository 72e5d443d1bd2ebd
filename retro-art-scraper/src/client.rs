use std::sync::Arc;

use async_trait::async_trait;
use retro_art_lib::RomHashes;
use tokio::time::Duration;

use crate::credentials::Credentials;
use crate::error::ScrapeError;
use crate::rate_limit::RateLimiter;

const BASE_URL: &str = "https://api.screenscraper.fr/api2";
const API_TIMEOUT: Duration = Duration::from_secs(30);

/// Parameters of a single game search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameQuery {
    pub system_id: u32,
    /// ROM file name, extension included
    pub rom_name: Option<String>,
    pub crc32: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

impl GameQuery {
    pub fn by_name(system_id: u32, rom_name: &str) -> Self {
        Self {
            system_id,
            rom_name: Some(rom_name.to_string()),
            ..Default::default()
        }
    }

    pub fn by_hash(system_id: u32, hashes: &RomHashes) -> Self {
        Self {
            system_id,
            crc32: Some(hashes.crc32.clone()),
            md5: Some(hashes.md5.clone()),
            sha1: Some(hashes.sha1.clone()),
            ..Default::default()
        }
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("systemeid", self.system_id.to_string())];
        let optional = [
            ("romnom", &self.rom_name),
            ("crc", &self.crc32),
            ("md5", &self.md5),
            ("sha1", &self.sha1),
        ];
        for (key, value) in optional {
            if let Some(v) = value {
                params.push((key, v.clone()));
            }
        }
        params
    }
}

/// Raw HTTP outcome of an API call. Interpretation is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport to the remote catalog.
///
/// Implementations return every HTTP status as data; only transport-level
/// failures (DNS, TLS, timeouts) are errors.
#[async_trait]
pub trait SearchApi: Send + Sync {
    async fn game_info(&self, query: &GameQuery) -> Result<ApiResponse, ScrapeError>;
    async fn user_info(&self) -> Result<ApiResponse, ScrapeError>;
}

/// HTTP client for the ScreenScraper API. Every call passes through the
/// shared [`RateLimiter`] first.
pub struct ScreenScraperClient {
    http: reqwest::Client,
    creds: Credentials,
    limiter: Arc<RateLimiter>,
}

impl ScreenScraperClient {
    pub fn new(creds: Credentials, limiter: Arc<RateLimiter>) -> Result<Self, ScrapeError> {
        let http = reqwest::Client::builder()
            .connect_timeout(API_TIMEOUT)
            .timeout(API_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            creds,
            limiter,
        })
    }

    async fn get(
        &self,
        endpoint: &str,
        extra: Vec<(&'static str, String)>,
    ) -> Result<ApiResponse, ScrapeError> {
        let mut params = self.base_params();
        params.extend(extra);

        self.limiter.acquire().await;

        let resp = self
            .http
            .get(format!("{}/{}", BASE_URL, endpoint))
            .query(&params)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        log::debug!("GET {} -> {} ({} bytes)", endpoint, status, body.len());
        Ok(ApiResponse { status, body })
    }

    fn base_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("devid", self.creds.dev_id.clone()),
            ("devpassword", self.creds.dev_password.clone()),
            ("softname", self.creds.soft_name.clone()),
            ("output", "json".to_string()),
        ];
        if let Some(ref id) = self.creds.user_id {
            params.push(("ssid", id.clone()));
        }
        if let Some(ref pw) = self.creds.user_password {
            params.push(("sspassword", pw.clone()));
        }
        params
    }
}

#[async_trait]
impl SearchApi for ScreenScraperClient {
    async fn game_info(&self, query: &GameQuery) -> Result<ApiResponse, ScrapeError> {
        self.get("jeuInfos.php", query.params()).await
    }

    async fn user_info(&self) -> Result<ApiResponse, ScrapeError> {
        self.get("ssuserInfos.php", Vec::new()).await
    }
}

/// Worker-pool size for a run: the user's cap, bounded by what the server
/// allows, and never below one.
pub fn effective_workers(user_cap: Option<usize>, server_max: u32) -> usize {
    let server_max = (server_max as usize).max(1);
    user_cap.unwrap_or(server_max).clamp(1, server_max)
}

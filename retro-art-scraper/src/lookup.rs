use std::sync::Arc;

use retro_art_lib::RomHashes;

use crate::client::{ApiResponse, GameQuery, SearchApi};
use crate::error::ScrapeError;
use crate::types::{GameInfo, JeuInfosResponse, UserInfo, UserInfoResponse};

/// How a game was matched in the remote catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupMethod {
    /// Matched by ROM file name
    Filename,
    /// Matched by hash (CRC32 + MD5 + SHA1)
    Hash,
}

impl std::fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupMethod::Filename => write!(f, "filename"),
            LookupMethod::Hash => write!(f, "hash"),
        }
    }
}

/// Game search against the remote catalog, with status codes translated
/// into typed outcomes.
///
/// `Ok(None)` means the catalog has no match. Auth failures come back as
/// [`ScrapeError::InvalidCredentials`], quota exhaustion as
/// [`ScrapeError::QuotaExceeded`] and throttling as [`ScrapeError::RateLimit`].
#[derive(Clone)]
pub struct GameLookupClient {
    api: Arc<dyn SearchApi>,
}

impl GameLookupClient {
    pub fn new(api: Arc<dyn SearchApi>) -> Self {
        Self { api }
    }

    /// Search by file name, then by hashes if the name is unknown and
    /// hashes are available.
    pub async fn search(
        &self,
        rom_name: &str,
        system_id: u32,
        hashes: Option<&RomHashes>,
    ) -> Result<Option<GameInfo>, ScrapeError> {
        if let Some(game) = self.search_by_name(rom_name, system_id).await? {
            return Ok(Some(game));
        }
        match hashes {
            Some(hashes) => self.search_by_hash(system_id, hashes).await,
            None => Ok(None),
        }
    }

    pub async fn search_by_name(
        &self,
        rom_name: &str,
        system_id: u32,
    ) -> Result<Option<GameInfo>, ScrapeError> {
        let resp = self
            .api
            .game_info(&GameQuery::by_name(system_id, rom_name))
            .await?;
        interpret_game_response(resp, LookupMethod::Filename)
    }

    pub async fn search_by_hash(
        &self,
        system_id: u32,
        hashes: &RomHashes,
    ) -> Result<Option<GameInfo>, ScrapeError> {
        log::debug!("Searching system {} by hash (crc {})", system_id, hashes.crc32);
        let resp = self
            .api
            .game_info(&GameQuery::by_hash(system_id, hashes))
            .await?;
        interpret_game_response(resp, LookupMethod::Hash)
    }

    /// Validate credentials and read the account's allowances.
    pub async fn fetch_user_info(&self) -> Result<UserInfo, ScrapeError> {
        let resp = self.api.user_info().await?;
        match resp.status {
            200 => {}
            401 | 403 => {
                return Err(ScrapeError::InvalidCredentials(
                    "Invalid developer or user credentials".to_string(),
                ));
            }
            430 => return Err(ScrapeError::QuotaExceeded("Daily quota exceeded".to_string())),
            429 => return Err(ScrapeError::RateLimit),
            status => {
                return Err(ScrapeError::ServerError {
                    status,
                    message: snippet(&resp.body),
                });
            }
        }
        let info: UserInfoResponse = serde_json::from_str(&resp.body).map_err(|e| {
            ScrapeError::Api(format!(
                "Failed to parse user info: {e}. Response: {}",
                snippet(&resp.body)
            ))
        })?;
        Ok(info.response.ssuser)
    }
}

fn interpret_game_response(
    resp: ApiResponse,
    method: LookupMethod,
) -> Result<Option<GameInfo>, ScrapeError> {
    match resp.status {
        200 => {}
        401 | 403 => {
            return Err(ScrapeError::InvalidCredentials(
                "Credentials rejected".to_string(),
            ));
        }
        404 => {
            log::debug!("No match by {}", method);
            return Ok(None);
        }
        429 => return Err(ScrapeError::RateLimit),
        430 => return Err(ScrapeError::QuotaExceeded("Daily quota exceeded".to_string())),
        status => {
            return Err(ScrapeError::ServerError {
                status,
                message: snippet(&resp.body),
            });
        }
    }

    // The service also answers 200 with plain-text errors
    let text = resp.body.trim();
    if text.contains("Le quota de scrape journalier") {
        return Err(ScrapeError::QuotaExceeded(snippet(text)));
    }
    if text.contains("API fermé") || text.contains("API closed") {
        return Err(ScrapeError::Api(
            "ScreenScraper API is temporarily closed".to_string(),
        ));
    }
    if text.is_empty() || text.contains("Erreur") || text.contains("Jeu non trouvé") {
        log::debug!("No match by {}", method);
        return Ok(None);
    }

    let response: JeuInfosResponse = serde_json::from_str(text).map_err(|e| {
        ScrapeError::Api(format!(
            "Failed to parse game info: {e}. Response: {}",
            snippet(text)
        ))
    })?;
    log::debug!("Matched game {} by {}", response.response.jeu.id, method);
    Ok(Some(response.response.jeu))
}

fn snippet(text: &str) -> String {
    text.chars().take(200).collect()
}

#[cfg(test)]
#[path = "tests/lookup_tests.rs"]
mod tests;

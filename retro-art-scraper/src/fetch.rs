//! Per-ROM artwork acquisition.
//!
//! [`ArtworkFetcher::fetch`] turns one ROM into exactly one [`FetchOutcome`]:
//! it works out which categories are missing, finds the game (by name, then
//! by hash), downloads what it can, and classifies the result. Every error
//! is contained in the outcome; only auth and quota failures are marked
//! fatal for the caller to act on.

use std::sync::Arc;

use retro_art_lib::RomEntry;
use tokio::time::Duration;

use crate::error::ScrapeError;
use crate::lookup::GameLookupClient;
use crate::media::{ArtworkCategory, select_media_url};
use crate::memo::NotFoundMemo;
use crate::store::ArtworkStore;
use crate::types::GameInfo;

/// Result of fetching artwork for one ROM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Every missing category was downloaded.
    Success { downloaded: Vec<ArtworkCategory> },
    /// Some categories were downloaded, others failed.
    PartialSuccess {
        downloaded: Vec<ArtworkCategory>,
        failed: Vec<ArtworkCategory>,
    },
    /// The catalog has no match by name or hash.
    NotFound,
    /// Per-ROM failure; the batch continues.
    Error { message: String },
    /// Credentials rejected. Stops the batch.
    AuthError { message: String },
    /// Daily quota used up. Stops the batch.
    QuotaExceeded { message: String },
    /// Nothing to do: artwork already present, or a known miss.
    Skipped,
}

impl FetchOutcome {
    /// Whether this outcome must stop the whole batch.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::AuthError { .. } | Self::QuotaExceeded { .. })
    }

    /// Number of artwork files written.
    pub fn downloaded_count(&self) -> usize {
        match self {
            Self::Success { downloaded } | Self::PartialSuccess { downloaded, .. } => {
                downloaded.len()
            }
            _ => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::PartialSuccess { .. } => "partial",
            Self::NotFound => "not found",
            Self::Error { .. } => "error",
            Self::AuthError { .. } => "auth error",
            Self::QuotaExceeded { .. } => "quota exceeded",
            Self::Skipped => "skipped",
        }
    }

    fn classify(downloaded: Vec<ArtworkCategory>, failed: Vec<ArtworkCategory>) -> Self {
        match (downloaded.is_empty(), failed.is_empty()) {
            (true, true) => Self::NotFound,
            (false, true) => Self::Success { downloaded },
            (false, false) => Self::PartialSuccess { downloaded, failed },
            (true, false) => Self::Error {
                message: format!("Failed to download all artwork ({})", join(&failed)),
            },
        }
    }
}

fn join(categories: &[ArtworkCategory]) -> String {
    categories
        .iter()
        .map(|c| c.label())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Backoff schedule applied after the API signals rate limiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first rate-limited attempt
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(30_000),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry.saturating_sub(1));
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// One pass over a ROM, before any backoff.
enum Attempt {
    Done(FetchOutcome),
    RateLimited,
}

/// Fetches the missing artwork of a single ROM.
pub struct ArtworkFetcher {
    lookup: GameLookupClient,
    store: Arc<dyn ArtworkStore>,
    memo: Arc<dyn NotFoundMemo>,
    categories: Vec<ArtworkCategory>,
    retry: RetryPolicy,
}

impl ArtworkFetcher {
    pub fn new(
        lookup: GameLookupClient,
        store: Arc<dyn ArtworkStore>,
        memo: Arc<dyn NotFoundMemo>,
    ) -> Self {
        Self {
            lookup,
            store,
            memo,
            categories: ArtworkCategory::ALL.to_vec(),
            retry: RetryPolicy::default(),
        }
    }

    /// Restrict the run to a subset of categories. Empty means all.
    pub fn with_categories(mut self, categories: Vec<ArtworkCategory>) -> Self {
        if !categories.is_empty() {
            self.categories = categories;
        }
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn categories(&self) -> &[ArtworkCategory] {
        &self.categories
    }

    /// Fetch artwork for `rom`, retrying with backoff while rate limited.
    ///
    /// During the retries, an `Error` outcome or another rate-limit signal
    /// just uses up the attempt. Once retries run out the outcome is an
    /// `Error`.
    pub async fn fetch(&self, rom: &RomEntry, system_id: u32) -> FetchOutcome {
        if let Attempt::Done(outcome) = self.attempt(rom, system_id).await {
            return outcome;
        }

        for retry in 1..=self.retry.max_retries {
            let delay = self.retry.delay_for(retry);
            log::info!(
                "Rate limited on {}, retrying in {}ms ({}/{})",
                rom.name,
                delay.as_millis(),
                retry,
                self.retry.max_retries
            );
            tokio::time::sleep(delay).await;

            match self.attempt(rom, system_id).await {
                Attempt::RateLimited | Attempt::Done(FetchOutcome::Error { .. }) => continue,
                Attempt::Done(outcome) => return outcome,
            }
        }

        FetchOutcome::Error {
            message: "rate limited after retries".to_string(),
        }
    }

    async fn attempt(&self, rom: &RomEntry, system_id: u32) -> Attempt {
        let game_name = rom.rom_stem();
        let mut needed = Vec::new();
        for &category in &self.categories {
            if !self.store.exists(&rom.system_folder, game_name, category).await {
                needed.push(category);
            }
        }
        if needed.is_empty() {
            return Attempt::Done(FetchOutcome::Skipped);
        }

        if self.memo.contains(&rom.not_found_key()) {
            log::debug!("Skipping {}: previously not found", rom.not_found_key());
            return Attempt::Done(FetchOutcome::Skipped);
        }

        let game = match self.find_game(rom, system_id).await {
            Ok(Some(game)) => game,
            Ok(None) => return Attempt::Done(FetchOutcome::NotFound),
            Err(ScrapeError::RateLimit) => return Attempt::RateLimited,
            Err(ScrapeError::InvalidCredentials(message)) => {
                return Attempt::Done(FetchOutcome::AuthError { message });
            }
            Err(ScrapeError::QuotaExceeded(message)) => {
                return Attempt::Done(FetchOutcome::QuotaExceeded { message });
            }
            Err(e) => {
                return Attempt::Done(FetchOutcome::Error {
                    message: e.to_string(),
                });
            }
        };

        let mut downloaded = Vec::new();
        let mut failed = Vec::new();
        for category in needed {
            let Some(url) = select_media_url(&game.medias, category) else {
                log::debug!("No {} artwork for {}", category, rom.name);
                failed.push(category);
                continue;
            };
            if self
                .store
                .save(url, &rom.system_folder, game_name, category)
                .await
            {
                downloaded.push(category);
            } else {
                failed.push(category);
            }
        }

        Attempt::Done(FetchOutcome::classify(downloaded, failed))
    }

    /// Name search, then a hash search if the name is unknown.
    async fn find_game(
        &self,
        rom: &RomEntry,
        system_id: u32,
    ) -> Result<Option<GameInfo>, ScrapeError> {
        if let Some(game) = self.lookup.search_by_name(&rom.name, system_id).await? {
            return Ok(Some(game));
        }
        log::debug!("{} not found by name, trying hashes", rom.name);
        let hashes = retro_art_lib::hash_file(&rom.path).await?;
        self.lookup.search_by_hash(system_id, &hashes).await
    }
}

#[cfg(test)]
#[path = "tests/fetch_tests.rs"]
mod tests;

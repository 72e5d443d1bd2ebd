pub mod batch;
pub mod client;
pub mod credentials;
pub mod error;
pub mod fetch;
pub mod lookup;
pub mod media;
pub mod memo;
pub mod rate_limit;
pub mod store;
pub mod summary;
pub mod types;

#[cfg(test)]
mod test_support;

pub use batch::{
    BatchEvent, BatchEvents, BatchProgress, BatchScheduler, BatchState, RomJob, SystemProgress,
    jobs_from_systems,
};
pub use client::{ApiResponse, GameQuery, ScreenScraperClient, SearchApi, effective_workers};
pub use credentials::{
    CredentialSource, CredentialSources, Credentials, config_path, credential_sources,
    save_to_file,
};
pub use error::ScrapeError;
pub use fetch::{ArtworkFetcher, FetchOutcome, RetryPolicy};
pub use lookup::{GameLookupClient, LookupMethod};
pub use media::{ArtworkCategory, select_media_url};
pub use memo::{FileNotFoundMemo, NotFoundMemo, default_memo_path};
pub use rate_limit::{MIN_REQUEST_INTERVAL, RateLimiter};
pub use store::{ArtworkStore, FsArtworkStore};
pub use summary::{BatchSummary, SummaryCounts};

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;
use tokio_util::sync::CancellationToken;

use retro_art_lib::async_util::run_with_events;
use retro_art_lib::{RomSystem, load_settings, resolve_library_path, scan_library, system_info};
use retro_art_scraper::{
    ArtworkCategory, ArtworkFetcher, BatchScheduler, BatchState, BatchSummary, Credentials,
    FileNotFoundMemo, FsArtworkStore, GameLookupClient, NotFoundMemo, RateLimiter,
    ScrapeError, ScreenScraperClient, SearchApi, default_memo_path, effective_workers,
    jobs_from_systems,
};

use crate::error::CliError;
use crate::progress::{self, BatchBar};

/// Validate credentials and size the worker pool from the account allowance.
async fn connect(
    lookup: &GameLookupClient,
    threads: Option<usize>,
    quiet: bool,
) -> Result<usize, CliError> {
    let pb = progress::spinner("Connecting to ScreenScraper...", quiet);
    let result = lookup.fetch_user_info().await;
    pb.finish_and_clear();

    match result {
        Ok(user) => {
            let workers = effective_workers(threads, user.max_threads());
            log::info!(
                "{} Connected to ScreenScraper (requests today: {}/{}, using: {} workers)",
                "\u{2714}".if_supports_color(Stdout, |t| t.green()),
                user.requests_today(),
                user.max_requests_per_day(),
                workers,
            );
            Ok(workers)
        }
        Err(e @ (ScrapeError::InvalidCredentials(_) | ScrapeError::QuotaExceeded(_))) => {
            Err(e.into())
        }
        Err(e) => {
            log::warn!(
                "{} Could not read account limits, using 1 worker: {}",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                e,
            );
            Ok(effective_workers(threads, 1))
        }
    }
}

fn log_credential_help() {
    log::error!("");
    log::error!("Set credentials via environment variables:");
    log::error!("  SCREENSCRAPER_DEVID, SCREENSCRAPER_DEVPASSWORD");
    log::error!("  SCREENSCRAPER_SSID, SCREENSCRAPER_SSPASSWORD (optional)");
    log::error!("");
    match retro_art_scraper::config_path() {
        Some(p) => log::error!("Or add a [screenscraper] table to {}", p.display()),
        None => log::error!("Or add a [screenscraper] table to the credentials file."),
    }
}

/// Keep only the systems named by `filter` (folder names or aliases).
///
/// Every name must resolve to a known system; a name that matches no scanned
/// folder is not an error.
pub(crate) fn select_systems(
    systems: Vec<RomSystem>,
    filter: Option<&[String]>,
) -> Result<Vec<RomSystem>, CliError> {
    let Some(names) = filter else {
        return Ok(systems);
    };

    let mut wanted = HashSet::new();
    for name in names {
        let info = system_info(name).ok_or_else(|| CliError::unknown_system(name.clone()))?;
        wanted.insert(info.id);
    }
    Ok(systems
        .into_iter()
        .filter(|s| wanted.contains(&s.system_id))
        .collect())
}

/// Categories from the command line, else settings, else all.
pub(crate) fn resolve_categories(
    cli: Option<&[String]>,
    settings: Option<&[String]>,
) -> Result<Vec<ArtworkCategory>, CliError> {
    match cli.or(settings) {
        Some(names) => ArtworkCategory::parse_list(names).map_err(CliError::config),
        None => Ok(ArtworkCategory::ALL.to_vec()),
    }
}

fn log_file_path(root: &Path) -> PathBuf {
    root.join(format!(
        "retro-art-log-{}.txt",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ))
}

/// Run the scrape command.
pub(crate) fn run_scrape(
    root: Option<PathBuf>,
    threads: Option<usize>,
    categories: Option<Vec<String>>,
    systems: Option<Vec<String>>,
    no_log: bool,
    quiet: bool,
) -> Result<(), CliError> {
    let settings = load_settings();
    let root_path = resolve_library_path(root, &settings);
    let categories = resolve_categories(
        categories.as_deref(),
        settings.scrape.categories.as_deref(),
    )?;
    let threads = threads.or(settings.scrape.threads);

    let creds = Credentials::load().inspect_err(|_| log_credential_help())?;

    log::info!(
        "Fetching artwork in: {}",
        root_path.display().if_supports_color(Stdout, |t| t.cyan()),
    );
    log::info!(
        "{}",
        format!(
            "Categories: {}",
            categories
                .iter()
                .map(|c| c.label())
                .collect::<Vec<_>>()
                .join(", ")
        )
        .if_supports_color(Stdout, |t| t.dimmed()),
    );
    log::info!("");

    let rt = tokio::runtime::Runtime::new().map_err(|e| CliError::runtime(e.to_string()))?;

    rt.block_on(async {
        let limiter = Arc::new(RateLimiter::new());
        let api: Arc<dyn SearchApi> = Arc::new(ScreenScraperClient::new(creds, limiter)?);
        let lookup = GameLookupClient::new(api);

        let workers = match connect(&lookup, threads, quiet).await {
            Ok(n) => n,
            Err(e) => {
                if matches!(e, CliError::Scrape(ScrapeError::InvalidCredentials(_))) {
                    log_credential_help();
                }
                return Err(e);
            }
        };

        let scanned = scan_library(&root_path)?;
        let scanned = select_systems(scanned, systems.as_deref())?;
        if scanned.is_empty() {
            log::warn!(
                "{} No ROMs found in recognised system folders under {}",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                root_path.display(),
            );
            return Ok(());
        }
        for system in &scanned {
            log::info!(
                "  {} {}",
                system.display_name.if_supports_color(Stdout, |t| t.bold()),
                format!("({}, {} ROMs)", system.folder_name, system.roms.len())
                    .if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        log::info!("");

        let jobs = jobs_from_systems(&scanned);
        let total = jobs.len();

        let memo: Arc<FileNotFoundMemo> = Arc::new(match default_memo_path() {
            Some(path) => FileNotFoundMemo::open(path)?,
            None => {
                log::warn!("Could not determine data directory; not-found ROMs won't be remembered");
                FileNotFoundMemo::in_memory()
            }
        });
        let memo_dyn: Arc<dyn NotFoundMemo> = memo.clone();
        let store = Arc::new(FsArtworkStore::new(&root_path)?);
        let fetcher = Arc::new(
            ArtworkFetcher::new(lookup.clone(), store, memo_dyn.clone()).with_categories(categories),
        );
        let scheduler = BatchScheduler::new(fetcher, memo_dyn, workers);

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!(
                    "{} Interrupted, stopping after in-flight ROMs are abandoned",
                    "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                );
                interrupt.cancel();
            }
        });

        let bar = BatchBar::new(total, quiet);
        let mut summary = BatchSummary::new();
        let (event_tx, event_rx) = tokio::sync::mpsc::unbounded_channel();

        let state = run_with_events(scheduler.run(jobs, event_tx, cancel.clone()), event_rx, |e| {
            bar.update(&e);
            summary.record(&e);
        })
        .await;
        bar.finish();
        summary.set_state(state);

        let counts = summary.counts();
        log::info!(
            "{} {} ROMs fully covered, {} artwork files downloaded",
            "\u{2714}".if_supports_color(Stdout, |t| t.green()),
            counts.success,
            counts.artwork_downloaded,
        );
        if counts.skipped > 0 {
            log::info!(
                "  {} already done or known misses",
                counts.skipped.if_supports_color(Stdout, |t| t.dimmed()),
            );
        }
        if counts.partial > 0 {
            log::warn!(
                "  {} {} partially covered",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                counts.partial,
            );
        }
        if counts.not_found > 0 {
            log::warn!(
                "  {} {} not found",
                "?".if_supports_color(Stdout, |t| t.yellow()),
                counts.not_found,
            );
        }
        if counts.errors > 0 {
            log::warn!(
                "  {} {} errors",
                "\u{2718}".if_supports_color(Stdout, |t| t.red()),
                counts.errors,
            );
        }

        if !no_log {
            let path = log_file_path(&root_path);
            match summary.write_to_file(&path) {
                Ok(()) => log::info!(
                    "{}",
                    format!("Log written to {}", path.display())
                        .if_supports_color(Stdout, |t| t.dimmed()),
                ),
                Err(e) => log::warn!("Failed to write log {}: {}", path.display(), e),
            }
        }

        if let Some(fatal) = summary.fatal() {
            return Err(CliError::other(format!("Stopped early: {}", fatal.label())));
        }
        if state == BatchState::Aborted {
            log::warn!(
                "{} Stopped after {}/{} ROMs",
                "\u{26A0}".if_supports_color(Stdout, |t| t.yellow()),
                summary.entries().len(),
                total,
            );
        }

        match lookup.fetch_user_info().await {
            Ok(user) => log::info!(
                "{}",
                format!(
                    "Remaining quota: {} of {} requests",
                    user.max_requests_per_day().saturating_sub(user.requests_today()),
                    user.max_requests_per_day(),
                )
                .if_supports_color(Stdout, |t| t.dimmed()),
            ),
            Err(e) => log::debug!("Could not refresh quota: {}", e),
        }
        log::debug!("{} ROM(s) remembered as not found", memo.len());

        Ok::<(), CliError>(())
    })
}

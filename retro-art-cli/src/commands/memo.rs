use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_art_scraper::{FileNotFoundMemo, default_memo_path};

use crate::error::CliError;

fn open_memo() -> Result<FileNotFoundMemo, CliError> {
    let path = default_memo_path()
        .ok_or_else(|| CliError::config("could not determine data directory"))?;
    Ok(FileNotFoundMemo::open(path)?)
}

pub(crate) fn run_memo_list() -> Result<(), CliError> {
    let memo = open_memo()?;
    if memo.is_empty() {
        log::info!("No ROMs are remembered as not found.");
        return Ok(());
    }

    let mut current_system: Option<String> = None;
    for key in memo.keys() {
        let (system, file) = key.split_once('/').unwrap_or(("", key.as_str()));
        if current_system.as_deref() != Some(system) {
            log::info!("{}", system.if_supports_color(Stdout, |t| t.bold()));
            current_system = Some(system.to_string());
        }
        log::info!("  {} {}", "?".if_supports_color(Stdout, |t| t.yellow()), file);
    }
    log::info!("");
    log::info!("{} ROM(s) remembered as not found", memo.len());
    Ok(())
}

pub(crate) fn run_memo_clear() -> Result<(), CliError> {
    let memo = open_memo()?;
    let removed = memo.clear()?;
    log::info!(
        "{} Forgot {} not-found ROM(s)",
        "\u{2714}".if_supports_color(Stdout, |t| t.green()),
        removed,
    );
    Ok(())
}

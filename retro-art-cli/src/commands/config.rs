use std::path::Path;

use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_art_lib::settings::settings_path;
use retro_art_scraper::{CredentialSource, Credentials};

use crate::error::CliError;

/// Keep the first two characters of a secret and hide the rest.
fn mask_value(s: &str) -> String {
    if s.chars().count() <= 2 {
        "****".to_string()
    } else {
        let prefix: String = s.chars().take(2).collect();
        format!("{}****", prefix)
    }
}

fn describe_path(label: &str, path: Option<&Path>) {
    match path {
        Some(p) if p.exists() => log::info!(
            "  {}: {} {}",
            label,
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(exists)".if_supports_color(Stdout, |t| t.green()),
        ),
        Some(p) => log::info!(
            "  {}: {} {}",
            label,
            p.display().if_supports_color(Stdout, |t| t.cyan()),
            "(not found)".if_supports_color(Stdout, |t| t.dimmed()),
        ),
        None => log::info!(
            "  {}: {}",
            label,
            "could not determine path".if_supports_color(Stdout, |t| t.red()),
        ),
    }
}

/// Show credentials with their sources, then the saved settings.
pub(crate) fn run_config_show() -> Result<(), CliError> {
    let creds_path = retro_art_scraper::config_path();
    let sources = retro_art_scraper::credential_sources();
    // load() fails when a required field is missing; show what we can
    let creds = Credentials::load().ok();

    log::info!(
        "{}",
        "ScreenScraper Credentials".if_supports_color(Stdout, |t| t.bold()),
    );
    log::info!("");
    describe_path("Credentials file", creds_path.as_deref());
    log::info!("");

    let fields: [(&str, &CredentialSource, Option<String>, bool); 5] = [
        ("dev_id", &sources.dev_id, creds.as_ref().map(|c| c.dev_id.clone()), false),
        (
            "dev_password",
            &sources.dev_password,
            creds.as_ref().map(|c| c.dev_password.clone()),
            true,
        ),
        ("soft_name", &sources.soft_name, creds.as_ref().map(|c| c.soft_name.clone()), false),
        ("user_id", &sources.user_id, creds.as_ref().and_then(|c| c.user_id.clone()), false),
        (
            "user_password",
            &sources.user_password,
            creds.as_ref().and_then(|c| c.user_password.clone()),
            true,
        ),
    ];

    for (name, source, value, secret) in fields {
        let source_str = format!("({})", source);
        match (source, value) {
            (CredentialSource::Missing, _) | (_, None) => log::info!(
                "  {:<14} {} {}",
                name,
                "-".if_supports_color(Stdout, |t| t.dimmed()),
                source_str.if_supports_color(Stdout, |t| t.dimmed()),
            ),
            (_, Some(v)) => {
                let shown = if secret { mask_value(&v) } else { v };
                log::info!(
                    "  {:<14} {} {}",
                    name,
                    shown.if_supports_color(Stdout, |t| t.green()),
                    source_str.if_supports_color(Stdout, |t| t.dimmed()),
                );
            }
        }
    }

    let path = settings_path();
    let settings = retro_art_lib::settings::load_settings_from(&path)
        .map_err(|e| CliError::config(format!("{}: {}", path.display(), e)))?;

    log::info!("");
    log::info!("{}", "Settings".if_supports_color(Stdout, |t| t.bold()));
    log::info!("");
    describe_path("Settings file", Some(path.as_path()));
    log::info!("");
    log::info!(
        "  {:<14} {}",
        "library root",
        settings
            .library
            .root
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(current directory)".to_string()),
    );
    log::info!(
        "  {:<14} {}",
        "threads",
        settings
            .scrape
            .threads
            .map(|n| n.to_string())
            .unwrap_or_else(|| "(server maximum)".to_string()),
    );
    log::info!(
        "  {:<14} {}",
        "categories",
        settings
            .scrape
            .categories
            .as_ref()
            .map(|c| c.join(", "))
            .unwrap_or_else(|| "(all)".to_string()),
    );
    Ok(())
}

/// Print the locations of every file the tool reads or writes.
pub(crate) fn run_config_path() {
    let show = |p: Option<std::path::PathBuf>| {
        p.map(|p| p.display().to_string())
            .unwrap_or_else(|| "could not determine path".to_string())
    };
    log::info!("credentials: {}", show(retro_art_scraper::config_path()));
    log::info!("settings:    {}", settings_path().display());
    log::info!("not-found:   {}", show(retro_art_scraper::default_memo_path()));
}

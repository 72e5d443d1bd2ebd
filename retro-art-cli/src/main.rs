mod cli_types;
mod commands;
mod error;
mod progress;

use std::io::Write;

use clap::Parser;
use env_logger::{Builder, Target};
use log::LevelFilter;
use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use cli_types::{Cli, Commands, ConfigAction, MemoAction};
use error::CliError;

/// Route `log` output to stdout. Normal runs print bare messages so `info!`
/// reads as command output; `--verbose` adds timestamps, levels and targets.
/// `RUST_LOG` overrides both.
fn init_logger(quiet: bool, verbose: bool) {
    if std::env::var("RUST_LOG").is_ok() {
        env_logger::init();
        return;
    }

    let level = if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };

    let mut builder = Builder::new();
    builder
        .target(Target::Stdout)
        .filter_level(LevelFilter::Warn)
        .filter_module("retro_art", level)
        .filter_module("retro_art_lib", level)
        .filter_module("retro_art_scraper", level);

    if !verbose {
        builder.format(|buf, record| writeln!(buf, "{}", record.args()));
    }
    builder.init();
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Scrape {
            threads,
            categories,
            systems,
            no_log,
        } => commands::scrape::run_scrape(
            cli.root,
            threads,
            categories,
            systems,
            no_log,
            cli.quiet,
        ),
        Commands::Systems => {
            commands::systems::run_systems();
            Ok(())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::run_config_show(),
            ConfigAction::Path => {
                commands::config::run_config_path();
                Ok(())
            }
        },
        Commands::Memo { action } => match action {
            MemoAction::List => commands::memo::run_memo_list(),
            MemoAction::Clear => commands::memo::run_memo_clear(),
        },
    }
}

fn main() {
    let cli = Cli::parse();
    init_logger(cli.quiet, cli.verbose);

    if let Err(e) = run(cli) {
        log::error!(
            "{} {}",
            "\u{2718}".if_supports_color(Stdout, |t| t.red()),
            e,
        );
        std::process::exit(1);
    }
}

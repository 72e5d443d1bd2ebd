use owo_colors::OwoColorize;
use owo_colors::Stream::Stdout;

use retro_art_lib::systems::known_systems;

/// Print every folder alias grouped under the system it maps to.
pub(crate) fn run_systems() {
    let mut groups: Vec<(u32, &'static str, Vec<&'static str>)> = Vec::new();
    for (alias, info) in known_systems() {
        match groups.iter_mut().find(|(id, _, _)| *id == info.id) {
            Some((_, _, aliases)) => aliases.push(alias),
            None => groups.push((info.id, info.display_name, vec![alias])),
        }
    }

    log::info!("Known systems:");
    log::info!("");
    for (id, name, aliases) in &groups {
        log::info!(
            "  {:<32} {} {}",
            name.if_supports_color(Stdout, |t| t.bold()),
            format!("[{:>3}]", id).if_supports_color(Stdout, |t| t.dimmed()),
            aliases.join(", ").if_supports_color(Stdout, |t| t.cyan()),
        );
    }
    log::info!("");
    log::info!(
        "{}",
        "Folder names are matched case-insensitively, ignoring '-', '_' and spaces."
            .if_supports_color(Stdout, |t| t.dimmed()),
    );
}

use anyhow::Result;
use owo_colors::OwoColorize;
use trailcal_core::identity::derive_all;
use trailcal_core::source::load_races;

use super::Settings;
use crate::render::render_event_time;

pub fn run(settings: Settings) -> Result<()> {
    let declared = load_races(&settings.races)?;
    let keys = derive_all(&settings.namespace, &declared)?;

    let mut entries: Vec<_> = keys.iter().collect();
    entries.sort_by_key(|(key, event)| (event.start_utc(), (*key).clone()));

    for (key, event) in entries {
        println!(
            "   {} {} {}",
            event.name,
            render_event_time(event).dimmed(),
            key.as_str().dimmed()
        );
    }

    println!(
        "{}",
        format!(
            "{} races OK in {}",
            declared.len(),
            settings.races.display()
        )
        .green()
    );

    Ok(())
}

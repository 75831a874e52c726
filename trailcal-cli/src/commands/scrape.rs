use std::path::Path;

use anyhow::Result;
use owo_colors::OwoColorize;
use trailcal_core::scrape::{fetch_events_page, parse_events_page, write_skeleton};

use crate::utils::tui::create_spinner;

pub async fn run(url: &str, out: &Path) -> Result<()> {
    let spinner = create_spinner(format!("Fetching {url}"));
    let page = fetch_events_page(url).await;
    spinner.finish_and_clear();

    let races = parse_events_page(&page?)?;
    if races.is_empty() {
        println!("{}", "No races found on the page, nothing written".yellow());
        return Ok(());
    }

    write_skeleton(out, &races)?;

    for race in &races {
        println!(
            "   {} {} {}",
            "+".green(),
            race.name,
            format!("({}, {})", race.date, race.location).dimmed()
        );
    }
    println!(
        "Wrote {} races to {}",
        races.len().to_string().bold(),
        out.display()
    );
    println!(
        "{}",
        "Fill in start_dateTime and timeZone for each race before syncing.".dimmed()
    );

    Ok(())
}

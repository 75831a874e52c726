use anyhow::Result;
use owo_colors::OwoColorize;
use trailcal_core::config::TrailcalConfig;

use super::Settings;

pub fn run(settings: Settings) -> Result<()> {
    let config_path = TrailcalConfig::config_path()?;

    println!("{}", "Config file:".bold());
    println!("   {}", config_path.display());
    println!();

    println!("{}", "Races file:".bold());
    println!("   {}", settings.races.display());
    println!();

    println!("{}", "Event id prefix:".bold());
    println!("   {}", settings.namespace);
    println!();

    println!("{}", "Remote:".bold());
    match &settings.config.remote {
        Some(remote) => println!(
            "   {} {}",
            remote.provider.name(),
            format!("({})", remote.provider.binary_name()).dimmed()
        ),
        None => println!("   {}", "(not configured)".dimmed()),
    }

    Ok(())
}

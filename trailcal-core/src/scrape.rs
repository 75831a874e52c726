//! Race list skeletons scraped from the Freetrail Fantasy events page.
//!
//! The page lists races in a table (name, status, date, location) but gives
//! no start time, so each scraped race is written with a placeholder
//! `start_dateTime`. `source::parse_races` refuses the file until every
//! placeholder has been replaced by hand.

use std::path::Path;
use std::time::Duration;

use scraper::{ElementRef, Html, Selector};

use crate::error::{TrailcalError, TrailcalResult};
use crate::source::{PLACEHOLDER_START, RaceRecord};

pub const DEFAULT_EVENTS_URL: &str = "https://fantasy.freetrail.com/events";

const FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Cells a row needs: name, status, date, location.
const MIN_CELLS: usize = 4;

/// One complete row of the events table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedRace {
    pub name: String,
    /// Date exactly as the page shows it, e.g. "Jun 28, 2025"
    pub date: String,
    pub location: String,
}

impl ScrapedRace {
    fn to_record(&self) -> RaceRecord {
        RaceRecord {
            name: self.name.clone(),
            start: format!("{PLACEHOLDER_START} [{}]", self.date),
            end: Some(String::new()),
            time_zone: Some(String::new()),
            external_link: Some(String::new()),
            description: Some(format!("Date Scraped: {}", self.date)),
            location: Some(self.location.clone()),
        }
    }
}

/// Download the events page.
pub async fn fetch_events_page(url: &str) -> TrailcalResult<String> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("trailcal/", env!("CARGO_PKG_VERSION")))
        .timeout(FETCH_TIMEOUT)
        .build()
        .map_err(|e| TrailcalError::Scrape(e.to_string()))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| TrailcalError::Scrape(format!("request to {url} failed: {e}")))?;

    if !response.status().is_success() {
        return Err(TrailcalError::Scrape(format!(
            "{url} returned HTTP {}",
            response.status()
        )));
    }
    tracing::info!(url = %response.url(), "fetched events page");

    response
        .text()
        .await
        .map_err(|e| TrailcalError::Scrape(format!("could not read {url}: {e}")))
}

fn selector(css: &'static str) -> TrailcalResult<Selector> {
    Selector::parse(css).map_err(|e| TrailcalError::Scrape(format!("bad selector '{css}': {e:?}")))
}

/// Text content with runs of whitespace collapsed.
fn text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the races of the first table body on the page.
///
/// Rows missing a name, date or location are skipped with a warning. A page
/// without a table yields no races.
pub fn parse_events_page(html: &str) -> TrailcalResult<Vec<ScrapedRace>> {
    let tbody = selector("tbody")?;
    let tr = selector("tr")?;
    let td = selector("td")?;
    let name_link = selector("div.font-semibold a")?;
    let location_div = selector("div.capitalize")?;

    let document = Html::parse_document(html);
    let Some(body) = document.select(&tbody).next() else {
        tracing::warn!("no table body on the events page, the page layout may have changed");
        return Ok(Vec::new());
    };

    let rows: Vec<_> = body.select(&tr).collect();
    if rows.is_empty() {
        tracing::warn!("events table has no rows");
    }
    tracing::info!(rows = rows.len(), "parsing events table");

    let mut races = Vec::new();
    for row in rows {
        let cells: Vec<_> = row.select(&td).collect();
        if cells.len() < MIN_CELLS {
            tracing::warn!(cells = cells.len(), "skipping row with too few cells");
            continue;
        }

        let name = cells[0].select(&name_link).next().map(text).unwrap_or_default();
        let date = text(cells[2]);
        let location = cells[3].select(&location_div).next().map(text).unwrap_or_default();

        if name.is_empty() || date.is_empty() || location.is_empty() {
            tracing::warn!(%name, %date, %location, "skipping incomplete row");
            continue;
        }

        tracing::debug!(%name, %date, %location, "scraped race");
        races.push(ScrapedRace {
            name,
            date,
            location,
        });
    }

    Ok(races)
}

/// The `races.json` skeleton for `races`, pretty-printed.
pub fn skeleton_json(races: &[ScrapedRace]) -> TrailcalResult<String> {
    let records: Vec<RaceRecord> = races.iter().map(ScrapedRace::to_record).collect();
    serde_json::to_string_pretty(&records).map_err(|e| TrailcalError::Serialization(e.to_string()))
}

/// Write the skeleton for `races` to `path`, replacing any existing file.
pub fn write_skeleton(path: &Path, races: &[ScrapedRace]) -> TrailcalResult<()> {
    std::fs::write(path, skeleton_json(races)? + "\n")?;
    tracing::info!(path = %path.display(), races = races.len(), "wrote race skeleton");
    Ok(())
}

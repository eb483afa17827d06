//! Departures pages and the per-cycle vessel directory built from them.

use std::sync::OnceLock;

use ferry_core::{normalize_time_key, TerminalDepartures, VesselDirectory};
use ferry_logging::{ferry_debug, ferry_info, ferry_warn};
use futures_util::stream::{self, StreamExt};
use scraper::{ElementRef, Html, Selector};
use tokio_util::sync::CancellationToken;

use crate::render::Renderer;
use crate::sources::SourceUrls;

struct DepartureSelectors {
    row: Selector,
    cell: Selector,
    fleet_link: Selector,
    time_list: Selector,
    time_value: Selector,
}

fn selectors() -> &'static DepartureSelectors {
    static SELECTORS: OnceLock<DepartureSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| {
        let css = |s: &str| Selector::parse(s).expect("valid departures selector");
        DepartureSelectors {
            row: css("tr.padding-departures-td"),
            cell: css("td"),
            fleet_link: css("a[href*='/on-the-ferry/our-fleet/']"),
            time_list: css("ul.departures-time-ul"),
            time_value: css("span.text-lowercase"),
        }
    })
}

/// Scheduled time to vessel for every row that names both.
pub fn parse_departures(html: &str) -> TerminalDepartures {
    let document = Html::parse_document(html);
    let sel = selectors();
    let mut departures = TerminalDepartures::new();

    for row in document.select(&sel.row) {
        let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
        let vessel = cells
            .first()
            .and_then(|cell| cell.select(&sel.fleet_link).next())
            .map(text_of)
            .unwrap_or_default();
        let scheduled = cells
            .get(1)
            .and_then(|cell| {
                cell.select(&sel.time_list)
                    .filter(|list| list.text().collect::<String>().contains("SCHEDULED:"))
                    .filter_map(|list| list.select(&sel.time_value).next())
                    .map(text_of)
                    .filter(|time| !time.is_empty())
                    .last()
            })
            .unwrap_or_default();

        if !vessel.is_empty() && !scheduled.is_empty() {
            departures.insert(normalize_time_key(&scheduled), vessel);
        }
    }
    departures
}

fn text_of(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Fetches one terminal's departures; any failure yields an empty map.
pub async fn fetch_terminal_departures(
    renderer: &dyn Renderer,
    sources: &SourceUrls,
    terminal_code: &str,
    cancel: &CancellationToken,
) -> TerminalDepartures {
    let url = match sources.departures_url(terminal_code) {
        Ok(url) => url,
        Err(err) => {
            ferry_warn!("No departures url for {}: {}", terminal_code, err);
            return TerminalDepartures::new();
        }
    };

    match renderer.render(url.as_str(), cancel).await {
        Ok(html) => {
            let departures = parse_departures(&html);
            ferry_debug!(
                "Terminal {} - extracted {} departures",
                terminal_code,
                departures.len()
            );
            departures
        }
        Err(err) if err.is_cancelled() => TerminalDepartures::new(),
        Err(err) => {
            ferry_warn!("Failed to fetch departures for {}: {}", terminal_code, err);
            TerminalDepartures::new()
        }
    }
}

/// Builds the directory for `terminals`, fetching at most `concurrency`
/// pages at once. Every terminal gets an entry, possibly empty.
pub async fn build_vessel_directory(
    renderer: &dyn Renderer,
    sources: &SourceUrls,
    terminals: &[String],
    concurrency: usize,
    cancel: &CancellationToken,
) -> VesselDirectory {
    let fetches: Vec<_> = terminals
        .iter()
        .map(|code| async move {
            let departures = fetch_terminal_departures(renderer, sources, code, cancel).await;
            (code.clone(), departures)
        })
        .collect();
    let fetched: Vec<(String, TerminalDepartures)> = stream::iter(fetches)
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut directory = VesselDirectory::new();
    for (code, departures) in fetched {
        directory.insert_terminal(code, departures);
    }
    ferry_info!(
        "Vessel directory built: {} terminals, {} departures",
        directory.terminal_count(),
        directory.departure_count()
    );
    directory
}

//! Extracts today's rows from a seasonal schedule page.
//!
//! The page carries one `thead`/`tbody` pair per weekday inside a
//! `table.table-seasonal-schedule`. Everything about that markup lives here;
//! the rest of the pipeline only sees [`SchedulePage`].

use std::sync::OnceLock;

use ego_tree::NodeRef;
use ferry_core::{
    first_time_token, EventKind, RawSailingRow, SailingEvent, SchedulePage, ServiceDay,
};
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("seasonal schedule table not found")]
    TableNotFound,
    #[error("no schedule section for {weekday}")]
    DayNotFound { weekday: String },
}

const EVENT_MARKERS: [(&str, EventKind); 3] = [
    ("schedule-leg-type-thru-fare", EventKind::ThruFare),
    ("schedule-leg-type-stop", EventKind::Stop),
    ("schedule-leg-type-transfer", EventKind::Transfer),
];

struct ScheduleSelectors {
    table: Selector,
    day_marker: Selector,
    thead: Selector,
    header_row: Selector,
    day_label: Selector,
    row: Selector,
    cell: Selector,
    paragraph: Selector,
    event: Selector,
    markers: [Selector; 3],
}

fn css(selector: &str) -> Selector {
    Selector::parse(selector).expect("valid schedule selector")
}

fn selectors() -> &'static ScheduleSelectors {
    static SELECTORS: OnceLock<ScheduleSelectors> = OnceLock::new();
    SELECTORS.get_or_init(|| ScheduleSelectors {
        table: css("table.table-seasonal-schedule"),
        day_marker: css("thead tr[data-schedule-day], thead [data-schedule-day], thead h4, thead b"),
        thead: css("thead"),
        header_row: css("tr"),
        day_label: css("h4, b, th"),
        row: css("tr.schedule-table-row"),
        cell: css("td"),
        paragraph: css("p"),
        event: css("p.mb-1"),
        markers: EVENT_MARKERS.map(|(class, _)| css(&format!(".{class}"))),
    })
}

/// Parses the section of `html` that applies to `day`.
pub fn parse_schedule_page(html: &str, day: &ServiceDay) -> Result<SchedulePage, ScheduleError> {
    let document = Html::parse_document(html);
    let table = locate_table(&document).ok_or(ScheduleError::TableNotFound)?;
    let body = day_body(table, day.weekday_name()).ok_or_else(|| ScheduleError::DayNotFound {
        weekday: day.weekday_name().to_string(),
    })?;

    let sel = selectors();
    let rows: Vec<ElementRef<'_>> = body.select(&sel.row).collect();
    let route_duration = rows
        .first()
        .and_then(|row| row.select(&sel.cell).nth(3))
        .map(element_text)
        .unwrap_or_default();

    Ok(SchedulePage {
        rows: rows.into_iter().filter_map(parse_row).collect(),
        route_duration,
    })
}

/// First table with weekday headers, else the second schedule table.
fn locate_table(document: &Html) -> Option<ElementRef<'_>> {
    let sel = selectors();
    let tables: Vec<ElementRef<'_>> = document.select(&sel.table).collect();
    tables
        .iter()
        .copied()
        .find(|table| table.select(&sel.day_marker).next().is_some())
        .or_else(|| tables.get(1).copied())
}

fn day_body<'a>(table: ElementRef<'a>, weekday: &str) -> Option<ElementRef<'a>> {
    let today = normalize_day(weekday);
    table
        .select(&selectors().thead)
        .filter(|thead| header_names_day(*thead, &today))
        .find_map(next_tbody)
}

fn header_names_day(thead: ElementRef<'_>, today: &str) -> bool {
    let sel = selectors();
    let attr = thead
        .select(&sel.header_row)
        .next()
        .and_then(|row| row.value().attr("data-schedule-day"))
        .map(normalize_day)
        .unwrap_or_default();
    if !attr.is_empty() && attr == today {
        return true;
    }

    let label = thead
        .select(&sel.day_label)
        .next()
        .map(|el| normalize_day(&element_text(el)))
        .unwrap_or_default();
    label == today || label.contains(today)
}

fn next_tbody(thead: ElementRef<'_>) -> Option<ElementRef<'_>> {
    thead
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == "tbody")
}

/// `"Mondays "` and `"MONDAY"` both normalize to `"MONDAY"`.
fn normalize_day(text: &str) -> String {
    let upper = text.trim().to_uppercase();
    match upper.strip_suffix('S') {
        Some(stripped) => stripped.to_string(),
        None => upper,
    }
}

fn parse_row(row: ElementRef<'_>) -> Option<RawSailingRow> {
    let sel = selectors();
    let cells: Vec<ElementRef<'_>> = row.select(&sel.cell).collect();
    if cells.len() < 3 {
        return None;
    }

    let departure = cells[1];
    let departure_text = element_text(departure);
    let (status_notes, exception_notes) = status_notes(departure);

    Some(RawSailingRow {
        departure_time: time_token(&departure_text),
        arrival_time: time_token(&element_text(cells[2])),
        duration: cells.get(3).map(|cell| element_text(*cell)).unwrap_or_default(),
        status_notes,
        exception_notes,
        events: cells.get(4).map(|cell| parse_events(*cell)).unwrap_or_default(),
        departure_text: departure_text.to_lowercase(),
    })
}

fn time_token(text: &str) -> String {
    first_time_token(text).unwrap_or_default().to_string()
}

/// Marked paragraphs of the departure cell; red ones carry date exceptions.
fn status_notes(departure: ElementRef<'_>) -> (Vec<String>, Vec<String>) {
    let mut status = Vec::new();
    let mut exceptions = Vec::new();
    for paragraph in departure.select(&selectors().paragraph) {
        let note = element_text(paragraph);
        if note.is_empty() {
            continue;
        }
        let red = has_class(paragraph, "red-text");
        if red || has_class(paragraph, "text-black") {
            if red {
                exceptions.push(note.clone());
            }
            status.push(note);
        }
    }
    (status, exceptions)
}

fn parse_events(cell: ElementRef<'_>) -> Vec<SailingEvent> {
    let sel = selectors();
    cell.select(&sel.event)
        .filter_map(|paragraph| {
            let kind = EVENT_MARKERS
                .iter()
                .zip(sel.markers.iter())
                .find(|(_, marker)| paragraph.select(marker).next().is_some())
                .map(|((_, kind), _)| *kind)?;
            let terminal_name = terminal_label(*paragraph)?;
            Some(SailingEvent::new(kind, terminal_name))
        })
        .collect()
}

/// Last non-empty direct `span` child that is not an icon or type marker.
fn terminal_label(paragraph: NodeRef<'_, Node>) -> Option<String> {
    paragraph
        .children()
        .filter_map(ElementRef::wrap)
        .filter(|child| child.value().name() == "span" && !is_marker(*child))
        .map(element_text)
        .filter(|text| !text.is_empty())
        .last()
}

fn is_marker(span: ElementRef<'_>) -> bool {
    has_class(span, "bcf")
        || EVENT_MARKERS
            .iter()
            .any(|(class, _)| has_class(span, class))
}

fn has_class(element: ElementRef<'_>, class: &str) -> bool {
    element.value().classes().any(|c| c == class)
}

/// Text nodes joined by single spaces; NBSP counts as whitespace.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

use crate::model::SailingEvent;

/// Fields lifted from one schedule table row, before any derivation.
///
/// Extractors fill this from markup; everything downstream works on it, so
/// page layout changes stay inside the extractor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSailingRow {
    /// First `H:MM am|pm` token of the departure cell, or empty.
    pub departure_time: String,
    /// First `H:MM am|pm` token of the arrival cell, or empty.
    pub arrival_time: String,
    pub duration: String,
    /// Marked status paragraphs, in page order.
    pub status_notes: Vec<String>,
    /// The subset of status notes that carry calendar exceptions.
    pub exception_notes: Vec<String>,
    pub events: Vec<SailingEvent>,
    /// Whole departure cell text, lowercased.
    pub departure_text: String,
}

impl RawSailingRow {
    /// Sailings closed to passengers are never published.
    pub fn is_restricted(&self) -> bool {
        self.departure_text.contains("dangerous goods only")
            || self.departure_text.contains("no passengers permitted")
    }

    pub fn has_times(&self) -> bool {
        !self.departure_time.is_empty() || !self.arrival_time.is_empty()
    }

    /// Exception notes joined the way they are matched.
    pub fn combined_exception_notes(&self) -> String {
        self.exception_notes.join("; ").to_lowercase()
    }
}

/// The rows found for one weekday on one schedule page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchedulePage {
    pub rows: Vec<RawSailingRow>,
    /// Route-level duration, taken from the first row.
    pub route_duration: String,
}

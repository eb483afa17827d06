//! Turns extracted rows into finished sailings and route records.

use ferry_logging::ferry_debug;

use crate::clock::ServiceDay;
use crate::duration::{
    estimate_travel_minutes, parse_duration_to_minutes, provisional_dwell_per_stop, stop_count,
    DwellSummary,
};
use crate::exceptions::runs_on;
use crate::legs::{build_legs, LegContext};
use crate::model::{sailing_id, RouteRecord, Sailing};
use crate::reference::{ReferenceData, RouteKey};
use crate::row::{RawSailingRow, SchedulePage};
use crate::vessel::VesselDirectory;

/// Inputs shared by every row of one route in one cycle.
#[derive(Debug, Clone, Copy)]
pub struct RouteContext<'a> {
    pub reference: &'a ReferenceData,
    pub directory: &'a VesselDirectory,
    pub route: &'a RouteKey,
    pub day: ServiceDay,
}

impl RouteContext<'_> {
    fn legs(&self) -> LegContext<'_> {
        LegContext {
            reference: self.reference,
            directory: self.directory,
        }
    }
}

/// Derives one sailing, or `None` when the row is not published today.
pub fn assemble_sailing(ctx: &RouteContext<'_>, row: RawSailingRow) -> Option<Sailing> {
    if row.is_restricted() {
        ferry_debug!("Dropping restricted sailing {:?}", row.departure_time);
        return None;
    }
    if !runs_on(&row.combined_exception_notes(), &ctx.day) {
        ferry_debug!(
            "Sailing {:?} does not run on {}",
            row.departure_time,
            ctx.day.iso_date()
        );
        return None;
    }
    if !row.has_times() {
        return None;
    }

    let route_code = ctx.route.code();
    let sailing_minutes = parse_duration_to_minutes(&row.duration);
    let stops = stop_count(&row.events);
    let estimated_travel =
        estimate_travel_minutes(ctx.reference, &ctx.route.from, &ctx.route.to, &row.events);
    let provisional_dwell = provisional_dwell_per_stop(sailing_minutes, estimated_travel, stops);

    let legs = build_legs(
        ctx.legs(),
        &route_code,
        &row.events,
        &row.departure_time,
        provisional_dwell,
    );
    let leg_durations: Vec<Option<u32>> = legs.iter().map(|leg| leg.avg_duration_min).collect();
    let summary = DwellSummary::compute(sailing_minutes, &leg_durations, stops);

    Some(Sailing {
        id: sailing_id(&route_code, &ctx.day.iso_date(), &row.departure_time),
        departure_time: row.departure_time,
        arrival_time: row.arrival_time,
        sailing_duration: row.duration,
        status: row.status_notes.join(" | "),
        events: row.events,
        legs,
        total_travel_min: summary.total_travel_min,
        total_dwell_min: summary.total_dwell_min,
        stop_count: summary.stop_count,
        avg_dwell_per_stop_min: summary.avg_dwell_per_stop_min,
    })
}

/// Builds the full snapshot for one route.
pub fn assemble_route(ctx: &RouteContext<'_>, page: SchedulePage) -> RouteRecord {
    let sailings = page
        .rows
        .into_iter()
        .filter_map(|row| assemble_sailing(ctx, row))
        .collect();

    RouteRecord {
        date: ctx.day.iso_date(),
        route_code: ctx.route.code(),
        from_terminal_code: ctx.route.from.clone(),
        to_terminal_code: ctx.route.to.clone(),
        sailing_duration: page.route_duration,
        sailings,
    }
}

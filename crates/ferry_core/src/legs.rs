//! Splits a sailing into consecutive legs between terminals.

use crate::clock_time::ClockTime;
use crate::model::{Leg, SailingEvent, UNKNOWN_VESSEL};
use crate::reference::{ReferenceData, RouteKey, Terminal};
use crate::vessel::VesselDirectory;

/// Everything leg construction reads; borrowed for one sailing.
#[derive(Debug, Clone, Copy)]
pub struct LegContext<'a> {
    pub reference: &'a ReferenceData,
    pub directory: &'a VesselDirectory,
}

/// Builds legs for one sailing of `route_code`.
///
/// Returns an empty list when either end of the route is not a known
/// terminal. Leg `i` always ends where leg `i + 1` starts.
pub fn build_legs(
    ctx: LegContext<'_>,
    route_code: &str,
    events: &[SailingEvent],
    departure_time: &str,
    avg_dwell_min: u32,
) -> Vec<Leg> {
    let Some(route) = RouteKey::parse(route_code) else {
        return Vec::new();
    };
    let (Some(origin), Some(destination)) = (
        ctx.reference.terminal(&route.from),
        ctx.reference.terminal(&route.to),
    ) else {
        return Vec::new();
    };

    let mut stops: Vec<Terminal> = Vec::with_capacity(events.len() + 2);
    stops.push(origin.clone());
    stops.extend(
        events
            .iter()
            .map(|event| ctx.reference.resolve_terminal(&event.terminal_name)),
    );
    stops.push(destination.clone());

    let departure = ClockTime::parse(departure_time).ok();
    let mut legs: Vec<Leg> = Vec::with_capacity(stops.len() - 1);
    let mut elapsed_min: u32 = 0;

    for (index, pair) in stops.windows(2).enumerate() {
        let (from, to) = (&pair[0], &pair[1]);
        let info = ctx.reference.leg_info(&from.code, &to.code);

        let vessel_name = match (index, legs.last()) {
            (0, _) | (_, None) => Some(ctx.directory.vessel_near(&from.code, departure_time)),
            (_, Some(previous)) => {
                if events[index - 1].kind.changes_vessel() {
                    Some(estimated_vessel(
                        ctx.directory,
                        &from.code,
                        departure,
                        elapsed_min + avg_dwell_min,
                    ))
                } else {
                    previous.vessel_name.clone()
                }
            }
        };

        if let Some(info) = info {
            elapsed_min += info.avg_duration_min;
        }

        legs.push(Leg {
            sequence: index as u32 + 1,
            origin: from.clone(),
            destination: to.clone(),
            distance_km: info.map(|i| i.distance_km),
            avg_duration_min: info.map(|i| i.avg_duration_min),
            vessel_name,
        });
    }

    legs
}

/// Looks up the vessel leaving `code` at the departure time shifted by
/// `offset_min`.
fn estimated_vessel(
    directory: &VesselDirectory,
    code: &str,
    departure: Option<ClockTime>,
    offset_min: u32,
) -> String {
    match departure {
        Some(departure) => {
            directory.vessel_near(code, &departure.add_minutes(offset_min).to_string())
        }
        None => UNKNOWN_VESSEL.to_string(),
    }
}

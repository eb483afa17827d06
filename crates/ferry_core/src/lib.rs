//! Ferry core: pure schedule derivation and cycle state.
//!
//! Nothing in this crate performs IO. Extracted rows come in, finished
//! route records go out.
mod assemble;
mod clock;
mod clock_time;
mod cycle;
mod duration;
mod exceptions;
mod legs;
mod model;
mod reference;
mod row;
mod vessel;

pub use assemble::{assemble_route, assemble_sailing, RouteContext};
pub use clock::{Clock, FixedClock, ServiceDay, ZonedClock};
pub use clock_time::{first_time_token, normalize_time_key, ClockTime, ClockTimeError};
pub use cycle::{update, CycleEffect, CycleId, CycleMsg, CycleState, Job};
pub use duration::{
    estimate_travel_minutes, parse_duration_to_minutes, provisional_dwell_per_stop, stop_count,
    DwellSummary,
};
pub use exceptions::{runs_on, DateExceptionSet, MonthDay};
pub use legs::{build_legs, LegContext};
pub use model::{
    sailing_id, EventKind, Leg, RouteInfo, RouteRecord, Sailing, SailingEvent, UNKNOWN_VESSEL,
};
pub use reference::{
    LegInfo, ReferenceData, ReferenceError, RouteKey, Terminal, UNKNOWN_TERMINAL_CODE,
};
pub use row::{RawSailingRow, SchedulePage};
pub use vessel::{
    find_vessel_by_time_window, TerminalDepartures, VesselDirectory, VESSEL_MATCH_WINDOW_MIN,
};

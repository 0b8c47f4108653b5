//! Plain-text rendering of a departure board

use integration_efa::{Departure, Stop};

/// Message shown when the server cannot resolve the requested stop
pub const STOP_NOT_RESOLVED_MESSAGE: &str = "Stop does not exist or name is not unique!";

/// Render the selected stop followed by one line per departure
pub fn render_board(stop: &Stop, departures: &[Departure]) -> String {
    let mut out = format!("Selected stop: {} ({})\n\n", stop.name, stop.id);
    for departure in departures {
        out.push_str(&render_departure(departure));
        out.push('\n');
    }
    out
}

/// Render a single departure, e.g. `Route 3     due in 4  minutes --> Hauptbahnhof`
pub fn render_departure(departure: &Departure) -> String {
    let plural = if departure.countdown == 1 { "" } else { "s" };
    format!(
        "Route {:<5} due in {:<2} minute{plural} --> {}",
        departure.line.number, departure.countdown, departure.line.direction
    )
}

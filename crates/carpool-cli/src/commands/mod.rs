pub mod trips;
pub mod users;

use crate::client::ClientError;
use carpool_schema::TripState;

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_REJECTED: u8 = 1;
pub const EXIT_USAGE: u8 = 2;

pub fn json_pretty(value: &impl serde::Serialize) -> Result<String, ClientError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ClientError::InvalidInput(format!("JSON serialization failed: {e}")))
}

/// Exit status for a failed command: the server said no, or we never got a
/// usable answer.
pub fn exit_code(err: &ClientError) -> u8 {
    match err {
        ClientError::Rejected { .. } => EXIT_REJECTED,
        _ => EXIT_USAGE,
    }
}

pub fn colorize_state(state: TripState) -> String {
    use console::Style;
    let label = state.to_string();
    match state {
        TripState::Scheduled => Style::new().green().apply_to(label).to_string(),
        TripState::Started => Style::new().cyan().bold().apply_to(label).to_string(),
        TripState::Cancelled => Style::new().dim().apply_to(label).to_string(),
    }
}

pub fn or_dash(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

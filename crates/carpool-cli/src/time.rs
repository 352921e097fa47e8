use chrono::{DateTime, NaiveTime, TimeZone, Utc};

/// Parse a departure time given on the command line.
///
/// Accepts a full RFC 3339 timestamp, or `HH:MM` meaning that time today in
/// the time zone of `now`.
pub fn parse_start_time<Tz: TimeZone>(input: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>, String> {
    let input = input.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(input) {
        return Ok(at.with_timezone(&Utc));
    }
    let time = NaiveTime::parse_from_str(input, "%H:%M")
        .map_err(|_| format!("invalid start time '{input}': expected RFC 3339 or HH:MM"))?;
    let local = now.date_naive().and_time(time);
    now.timezone()
        .from_local_datetime(&local)
        .earliest()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| format!("start time {input} does not exist today in the local time zone"))
}

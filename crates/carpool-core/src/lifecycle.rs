use crate::CoreError;
use carpool_schema::TripState;
use chrono::{DateTime, Duration, Utc};

/// Check a lifecycle move. A trip leaves `Scheduled` exactly once, either by
/// starting or by being cancelled; nothing leaves `Started`.
pub fn validate_transition(trip_id: &str, from: TripState, to: TripState) -> Result<(), CoreError> {
    match (from, to) {
        (TripState::Scheduled, TripState::Started | TripState::Cancelled) => Ok(()),
        (TripState::Started, _) => Err(CoreError::AlreadyStarted(trip_id.to_owned())),
        _ => Err(CoreError::InvalidTransition { from, to }),
    }
}

/// Closed window check: `now <= scheduled + grace`. Being exactly on the
/// boundary is inside the window. A window end past the representable range
/// never closes.
pub fn within_grace(now: DateTime<Utc>, scheduled: DateTime<Utc>, grace: Duration) -> bool {
    scheduled
        .checked_add_signed(grace)
        .map_or(true, |end| now <= end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn valid_transitions() {
        assert!(validate_transition("T", TripState::Scheduled, TripState::Started).is_ok());
        assert!(validate_transition("T", TripState::Scheduled, TripState::Cancelled).is_ok());
    }

    #[test]
    fn started_is_terminal() {
        assert_eq!(
            validate_transition("T", TripState::Started, TripState::Started),
            Err(CoreError::AlreadyStarted("T".to_owned()))
        );
        assert_eq!(
            validate_transition("T", TripState::Started, TripState::Cancelled),
            Err(CoreError::AlreadyStarted("T".to_owned()))
        );
        assert!(validate_transition("T", TripState::Started, TripState::Scheduled).is_err());
    }

    #[test]
    fn invalid_transitions() {
        assert!(validate_transition("T", TripState::Scheduled, TripState::Scheduled).is_err());
        assert!(validate_transition("T", TripState::Cancelled, TripState::Started).is_err());
        assert!(validate_transition("T", TripState::Cancelled, TripState::Scheduled).is_err());
    }

    #[test]
    fn window_end_past_max_time_is_open() {
        let scheduled = DateTime::<Utc>::MAX_UTC;
        assert!(within_grace(scheduled, scheduled, Duration::minutes(30)));
        assert!(within_grace(scheduled, scheduled, Duration::MAX));
    }

    #[test]
    fn window_boundary_is_inclusive() {
        let scheduled = Utc.with_ymd_and_hms(2030, 1, 1, 8, 0, 0).unwrap();
        let grace = Duration::minutes(30);
        assert!(within_grace(scheduled - Duration::hours(3), scheduled, grace));
        assert!(within_grace(scheduled + grace, scheduled, grace));
        assert!(!within_grace(
            scheduled + grace + Duration::seconds(1),
            scheduled,
            grace
        ));
    }
}

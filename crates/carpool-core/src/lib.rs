//! Trip lifecycle and booking engine for the car-pooling marketplace.
//!
//! This crate ties the schema and store layers together into the
//! `BookingEngine`: the single synchronous API through which trips are
//! created, updated, joined, started, cancelled and inspected, and through
//! which user records are registered and removed. Time-dependent rules read
//! the current time from an injectable `Clock`, and lifecycle moves are
//! checked by a small state machine in `lifecycle`.

pub mod clock;
pub mod engine;
pub mod lifecycle;

pub use clock::{Clock, ManualClock, SystemClock};
pub use engine::BookingEngine;
pub use lifecycle::{validate_transition, within_grace};

use carpool_schema::{ProfileError, TripState};
use carpool_store::StoreError;
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    #[error("trip not found: {0}")]
    TripNotFound(String),
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("trip already exists: {0}")]
    TripExists(String),
    #[error("user already exists: {0}")]
    UserExists(String),
    #[error("user {user_id} is already enrolled in trip {trip_id}")]
    AlreadyEnrolled { trip_id: String, user_id: String },
    #[error("user {0} is not an eligible car owner (requires owner flag, driver license and car plate)")]
    InvalidCarOwner(String),
    #[error("trips must be scheduled at least {lead_minutes} minutes ahead, requested {start_time}")]
    InvalidSchedule {
        start_time: DateTime<Utc>,
        lead_minutes: i64,
    },
    #[error("total seats must not be negative, got {0}")]
    InvalidCapacity(i32),
    #[error("only the car owner can start trip {trip_id} (caller: {caller})")]
    Unauthorized { trip_id: String, caller: String },
    #[error("trip {0} has already started")]
    AlreadyStarted(String),
    #[error("trip {0} cannot start without any enrolled passengers")]
    NoPassengers(String),
    #[error("trip {trip_id} cannot be {action} more than {grace_minutes} minutes after its scheduled time")]
    OutOfWindow {
        trip_id: String,
        action: &'static str,
        grace_minutes: i64,
    },
    #[error("trip {0} has no seats left")]
    TripFull(String),
    #[error("invalid user profile: {0}")]
    InvalidProfile(#[from] ProfileError),
    #[error("account {user_id} cannot be deleted before it is {min_days} days old")]
    AccountTooNew { user_id: String, min_days: i64 },
    #[error("invalid state transition: {from} -> {to}")]
    InvalidTransition { from: TripState, to: TripState },
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UserNotFound(id) => CoreError::UserNotFound(id),
            StoreError::UserExists(id) => CoreError::UserExists(id),
            StoreError::TripNotFound(id) => CoreError::TripNotFound(id),
            StoreError::TripExists(id) => CoreError::TripExists(id),
        }
    }
}

/// Flat classification of [`CoreError`], for callers that render errors as
/// status codes or exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    InvalidCarOwner,
    InvalidSchedule,
    InvalidCapacity,
    Unauthorized,
    AlreadyStarted,
    NoPassengers,
    OutOfWindow,
    TripFull,
    InvalidProfile,
    AccountTooNew,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::InvalidCarOwner => "invalid_car_owner",
            ErrorKind::InvalidSchedule => "invalid_schedule",
            ErrorKind::InvalidCapacity => "invalid_capacity",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::AlreadyStarted => "already_started",
            ErrorKind::NoPassengers => "no_passengers",
            ErrorKind::OutOfWindow => "out_of_window",
            ErrorKind::TripFull => "trip_full",
            ErrorKind::InvalidProfile => "invalid_profile",
            ErrorKind::AccountTooNew => "account_too_new",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::TripNotFound(_) | CoreError::UserNotFound(_) => ErrorKind::NotFound,
            CoreError::TripExists(_)
            | CoreError::UserExists(_)
            | CoreError::AlreadyEnrolled { .. }
            | CoreError::InvalidTransition { .. } => ErrorKind::Conflict,
            CoreError::InvalidCarOwner(_) => ErrorKind::InvalidCarOwner,
            CoreError::InvalidSchedule { .. } => ErrorKind::InvalidSchedule,
            CoreError::InvalidCapacity(_) => ErrorKind::InvalidCapacity,
            CoreError::Unauthorized { .. } => ErrorKind::Unauthorized,
            CoreError::AlreadyStarted(_) => ErrorKind::AlreadyStarted,
            CoreError::NoPassengers(_) => ErrorKind::NoPassengers,
            CoreError::OutOfWindow { .. } => ErrorKind::OutOfWindow,
            CoreError::TripFull(_) => ErrorKind::TripFull,
            CoreError::InvalidProfile(_) => ErrorKind::InvalidProfile,
            CoreError::AccountTooNew { .. } => ErrorKind::AccountTooNew,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_not_found_and_conflict() {
        let e: CoreError = StoreError::TripNotFound("T1".to_owned()).into();
        assert_eq!(e.kind(), ErrorKind::NotFound);
        let e: CoreError = StoreError::UserNotFound("U1".to_owned()).into();
        assert_eq!(e.kind(), ErrorKind::NotFound);
        let e: CoreError = StoreError::TripExists("T1".to_owned()).into();
        assert_eq!(e.kind(), ErrorKind::Conflict);
        let e: CoreError = StoreError::UserExists("U1".to_owned()).into();
        assert_eq!(e.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn duplicate_enrollment_is_a_conflict() {
        let e = CoreError::AlreadyEnrolled {
            trip_id: "T1".to_owned(),
            user_id: "U2".to_owned(),
        };
        assert_eq!(e.kind(), ErrorKind::Conflict);
        let msg = e.to_string();
        assert!(msg.contains("U2"));
        assert!(msg.contains("T1"));
    }

    #[test]
    fn out_of_window_display() {
        let e = CoreError::OutOfWindow {
            trip_id: "T1".to_owned(),
            action: "started",
            grace_minutes: 30,
        };
        assert_eq!(
            e.to_string(),
            "trip T1 cannot be started more than 30 minutes after its scheduled time"
        );
        assert_eq!(e.kind().as_str(), "out_of_window");
    }

    #[test]
    fn profile_error_converts() {
        let e: CoreError = ProfileError::MissingOwnerCredentials("driver_license").into();
        assert_eq!(e.kind(), ErrorKind::InvalidProfile);
        assert!(e.to_string().contains("driver_license"));
    }

    #[test]
    fn error_kind_display_matches_as_str() {
        assert_eq!(ErrorKind::NoPassengers.to_string(), "no_passengers");
        assert_eq!(ErrorKind::AlreadyStarted.to_string(), "already_started");
    }
}

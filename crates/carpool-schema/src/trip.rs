use crate::types::{TripId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a trip. Cancellation removes the record, so
/// `Cancelled` is only ever observed as the target of a transition.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TripState {
    Scheduled,
    Started,
    Cancelled,
}

impl std::fmt::Display for TripState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TripState::Scheduled => write!(f, "scheduled"),
            TripState::Started => write!(f, "started"),
            TripState::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Caller-supplied fields for creating or updating a trip.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TripRequest {
    pub car_owner_id: UserId,
    pub pickup_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_pickup_location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub destination: String,
    pub total_seats: i32,
}

impl TripRequest {
    /// Blank alternative pickup locations are treated as absent.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.alt_pickup_location = self
            .alt_pickup_location
            .filter(|loc| !loc.trim().is_empty());
        self
    }
}

/// A published trip.
///
/// The passenger list and the started flag are only reachable through
/// methods that keep them duplicate-free and one-way respectively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Trip {
    pub id: TripId,
    pub car_owner_id: UserId,
    pub pickup_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_pickup_location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub destination: String,
    pub total_seats: i32,
    #[serde(default)]
    enrolled_passengers: Vec<UserId>,
    #[serde(default)]
    started: bool,
}

impl Trip {
    /// A freshly scheduled trip with no passengers.
    pub fn new(id: TripId, request: TripRequest) -> Self {
        let request = request.normalized();
        Self {
            id,
            car_owner_id: request.car_owner_id,
            pickup_location: request.pickup_location,
            alt_pickup_location: request.alt_pickup_location,
            start_time: request.start_time,
            destination: request.destination,
            total_seats: request.total_seats,
            enrolled_passengers: Vec::new(),
            started: false,
        }
    }

    /// Replace the scheduling fields, keeping passengers and the started flag.
    pub fn apply(&mut self, request: TripRequest) {
        let request = request.normalized();
        self.car_owner_id = request.car_owner_id;
        self.pickup_location = request.pickup_location;
        self.alt_pickup_location = request.alt_pickup_location;
        self.start_time = request.start_time;
        self.destination = request.destination;
        self.total_seats = request.total_seats;
    }

    pub fn enrolled_passengers(&self) -> &[UserId] {
        &self.enrolled_passengers
    }

    pub fn is_enrolled(&self, user_id: &str) -> bool {
        self.enrolled_passengers.iter().any(|p| p == user_id)
    }

    /// Append a passenger. Returns `false` and leaves the list untouched if
    /// the passenger is already enrolled.
    pub fn enroll(&mut self, user_id: UserId) -> bool {
        if self.is_enrolled(&user_id) {
            return false;
        }
        self.enrolled_passengers.push(user_id);
        true
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    pub fn mark_started(&mut self) {
        self.started = true;
    }

    pub fn state(&self) -> TripState {
        if self.started {
            TripState::Started
        } else {
            TripState::Scheduled
        }
    }

    /// `total_seats` minus enrolled passengers, floored at zero.
    pub fn available_seats(&self) -> u32 {
        let total = i64::from(self.total_seats.max(0));
        let taken = self.enrolled_passengers.len() as i64;
        (total - taken).max(0) as u32
    }

    pub fn status(&self) -> TripStatus {
        TripStatus {
            started: self.started,
            enrolled_passengers: self.enrolled_passengers.clone(),
        }
    }
}

/// Started flag and passenger list of a trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripStatus {
    pub started: bool,
    #[serde(default)]
    pub enrolled_passengers: Vec<UserId>,
}

/// Wire representation of a trip, carrying the derived seat count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TripView {
    pub id: TripId,
    pub car_owner_id: UserId,
    pub pickup_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_pickup_location: Option<String>,
    pub start_time: DateTime<Utc>,
    pub destination: String,
    pub available_seats: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enrolled_passengers: Vec<UserId>,
    pub total_seats: i32,
    pub started: bool,
}

impl From<&Trip> for TripView {
    fn from(trip: &Trip) -> Self {
        Self {
            id: trip.id.clone(),
            car_owner_id: trip.car_owner_id.clone(),
            pickup_location: trip.pickup_location.clone(),
            alt_pickup_location: trip.alt_pickup_location.clone(),
            start_time: trip.start_time,
            destination: trip.destination.clone(),
            available_seats: trip.available_seats(),
            enrolled_passengers: trip.enrolled_passengers.clone(),
            total_seats: trip.total_seats,
            started: trip.started,
        }
    }
}

impl TripView {
    pub fn state(&self) -> TripState {
        if self.started {
            TripState::Started
        } else {
            TripState::Scheduled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn request(seats: i32) -> TripRequest {
        TripRequest {
            car_owner_id: "U1".into(),
            pickup_location: "Central Station".to_owned(),
            alt_pickup_location: None,
            start_time: Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap(),
            destination: "Airport".to_owned(),
            total_seats: seats,
        }
    }

    #[test]
    fn new_trip_is_scheduled_and_empty() {
        let trip = Trip::new("T1".into(), request(3));
        assert_eq!(trip.state(), TripState::Scheduled);
        assert!(trip.enrolled_passengers().is_empty());
        assert_eq!(trip.available_seats(), 3);
    }

    #[test]
    fn enroll_rejects_duplicates() {
        let mut trip = Trip::new("T1".into(), request(3));
        assert!(trip.enroll("U2".into()));
        assert!(!trip.enroll("U2".into()));
        assert_eq!(trip.enrolled_passengers().len(), 1);
    }

    #[test]
    fn available_seats_floors_at_zero() {
        let mut trip = Trip::new("T1".into(), request(1));
        trip.enroll("U2".into());
        trip.enroll("U3".into());
        assert_eq!(trip.enrolled_passengers().len(), 2);
        assert_eq!(trip.available_seats(), 0);
    }

    #[test]
    fn apply_keeps_passengers_and_started() {
        let mut trip = Trip::new("T1".into(), request(2));
        trip.enroll("U2".into());
        trip.mark_started();
        let mut changed = request(4);
        changed.destination = "Harbour".to_owned();
        trip.apply(changed);
        assert_eq!(trip.destination, "Harbour");
        assert_eq!(trip.enrolled_passengers().len(), 1);
        assert_eq!(trip.available_seats(), 3);
        assert!(trip.is_started());
    }

    #[test]
    fn blank_alt_pickup_is_dropped() {
        let mut req = request(2);
        req.alt_pickup_location = Some("  ".to_owned());
        let trip = Trip::new("T1".into(), req);
        assert_eq!(trip.alt_pickup_location, None);
    }

    #[test]
    fn view_carries_derived_seats() {
        let mut trip = Trip::new("T1".into(), request(2));
        trip.enroll("U2".into());
        let view = TripView::from(&trip);
        assert_eq!(view.available_seats, 1);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["available_seats"], 1);
        assert_eq!(json["enrolled_passengers"][0], "U2");
        assert!(json.get("alt_pickup_location").is_none());
    }

    #[test]
    fn view_omits_empty_passenger_list() {
        let trip = Trip::new("T1".into(), request(2));
        let json = serde_json::to_value(TripView::from(&trip)).unwrap();
        assert!(json.get("enrolled_passengers").is_none());
        assert_eq!(json["started"], false);
    }

    #[test]
    fn status_reflects_trip() {
        let mut trip = Trip::new("T1".into(), request(2));
        trip.enroll("U2".into());
        let status = trip.status();
        assert!(!status.started);
        assert_eq!(status.enrolled_passengers, vec![UserId::new("U2")]);
    }
}

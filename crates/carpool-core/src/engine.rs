use crate::clock::{Clock, SystemClock};
use crate::lifecycle::{validate_transition, within_grace};
use crate::CoreError;
use carpool_schema::{
    BookingPolicy, Trip, TripId, TripRequest, TripState, TripStatus, User, UserId, UserProfile,
};
use carpool_store::{Directory, TripRegistry};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info};

/// Central booking engine for the car-pooling marketplace.
///
/// Owns the user directory and the trip registry and applies every timing,
/// ownership and capacity rule. No trip is cached across calls: each
/// operation re-reads the record, validates, and writes back as one atomic
/// unit under that trip's lock. A rejected operation leaves both stores
/// untouched.
pub struct BookingEngine {
    directory: Directory,
    registry: TripRegistry,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
}

impl BookingEngine {
    /// Create an engine that reads the wall clock.
    pub fn new(policy: BookingPolicy) -> Self {
        Self::with_clock(policy, Arc::new(SystemClock))
    }

    pub fn with_clock(policy: BookingPolicy, clock: Arc<dyn Clock>) -> Self {
        Self {
            directory: Directory::new(),
            registry: TripRegistry::new(),
            clock,
            policy,
        }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // --- users ---

    pub fn register_user(&self, user_id: &str, profile: UserProfile) -> Result<User, CoreError> {
        let user = User::from_profile(UserId::new(user_id), profile, self.clock.now())
            .map_err(CoreError::from)
            .and_then(|user| self.directory.insert(user).map_err(CoreError::from))
            .inspect_err(|e| debug!("register user {user_id}: rejected ({})", e.kind()))?;
        info!(
            "registered user {user_id}{}",
            if user.is_car_owner { " (car owner)" } else { "" }
        );
        Ok(user)
    }

    /// Replace a user's profile. `created_at` is kept from the existing record.
    pub fn update_user(&self, user_id: &str, profile: UserProfile) -> Result<User, CoreError> {
        let user = self
            .directory
            .update(user_id, |current| {
                User::from_profile(current.id.clone(), profile, current.created_at)
                    .map_err(CoreError::from)
            })
            .inspect_err(|e| debug!("update user {user_id}: rejected ({})", e.kind()))?;
        info!("updated user {user_id}");
        Ok(user)
    }

    /// Remove a user whose account is at least `min_account_age_days` old.
    pub fn delete_user(&self, user_id: &str) -> Result<User, CoreError> {
        let now = self.clock.now();
        let min_age = self.policy.min_account_age();
        let removed = self
            .directory
            .remove_if(user_id, |user| {
                let old_enough_at = user.created_at.checked_add_signed(min_age);
                if old_enough_at.map_or(true, |at| now < at) {
                    return Err(CoreError::AccountTooNew {
                        user_id: user_id.to_owned(),
                        min_days: self.policy.min_account_age_days,
                    });
                }
                Ok(())
            })
            .inspect_err(|e| debug!("delete user {user_id}: rejected ({})", e.kind()))?;
        info!("deleted user {user_id}");
        Ok(removed)
    }

    pub fn get_user(&self, user_id: &str) -> Result<User, CoreError> {
        Ok(self.directory.get(user_id)?)
    }

    pub fn list_users(&self) -> Vec<User> {
        self.directory.list()
    }

    pub fn user_exists(&self, user_id: &str) -> bool {
        self.directory.exists(user_id)
    }

    pub fn is_eligible_car_owner(&self, user_id: &str) -> bool {
        self.directory.is_eligible_car_owner(user_id)
    }

    // --- trips ---

    /// Create (`is_create`) or update a trip from a typed request.
    pub fn create_or_update_trip(
        &self,
        is_create: bool,
        trip_id: &str,
        request: TripRequest,
    ) -> Result<Trip, CoreError> {
        if is_create {
            self.create_trip(trip_id, request)
        } else {
            self.update_trip(trip_id, request)
        }
    }

    pub fn create_trip(&self, trip_id: &str, request: TripRequest) -> Result<Trip, CoreError> {
        let now = self.clock.now();
        let result = if self.registry.contains(trip_id) {
            Err(CoreError::TripExists(trip_id.to_owned()))
        } else {
            // A concurrent create of the same id that wins the race between
            // the check above and the insert surfaces as TripExists here.
            self.validate_request(&request, now).and_then(|()| {
                self.registry
                    .create(Trip::new(TripId::new(trip_id), request))
                    .map_err(CoreError::from)
            })
        };

        let trip =
            result.inspect_err(|e| debug!("create trip {trip_id}: rejected ({})", e.kind()))?;
        info!(
            "created trip {trip_id} by {} departing {} with {} seats",
            trip.car_owner_id, trip.start_time, trip.total_seats
        );
        Ok(trip)
    }

    /// Update an existing trip. Enrolled passengers and the started flag are
    /// preserved; the same validation as creation applies.
    pub fn update_trip(&self, trip_id: &str, request: TripRequest) -> Result<Trip, CoreError> {
        let now = self.clock.now();
        let trip = self
            .registry
            .update(trip_id, |trip| -> Result<(), CoreError> {
                self.validate_request(&request, now)?;
                trip.apply(request);
                Ok(())
            })
            .inspect_err(|e| debug!("update trip {trip_id}: rejected ({})", e.kind()))?;
        info!(
            "updated trip {trip_id}: {} seats, {} available",
            trip.total_seats,
            trip.available_seats()
        );
        Ok(trip)
    }

    fn validate_request(&self, request: &TripRequest, now: DateTime<Utc>) -> Result<(), CoreError> {
        let owner = request.car_owner_id.as_str();
        if !self.directory.exists(owner) {
            return Err(CoreError::UserNotFound(owner.to_owned()));
        }
        if !self.directory.is_eligible_car_owner(owner) {
            return Err(CoreError::InvalidCarOwner(owner.to_owned()));
        }
        // A lead time that runs past the representable range rejects every start.
        let earliest = now.checked_add_signed(self.policy.lead_time());
        if earliest.map_or(true, |earliest| request.start_time < earliest) {
            return Err(CoreError::InvalidSchedule {
                start_time: request.start_time,
                lead_minutes: self.policy.lead_time_minutes,
            });
        }
        if request.total_seats < 0 {
            return Err(CoreError::InvalidCapacity(request.total_seats));
        }
        Ok(())
    }

    /// Append a passenger to a scheduled trip.
    ///
    /// With overbooking allowed (the default) enrollment past `total_seats`
    /// is accepted and only the derived seat count floors at zero.
    pub fn enroll_passenger(&self, trip_id: &str, user_id: &str) -> Result<Trip, CoreError> {
        let trip = self
            .registry
            .update(trip_id, |trip| {
                if trip.is_enrolled(user_id) {
                    return Err(CoreError::AlreadyEnrolled {
                        trip_id: trip_id.to_owned(),
                        user_id: user_id.to_owned(),
                    });
                }
                if trip.is_started() {
                    return Err(CoreError::AlreadyStarted(trip_id.to_owned()));
                }
                if !self.policy.allow_overbooking && trip.available_seats() == 0 {
                    return Err(CoreError::TripFull(trip_id.to_owned()));
                }
                trip.enroll(UserId::new(user_id));
                Ok(())
            })
            .inspect_err(|e| debug!("enroll {user_id} in {trip_id}: rejected ({})", e.kind()))?;
        info!(
            "enrolled {user_id} in trip {trip_id} ({} available)",
            trip.available_seats()
        );
        Ok(trip)
    }

    /// Start a trip on behalf of `caller_id`, who must be its car owner.
    pub fn start_trip(&self, trip_id: &str, caller_id: &str) -> Result<Trip, CoreError> {
        let now = self.clock.now();
        let trip = self
            .registry
            .update(trip_id, |trip| {
                if trip.car_owner_id != *caller_id {
                    return Err(CoreError::Unauthorized {
                        trip_id: trip_id.to_owned(),
                        caller: caller_id.to_owned(),
                    });
                }
                validate_transition(trip_id, trip.state(), TripState::Started)?;
                if trip.enrolled_passengers().is_empty() {
                    return Err(CoreError::NoPassengers(trip_id.to_owned()));
                }
                if !within_grace(now, trip.start_time, self.policy.start_grace()) {
                    return Err(CoreError::OutOfWindow {
                        trip_id: trip_id.to_owned(),
                        action: "started",
                        grace_minutes: self.policy.start_grace_minutes,
                    });
                }
                trip.mark_started();
                Ok(())
            })
            .inspect_err(|e| debug!("start trip {trip_id}: rejected ({})", e.kind()))?;
        info!(
            "started trip {trip_id} with {} passengers",
            trip.enrolled_passengers().len()
        );
        Ok(trip)
    }

    /// Cancel a scheduled trip, removing its record.
    pub fn cancel_trip(&self, trip_id: &str) -> Result<(), CoreError> {
        let now = self.clock.now();
        self.registry
            .remove_if(trip_id, |trip| {
                validate_transition(trip_id, trip.state(), TripState::Cancelled)?;
                if !within_grace(now, trip.start_time, self.policy.cancel_grace()) {
                    return Err(CoreError::OutOfWindow {
                        trip_id: trip_id.to_owned(),
                        action: "cancelled",
                        grace_minutes: self.policy.cancel_grace_minutes,
                    });
                }
                Ok(())
            })
            .inspect_err(|e| debug!("cancel trip {trip_id}: rejected ({})", e.kind()))?;
        info!("cancelled trip {trip_id}");
        Ok(())
    }

    pub fn get_trip(&self, trip_id: &str) -> Result<Trip, CoreError> {
        Ok(self.registry.get(trip_id)?)
    }

    /// Every trip, sorted by id.
    pub fn list_trips(&self) -> Vec<Trip> {
        self.registry.list()
    }

    pub fn get_status(&self, trip_id: &str) -> Result<TripStatus, CoreError> {
        Ok(self.registry.get(trip_id)?.status())
    }
}

impl Default for BookingEngine {
    fn default() -> Self {
        Self::new(BookingPolicy::default())
    }
}

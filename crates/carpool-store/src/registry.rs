use crate::{recover, StoreError};
use carpool_schema::{Trip, TripId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::debug;

/// A trip record behind its own lock. `None` once the trip has been removed,
/// so callers that fetched the slot before the removal see `TripNotFound`.
type Slot = Arc<Mutex<Option<Trip>>>;

/// Trip records, keyed by id, with per-trip mutual exclusion.
///
/// Lock order is always map, then slot. `update` releases the map lock before
/// taking the slot lock, so independent trips are mutated in parallel while
/// two mutations of the same trip are strictly serialized.
#[derive(Debug, Default)]
pub struct TripRegistry {
    trips: RwLock<HashMap<TripId, Slot>>,
}

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<Trip>> {
    recover(slot.lock())
}

impl TripRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, trip_id: &str) -> Result<Slot, StoreError> {
        recover(self.trips.read())
            .get(trip_id)
            .cloned()
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_owned()))
    }

    /// Insert a new trip. The existence check and the insert happen under one
    /// write lock, so two concurrent creates of the same id cannot both win.
    pub fn create(&self, trip: Trip) -> Result<Trip, StoreError> {
        let mut trips = recover(self.trips.write());
        if trips.contains_key(&trip.id) {
            return Err(StoreError::TripExists(trip.id.into_inner()));
        }
        debug!("registry: insert trip {}", trip.id);
        trips.insert(trip.id.clone(), Arc::new(Mutex::new(Some(trip.clone()))));
        Ok(trip)
    }

    pub fn contains(&self, trip_id: &str) -> bool {
        recover(self.trips.read()).contains_key(trip_id)
    }

    pub fn get(&self, trip_id: &str) -> Result<Trip, StoreError> {
        let slot = self.slot(trip_id)?;
        let guard = lock_slot(&slot);
        guard
            .clone()
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_owned()))
    }

    /// Atomic read-modify-write of one trip.
    ///
    /// `f` mutates a copy of the current record while the trip lock is held;
    /// the copy is written back only if `f` succeeds.
    pub fn update<F, E>(&self, trip_id: &str, f: F) -> Result<Trip, E>
    where
        F: FnOnce(&mut Trip) -> Result<(), E>,
        E: From<StoreError>,
    {
        let slot = self.slot(trip_id)?;
        let mut guard = lock_slot(&slot);
        let mut next = guard
            .clone()
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_owned()))?;
        f(&mut next)?;
        *guard = Some(next.clone());
        Ok(next)
    }

    /// Remove a trip if `check` accepts its current state. The check and the
    /// removal happen under the trip lock.
    pub fn remove_if<F, E>(&self, trip_id: &str, check: F) -> Result<Trip, E>
    where
        F: FnOnce(&Trip) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut trips = recover(self.trips.write());
        let slot = trips
            .get(trip_id)
            .cloned()
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_owned()))?;
        let mut guard = lock_slot(&slot);
        let current = guard
            .as_ref()
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_owned()))?;
        check(current)?;
        let removed = guard
            .take()
            .ok_or_else(|| StoreError::TripNotFound(trip_id.to_owned()))?;
        drop(guard);
        trips.remove(trip_id);
        debug!("registry: removed trip {trip_id}");
        Ok(removed)
    }

    pub fn delete(&self, trip_id: &str) -> Result<(), StoreError> {
        self.remove_if(trip_id, |_| Ok::<(), StoreError>(()))
            .map(|_| ())
    }

    /// Snapshot of every trip, sorted by id.
    pub fn list(&self) -> Vec<Trip> {
        let slots: Vec<Slot> = recover(self.trips.read()).values().cloned().collect();
        let mut trips: Vec<Trip> = slots
            .iter()
            .filter_map(|slot| lock_slot(slot).clone())
            .collect();
        trips.sort_by(|a, b| a.id.cmp(&b.id));
        trips
    }

    pub fn len(&self) -> usize {
        recover(self.trips.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

//! In-memory record stores for the carpool engine.
//!
//! `Directory` owns user records and answers existence and car-owner
//! eligibility queries. `TripRegistry` owns trip records and serializes every
//! read-modify-write of a trip behind a per-trip lock, so concurrent callers
//! never observe or overwrite each other's intermediate state.

pub mod directory;
pub mod registry;

pub use directory::Directory;
pub use registry::TripRegistry;

use std::sync::{LockResult, PoisonError};
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("user not found: {0}")]
    UserNotFound(String),
    #[error("user already exists: {0}")]
    UserExists(String),
    #[error("trip not found: {0}")]
    TripNotFound(String),
    #[error("trip already exists: {0}")]
    TripExists(String),
}

/// Recover a guard from a poisoned lock.
///
/// Stored records are only ever replaced whole, after the new value has been
/// fully computed, so a panic in another holder cannot leave a record
/// half-written.
pub(crate) fn recover<G>(result: LockResult<G>) -> G {
    result.unwrap_or_else(|poisoned| {
        warn!("recovering poisoned store lock");
        PoisonError::into_inner(poisoned)
    })
}

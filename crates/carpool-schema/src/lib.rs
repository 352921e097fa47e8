//! Records, identifiers, and booking policy for the car-pooling marketplace.
//!
//! This crate defines the schema shared by every layer: the `User` and `Trip`
//! records, the typed request payloads used to create them (`UserProfile`,
//! `TripRequest`), the wire view of a trip (`TripView`), and the TOML-backed
//! `BookingPolicy` that parameterizes the engine's timing and capacity rules.

pub mod policy;
pub mod trip;
pub mod types;
pub mod user;

pub use policy::{parse_policy_file, parse_policy_str, BookingPolicy, PolicyError};
pub use trip::{Trip, TripRequest, TripState, TripStatus, TripView};
pub use types::{TripId, UserId};
pub use user::{ProfileError, User, UserProfile};

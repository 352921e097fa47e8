use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProfileError {
    #[error("car owners must provide a driver license and a car plate number (missing {0})")]
    MissingOwnerCredentials(&'static str),
}

/// Writable part of a user record, as submitted on create or update.
///
/// Profile fields are opaque; only the car-owner credentials are checked.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserProfile {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_car_owner: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_plate_number: Option<String>,
}

impl UserProfile {
    /// Trim credentials, drop blank ones, and enforce the car-owner invariant.
    pub fn normalize(mut self) -> Result<Self, ProfileError> {
        self.driver_license = non_blank(self.driver_license);
        self.car_plate_number = non_blank(self.car_plate_number);

        if self.is_car_owner {
            if self.driver_license.is_none() {
                return Err(ProfileError::MissingOwnerCredentials("driver_license"));
            }
            if self.car_plate_number.is_none() {
                return Err(ProfileError::MissingOwnerCredentials("car_plate_number"));
            }
        }
        Ok(self)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub first_name: String,
    pub last_name: String,
    pub mobile_number: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub car_plate_number: Option<String>,
    pub is_car_owner: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Build a record from a submitted profile. Fails if the profile claims
    /// car ownership without both credentials.
    pub fn from_profile(
        id: UserId,
        profile: UserProfile,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ProfileError> {
        let profile = profile.normalize()?;
        Ok(Self {
            id,
            first_name: profile.first_name,
            last_name: profile.last_name,
            mobile_number: profile.mobile_number,
            email: profile.email,
            driver_license: profile.driver_license,
            car_plate_number: profile.car_plate_number,
            is_car_owner: profile.is_car_owner,
            created_at,
        })
    }

    /// True iff the user may be referenced as a trip's owner.
    pub fn is_eligible_car_owner(&self) -> bool {
        self.is_car_owner
            && self
                .driver_license
                .as_deref()
                .is_some_and(|s| !s.is_empty())
            && self
                .car_plate_number
                .as_deref()
                .is_some_and(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner_profile() -> UserProfile {
        UserProfile {
            first_name: "Ada".to_owned(),
            last_name: "Lovelace".to_owned(),
            is_car_owner: true,
            driver_license: Some("L1".to_owned()),
            car_plate_number: Some("P1".to_owned()),
            ..UserProfile::default()
        }
    }

    #[test]
    fn owner_with_credentials_is_eligible() {
        let user = User::from_profile("U1".into(), owner_profile(), Utc::now()).unwrap();
        assert!(user.is_eligible_car_owner());
    }

    #[test]
    fn owner_without_plate_is_rejected() {
        let mut profile = owner_profile();
        profile.car_plate_number = Some("   ".to_owned());
        let err = User::from_profile("U1".into(), profile, Utc::now()).unwrap_err();
        assert_eq!(err, ProfileError::MissingOwnerCredentials("car_plate_number"));
    }

    #[test]
    fn owner_without_license_is_rejected() {
        let mut profile = owner_profile();
        profile.driver_license = None;
        assert!(profile.normalize().is_err());
    }

    #[test]
    fn rider_is_not_eligible_even_with_credentials() {
        let mut profile = owner_profile();
        profile.is_car_owner = false;
        let user = User::from_profile("U2".into(), profile, Utc::now()).unwrap();
        assert!(!user.is_eligible_car_owner());
    }

    #[test]
    fn blank_credentials_are_dropped_for_riders() {
        let profile = UserProfile {
            driver_license: Some(String::new()),
            ..UserProfile::default()
        };
        let profile = profile.normalize().unwrap();
        assert_eq!(profile.driver_license, None);
    }

    #[test]
    fn profile_ignores_extra_wire_fields() {
        let json = r#"{"id":"U1","first_name":"Ada","is_car_owner":false}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.first_name, "Ada");
        assert!(!profile.is_car_owner);
    }
}

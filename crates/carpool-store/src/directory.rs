use crate::{recover, StoreError};
use carpool_schema::{User, UserId};
use std::collections::HashMap;
use std::sync::RwLock;

/// User records, keyed by id.
///
/// Readers always receive a clone taken under the lock, so an eligibility
/// check sees either the old or the new owner fields of a concurrently
/// replaced record, never a mix.
#[derive(Debug, Default)]
pub struct Directory {
    users: RwLock<HashMap<UserId, User>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn exists(&self, user_id: &str) -> bool {
        recover(self.users.read()).contains_key(user_id)
    }

    pub fn get(&self, user_id: &str) -> Result<User, StoreError> {
        recover(self.users.read())
            .get(user_id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_owned()))
    }

    pub fn is_eligible_car_owner(&self, user_id: &str) -> bool {
        recover(self.users.read())
            .get(user_id)
            .is_some_and(User::is_eligible_car_owner)
    }

    pub fn insert(&self, user: User) -> Result<User, StoreError> {
        let mut users = recover(self.users.write());
        if users.contains_key(&user.id) {
            return Err(StoreError::UserExists(user.id.into_inner()));
        }
        users.insert(user.id.clone(), user.clone());
        Ok(user)
    }

    /// Replace a user with the record computed by `f` from the current one.
    /// Nothing is written if `f` fails.
    pub fn update<F, E>(&self, user_id: &str, f: F) -> Result<User, E>
    where
        F: FnOnce(&User) -> Result<User, E>,
        E: From<StoreError>,
    {
        let mut users = recover(self.users.write());
        let current = users
            .get(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_owned()))?;
        let key = current.id.clone();
        let next = f(current)?;
        users.insert(key, next.clone());
        Ok(next)
    }

    /// Remove a user if `check` accepts the current record.
    pub fn remove_if<F, E>(&self, user_id: &str, check: F) -> Result<User, E>
    where
        F: FnOnce(&User) -> Result<(), E>,
        E: From<StoreError>,
    {
        let mut users = recover(self.users.write());
        let current = users
            .get(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_owned()))?;
        check(current)?;
        users
            .remove(user_id)
            .ok_or_else(|| StoreError::UserNotFound(user_id.to_owned()).into())
    }

    /// All users, sorted by id.
    pub fn list(&self) -> Vec<User> {
        let mut users: Vec<User> = recover(self.users.read()).values().cloned().collect();
        users.sort_by(|a, b| a.id.cmp(&b.id));
        users
    }

    pub fn len(&self) -> usize {
        recover(self.users.read()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

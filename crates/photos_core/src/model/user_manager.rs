//! Root of the model tree.
//!
//! # Responsibility
//! - Own every `User` and enforce username uniqueness.
//! - Guarantee the built-in `admin` and `stock` accounts on request.
//!
//! # Invariants
//! - No two users share a username, case-insensitively.
//! - `ensure_built_in_users` is idempotent.
//!
//! Snapshot load/save for this type lives in `repo::snapshot_file`.

use super::names_match;
use super::user::User;
use serde::Serialize;

pub const ADMIN_USERNAME: &str = "admin";
pub const STOCK_USERNAME: &str = "stock";
const BUILT_IN_USERNAMES: [&str; 2] = [ADMIN_USERNAME, STOCK_USERNAME];

#[derive(Debug, Clone, Default, Serialize)]
pub struct UserManager {
    users: Vec<User>,
}

impl UserManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Case-insensitive lookup by trimmed username.
    pub fn user(&self, username: &str) -> Option<&User> {
        self.users
            .iter()
            .find(|user| names_match(user.username(), username))
    }

    pub fn user_mut(&mut self, username: &str) -> Option<&mut User> {
        self.users
            .iter_mut()
            .find(|user| names_match(user.username(), username))
    }

    /// Returns `None` when `username` is blank or already taken.
    pub fn add_user(&mut self, username: &str) -> Option<&mut User> {
        if self.user(username).is_some() {
            return None;
        }
        let user = User::new(username).ok()?;
        self.users.push(user);
        self.users.last_mut()
    }

    pub fn delete_user(&mut self, username: &str) -> bool {
        match self
            .users
            .iter()
            .position(|user| names_match(user.username(), username))
        {
            Some(index) => {
                self.users.remove(index);
                true
            }
            None => false,
        }
    }

    /// Adds each built-in account that is currently missing.
    pub fn ensure_built_in_users(&mut self) {
        for username in BUILT_IN_USERNAMES {
            if self.user(username).is_none() {
                self.add_user(username);
            }
        }
    }

    pub fn is_built_in(username: &str) -> bool {
        BUILT_IN_USERNAMES
            .iter()
            .any(|built_in| names_match(built_in, username))
    }
}

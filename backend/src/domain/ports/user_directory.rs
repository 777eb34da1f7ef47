//! Lookup port onto the identity service's user records.

use async_trait::async_trait;

use crate::domain::{UserId, UserProfile};

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading user profiles.
    pub enum UserDirectoryError {
        /// Directory connection could not be established.
        Connection { message: String } =>
            "user directory connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "user directory query failed: {message}",
    }
}

/// Read-only access to user profiles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Fetch a profile. Unknown users yield `None`.
    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError>;
}

/// Fixture directory where every user is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureUserDirectory;

#[async_trait]
impl UserDirectory for FixtureUserDirectory {
    async fn get_user(&self, _id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError> {
        Ok(None)
    }
}

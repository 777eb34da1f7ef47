//! Lookup port onto saved delivery addresses.

use async_trait::async_trait;

use crate::domain::{AddressId, ShippingAddress, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading addresses.
    pub enum AddressBookError {
        /// Address storage connection could not be established.
        Connection { message: String } =>
            "address book connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "address book query failed: {message}",
    }
}

/// Read-only access to a user's saved addresses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AddressBook: Send + Sync {
    /// Fetch an address owned by `owner`. Addresses belonging to someone else
    /// yield `None`, exactly like missing ones.
    async fn find_for_owner(
        &self,
        id: &AddressId,
        owner: &UserId,
    ) -> Result<Option<ShippingAddress>, AddressBookError>;
}

/// Fixture address book with no entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureAddressBook;

#[async_trait]
impl AddressBook for FixtureAddressBook {
    async fn find_for_owner(
        &self,
        _id: &AddressId,
        _owner: &UserId,
    ) -> Result<Option<ShippingAddress>, AddressBookError> {
        Ok(None)
    }
}

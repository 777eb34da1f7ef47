//! Strongly typed identifiers for marketplace aggregates and collaborators.
//!
//! All identifiers are UUIDs on the wire and in storage. Distinct newtypes
//! stop a book id from being passed where a buyer id is expected.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Error returned when an identifier string is not a UUID.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} must be a valid UUID")]
pub struct IdentifierError {
    kind: &'static str,
}

impl IdentifierError {
    /// Identifier kind that failed to parse, for example `bookId`.
    pub fn kind(&self) -> &'static str {
        self.kind
    }
}

macro_rules! uuid_identifier {
    ($(#[$meta:meta])* $name:ident => $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random identifier.
            #[must_use]
            pub fn random() -> Self {
                Self(Uuid::new_v4())
            }

            /// Access the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }

        impl FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                if s.trim() != s {
                    return Err(IdentifierError { kind: $kind });
                }
                Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| IdentifierError { kind: $kind })
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0.to_string()
            }
        }
    };
}

uuid_identifier!(
    /// Registered user acting as buyer or seller.
    UserId => "userId"
);
uuid_identifier!(
    /// Book listing owned by the catalogue.
    BookId => "bookId"
);
uuid_identifier!(
    /// Meet-up negotiation.
    DealId => "dealId"
);
uuid_identifier!(
    /// Multi-item cart purchase.
    OrderId => "orderId"
);
uuid_identifier!(
    /// Saved shipping address in the buyer's address book.
    AddressId => "addressId"
);
uuid_identifier!(
    /// Legacy single-book payment record.
    TransactionId => "transactionId"
);

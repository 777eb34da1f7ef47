//! Read-side snapshots of collaborator-owned records.
//!
//! Books and users belong to the catalogue and identity services. The
//! fulfillment core only ever sees these narrow snapshots, fetched through
//! the lookup ports when a response needs expanding.

use serde::{Deserialize, Serialize};

use super::{BookId, Money, UserId};

/// Catalogue view of a book listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookListing {
    pub id: BookId,
    pub title: String,
    pub author: Option<String>,
    pub price: Money,
    pub seller_id: UserId,
}

/// Identity view of a registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
}

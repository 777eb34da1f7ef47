//! Meet-up deal aggregate.
//!
//! A deal records one buyer's intent to acquire one book from its seller,
//! either by meeting in person or by courier. Deals are never deleted; closed
//! deals remain for history and rating.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BookListing, DealId, UserId, UserProfile};

/// Negotiation progress. Variants are declared in lifecycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DealStatus {
    Pending,
    Confirmed,
    #[serde(rename = "In Transit")]
    InTransit,
    Completed,
}

impl DealStatus {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Confirmed => "Confirmed",
            Self::InTransit => "In Transit",
            Self::Completed => "Completed",
        }
    }

    /// Whether a deal in this status may move to `next`.
    ///
    /// Status only moves forward. Re-applying the current status is allowed
    /// so repeated completion requests stay harmless.
    pub fn can_move_to(self, next: Self) -> bool {
        next >= self
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DealStatus {
    type Err = DealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Confirmed" => Ok(Self::Confirmed),
            "In Transit" => Ok(Self::InTransit),
            "Completed" => Ok(Self::Completed),
            other => Err(DealError::UnknownStatus(other.to_owned())),
        }
    }
}

/// How the book changes hands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandoffMethod {
    Pickup,
    Courier,
}

impl HandoffMethod {
    /// Storage and wire representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pickup => "pickup",
            Self::Courier => "courier",
        }
    }
}

impl FromStr for HandoffMethod {
    type Err = DealError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pickup" => Ok(Self::Pickup),
            "courier" => Ok(Self::Courier),
            other => Err(DealError::UnknownMethod(other.to_owned())),
        }
    }
}

/// Star rating in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Stars(u8);

impl Stars {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Number of stars.
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Stars {
    type Error = DealError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .ok()
            .filter(|stars| (Self::MIN..=Self::MAX).contains(stars))
            .map(Self)
            .ok_or(DealError::StarsOutOfRange(value))
    }
}

impl From<Stars> for u8 {
    fn from(value: Stars) -> Self {
        value.0
    }
}

/// Rating left on a completed deal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rating {
    pub stars: Stars,
    pub comment: Option<String>,
    pub by: UserId,
}

/// Rule violations raised by the deal aggregate.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DealError {
    #[error("buyer and seller must differ")]
    SelfTrade,
    #[error("deal cannot move from {from} back to {to}")]
    StatusRegression { from: DealStatus, to: DealStatus },
    #[error("only completed deals can be rated")]
    NotCompleted,
    #[error("stars must be between 1 and 5, got {0}")]
    StarsOutOfRange(i64),
    #[error("unknown deal status: {0}")]
    UnknownStatus(String),
    #[error("unknown handoff method: {0}")]
    UnknownMethod(String),
}

/// Input for opening a new deal.
#[derive(Debug, Clone)]
pub struct NewDeal {
    pub book_id: BookId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub method: HandoffMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Stored deal fields, used by persistence adapters to rebuild an aggregate.
#[derive(Debug, Clone)]
pub struct DealRecord {
    pub id: DealId,
    pub book_id: BookId,
    pub buyer_id: UserId,
    pub seller_id: UserId,
    pub status: DealStatus,
    pub method: HandoffMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
    pub rating: Option<Rating>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Meet-up negotiation between a buyer and the seller of one book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    id: DealId,
    book_id: BookId,
    buyer_id: UserId,
    seller_id: UserId,
    status: DealStatus,
    method: HandoffMethod,
    scheduled_time: Option<DateTime<Utc>>,
    rating: Option<Rating>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Deal {
    /// Open a pending deal.
    pub fn open(draft: NewDeal, now: DateTime<Utc>) -> Result<Self, DealError> {
        if draft.buyer_id == draft.seller_id {
            return Err(DealError::SelfTrade);
        }
        Ok(Self {
            id: DealId::random(),
            book_id: draft.book_id,
            buyer_id: draft.buyer_id,
            seller_id: draft.seller_id,
            status: DealStatus::Pending,
            method: draft.method,
            scheduled_time: draft.scheduled_time,
            rating: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// Rebuild a deal from storage without re-running creation rules.
    pub fn restore(record: DealRecord) -> Self {
        let DealRecord {
            id,
            book_id,
            buyer_id,
            seller_id,
            status,
            method,
            scheduled_time,
            rating,
            created_at,
            updated_at,
        } = record;
        Self {
            id,
            book_id,
            buyer_id,
            seller_id,
            status,
            method,
            scheduled_time,
            rating,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> DealId {
        self.id
    }

    pub fn book_id(&self) -> BookId {
        self.book_id
    }

    pub fn buyer_id(&self) -> UserId {
        self.buyer_id
    }

    pub fn seller_id(&self) -> UserId {
        self.seller_id
    }

    pub fn status(&self) -> DealStatus {
        self.status
    }

    pub fn method(&self) -> HandoffMethod {
        self.method
    }

    pub fn scheduled_time(&self) -> Option<DateTime<Utc>> {
        self.scheduled_time
    }

    pub fn rating(&self) -> Option<&Rating> {
        self.rating.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `user` is the buyer or the seller.
    pub fn involves(&self, user: UserId) -> bool {
        self.buyer_id == user || self.seller_id == user
    }

    /// Move to `next`, refusing to go backwards.
    pub fn advance(&mut self, next: DealStatus, now: DateTime<Utc>) -> Result<(), DealError> {
        if !self.status.can_move_to(next) {
            return Err(DealError::StatusRegression {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        self.touch(now);
        Ok(())
    }

    /// Attach a rating, replacing any earlier one.
    pub fn rate(&mut self, rating: Rating, now: DateTime<Utc>) -> Result<(), DealError> {
        if self.status != DealStatus::Completed {
            return Err(DealError::NotCompleted);
        }
        self.rating = Some(rating);
        self.touch(now);
        Ok(())
    }

    /// Stamp the modification time. Called before every write.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

/// Deal with its book and counterparties expanded for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DealView {
    #[serde(flatten)]
    pub deal: Deal,
    pub book: Option<BookListing>,
    pub buyer: Option<UserProfile>,
    pub seller: Option<UserProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .expect("valid timestamp")
            .with_timezone(&Utc)
    }

    #[fixture]
    fn deal(now: DateTime<Utc>) -> Deal {
        Deal::open(
            NewDeal {
                book_id: BookId::random(),
                buyer_id: UserId::random(),
                seller_id: UserId::random(),
                method: HandoffMethod::Pickup,
                scheduled_time: None,
            },
            now,
        )
        .expect("distinct parties")
    }

    #[rstest]
    fn open_rejects_self_trade(now: DateTime<Utc>) {
        let user = UserId::random();
        let result = Deal::open(
            NewDeal {
                book_id: BookId::random(),
                buyer_id: user,
                seller_id: user,
                method: HandoffMethod::Courier,
                scheduled_time: None,
            },
            now,
        );
        assert_eq!(result, Err(DealError::SelfTrade));
    }

    #[rstest]
    fn new_deals_start_pending(deal: Deal) {
        assert_eq!(deal.status(), DealStatus::Pending);
        assert!(deal.rating().is_none());
    }

    #[rstest]
    #[case(DealStatus::Pending, DealStatus::Confirmed, true)]
    #[case(DealStatus::Confirmed, DealStatus::Completed, true)]
    #[case(DealStatus::InTransit, DealStatus::InTransit, true)]
    #[case(DealStatus::Completed, DealStatus::Pending, false)]
    #[case(DealStatus::InTransit, DealStatus::Confirmed, false)]
    fn status_only_moves_forward(
        #[case] from: DealStatus,
        #[case] to: DealStatus,
        #[case] allowed: bool,
    ) {
        assert_eq!(from.can_move_to(to), allowed);
    }

    #[rstest]
    fn regression_leaves_status_unchanged(mut deal: Deal, now: DateTime<Utc>) {
        deal.advance(DealStatus::Completed, now).expect("forward move");
        let err = deal
            .advance(DealStatus::Confirmed, now)
            .expect_err("backward move");
        assert!(matches!(err, DealError::StatusRegression { .. }));
        assert_eq!(deal.status(), DealStatus::Completed);
    }

    #[rstest]
    fn rating_requires_completion(mut deal: Deal, now: DateTime<Utc>) {
        let rating = Rating {
            stars: Stars::try_from(4).expect("in range"),
            comment: None,
            by: deal.buyer_id(),
        };
        assert_eq!(deal.rate(rating.clone(), now), Err(DealError::NotCompleted));

        deal.advance(DealStatus::Completed, now).expect("complete");
        deal.rate(rating.clone(), now).expect("rate completed deal");
        assert_eq!(deal.rating(), Some(&rating));
    }

    #[rstest]
    #[case(0)]
    #[case(6)]
    #[case(-1)]
    #[case(300)]
    fn stars_outside_range_are_rejected(#[case] raw: i64) {
        assert_eq!(Stars::try_from(raw), Err(DealError::StarsOutOfRange(raw)));
    }

    #[rstest]
    fn in_transit_uses_spaced_wire_name() {
        let value = serde_json::to_value(DealStatus::InTransit).expect("serialise");
        assert_eq!(value, "In Transit");
        assert_eq!("In Transit".parse::<DealStatus>(), Ok(DealStatus::InTransit));
    }
}

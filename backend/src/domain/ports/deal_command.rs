//! Driving port for meet-up deal mutations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{BookId, Deal, DealId, DealView, Error, HandoffMethod, NewDeal, UserId};

/// Request to open (or fetch) the caller's deal for a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDealRequest {
    pub book_id: BookId,
    pub buyer_id: UserId,
    pub method: HandoffMethod,
    pub scheduled_time: Option<DateTime<Utc>>,
}

/// Outcome of [`DealCommand::create_deal`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateDealResponse {
    /// The new or pre-existing deal, expanded.
    pub deal: DealView,
    /// `false` when the buyer already had a deal for this book.
    pub created: bool,
}

/// Request to rate a completed deal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateDealRequest {
    pub deal_id: DealId,
    pub rater_id: UserId,
    /// Raw star count; validated against `1..=5`.
    pub stars: i64,
    pub comment: Option<String>,
}

/// Driving port for deal negotiation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DealCommand: Send + Sync {
    /// Open a deal, or return the buyer's existing deal for the same book.
    ///
    /// # Errors
    ///
    /// - `not_found` when the book does not exist.
    /// - `self_trade` when the buyer is the book's seller.
    async fn create_deal(&self, request: CreateDealRequest) -> Result<CreateDealResponse, Error>;

    /// Close a deal and purge its chat thread.
    ///
    /// # Errors
    ///
    /// - `not_found` when the deal does not exist.
    /// - `authorization_error` when the caller is neither buyer nor seller.
    async fn complete_deal(&self, deal_id: DealId, caller: UserId) -> Result<DealView, Error>;

    /// Attach or replace the rating on a completed deal.
    ///
    /// # Errors
    ///
    /// - `validation_error` when stars fall outside `1..=5`.
    /// - `not_found` when the deal does not exist.
    /// - `authorization_error` when the rater is not a participant.
    /// - `invalid_transition` when the deal is not completed yet.
    async fn rate_deal(&self, request: RateDealRequest) -> Result<DealView, Error>;
}

/// Fixture command that opens unexpanded deals and finds nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureDealCommand;

#[async_trait]
impl DealCommand for FixtureDealCommand {
    async fn create_deal(&self, request: CreateDealRequest) -> Result<CreateDealResponse, Error> {
        let deal = Deal::open(
            NewDeal {
                book_id: request.book_id,
                buyer_id: request.buyer_id,
                seller_id: UserId::random(),
                method: request.method,
                scheduled_time: request.scheduled_time,
            },
            Utc::now(),
        )
        .map_err(|err| Error::self_trade(err.to_string()))?;
        Ok(CreateDealResponse {
            deal: DealView {
                deal,
                book: None,
                buyer: None,
                seller: None,
            },
            created: true,
        })
    }

    async fn complete_deal(&self, _deal_id: DealId, _caller: UserId) -> Result<DealView, Error> {
        Err(Error::not_found("deal not found"))
    }

    async fn rate_deal(&self, _request: RateDealRequest) -> Result<DealView, Error> {
        Err(Error::not_found("deal not found"))
    }
}

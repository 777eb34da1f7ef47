//! Meet-up deal negotiation service.
//!
//! Implements the deal driving ports. Book and user details are joined on
//! read through the catalogue and directory ports; the deal store only keeps
//! references.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{info, warn};

use crate::domain::ports::{
    BookCatalogue, BookCatalogueError, ChatPurger, CreateDealRequest, CreateDealResponse,
    DealCommand, DealInsertOutcome, DealQuery, DealRepository, DealRepositoryError,
    RateDealRequest, UserDirectory, UserDirectoryError,
};
use crate::domain::{
    BookListing, Deal, DealError, DealId, DealStatus, DealView, Error, NewDeal,
    NotificationDispatcher, Rating, Stars, UserId, UserProfile,
};

/// Push event announcing a new meet-up request to the seller.
pub const NEW_MEET_REQUEST_EVENT: &str = "new-meet-request";

/// Which counterparties to expand on a [`DealView`].
#[derive(Debug, Clone, Copy)]
struct Expand {
    buyer: bool,
    seller: bool,
}

impl Expand {
    const ALL: Self = Self {
        buyer: true,
        seller: true,
    };
    const BUYER: Self = Self {
        buyer: true,
        seller: false,
    };
    const SELLER: Self = Self {
        buyer: false,
        seller: true,
    };
}

/// Deal service implementing [`DealCommand`] and [`DealQuery`].
#[derive(Clone)]
pub struct DealNegotiator<D, B, U, C> {
    deals: Arc<D>,
    books: Arc<B>,
    users: Arc<U>,
    chats: Arc<C>,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl<D, B, U, C> DealNegotiator<D, B, U, C> {
    /// Create a new service over the given ports.
    pub fn new(
        deals: Arc<D>,
        books: Arc<B>,
        users: Arc<U>,
        chats: Arc<C>,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            deals,
            books,
            users,
            chats,
            notifier,
            clock,
        }
    }
}

impl<D, B, U, C> DealNegotiator<D, B, U, C>
where
    D: DealRepository,
    B: BookCatalogue,
    U: UserDirectory,
    C: ChatPurger,
{
    fn map_deal_error(error: DealRepositoryError) -> Error {
        match error {
            DealRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("deal repository unavailable: {message}"))
            }
            DealRepositoryError::Query { message } => {
                Error::internal(format!("deal repository error: {message}"))
            }
        }
    }

    fn map_book_error(error: BookCatalogueError) -> Error {
        match error {
            BookCatalogueError::Connection { message } => {
                Error::service_unavailable(format!("book catalogue unavailable: {message}"))
            }
            BookCatalogueError::Query { message } => {
                Error::internal(format!("book catalogue error: {message}"))
            }
        }
    }

    fn map_user_error(error: UserDirectoryError) -> Error {
        match error {
            UserDirectoryError::Connection { message } => {
                Error::service_unavailable(format!("user directory unavailable: {message}"))
            }
            UserDirectoryError::Query { message } => {
                Error::internal(format!("user directory error: {message}"))
            }
        }
    }

    fn map_rule_error(error: DealError) -> Error {
        match error {
            DealError::SelfTrade => Error::self_trade("you cannot buy your own book"),
            DealError::StatusRegression { .. } | DealError::NotCompleted => {
                Error::invalid_transition(error.to_string())
            }
            DealError::StarsOutOfRange(value) => Error::invalid_request(error.to_string())
                .with_details(json!({
                    "field": "stars",
                    "value": value,
                    "code": "stars_out_of_range",
                })),
            DealError::UnknownStatus(_) | DealError::UnknownMethod(_) => {
                Error::invalid_request(error.to_string())
            }
        }
    }

    async fn book(&self, deal: &Deal) -> Result<Option<BookListing>, Error> {
        self.books
            .get_book(&deal.book_id())
            .await
            .map_err(Self::map_book_error)
    }

    async fn user(&self, id: &UserId) -> Result<Option<UserProfile>, Error> {
        self.users.get_user(id).await.map_err(Self::map_user_error)
    }

    async fn expand(&self, deal: Deal, expand: Expand) -> Result<DealView, Error> {
        let book = self.book(&deal).await?;
        let buyer = if expand.buyer {
            self.user(&deal.buyer_id()).await?
        } else {
            None
        };
        let seller = if expand.seller {
            self.user(&deal.seller_id()).await?
        } else {
            None
        };
        Ok(DealView {
            deal,
            book,
            buyer,
            seller,
        })
    }

    async fn load(&self, deal_id: &DealId) -> Result<Deal, Error> {
        self.deals
            .find_by_id(deal_id)
            .await
            .map_err(Self::map_deal_error)?
            .ok_or_else(|| Error::not_found("deal not found"))
    }

    async fn load_for_participant(&self, deal_id: &DealId, caller: &UserId) -> Result<Deal, Error> {
        let deal = self.load(deal_id).await?;
        if !deal.involves(*caller) {
            return Err(Error::forbidden("only the buyer or seller may change this deal"));
        }
        Ok(deal)
    }

    fn announce(&self, view: &DealView) {
        let buyer_name = view
            .buyer
            .as_ref()
            .map_or("A buyer", |buyer| buyer.name.as_str());
        let title = view
            .book
            .as_ref()
            .map_or("your book", |book| book.title.as_str());
        self.notifier.push_to_user(
            &view.deal.seller_id(),
            NEW_MEET_REQUEST_EVENT,
            json!({
                "message": format!("{buyer_name} wants to meet for \"{title}\""),
                "bookId": view.deal.book_id(),
                "buyerName": buyer_name,
            }),
        );
    }
}

#[async_trait]
impl<D, B, U, C> DealCommand for DealNegotiator<D, B, U, C>
where
    D: DealRepository,
    B: BookCatalogue,
    U: UserDirectory,
    C: ChatPurger,
{
    async fn create_deal(&self, request: CreateDealRequest) -> Result<CreateDealResponse, Error> {
        let book = self
            .books
            .get_book(&request.book_id)
            .await
            .map_err(Self::map_book_error)?
            .ok_or_else(|| Error::not_found("book not found"))?;

        let draft = NewDeal {
            book_id: request.book_id,
            buyer_id: request.buyer_id,
            seller_id: book.seller_id,
            method: request.method,
            scheduled_time: request.scheduled_time,
        };
        let deal = Deal::open(draft, self.clock.utc()).map_err(Self::map_rule_error)?;

        if let Some(existing) = self
            .deals
            .find_by_book_and_buyer(&request.book_id, &request.buyer_id)
            .await
            .map_err(Self::map_deal_error)?
        {
            let view = self.expand(existing, Expand::ALL).await?;
            return Ok(CreateDealResponse {
                deal: view,
                created: false,
            });
        }

        let outcome = self
            .deals
            .insert_if_absent(&deal)
            .await
            .map_err(Self::map_deal_error)?;
        let (stored, created) = match outcome {
            DealInsertOutcome::Created(stored) => (stored, true),
            DealInsertOutcome::Existing(stored) => (stored, false),
        };
        let view = self.expand(stored, Expand::ALL).await?;
        if created {
            info!(deal_id = %view.deal.id(), book_id = %view.deal.book_id(), "deal created");
            self.announce(&view);
        }
        Ok(CreateDealResponse {
            deal: view,
            created,
        })
    }

    async fn complete_deal(&self, deal_id: DealId, caller: UserId) -> Result<DealView, Error> {
        let mut deal = self.load_for_participant(&deal_id, &caller).await?;
        if deal.status() != DealStatus::Completed {
            deal.advance(DealStatus::Completed, self.clock.utc())
                .map_err(Self::map_rule_error)?;
            self.deals.save(&deal).await.map_err(Self::map_deal_error)?;
            info!(%deal_id, "deal completed");
        }

        match self.chats.purge_deal_thread(&deal_id).await {
            Ok(removed) => info!(%deal_id, removed, "deal chat purged"),
            Err(error) => warn!(%deal_id, %error, "failed to purge deal chat"),
        }

        self.expand(deal, Expand::ALL).await
    }

    async fn rate_deal(&self, request: RateDealRequest) -> Result<DealView, Error> {
        let stars = Stars::try_from(request.stars).map_err(Self::map_rule_error)?;
        let mut deal = self
            .load_for_participant(&request.deal_id, &request.rater_id)
            .await?;
        let rating = Rating {
            stars,
            comment: request.comment,
            by: request.rater_id,
        };
        deal.rate(rating, self.clock.utc())
            .map_err(Self::map_rule_error)?;
        self.deals.save(&deal).await.map_err(Self::map_deal_error)?;
        self.expand(deal, Expand::ALL).await
    }
}

#[async_trait]
impl<D, B, U, C> DealQuery for DealNegotiator<D, B, U, C>
where
    D: DealRepository,
    B: BookCatalogue,
    U: UserDirectory,
    C: ChatPurger,
{
    async fn list_for_seller(&self, seller_id: UserId) -> Result<Vec<DealView>, Error> {
        let deals = self
            .deals
            .list_for_seller(&seller_id)
            .await
            .map_err(Self::map_deal_error)?;
        let mut views = Vec::with_capacity(deals.len());
        for deal in deals {
            views.push(self.expand(deal, Expand::BUYER).await?);
        }
        Ok(views)
    }

    async fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<DealView>, Error> {
        let deals = self
            .deals
            .list_for_buyer(&buyer_id)
            .await
            .map_err(Self::map_deal_error)?;
        let mut views = Vec::with_capacity(deals.len());
        for deal in deals {
            let view = self.expand(deal, Expand::SELLER).await?;
            if view.book.is_some() {
                views.push(view);
            }
        }
        Ok(views)
    }

    async fn get_deal(&self, deal_id: DealId, caller: UserId) -> Result<DealView, Error> {
        let deal = self.load(&deal_id).await?;
        if !deal.involves(caller) {
            return Err(Error::not_found("deal not found"));
        }
        self.expand(deal, Expand::ALL).await
    }

    async fn sold_count(&self, seller_id: UserId) -> Result<u64, Error> {
        self.deals
            .count_for_seller(&seller_id, DealStatus::Completed)
            .await
            .map_err(Self::map_deal_error)
    }
}

#[cfg(test)]
#[path = "deal_service_tests.rs"]
mod tests;

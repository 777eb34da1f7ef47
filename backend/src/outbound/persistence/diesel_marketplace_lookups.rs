//! Diesel adapters for records owned by neighbouring services.
//!
//! Books, users, carts, addresses and chat live in the same database but are
//! written elsewhere. These adapters only read them, except for clearing a
//! cart after payment and purging a finished deal's chat thread.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{
    AddressBook, AddressBookError, BookCatalogue, BookCatalogueError, CartStore, CartStoreError,
    ChatPurger, ChatPurgerError, UserDirectory, UserDirectoryError,
};
use crate::domain::{
    AddressId, BookId, BookListing, DealId, Money, ShippingAddress, UserId, UserProfile,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{AddressRow, BookRow, UserRow};
use super::pool::DbPool;
use super::schema::{addresses, books, cart_items, chat_messages, users};

fn row_to_book(row: BookRow) -> Option<BookListing> {
    let price = Money::from_minor(row.price_minor)?;
    Some(BookListing {
        id: BookId::from_uuid(row.id),
        title: row.title,
        author: row.author,
        price,
        seller_id: UserId::from_uuid(row.seller_id),
    })
}

fn row_to_address(row: AddressRow) -> ShippingAddress {
    ShippingAddress {
        full_name: row.full_name,
        phone_number: row.phone_number,
        address_line1: row.address_line1,
        address_line2: row.address_line2,
        city: row.city,
        state: row.state,
        postal_code: row.postal_code,
        country: row.country,
    }
}

/// Catalogue lookups against the `books` table.
#[derive(Clone)]
pub struct DieselBookCatalogue {
    pool: DbPool,
}

impl DieselBookCatalogue {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookCatalogue for DieselBookCatalogue {
    async fn get_book(&self, id: &BookId) -> Result<Option<BookListing>, BookCatalogueError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, BookCatalogueError::connection))?;
        let row = books::table
            .find(id.as_uuid())
            .select(BookRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(err, BookCatalogueError::query, BookCatalogueError::connection)
            })?;
        match row {
            Some(row) => row_to_book(row)
                .map(Some)
                .ok_or_else(|| BookCatalogueError::query("negative book price")),
            None => Ok(None),
        }
    }
}

/// Identity lookups against the `users` table.
#[derive(Clone)]
pub struct DieselUserDirectory {
    pool: DbPool,
}

impl DieselUserDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for DieselUserDirectory {
    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, UserDirectoryError::connection))?;
        let row = users::table
            .find(id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(err, UserDirectoryError::query, UserDirectoryError::connection)
            })?;
        Ok(row.map(|row| UserProfile {
            id: UserId::from_uuid(row.id),
            name: row.name,
            email: row.email,
        }))
    }
}

/// Shopping cart backed by `cart_items` joined to `books`.
#[derive(Clone)]
pub struct DieselCartStore {
    pool: DbPool,
}

impl DieselCartStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CartStore for DieselCartStore {
    async fn snapshot(&self, user_id: &UserId) -> Result<Vec<BookListing>, CartStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CartStoreError::connection))?;
        let rows = cart_items::table
            .inner_join(books::table)
            .filter(cart_items::user_id.eq(user_id.as_uuid()))
            .order(cart_items::added_at.asc())
            .select(BookRow::as_select())
            .load(&mut conn)
            .await
            .map_err(cart_error)?;
        rows.into_iter()
            .map(|row| row_to_book(row).ok_or_else(|| CartStoreError::query("negative book price")))
            .collect()
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), CartStoreError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CartStoreError::connection))?;
        diesel::delete(cart_items::table.filter(cart_items::user_id.eq(user_id.as_uuid())))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(cart_error)
    }
}

fn cart_error(error: diesel::result::Error) -> CartStoreError {
    map_diesel_error(error, CartStoreError::query, CartStoreError::connection)
}

/// Saved delivery addresses.
#[derive(Clone)]
pub struct DieselAddressBook {
    pool: DbPool,
}

impl DieselAddressBook {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AddressBook for DieselAddressBook {
    async fn find_for_owner(
        &self,
        id: &AddressId,
        owner: &UserId,
    ) -> Result<Option<ShippingAddress>, AddressBookError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, AddressBookError::connection))?;
        let row = addresses::table
            .filter(addresses::id.eq(id.as_uuid()))
            .filter(addresses::user_id.eq(owner.as_uuid()))
            .select(AddressRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| {
                map_diesel_error(err, AddressBookError::query, AddressBookError::connection)
            })?;
        Ok(row.map(row_to_address))
    }
}

/// Deletes a deal's chat thread from `chat_messages`.
#[derive(Clone)]
pub struct DieselChatPurger {
    pool: DbPool,
}

impl DieselChatPurger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChatPurger for DieselChatPurger {
    async fn purge_deal_thread(&self, deal_id: &DealId) -> Result<u64, ChatPurgerError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, ChatPurgerError::connection))?;
        let removed = diesel::delete(
            chat_messages::table.filter(chat_messages::deal_id.eq(deal_id.as_uuid())),
        )
        .execute(&mut conn)
        .await
        .map_err(|err| {
            map_diesel_error(err, ChatPurgerError::query, ChatPurgerError::connection)
        })?;
        Ok(u64::try_from(removed).unwrap_or_default())
    }
}

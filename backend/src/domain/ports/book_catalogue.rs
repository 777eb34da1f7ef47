//! Lookup port onto the book catalogue.

use async_trait::async_trait;

use crate::domain::{BookId, BookListing};

use super::define_port_error;

define_port_error! {
    /// Errors raised while reading the catalogue.
    pub enum BookCatalogueError {
        /// Catalogue connection could not be established.
        Connection { message: String } =>
            "book catalogue connection failed: {message}",
        /// Lookup failed during execution.
        Query { message: String } =>
            "book catalogue query failed: {message}",
    }
}

/// Read-only access to book listings owned by the catalogue.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookCatalogue: Send + Sync {
    /// Fetch a listing. Deleted books yield `None`.
    async fn get_book(&self, id: &BookId) -> Result<Option<BookListing>, BookCatalogueError>;
}

/// Fixture catalogue where every book is missing.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureBookCatalogue;

#[async_trait]
impl BookCatalogue for FixtureBookCatalogue {
    async fn get_book(&self, _id: &BookId) -> Result<Option<BookListing>, BookCatalogueError> {
        Ok(None)
    }
}

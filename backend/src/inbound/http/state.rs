//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain ports (use-cases) and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    CheckoutCommand, DealCommand, DealQuery, FixtureCheckoutCommand, FixtureDealCommand,
    FixtureDealQuery, FixtureOrderCommand, FixtureOrderQuery, OrderCommand, OrderQuery,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub deals: Arc<dyn DealCommand>,
    pub deals_query: Arc<dyn DealQuery>,
    pub orders: Arc<dyn OrderCommand>,
    pub orders_query: Arc<dyn OrderQuery>,
    pub checkout: Arc<dyn CheckoutCommand>,
}

impl HttpState {
    /// State backed entirely by fixture ports. Individual ports are then
    /// swapped with the `with_*` builders.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use marketplace::domain::ports::FixtureOrderQuery;
    /// use marketplace::inbound::http::state::HttpState;
    ///
    /// let state = HttpState::fixtures().with_orders_query(Arc::new(FixtureOrderQuery));
    /// let _orders = state.orders_query.clone();
    /// ```
    pub fn fixtures() -> Self {
        Self {
            deals: Arc::new(FixtureDealCommand),
            deals_query: Arc::new(FixtureDealQuery),
            orders: Arc::new(FixtureOrderCommand),
            orders_query: Arc::new(FixtureOrderQuery),
            checkout: Arc::new(FixtureCheckoutCommand),
        }
    }

    /// Replace the deal command port.
    #[must_use]
    pub fn with_deals(mut self, deals: Arc<dyn DealCommand>) -> Self {
        self.deals = deals;
        self
    }

    /// Replace the deal query port.
    #[must_use]
    pub fn with_deals_query(mut self, deals_query: Arc<dyn DealQuery>) -> Self {
        self.deals_query = deals_query;
        self
    }

    /// Replace the order command port.
    #[must_use]
    pub fn with_orders(mut self, orders: Arc<dyn OrderCommand>) -> Self {
        self.orders = orders;
        self
    }

    /// Replace the order query port.
    #[must_use]
    pub fn with_orders_query(mut self, orders_query: Arc<dyn OrderQuery>) -> Self {
        self.orders_query = orders_query;
        self
    }

    /// Replace the legacy checkout port.
    #[must_use]
    pub fn with_checkout(mut self, checkout: Arc<dyn CheckoutCommand>) -> Self {
        self.checkout = checkout;
        self
    }
}

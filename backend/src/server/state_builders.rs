//! Builders for HTTP and WebSocket state from repository-backed services.

use std::sync::Arc;

use mockable::{Clock, DefaultClock};

use marketplace::domain::checkout_service::CheckoutPorts;
use marketplace::domain::order_service::OrderFulfillmentPorts;
use marketplace::domain::ports::{
    BookCatalogue, CheckoutCommand, DealCommand, DealQuery, OrderCommand, OrderQuery,
    UserDirectory,
};
use marketplace::domain::{
    CheckoutService, DealNegotiator, NotificationDispatcher, OrderFulfillment, PaymentVerifier,
};
use marketplace::inbound::http::state::HttpState;
use marketplace::inbound::ws::state::WsState;
use marketplace::outbound::persistence::{
    DieselAddressBook, DieselBookCatalogue, DieselCartStore, DieselChatPurger,
    DieselDealRepository, DieselOrderRepository, DieselTransactionRepository,
    DieselUserDirectory,
};
use marketplace::outbound::push::PushRegistry;

use super::ServerConfig;

/// Cast one service into its command and query port objects.
fn split<S, Cmd, Query>(
    service: S,
    cast: fn(Arc<S>) -> (Arc<Cmd>, Arc<Query>),
) -> (Arc<Cmd>, Arc<Query>)
where
    Cmd: ?Sized,
    Query: ?Sized,
{
    cast(Arc::new(service))
}

/// Wire Diesel repositories and outbound adapters into the driving ports.
pub(super) fn build_http_state(config: &ServerConfig, registry: Arc<PushRegistry>) -> HttpState {
    let pool = &config.db_pool;
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let books = Arc::new(DieselBookCatalogue::new(pool.clone()));
    let users = Arc::new(DieselUserDirectory::new(pool.clone()));
    let notifier = Arc::new(NotificationDispatcher::new(config.mailer.clone(), registry));
    let verifier = PaymentVerifier::new(config.payment_secret.clone());

    let (deals, deals_query) = split(
        DealNegotiator::new(
            Arc::new(DieselDealRepository::new(pool.clone())),
            books.clone(),
            users.clone(),
            Arc::new(DieselChatPurger::new(pool.clone())),
            notifier.clone(),
            clock.clone(),
        ),
        |service| -> (Arc<dyn DealCommand>, Arc<dyn DealQuery>) { (service.clone(), service) },
    );

    let catalogue: Arc<dyn BookCatalogue> = books.clone();
    let directory: Arc<dyn UserDirectory> = users;
    let (orders, orders_query) = split(
        OrderFulfillment::new(
            OrderFulfillmentPorts {
                orders: Arc::new(DieselOrderRepository::new(pool.clone())),
                carts: Arc::new(DieselCartStore::new(pool.clone())),
                addresses: Arc::new(DieselAddressBook::new(pool.clone())),
                gateway: config.gateway.clone(),
                books: catalogue,
                users: directory.clone(),
            },
            verifier.clone(),
            notifier,
            clock.clone(),
        ),
        |service| -> (Arc<dyn OrderCommand>, Arc<dyn OrderQuery>) { (service.clone(), service) },
    );

    let checkout: Arc<dyn CheckoutCommand> = Arc::new(CheckoutService::new(
        CheckoutPorts {
            transactions: Arc::new(DieselTransactionRepository::new(pool.clone())),
            books,
            gateway: config.gateway.clone(),
            carrier: config.carrier.clone(),
            users: directory,
        },
        verifier,
        clock,
    ));

    HttpState {
        deals,
        deals_query,
        orders,
        orders_query,
        checkout,
    }
}

pub(super) fn build_ws_state(config: &ServerConfig, registry: Arc<PushRegistry>) -> WsState {
    WsState::new(registry, config.tokens.clone(), config.origins.clone())
}

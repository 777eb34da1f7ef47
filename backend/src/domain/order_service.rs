//! Cart order fulfillment service.
//!
//! Implements the order driving ports: checkout from a cart snapshot, payment
//! verification, shipment tracking, status moves and email opt-ins. Every
//! write after placement is a revision compare-and-swap, retried a bounded
//! number of times against a fresh copy. Exactly one verification can move an
//! order out of `pending`, so the cart is cleared and the confirmation email
//! sent once per order no matter how often the gateway callback is replayed.

use std::fmt::Display;
use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use tracing::{error, info, warn};

use crate::domain::notification::line_items;
use crate::domain::ports::{
    AddressBook, AddressBookError, BookCatalogue, CartStore, CartStoreError, CreateOrderRequest,
    GatewayOrderRequest, OrderCommand, OrderQuery, OrderRepository, OrderRepositoryError,
    PaymentGateway, PaymentGatewayError, PaymentSession, UpdateNotificationsRequest,
    UpdateStatusRequest, UpdateTrackingRequest, UserDirectory, VerifyPaymentRequest,
};
use crate::domain::{
    CURRENCY, ErrorCode, Error, LineItem, NewOrder, NotificationDispatcher, Order, OrderError,
    OrderId, OrderItem, OrderStatus, PaymentVerifier, TrackingLedger, UserId, UserProfile,
    order_total,
};

/// Attempts at a revision compare-and-swap before reporting a conflict.
const MAX_WRITE_ATTEMPTS: usize = 3;

/// Driven ports used by [`OrderFulfillment`].
pub struct OrderFulfillmentPorts<O, C, A, G> {
    pub orders: Arc<O>,
    pub carts: Arc<C>,
    pub addresses: Arc<A>,
    pub gateway: Arc<G>,
    /// Book titles for itemised emails.
    pub books: Arc<dyn BookCatalogue>,
    /// Recipient lookup for emails.
    pub users: Arc<dyn UserDirectory>,
}

/// Order service implementing [`OrderCommand`] and [`OrderQuery`].
#[derive(Clone)]
pub struct OrderFulfillment<O, C, A, G> {
    orders: Arc<O>,
    carts: Arc<C>,
    addresses: Arc<A>,
    gateway: Arc<G>,
    books: Arc<dyn BookCatalogue>,
    users: Arc<dyn UserDirectory>,
    verifier: PaymentVerifier,
    notifier: Arc<NotificationDispatcher>,
    clock: Arc<dyn Clock>,
}

impl<O, C, A, G> OrderFulfillment<O, C, A, G> {
    /// Create a new service.
    pub fn new(
        ports: OrderFulfillmentPorts<O, C, A, G>,
        verifier: PaymentVerifier,
        notifier: Arc<NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let OrderFulfillmentPorts {
            orders,
            carts,
            addresses,
            gateway,
            books,
            users,
        } = ports;
        Self {
            orders,
            carts,
            addresses,
            gateway,
            books,
            users,
            verifier,
            notifier,
            clock,
        }
    }
}

/// Log server-side failures with the operation and aggregate they hit.
pub(crate) fn log_failure(operation: &'static str, aggregate: &dyn Display, err: &Error) {
    if matches!(
        err.code(),
        ErrorCode::InternalError | ErrorCode::ServiceUnavailable | ErrorCode::BadGateway
    ) {
        error!(operation, aggregate = %aggregate, error = %err, "operation failed");
    }
}

impl<O, C, A, G> OrderFulfillment<O, C, A, G>
where
    O: OrderRepository,
    C: CartStore,
    A: AddressBook,
    G: PaymentGateway,
{
    fn map_order_error(error: OrderRepositoryError) -> Error {
        match error {
            OrderRepositoryError::Connection { message } => {
                Error::service_unavailable(format!("order repository unavailable: {message}"))
            }
            OrderRepositoryError::Query { message } => {
                Error::internal(format!("order repository error: {message}"))
            }
            OrderRepositoryError::RevisionMismatch { expected, actual } => {
                Error::conflict("order was modified concurrently").with_details(json!({
                    "expectedRevision": expected,
                    "actualRevision": actual,
                    "code": "revision_mismatch",
                }))
            }
        }
    }

    fn map_address_error(error: AddressBookError) -> Error {
        match error {
            AddressBookError::Connection { message } => {
                Error::service_unavailable(format!("address book unavailable: {message}"))
            }
            AddressBookError::Query { message } => {
                Error::internal(format!("address book error: {message}"))
            }
        }
    }

    fn map_cart_error(error: CartStoreError) -> Error {
        match error {
            CartStoreError::Connection { message } => {
                Error::service_unavailable(format!("cart store unavailable: {message}"))
            }
            CartStoreError::Query { message } => {
                Error::internal(format!("cart store error: {message}"))
            }
        }
    }

    fn map_gateway_error(error: PaymentGatewayError) -> Error {
        Error::bad_gateway(format!("payment gateway failure: {error}"))
    }

    fn map_rule_error(error: OrderError) -> Error {
        match error {
            OrderError::NoItems => Error::empty_cart("cart is empty"),
            OrderError::InvalidTransition { from, to } => {
                Error::invalid_transition(format!("order cannot move from {from} to {to}"))
                    .with_details(json!({
                        "from": from,
                        "to": to,
                        "allowed": from.successors(),
                        "code": "invalid_transition",
                    }))
            }
            OrderError::UnknownStatus(_)
            | OrderError::UnknownPaymentMethod(_)
            | OrderError::TotalOverflow => Error::invalid_request(error.to_string()),
            OrderError::AlreadyPaid => Error::conflict(error.to_string()),
        }
    }

    async fn owned(&self, order_id: &OrderId, buyer_id: &UserId) -> Result<Order, Error> {
        self.orders
            .find_by_id(order_id)
            .await
            .map_err(Self::map_order_error)?
            .filter(|order| order.is_owned_by(*buyer_id))
            .ok_or_else(|| Error::not_found("order not found"))
    }

    /// Read-modify-write with a revision check, retrying on lost races.
    async fn mutate<F>(&self, order_id: &OrderId, buyer_id: &UserId, apply: F) -> Result<Order, Error>
    where
        F: Fn(&mut Order) -> Result<(), Error> + Send + Sync,
    {
        let mut last_conflict = None;
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut order = self.owned(order_id, buyer_id).await?;
            apply(&mut order)?;
            order.touch(self.clock.utc());
            let expected = order.bump_revision();
            match self.orders.save(&order, expected).await {
                Ok(()) => return Ok(order),
                Err(err @ OrderRepositoryError::RevisionMismatch { .. }) => {
                    last_conflict = Some(err);
                }
                Err(err) => return Err(Self::map_order_error(err)),
            }
        }
        Err(last_conflict.map_or_else(
            || Error::conflict("order was modified concurrently"),
            Self::map_order_error,
        ))
    }

    async fn recipient(&self, order: &Order) -> Option<UserProfile> {
        match self.users.get_user(&order.buyer_id()).await {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                warn!(order_id = %order.id(), "buyer profile missing; email skipped");
                None
            }
            Err(err) => {
                warn!(order_id = %order.id(), error = %err, "buyer lookup failed; email skipped");
                None
            }
        }
    }

    async fn items(&self, order: &Order) -> Vec<LineItem> {
        let mut titles = Vec::with_capacity(order.items().len());
        for item in order.items() {
            if let Ok(Some(book)) = self.books.get_book(&item.book_id).await {
                titles.push((book.id, book.title));
            }
        }
        line_items(order, &titles)
    }

    async fn after_payment(&self, order: &Order) {
        if let Err(err) = self.carts.clear(&order.buyer_id()).await {
            warn!(order_id = %order.id(), error = %err, "failed to clear cart after payment");
        }
        let Some(recipient) = self.recipient(order).await else {
            return;
        };
        let items = self.items(order).await;
        if let Err(err) = self
            .notifier
            .send_order_confirmation(order, &recipient, &items)
            .await
        {
            warn!(order_id = %order.id(), error = %err, "order confirmation email failed");
        }
    }

    async fn confirm(&self, request: &VerifyPaymentRequest) -> Result<Order, Error> {
        let mut last_conflict = None;
        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut order = self
                .orders
                .find_by_gateway_order_id(&request.gateway_order_id)
                .await
                .map_err(Self::map_order_error)?
                .filter(|order| order.is_owned_by(request.caller))
                .ok_or_else(|| Error::not_found("order not found"))?;

            if order.is_paid() {
                if order.gateway_payment_id() != Some(request.gateway_payment_id.as_str()) {
                    warn!(
                        order_id = %order.id(),
                        "verified payment differs from the one already recorded"
                    );
                }
                return Ok(order);
            }
            if order.status() == OrderStatus::Cancelled {
                return Err(Error::invalid_transition("order was cancelled before payment"));
            }

            order
                .confirm_payment(request.gateway_payment_id.clone())
                .map_err(Self::map_rule_error)?;
            order.touch(self.clock.utc());
            let expected = order.bump_revision();
            match self.orders.save(&order, expected).await {
                Ok(()) => {
                    info!(order_id = %order.id(), "payment verified");
                    self.after_payment(&order).await;
                    return Ok(order);
                }
                Err(err @ OrderRepositoryError::RevisionMismatch { .. }) => {
                    last_conflict = Some(err);
                }
                Err(err) => return Err(Self::map_order_error(err)),
            }
        }
        Err(last_conflict.map_or_else(
            || Error::conflict("order was modified concurrently"),
            Self::map_order_error,
        ))
    }

    async fn place(&self, request: &CreateOrderRequest) -> Result<PaymentSession, Error> {
        let shipping_address = self
            .addresses
            .find_for_owner(&request.address_id, &request.buyer_id)
            .await
            .map_err(Self::map_address_error)?
            .ok_or_else(|| Error::not_found("shipping address not found"))?;

        let cart = self
            .carts
            .snapshot(&request.buyer_id)
            .await
            .map_err(Self::map_cart_error)?;
        if cart.is_empty() {
            return Err(Error::empty_cart("cart is empty"));
        }
        let items: Vec<OrderItem> = cart
            .into_iter()
            .map(|book| OrderItem {
                book_id: book.id,
                seller_id: book.seller_id,
                price_at_purchase: book.price,
            })
            .collect();

        let amount = order_total(&items).map_err(Self::map_rule_error)?;

        let now = self.clock.utc();
        let gateway_order = self
            .gateway
            .create_order(GatewayOrderRequest {
                amount,
                currency: CURRENCY.to_owned(),
                receipt: format!("order_{}", now.timestamp_millis()),
            })
            .await
            .map_err(Self::map_gateway_error)?;

        let order = Order::place(
            NewOrder {
                buyer_id: request.buyer_id,
                items,
                shipping_address,
                gateway_order_id: gateway_order.id.clone(),
                payment_method: request.payment_method,
            },
            now,
        )
        .map_err(Self::map_rule_error)?;

        // An unpaid gateway order expires on the gateway side, so a failed
        // insert leaves nothing to compensate.
        self.orders
            .insert(&order)
            .await
            .map_err(Self::map_order_error)?;
        info!(
            order_id = %order.id(),
            gateway_order_id = %gateway_order.id,
            total = %order.total_amount(),
            "order placed"
        );

        Ok(PaymentSession {
            order_id: gateway_order.id,
            amount: gateway_order.amount,
            currency: gateway_order.currency,
        })
    }
}

#[async_trait]
impl<O, C, A, G> OrderCommand for OrderFulfillment<O, C, A, G>
where
    O: OrderRepository,
    C: CartStore,
    A: AddressBook,
    G: PaymentGateway,
{
    async fn create_order(&self, request: CreateOrderRequest) -> Result<PaymentSession, Error> {
        self.place(&request)
            .await
            .inspect_err(|err| log_failure("create_order", &request.buyer_id, err))
    }

    async fn verify_payment(&self, request: VerifyPaymentRequest) -> Result<Order, Error> {
        if !self.verifier.verify(
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.signature,
        ) {
            warn!(gateway_order_id = %request.gateway_order_id, "payment signature mismatch");
            return Err(Error::payment_signature("invalid payment signature"));
        }
        self.confirm(&request)
            .await
            .inspect_err(|err| log_failure("verify_payment", &request.gateway_order_id, err))
    }

    async fn update_tracking(&self, request: UpdateTrackingRequest) -> Result<Order, Error> {
        let now = self.clock.utc();
        let order = self
            .mutate(&request.order_id, &request.buyer_id, |order| {
                TrackingLedger::append(order, request.update.clone(), now);
                Ok(())
            })
            .await
            .inspect_err(|err| log_failure("update_tracking", &request.order_id, err))?;

        if let Some(recipient) = self.recipient(&order).await {
            if let Err(err) = self
                .notifier
                .send_shipping_update(&order, &recipient, &request.update)
                .await
            {
                warn!(order_id = %order.id(), error = %err, "shipping update email failed");
            }
        }
        Ok(order)
    }

    async fn update_status(&self, request: UpdateStatusRequest) -> Result<Order, Error> {
        let order = self
            .mutate(&request.order_id, &request.buyer_id, |order| {
                order
                    .transition_to(request.status)
                    .map_err(Self::map_rule_error)
            })
            .await
            .inspect_err(|err| log_failure("update_status", &request.order_id, err))?;
        info!(order_id = %order.id(), status = %order.status(), "order status changed");

        if order.status() == OrderStatus::Delivered {
            if let Some(recipient) = self.recipient(&order).await {
                let items = self.items(&order).await;
                if let Err(err) = self
                    .notifier
                    .send_delivery_confirmation(&order, &recipient, &items)
                    .await
                {
                    warn!(order_id = %order.id(), error = %err, "delivery email failed");
                }
            }
        }
        Ok(order)
    }

    async fn update_notification_preferences(
        &self,
        request: UpdateNotificationsRequest,
    ) -> Result<Order, Error> {
        self.mutate(&request.order_id, &request.buyer_id, |order| {
            order.set_notification_preferences(request.preferences);
            Ok(())
        })
        .await
        .inspect_err(|err| log_failure("update_notification_preferences", &request.order_id, err))
    }
}

#[async_trait]
impl<O, C, A, G> OrderQuery for OrderFulfillment<O, C, A, G>
where
    O: OrderRepository,
    C: CartStore,
    A: AddressBook,
    G: PaymentGateway,
{
    async fn list_for_buyer(&self, buyer_id: UserId) -> Result<Vec<Order>, Error> {
        self.orders
            .list_for_buyer(&buyer_id)
            .await
            .map_err(Self::map_order_error)
            .inspect_err(|err| log_failure("list_orders", &buyer_id, err))
    }

    async fn get_order(&self, order_id: OrderId, buyer_id: UserId) -> Result<Order, Error> {
        self.owned(&order_id, &buyer_id)
            .await
            .inspect_err(|err| log_failure("get_order", &order_id, err))
    }
}

#[cfg(test)]
#[path = "order_service_tests.rs"]
mod tests;

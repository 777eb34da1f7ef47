//! Legacy single-book checkout service.
//!
//! A one-book purchase skips the cart: the book's current price is charged,
//! a pending [`Transaction`] records the gateway order, and a signed callback
//! settles it. Settlement is a compare-and-swap on the pending status, so a
//! replayed callback returns the stored transaction unchanged.
//!
//! Once paid, either party can book a courier through the
//! [`ShippingCarrier`]. The booking is written only while no tracking id is
//! stored, and later tracking lookups move the shipment status forward.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::{info, warn};

use crate::domain::order_service::log_failure;
use crate::domain::ports::{
    AbandonCheckoutRequest, BookCatalogue, BookCatalogueError, CheckoutCommand, CheckoutRequest,
    CheckoutSession, CourierOption, GatewayOrderRequest, PaymentGateway, ServiceabilityQuery,
    ShipRequest, ShipmentProgress, ShipmentRequest, ShippingCarrier, ShippingCarrierError,
    TrackShipmentRequest, TransactionRepository, TransactionRepositoryError, UserDirectory,
    UserDirectoryError, VerifyPaymentRequest,
};
use crate::domain::{
    CURRENCY, Error, PaymentStatus, PaymentVerifier, ShippingDetails, Transaction,
    TransactionError, TransactionId, UserId,
};

/// Driven ports used by [`CheckoutService`].
pub struct CheckoutPorts<T, B, G, S> {
    pub transactions: Arc<T>,
    pub books: Arc<B>,
    pub gateway: Arc<G>,
    pub carrier: Arc<S>,
    /// Buyer name and email for courier bookings.
    pub users: Arc<dyn UserDirectory>,
}

/// Checkout service implementing [`CheckoutCommand`].
#[derive(Clone)]
pub struct CheckoutService<T, B, G, S> {
    transactions: Arc<T>,
    books: Arc<B>,
    gateway: Arc<G>,
    carrier: Arc<S>,
    users: Arc<dyn UserDirectory>,
    verifier: PaymentVerifier,
    clock: Arc<dyn Clock>,
}

impl<T, B, G, S> CheckoutService<T, B, G, S> {
    /// Create a new service.
    pub fn new(
        ports: CheckoutPorts<T, B, G, S>,
        verifier: PaymentVerifier,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let CheckoutPorts {
            transactions,
            books,
            gateway,
            carrier,
            users,
        } = ports;
        Self {
            transactions,
            books,
            gateway,
            carrier,
            users,
            verifier,
            clock,
        }
    }
}

/// Cheapest first; equal prices put the quickest courier first and unknown
/// delivery estimates last.
fn rank_couriers(options: &mut [CourierOption]) {
    options.sort_by(|left, right| {
        left.rate.cmp(&right.rate).then_with(|| {
            let days = |option: &CourierOption| option.estimated_delivery_days.unwrap_or(u32::MAX);
            days(left).cmp(&days(right))
        })
    });
}

impl<T, B, G, S> CheckoutService<T, B, G, S>
where
    T: TransactionRepository,
    B: BookCatalogue,
    G: PaymentGateway,
    S: ShippingCarrier,
{
    fn map_transaction_error(error: TransactionRepositoryError) -> Error {
        match error {
            TransactionRepositoryError::Connection { message } => Error::service_unavailable(
                format!("transaction repository unavailable: {message}"),
            ),
            TransactionRepositoryError::Query { message } => {
                Error::internal(format!("transaction repository error: {message}"))
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

    fn map_carrier_error(error: ShippingCarrierError) -> Error {
        Error::bad_gateway(format!("shipping carrier failure: {error}"))
    }

    fn map_rule_error(error: TransactionError) -> Error {
        match error {
            TransactionError::AlreadySettled(_)
            | TransactionError::NotPaid(_)
            | TransactionError::AlreadyShipped(_)
            | TransactionError::NotShipped => Error::invalid_transition(error.to_string()),
            TransactionError::UnknownStatus(_) | TransactionError::UnknownShipmentStatus(_) => {
                Error::invalid_request(error.to_string())
            }
        }
    }

    async fn owned(&self, gateway_order_id: &str, buyer: UserId) -> Result<Transaction, Error> {
        self.transactions
            .find_by_gateway_order_id(gateway_order_id)
            .await
            .map_err(Self::map_transaction_error)?
            .filter(|transaction| transaction.buyer_id() == buyer)
            .ok_or_else(|| Error::not_found("transaction not found"))
    }

    /// Load a transaction visible to `caller`, who must be buyer or seller.
    async fn involving(&self, id: &TransactionId, caller: UserId) -> Result<Transaction, Error> {
        self.transactions
            .find_by_id(id)
            .await
            .map_err(Self::map_transaction_error)?
            .filter(|transaction| transaction.involves(caller))
            .ok_or_else(|| Error::not_found("transaction not found"))
    }

    /// Apply `settle` and write it if the stored row is still pending. A lost
    /// race returns whatever the winner stored.
    async fn settle<F>(
        &self,
        gateway_order_id: &str,
        buyer: UserId,
        settle: F,
    ) -> Result<Transaction, Error>
    where
        F: FnOnce(&mut Transaction) -> Result<(), TransactionError> + Send,
    {
        let mut transaction = self.owned(gateway_order_id, buyer).await?;
        settle(&mut transaction).map_err(Self::map_rule_error)?;
        let written = self
            .transactions
            .settle(&transaction)
            .await
            .map_err(Self::map_transaction_error)?;
        if written {
            info!(
                transaction_id = %transaction.id(),
                status = %transaction.payment_status(),
                "transaction settled"
            );
            return Ok(transaction);
        }
        self.owned(gateway_order_id, buyer).await
    }

    async fn open(&self, request: &CheckoutRequest) -> Result<CheckoutSession, Error> {
        let book = self
            .books
            .get_book(&request.book_id)
            .await
            .map_err(Self::map_book_error)?
            .ok_or_else(|| Error::not_found("book not found"))?;
        if book.seller_id == request.buyer_id {
            return Err(Error::self_trade("you cannot buy your own book"));
        }

        let gateway_order = self
            .gateway
            .create_order(GatewayOrderRequest {
                amount: book.price,
                currency: CURRENCY.to_owned(),
                receipt: format!("book_{}", book.id),
            })
            .await
            .map_err(|err| Error::bad_gateway(format!("payment gateway failure: {err}")))?;

        let transaction = Transaction::open(
            request.buyer_id,
            book.seller_id,
            book.id,
            book.price,
            gateway_order.id.clone(),
            ShippingDetails {
                address: request.address.clone(),
                ..ShippingDetails::default()
            },
            self.clock.utc(),
        );
        self.transactions
            .insert(&transaction)
            .await
            .map_err(Self::map_transaction_error)?;
        info!(transaction_id = %transaction.id(), book_id = %book.id, "checkout opened");

        Ok(CheckoutSession {
            key: self.gateway.public_key_id(),
            amount: gateway_order.amount,
            currency: gateway_order.currency,
            order_id: gateway_order.id,
        })
    }

    async fn book_courier(&self, request: ShipRequest) -> Result<Transaction, Error> {
        let mut transaction = self
            .involving(&request.transaction_id, request.caller)
            .await?;
        if transaction.shipping_details().tracking_id.is_some() {
            return Ok(transaction);
        }
        if transaction.payment_status() != PaymentStatus::Completed {
            return Err(Self::map_rule_error(TransactionError::NotPaid(
                transaction.payment_status(),
            )));
        }

        let buyer = self
            .users
            .get_user(&transaction.buyer_id())
            .await
            .map_err(Self::map_user_error)?
            .ok_or_else(|| Error::not_found("buyer not found"))?;
        let item_name = self
            .books
            .get_book(&transaction.book_id())
            .await
            .map_err(Self::map_book_error)?
            .map_or_else(
                || format!("Book {}", transaction.book_id()),
                |book| book.title,
            );

        let booked = self
            .carrier
            .create_shipment(ShipmentRequest {
                reference: transaction.id(),
                ordered_at: transaction.created_at(),
                customer_name: buyer.name,
                customer_email: buyer.email,
                destination: request.destination,
                item_name,
                item_sku: format!("BOOK-{}", transaction.book_id()),
                item_price: transaction.amount_paid(),
            })
            .await
            .map_err(Self::map_carrier_error)?;

        transaction
            .record_shipment(booked.tracking_id, booked.carrier)
            .map_err(Self::map_rule_error)?;
        let written = self
            .transactions
            .record_shipment(&transaction)
            .await
            .map_err(Self::map_transaction_error)?;
        if !written {
            warn!(
                transaction_id = %transaction.id(),
                "shipment booked concurrently; keeping the stored one"
            );
            return self.involving(&request.transaction_id, request.caller).await;
        }
        info!(
            transaction_id = %transaction.id(),
            tracking_id = ?transaction.shipping_details().tracking_id,
            "shipment booked"
        );
        Ok(transaction)
    }

    async fn follow_shipment(
        &self,
        request: TrackShipmentRequest,
    ) -> Result<ShipmentProgress, Error> {
        let mut transaction = self
            .involving(&request.transaction_id, request.caller)
            .await?;
        let tracking_id = transaction
            .shipping_details()
            .tracking_id
            .clone()
            .ok_or_else(|| Self::map_rule_error(TransactionError::NotShipped))?;

        let tracking = self
            .carrier
            .track(&tracking_id)
            .await
            .map_err(Self::map_carrier_error)?;
        if let Some(status) = tracking.status {
            let advanced = transaction
                .advance_shipment(status)
                .map_err(Self::map_rule_error)?;
            if advanced {
                self.transactions
                    .update_shipment_status(&transaction)
                    .await
                    .map_err(Self::map_transaction_error)?;
                info!(
                    transaction_id = %transaction.id(),
                    status = status.as_str(),
                    "shipment status advanced"
                );
            }
        }
        Ok(ShipmentProgress {
            transaction,
            tracking,
        })
    }
}

#[async_trait]
impl<T, B, G, S> CheckoutCommand for CheckoutService<T, B, G, S>
where
    T: TransactionRepository,
    B: BookCatalogue,
    G: PaymentGateway,
    S: ShippingCarrier,
{
    async fn checkout(&self, request: CheckoutRequest) -> Result<CheckoutSession, Error> {
        self.open(&request)
            .await
            .inspect_err(|err| log_failure("checkout", &request.book_id, err))
    }

    async fn verify(&self, request: VerifyPaymentRequest) -> Result<Transaction, Error> {
        if !self.verifier.verify(
            &request.gateway_order_id,
            &request.gateway_payment_id,
            &request.signature,
        ) {
            warn!(gateway_order_id = %request.gateway_order_id, "payment signature mismatch");
            return Err(Error::payment_signature("invalid payment signature"));
        }

        let current = self.owned(&request.gateway_order_id, request.caller).await?;
        if current.payment_status() == PaymentStatus::Completed {
            return Ok(current);
        }
        let payment_id = request.gateway_payment_id.clone();
        self.settle(&request.gateway_order_id, request.caller, move |transaction| {
            transaction.complete(payment_id)
        })
        .await
        .inspect_err(|err| log_failure("verify_checkout", &request.gateway_order_id, err))
    }

    async fn abandon(&self, request: AbandonCheckoutRequest) -> Result<Transaction, Error> {
        self.settle(&request.gateway_order_id, request.buyer_id, Transaction::fail)
            .await
            .inspect_err(|err| log_failure("abandon_checkout", &request.gateway_order_id, err))
    }

    async fn shipping_options(
        &self,
        query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, Error> {
        let route = format!("{}->{}", query.pickup_postcode, query.delivery_postcode);
        let mut options = self
            .carrier
            .serviceability(query)
            .await
            .map_err(Self::map_carrier_error)
            .inspect_err(|err| log_failure("shipping_options", &route, err))?;
        rank_couriers(&mut options);
        Ok(options)
    }

    async fn ship(&self, request: ShipRequest) -> Result<Transaction, Error> {
        let transaction_id = request.transaction_id;
        self.book_courier(request)
            .await
            .inspect_err(|err| log_failure("ship", &transaction_id, err))
    }

    async fn track_shipment(
        &self,
        request: TrackShipmentRequest,
    ) -> Result<ShipmentProgress, Error> {
        self.follow_shipment(request)
            .await
            .inspect_err(|err| log_failure("track_shipment", &request.transaction_id, err))
    }
}

#[cfg(test)]
#[path = "checkout_service_tests.rs"]
mod tests;

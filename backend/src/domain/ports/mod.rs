//! Domain ports defining the edges of the hexagon.
//!
//! Driven ports describe what the fulfillment core needs from storage, the
//! catalogue and identity collaborators, the payment processor, the courier
//! aggregator and the notification channels. Driving ports are what inbound
//! adapters call. Each driven port carries its own error enum so adapters map
//! failures into predictable variants.

mod macros;
pub(crate) use macros::define_port_error;

mod address_book;
mod book_catalogue;
mod cart_store;
mod chat_purger;
mod checkout_command;
mod deal_command;
mod deal_query;
mod deal_repository;
mod mail_transport;
mod order_command;
mod order_query;
mod order_repository;
mod payment_gateway;
mod push_channel;
mod shipping_carrier;
mod transaction_repository;
mod user_directory;

#[cfg(test)]
pub use address_book::MockAddressBook;
pub use address_book::{AddressBook, AddressBookError, FixtureAddressBook};
#[cfg(test)]
pub use book_catalogue::MockBookCatalogue;
pub use book_catalogue::{BookCatalogue, BookCatalogueError, FixtureBookCatalogue};
#[cfg(test)]
pub use cart_store::MockCartStore;
pub use cart_store::{CartStore, CartStoreError, FixtureCartStore};
#[cfg(test)]
pub use chat_purger::MockChatPurger;
pub use chat_purger::{ChatPurger, ChatPurgerError, FixtureChatPurger};
#[cfg(test)]
pub use checkout_command::MockCheckoutCommand;
pub use checkout_command::{
    AbandonCheckoutRequest, CheckoutCommand, CheckoutRequest, CheckoutSession,
    FixtureCheckoutCommand, ShipRequest, ShipmentProgress, TrackShipmentRequest,
};
#[cfg(test)]
pub use deal_command::MockDealCommand;
pub use deal_command::{
    CreateDealRequest, CreateDealResponse, DealCommand, FixtureDealCommand, RateDealRequest,
};
#[cfg(test)]
pub use deal_query::MockDealQuery;
pub use deal_query::{DealQuery, FixtureDealQuery};
#[cfg(test)]
pub use deal_repository::MockDealRepository;
pub use deal_repository::{
    DealInsertOutcome, DealRepository, DealRepositoryError, FixtureDealRepository,
};
#[cfg(test)]
pub use mail_transport::MockMailTransport;
pub use mail_transport::{
    EmailMessage, FixtureMailTransport, MailTransport, NotificationDeliveryError,
};
#[cfg(test)]
pub use order_command::MockOrderCommand;
pub use order_command::{
    CreateOrderRequest, FixtureOrderCommand, OrderCommand, PaymentSession,
    UpdateNotificationsRequest, UpdateStatusRequest, UpdateTrackingRequest, VerifyPaymentRequest,
};
#[cfg(test)]
pub use order_query::MockOrderQuery;
pub use order_query::{FixtureOrderQuery, OrderQuery};
#[cfg(test)]
pub use order_repository::MockOrderRepository;
pub use order_repository::{FixtureOrderRepository, OrderRepository, OrderRepositoryError};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_gateway::{
    FixturePaymentGateway, GatewayOrder, GatewayOrderRequest, PaymentGateway, PaymentGatewayError,
};
#[cfg(test)]
pub use push_channel::MockPushChannel;
pub use push_channel::{FixturePushChannel, PushChannel, PushMessage};
#[cfg(test)]
pub use shipping_carrier::MockShippingCarrier;
pub use shipping_carrier::{
    BookedShipment, CourierOption, FixtureShippingCarrier, ServiceabilityQuery, ShipmentActivity,
    ShipmentDestination, ShipmentRequest, ShipmentTrack, ShippingCarrier, ShippingCarrierError,
};
#[cfg(test)]
pub use transaction_repository::MockTransactionRepository;
pub use transaction_repository::{
    FixtureTransactionRepository, TransactionRepository, TransactionRepositoryError,
};
#[cfg(test)]
pub use user_directory::MockUserDirectory;
pub use user_directory::{FixtureUserDirectory, UserDirectory, UserDirectoryError};

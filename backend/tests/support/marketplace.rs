//! In-memory marketplace world for HTTP-level integration tests.
//!
//! Real domain services run against a single shared store that implements
//! every driven port, so scenarios observe persisted state, sent emails,
//! pushes and gateway calls without a database or network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use actix_http::Request;
use actix_web::body::BoxBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::{App, test, web};
use async_trait::async_trait;
use jsonwebtoken::{EncodingKey, Header, encode};
use mockable::{Clock, DefaultClock};
use serde_json::{Value, json};
use zeroize::Zeroizing;

use marketplace::Trace;
use marketplace::domain::checkout_service::CheckoutPorts;
use marketplace::domain::order_service::OrderFulfillmentPorts;
use marketplace::domain::ports::{
    AddressBook, AddressBookError, BookCatalogue, BookCatalogueError, BookedShipment,
    CartStore, CartStoreError, ChatPurger, ChatPurgerError, CourierOption, DealInsertOutcome,
    DealRepository, DealRepositoryError, EmailMessage, GatewayOrder, GatewayOrderRequest,
    MailTransport, NotificationDeliveryError, OrderRepository, OrderRepositoryError,
    PaymentGateway, PaymentGatewayError, PushChannel, PushMessage, ServiceabilityQuery,
    ShipmentRequest, ShipmentTrack, ShippingCarrier, ShippingCarrierError,
    TransactionRepository, TransactionRepositoryError, UserDirectory, UserDirectoryError,
};
use marketplace::domain::{
    AddressId, BookId, BookListing, CheckoutService, Deal, DealId, DealNegotiator, DealStatus,
    Money, NotificationDispatcher, Order, OrderFulfillment, OrderId, PaymentSecret,
    PaymentStatus, PaymentVerifier, ShipmentStatus, ShippingAddress, Transaction,
    TransactionId, UserId, UserProfile,
};
use marketplace::inbound::http::auth::TokenVerifier;
use marketplace::inbound::http::configure;
use marketplace::inbound::http::state::HttpState;

const JWT_SECRET: &[u8] = b"integration-secret-with-32-bytes";
const GATEWAY_SECRET: &str = "rzp_integration_secret";
const TOKEN_EXPIRY: u64 = 4_102_444_800;

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, UserProfile>,
    books: HashMap<BookId, BookListing>,
    carts: HashMap<UserId, Vec<BookId>>,
    addresses: HashMap<AddressId, (UserId, ShippingAddress)>,
    deals: Vec<Deal>,
    purged_threads: Vec<DealId>,
    orders: HashMap<OrderId, Order>,
    transactions: Vec<Transaction>,
}

/// Shared store implementing every repository and lookup port.
#[derive(Default)]
pub struct Store {
    tables: Mutex<Tables>,
}

impl Store {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store lock")
    }

    pub fn deals(&self) -> Vec<Deal> {
        self.tables().deals.clone()
    }

    pub fn purged_threads(&self) -> Vec<DealId> {
        self.tables().purged_threads.clone()
    }

    pub fn cart(&self, user: UserId) -> Vec<BookId> {
        self.tables().carts.get(&user).cloned().unwrap_or_default()
    }

    pub fn order_by_gateway_id(&self, gateway_order_id: &str) -> Option<Order> {
        self.tables()
            .orders
            .values()
            .find(|order| order.gateway_order_id() == gateway_order_id)
            .cloned()
    }

    pub fn transaction_by_gateway_id(&self, gateway_order_id: &str) -> Option<Transaction> {
        self.tables()
            .transactions
            .iter()
            .find(|transaction| transaction.gateway_order_id() == gateway_order_id)
            .cloned()
    }

    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.tables()
            .transactions
            .iter()
            .find(|transaction| transaction.id() == id)
            .cloned()
    }

    pub fn remove_book(&self, book: BookId) {
        self.tables().books.remove(&book);
    }
}

#[async_trait]
impl BookCatalogue for Store {
    async fn get_book(&self, id: &BookId) -> Result<Option<BookListing>, BookCatalogueError> {
        Ok(self.tables().books.get(id).cloned())
    }
}

#[async_trait]
impl UserDirectory for Store {
    async fn get_user(&self, id: &UserId) -> Result<Option<UserProfile>, UserDirectoryError> {
        Ok(self.tables().users.get(id).cloned())
    }
}

#[async_trait]
impl CartStore for Store {
    async fn snapshot(&self, user_id: &UserId) -> Result<Vec<BookListing>, CartStoreError> {
        let tables = self.tables();
        Ok(tables
            .carts
            .get(user_id)
            .into_iter()
            .flatten()
            .filter_map(|book| tables.books.get(book).cloned())
            .collect())
    }

    async fn clear(&self, user_id: &UserId) -> Result<(), CartStoreError> {
        self.tables().carts.remove(user_id);
        Ok(())
    }
}

#[async_trait]
impl AddressBook for Store {
    async fn find_for_owner(
        &self,
        id: &AddressId,
        owner: &UserId,
    ) -> Result<Option<ShippingAddress>, AddressBookError> {
        Ok(self
            .tables()
            .addresses
            .get(id)
            .filter(|(stored_owner, _)| stored_owner == owner)
            .map(|(_, address)| address.clone()))
    }
}

#[async_trait]
impl ChatPurger for Store {
    async fn purge_deal_thread(&self, deal_id: &DealId) -> Result<u64, ChatPurgerError> {
        self.tables().purged_threads.push(*deal_id);
        Ok(1)
    }
}

#[async_trait]
impl DealRepository for Store {
    async fn find_by_id(&self, id: &DealId) -> Result<Option<Deal>, DealRepositoryError> {
        Ok(self.tables().deals.iter().find(|deal| deal.id() == *id).cloned())
    }

    async fn find_by_book_and_buyer(
        &self,
        book_id: &BookId,
        buyer_id: &UserId,
    ) -> Result<Option<Deal>, DealRepositoryError> {
        Ok(self
            .tables()
            .deals
            .iter()
            .find(|deal| deal.book_id() == *book_id && deal.buyer_id() == *buyer_id)
            .cloned())
    }

    async fn insert_if_absent(&self, deal: &Deal) -> Result<DealInsertOutcome, DealRepositoryError> {
        let mut tables = self.tables();
        if let Some(existing) = tables
            .deals
            .iter()
            .find(|stored| stored.book_id() == deal.book_id() && stored.buyer_id() == deal.buyer_id())
        {
            return Ok(DealInsertOutcome::Existing(existing.clone()));
        }
        tables.deals.push(deal.clone());
        Ok(DealInsertOutcome::Created(deal.clone()))
    }

    async fn save(&self, deal: &Deal) -> Result<(), DealRepositoryError> {
        let mut tables = self.tables();
        let slot = tables
            .deals
            .iter_mut()
            .find(|stored| stored.id() == deal.id())
            .ok_or_else(|| DealRepositoryError::query("deal not found for update"))?;
        *slot = deal.clone();
        Ok(())
    }

    async fn list_for_seller(&self, seller_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError> {
        Ok(self
            .tables()
            .deals
            .iter()
            .filter(|deal| deal.seller_id() == *seller_id)
            .cloned()
            .collect())
    }

    async fn list_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Deal>, DealRepositoryError> {
        Ok(self
            .tables()
            .deals
            .iter()
            .filter(|deal| deal.buyer_id() == *buyer_id)
            .cloned()
            .collect())
    }

    async fn count_for_seller(
        &self,
        seller_id: &UserId,
        status: DealStatus,
    ) -> Result<u64, DealRepositoryError> {
        let count = self
            .tables()
            .deals
            .iter()
            .filter(|deal| deal.seller_id() == *seller_id && deal.status() == status)
            .count();
        Ok(u64::try_from(count).unwrap_or(u64::MAX))
    }
}

#[async_trait]
impl OrderRepository for Store {
    async fn insert(&self, order: &Order) -> Result<(), OrderRepositoryError> {
        self.tables().orders.insert(order.id(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(self.tables().orders.get(id).cloned())
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Order>, OrderRepositoryError> {
        Ok(self.order_by_gateway_id(gateway_order_id))
    }

    async fn list_for_buyer(&self, buyer_id: &UserId) -> Result<Vec<Order>, OrderRepositoryError> {
        let mut orders: Vec<Order> = self
            .tables()
            .orders
            .values()
            .filter(|order| order.buyer_id() == *buyer_id)
            .cloned()
            .collect();
        orders.sort_by_key(|order| std::cmp::Reverse(order.created_at()));
        Ok(orders)
    }

    async fn save(&self, order: &Order, expected_revision: u32) -> Result<(), OrderRepositoryError> {
        let mut tables = self.tables();
        let slot = tables
            .orders
            .get_mut(&order.id())
            .ok_or_else(|| OrderRepositoryError::query("order not found for update"))?;
        if slot.revision() != expected_revision {
            return Err(OrderRepositoryError::revision_mismatch(
                expected_revision,
                slot.revision(),
            ));
        }
        *slot = order.clone();
        Ok(())
    }
}

#[async_trait]
impl TransactionRepository for Store {
    async fn insert(&self, transaction: &Transaction) -> Result<(), TransactionRepositoryError> {
        self.tables().transactions.push(transaction.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        id: &TransactionId,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        Ok(self.transaction(*id))
    }

    async fn find_by_gateway_order_id(
        &self,
        gateway_order_id: &str,
    ) -> Result<Option<Transaction>, TransactionRepositoryError> {
        Ok(self.transaction_by_gateway_id(gateway_order_id))
    }

    async fn settle(&self, transaction: &Transaction) -> Result<bool, TransactionRepositoryError> {
        let mut tables = self.tables();
        let Some(slot) = tables
            .transactions
            .iter_mut()
            .find(|stored| stored.id() == transaction.id())
        else {
            return Ok(false);
        };
        if slot.payment_status() != PaymentStatus::Pending {
            return Ok(false);
        }
        *slot = transaction.clone();
        Ok(true)
    }

    async fn record_shipment(
        &self,
        transaction: &Transaction,
    ) -> Result<bool, TransactionRepositoryError> {
        let mut tables = self.tables();
        let Some(slot) = tables
            .transactions
            .iter_mut()
            .find(|stored| stored.id() == transaction.id())
        else {
            return Ok(false);
        };
        if slot.shipping_details().tracking_id.is_some() {
            return Ok(false);
        }
        *slot = transaction.clone();
        Ok(true)
    }

    async fn update_shipment_status(
        &self,
        transaction: &Transaction,
    ) -> Result<(), TransactionRepositoryError> {
        let mut tables = self.tables();
        let slot = tables
            .transactions
            .iter_mut()
            .find(|stored| stored.id() == transaction.id())
            .ok_or_else(|| TransactionRepositoryError::query("transaction not found for update"))?;
        *slot = transaction.clone();
        Ok(())
    }
}

/// Mail transport that keeps every message.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    pub fn subjects(&self) -> Vec<String> {
        self.sent
            .lock()
            .expect("mail lock")
            .iter()
            .map(|message| message.subject.clone())
            .collect()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationDeliveryError> {
        self.sent.lock().expect("mail lock").push(message);
        Ok(())
    }
}

/// Push channel that treats every user as online and keeps every frame.
#[derive(Default)]
pub struct RecordingPush {
    pushed: Mutex<Vec<(UserId, PushMessage)>>,
}

impl RecordingPush {
    pub fn events_for(&self, user: UserId) -> Vec<PushMessage> {
        self.pushed
            .lock()
            .expect("push lock")
            .iter()
            .filter(|(target, _)| *target == user)
            .map(|(_, message)| message.clone())
            .collect()
    }
}

impl PushChannel for RecordingPush {
    fn push(&self, user_id: &UserId, message: PushMessage) -> bool {
        self.pushed.lock().expect("push lock").push((*user_id, message));
        true
    }
}

/// Gateway issuing sequential order ids and remembering requested amounts.
#[derive(Default)]
pub struct StubGateway {
    next: AtomicUsize,
    amounts: Mutex<Vec<Money>>,
}

impl StubGateway {
    pub fn amounts(&self) -> Vec<Money> {
        self.amounts.lock().expect("gateway lock").clone()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn create_order(
        &self,
        request: GatewayOrderRequest,
    ) -> Result<GatewayOrder, PaymentGatewayError> {
        let sequence = self.next.fetch_add(1, Ordering::SeqCst);
        self.amounts.lock().expect("gateway lock").push(request.amount);
        Ok(GatewayOrder {
            id: format!("order_it_{sequence}"),
            amount: request.amount,
            currency: request.currency,
        })
    }

    fn public_key_id(&self) -> String {
        "rzp_test_integration".to_owned()
    }
}

/// Courier that books sequential shipments and reports them in transit.
#[derive(Default)]
pub struct StubCarrier {
    bookings: Mutex<Vec<ShipmentRequest>>,
}

impl StubCarrier {
    pub fn bookings(&self) -> Vec<ShipmentRequest> {
        self.bookings.lock().expect("carrier lock").clone()
    }
}

#[async_trait]
impl ShippingCarrier for StubCarrier {
    async fn serviceability(
        &self,
        _query: ServiceabilityQuery,
    ) -> Result<Vec<CourierOption>, ShippingCarrierError> {
        Ok(vec![
            CourierOption {
                courier_name: "Bluedart".to_owned(),
                rate: Money::from_major(120),
                estimated_delivery_days: Some(2),
            },
            CourierOption {
                courier_name: "Delhivery".to_owned(),
                rate: Money::from_major(85),
                estimated_delivery_days: Some(4),
            },
        ])
    }

    async fn create_shipment(
        &self,
        request: ShipmentRequest,
    ) -> Result<BookedShipment, ShippingCarrierError> {
        let mut bookings = self.bookings.lock().expect("carrier lock");
        bookings.push(request);
        Ok(BookedShipment {
            tracking_id: format!("SR-{}", bookings.len()),
            carrier: Some("Delhivery".to_owned()),
        })
    }

    async fn track(&self, tracking_id: &str) -> Result<ShipmentTrack, ShippingCarrierError> {
        Ok(ShipmentTrack {
            tracking_id: tracking_id.to_owned(),
            carrier_status: Some("In Transit".to_owned()),
            status: Some(ShipmentStatus::Shipped),
            activities: Vec::new(),
        })
    }
}

/// In-process service exposing the `/api/v1` surface.
pub trait TestApp:
    Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>
{
}

impl<S> TestApp for S where
    S: Service<Request, Response = ServiceResponse<BoxBody>, Error = actix_web::Error>
{
}

/// Real services wired over the in-memory doubles.
pub struct Marketplace {
    pub store: Arc<Store>,
    pub mailer: Arc<RecordingMailer>,
    pub push: Arc<RecordingPush>,
    pub gateway: Arc<StubGateway>,
    pub carrier: Arc<StubCarrier>,
    verifier: PaymentVerifier,
    state: HttpState,
}

impl Default for Marketplace {
    fn default() -> Self {
        Self::new()
    }
}

impl Marketplace {
    pub fn new() -> Self {
        let store = Arc::new(Store::default());
        let mailer = Arc::new(RecordingMailer::default());
        let push = Arc::new(RecordingPush::default());
        let gateway = Arc::new(StubGateway::default());
        let carrier = Arc::new(StubCarrier::default());
        let verifier = PaymentVerifier::new(PaymentSecret::new(GATEWAY_SECRET));
        let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
        let notifier = Arc::new(NotificationDispatcher::new(mailer.clone(), push.clone()));

        let deals = Arc::new(DealNegotiator::new(
            store.clone(),
            store.clone(),
            store.clone(),
            store.clone(),
            notifier.clone(),
            clock.clone(),
        ));
        let orders = Arc::new(OrderFulfillment::new(
            OrderFulfillmentPorts {
                orders: store.clone(),
                carts: store.clone(),
                addresses: store.clone(),
                gateway: gateway.clone(),
                books: store.clone(),
                users: store.clone(),
            },
            verifier.clone(),
            notifier,
            clock.clone(),
        ));
        let checkout = Arc::new(CheckoutService::new(
            CheckoutPorts {
                transactions: store.clone(),
                books: store.clone(),
                gateway: gateway.clone(),
                carrier: carrier.clone(),
                users: store.clone(),
            },
            verifier.clone(),
            clock,
        ));

        let state = HttpState::fixtures()
            .with_deals(deals.clone())
            .with_deals_query(deals)
            .with_orders(orders.clone())
            .with_orders_query(orders)
            .with_checkout(checkout);

        Self {
            store,
            mailer,
            push,
            gateway,
            carrier,
            verifier,
            state,
        }
    }

    /// Start the HTTP surface over this world.
    pub async fn service(&self) -> impl TestApp {
        test::init_service(
            App::new()
                .app_data(web::Data::new(self.state.clone()))
                .app_data(web::Data::new(TokenVerifier::new(&Zeroizing::new(
                    JWT_SECRET.to_vec(),
                ))))
                .wrap(Trace)
                .service(web::scope("/api/v1").configure(configure)),
        )
        .await
    }

    pub fn add_user(&self, name: &str) -> UserId {
        let id = UserId::random();
        let email = format!("{}@bookhive.example", name.to_ascii_lowercase());
        self.store.tables().users.insert(
            id,
            UserProfile {
                id,
                name: name.to_owned(),
                email,
            },
        );
        id
    }

    pub fn add_book(&self, seller: UserId, title: &str, rupees: u32) -> BookId {
        let id = BookId::random();
        self.store.tables().books.insert(
            id,
            BookListing {
                id,
                title: title.to_owned(),
                author: None,
                price: Money::from_major(rupees),
                seller_id: seller,
            },
        );
        id
    }

    pub fn add_to_cart(&self, user: UserId, book: BookId) {
        self.store.tables().carts.entry(user).or_default().push(book);
    }

    pub fn add_address(&self, owner: UserId) -> AddressId {
        let id = AddressId::random();
        self.store.tables().addresses.insert(
            id,
            (
                owner,
                ShippingAddress {
                    full_name: "Asha Rao".to_owned(),
                    phone_number: "+91 98200 00000".to_owned(),
                    address_line1: "12 MG Road".to_owned(),
                    address_line2: None,
                    city: "Pune".to_owned(),
                    state: "Maharashtra".to_owned(),
                    postal_code: "411001".to_owned(),
                    country: "India".to_owned(),
                },
            ),
        );
        id
    }

    /// Signature the gateway would attach to this payment.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> String {
        self.verifier.sign(gateway_order_id, payment_id)
    }
}

/// `Authorization` header for `user`.
pub fn bearer(user: UserId) -> (header::HeaderName, String) {
    let claims = json!({"sub": user.to_string(), "exp": TOKEN_EXPIRY});
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET),
    )
    .expect("token encodes");
    (header::AUTHORIZATION, format!("Bearer {token}"))
}

/// Send a JSON request as `user` and return status plus parsed body.
pub async fn send(
    app: &impl TestApp,
    user: UserId,
    request: test::TestRequest,
    body: Option<Value>,
) -> (u16, Value) {
    let request = request.insert_header(bearer(user));
    let request = match body {
        Some(body) => request.set_json(body),
        None => request,
    };
    let response = test::call_service(app, request.to_request()).await;
    let status = response.status().as_u16();
    let bytes = test::read_body(response).await;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    };
    (status, value)
}

pub fn reason(body: &Value) -> Option<&str> {
    body.get("reason").and_then(Value::as_str)
}

//! Tests for single-book checkout and courier shipping.

use chrono::Utc;
use mockable::DefaultClock;
use rstest::rstest;

use super::*;
use crate::domain::ports::{
    BookedShipment, GatewayOrder, MockBookCatalogue, MockPaymentGateway, MockShippingCarrier,
    MockTransactionRepository, MockUserDirectory, ShipmentDestination, ShipmentTrack,
};
use crate::domain::{
    BookId, BookListing, FailureReason, Money, PaymentSecret, ShipmentStatus, TransactionRecord,
    UserProfile,
};

const SECRET: &str = "checkout-secret";

type Service = CheckoutService<
    MockTransactionRepository,
    MockBookCatalogue,
    MockPaymentGateway,
    MockShippingCarrier,
>;

fn service(
    transactions: MockTransactionRepository,
    books: MockBookCatalogue,
    gateway: MockPaymentGateway,
) -> Service {
    build(transactions, books, gateway, MockShippingCarrier::new(), MockUserDirectory::new())
}

fn shipping_service(
    transactions: MockTransactionRepository,
    books: MockBookCatalogue,
    carrier: MockShippingCarrier,
    users: MockUserDirectory,
) -> Service {
    build(transactions, books, MockPaymentGateway::new(), carrier, users)
}

fn build(
    transactions: MockTransactionRepository,
    books: MockBookCatalogue,
    gateway: MockPaymentGateway,
    carrier: MockShippingCarrier,
    users: MockUserDirectory,
) -> Service {
    CheckoutService::new(
        CheckoutPorts {
            transactions: Arc::new(transactions),
            books: Arc::new(books),
            gateway: Arc::new(gateway),
            carrier: Arc::new(carrier),
            users: Arc::new(users),
        },
        PaymentVerifier::new(PaymentSecret::new(SECRET)),
        Arc::new(DefaultClock),
    )
}

fn stored(buyer: UserId, status: PaymentStatus) -> Transaction {
    Transaction::restore(TransactionRecord {
        id: TransactionId::random(),
        buyer_id: buyer,
        seller_id: UserId::random(),
        book_id: BookId::random(),
        amount_paid: Money::from_major(299),
        payment_status: status,
        gateway_order_id: "order_legacy".to_owned(),
        gateway_payment_id: None,
        shipping_details: ShippingDetails::default(),
        created_at: Utc::now(),
    })
}

fn signed(buyer: UserId, payment_id: &str) -> VerifyPaymentRequest {
    VerifyPaymentRequest {
        caller: buyer,
        gateway_order_id: "order_legacy".to_owned(),
        gateway_payment_id: payment_id.to_owned(),
        signature: PaymentVerifier::new(PaymentSecret::new(SECRET))
            .sign("order_legacy", payment_id),
    }
}

#[rstest]
#[tokio::test]
async fn checkout_charges_book_price_with_book_receipt() {
    let buyer = UserId::random();
    let book = BookListing {
        id: BookId::random(),
        title: "Godaan".to_owned(),
        author: None,
        price: Money::from_major(299),
        seller_id: UserId::random(),
    };
    let receipt = format!("book_{}", book.id);
    let mut books = MockBookCatalogue::new();
    books.expect_get_book().return_once(move |_| Ok(Some(book)));
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_create_order()
        .withf(move |request| request.receipt == receipt && request.amount.minor_units() == 29_900)
        .return_once(|request| {
            Ok(GatewayOrder {
                id: "order_legacy".to_owned(),
                amount: request.amount,
                currency: request.currency,
            })
        });
    gateway
        .expect_public_key_id()
        .return_const("rzp_test_key".to_owned());
    let mut transactions = MockTransactionRepository::new();
    transactions
        .expect_insert()
        .withf(|transaction| transaction.payment_status() == PaymentStatus::Pending)
        .times(1)
        .returning(|_| Ok(()));

    let session = service(transactions, books, gateway)
        .checkout(CheckoutRequest {
            buyer_id: buyer,
            book_id: BookId::random(),
            address: Some("12 MG Road".to_owned()),
        })
        .await
        .expect("checkout");
    assert_eq!(session.key, "rzp_test_key");
    assert_eq!(session.order_id, "order_legacy");
    assert_eq!(session.amount.minor_units(), 29_900);
}

#[rstest]
#[tokio::test]
async fn tampered_signature_never_reads_store() {
    let buyer = UserId::random();
    let mut transactions = MockTransactionRepository::new();
    transactions.expect_find_by_gateway_order_id().never();
    transactions.expect_settle().never();
    let mut request = signed(buyer, "pay_9");
    request.gateway_payment_id = "pay_8".to_owned();

    let err = service(transactions, MockBookCatalogue::new(), MockPaymentGateway::new())
        .verify(request)
        .await
        .expect_err("mismatch");
    assert_eq!(err.reason(), FailureReason::PaymentSignature);
}

#[rstest]
#[tokio::test]
async fn verify_completes_pending_transaction() {
    let buyer = UserId::random();
    let pending = stored(buyer, PaymentStatus::Pending);
    let mut transactions = MockTransactionRepository::new();
    transactions
        .expect_find_by_gateway_order_id()
        .times(2)
        .returning(move |_| Ok(Some(pending.clone())));
    transactions
        .expect_settle()
        .withf(|transaction| {
            transaction.payment_status() == PaymentStatus::Completed
                && transaction.gateway_payment_id() == Some("pay_9")
        })
        .times(1)
        .returning(|_| Ok(true));

    let settled = service(transactions, MockBookCatalogue::new(), MockPaymentGateway::new())
        .verify(signed(buyer, "pay_9"))
        .await
        .expect("verified");
    assert_eq!(settled.payment_status(), PaymentStatus::Completed);
}

#[rstest]
#[tokio::test]
async fn completed_transaction_is_returned_unchanged() {
    let buyer = UserId::random();
    let done = stored(buyer, PaymentStatus::Completed);
    let mut transactions = MockTransactionRepository::new();
    transactions
        .expect_find_by_gateway_order_id()
        .returning(move |_| Ok(Some(done.clone())));
    transactions.expect_settle().never();

    let settled = service(transactions, MockBookCatalogue::new(), MockPaymentGateway::new())
        .verify(signed(buyer, "pay_9"))
        .await
        .expect("replay");
    assert_eq!(settled.payment_status(), PaymentStatus::Completed);
}

#[rstest]
#[tokio::test]
async fn failed_transaction_rejects_late_payment() {
    let buyer = UserId::random();
    let failed = stored(buyer, PaymentStatus::Failed);
    let mut transactions = MockTransactionRepository::new();
    transactions
        .expect_find_by_gateway_order_id()
        .returning(move |_| Ok(Some(failed.clone())));
    transactions.expect_settle().never();

    let err = service(transactions, MockBookCatalogue::new(), MockPaymentGateway::new())
        .verify(signed(buyer, "pay_9"))
        .await
        .expect_err("terminal");
    assert_eq!(err.reason(), FailureReason::InvalidTransition);
}

#[rstest]
#[tokio::test]
async fn abandon_marks_pending_as_failed() {
    let buyer = UserId::random();
    let pending = stored(buyer, PaymentStatus::Pending);
    let mut transactions = MockTransactionRepository::new();
    transactions
        .expect_find_by_gateway_order_id()
        .returning(move |_| Ok(Some(pending.clone())));
    transactions.expect_settle().times(1).returning(|_| Ok(true));

    let failed = service(transactions, MockBookCatalogue::new(), MockPaymentGateway::new())
        .abandon(AbandonCheckoutRequest {
            buyer_id: buyer,
            gateway_order_id: "order_legacy".to_owned(),
        })
        .await
        .expect("abandoned");
    assert_eq!(failed.payment_status(), PaymentStatus::Failed);
}


fn paid(buyer: UserId) -> Transaction {
    let mut transaction = stored(buyer, PaymentStatus::Pending);
    transaction.complete("pay_1").expect("pending settles");
    transaction
}

fn booked(buyer: UserId) -> Transaction {
    let mut transaction = paid(buyer);
    transaction
        .record_shipment("SR-77", Some("Delhivery".to_owned()))
        .expect("paid transaction ships");
    transaction
}

fn serving(transaction: &Transaction) -> MockTransactionRepository {
    let stored = transaction.clone();
    let mut transactions = MockTransactionRepository::new();
    transactions
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    transactions
}

fn destination() -> ShipmentDestination {
    ShipmentDestination {
        address: "7 Park Street".to_owned(),
        city: "Kolkata".to_owned(),
        pincode: "700016".to_owned(),
        state: "WB".to_owned(),
        phone: "+91-9000000001".to_owned(),
    }
}

fn buyer_directory(buyer: UserId) -> MockUserDirectory {
    let mut users = MockUserDirectory::new();
    users.expect_get_user().returning(move |id| {
        Ok((*id == buyer).then(|| UserProfile {
            id: buyer,
            name: "Tenzin".to_owned(),
            email: "tenzin@example.com".to_owned(),
        }))
    });
    users
}

fn titled_catalogue(title: &'static str) -> MockBookCatalogue {
    let mut books = MockBookCatalogue::new();
    books.expect_get_book().returning(move |id| {
        Ok(Some(BookListing {
            id: *id,
            title: title.to_owned(),
            author: None,
            price: Money::from_major(299),
            seller_id: UserId::random(),
        }))
    });
    books
}

fn courier(name: &str, rupees: u32, days: Option<u32>) -> CourierOption {
    CourierOption {
        courier_name: name.to_owned(),
        rate: Money::from_major(rupees),
        estimated_delivery_days: days,
    }
}

#[rstest]
#[tokio::test]
async fn shipping_options_rank_by_price_then_speed() {
    let mut carrier = MockShippingCarrier::new();
    carrier
        .expect_serviceability()
        .withf(|query| query.pickup_postcode == "560001" && query.delivery_postcode == "700016")
        .return_once(|_| {
            Ok(vec![
                courier("Slow", 60, Some(6)),
                courier("Unknown", 40, None),
                courier("Quick", 40, Some(2)),
                courier("Cheap", 35, Some(7)),
            ])
        });

    let options = shipping_service(
        MockTransactionRepository::new(),
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .shipping_options(ServiceabilityQuery {
        pickup_postcode: "560001".to_owned(),
        delivery_postcode: "700016".to_owned(),
        weight_kg: 0.5,
    })
    .await
    .expect("options");

    let names: Vec<_> = options.iter().map(|option| option.courier_name.as_str()).collect();
    assert_eq!(names, ["Cheap", "Quick", "Unknown", "Slow"]);
}

#[rstest]
#[tokio::test]
async fn ship_books_courier_for_paid_transaction() {
    let buyer = UserId::random();
    let transaction = paid(buyer);
    let mut transactions = serving(&transaction);
    transactions
        .expect_record_shipment()
        .withf(|stored| {
            stored.shipping_details().tracking_id.as_deref() == Some("SR-1")
                && stored.shipping_details().carrier.as_deref() == Some("Delhivery")
                && stored.shipping_details().status == ShipmentStatus::Processing
        })
        .times(1)
        .returning(|_| Ok(true));
    let sku = format!("BOOK-{}", transaction.book_id());
    let reference = transaction.id();
    let mut carrier = MockShippingCarrier::new();
    carrier
        .expect_create_shipment()
        .withf(move |request| {
            request.reference == reference
                && request.item_sku == sku
                && request.item_name == "The White Tiger"
                && request.customer_email == "tenzin@example.com"
                && request.item_price == Money::from_major(299)
                && request.destination.pincode == "700016"
        })
        .times(1)
        .returning(|_| {
            Ok(BookedShipment {
                tracking_id: "SR-1".to_owned(),
                carrier: Some("Delhivery".to_owned()),
            })
        });

    let shipped = shipping_service(
        transactions,
        titled_catalogue("The White Tiger"),
        carrier,
        buyer_directory(buyer),
    )
    .ship(ShipRequest {
        caller: transaction.seller_id(),
        transaction_id: transaction.id(),
        destination: destination(),
    })
    .await
    .expect("shipped");
    assert_eq!(shipped.shipping_details().tracking_id.as_deref(), Some("SR-1"));
}

#[rstest]
#[tokio::test]
async fn booked_shipment_is_returned_without_calling_carrier() {
    let buyer = UserId::random();
    let transaction = booked(buyer);
    let mut transactions = serving(&transaction);
    transactions.expect_record_shipment().never();
    let mut carrier = MockShippingCarrier::new();
    carrier.expect_create_shipment().never();

    let again = shipping_service(
        transactions,
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .ship(ShipRequest {
        caller: buyer,
        transaction_id: transaction.id(),
        destination: destination(),
    })
    .await
    .expect("idempotent");
    assert_eq!(again.shipping_details().tracking_id.as_deref(), Some("SR-77"));
}

#[rstest]
#[case(PaymentStatus::Pending)]
#[case(PaymentStatus::Failed)]
#[tokio::test]
async fn unpaid_transaction_is_not_shipped(#[case] status: PaymentStatus) {
    let buyer = UserId::random();
    let transaction = stored(buyer, status);
    let mut carrier = MockShippingCarrier::new();
    carrier.expect_create_shipment().never();

    let err = shipping_service(
        serving(&transaction),
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .ship(ShipRequest {
        caller: buyer,
        transaction_id: transaction.id(),
        destination: destination(),
    })
    .await
    .expect_err("not paid");
    assert_eq!(err.reason(), FailureReason::InvalidTransition);
}

#[rstest]
#[tokio::test]
async fn outsiders_cannot_ship() {
    let transaction = paid(UserId::random());
    let mut carrier = MockShippingCarrier::new();
    carrier.expect_create_shipment().never();

    let err = shipping_service(
        serving(&transaction),
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .ship(ShipRequest {
        caller: UserId::random(),
        transaction_id: transaction.id(),
        destination: destination(),
    })
    .await
    .expect_err("outsider");
    assert_eq!(err.reason(), FailureReason::NotFound);
}

#[rstest]
#[tokio::test]
async fn carrier_failure_is_upstream_error_and_stores_nothing() {
    let buyer = UserId::random();
    let transaction = paid(buyer);
    let mut transactions = serving(&transaction);
    transactions.expect_record_shipment().never();
    let mut carrier = MockShippingCarrier::new();
    carrier
        .expect_create_shipment()
        .return_once(|_| Err(ShippingCarrierError::rejected(422_u16, "pincode not serviceable")));

    let err = shipping_service(
        transactions,
        titled_catalogue("Godaan"),
        carrier,
        buyer_directory(buyer),
    )
    .ship(ShipRequest {
        caller: buyer,
        transaction_id: transaction.id(),
        destination: destination(),
    })
    .await
    .expect_err("carrier rejected");
    assert_eq!(err.code(), crate::domain::ErrorCode::BadGateway);
    assert_eq!(err.reason(), FailureReason::UpstreamGateway);
}

#[rstest]
#[tokio::test]
async fn tracking_advances_stored_shipment_status() {
    let buyer = UserId::random();
    let transaction = booked(buyer);
    let mut transactions = serving(&transaction);
    transactions
        .expect_update_shipment_status()
        .withf(|stored| stored.shipping_details().status == ShipmentStatus::Delivered)
        .times(1)
        .returning(|_| Ok(()));
    let mut carrier = MockShippingCarrier::new();
    carrier
        .expect_track()
        .withf(|tracking_id| tracking_id == "SR-77")
        .return_once(|tracking_id| {
            Ok(ShipmentTrack {
                tracking_id: tracking_id.to_owned(),
                carrier_status: Some("DELIVERED".to_owned()),
                status: Some(ShipmentStatus::Delivered),
                activities: Vec::new(),
            })
        });

    let progress = shipping_service(
        transactions,
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .track_shipment(TrackShipmentRequest {
        caller: buyer,
        transaction_id: transaction.id(),
    })
    .await
    .expect("tracked");
    assert_eq!(
        progress.transaction.shipping_details().status,
        ShipmentStatus::Delivered
    );
    assert_eq!(progress.tracking.carrier_status.as_deref(), Some("DELIVERED"));
}

#[rstest]
#[case(None)]
#[case(Some(ShipmentStatus::Processing))]
#[tokio::test]
async fn tracking_without_progress_writes_nothing(#[case] reported: Option<ShipmentStatus>) {
    let buyer = UserId::random();
    let transaction = booked(buyer);
    let mut transactions = serving(&transaction);
    transactions.expect_update_shipment_status().never();
    let mut carrier = MockShippingCarrier::new();
    carrier.expect_track().return_once(move |tracking_id| {
        Ok(ShipmentTrack {
            tracking_id: tracking_id.to_owned(),
            carrier_status: None,
            status: reported,
            activities: Vec::new(),
        })
    });

    let progress = shipping_service(
        transactions,
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .track_shipment(TrackShipmentRequest {
        caller: buyer,
        transaction_id: transaction.id(),
    })
    .await
    .expect("tracked");
    assert_eq!(
        progress.transaction.shipping_details().status,
        ShipmentStatus::Processing
    );
}

#[rstest]
#[tokio::test]
async fn tracking_before_booking_is_rejected() {
    let buyer = UserId::random();
    let transaction = paid(buyer);
    let mut carrier = MockShippingCarrier::new();
    carrier.expect_track().never();

    let err = shipping_service(
        serving(&transaction),
        MockBookCatalogue::new(),
        carrier,
        MockUserDirectory::new(),
    )
    .track_shipment(TrackShipmentRequest {
        caller: buyer,
        transaction_id: transaction.id(),
    })
    .await
    .expect_err("nothing booked");
    assert_eq!(err.reason(), FailureReason::InvalidTransition);
}

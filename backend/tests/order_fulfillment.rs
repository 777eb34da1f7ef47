//! Cart checkout, payment confirmation and shipment tracking over HTTP.

#[path = "support/marketplace.rs"]
#[allow(dead_code, reason = "shared across suites; each uses a subset")]
mod marketplace_support;

use actix_web::test::TestRequest;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

use marketplace::domain::{AddressId, Money, OrderStatus, UserId};
use marketplace_support::{Marketplace, TestApp, reason, send};

struct Shopper {
    world: Marketplace,
    buyer: UserId,
    address: AddressId,
}

/// A buyer with two books from one seller in the cart.
#[fixture]
fn shopper() -> Shopper {
    let world = Marketplace::new();
    let seller = world.add_user("Nandini");
    let buyer = world.add_user("Arjun");
    let first = world.add_book(seller, "The Guide", 100);
    let second = world.add_book(seller, "Godaan", 250);
    world.add_to_cart(buyer, first);
    world.add_to_cart(buyer, second);
    let address = world.add_address(buyer);
    Shopper {
        world,
        buyer,
        address,
    }
}

fn create_body(address: AddressId) -> Value {
    json!({"addressId": address.to_string(), "paymentMethod": "upi"})
}

async fn place(app: &impl TestApp, shopper: &Shopper) -> String {
    let (status, session) = send(
        app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/create"),
        Some(create_body(shopper.address)),
    )
    .await;
    assert_eq!(status, 200);
    session["orderId"].as_str().expect("gateway order id").to_owned()
}

fn verify_body(world: &Marketplace, gateway_order_id: &str, payment_id: &str) -> Value {
    json!({
        "orderId": gateway_order_id,
        "paymentId": payment_id,
        "signature": world.sign(gateway_order_id, payment_id),
    })
}

fn confirmation_count(world: &Marketplace) -> usize {
    world
        .mailer
        .subjects()
        .iter()
        .filter(|subject| subject.starts_with("Order Confirmation - #"))
        .count()
}

#[rstest]
#[actix_web::test]
async fn verified_payment_confirms_once(shopper: Shopper) {
    let app = shopper.world.service().await;
    let (_, session) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/create"),
        Some(create_body(shopper.address)),
    )
    .await;
    assert_eq!(session["amount"], 35_000);
    assert_eq!(session["currency"], "INR");
    assert_eq!(shopper.world.gateway.amounts(), vec![Money::from_major(350)]);
    let gateway_order_id = session["orderId"].as_str().expect("gateway order id");

    let body = verify_body(&shopper.world, gateway_order_id, "pay_001");
    let (status, order) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/verify"),
        Some(body.clone()),
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["gatewayPaymentId"], "pay_001");
    assert_eq!(order["totalAmount"], 35_000);
    assert!(shopper.world.store.cart(shopper.buyer).is_empty());
    assert_eq!(confirmation_count(&shopper.world), 1);

    let (replay_status, replay) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/verify"),
        Some(body),
    )
    .await;
    assert_eq!(replay_status, 200);
    assert_eq!(replay["revision"], order["revision"]);
    assert_eq!(confirmation_count(&shopper.world), 1);
}

#[rstest]
#[actix_web::test]
async fn hand_confirmed_order_still_records_the_payment(shopper: Shopper) {
    let app = shopper.world.service().await;
    let gateway_order_id = place(&app, &shopper).await;
    let order_id = shopper
        .world
        .store
        .order_by_gateway_id(&gateway_order_id)
        .expect("order stored")
        .id();
    let (moved, _) = send(
        &app,
        shopper.buyer,
        TestRequest::put().uri(&format!("/api/v1/orders/{order_id}/status")),
        Some(json!({"status": "confirmed"})),
    )
    .await;
    assert_eq!(moved, 200);
    assert_eq!(shopper.world.store.cart(shopper.buyer).len(), 2);

    let (status, order) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/verify"),
        Some(verify_body(&shopper.world, &gateway_order_id, "pay_late")),
    )
    .await;

    assert_eq!(status, 200);
    assert_eq!(order["status"], "confirmed");
    assert_eq!(order["gatewayPaymentId"], "pay_late");
    assert!(shopper.world.store.cart(shopper.buyer).is_empty());
    assert_eq!(confirmation_count(&shopper.world), 1);
}

#[rstest]
#[actix_web::test]
async fn tampered_signature_changes_nothing(shopper: Shopper) {
    let app = shopper.world.service().await;
    let gateway_order_id = place(&app, &shopper).await;
    let mut body = verify_body(&shopper.world, &gateway_order_id, "pay_002");
    let signature = body["signature"].as_str().expect("signature").to_owned();
    let flipped = if signature.starts_with('0') { "1" } else { "0" };
    body["signature"] = Value::from(format!("{flipped}{}", &signature[1..]));

    let (status, error) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/verify"),
        Some(body),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(reason(&error), Some("payment_signature"));
    let stored = shopper
        .world
        .store
        .order_by_gateway_id(&gateway_order_id)
        .expect("order stored");
    assert_eq!(stored.status(), OrderStatus::Pending);
    assert_eq!(shopper.world.store.cart(shopper.buyer).len(), 2);
    assert!(shopper.world.mailer.subjects().is_empty());
}

#[rstest]
#[actix_web::test]
async fn status_never_moves_backwards(shopper: Shopper) {
    let app = shopper.world.service().await;
    let gateway_order_id = place(&app, &shopper).await;
    let (_, order) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/verify"),
        Some(verify_body(&shopper.world, &gateway_order_id, "pay_003")),
    )
    .await;
    let status_uri = format!("/api/v1/orders/{}/status", order["id"].as_str().expect("id"));

    let (shipped, _) = send(
        &app,
        shopper.buyer,
        TestRequest::put().uri(&status_uri),
        Some(json!({"status": "shipped"})),
    )
    .await;
    let (regressed, error) = send(
        &app,
        shopper.buyer,
        TestRequest::put().uri(&status_uri),
        Some(json!({"status": "pending"})),
    )
    .await;

    assert_eq!(shipped, 200);
    assert_eq!(regressed, 400);
    assert_eq!(reason(&error), Some("invalid_transition"));
    let stored = shopper
        .world
        .store
        .order_by_gateway_id(&gateway_order_id)
        .expect("order stored");
    assert_eq!(stored.status(), OrderStatus::Shipped);
}

#[rstest]
#[actix_web::test]
async fn tracking_history_only_grows(shopper: Shopper) {
    let app = shopper.world.service().await;
    let gateway_order_id = place(&app, &shopper).await;
    let order_id = shopper
        .world
        .store
        .order_by_gateway_id(&gateway_order_id)
        .expect("order stored")
        .id();
    let tracking_uri = format!("/api/v1/orders/{order_id}/tracking");

    let mut histories = Vec::new();
    for (status, location) in [
        ("picked_up", "Pune hub"),
        ("in_transit", "Mumbai sort centre"),
        ("out_for_delivery", "Andheri"),
    ] {
        let (code, order) = send(
            &app,
            shopper.buyer,
            TestRequest::put().uri(&tracking_uri),
            Some(json!({
                "carrier": "BlueDart",
                "trackingNumber": "BD123456",
                "status": status,
                "location": location,
            })),
        )
        .await;
        assert_eq!(code, 200);
        histories.push(order["tracking"]["history"].clone());
    }

    let last = histories.last().and_then(Value::as_array).expect("history");
    assert_eq!(last.len(), 3);
    for earlier in &histories[..2] {
        let earlier = earlier.as_array().expect("history");
        assert_eq!(earlier.as_slice(), &last[..earlier.len()]);
    }
    assert_eq!(last[2]["status"], "out_for_delivery");
    let shipping_emails = shopper
        .world
        .mailer
        .subjects()
        .into_iter()
        .filter(|subject| subject.starts_with("Shipping Update"))
        .count();
    assert_eq!(shipping_emails, 3);
}

#[rstest]
#[case(true, 1)]
#[case(false, 0)]
#[actix_web::test]
async fn delivery_email_honours_preferences(
    shopper: Shopper,
    #[case] wants_delivery_email: bool,
    #[case] expected: usize,
) {
    let app = shopper.world.service().await;
    let gateway_order_id = place(&app, &shopper).await;
    let (_, order) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/verify"),
        Some(verify_body(&shopper.world, &gateway_order_id, "pay_004")),
    )
    .await;
    let order_uri = format!("/api/v1/orders/{}", order["id"].as_str().expect("id"));

    let (prefs, prefs_body) = send(
        &app,
        shopper.buyer,
        TestRequest::put().uri(&format!("{order_uri}/notifications")),
        Some(json!({
            "orderConfirmation": true,
            "shippingUpdates": true,
            "deliveryConfirmation": wants_delivery_email,
        })),
    )
    .await;
    assert_eq!(prefs, 200);
    assert_eq!(
        prefs_body["notificationPreferences"]["deliveryConfirmation"],
        wants_delivery_email
    );
    for status in ["shipped", "delivered"] {
        let (code, _) = send(
            &app,
            shopper.buyer,
            TestRequest::put().uri(&format!("{order_uri}/status")),
            Some(json!({"status": status})),
        )
        .await;
        assert_eq!(code, 200);
    }

    let delivered = shopper
        .world
        .mailer
        .subjects()
        .into_iter()
        .filter(|subject| subject.starts_with("Delivery Confirmation"))
        .count();
    assert_eq!(delivered, expected);
}

#[rstest]
#[actix_web::test]
async fn empty_cart_is_rejected_before_the_gateway() {
    let world = Marketplace::new();
    let buyer = world.add_user("Isha");
    let address = world.add_address(buyer);
    let app = world.service().await;

    let (status, error) = send(
        &app,
        buyer,
        TestRequest::post().uri("/api/v1/orders/create"),
        Some(create_body(address)),
    )
    .await;

    assert_eq!(status, 400);
    assert_eq!(reason(&error), Some("empty_cart"));
    assert!(world.gateway.amounts().is_empty());
}

#[rstest]
#[actix_web::test]
async fn foreign_addresses_and_orders_are_not_found(shopper: Shopper) {
    let stranger = shopper.world.add_user("Dev");
    let stranger_address = shopper.world.add_address(stranger);
    let app = shopper.world.service().await;

    let (address_status, _) = send(
        &app,
        shopper.buyer,
        TestRequest::post().uri("/api/v1/orders/create"),
        Some(create_body(stranger_address)),
    )
    .await;
    assert_eq!(address_status, 404);

    let gateway_order_id = place(&app, &shopper).await;
    let order_id = shopper
        .world
        .store
        .order_by_gateway_id(&gateway_order_id)
        .expect("order stored")
        .id();
    let (read_status, _) = send(
        &app,
        stranger,
        TestRequest::get().uri(&format!("/api/v1/orders/{order_id}")),
        None,
    )
    .await;
    let (list_status, list) = send(&app, stranger, TestRequest::get().uri("/api/v1/orders"), None).await;

    assert_eq!(read_status, 404);
    assert_eq!(list_status, 200);
    assert_eq!(list.as_array().map(Vec::len), Some(0));
}

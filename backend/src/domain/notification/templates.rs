//! HTML email bodies.

use chrono::{DateTime, Utc};

use crate::domain::{Money, Order, TrackingUpdate, UserProfile};

/// One row in an itemised email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineItem {
    pub title: String,
    pub price: Money,
}

const SIGN_OFF: &str = "<p>Best regards,<br>BookHive Team</p>";

pub(super) fn order_confirmation(
    order: &Order,
    recipient: &UserProfile,
    items: &[LineItem],
) -> (String, String) {
    let address = order.shipping_address();
    let mut html = format!(
        "<h1>Order Confirmation</h1>\
         <p>Dear {name},</p>\
         <p>Thank you for your order! We're excited to confirm that your order has been received and is being processed.</p>\
         <h2>Order Details</h2><p>Order ID: {id}</p><p>Total Amount: {total}</p>",
        name = escape(&recipient.name),
        id = order.id(),
        total = order.total_amount(),
    );
    push_items(&mut html, items);
    html.push_str("<h2>Shipping Address</h2>");
    push_paragraph(&mut html, &address.full_name);
    push_paragraph(&mut html, &address.address_line1);
    if let Some(line2) = address.address_line2.as_deref() {
        push_paragraph(&mut html, line2);
    }
    push_paragraph(
        &mut html,
        &format!("{}, {} {}", address.city, address.state, address.postal_code),
    );
    push_paragraph(&mut html, &address.country);
    html.push_str("<p>We'll send you another email when your order ships.</p>");
    html.push_str(SIGN_OFF);
    (format!("Order Confirmation - #{}", order.id()), html)
}

pub(super) fn shipping_update(
    order: &Order,
    recipient: &UserProfile,
    update: &TrackingUpdate,
) -> (String, String) {
    let mut html = format!(
        "<h1>Shipping Update</h1><p>Dear {name},</p><p>Your order #{id} has been updated:</p>\
         <h2>Current Status</h2>",
        name = escape(&recipient.name),
        id = order.id(),
    );
    push_paragraph(&mut html, update.status.as_str());
    push_paragraph(&mut html, &format!("Location: {}", update.location));
    push_paragraph(
        &mut html,
        &format!("Estimated Delivery: {}", estimated(update.estimated_delivery)),
    );
    html.push_str("<h2>Tracking Details</h2>");
    push_paragraph(&mut html, &format!("Carrier: {}", update.carrier));
    push_paragraph(&mut html, &format!("Tracking Number: {}", update.tracking_number));
    html.push_str("<p>You can track your order at any time through your account.</p>");
    html.push_str(SIGN_OFF);
    (format!("Shipping Update - Order #{}", order.id()), html)
}

pub(super) fn delivery_confirmation(
    order: &Order,
    recipient: &UserProfile,
    items: &[LineItem],
) -> (String, String) {
    let mut html = format!(
        "<h1>Delivery Confirmation</h1><p>Dear {name},</p>\
         <p>Great news! Your order #{id} has been delivered successfully.</p>\
         <h2>Order Details</h2><p>Order ID: {id}</p><p>Total Amount: {total}</p>",
        name = escape(&recipient.name),
        id = order.id(),
        total = order.total_amount(),
    );
    push_items(&mut html, items);
    html.push_str(
        "<p>We hope you enjoy your books! If you have any questions or concerns, please don't hesitate to contact us.</p>",
    );
    html.push_str(SIGN_OFF);
    (format!("Delivery Confirmation - Order #{}", order.id()), html)
}

fn estimated(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "Not available".to_owned(), |ts| ts.format("%d %b %Y").to_string())
}

fn push_items(html: &mut String, items: &[LineItem]) {
    html.push_str("<h2>Items</h2><ul>");
    for item in items {
        html.push_str(&format!("<li>{} - {}</li>", escape(&item.title), item.price));
    }
    html.push_str("</ul>");
}

fn push_paragraph(html: &mut String, text: &str) {
    html.push_str("<p>");
    html.push_str(&escape(text));
    html.push_str("</p>");
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TrackingStatus;
    use crate::domain::order::tests_support::pending_order;
    use crate::domain::UserId;

    fn recipient() -> UserProfile {
        UserProfile {
            id: UserId::random(),
            name: "Asha <Reader>".to_owned(),
            email: "asha@example.com".to_owned(),
        }
    }

    #[test]
    fn confirmation_subject_and_body() {
        let order = pending_order();
        let items = vec![LineItem {
            title: "Dune".to_owned(),
            price: Money::from_major(100),
        }];
        let (subject, html) = order_confirmation(&order, &recipient(), &items);

        assert_eq!(subject, format!("Order Confirmation - #{}", order.id()));
        assert!(html.contains("<li>Dune - ₹100.00</li>"));
        assert!(html.contains("Asha &lt;Reader&gt;"));
        assert!(html.contains("BookHive Team"));
    }

    #[test]
    fn shipping_update_lists_carrier_and_eta() {
        let order = pending_order();
        let update = TrackingUpdate {
            carrier: "BlueDart".to_owned(),
            tracking_number: "BD-1".to_owned(),
            status: TrackingStatus::InTransit,
            location: "Pune".to_owned(),
            estimated_delivery: None,
        };
        let (subject, html) = shipping_update(&order, &recipient(), &update);

        assert_eq!(subject, format!("Shipping Update - Order #{}", order.id()));
        assert!(html.contains("Carrier: BlueDart"));
        assert!(html.contains("Estimated Delivery: Not available"));
    }
}

//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the migrations under `backend/migrations`.
//! `diesel print-schema` regenerates them from a live database.

diesel::table! {
    /// Registered users, owned by the identity service.
    users (id) {
        id -> Uuid,
        name -> Varchar,
        email -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Book listings, owned by the catalogue service.
    books (id) {
        id -> Uuid,
        title -> Text,
        author -> Nullable<Text>,
        /// Price in paise.
        price_minor -> Int8,
        seller_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Saved delivery addresses.
    addresses (id) {
        id -> Uuid,
        user_id -> Uuid,
        full_name -> Text,
        phone_number -> Varchar,
        address_line1 -> Text,
        address_line2 -> Nullable<Text>,
        city -> Text,
        state -> Text,
        postal_code -> Varchar,
        country -> Text,
    }
}

diesel::table! {
    cart_items (user_id, book_id) {
        user_id -> Uuid,
        book_id -> Uuid,
        added_at -> Timestamptz,
    }
}

diesel::table! {
    /// Buyer and seller chat, threaded by deal.
    chat_messages (id) {
        id -> Uuid,
        deal_id -> Uuid,
        sender_id -> Uuid,
        body -> Text,
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// Face-to-face or courier hand-offs negotiated per book and buyer.
    ///
    /// `(book_id, buyer_id)` is unique so concurrent creation collapses to
    /// one row.
    deals (id) {
        id -> Uuid,
        book_id -> Uuid,
        buyer_id -> Uuid,
        seller_id -> Uuid,
        status -> Varchar,
        method -> Varchar,
        scheduled_time -> Nullable<Timestamptz>,
        rating_stars -> Nullable<Int2>,
        rating_comment -> Nullable<Text>,
        rated_by -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Multi-item orders. Writes are guarded by `revision`.
    orders (id) {
        id -> Uuid,
        buyer_id -> Uuid,
        items -> Jsonb,
        total_minor -> Int8,
        status -> Varchar,
        shipping_address -> Jsonb,
        gateway_order_id -> Varchar,
        gateway_payment_id -> Nullable<Varchar>,
        payment_method -> Varchar,
        tracking -> Nullable<Jsonb>,
        notification_preferences -> Jsonb,
        revision -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Legacy single-book purchases.
    transactions (id) {
        id -> Uuid,
        buyer_id -> Uuid,
        seller_id -> Uuid,
        book_id -> Uuid,
        amount_minor -> Int8,
        payment_status -> Varchar,
        gateway_order_id -> Varchar,
        gateway_payment_id -> Nullable<Varchar>,
        shipping_address -> Nullable<Text>,
        tracking_id -> Nullable<Varchar>,
        carrier -> Nullable<Varchar>,
        shipment_status -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(books -> users (seller_id));
diesel::joinable!(cart_items -> books (book_id));

diesel::allow_tables_to_appear_in_same_query!(
    addresses,
    books,
    cart_items,
    chat_messages,
    deals,
    orders,
    transactions,
    users,
);

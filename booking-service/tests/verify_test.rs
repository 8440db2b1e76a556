mod common;

use booking_service::models::{Booking, BookingStatus};
use common::{sign, TestApp};
use mongodb::bson::doc;

async fn post_verify(
    address: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{}/verify", address))
        .json(&serde_json::json!({
            "razorpay_order_id": order_id,
            "razorpay_payment_id": payment_id,
            "razorpay_signature": signature,
        }))
        .send()
        .await
        .expect("Failed to send request")
}

async fn fetch_booking(app: &TestApp, session: &str) -> Booking {
    app.db
        .collection("bookings")
        .find_one(doc! { "session": session }, None)
        .await
        .unwrap()
        .expect("Booking not found")
}

#[tokio::test]
async fn valid_signature_marks_booking_paid() {
    let app = TestApp::spawn().await;
    app.seed_booking("order_v1").await;

    let signature = sign("order_v1", "pay_v1");
    let response = post_verify(&app.address, "order_v1", "pay_v1", &signature).await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Payment verified successfully");

    let booking = fetch_booking(&app, "order_v1").await;
    assert_eq!(booking.status, BookingStatus::Paid);
    assert_eq!(booking.payment_id.as_deref(), Some("pay_v1"));

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_signature_is_rejected_without_mutation() {
    let app = TestApp::spawn().await;
    app.seed_booking("order_v2").await;

    let response = post_verify(&app.address, "order_v2", "pay_v2", "deadbeef").await;

    assert_eq!(response.status(), 400);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid signature");

    let booking = fetch_booking(&app, "order_v2").await;
    assert_eq!(booking.status, BookingStatus::Pending);
    assert!(booking.payment_id.is_none());

    app.cleanup().await;
}

#[tokio::test]
async fn signature_for_different_order_is_rejected() {
    let app = TestApp::spawn().await;
    app.seed_booking("order_v3").await;

    // Signature computed over a different order id
    let signature = sign("order_other", "pay_v3");
    let response = post_verify(&app.address, "order_v3", "pay_v3", &signature).await;
    assert_eq!(response.status(), 400);

    // And over a different payment id
    let signature = sign("order_v3", "pay_other");
    let response = post_verify(&app.address, "order_v3", "pay_v3", &signature).await;
    assert_eq!(response.status(), 400);

    let booking = fetch_booking(&app, "order_v3").await;
    assert_eq!(booking.status, BookingStatus::Pending);

    app.cleanup().await;
}

#[tokio::test]
async fn verification_is_idempotent() {
    let app = TestApp::spawn().await;
    app.seed_booking("order_v4").await;

    let signature = sign("order_v4", "pay_v4");

    let first = post_verify(&app.address, "order_v4", "pay_v4", &signature).await;
    assert_eq!(first.status(), 200);

    let second = post_verify(&app.address, "order_v4", "pay_v4", &signature).await;
    assert_eq!(second.status(), 200);
    let body: serde_json::Value = second.json().await.unwrap();
    assert_eq!(body["success"], true);

    let booking = fetch_booking(&app, "order_v4").await;
    assert_eq!(booking.status, BookingStatus::Paid);
    assert_eq!(booking.payment_id.as_deref(), Some("pay_v4"));

    app.cleanup().await;
}

#[tokio::test]
async fn unmatched_session_reports_success_but_mutates_nothing() {
    let app = TestApp::spawn().await;

    let signature = sign("order_ghost", "pay_ghost");
    let response = post_verify(&app.address, "order_ghost", "pay_ghost", &signature).await;

    // Valid signature with no local record: success to the caller, the
    // anomaly is only surfaced internally.
    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);

    let count = app
        .db
        .collection::<Booking>("bookings")
        .count_documents(None, None)
        .await
        .unwrap();
    assert_eq!(count, 0);

    app.cleanup().await;
}

#[tokio::test]
async fn concurrent_verification_applies_transition_once() {
    let app = TestApp::spawn().await;
    app.seed_booking("order_v5").await;

    let signature = sign("order_v5", "pay_v5");

    let a = post_verify(&app.address, "order_v5", "pay_v5", &signature);
    let b = post_verify(&app.address, "order_v5", "pay_v5", &signature);
    let (ra, rb) = tokio::join!(a, b);

    assert_eq!(ra.status(), 200);
    assert_eq!(rb.status(), 200);

    let booking = fetch_booking(&app, "order_v5").await;
    assert_eq!(booking.status, BookingStatus::Paid);
    assert_eq!(booking.payment_id.as_deref(), Some("pay_v5"));

    let paid_count = app
        .db
        .collection::<Booking>("bookings")
        .count_documents(doc! { "session": "order_v5", "status": "paid" }, None)
        .await
        .unwrap();
    assert_eq!(paid_count, 1);

    app.cleanup().await;
}

#[tokio::test]
async fn empty_fields_are_rejected() {
    let app = TestApp::spawn().await;

    let response = post_verify(&app.address, "", "", "").await;
    assert_eq!(response.status(), 422);

    app.cleanup().await;
}

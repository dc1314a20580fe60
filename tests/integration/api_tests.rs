//! API integration tests
//!
//! These run against a live server with a seeded database:
//! RUN_MODE=test cargo run, then cargo test -- --ignored.

use reqwest::Client;
use serde_json::{json, Value};

const BASE_URL: &str = "http://localhost:8080/api/v1";

/// Token for a seeded renter with a complete license on file
fn renter_token() -> String {
    std::env::var("TEST_RENTER_TOKEN").expect("TEST_RENTER_TOKEN not set")
}

/// Token for a seeded staff user
fn staff_token() -> String {
    std::env::var("TEST_STAFF_TOKEN").expect("TEST_STAFF_TOKEN not set")
}

fn seeded_station_id() -> String {
    std::env::var("TEST_STATION_ID").expect("TEST_STATION_ID not set")
}

fn seeded_vehicle_id() -> String {
    std::env::var("TEST_VEHICLE_ID").expect("TEST_VEHICLE_ID not set")
}

/// Gateway order id of a seeded PENDING deposit payment
fn seeded_deposit_order_id() -> String {
    std::env::var("TEST_DEPOSIT_ORDER_ID").expect("TEST_DEPOSIT_ORDER_ID not set")
}

fn momo_partner_code() -> String {
    std::env::var("TEST_MOMO_PARTNER_CODE").unwrap_or_else(|_| "MOMOTEST".to_string())
}

fn momo_access_key() -> String {
    std::env::var("TEST_MOMO_ACCESS_KEY").unwrap_or_else(|_| "test-access-key".to_string())
}

fn momo_secret_key() -> String {
    std::env::var("TEST_MOMO_SECRET_KEY")
        .unwrap_or_else(|_| "change-this-secret-in-production".to_string())
}

fn hmac_sign(raw: &str, secret: &str) -> String {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC key of any size");
    mac.update(raw.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_readiness_check() {
    let client = Client::new();

    let response = client
        .get(format!("{}/ready", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
#[ignore]
async fn test_available_vehicles() {
    let client = Client::new();

    let response = client
        .get(format!("{}/vehicles/available", BASE_URL))
        .query(&[
            ("station_id", seeded_station_id()),
            ("start_time", "2026-09-01T08:00:00Z".to_string()),
            ("end_time", "2026-09-01T18:00:00Z".to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body.is_array());
}

#[tokio::test]
#[ignore]
async fn test_available_vehicles_rejects_inverted_window() {
    let client = Client::new();

    let response = client
        .get(format!("{}/vehicles/available", BASE_URL))
        .query(&[
            ("station_id", seeded_station_id()),
            ("start_time", "2026-09-01T18:00:00Z".to_string()),
            ("end_time", "2026-09-01T08:00:00Z".to_string()),
        ])
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_create_booking_requires_auth() {
    let client = Client::new();

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .json(&json!({
            "vehicle_id": seeded_vehicle_id(),
            "station_id": seeded_station_id(),
            "start_time": "2026-09-02T08:00:00Z",
            "expected_end_time": "2026-09-02T18:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 401);
}

#[tokio::test]
#[ignore]
async fn test_create_booking_rejects_inverted_window() {
    let client = Client::new();

    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", renter_token()))
        .json(&json!({
            "vehicle_id": seeded_vehicle_id(),
            "station_id": seeded_station_id(),
            "start_time": "2026-09-02T18:00:00Z",
            "expected_end_time": "2026-09-02T08:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

#[tokio::test]
#[ignore]
async fn test_booking_lifecycle() {
    let client = Client::new();

    // Create
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", renter_token()))
        .json(&json!({
            "vehicle_id": seeded_vehicle_id(),
            "station_id": seeded_station_id(),
            "start_time": "2026-10-01T08:00:00Z",
            "expected_end_time": "2026-10-02T14:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "PENDING");
    assert!(body["booking_code"].as_str().unwrap().starts_with("BK"));
    let booking_id = body["id"].as_str().expect("No booking id").to_string();

    // Overlapping second booking on the same vehicle must conflict
    let response = client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", renter_token()))
        .json(&json!({
            "vehicle_id": seeded_vehicle_id(),
            "station_id": seeded_station_id(),
            "start_time": "2026-10-01T12:00:00Z",
            "expected_end_time": "2026-10-01T16:00:00Z"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);

    // Confirm (staff)
    let response = client
        .post(format!("{}/bookings/{}/confirm", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", staff_token()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "CONFIRMED");

    // Confirming twice is a state conflict
    let response = client
        .post(format!("{}/bookings/{}/confirm", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", staff_token()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 409);

    // Cancel
    let response = client
        .post(format!("{}/bookings/{}/cancel", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", renter_token()))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "CANCELLED");
}

#[tokio::test]
#[ignore]
async fn test_confirm_requires_staff_role() {
    let client = Client::new();

    let response = client
        .post(format!(
            "{}/bookings/00000000-0000-0000-0000-000000000000/confirm",
            BASE_URL
        ))
        .header("Authorization", format!("Bearer {}", renter_token()))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 403);
}

async fn create_booking_status(client: &Client, body: &Value) -> u16 {
    client
        .post(format!("{}/bookings", BASE_URL))
        .header("Authorization", format!("Bearer {}", renter_token()))
        .json(body)
        .send()
        .await
        .expect("Failed to send request")
        .status()
        .as_u16()
}

#[tokio::test]
#[ignore]
async fn test_concurrent_overlapping_creates_admit_exactly_one() {
    let client = Client::new();
    let body = json!({
        "vehicle_id": seeded_vehicle_id(),
        "station_id": seeded_station_id(),
        "start_time": "2026-11-05T08:00:00Z",
        "expected_end_time": "2026-11-05T18:00:00Z"
    });

    // Both requests race through the conflict check at the same time;
    // the vehicle row lock and the exclusion constraint must let only
    // one of them commit.
    let (first, second) = tokio::join!(
        create_booking_status(&client, &body),
        create_booking_status(&client, &body)
    );

    let mut statuses = [first, second];
    statuses.sort_unstable();
    assert_eq!(statuses, [201, 409]);
}

/// Signed deposit callback for the seeded pending payment
fn deposit_callback(order_id: &str, amount: i64) -> Value {
    let raw = format!(
        "accessKey={}&amount={}&extraData=true&message=Successful.&orderId={}&orderInfo=Deposit&orderType=momo_wallet&partnerCode={}&payType=qr&requestId=req-dup-1&responseTime=1764000000000&resultCode=0&transId=99887766",
        momo_access_key(),
        amount,
        order_id,
        momo_partner_code()
    );
    let signature = hmac_sign(&raw, &momo_secret_key());

    json!({
        "partnerCode": momo_partner_code(),
        "orderId": order_id,
        "requestId": "req-dup-1",
        "amount": amount,
        "orderInfo": "Deposit",
        "orderType": "momo_wallet",
        "transId": 99887766,
        "resultCode": "0",
        "message": "Successful.",
        "payType": "qr",
        "responseTime": 1764000000000i64,
        "extraData": "true",
        "signature": signature
    })
}

#[tokio::test]
#[ignore]
async fn test_duplicate_deposit_callback_credits_once() {
    let client = Client::new();
    let order_id = seeded_deposit_order_id();

    // Locate the seeded pending deposit payment
    let response = client
        .get(format!("{}/payments/transaction/{}", BASE_URL, order_id))
        .header("Authorization", format!("Bearer {}", staff_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let payment: Value = response.json().await.expect("Failed to parse payment");
    assert_eq!(payment["status"], "PENDING");
    let booking_id = payment["booking_id"].as_str().expect("No booking id").to_string();
    let amount = payment["amount"]
        .as_str()
        .expect("No amount")
        .parse::<f64>()
        .expect("Numeric amount") as i64;

    let callback = deposit_callback(&order_id, amount);

    // First delivery settles the deposit
    let response = client
        .post(format!("{}/payments/momo/callback", BASE_URL))
        .json(&callback)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    // Identical second delivery must be accepted and change nothing
    let response = client
        .post(format!("{}/payments/momo/callback", BASE_URL))
        .json(&callback)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 204);

    let response = client
        .get(format!("{}/bookings/{}", BASE_URL, booking_id))
        .header("Authorization", format!("Bearer {}", staff_token()))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let booking: Value = response.json().await.expect("Failed to parse booking");
    let deposit_paid = booking["deposit_paid"]
        .as_str()
        .expect("No deposit_paid")
        .parse::<f64>()
        .expect("Numeric deposit_paid") as i64;

    // Credited exactly once, not doubled by the duplicate
    assert_eq!(deposit_paid, amount);
    assert_eq!(booking["payment_status"], "PARTIALLY_PAID");

    let response = client
        .get(format!("{}/payments/transaction/{}", BASE_URL, order_id))
        .header("Authorization", format!("Bearer {}", staff_token()))
        .send()
        .await
        .expect("Failed to send request");
    let payment: Value = response.json().await.expect("Failed to parse payment");
    assert_eq!(payment["status"], "PARTIALLY_PAID");
    assert!(payment["paid_at"].is_string());
}

#[tokio::test]
#[ignore]
async fn test_momo_callback_rejects_bad_signature() {
    let client = Client::new();

    let response = client
        .post(format!("{}/payments/momo/callback", BASE_URL))
        .json(&json!({
            "partnerCode": "MOMOTEST",
            "orderId": "order-1",
            "requestId": "req-1",
            "amount": 100000,
            "orderInfo": "EV Rental deposit",
            "orderType": "momo_wallet",
            "transId": 123456789,
            "resultCode": "0",
            "message": "Successful.",
            "payType": "qr",
            "responseTime": 1735000000000i64,
            "extraData": "true",
            "signature": "deadbeef"
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), 400);
}

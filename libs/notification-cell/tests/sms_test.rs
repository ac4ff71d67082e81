use chrono::NaiveDate;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::{BookingConfirmation, SmsDispatcher};
use shared_utils::test_utils::TestConfig;

const TOKEN: &str = "sms-test-token";

async fn dispatcher_for(server: &MockServer) -> SmsDispatcher {
    let state = TestConfig::default()
        .sms(&format!("{}/api/v3/sms/send", server.uri()), TOKEN)
        .to_state();
    SmsDispatcher::new(&state)
}

fn confirmation() -> BookingConfirmation {
    BookingConfirmation {
        appointment_id: Uuid::new_v4(),
        patient_name: "Nimal Perera".to_string(),
        doctor_name: "Dr. Kavinda Silva".to_string(),
        date: NaiveDate::from_ymd_opt(2026, 10, 23).unwrap(),
        time: "10:00".to_string(),
        room: "Room 1".to_string(),
        consult_fee: Some(4000),
        queue_position: 1,
    }
}

#[tokio::test]
async fn successful_send_posts_normalized_recipient() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/v3/sms/send"))
        .and(header("authorization", format!("Bearer {}", TOKEN).as_str()))
        .and(body_partial_json(json!({
            "recipient": "94771234567",
            "sender_id": "TextLKDemo",
            "type": "plain"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(1)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).await;
    assert!(dispatcher.send_booking_confirmation("077 123 4567", &confirmation()).await);
}

#[tokio::test]
async fn gateway_error_status_is_soft_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "Insufficient credit"
        })))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).await;
    assert!(!dispatcher.send("0771234567", "hello").await);
}

#[tokio::test]
async fn http_failure_is_soft_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("gateway down"))
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).await;
    assert!(!dispatcher.send("0771234567", "hello").await);
}

#[tokio::test]
async fn unreachable_gateway_is_soft_failure() {
    let server = MockServer::start().await;
    let dispatcher = dispatcher_for(&server).await;
    drop(server);

    assert!(!dispatcher.send("0771234567", "hello").await);
}

#[tokio::test]
async fn unconfigured_gateway_sends_nothing() {
    let state = TestConfig::default().to_state();
    let dispatcher = SmsDispatcher::new(&state);

    assert!(!dispatcher.send("0771234567", "hello").await);
}

#[tokio::test]
async fn recipient_without_digits_is_rejected_locally() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "success" })))
        .expect(0)
        .mount(&server)
        .await;

    let dispatcher = dispatcher_for(&server).await;
    assert!(!dispatcher.send("n/a", "hello").await);
}

use axum::{
    extract::{Extension, State},
    Json,
};
use assert_matches::assert_matches;
use serde_json::{json, Value};
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::handlers::{create_slots, delete_slots, list_slots};
use doctor_cell::models::{CreateSlotsRequest, DeleteSlotsRequest};
use doctor_cell::SlotService;
use shared_models::extract::{AppJson, AppPath};
use shared_models::{auth::User, error::AppError};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig, TestUser};

fn admin() -> Extension<User> {
    Extension(TestUser::admin("admin@mindguard.lk").to_user())
}

fn session(date: &str, start: &str, count: u32, duration: u32) -> CreateSlotsRequest {
    CreateSlotsRequest {
        date: Some(date.to_string()),
        start_time: Some(start.to_string()),
        count: Some(count),
        duration: Some(duration),
        room: None,
    }
}

async fn mount_doctor_exists(server: &MockServer, doctor_id: Uuid) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": doctor_id }])))
        .mount(server)
        .await;
}

#[tokio::test]
async fn session_inserts_consecutive_slots_and_skips_duplicates() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();
    let doctor_id = Uuid::new_v4();

    mount_doctor_exists(&server, doctor_id).await;

    // One of the three times already existed, so only two rows come back.
    Mock::given(method("POST"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("on_conflict", "doctor_id,date,time"))
        .and(body_partial_json(json!([
            { "date": "2026-10-21", "time": "09:00", "room": "Room 1", "is_booked": false },
            { "date": "2026-10-21", "time": "09:30" },
            { "date": "2026-10-21", "time": "10:00" }
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            { "id": Uuid::new_v4() },
            { "id": Uuid::new_v4() }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = create_slots(
        State(state),
        admin(),
        AppPath(doctor_id),
        AppJson(session("2026-10-21T00:00:00.000Z", "09:00", 3, 30)),
    )
    .await
    .unwrap();

    assert_eq!(body["created"], 2);
    assert_eq!(body["requested"], 3);

    let insert = server
        .received_requests()
        .await
        .unwrap()
        .into_iter()
        .find(|r| r.method.as_str() == "POST")
        .unwrap();
    let prefer = insert.headers.get("Prefer").unwrap().to_str().unwrap().to_string();
    assert!(prefer.contains("resolution=ignore-duplicates"));
}

#[tokio::test]
async fn session_rejects_bad_input_before_touching_the_database() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();

    for request in [
        session("2026-10-21", "09:00", 0, 30),
        session("2026-10-21", "09:00", 3, 0),
        session("2026-10-21", "9 am", 3, 30),
        session("next tuesday", "09:00", 3, 30),
        CreateSlotsRequest::default(),
    ] {
        let result = create_slots(State(state.clone()), admin(), AppPath(Uuid::new_v4()), AppJson(request)).await;
        assert_matches!(result, Err(AppError::ValidationError(_)));
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn session_for_unknown_doctor_is_not_found() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = create_slots(
        State(state),
        admin(),
        AppPath(Uuid::new_v4()),
        AppJson(session("2026-10-21", "09:00", 3, 30)),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn slot_routes_require_admin() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();
    let doctor_id = Uuid::new_v4();
    let doctor = TestUser::doctor("amaya@mindguard.lk", &doctor_id.to_string()).to_user();

    let result = list_slots(State(state), Extension(doctor), AppPath(doctor_id)).await;

    assert_matches!(result, Err(AppError::Forbidden(_)));
}

#[tokio::test]
async fn deleting_a_date_cancels_appointments_on_booked_slots() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();
    let doctor_id = Uuid::new_v4();
    let booked_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("is_booked", "eq.true"))
        .and(query_param("date", "eq.2026-10-21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&booked_id.to_string(), &doctor_id.to_string(), "2026-10-21", "09:00", true)
        ])))
        .mount(&server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("time_slot_id", format!("in.({})", booked_id)))
        .and(body_partial_json(json!({ "status": "CANCELLED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "id": Uuid::new_v4() }])))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2026-10-21"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": booked_id },
            { "id": Uuid::new_v4() },
            { "id": Uuid::new_v4() }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = delete_slots(
        State(state),
        admin(),
        AppPath(doctor_id),
        AppJson(DeleteSlotsRequest { slot_id: None, date: Some("2026-10-21".to_string()) }),
    )
    .await
    .unwrap();

    assert_eq!(body["deleted"], 3);
    assert_eq!(body["cancelledAppointments"], 1);
}

#[tokio::test]
async fn deleting_a_missing_slot_is_not_found() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(0)
        .mount(&server)
        .await;

    let result = delete_slots(
        State(state),
        admin(),
        AppPath(Uuid::new_v4()),
        AppJson(DeleteSlotsRequest { slot_id: Some(Uuid::new_v4()), date: None }),
    )
    .await;

    assert_matches!(result, Err(AppError::NotFound(_)));
}

#[tokio::test]
async fn deleting_without_selector_is_rejected() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();

    let result = delete_slots(
        State(state),
        admin(),
        AppPath(Uuid::new_v4()),
        AppJson(DeleteSlotsRequest::default()),
    )
    .await;

    assert_matches!(result, Err(AppError::ValidationError(_)));
}

#[tokio::test]
async fn session_longer_than_a_day_is_rejected_before_generating_labels() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();

    for request in [
        session("2026-10-21", "09:00", 4_000_000_000, 30),
        session("2026-10-21", "00:00", 49, 30),
        session("2026-10-21", "08:00", 2, 1439),
    ] {
        let result = create_slots(State(state.clone()), admin(), AppPath(Uuid::new_v4()), AppJson(request)).await;
        assert_matches!(result, Err(AppError::ValidationError(msg)) if msg.contains("does not fit in one day"));
    }

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn full_day_session_is_accepted() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();
    let doctor_id = Uuid::new_v4();

    mount_doctor_exists(&server, doctor_id).await;

    let ids: Vec<Value> = (0..48).map(|_| json!({ "id": Uuid::new_v4() })).collect();
    Mock::given(method("POST"))
        .and(path("/rest/v1/time_slots"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!(ids)))
        .expect(1)
        .mount(&server)
        .await;

    let Json(body) = create_slots(
        State(state),
        admin(),
        AppPath(doctor_id),
        AppJson(session("2026-10-21", "00:00", 48, 30)),
    )
    .await
    .unwrap();

    assert_eq!(body["created"], 48);
}

#[tokio::test]
async fn next_unbooked_slot_asks_for_the_earliest_open_time() {
    let server = MockServer::start().await;
    let state = TestConfig::with_supabase(&server.uri()).to_state();
    let doctor_id = Uuid::new_v4();
    let slot_id = Uuid::new_v4().to_string();

    Mock::given(method("GET"))
        .and(path("/rest/v1/time_slots"))
        .and(query_param("doctor_id", format!("eq.{}", doctor_id)))
        .and(query_param("date", "eq.2026-10-21"))
        .and(query_param("is_booked", "eq.false"))
        .and(query_param("order", "time.asc"))
        .and(query_param("limit", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::slot_response(&slot_id, &doctor_id.to_string(), "2026-10-21", "09:20", false)
        ])))
        .mount(&server)
        .await;

    let date = chrono::NaiveDate::from_ymd_opt(2026, 10, 21).unwrap();
    let slot = SlotService::new(&state).next_unbooked_slot(doctor_id, date).await.unwrap().unwrap();

    assert_eq!(slot.time, "09:20");
    assert!(!slot.is_booked);
}

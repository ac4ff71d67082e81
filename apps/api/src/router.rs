use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::router::{admin_appointment_routes, public_appointment_routes, staff_appointment_routes};
use doctor_cell::router::{admin_doctor_routes, doctor_routes};
use security_cell::router::credential_routes;
use shared_database::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let admin = Router::new()
        .merge(admin_doctor_routes(state.clone()))
        .merge(admin_appointment_routes(state.clone()))
        .merge(credential_routes(state.clone()));

    Router::new()
        .route("/", get(|| async { "MindGuard clinic API is running!" }))
        .merge(doctor_routes(state.clone()))
        .merge(public_appointment_routes(state.clone()))
        .merge(staff_appointment_routes(state))
        .nest("/admin", admin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::{to_bytes, Body},
        http::{
            header::{AUTHORIZATION, CONTENT_TYPE},
            Request, StatusCode,
        },
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use shared_utils::test_utils::{JwtTestUtils, TestConfig, TestUser};

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn send_json(verb: &str, uri: &str, body: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder()
            .method(verb)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    #[tokio::test]
    async fn public_doctor_listing_needs_no_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/doctors"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let app = create_router(TestConfig::with_supabase(&server.uri()).to_state());
        let (status, body) = call(app, get("/doctors", None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
    }

    #[tokio::test]
    async fn admin_routes_reject_missing_and_forged_tokens() {
        let config = TestConfig::default();
        let app = create_router(config.to_state());

        let (status, body) = call(app.clone(), get("/admin/appointments", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert!(body["error"].is_string());

        let forged = JwtTestUtils::create_invalid_signature_token(&TestUser::admin("admin@mindguard.lk"));
        let (status, _) = call(app.clone(), get("/admin/appointments", Some(&forged))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let expired = JwtTestUtils::create_expired_token(&TestUser::admin("admin@mindguard.lk"), &config.jwt_secret);
        let (status, _) = call(app, get("/admin/appointments", Some(&expired))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn doctor_token_cannot_reach_admin_routes() {
        let config = TestConfig::default();
        let app = create_router(config.to_state());
        let doctor = TestUser::doctor("kavinda@mindguard.lk", "4f1d3c1e-6d55-4b7e-9f0e-1f9d7a0f2b11");
        let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

        let (status, body) = call(app, get("/admin/doctors", Some(&token))).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Administrator access required");
    }

    #[tokio::test]
    async fn admin_token_lists_appointments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/appointments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let config = TestConfig::with_supabase(&server.uri());
        let token = JwtTestUtils::create_test_token(&TestUser::admin("admin@mindguard.lk"), &config.jwt_secret, None);
        let app = create_router(config.to_state());

        let (status, body) = call(app, get("/admin/appointments", Some(&token))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["appointments"], json!([]));
    }

    #[tokio::test]
    async fn database_failures_surface_as_generic_500() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream connect error"))
            .mount(&server)
            .await;

        let app = create_router(TestConfig::with_supabase(&server.uri()).to_state());
        let (status, body) = call(app, get("/doctors", None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Internal server error");
    }

    #[tokio::test]
    async fn malformed_booking_bodies_get_json_bad_request() {
        let server = MockServer::start().await;
        let app = create_router(TestConfig::with_supabase(&server.uri()).to_state());

        for body in [r#"{"doctorId": 5}"#, "{not json"] {
            let (status, body) = call(app.clone(), send_json("POST", "/appointments", body, None)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(body["error"].is_string());
        }

        let request = Request::builder()
            .method("POST")
            .uri("/appointments")
            .body(Body::from(r#"{"doctorId": "x"}"#))
            .unwrap();
        let (status, body) = call(app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn bad_path_and_query_values_get_json_bad_request() {
        let config = TestConfig::default();
        let token = JwtTestUtils::create_test_token(&TestUser::admin("admin@mindguard.lk"), &config.jwt_secret, None);
        let app = create_router(config.to_state());

        let (status, body) = call(app.clone(), get("/admin/doctors/not-a-uuid/slots", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(app.clone(), get("/session-results?appointmentId=abc", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, body) = call(
            app,
            send_json("PATCH", "/admin/appointments", r#"{"id": "abc", "paid": "yes"}"#, Some(&token)),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }
}

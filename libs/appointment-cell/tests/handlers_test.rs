// Handler-level tests: authorization and error mapping, with wiremock
// standing in for the store.
use axum::extract::{Extension, Path, State};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path as url_path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::handlers;
use appointment_cell::models::*;
use shared_models::{auth::User, error::AppError};
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

fn auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

fn user_extension(test_user: &TestUser) -> Extension<User> {
    Extension(test_user.to_user())
}

async fn mount_appointment_lookup(mock_server: &MockServer, row: serde_json::Value) {
    Mock::given(method("GET"))
        .and(url_path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(mock_server)
        .await;
}

fn scheduled_row(appointment_id: Uuid, client_id: &str, master_id: &str) -> serde_json::Value {
    MockStoreResponses::appointment_row(
        &appointment_id.to_string(),
        client_id,
        master_id,
        &Uuid::new_v4().to_string(),
        "2024-06-10",
        "10:00:00",
        "10:30:00",
        500.0,
        "scheduled",
    )
}

#[tokio::test]
async fn unrelated_client_cannot_cancel() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let stranger = TestUser::client("stranger@example.com");
    let token = JwtTestUtils::create_test_token(&stranger, &test_config.jwt_secret, Some(24));

    let appointment_id = Uuid::new_v4();
    mount_appointment_lookup(
        &mock_server,
        scheduled_row(
            appointment_id,
            &Uuid::new_v4().to_string(),
            &Uuid::new_v4().to_string(),
        ),
    )
    .await;

    let result = handlers::cancel_appointment(
        State(state),
        Path(appointment_id),
        auth_header(&token),
        user_extension(&stranger),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn owning_client_can_cancel() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let client = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&client, &test_config.jwt_secret, Some(24));

    let appointment_id = Uuid::new_v4();
    let master_id = Uuid::new_v4();
    mount_appointment_lookup(
        &mock_server,
        scheduled_row(appointment_id, &client.id, &master_id.to_string()),
    )
    .await;

    let mut cancelled = scheduled_row(appointment_id, &client.id, &master_id.to_string());
    cancelled["status"] = json!("cancelled");
    Mock::given(method("PATCH"))
        .and(url_path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(url_path("/rest/v1/master_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::schedule_slot_row(
                &master_id.to_string(),
                "2024-06-10",
                "10:00:00",
                "10:30:00",
                true
            )
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::cancel_appointment(
        State(state),
        Path(appointment_id),
        auth_header(&token),
        user_extension(&client),
    )
    .await
    .expect("owning client should be able to cancel");

    assert_eq!(result.0["message"], "Appointment cancelled successfully");
}

#[tokio::test]
async fn client_cannot_complete_even_their_own_appointment() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let client = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&client, &test_config.jwt_secret, Some(24));

    let appointment_id = Uuid::new_v4();
    mount_appointment_lookup(
        &mock_server,
        scheduled_row(appointment_id, &client.id, &Uuid::new_v4().to_string()),
    )
    .await;

    let result = handlers::complete_appointment(
        State(state),
        Path(appointment_id),
        auth_header(&token),
        user_extension(&client),
        axum::Json(CompleteAppointmentRequest { notes: None }),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn assigned_master_can_complete_with_notes() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let master = TestUser::master("master@example.com");
    let token = JwtTestUtils::create_test_token(&master, &test_config.jwt_secret, Some(24));

    let appointment_id = Uuid::new_v4();
    mount_appointment_lookup(
        &mock_server,
        scheduled_row(appointment_id, &Uuid::new_v4().to_string(), &master.id),
    )
    .await;

    let mut completed = scheduled_row(appointment_id, &Uuid::new_v4().to_string(), &master.id);
    completed["status"] = json!("completed");
    completed["notes"] = json!("Client asked for a fade");
    Mock::given(method("PATCH"))
        .and(url_path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([completed])))
        .mount(&mock_server)
        .await;

    let result = handlers::complete_appointment(
        State(state),
        Path(appointment_id),
        auth_header(&token),
        user_extension(&master),
        axum::Json(CompleteAppointmentRequest {
            notes: Some("Client asked for a fade".to_string()),
        }),
    )
    .await
    .expect("assigned master should be able to complete");

    assert_eq!(result.0["appointment"]["status"], "completed");
}

#[tokio::test]
async fn admin_listing_is_admin_only() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let client = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&client, &test_config.jwt_secret, Some(24));

    let result = handlers::get_all_appointments(
        State(state),
        auth_header(&token),
        user_extension(&client),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn administrative_update_is_admin_only() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let master = TestUser::master("master@example.com");
    let token = JwtTestUtils::create_test_token(&master, &test_config.jwt_secret, Some(24));

    let result = handlers::update_appointment(
        State(state),
        Path(Uuid::new_v4()),
        auth_header(&token),
        user_extension(&master),
        axum::Json(UpdateAppointmentRequest::default()),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn booking_maps_slot_miss_to_bad_request() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let client = TestUser::client("client@example.com");
    let token = JwtTestUtils::create_test_token(&client, &test_config.jwt_secret, Some(24));
    let service_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(url_path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::service_row(&service_id.to_string(), 500.0, 30)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(url_path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(url_path("/rest/v1/master_schedules"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let request = BookAppointmentRequest {
        master_id: Uuid::new_v4(),
        service_id,
        appointment_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
        start_time: chrono::NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
    };

    let result = handlers::book_appointment(
        State(state),
        auth_header(&token),
        user_extension(&client),
        axum::Json(request),
    )
    .await;

    assert!(matches!(result, Err(AppError::BadRequest(_))));
}

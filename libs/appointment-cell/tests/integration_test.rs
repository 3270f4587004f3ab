// End-to-end booking scenario: a slot is booked, a second booking for the
// same slot is refused, the first is cancelled, and the slot can be booked
// again. Store state evolution is simulated with consumable mocks.
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::*;
use appointment_cell::services::booking::AppointmentBookingService;
use shared_database::SupabaseClient;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

const DATE: &str = "2024-06-10";
const START: &str = "10:00:00";
const END: &str = "10:30:00";

#[tokio::test]
async fn slot_lifecycle_book_conflict_cancel_rebook() {
    let mock_server = MockServer::start().await;

    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();
    let store = Arc::new(SupabaseClient::new(&config));

    let client1 = Uuid::new_v4();
    let client2 = Uuid::new_v4();
    let master_id = Uuid::new_v4();
    let service_id = Uuid::new_v4();
    let appointment_id = Uuid::new_v4();

    let date = NaiveDate::from_ymd_opt(2024, 6, 10).unwrap();
    let start = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

    // Service S: 30 minutes at 500
    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", service_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::service_row(&service_id.to_string(), 500.0, 30)
        ])))
        .mount(&mock_server)
        .await;

    // Duplicate check over time: empty before the first booking, occupied
    // while it stands, empty again after the cancellation
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": appointment_id }
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    // Conditional claim succeeds whenever the slot is free
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/master_schedules"))
        .and(query_param("is_available", "eq.true"))
        .and(body_partial_json(json!({ "is_available": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::schedule_slot_row(&master_id.to_string(), DATE, START, END, false)
        ])))
        .mount(&mock_server)
        .await;

    let scheduled_row = MockStoreResponses::appointment_row(
        &appointment_id.to_string(),
        &client1.to_string(),
        &master_id.to_string(),
        &service_id.to_string(),
        DATE, START, END, 500.0, "scheduled",
    );

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([scheduled_row.clone()])))
        .mount(&mock_server)
        .await;

    let mut cancelled_row = scheduled_row.clone();
    cancelled_row["status"] = json!("cancelled");
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/appointments"))
        .and(body_partial_json(json!({ "status": "cancelled" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([cancelled_row])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/master_schedules"))
        .and(body_partial_json(json!({ "is_available": true })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::schedule_slot_row(&master_id.to_string(), DATE, START, END, true)
        ])))
        .mount(&mock_server)
        .await;

    let booking = AppointmentBookingService::new(store);
    let request = BookAppointmentRequest {
        master_id,
        service_id,
        appointment_date: date,
        start_time: start,
    };

    // Client 1 books the 10:00 slot: 30 minutes at 500 ends at 10:30
    let appointment = booking
        .book_appointment(client1, request.clone(), "token")
        .await
        .expect("first booking should succeed");
    assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    assert_eq!(appointment.total_price, 500.0);
    assert_eq!(appointment.end_time, NaiveTime::from_hms_opt(10, 30, 0).unwrap());

    // Client 2 tries the same slot and is refused
    let second = booking.book_appointment(client2, request.clone(), "token").await;
    assert_matches!(second, Err(AppointmentError::Conflict));

    // Client 1 cancels; the slot is released
    let cancelled = booking
        .cancel_appointment(&appointment, "token")
        .await
        .expect("cancellation should succeed");
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    // Now client 2 can book the freed slot
    let rebooked = booking
        .book_appointment(client2, request, "token")
        .await
        .expect("rebooking a freed slot should succeed");
    assert_eq!(rebooked.status, AppointmentStatus::Scheduled);
}

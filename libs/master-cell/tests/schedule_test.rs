// Schedule slot tests: day rewrites keep booked slots, claims are
// conditional, releases tolerate missing rows.
use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use master_cell::models::*;
use master_cell::ScheduleService;
use shared_database::SupabaseClient;
use shared_utils::test_utils::{MockStoreResponses, TestConfig};

fn store_for(mock_server: &MockServer) -> Arc<SupabaseClient> {
    let test_config = TestConfig::default();
    let mut config = test_config.to_app_config();
    config.supabase_url = mock_server.uri();
    Arc::new(SupabaseClient::new(&config))
}

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn d(date: &str) -> NaiveDate {
    date.parse().unwrap()
}

#[tokio::test]
async fn creating_a_schedule_only_deletes_open_slots() {
    let mock_server = MockServer::start().await;
    let master_id = Uuid::new_v4();

    // The rewrite clears available rows only; booked slots survive
    Mock::given(method("DELETE"))
        .and(path("/rest/v1/master_schedules"))
        .and(query_param("master_id", format!("eq.{}", master_id)))
        .and(query_param("date", "eq.2024-06-10"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/master_schedules"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([
            MockStoreResponses::schedule_slot_row(
                &master_id.to_string(), "2024-06-10", "10:00:00", "10:30:00", true
            ),
            MockStoreResponses::schedule_slot_row(
                &master_id.to_string(), "2024-06-10", "10:30:00", "11:00:00", true
            ),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = ScheduleService::new(store_for(&mock_server));
    let request = CreateScheduleRequest {
        date: d("2024-06-10"),
        time_slots: vec![
            TimeSlotInput { start_time: t(10, 0), end_time: t(10, 30) },
            TimeSlotInput { start_time: t(10, 30), end_time: t(11, 0) },
        ],
    };

    let slots = service.create_schedule(master_id, request, "token").await.unwrap();

    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|slot| slot.is_available));
    assert_eq!(slots[0].start_time, t(10, 0));
}

#[tokio::test]
async fn schedule_creation_rejects_empty_and_inverted_slots() {
    let mock_server = MockServer::start().await;
    let service = ScheduleService::new(store_for(&mock_server));

    let empty = CreateScheduleRequest { date: d("2024-06-10"), time_slots: vec![] };
    assert_matches!(
        service.create_schedule(Uuid::new_v4(), empty, "token").await,
        Err(ScheduleError::ValidationError(_))
    );

    let inverted = CreateScheduleRequest {
        date: d("2024-06-10"),
        time_slots: vec![TimeSlotInput { start_time: t(11, 0), end_time: t(10, 0) }],
    };
    assert_matches!(
        service.create_schedule(Uuid::new_v4(), inverted, "token").await,
        Err(ScheduleError::ValidationError(_))
    );

    // Nothing reached the store
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn get_schedule_returns_slots_for_a_date() {
    let mock_server = MockServer::start().await;
    let master_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/master_schedules"))
        .and(query_param("master_id", format!("eq.{}", master_id)))
        .and(query_param("date", "eq.2024-06-10"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::schedule_slot_row(
                &master_id.to_string(), "2024-06-10", "10:00:00", "10:30:00", true
            )
        ])))
        .mount(&mock_server)
        .await;

    let service = ScheduleService::new(store_for(&mock_server));
    let slots = service
        .get_schedule(master_id, Some(d("2024-06-10")), None)
        .await
        .unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].start_time, t(10, 0));
    assert!(slots[0].is_available);
}

#[tokio::test]
async fn claim_reports_whether_the_flip_happened() {
    let mock_server = MockServer::start().await;
    let master_id = Uuid::new_v4();

    // The claim carries the conditional filter and flips availability off
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/master_schedules"))
        .and(query_param("master_id", format!("eq.{}", master_id)))
        .and(query_param("date", "eq.2024-06-10"))
        .and(query_param("start_time", "eq.10:00:00"))
        .and(query_param("is_available", "eq.true"))
        .and(body_partial_json(json!({ "is_available": false })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::schedule_slot_row(
                &master_id.to_string(), "2024-06-10", "10:00:00", "10:30:00", false
            )
        ])))
        .mount(&mock_server)
        .await;

    let service = ScheduleService::new(store_for(&mock_server));
    let claimed = service
        .claim_slot(master_id, d("2024-06-10"), t(10, 0), "token")
        .await
        .unwrap();
    assert!(claimed);
}

#[tokio::test]
async fn claim_misses_when_slot_is_already_taken() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/master_schedules"))
        .and(query_param("is_available", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = ScheduleService::new(store_for(&mock_server));
    let claimed = service
        .claim_slot(Uuid::new_v4(), d("2024-06-10"), t(10, 0), "token")
        .await
        .unwrap();
    assert!(!claimed);
}

#[tokio::test]
async fn release_is_a_noop_when_no_slot_row_exists() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/master_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let service = ScheduleService::new(store_for(&mock_server));
    let result = service
        .release_slot(Uuid::new_v4(), d("2024-06-10"), t(10, 0), "token")
        .await;
    assert!(result.is_ok());
}

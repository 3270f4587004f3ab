use axum::extract::{Extension, State};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use service_cell::handlers;
use service_cell::models::CreateServiceRequest;
use shared_models::{auth::User, error::AppError};
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

fn auth_header(token: &str) -> TypedHeader<Authorization<Bearer>> {
    TypedHeader(Authorization::bearer(token).unwrap())
}

fn user_extension(test_user: &TestUser) -> Extension<User> {
    Extension(test_user.to_user())
}

#[tokio::test]
async fn public_listing_returns_active_services() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("is_active", "eq.true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::service_row(&Uuid::new_v4().to_string(), 500.0, 30)
        ])))
        .mount(&mock_server)
        .await;

    let result = handlers::list_services(State(state)).await.unwrap();

    assert_eq!(result.0["services"].as_array().unwrap().len(), 1);
    assert_eq!(result.0["services"][0]["name"], "Haircut");
}

#[tokio::test]
async fn creating_a_service_requires_admin() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let master = TestUser::master("master@example.com");
    let token = JwtTestUtils::create_test_token(&master, &test_config.jwt_secret, Some(24));

    let request = CreateServiceRequest {
        name: "Beard trim".to_string(),
        description: None,
        price: 300.0,
        duration_minutes: 20,
        is_active: None,
    };

    let result = handlers::create_service(
        State(state),
        auth_header(&token),
        user_extension(&master),
        axum::Json(request),
    )
    .await;

    assert!(matches!(result, Err(AppError::Forbidden(_))));
}

#[tokio::test]
async fn creating_a_service_rejects_negative_price() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &test_config.jwt_secret, Some(24));

    let request = CreateServiceRequest {
        name: "Beard trim".to_string(),
        description: None,
        price: -10.0,
        duration_minutes: 20,
        is_active: None,
    };

    let result = handlers::create_service(
        State(state),
        auth_header(&token),
        user_extension(&admin),
        axum::Json(request),
    )
    .await;

    assert!(matches!(result, Err(AppError::ValidationError(_))));
}

#[tokio::test]
async fn deleting_a_service_deactivates_it() {
    let mock_server = MockServer::start().await;
    let test_config = TestConfig::default();
    let state = test_config.to_state_with_url(&mock_server.uri());

    let admin = TestUser::admin("admin@example.com");
    let token = JwtTestUtils::create_test_token(&admin, &test_config.jwt_secret, Some(24));
    let service_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/services"))
        .and(query_param("id", format!("eq.{}", service_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::service_row(&service_id.to_string(), 500.0, 30)
        ])))
        .mount(&mock_server)
        .await;

    // Soft delete is a PATCH, never a DELETE
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/services"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {
                "id": service_id,
                "is_active": false
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let result = handlers::delete_service(
        State(state),
        axum::extract::Path(service_id),
        auth_header(&token),
        user_extension(&admin),
    )
    .await
    .unwrap();

    assert_eq!(result.0["message"], "Service deactivated successfully");

    let requests = mock_server.received_requests().await.unwrap();
    assert!(requests.iter().all(|r| r.method.as_str() != "DELETE"));
}

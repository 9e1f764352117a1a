/// Gateway tests against a mocked backend
/// Covers URL construction, decoding and the retry policy without a real server
use std::time::Duration;
use wiremock::matchers::{method, path, query_param, query_param_is_missing};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yelp_explorer::config::Config;
use yelp_explorer::errors::{ErrorKind, GatewayError};
use yelp_explorer::gateway_client::YelpGatewayClient;
use yelp_explorer::models::PageRequest;

/// Helper function to create a gateway pointing at the mock server
fn create_test_gateway(base_url: String) -> YelpGatewayClient {
    let config = Config {
        api_base_url: base_url,
        timeout_secs: 5,
        max_retries: 2,
        retry_delay_ms: 1,
        page_size: 20,
    };
    YelpGatewayClient::new(&config).unwrap()
}

fn businesses_json(count: usize, city: &str) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| {
            serde_json::json!({
                "business_id": format!("biz-{}", i),
                "name": format!("Business {}", i),
                "city": city,
                "stars": 4.0,
                "review_count": 10 + i,
                "is_open": 1
            })
        })
        .collect();
    serde_json::Value::Array(items)
}

#[tokio::test]
async fn test_city_listing_encodes_path_and_omits_zero_skip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/businesses/city/San%20Francisco"))
        .and(query_param("limit", "20"))
        .and(query_param_is_missing("skip"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(businesses_json(2, "San Francisco")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let businesses = gateway
        .list_businesses_by_city("San Francisco", Some(PageRequest::first(20)))
        .await
        .unwrap();

    assert_eq!(businesses.len(), 2);
    assert_eq!(businesses[0].business_id, "biz-0");
    assert_eq!(businesses[1].city.as_deref(), Some("San Francisco"));
}

#[tokio::test]
async fn test_second_page_sends_skip() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/reviews/user/u-42"))
        .and(query_param("skip", "20"))
        .and(query_param("limit", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {
                "review_id": "r-1",
                "user_id": "u-42",
                "business_id": "b-1",
                "stars": 5.0,
                "useful": 3,
                "text": "Best donuts in town",
                "date": "2019-05-04T12:00:00",
                "user_name": "Homer",
                "business_name": "Lard Lad Donuts"
            }
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let reviews = gateway
        .list_reviews_by_user("u-42", Some(PageRequest::new(20, 20)))
        .await
        .unwrap();

    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].business_name.as_deref(), Some("Lard Lad Donuts"));
    assert!(reviews[0].date.is_some());
}

#[tokio::test]
async fn test_collection_endpoints_use_trailing_slash() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/tips/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"user_id": "u1", "business_id": "b1", "text": "Go early", "compliment_count": 2}
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let tips = gateway.list_tips(None).await.unwrap();
    assert_eq!(tips.len(), 1);
    assert_eq!(tips[0].compliment_count, Some(2));
}

#[tokio::test]
async fn test_server_error_is_not_retried() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/users/"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let err = gateway.list_users(None).await.unwrap_err();

    assert_eq!(
        err,
        GatewayError::ServerError {
            status: 500,
            body: "Internal Server Error".to_string()
        }
    );
}

#[tokio::test]
async fn test_non_array_payload_is_malformed() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/checkins/business/b-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"detail": "oops"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let err = gateway
        .list_checkins_by_business("b-1", None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::MalformedResponse);
}

#[tokio::test]
async fn test_timeout_is_retried_then_surfaced() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/businesses/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(businesses_json(1, "Springfield"))
                .set_delay(Duration::from_millis(500)),
        )
        .expect(3)
        .mount(&mock_server)
        .await;

    let gateway =
        create_test_gateway(mock_server.uri()).with_timeout(Duration::from_millis(100));
    let err = gateway.list_businesses(None).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Timeout);
}

#[tokio::test]
async fn test_unreachable_backend() {
    // Nothing listens on port 9 (discard) in the test environment
    let gateway = create_test_gateway("http://127.0.0.1:9".to_string());
    let err = gateway.health_check().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NetworkUnreachable);
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_health_check() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "healthy"})),
        )
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let health = gateway.health_check().await.unwrap();
    assert_eq!(health.status, "healthy");
}

#[tokio::test]
async fn test_single_lookup_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/businesses/missing"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(serde_json::json!({"detail": "Business not found"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let err = gateway.get_business("missing").await.unwrap_err();

    match err {
        GatewayError::ServerError { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("Business not found"));
        }
        other => panic!("Expected server error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_probe_reports_counts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "healthy"})),
        )
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/businesses/"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(businesses_json(5, "Phoenix")))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/v1/reviews/"))
        .and(query_param("limit", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            {"review_id": "r1"},
            {"review_id": "r2"}
        ])))
        .mount(&mock_server)
        .await;

    let gateway = create_test_gateway(mock_server.uri());
    let report = gateway.probe().await.unwrap();

    assert_eq!(report.health, "healthy");
    assert_eq!(report.business_count, 5);
    assert_eq!(report.review_count, 2);
}

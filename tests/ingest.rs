//! Integration tests for `IngestClient`.
//!
//! Each test stands up a local `wiremock` server so no real network traffic
//! is made.

use sentiment_dashboard::error::IngestError;
use sentiment_dashboard::ingest::{IngestClient, ScrapeRequest};
use serde_json::json;
use wiremock::matchers::{body_json, body_string_contains, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn analysis_body() -> serde_json::Value {
    json!({
        "page_id": "acme",
        "comments_analyzed": [
            {
                "comment_id": "c1",
                "text": "Love the new release",
                "sentiment": "positive",
                "sentiment_conf": 0.97,
                "category": "Product",
                "category_conf": 0.81,
                "created_time": "2024-02-01T12:00:00+0000"
            },
            {
                "comment_id": "c2",
                "text": "Shipping took forever",
                "sentiment": "NEGATIVE",
                "sentiment_conf": 0.88,
                "category": "Delivery",
                "category_conf": 0.65
            }
        ],
        "analytics": {
            "total_comments": 2,
            "positive_comments": 1,
            "neutral_comments": 0,
            "negative_comments": 1,
            "categories_stats": [
                {"category": "Product", "total_comments": 1, "positive_comments": 1, "neutral_comments": 0, "negative_comments": 0},
                {"category": "Delivery", "total_comments": 1, "positive_comments": 0, "neutral_comments": 0, "negative_comments": 1}
            ]
        }
    })
}

fn client(server: &MockServer) -> IngestClient {
    IngestClient::with_base_url(&server.uri()).expect("failed to build test client")
}

#[tokio::test]
async fn scrape_analyze_posts_the_request_and_decodes_the_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-analyze"))
        .and(body_json(json!({
            "graph_api_key": "token",
            "page": "acme",
            "max_comments": 50,
            "since": "2024-01-01"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
        .expect(1)
        .mount(&server)
        .await;

    let request = ScrapeRequest {
        graph_api_key: "token".into(),
        page: "acme".into(),
        max_comments: Some(50),
        since: Some("2024-01-01".into()),
        ..Default::default()
    };
    let response = client(&server).scrape_analyze(&request).await.unwrap();

    assert_eq!(response.page_id, "acme");
    assert_eq!(response.comments_analyzed.len(), 2);
    assert_eq!(response.analytics.categories_stats.len(), 2);
    assert_eq!(response.comments_analyzed[1].created_time, None);
}

#[tokio::test]
async fn analyze_csv_sends_a_multipart_upload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-csv"))
        .and(header_exists("content-type"))
        .and(body_string_contains("name=\"file\"; filename=\"comments.csv\""))
        .and(body_string_contains("name=\"batch_size\""))
        .and(body_string_contains("comment_id,text"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
        .expect(1)
        .mount(&server)
        .await;

    let bytes = b"comment_id,text\nc1,hello\n".to_vec();
    let response = client(&server).analyze_csv("comments.csv", bytes, 32).await.unwrap();
    assert_eq!(response.analytics.total_comments, 2);
}

#[tokio::test]
async fn error_status_carries_the_response_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-analyze"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid Graph API token"))
        .mount(&server)
        .await;

    let err = client(&server)
        .scrape_analyze(&ScrapeRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Rejected(ref msg) if msg == "Invalid Graph API token"));
}

#[tokio::test]
async fn error_status_without_body_uses_a_default_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/analyze-csv"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let err = client(&server)
        .analyze_csv("comments.csv", b"a\n1\n".to_vec(), 32)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Rejected(ref msg) if msg == "Failed to analyze CSV"));
}

#[tokio::test]
async fn invalid_upload_never_reaches_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(analysis_body()))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .analyze_csv("comments.txt", b"a\n".to_vec(), 32)
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::InvalidUpload(_)));
}

#[tokio::test]
async fn malformed_body_is_an_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/scrape-analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let err = client(&server)
        .scrape_analyze(&ScrapeRequest::default())
        .await
        .unwrap_err();
    assert!(matches!(err, IngestError::Http(_)));
}

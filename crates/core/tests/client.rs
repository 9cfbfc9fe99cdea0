use std::time::Duration;

use lcdaily_core::{FetchError, LeetCodeClient};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client(server: &MockServer) -> LeetCodeClient {
    LeetCodeClient::new(&server.uri(), Duration::from_secs(2), "lcdaily-test").unwrap()
}

#[tokio::test]
async fn fetches_daily_problem_payload() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "questionLink": "https://leetcode.com/problems/two-sum/",
            "date": "2024-01-02",
            "questionTitle": "Two Sum",
            "difficulty": "Easy"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let payload = client(&server).daily_problem().await.unwrap();

    assert_eq!(payload["questionTitle"], "Two Sum");
}

#[tokio::test]
async fn parses_accepted_submissions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alice/acSubmission"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "count": 2,
            "submission": [
                {"title": "Two Sum", "titleSlug": "two-sum", "timestamp": "1704153605", "statusDisplay": "Accepted", "lang": "rust"},
                {"title": "Add Two Numbers", "titleSlug": "add-two-numbers", "timestamp": "1704067200", "statusDisplay": "Accepted", "lang": "cpp"}
            ]
        })))
        .mount(&server)
        .await;

    let submissions = client(&server).accepted_submissions("alice").await.unwrap();

    let titles: Vec<_> = submissions.iter().map(|s| s.title.as_str()).collect();
    assert_eq!(titles, vec!["Two Sum", "Add Two Numbers"]);
    assert_eq!(submissions[0].timestamp.timestamp(), 1704153605);
}

#[tokio::test]
async fn missing_submission_key_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/alice/acSubmission"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"count": 0})))
        .mount(&server)
        .await;

    let submissions = client(&server).accepted_submissions("alice").await.unwrap();

    assert!(submissions.is_empty());
}

#[tokio::test]
async fn non_success_status_is_fetch_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let result = client(&server).profile("ghost").await;

    match result {
        Err(FetchError::Status { status, .. }) => assert_eq!(status.as_u16(), 404),
        other => panic!("unexpected result: {other:?}"),
    }
}

#[tokio::test]
async fn invalid_body_is_decode_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
        .mount(&server)
        .await;

    let result = client(&server).daily_problem().await;

    assert!(matches!(result, Err(FetchError::Decode { .. })));
}

#[tokio::test]
async fn slow_response_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/daily"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let client =
        LeetCodeClient::new(&server.uri(), Duration::from_millis(200), "lcdaily-test").unwrap();
    let result = client.daily_problem().await;

    assert!(matches!(result, Err(FetchError::Request { .. })));
}

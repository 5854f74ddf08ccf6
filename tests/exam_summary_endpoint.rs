//! Integration tests for POST /exam-summary
//!
//! The records service and the primary provider are both wiremock servers.

mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FOLDERS: &str = "/api/exams/student/folders";

fn folders() -> Value {
    json!({
        "folders": [
            {
                "examName": "Mid-2",
                "subjects": [
                    {
                        "subjectName": "DSA",
                        "marksObtained": 21,
                        "maxMarks": 30,
                        "scripts": [
                            { "url": "https://files.example/mid2-dsa-1.pdf" },
                            { "url": "https://files.example/mid2-dsa-2.pdf" }
                        ]
                    },
                    { "subjectName": "DBMS", "marksObtained": 25, "maxMarks": 30, "scripts": [] }
                ]
            },
            {
                "examName": "Mid-1",
                "subjects": [
                    { "subjectName": "DSA", "marksObtained": 14, "maxMarks": 30, "scripts": [] }
                ]
            }
        ]
    })
}

async fn records_server(roll_no: &str, body: Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FOLDERS))
        .and(query_param("rollNo", roll_no))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

async fn primary_answering(text: &str, expected_calls: u64) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(primary_path()))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text(text)))
        .expect(expected_calls)
        .mount(&server)
        .await;
    server
}

async fn send(app: axum::Router, body: Value) -> (StatusCode, Value) {
    let response = app.oneshot(post_json("/exam-summary", body)).await.unwrap();
    let status = response.status();
    (status, body_json(response).await)
}

#[tokio::test]
async fn test_summary_from_explicit_fields_uses_most_recent_exam() {
    let records = records_server("21CMR001", folders()).await;
    let primary = primary_answering("Solid work in Mid-2.", 1).await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some(&records.uri()))),
        json!({ "rollNo": "21CMR001", "subjectName": "dsa" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["response"], "Solid work in Mid-2.");
    assert_eq!(body["meta"]["rollNo"], "21CMR001");
    assert_eq!(body["meta"]["examName"], "Mid-2");
    assert_eq!(body["meta"]["subjectName"], "DSA");
    assert_eq!(body["meta"]["marksObtained"], 21.0);
    assert_eq!(body["meta"]["maxMarks"], 30.0);
    assert_eq!(body["meta"]["scriptCount"], 2);
    assert_eq!(body["meta"]["model"], PRIMARY_MODEL);
}

#[tokio::test]
async fn test_summary_fields_extracted_from_message() {
    let records = records_server("21CMR001", folders()).await;
    let primary = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(primary_path()))
        .and(body_string_contains("Exam: Mid-1"))
        .and(body_string_contains("Marks: 14 / 30"))
        .respond_with(ResponseTemplate::new(200).set_body_json(gemini_text("Improving.")))
        .expect(1)
        .mount(&primary)
        .await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some(&records.uri()))),
        json!({ "message": "How did roll 21CMR001 do in mid 1, subject DSA" }),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "body {}", body);
    assert_eq!(body["meta"]["examName"], "Mid-1");
}

#[tokio::test]
async fn test_missing_roll_number_is_bad_request() {
    let primary = primary_answering("unused", 0).await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some("http://127.0.0.1:9"))),
        json!({ "message": "summarise my DSA exam" }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("rollNo"));
}

#[tokio::test]
async fn test_zero_folders_is_not_found_without_generation() {
    let records = records_server("21CMR999", json!({ "folders": [] })).await;
    let primary = primary_answering("unused", 0).await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some(&records.uri()))),
        json!({ "rollNo": "21CMR999", "subjectName": "DSA" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "No exam folders found for roll number 21CMR999"
    );
}

#[tokio::test]
async fn test_unknown_exam_is_not_found() {
    let records = records_server("21CMR001", folders()).await;
    let primary = primary_answering("unused", 0).await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some(&records.uri()))),
        json!({ "rollNo": "21CMR001", "subjectName": "DSA", "examName": "End-Sem" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["message"].as_str().unwrap().contains("End-Sem"));
}

#[tokio::test]
async fn test_unknown_subject_is_not_found() {
    let records = records_server("21CMR001", folders()).await;
    let primary = primary_answering("unused", 0).await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some(&records.uri()))),
        json!({ "rollNo": "21CMR001", "subjectName": "Compiler Design" }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Subject 'Compiler Design' not found in exam 'Mid-2'"
    );
}

#[tokio::test]
async fn test_records_error_status_is_passed_through() {
    let records = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(FOLDERS))
        .respond_with(
            ResponseTemplate::new(403).set_body_json(json!({ "message": "Access denied for this roll number" })),
        )
        .mount(&records)
        .await;
    let primary = primary_answering("unused", 0).await;

    let (status, body) = send(
        app(config(Some(&primary.uri()), None, Some(&records.uri()))),
        json!({ "rollNo": "21CMR001", "subjectName": "DSA" }),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Access denied for this roll number");
}

#[tokio::test]
async fn test_records_origin_derived_from_host_header_only() {
    let records = records_server("21CMR001", folders()).await;
    let primary = primary_answering("From the Host header.", 1).await;

    let mut request = post_json(
        "/exam-summary",
        json!({ "rollNo": "21CMR001", "subjectName": "DBMS" }),
    );
    request.headers_mut().insert(
        "host",
        records.address().to_string().parse().unwrap(),
    );
    request
        .headers_mut()
        .insert("x-forwarded-host", "127.0.0.1:9".parse().unwrap());

    let response = app(config(Some(&primary.uri()), None, None))
        .oneshot(request)
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["meta"]["subjectName"], "DBMS");
    assert_eq!(body["meta"]["scriptCount"], 0);
}

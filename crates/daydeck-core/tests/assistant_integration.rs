//! Integration tests for the Gemini meeting assistant against a mock server.

use std::time::Duration;

use chrono::Utc;
use daydeck_core::{
    AssistantError, CoreError, GeminiAssistant, LocalStore, MeetingAssistant, MeetingRequest,
    Planner,
};
use mockito::Matcher;

const PATH: &str = "/v1beta/models/gemini-test:generateContent";

fn candidate(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

fn assistant(url: &str, key: &str) -> GeminiAssistant {
    GeminiAssistant::new(url, "gemini-test", key, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn suggestion_is_parsed_and_becomes_an_event() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", PATH)
        .match_header("x-goog-api-key", "secret")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "generationConfig": { "responseMimeType": "application/json" }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate(
            r#"{"suggestedDate":"2030-04-02","suggestedTime":"10:30","reasoning":"Tuesday mornings are free."}"#,
        ))
        .create_async()
        .await;

    let suggestion = assistant(&server.url(), "secret")
        .suggest(&MeetingRequest::new("Plan Q2 roadmap with Ana and Bo"))
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(suggestion.suggested_date, "2030-04-02");
    assert_eq!(suggestion.suggested_time, "10:30");

    let store = LocalStore::in_memory();
    let mut planner = Planner::new(&store);
    let draft = suggestion.to_event_draft("Q2 roadmap").unwrap();
    let event = planner.save_event(draft, &Utc, None).unwrap();
    assert_eq!(event.start.to_rfc3339(), "2030-04-02T10:30:00+00:00");
    assert_eq!((event.end - event.start).num_minutes(), 60);
}

#[tokio::test]
async fn api_errors_surface_as_one_message() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error":{"code":400,"message":"API key not valid."}}"#)
        .create_async()
        .await;

    let err = assistant(&server.url(), "bad")
        .suggest(&MeetingRequest::new("anything"))
        .await
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("Failed to get suggestion:"), "{message}");
    assert!(message.contains("API key not valid."), "{message}");
}

#[tokio::test]
async fn malformed_slot_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", PATH)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(candidate(
            r#"{"suggestedDate":"next Tuesday","suggestedTime":"10:30","reasoning":"?"}"#,
        ))
        .create_async()
        .await;

    let err = assistant(&server.url(), "secret")
        .suggest(&MeetingRequest::new("sync"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Assistant(AssistantError::MalformedResponse(_))
    ));
}

#[tokio::test]
async fn blank_notes_never_reach_the_server() {
    let mut server = mockito::Server::new_async().await;
    let mock = server.mock("POST", PATH).expect(0).create_async().await;

    let err = assistant(&server.url(), "secret")
        .suggest(&MeetingRequest::new("\n\t "))
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Please enter some notes to analyze.");
    mock.assert_async().await;
}

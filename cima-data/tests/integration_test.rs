//! Integration tests for the CIMA data layer
//!
//! These tests verify end-to-end functionality including:
//! - Settings file to store wiring (Airtable)
//! - Backend and Airtable sources behind the stores
//! - Calendar and highlights derived from HTTP data

use cima_data::app::{self, AppState};
use cima_data::commands;
use cima_data::config::SETTINGS_FILE;
use cima_data::models::DataType;
use cima_data::services::settings::{AppSettings, SourceKind};
use cima_data::services::LoadStatus;
use chrono::NaiveDate;
use tempfile::TempDir;

const DOCUMENTS: &str = r#"[
    {"id": "r1", "name": "Copper outlook", "summary": "Supply", "type": "report",
     "creation_time": "2024-01-10T08:00:00", "last_modified": "", "authors": ["Ada Lovelace"]},
    {"id": "r2", "name": "Nickel review", "summary": "", "type": "report",
     "creation_time": "2024-03-02T08:00:00", "last_modified": "", "authors": []},
    {"id": "r3", "name": "Zinc review", "summary": "", "type": "report",
     "creation_time": "2024-02-02T08:00:00", "last_modified": "", "authors": []},
    {"id": "r4", "name": "Tin review", "summary": "", "type": "report",
     "creation_time": "2023-11-02T08:00:00", "last_modified": "", "authors": []},
    {"id": "f1", "name": "Lithium flash", "summary": "SUPPLY shock", "type": "flash",
     "creation_time": "2024-02-20T08:00:00", "last_modified": "", "authors": []}
]"#;

const EVENTS: &str = r#"[
    {"id": "e1", "name": "B", "summary": "", "status": "confirmed", "tags": [],
     "date": "2024-03-01T10:00:00", "location_url": null, "registration_url": null},
    {"id": "e2", "name": "A", "summary": "", "status": "confirmed", "tags": [],
     "date": "2024-03-01T09:00:00", "location_url": null, "registration_url": null},
    {"id": "e3", "name": "Later", "summary": "", "tags": ["macro"],
     "date": "2024-04-02", "location_url": null, "registration_url": null}
]"#;

/// Helper to write a settings file into a fresh data directory
async fn create_data_dir(settings: serde_json::Value) -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    tokio::fs::write(
        temp_dir.path().join(SETTINGS_FILE),
        serde_json::to_string_pretty(&settings).unwrap(),
    )
    .await
    .unwrap();
    temp_dir
}

/// Stores over the mock backend, built from explicit settings so that
/// `CIMA_API_URL` in the environment cannot redirect them
fn backend_state(server: &mockito::Server) -> AppState {
    let settings = AppSettings {
        source: SourceKind::Backend,
        backend_url: server.url(),
        request_timeout_secs: 5,
        ..AppSettings::default()
    };
    AppState::new(settings).unwrap()
}

#[tokio::test]
async fn test_backend_deals_filter_and_highlights() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/data")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(DOCUMENTS)
        .expect(1)
        .create_async()
        .await;
    let state = backend_state(&server);

    let supply = commands::list_deals(&state, Some("supply".to_string()), vec![])
        .await
        .unwrap();
    let ids: Vec<&str> = supply.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["r1", "f1"]);

    let flashes = commands::list_deals(&state, None, vec!["flash".to_string()])
        .await
        .unwrap();
    assert!(flashes.iter().all(|d| d.kind == DataType::Flash));

    let highlights = commands::get_highlights(&state).await.unwrap();
    let reports: Vec<&str> = highlights.report.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(reports, vec!["r2", "r3", "r1"]);
    assert_eq!(highlights.flash.len(), 1);
    assert!(highlights.fundamentals.is_empty());

    // The collection is fetched once and reused by every view
    mock.assert_async().await;
}

#[tokio::test]
async fn test_backend_calendar_grid() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/events")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(EVENTS)
        .create_async()
        .await;
    let state = backend_state(&server);

    let view = commands::get_calendar(&state, Some("2024-03".to_string()))
        .await
        .unwrap();

    assert_eq!(view.cells.len(), 42);
    assert_eq!(view.cells[0].date, NaiveDate::from_ymd_opt(2024, 2, 25).unwrap());
    assert_eq!(view.cells[41].date, NaiveDate::from_ymd_opt(2024, 4, 6).unwrap());

    let first = view.cells.iter().find(|c| c.ymd == "2024-03-01").unwrap();
    let names: Vec<&str> = first.events.iter().map(|e| e.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);

    // Filler days from the next month still carry their events
    let filler = view.cells.iter().find(|c| c.ymd == "2024-04-02").unwrap();
    assert!(!filler.in_month);
    assert_eq!(filler.events.len(), 1);
}

#[tokio::test]
async fn test_backend_failure_sets_error_state() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/events")
        .with_status(500)
        .create_async()
        .await;
    let state = backend_state(&server);

    state.events.load().await;

    let events = state.events.state();
    assert_eq!(events.status, LoadStatus::Error);
    assert_eq!(events.items, Some(vec![]));
    assert!(!events.error_message.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_airtable_source_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/appTest/tblPeople")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"records": [
                {"id": "p1", "fields": {"name": "Ada",
                    "photo": [{"url": "https://cdn.example.com/ada.png"}]}},
                {"id": "p2", "fields": {"name": "Alan"}}
            ]}"#,
        )
        .create_async()
        .await;
    let mailing = server
        .mock("POST", "/appTest/tblMailing")
        .match_body(mockito::Matcher::Json(
            serde_json::json!({"fields": {"email": "grace@example.com"}}),
        ))
        .with_status(200)
        .with_body("{}")
        .create_async()
        .await;

    let temp = create_data_dir(serde_json::json!({
        "source": "backend",
        "airtable": {
            "api_base": server.url(),
            "base_id": "appTest",
            "token": "pat-test",
            "people_table": "tblPeople",
            "mailing_table": "tblMailing"
        }
    }))
    .await;
    let state = app::setup(temp.path(), Some(SourceKind::Airtable))
        .await
        .unwrap();

    let people = commands::list_people(&state).await.unwrap();
    assert_eq!(people.len(), 2);
    assert_eq!(
        people[0].attachment_url.as_deref(),
        Some("https://cdn.example.com/ada.png")
    );
    assert_eq!(state.people.find("p2").map(|p| p.name), Some("Alan".to_string()));

    commands::subscribe(&state, " grace@example.com ".to_string())
        .await
        .unwrap();
    mailing.assert_async().await;

    assert!(commands::subscribe(&state, "grace".to_string()).await.is_err());
}

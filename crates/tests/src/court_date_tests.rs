use axum::http::StatusCode;
use chrono::{Duration, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common;

#[tokio::test]
async fn scheduled_at_must_be_in_the_future() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 0).await;

    let (status, body) = t
        .post(
            "/api/court-dates",
            json!({
                "client_id": client,
                "court_name": "District Court",
                "scheduled_at": (Utc::now() - Duration::hours(1)).to_rfc3339(),
            }),
            Some(&admin),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["field_errors"]["scheduled_at"].is_string());
}

#[tokio::test]
async fn upcoming_filter_and_partial_update() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 0).await;

    for days in [3, 40] {
        let (status, _) = t
            .post(
                "/api/court-dates",
                json!({
                    "client_id": client,
                    "court_name": "County Court",
                    "hearing_type": "Arraignment",
                    "scheduled_at": (Utc::now() + Duration::days(days)).to_rfc3339(),
                }),
                Some(&admin),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (_, soon) = t.get("/api/court-dates?upcoming_days=7", Some(&admin)).await;
    assert_eq!(soon["meta"]["total"], 1);
    let id = soon["data"][0]["id"].as_str().unwrap().to_string();

    let (status, updated) = t
        .put(&format!("/api/court-dates/{id}"), json!({ "location": "Courtroom 4B" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["location"], "Courtroom 4B");
    assert_eq!(updated["hearing_type"], "Arraignment");

    let (status, _) = t.get("/api/court-dates?upcoming_days=400", Some(&admin)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn marking_missed_opens_alert() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let client = t.client(&admin, None, 0).await;

    let (_, court_date) = t
        .post(
            "/api/court-dates",
            json!({
                "client_id": client,
                "court_name": "District Court",
                "scheduled_at": (Utc::now() + Duration::days(1)).to_rfc3339(),
            }),
            Some(&admin),
        )
        .await;
    let id = court_date["id"].as_str().unwrap();

    let (status, missed) = t
        .patch(&format!("/api/court-dates/{id}/status"), json!({ "status": "missed" }), Some(&admin))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(missed["status"], "missed");

    let (_, alerts) = t.get(&format!("/api/clients/{client}/alerts"), Some(&admin)).await;
    assert_eq!(alerts["meta"]["total"], 1);
    assert_eq!(alerts["data"][0]["alert_type"], "court_date");
}

#[tokio::test]
async fn due_offsets_are_recorded_once_and_the_nearest_is_announced() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, client_token, client) = t.linked_client(&admin, "hearing@example.com").await;

    t.post(
        "/api/court-dates",
        json!({
            "client_id": client,
            "court_name": "District Court",
            "scheduled_at": (Utc::now() + Duration::days(2)).to_rfc3339(),
        }),
        Some(&admin),
    )
    .await;

    let (status, first) = t.post("/api/court-dates/reminders/run", json!({}), Some(&admin)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(first["court_dates_checked"], 1);
    assert_eq!(first["reminders_sent"], 1);

    let (_, second) = t.post("/api/court-dates/reminders/run", json!({}), Some(&admin)).await;
    assert_eq!(second["reminders_sent"], 0);

    // Offsets 7 and 3 were both due; only the nearest was announced.
    assert_eq!(t.count("SELECT COUNT(*) FROM court_date_reminders").await, 2);

    let (_, notes) = t.get("/api/notifications", Some(&client_token)).await;
    assert_eq!(notes["meta"]["total"], 1);
    assert_eq!(notes["data"][0]["kind"], "court_reminder");
    assert_eq!(notes["data"][0]["title"], "Court date in 3 days");
}

#[tokio::test]
async fn failed_reminder_is_retried_and_does_not_stop_the_sweep() {
    let t = common::test_app().await;
    let admin = t.admin().await;
    let (_, _, soon) = t.linked_client(&admin, "soon@example.com").await;
    let (_, _, later) = t.linked_client(&admin, "later@example.com").await;

    for (client, days) in [(&soon, 1), (&later, 2)] {
        let (status, body) = t
            .post(
                "/api/court-dates",
                json!({
                    "client_id": client,
                    "court_name": "District Court",
                    "scheduled_at": (Utc::now() + Duration::days(days)).to_rfc3339(),
                }),
                Some(&admin),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
    }

    sqlx::query(
        "ALTER TABLE notifications ADD CONSTRAINT block_tomorrow \
         CHECK (title <> 'Court date tomorrow')",
    )
    .execute(&t.pool)
    .await
    .expect("add constraint");
    let (status, first) = t.post("/api/court-dates/reminders/run", json!({}), Some(&admin)).await;
    sqlx::query("ALTER TABLE notifications DROP CONSTRAINT block_tomorrow")
        .execute(&t.pool)
        .await
        .expect("drop constraint");

    assert_eq!(status, StatusCode::OK, "{first}");
    assert_eq!(first["court_dates_checked"], 2);
    assert_eq!(first["reminders_sent"], 1);
    // Only the hearing two days out kept its offsets (7 and 3).
    assert_eq!(t.count("SELECT COUNT(*) FROM court_date_reminders").await, 2);

    let (_, second) = t.post("/api/court-dates/reminders/run", json!({}), Some(&admin)).await;
    assert_eq!(second["reminders_sent"], 1);
    assert_eq!(t.count("SELECT COUNT(*) FROM court_date_reminders").await, 5);
    assert_eq!(
        t.count("SELECT COUNT(*) FROM notifications WHERE title = 'Court date tomorrow'").await,
        1
    );
}

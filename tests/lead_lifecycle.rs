mod common;

use axum::http::StatusCode;
use serde_json::{json, Value};

use admissions_crm::models::auth::Role;

use common::TestApp;

fn activity_actions(body: &Value) -> Vec<String> {
    body["data"]
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item["action"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

#[tokio::test]
async fn test_lead_lifecycle_through_the_api() {
    let app = TestApp::new();
    let (_, admin) = app.user(Role::Admin, "admin@example.com").await;
    let (owner, owner_token) = app.user(Role::Counselor, "owner@example.com").await;
    let (_, other_token) = app.user(Role::Counselor, "other@example.com").await;

    let (status, created) = app
        .post(
            "/api/leads",
            &admin,
            json!({
                "name": "John Doe",
                "phone": "+919876543210",
                "source": "WhatsApp",
                "assignedToId": owner.id
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["data"]["lead"]["stage"], "NEW");
    let id = created["data"]["lead"]["id"].as_i64().unwrap();

    let (status, updated) = app
        .patch(&format!("/api/leads/{}/stage", id), &admin, json!({ "stage": "QUALIFIED" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["data"]["stage"], "QUALIFIED");

    let (_, visible) = app.get("/api/leads", &owner_token).await;
    assert_eq!(visible["data"]["count"], 1);
    assert_eq!(visible["data"]["leads"][0]["id"], id);

    let (_, hidden) = app.get("/api/leads", &other_token).await;
    assert_eq!(hidden["data"]["count"], 0);

    // Recién actualizado, dentro de la ventana de respuesta
    let (status, detail) = app.get(&format!("/api/leads/{}", id), &owner_token).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(detail["data"]["sla"]["status"], "ON_TIME");

    let (status, _) = app
        .post(&format!("/api/leads/{}/notes", id), &owner_token, json!({ "content": "Asked about fees" }))
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = app
        .post(
            &format!("/api/leads/{}/calls", id),
            &owner_token,
            json!({ "duration": 180, "outcome": "Interested" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, qualified) = app
        .post(
            &format!("/api/leads/{}/qualifications", id),
            &owner_token,
            json!({ "score": 82, "summary": "Budget confirmed" }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(qualified["data"]["qualification"]["category"], "Hot");
    assert_eq!(qualified["data"]["lead"]["score"], 82);

    let (_, activities) = app
        .get(&format!("/api/leads/{}/activities", id), &admin)
        .await;
    let actions = activity_actions(&activities);
    for expected in ["LEAD_CREATED", "STAGE_CHANGED", "NOTE_ADDED", "CALL_LOGGED", "LEAD_QUALIFIED"] {
        assert!(actions.iter().any(|a| a == expected), "missing {} in {:?}", expected, actions);
    }

    let (status, _) = app.get(&format!("/api/leads/{}/notes", id), &other_token).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, summary) = app.get("/api/dashboard/summary", &owner_token).await;
    assert_eq!(summary["data"]["totalLeads"], 1);
    assert_eq!(summary["data"]["byStage"]["QUALIFIED"], 1);
    assert_eq!(summary["data"]["homeRoute"], "/counselor");

    let (status, _) = app.delete(&format!("/api/leads/{}", id), &admin).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&format!("/api/leads/{}", id), &admin).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, feed) = app.get("/api/activities", &admin).await;
    let actions = activity_actions(&feed);
    assert!(actions.iter().any(|a| a == "LEAD_DELETED"));
    assert!(actions.iter().any(|a| a == "LEAD_CREATED"));
}

#[tokio::test]
async fn test_team_leader_moves_leads_within_team() {
    let app = TestApp::new();
    let (_, admin) = app.user(Role::Admin, "admin@example.com").await;
    let (leader, leader_token) = app.user(Role::TeamLeader, "tl@example.com").await;
    let (first, _) = app.user(Role::Counselor, "first@example.com").await;
    let (second, second_token) = app.user(Role::Counselor, "second@example.com").await;

    let (_, team) = app
        .post("/api/teams", &admin, json!({ "name": "East", "leaderId": leader.id }))
        .await;
    let team_id = team["data"]["id"].as_i64().unwrap();
    for member in [first.id, second.id] {
        let (status, _) = app
            .post(&format!("/api/teams/{}/members", team_id), &admin, json!({ "userId": member }))
            .await;
        assert_eq!(status, StatusCode::OK);
    }

    let mut ids = Vec::new();
    for n in 0..3 {
        let (_, created) = app
            .post(
                "/api/leads",
                &admin,
                json!({
                    "name": format!("Student {}", n),
                    "email": format!("student{}@example.com", n),
                    "assignedToId": first.id
                }),
            )
            .await;
        ids.push(created["data"]["lead"]["id"].as_i64().unwrap());
    }

    let (_, team_view) = app.get("/api/leads", &leader_token).await;
    assert_eq!(team_view["data"]["count"], 3);

    let (status, moved) = app
        .post(
            "/api/leads/reassign",
            &leader_token,
            json!({ "leadIds": ids, "assignedToId": second.id }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved["data"]["leads"].as_array().map(Vec::len), Some(3));

    let (_, now_visible) = app.get("/api/leads", &second_token).await;
    assert_eq!(now_visible["data"]["count"], 3);

    let (_, feed) = app.get("/api/activities", &leader_token).await;
    let reassigned = activity_actions(&feed)
        .into_iter()
        .filter(|a| a == "REASSIGNED")
        .count();
    assert_eq!(reassigned, 3);
}

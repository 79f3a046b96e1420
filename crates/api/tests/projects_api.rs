//! Project CRUD, ownership and task tracker endpoints.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, build_test_app, VIDEO_URL};
use serde_json::json;

#[tokio::test]
async fn requests_without_token_are_unauthorized() {
    let app = build_test_app();
    let response = app.send(Method::GET, "/api/v1/projects", None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = body_json(response).await;
    assert_eq!(json["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn invalid_token_is_unauthorized() {
    let app = build_test_app();
    let response = app
        .send(Method::GET, "/api/v1/projects", Some("not-a-jwt"), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn create_project_uses_default_task_set() {
    let app = build_test_app();
    let response = app
        .post_json(
            "/api/v1/projects",
            "user_1",
            json!({ "title": "  Podcast ep. 12  ", "video_url": VIDEO_URL }),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let project = &json["data"];
    assert_eq!(project["title"], "Podcast ep. 12");
    assert_eq!(project["user_id"], "user_1");
    assert_eq!(project["status_id"], 1);
    assert_eq!(project["status"], "draft");

    let types: Vec<&str> = project["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["type"].as_str().unwrap())
        .collect();
    assert_eq!(types, vec!["transcription", "clips", "blog", "social"]);
    assert!(project["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .all(|t| t["status"] == "pending" && t["progress"] == 0));
    assert_eq!(project["folders"]["clips"], json!([]));
}

#[tokio::test]
async fn create_project_validates_input() {
    let app = build_test_app();

    let blank_title = app
        .post_json(
            "/api/v1/projects",
            "user_1",
            json!({ "title": " ", "video_url": VIDEO_URL }),
        )
        .await;
    assert_eq!(blank_title.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(blank_title).await["code"], "VALIDATION_ERROR");

    let bad_url = app
        .post_json(
            "/api/v1/projects",
            "user_1",
            json!({ "title": "Demo", "video_url": "s3://bucket/video.mp4" }),
        )
        .await;
    assert_eq!(bad_url.status(), StatusCode::BAD_REQUEST);

    let no_tasks = app
        .post_json(
            "/api/v1/projects",
            "user_1",
            json!({ "title": "Demo", "video_url": VIDEO_URL, "tasks": [] }),
        )
        .await;
    assert_eq!(no_tasks.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn projects_are_scoped_to_their_owner() {
    let app = build_test_app();
    let id = app.create_project("user_1").await;

    let own = app.get(&format!("/api/v1/projects/{id}"), "user_1").await;
    assert_eq!(own.status(), StatusCode::OK);

    let other = app.get(&format!("/api/v1/projects/{id}"), "user_2").await;
    assert_eq!(other.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(other).await["code"], "FORBIDDEN");

    let listed = body_json(app.get("/api/v1/projects", "user_2").await).await;
    assert_eq!(listed["data"], json!([]));

    let listed = body_json(app.get("/api/v1/projects", "user_1").await).await;
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_project_is_404() {
    let app = build_test_app();
    let response = app.get("/api/v1/projects/999", "user_1").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}

#[tokio::test]
async fn list_respects_pagination() {
    let app = build_test_app();
    for _ in 0..3 {
        app.create_project("user_1").await;
    }

    let page = body_json(app.get("/api/v1/projects?limit=2", "user_1").await).await;
    assert_eq!(page["data"].as_array().unwrap().len(), 2);

    let rest = body_json(app.get("/api/v1/projects?limit=2&offset=2", "user_1").await).await;
    assert_eq!(rest["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn update_and_delete_project() {
    let app = build_test_app();
    let id = app.create_project("user_1").await;
    let token = app.token("user_1");

    let response = app
        .send(
            Method::PUT,
            &format!("/api/v1/projects/{id}"),
            Some(&token),
            Some(json!({ "title": "Renamed", "content_analysis": { "topics": ["ai"] } })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["title"], "Renamed");
    assert_eq!(json["data"]["content_analysis"]["topics"][0], "ai");

    let other = app.token("user_2");
    let forbidden = app
        .send(Method::DELETE, &format!("/api/v1/projects/{id}"), Some(&other), None)
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let deleted = app
        .send(Method::DELETE, &format!("/api/v1/projects/{id}"), Some(&token), None)
        .await;
    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);

    let gone = app.get(&format!("/api/v1/projects/{id}"), "user_1").await;
    assert_eq!(gone.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn task_updates_drive_project_status() {
    let app = build_test_app();
    let token = app.token("user_1");
    let created = body_json(
        app.post_json(
            "/api/v1/projects",
            "user_1",
            json!({ "title": "Blog only", "video_url": VIDEO_URL, "tasks": ["blog"] }),
        )
        .await,
    )
    .await;
    let id = created["data"]["id"].as_i64().unwrap();
    let uri = format!("/api/v1/projects/{id}/tasks/blog");

    let started = app
        .send(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "status": "processing", "progress": 30 })),
        )
        .await;
    assert_eq!(started.status(), StatusCode::OK);
    let json = body_json(started).await;
    assert_eq!(json["data"]["status_id"], 2);
    assert_eq!(json["data"]["status"], "processing");
    assert_eq!(json["data"]["tasks"][0]["progress"], 30);

    let lower = app
        .send(Method::PATCH, &uri, Some(&token), Some(json!({ "progress": 10 })))
        .await;
    assert_eq!(body_json(lower).await["data"]["tasks"][0]["progress"], 30);

    let done = app
        .send(
            Method::PATCH,
            &uri,
            Some(&token),
            Some(json!({ "status": "completed" })),
        )
        .await;
    let json = body_json(done).await;
    assert_eq!(json["data"]["status_id"], 3);
    assert_eq!(json["data"]["status"], "ready");
    assert_eq!(json["data"]["tasks"][0]["progress"], 100);
}

#[tokio::test]
async fn task_updates_reject_clips_and_unknown_types() {
    let app = build_test_app();
    let id = app.create_project("user_1").await;
    let token = app.token("user_1");

    let clips = app
        .send(
            Method::PATCH,
            &format!("/api/v1/projects/{id}/tasks/clips"),
            Some(&token),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(clips.status(), StatusCode::BAD_REQUEST);

    let unknown = app
        .send(
            Method::PATCH,
            &format!("/api/v1/projects/{id}/tasks/video"),
            Some(&token),
            Some(json!({ "progress": 10 })),
        )
        .await;
    assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn persona_routes_require_auth_and_validate_before_storage() {
    let app = build_test_app();

    let anonymous = app.send(Method::GET, "/api/v1/personas", None, None).await;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    let blank = app
        .post_json("/api/v1/personas", "user_1", json!({ "name": "   " }))
        .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(blank).await["code"], "VALIDATION_ERROR");

    let token = app.token("user_1");
    let bad_status = app
        .send(
            Method::PATCH,
            "/api/v1/personas/1",
            Some(&token),
            Some(json!({ "status": "archived" })),
        )
        .await;
    assert_eq!(bad_status.status(), StatusCode::BAD_REQUEST);
}

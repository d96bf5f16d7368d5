//! Router tests: the full app driven with `oneshot`, no socket involved

use axum::Router;
use axum::body::Body;
use course_server::core::config::IN_MEMORY_DATABASE;
use course_server::{Config, CurriculumStore, ServerState};
use http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use shared::models::{Course, CourseModule, Lesson, LessonKind};
use tower::ServiceExt;

const OWNER: &str = "instructor-1";
const SECRET: &str = "api-routes-test-secret-0123456789abcdef";

fn seeded_app() -> (Router, ServerState) {
    let store = CurriculumStore::open_in_memory().unwrap();
    store
        .create_course(&Course {
            id: "course-1".into(),
            title: "Rust 101".into(),
            owner_id: OWNER.into(),
            created_at: 0,
        })
        .unwrap();
    for id in ["m1", "m2", "m3"] {
        store
            .append::<CourseModule>("course-1", |position| CourseModule {
                id: id.into(),
                course_id: "course-1".into(),
                title: format!("Module {id}"),
                position,
                created_at: 0,
            })
            .unwrap();
    }
    for id in ["l1", "l2"] {
        store
            .append::<Lesson>("m1", |position| Lesson {
                id: id.into(),
                module_id: "m1".into(),
                title: format!("Lesson {id}"),
                description: None,
                kind: LessonKind::Video,
                video_key: None,
                document_key: None,
                duration_minutes: None,
                position,
                created_at: 0,
            })
            .unwrap();
    }

    let mut config = Config::default();
    config.database_path = IN_MEMORY_DATABASE.into();
    config.jwt_secret = Some(SECRET.into());
    let state = ServerState::new(config, store).unwrap();
    (course_server::api::build_app(state.clone()), state)
}

/// Admin token for `user`, signed with the server's key
fn token_for(state: &ServerState, user: &str) -> String {
    state.jwt.generate_token(user, "admin", &[]).unwrap()
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn order(entries: &[&str]) -> Value {
    let entries: Vec<Value> = entries
        .iter()
        .enumerate()
        .map(|(i, id)| json!({ "id": id, "position": i + 1 }))
        .collect();
    json!({ "entries": entries })
}

#[tokio::test]
async fn health_reports_ok() {
    let (app, _) = seeded_app();
    let (status, body) = send(&app, request("GET", "/api/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn reorder_without_identity_is_unauthorized() {
    let (app, _) = seeded_app();
    let (status, body) = send(
        &app,
        request("PUT", "/api/courses/course-1/modules/order", None, Some(order(&["m3", "m1", "m2"]))),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "error");
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn owner_reorders_modules() {
    let (app, state) = seeded_app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/order",
            Some(token_for(&state, OWNER).as_str()),
            Some(order(&["m3", "m1", "m2"])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Modules reordered successfully");
    assert!(body["version"].as_u64().is_some());

    let outline = state.structure.outline("course-1").unwrap();
    assert_eq!(outline.module_ids(), vec!["m3", "m1", "m2"]);

    let (status, body) = send(&app, request("GET", "/api/courses/course-1/structure", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["modules"][0]["id"], "m3");
    assert_eq!(body["data"]["modules"][0]["position"], 1);
}

#[tokio::test]
async fn partial_module_list_is_rejected() {
    let (app, state) = seeded_app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/order",
            Some(token_for(&state, OWNER).as_str()),
            Some(order(&["m2", "m1"])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["kind"], "invalid_scope");
    assert_eq!(
        state.structure.outline("course-1").unwrap().module_ids(),
        vec!["m1", "m2", "m3"]
    );
}

#[tokio::test]
async fn empty_lesson_list_is_rejected() {
    let (app, state) = seeded_app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/m1/lessons/order",
            Some(token_for(&state, OWNER).as_str()),
            Some(json!({ "entries": [] })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No lessons provided for reordering.");
}

#[tokio::test]
async fn non_owner_cannot_reorder() {
    let (app, state) = seeded_app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/m1/lessons/order",
            Some(token_for(&state, "someone-else").as_str()),
            Some(order(&["l2", "l1"])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["kind"], "unauthorized");
}

#[tokio::test]
async fn stale_version_conflicts() {
    let (app, state) = seeded_app();
    let mut body = order(&["l2", "l1"]);
    body["expected_version"] = json!(99);
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/m1/lessons/order",
            Some(token_for(&state, OWNER).as_str()),
            Some(body),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["kind"], "stale_scope");
}

#[tokio::test]
async fn create_and_delete_lesson_keeps_positions_contiguous() {
    let (app, state) = seeded_app();
    let (status, body) = send(
        &app,
        request(
            "POST",
            "/api/courses/course-1/modules/m1/lessons",
            Some(token_for(&state, OWNER).as_str()),
            Some(json!({ "title": "Ownership", "kind": "QUIZ" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let new_id = body["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        &app,
        request(
            "DELETE",
            "/api/courses/course-1/modules/m1/lessons/l1",
            Some(token_for(&state, OWNER).as_str()),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let outline = state.structure.outline("course-1").unwrap();
    let lessons = &outline.module("m1").unwrap().lessons;
    let got: Vec<(&str, u32)> = lessons.iter().map(|l| (l.id.as_str(), l.position)).collect();
    assert_eq!(got, vec![("l2", 1), (new_id.as_str(), 2)]);
}

#[tokio::test]
async fn forged_identity_cannot_reorder() {
    let (app, state) = seeded_app();

    // Identity headers without a token carry no weight
    let forged = Request::builder()
        .method("PUT")
        .uri("/api/courses/course-1/modules/order")
        .header("x-user-id", "attacker")
        .header("x-user-role", "admin")
        .header("x-user-permissions", "all")
        .header("content-type", "application/json")
        .body(Body::from(order(&["m3", "m2", "m1"]).to_string()))
        .unwrap();
    let (status, body) = send(&app, forged).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["kind"], "unauthorized");

    // A super-permission token signed with another key
    let mut other = Config::default();
    other.jwt_secret = Some("some-other-secret-0123456789abcdef".into());
    let foreign = course_server::JwtService::with_config(
        course_server::auth::JwtConfig::from_config(&other).unwrap(),
    )
    .generate_token("attacker", "admin", &["all"])
    .unwrap();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/order",
            Some(&foreign),
            Some(order(&["m3", "m2", "m1"])),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid token");

    assert_eq!(
        state.structure.outline("course-1").unwrap().module_ids(),
        vec!["m1", "m2", "m3"]
    );
}

#[tokio::test]
async fn update_lesson_edits_content_in_place() {
    let (app, state) = seeded_app();
    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/m1/lessons/l2",
            Some(token_for(&state, OWNER).as_str()),
            Some(json!({ "title": "Lifetimes", "kind": "DOCUMENT", "document_key": "docs/lt.pdf" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Lesson updated successfully");
    assert_eq!(body["id"], "l2");

    let outline = state.structure.outline("course-1").unwrap();
    let lesson = &outline.module("m1").unwrap().lessons[1];
    assert_eq!((lesson.id.as_str(), lesson.position), ("l2", 2));
    assert_eq!(lesson.title, "Lifetimes");
    assert_eq!(lesson.document_key.as_deref(), Some("docs/lt.pdf"));

    // Lesson addressed through the wrong module
    let (status, _) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1/modules/m2/lessons/l2",
            Some(token_for(&state, OWNER).as_str()),
            Some(json!({ "title": "Elsewhere" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn update_course_requires_owner() {
    let (app, state) = seeded_app();
    let (status, _) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1",
            Some(token_for(&state, "someone-else").as_str()),
            Some(json!({ "title": "Hijacked" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request(
            "PUT",
            "/api/courses/course-1",
            Some(token_for(&state, OWNER).as_str()),
            Some(json!({ "title": "Rust 201" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Course updated successfully");
    assert_eq!(state.structure.outline("course-1").unwrap().course.title, "Rust 201");
}

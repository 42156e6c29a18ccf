pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers as analysis;
use crate::resume::handlers as resumes;
use crate::state::AppState;

/// Largest accepted PDF upload.
const PDF_UPLOAD_LIMIT: usize = 10 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Resume documents
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list).post(resumes::handle_create),
        )
        .route("/api/v1/resumes/template", get(resumes::handle_template))
        .route("/api/v1/resumes/live", get(resumes::handle_live_collection))
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_get)
                .put(resumes::handle_save)
                .delete(resumes::handle_delete),
        )
        .route(
            "/api/v1/resumes/:id/duplicate",
            post(resumes::handle_duplicate),
        )
        .route("/api/v1/resumes/:id/edits", post(resumes::handle_apply_edits))
        .route("/api/v1/resumes/:id/text", get(resumes::handle_text))
        .route("/api/v1/resumes/:id/preview", get(resumes::handle_preview))
        .route("/api/v1/resumes/:id/live", get(resumes::handle_live_document))
        // LLM flows
        .route("/api/v1/resumes/import", post(analysis::handle_import_text))
        .route(
            "/api/v1/resumes/import/pdf",
            post(analysis::handle_import_pdf).layer(DefaultBodyLimit::max(PDF_UPLOAD_LIMIT)),
        )
        .route("/api/v1/resumes/:id/analyze", post(analysis::handle_analyze))
        .route("/api/v1/resumes/:id/match", post(analysis::handle_match))
        .route("/api/v1/chat", post(analysis::handle_chat))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use axum::body::BodyDataStream;
    use futures::StreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use tower::ServiceExt;
    use uuid::Uuid;

    use super::*;
    use crate::llm_client::LlmClient;
    use crate::resume::live::ResumeFeed;
    use crate::resume::store::MemoryResumeStore;

    fn test_app() -> Router {
        build_router(AppState {
            store: Arc::new(MemoryResumeStore::new()),
            llm: LlmClient::new("test-key".to_string(), 1).unwrap(),
            feed: ResumeFeed::new(4),
        })
    }

    async fn send(app: &Router, method: Method, uri: String, body: Option<Value>) -> Response {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        };
        app.clone().oneshot(request.unwrap()).await.unwrap()
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    async fn body_json(response: Response) -> Value {
        serde_json::from_slice(&body_bytes(response).await).unwrap()
    }

    async fn create(app: &Router, user: Uuid, draft: Value) -> Value {
        let response = send(
            app,
            Method::POST,
            format!("/api/v1/resumes?user_id={user}"),
            Some(draft),
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await
    }

    /// Splits an SSE response body into events.
    struct EventReader {
        body: BodyDataStream,
        buffer: String,
    }

    impl EventReader {
        fn new(response: Response) -> Self {
            Self {
                body: response.into_body().into_data_stream(),
                buffer: String::new(),
            }
        }

        /// The next event's raw text, or `None` once the stream has ended.
        async fn next_event(&mut self) -> Option<String> {
            tokio::time::timeout(Duration::from_secs(5), async {
                loop {
                    if let Some(end) = self.buffer.find("\n\n") {
                        let event = self.buffer[..end].to_string();
                        self.buffer.drain(..end + 2);
                        return Some(event);
                    }
                    match self.body.next().await {
                        Some(Ok(chunk)) => self.buffer.push_str(std::str::from_utf8(&chunk).unwrap()),
                        _ => return None,
                    }
                }
            })
            .await
            .expect("timed out waiting for an event")
        }
    }

    fn event_data(event: &str) -> Value {
        let data = event
            .lines()
            .find_map(|line| line.strip_prefix("data: "))
            .unwrap();
        serde_json::from_str(data).unwrap()
    }

    fn sample() -> Value {
        json!({
            "title": "Engineer CV",
            "content": {
                "personal": { "name": "Jane Doe", "email": "jane@example.com" },
                "summary": "Builder of things.",
                "experience": [{
                    "title": "Engineer",
                    "company": "Acme",
                    "dates": "2020-2023",
                    "description": "- Shipped it"
                }],
                "skills": ["Rust", "SQL"]
            }
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = send(&test_app(), Method::GET, "/health".to_string(), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["service"], "resumeforge-api");
    }

    #[tokio::test]
    async fn test_create_get_and_list() {
        let app = test_app();
        let user = Uuid::new_v4();
        let created = create(&app, user, sample()).await;
        let id = created["id"].as_str().unwrap().to_string();
        assert_eq!(created["content"]["personal"]["phone"], "");
        assert_eq!(created["content"]["education"], json!([]));

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/{id}?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, created);

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes?user_id={user}"),
            None,
        )
        .await;
        let listed = body_json(response).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_template_has_one_blank_entry_per_section() {
        let response = send(
            &test_app(),
            Method::GET,
            "/api/v1/resumes/template".to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let template = body_json(response).await;
        assert_eq!(template["title"], "Untitled Resume");
        assert_eq!(template["content"]["experience"].as_array().unwrap().len(), 1);
        assert_eq!(template["content"]["education"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_text_endpoint_flattens_resume() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/{id}/text?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(text.starts_with("Name: Jane Doe\nEmail: jane@example.com\n\nSummary:\nBuilder of things."));
        assert!(text.contains("Title: Engineer\nCompany: Acme\n"));
        assert!(text.ends_with("Skills:\nRust, SQL"));
    }

    #[tokio::test]
    async fn test_preview_renders_html() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/{id}/preview?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(html.contains("Jane Doe"));
        assert!(html.contains("Shipped it"));
    }

    #[tokio::test]
    async fn test_duplicate_and_delete() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::POST,
            format!("/api/v1/resumes/{id}/duplicate?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let copy = body_json(response).await;
        assert_eq!(copy["title"], "Engineer CV (Copy)");
        assert_ne!(copy["id"].as_str().unwrap(), id);

        let response = send(
            &app,
            Method::DELETE,
            format!("/api/v1/resumes/{id}?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/{id}?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_edits_apply_in_order() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::POST,
            format!("/api/v1/resumes/{id}/edits?user_id={user}"),
            Some(json!({
                "edits": [
                    { "op": "add_experience" },
                    { "op": "set_experience", "index": 1, "field": "company", "value": "Globex" },
                    { "op": "set_skills", "value": "Rust, , Go " }
                ]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let edited = body_json(response).await;
        assert_eq!(edited["content"]["experience"][1]["company"], "Globex");
        assert_eq!(edited["content"]["skills"], json!(["Rust", "Go"]));
    }

    #[tokio::test]
    async fn test_out_of_range_edit_rejects_batch() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::POST,
            format!("/api/v1/resumes/{id}/edits?user_id={user}"),
            Some(json!({
                "edits": [
                    { "op": "set_title", "value": "Changed" },
                    { "op": "remove_education", "index": 5 }
                ]
            })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/{id}?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(body_json(response).await["title"], "Engineer CV");
    }

    #[tokio::test]
    async fn test_foreign_document_is_permission_denied() {
        let app = test_app();
        let owner = Uuid::new_v4();
        let intruder = Uuid::new_v4();
        let id = create(&app, owner, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::PUT,
            format!("/api/v1/resumes/{id}?user_id={intruder}"),
            Some(json!({ "title": "Hijacked" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"]["details"]["operation"], "update");
        assert_eq!(
            body["error"]["details"]["path"],
            format!("users/{intruder}/resumes/{id}")
        );
        assert_eq!(
            body["error"]["details"]["request_resource_data"]["title"],
            "Hijacked"
        );
    }

    #[tokio::test]
    async fn test_blank_job_description_is_rejected_before_llm() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::POST,
            format!("/api/v1/resumes/{id}/match?user_id={user}"),
            Some(json!({ "job_description": "   " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await["error"]["message"],
            "Please paste a job description to start the analysis."
        );

        let missing = Uuid::new_v4();
        let response = send(
            &app,
            Method::POST,
            format!("/api/v1/resumes/{missing}/match?user_id={user}"),
            Some(json!({ "job_description": "   " })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_blank_import_text_is_rejected() {
        let app = test_app();
        let user = Uuid::new_v4();
        let response = send(
            &app,
            Method::POST,
            format!("/api/v1/resumes/import?user_id={user}"),
            Some(json!({ "resume_text": "" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(body_json(response).await, json!([]));
    }

    #[tokio::test]
    async fn test_missing_user_id_is_rejected() {
        let response = send(
            &test_app(),
            Method::GET,
            "/api/v1/resumes".to_string(),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_live_document_ends_with_deleted_event() {
        let app = test_app();
        let user = Uuid::new_v4();
        let id = create(&app, user, sample()).await["id"]
            .as_str()
            .unwrap()
            .to_string();

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/{id}/live?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let mut events = EventReader::new(response);

        let first = events.next_event().await.unwrap();
        assert!(first.starts_with("event: snapshot"));
        assert_eq!(event_data(&first)["title"], "Engineer CV");

        let response = send(
            &app,
            Method::DELETE,
            format!("/api/v1/resumes/{id}?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let last = events.next_event().await.unwrap();
        assert!(last.starts_with("event: deleted"));
        assert!(last.contains(&format!("data: {id}")));
        assert_eq!(events.next_event().await, None);
    }

    #[tokio::test]
    async fn test_live_collection_emits_snapshot_after_write() {
        let app = test_app();
        let user = Uuid::new_v4();

        let response = send(
            &app,
            Method::GET,
            format!("/api/v1/resumes/live?user_id={user}"),
            None,
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let mut events = EventReader::new(response);

        let initial = events.next_event().await.unwrap();
        assert!(initial.starts_with("event: snapshot"));
        assert_eq!(event_data(&initial)["resumes"], json!([]));

        let created = create(&app, user, sample()).await;

        let update = events.next_event().await.unwrap();
        assert!(update.starts_with("event: snapshot"));
        let snapshot = event_data(&update);
        assert_eq!(snapshot["user_id"], user.to_string());
        assert_eq!(snapshot["resumes"][0]["id"], created["id"]);
    }
}

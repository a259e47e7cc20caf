//! Typed HTTP client for the notes API.

use super::NotesApi;
use crate::error::{Result, SyncError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use opal_types::{CreatedRecord, NotePayload, RemoteRecord, UpdatedRecord};
use reqwest::Response;
use std::time::Duration;

pub struct HttpNotesApi {
    base_url: String,
    client: reqwest::Client,
}

impl HttpNotesApi {
    /// `timeout` bounds each request, connect through body
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("opal-sync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SyncError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn collection_url(&self) -> String {
        format!("{}/", self.base_url)
    }

    fn record_url(&self, id: &str) -> String {
        format!("{}/{}", self.base_url, urlencoding::encode(id))
    }
}

/// Turn a non-2xx response into a transport error carrying status and body
async fn check_status(resp: Response, what: &str) -> Result<Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    Err(SyncError::Transport(format!("{} HTTP {}: {}", what, status, body)))
}

#[async_trait]
impl NotesApi for HttpNotesApi {
    async fn list_records(&self) -> Result<Vec<RemoteRecord>> {
        let resp = self
            .client
            .get(self.collection_url())
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("List notes failed: {}", e)))?;
        let resp = check_status(resp, "List notes").await?;

        let body = resp.text().await?;
        let records: Vec<RemoteRecord> = serde_json::from_str(&body)
            .map_err(|e| SyncError::Parse(format!("List notes response: {}", e)))?;

        log::debug!("[REMOTE] Listed {} records from {}", records.len(), self.base_url);
        Ok(records)
    }

    async fn create_record(&self, payload: &NotePayload) -> Result<CreatedRecord> {
        let resp = self
            .client
            .post(self.collection_url())
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("Create note '{}' failed: {}", payload.title, e)))?;
        let resp = check_status(resp, "Create note").await?;

        let body = resp.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| SyncError::Parse(format!("Create note response: {}", e)))
    }

    async fn update_record(&self, id: &str, payload: &NotePayload) -> Result<Option<DateTime<Utc>>> {
        let resp = self
            .client
            .put(self.record_url(id))
            .json(payload)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("Update note {} failed: {}", id, e)))?;
        let resp = check_status(resp, "Update note").await?;

        // The body is optional; only a lastModified echo is of use
        let body = resp.text().await.unwrap_or_default();
        if body.trim().is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<UpdatedRecord>(&body) {
            Ok(updated) => Ok(updated.last_modified),
            Err(e) => {
                log::debug!("[REMOTE] Ignoring unparseable update response for {}: {}", id, e);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Path, State};
    use axum::http::StatusCode;
    use axum::routing::{get, put};
    use axum::{Json, Router};
    use chrono::TimeZone;
    use serde_json::{Value, json};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Received {
        posts: Mutex<Vec<Value>>,
        puts: Mutex<Vec<(String, Value)>>,
    }

    async fn list() -> Json<Value> {
        Json(json!([
            {"_id": "r1", "title": "Hello", "content": "World", "lastModified": "2024-01-01T00:00:00.000Z"},
            {"_id": "r2", "content": "untitled", "lastModified": "2024-01-02T00:00:00.000Z", "__v": 0}
        ]))
    }

    async fn create(State(state): State<Arc<Received>>, Json(body): Json<Value>) -> Json<Value> {
        state.posts.lock().unwrap().push(body.clone());
        Json(json!({
            "_id": "new-id",
            "title": body["title"],
            "content": body["content"],
            "lastModified": "2024-05-01T10:00:00.000Z"
        }))
    }

    async fn update(
        State(state): State<Arc<Received>>,
        Path(id): Path<String>,
        Json(body): Json<Value>,
    ) -> (StatusCode, String) {
        state.puts.lock().unwrap().push((id.clone(), body));
        if id == "quiet" {
            (StatusCode::OK, String::new())
        } else {
            (StatusCode::OK, json!({"lastModified": "2024-05-02T10:00:00.000Z"}).to_string())
        }
    }

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });
        format!("http://{}/api/notes/", addr)
    }

    async fn notes_server(state: Arc<Received>) -> String {
        let app = Router::new()
            .route("/api/notes/", get(list).post(create))
            .route("/api/notes/:id", put(update))
            .with_state(state);
        serve(app).await
    }

    fn api(url: &str) -> HttpNotesApi {
        HttpNotesApi::new(url, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_records() {
        let url = notes_server(Arc::new(Received::default())).await;
        let records = api(&url).list_records().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title.as_deref(), Some("Hello"));
        assert_eq!(records[1].title, None);
        assert_eq!(records[1].content, "untitled");
    }

    #[tokio::test]
    async fn test_create_record_posts_json() {
        let state = Arc::new(Received::default());
        let url = notes_server(state.clone()).await;
        let payload = NotePayload::new(
            "Draft",
            "some text",
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        );

        let created = api(&url).create_record(&payload).await.unwrap();
        assert_eq!(created.id, "new-id");
        assert_eq!(created.last_modified, Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap());

        let posts = state.posts.lock().unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0]["title"], "Draft");
        assert_eq!(posts[0]["content"], "some text");
        assert_eq!(posts[0]["lastModified"], "2024-05-01T09:00:00.000Z");
    }

    #[tokio::test]
    async fn test_update_record() {
        let state = Arc::new(Received::default());
        let url = notes_server(state.clone()).await;
        let client = api(&url);
        let payload = NotePayload::new("T", "C", Utc::now());

        let echoed = client.update_record("r1", &payload).await.unwrap();
        assert_eq!(echoed, Some(Utc.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()));

        let echoed = client.update_record("quiet", &payload).await.unwrap();
        assert_eq!(echoed, None);

        let puts = state.puts.lock().unwrap();
        assert_eq!(puts[0].0, "r1");
        assert_eq!(puts[1].0, "quiet");
    }

    #[tokio::test]
    async fn test_error_status_is_transport_error() {
        let app = Router::new().route(
            "/api/notes/",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database down") }),
        );
        let url = serve(app).await;

        match api(&url).list_records().await {
            Err(SyncError::Transport(msg)) => {
                assert!(msg.contains("500"));
                assert!(msg.contains("database down"));
            }
            other => panic!("expected transport error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_json_is_parse_error() {
        let app = Router::new().route("/api/notes/", get(|| async { "<html>not json</html>" }));
        let url = serve(app).await;

        assert!(matches!(api(&url).list_records().await, Err(SyncError::Parse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = api(&format!("http://{}/api/notes", addr)).list_records().await;
        assert!(matches!(result, Err(SyncError::Transport(_))));
    }

    #[test]
    fn test_urls() {
        let client = api("http://localhost:3000/api/notes/");
        assert_eq!(client.base_url(), "http://localhost:3000/api/notes");
        assert_eq!(client.collection_url(), "http://localhost:3000/api/notes/");
        assert_eq!(client.record_url("a b"), "http://localhost:3000/api/notes/a%20b");
    }
}

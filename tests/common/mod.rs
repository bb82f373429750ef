#![allow(dead_code)]

use std::sync::Arc;

use researchpilot_lib::controllers::Notification;
use researchpilot_lib::models::SearchResult;
use researchpilot_lib::services::{ApiClient, StaticToken};
use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::MockServer;

pub const TOKEN: &str = "test-token";

pub fn client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Arc::new(StaticToken::new(TOKEN))).unwrap()
}

pub fn anonymous_client(server: &MockServer) -> ApiClient {
    ApiClient::new(&server.uri(), Arc::new(StaticToken::anonymous())).unwrap()
}

pub fn bearer() -> String {
    format!("Bearer {}", TOKEN)
}

pub fn paper_json(id: &str, workspace_id: &str) -> Value {
    json!({
        "id": id,
        "workspace_id": workspace_id,
        "title": format!("Paper {}", id),
        "authors": ["A. Author"],
        "abstract": "An abstract.",
        "date": "2024-01-01",
        "source": "arXiv",
        "link": format!("http://arxiv.org/abs/{}", id),
        "created_at": "2024-01-02T00:00:00Z"
    })
}

/// Row the backend stores for an uploaded PDF: only the file name is known.
pub fn uploaded_json(id: &str, workspace_id: &str, file_name: &str) -> Value {
    json!({
        "id": id,
        "workspace_id": workspace_id,
        "title": file_name,
        "authors": null,
        "abstract": null,
        "date": null,
        "source": null,
        "link": null,
        "created_at": "2024-01-03T00:00:00Z"
    })
}

pub fn search_hit(id: &str) -> SearchResult {
    SearchResult {
        id: id.to_string(),
        title: format!("Paper {}", id),
        authors: vec!["A. Author".to_string()],
        abstract_text: "An abstract.".to_string(),
        date: "2024-01-01".to_string(),
        source: "arXiv".to_string(),
        link: format!("http://arxiv.org/abs/{}", id),
        citations: 0,
        tags: vec!["Research".to_string()],
    }
}

pub fn drain(rx: &mut UnboundedReceiver<Notification>) -> Vec<Notification> {
    let mut out = Vec::new();
    while let Ok(n) = rx.try_recv() {
        out.push(n);
    }
    out
}

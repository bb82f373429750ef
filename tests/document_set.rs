mod common;

use std::time::Duration;

use common::{bearer, client, drain, paper_json, search_hit, uploaded_json};
use researchpilot_lib::controllers::{
    DocumentError, NotificationLevel, Notifier, PaperStatus, WorkspaceDocumentSet,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WS: &str = "ws-1";

async fn mount_workspace(server: &MockServer, papers: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": WS, "name": "Transformers"})))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1/papers"))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(papers))
        .up_to_n_times(1)
        .mount(server)
        .await;
}

fn ids(set: &WorkspaceDocumentSet) -> Vec<String> {
    set.papers().into_iter().map(|p| p.id).collect()
}

#[tokio::test]
async fn open_loads_details_and_papers() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS), paper_json("p2", WS)])).await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    assert_eq!(set.name(), "Transformers");
    assert_eq!(ids(&set), vec!["p1", "p2"]);
    assert_eq!(set.status("p1"), Some(PaperStatus::Present));
    assert!(!set.is_loading());
}

#[tokio::test]
async fn uploaded_documents_are_listed_with_imported_papers() {
    let server = MockServer::start().await;
    mount_workspace(
        &server,
        json!([paper_json("arxiv-1", WS), uploaded_json("u1", WS, "notes.pdf")]),
    )
    .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::open(client(&server), WS, notifier).await;

    assert_eq!(ids(&set), vec!["arxiv-1", "u1"]);
    let uploaded = &set.papers()[1];
    assert_eq!(uploaded.title, "notes.pdf");
    assert!(uploaded.authors.is_empty());
    assert!(uploaded.link.is_empty());
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn open_keeps_default_name_when_details_fail() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    assert_eq!(set.name(), "Workspace");
    assert!(set.is_empty());
}

#[tokio::test]
async fn add_success_keeps_exactly_one_entry() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/workspaces/ws-1/papers"))
        .and(body_partial_json(json!({"id": "p9", "abstract": "An abstract."})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::open(client(&server), WS, notifier).await;

    set.add_paper(&search_hit("p9")).await.unwrap();

    assert_eq!(ids(&set), vec!["p9"]);
    assert_eq!(set.status("p9"), Some(PaperStatus::Present));
    assert_eq!(set.papers()[0].workspace_id, WS);
    assert!(!set.can_import("p9"));

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Success);
    assert_eq!(notes[0].description, "Paper added to workspace");
}

#[tokio::test]
async fn add_failure_rolls_back() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS)])).await;
    Mock::given(method("POST"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"detail": "Failed to add paper: no PDF"})),
        )
        .mount(&server)
        .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::open(client(&server), WS, notifier).await;

    let err = set.add_paper(&search_hit("p9")).await.unwrap_err();
    assert!(matches!(err, DocumentError::Api(_)));
    assert_eq!(ids(&set), vec!["p1"]);
    assert_eq!(set.status("p9"), None);
    assert!(set.can_import("p9"));

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].level, NotificationLevel::Error);
    assert!(notes[0].description.contains("no PDF"));
}

#[tokio::test]
async fn add_is_visible_before_the_server_answers() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([])).await;
    Mock::given(method("POST"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    let hit = search_hit("p9");

    let (added, _) = tokio::join!(set.add_paper(&hit), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(set.status("p9"), Some(PaperStatus::PendingAdd));
        assert_eq!(ids(&set), vec!["p9"]);
        assert!(!set.can_import("p9"));
    });

    added.unwrap();
    assert_eq!(set.status("p9"), Some(PaperStatus::Present));
}

#[tokio::test]
async fn importing_a_tracked_paper_changes_nothing() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS)])).await;
    Mock::given(method("POST"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    let before = set.len();

    let err = set.add_paper(&search_hit("p1")).await.unwrap_err();
    assert!(matches!(err, DocumentError::AlreadyPresent(id) if id == "p1"));
    assert_eq!(set.len(), before);
}

#[tokio::test]
async fn remove_success_forgets_the_paper() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS), paper_json("p2", WS)])).await;
    Mock::given(method("DELETE"))
        .and(path("/workspaces/ws-1/papers/p1"))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(1)
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    set.remove_paper("p1").await.unwrap();

    assert_eq!(ids(&set), vec!["p2"]);
    assert_eq!(set.status("p1"), None);
}

#[tokio::test]
async fn remove_hides_the_paper_immediately() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS)])).await;
    Mock::given(method("DELETE"))
        .and(path("/workspaces/ws-1/papers/p1"))
        .respond_with(ResponseTemplate::new(204).set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;

    let (removed, _) = tokio::join!(set.remove_paper("p1"), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(set.status("p1"), Some(PaperStatus::PendingRemove));
        assert!(set.is_empty());
    });

    removed.unwrap();
    assert_eq!(set.status("p1"), None);
}

#[tokio::test]
async fn remove_failure_resyncs_from_the_server() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS), paper_json("p2", WS)])).await;
    Mock::given(method("DELETE"))
        .and(path("/workspaces/ws-1/papers/p1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::open(client(&server), WS, notifier).await;

    // Server state drifted meanwhile: p2 is gone, an uploaded p3 appeared.
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([paper_json("p1", WS), uploaded_json("p3", WS, "p3.pdf")])),
        )
        .expect(1)
        .mount(&server)
        .await;

    let err = set.remove_paper("p1").await.unwrap_err();
    assert!(matches!(err, DocumentError::Api(_)));
    assert_eq!(ids(&set), vec!["p1", "p3"]);
    assert_eq!(set.status("p1"), Some(PaperStatus::Present));

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].description, "Failed to remove paper");
}

#[tokio::test]
async fn removing_an_unknown_paper_sends_nothing() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([])).await;
    Mock::given(method("DELETE"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    assert!(matches!(
        set.remove_paper("nope").await,
        Err(DocumentError::NotFound(_))
    ));
}

#[tokio::test]
async fn refresh_keeps_imports_in_flight() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS)])).await;
    Mock::given(method("POST"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::open(client(&server), WS, Notifier::silent()).await;
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([paper_json("p1", WS)])))
        .mount(&server)
        .await;

    let hit = search_hit("p9");
    let (added, _) = tokio::join!(set.add_paper(&hit), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        set.refresh().await.unwrap();
        assert_eq!(set.status("p9"), Some(PaperStatus::PendingAdd));
    });

    added.unwrap();
    assert_eq!(ids(&set), vec!["p1", "p9"]);
}

#[tokio::test]
async fn empty_query_sends_nothing_and_keeps_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/papers/search"))
        .and(query_param("query", "transformers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "papers": [{"id": "1", "title": "Attention Is All You Need"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::new(client(&server), WS, Notifier::silent());
    assert!(matches!(set.search("   ").await, Err(DocumentError::EmptyQuery)));
    assert!(!set.has_searched());

    assert_eq!(set.search("transformers").await.unwrap(), 1);
    assert!(matches!(set.search("").await, Err(DocumentError::EmptyQuery)));
    assert_eq!(set.results().len(), 1);
}

#[tokio::test]
async fn zero_hits_is_a_searched_empty_state() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/papers/search"))
        .and(query_param("query", "quantum"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"papers": []})))
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::new(client(&server), WS, Notifier::silent());
    assert!(!set.has_searched());

    assert_eq!(set.search("quantum").await.unwrap(), 0);
    assert!(set.results().is_empty());
    assert!(set.has_searched());
    assert!(!set.is_searching());
}

#[tokio::test]
async fn search_results_get_defaults() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/papers/search"))
        .and(query_param("query", "graph neural networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "papers": [
                {"id": "1", "title": "GNN", "authors": ["X"], "abstract": "a", "tags": []},
                {"id": "2", "title": "GAT", "citations": 40, "tags": ["cs.LG"]}
            ]
        })))
        .mount(&server)
        .await;

    let set = WorkspaceDocumentSet::new(client(&server), WS, Notifier::silent());
    set.search("graph neural networks").await.unwrap();

    let results = set.results();
    assert_eq!(results[0].citations, 0);
    assert_eq!(results[0].tags, vec!["Research"]);
    assert_eq!(results[1].citations, 40);
    assert_eq!(results[1].tags, vec!["cs.LG"]);
}

#[tokio::test]
async fn failed_search_keeps_previous_results() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/papers/search"))
        .and(query_param("query", "first"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"papers": [{"id": "1"}]})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/papers/search"))
        .and(query_param("query", "second"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::new(client(&server), WS, notifier);
    set.search("first").await.unwrap();
    assert!(set.search("second").await.is_err());

    assert_eq!(set.results().len(), 1);
    assert!(!set.is_searching());
    assert_eq!(drain(&mut rx)[0].level, NotificationLevel::Error);
}

#[tokio::test]
async fn processing_only_notifies() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS)])).await;
    Mock::given(method("POST"))
        .and(path("/chat/process-paper/p1"))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "ok"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/process-paper/p2"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::open(client(&server), WS, notifier).await;

    set.process_paper("p1").await.unwrap();
    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].title, "Processing Paper");
    assert_eq!(notes[1].level, NotificationLevel::Success);

    assert!(set.process_paper("p2").await.is_err());
    let notes = drain(&mut rx);
    assert_eq!(notes[1].level, NotificationLevel::Error);
    assert_eq!(notes[1].description, "Failed to process paper");

    assert_eq!(ids(&set), vec!["p1"]);
    assert_eq!(set.status("p1"), Some(PaperStatus::Present));
}

#[tokio::test]
async fn summaries_skip_failed_papers() {
    let server = MockServer::start().await;
    mount_workspace(&server, json!([paper_json("p1", WS), paper_json("p2", WS)])).await;
    Mock::given(method("POST"))
        .and(path("/papers/summarize"))
        .and(body_partial_json(json!({"title": "Paper p1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"summary": "Short."})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/papers/summarize"))
        .and(body_partial_json(json!({"title": "Paper p2"})))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::open(client(&server), WS, notifier).await;

    let output = set.summarize(&["p1".to_string(), "p2".to_string()]).await;
    assert_eq!(output, "### Paper p1\nShort.\n\n");

    let notes = drain(&mut rx);
    assert_eq!(notes.len(), 1);
    assert_eq!(notes[0].description, "Failed to generate summary for Paper p2");
}

#[tokio::test]
async fn only_pdfs_are_uploaded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag/upload"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("notes.txt");
    std::fs::write(&file, "hello").unwrap();

    let set = WorkspaceDocumentSet::new(client(&server), WS, Notifier::silent());
    assert!(matches!(set.upload_pdf(&file).await, Err(DocumentError::NotPdf)));
}

#[tokio::test]
async fn upload_indexes_and_reloads() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rag/upload"))
        .and(query_param("workspace_id", WS))
        .and(header("Authorization", bearer().as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "document_id": "doc-1",
            "message": "Document processed and indexed"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/workspaces/ws-1/papers"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([uploaded_json("doc-1", WS, "paper.pdf")])),
        )
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("paper.pdf");
    std::fs::write(&file, b"%PDF-1.4 test").unwrap();

    let (notifier, mut rx) = Notifier::channel();
    let set = WorkspaceDocumentSet::new(client(&server), WS, notifier);
    set.upload_pdf(&file).await.unwrap();

    assert_eq!(ids(&set), vec!["doc-1"]);
    assert_eq!(set.papers()[0].title, "paper.pdf");
    let notes = drain(&mut rx);
    assert_eq!(notes[0].description, "\"paper.pdf\" uploaded and indexed successfully");
}

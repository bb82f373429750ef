use std::path::Path;

use super::render::{print_result, spawn_notification_printer};
use super::Context;
use crate::controllers::{Notifier, WorkspaceDocumentSet};
use crate::models::SummarizeRequest;

pub async fn search(query: &str) -> Result<(), String> {
    if query.trim().is_empty() {
        return Err("Search query is empty".to_string());
    }
    let ctx = Context::load()?;
    let results = ctx
        .api
        .search_papers(query.trim())
        .await
        .map_err(|e| format!("Search failed: {}", e))?;

    if results.is_empty() {
        println!("No papers found for \"{}\"", query.trim());
    }
    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result, false);
    }
    Ok(())
}

pub async fn summarize(title: String, abstract_text: String) -> Result<(), String> {
    let ctx = Context::load()?;
    let response = ctx
        .api
        .summarize_paper(&SummarizeRequest {
            title: title.clone(),
            abstract_text,
        })
        .await
        .map_err(|e| format!("Failed to generate summary for {}: {}", title, e))?;
    println!("### {}\n{}", title, response.summary);
    Ok(())
}

pub async fn upload(workspace_id: &str, file: &Path) -> Result<(), String> {
    let ctx = Context::load()?;
    let (notifier, rx) = Notifier::channel();
    let printer = spawn_notification_printer(rx);

    let set = WorkspaceDocumentSet::new(ctx.api, workspace_id, notifier);
    let outcome = set.upload_pdf(file).await.map_err(|e| e.to_string());

    drop(set);
    let _ = printer.await;
    outcome
}

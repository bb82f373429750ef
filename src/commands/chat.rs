use tokio::io::{AsyncBufReadExt, BufReader};

use super::render::print_message;
use super::Context;
use crate::controllers::{ChatError, ChatSession};

const HELP: &str = "Type a question, or /workspaces, /use <id>, /history, /quit";

pub async fn run(workspace: Option<String>, question: Option<String>) -> Result<(), String> {
    let ctx = Context::load()?;
    let session = ChatSession::bind(ctx.api.clone(), ctx.workspace_or_default(workspace)).await;

    if let Some(question) = question {
        let reply = session.ask(&question).await.map_err(|e| e.to_string())?;
        print_message(&reply);
        return Ok(());
    }

    for message in session.messages() {
        print_message(&message);
    }
    match session.workspace_id() {
        Some(id) => println!("Workspace: {}", id),
        None => println!("No workspace selected. Use /workspaces and /use <id>."),
    }
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        let line = line.trim();
        match line.split_once(' ').map_or((line, ""), |(c, rest)| (c, rest.trim())) {
            ("", _) => continue,
            ("/quit", _) | ("/exit", _) => break,
            ("/help", _) => println!("{}", HELP),
            ("/history", _) => {
                for message in session.messages() {
                    print_message(&message);
                }
            }
            ("/workspaces", _) => match ctx.api.list_workspaces().await {
                Ok(workspaces) => {
                    let current = session.workspace_id();
                    for w in workspaces {
                        let marker = if current.as_deref() == Some(w.id.as_str()) { "*" } else { " " };
                        println!("{} {}  {}", marker, w.id, w.name);
                    }
                }
                Err(e) => eprintln!("Failed to fetch workspaces: {}", e),
            },
            ("/use", id) if !id.is_empty() => match session.select_workspace(id) {
                Ok(()) => println!("Workspace: {} (new conversation)", id),
                Err(e) => eprintln!("{}", e),
            },
            _ => match session.ask(line).await {
                Ok(reply) => print_message(&reply),
                Err(ChatError::NoWorkspace) => eprintln!("Please select a workspace first."),
                Err(e) => eprintln!("{}", e),
            },
        }
    }
    Ok(())
}

use std::path::Path;

use tokio::io::{AsyncBufReadExt, BufReader};

use super::render::{print_message, print_paper, print_result, spawn_notification_printer};
use super::Context;
use crate::controllers::{ChatSession, DocumentError, Notifier, WorkspaceDocumentSet};

const HELP: &str = "\
/papers               list papers in this workspace
/search <query>       search for papers to import
/add <n|id>           import a search result
/remove <id>          remove a paper
/process <id>         prepare a paper for chat
/summarize <id>...    summarize papers
/upload <file.pdf>    upload a PDF
/refresh              reload papers from the server
/quit                 leave the workspace
anything else         ask the assistant";

fn print_papers(set: &WorkspaceDocumentSet) {
    if set.is_loading() {
        println!("Loading papers...");
    }
    let papers = set.papers();
    if papers.is_empty() {
        println!("No papers yet. Try /search.");
    }
    for paper in &papers {
        print_paper(paper);
    }
}

fn print_results(set: &WorkspaceDocumentSet) {
    let results = set.results();
    if !set.has_searched() {
        println!("Search for papers to add them to this workspace.");
    } else if results.is_empty() {
        println!("No papers found.");
    }
    for (i, result) in results.iter().enumerate() {
        print_result(i + 1, result, !set.can_import(&result.id));
    }
}

async fn add(set: &WorkspaceDocumentSet, arg: &str) {
    let results = set.results();
    let chosen = match arg.parse::<usize>() {
        Ok(n) if n >= 1 => results.get(n - 1),
        _ => results.iter().find(|r| r.id == arg),
    };
    let Some(result) = chosen else {
        eprintln!("No search result {}", arg);
        return;
    };
    if !set.can_import(&result.id) {
        eprintln!("Already added");
        return;
    }
    // Failures are reported through notifications.
    let _ = set.add_paper(result).await;
}

pub async fn run(workspace: Option<String>) -> Result<(), String> {
    let ctx = Context::load()?;
    let workspace_id = ctx
        .workspace_or_default(workspace)
        .ok_or("No workspace given and no default_workspace configured")?;

    let (notifier, rx) = Notifier::channel();
    let printer = spawn_notification_printer(rx);

    let set = WorkspaceDocumentSet::open(ctx.api.clone(), &workspace_id, notifier).await;
    let chat = ChatSession::new(ctx.api.clone(), Some(workspace_id.clone()));

    println!("{} ({})", set.name(), set.workspace_id());
    print_papers(&set);
    for message in chat.messages() {
        print_message(&message);
    }
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(|e| e.to_string())? {
        let line = line.trim();
        let (command, arg) = line
            .split_once(' ')
            .map_or((line, ""), |(c, rest)| (c, rest.trim()));

        match command {
            "" => continue,
            "/quit" | "/exit" => break,
            "/help" => println!("{}", HELP),
            "/papers" => print_papers(&set),
            "/refresh" => {
                if let Err(e) = set.refresh().await {
                    eprintln!("Failed to load papers: {}", e);
                }
                print_papers(&set);
            }
            "/search" => match set.search(arg).await {
                Ok(_) => print_results(&set),
                Err(DocumentError::EmptyQuery) => eprintln!("Usage: /search <query>"),
                Err(_) => {}
            },
            "/results" => print_results(&set),
            "/add" => add(&set, arg).await,
            "/remove" => match set.remove_paper(arg).await {
                Ok(()) => println!("Removed {}", arg),
                Err(e) if matches!(e, DocumentError::NotFound(_) | DocumentError::InFlight(_)) => {
                    eprintln!("{}", e)
                }
                Err(_) => {}
            },
            "/process" => {
                let _ = set.process_paper(arg).await;
            }
            "/summarize" => {
                let ids: Vec<String> = arg.split_whitespace().map(String::from).collect();
                if ids.is_empty() {
                    eprintln!("Please select at least one paper");
                } else {
                    print!("{}", set.summarize(&ids).await);
                }
            }
            "/upload" => {
                let _ = set.upload_pdf(Path::new(arg)).await;
            }
            _ => match chat.ask(line).await {
                Ok(reply) => print_message(&reply),
                Err(e) => eprintln!("{}", e),
            },
        }
    }

    // Teardown: the controllers go first so the notification channel closes.
    drop(chat);
    drop(set);
    let _ = printer.await;
    Ok(())
}

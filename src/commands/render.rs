use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;

use crate::controllers::{Notification, NotificationLevel};
use crate::models::{ChatMessage, Role, SearchResult, WorkspacePaper};

pub fn print_message(message: &ChatMessage) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    println!("[{}] {}:\n{}\n", message.timestamp.format("%H:%M"), who, message.content);
}

pub fn print_paper(paper: &WorkspacePaper) {
    println!("  {}  {}", paper.id, paper.title);
    if !paper.authors.is_empty() {
        println!("      {}", paper.authors.join(", "));
    }
}

pub fn print_result(index: usize, result: &SearchResult, added: bool) {
    let marker = if added { "added" } else { "" };
    println!("{:>3}. {} {}", index, result.title, marker);
    println!(
        "     {} | {} | {} citations | {}",
        result.authors.join(", "),
        result.date,
        result.citations,
        result.tags.join(", ")
    );
    println!("     {}", result.pdf_url());
}

/// Print notifications until every sender is gone.
pub fn spawn_notification_printer(mut rx: UnboundedReceiver<Notification>) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(notification) = rx.recv().await {
            let tag = match notification.level {
                NotificationLevel::Info => "..",
                NotificationLevel::Success => "ok",
                NotificationLevel::Error => "!!",
            };
            eprintln!("[{}] {}: {}", tag, notification.title, notification.description);
        }
    })
}

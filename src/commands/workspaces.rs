use clap::Subcommand;

use super::render::print_paper;
use super::Context;
use crate::models::NewWorkspace;

#[derive(Debug, Subcommand)]
pub enum WorkspaceAction {
    /// List your workspaces
    List,
    /// Create a workspace
    Create {
        name: String,
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a workspace and its papers
    Show { id: String },
}

pub async fn run(action: WorkspaceAction) -> Result<(), String> {
    let ctx = Context::load()?;
    match action {
        WorkspaceAction::List => {
            let workspaces = ctx
                .api
                .list_workspaces()
                .await
                .map_err(|e| format!("Failed to load workspaces: {}", e))?;
            if workspaces.is_empty() {
                println!("No workspaces yet");
            }
            for workspace in workspaces {
                println!(
                    "{}  {}  {}",
                    workspace.id,
                    workspace.name,
                    workspace.description.unwrap_or_default()
                );
            }
        }
        WorkspaceAction::Create { name, description } => {
            if name.trim().is_empty() {
                return Err("Workspace name is required".to_string());
            }
            let workspace = ctx
                .api
                .create_workspace(&NewWorkspace {
                    name: name.trim().to_string(),
                    description,
                })
                .await
                .map_err(|e| format!("Failed to create workspace: {}", e))?;
            println!("Workspace created: {} ({})", workspace.name, workspace.id);
        }
        WorkspaceAction::Show { id } => {
            let (workspace, papers) = futures::join!(
                ctx.api.get_workspace(&id),
                ctx.api.list_workspace_papers(&id)
            );
            let workspace = workspace.map_err(|e| e.to_string())?;
            let papers = papers.map_err(|e| format!("Failed to load papers: {}", e))?;
            println!("{} ({} papers)", workspace.name, papers.len());
            for paper in &papers {
                print_paper(paper);
            }
        }
    }
    Ok(())
}

pub async fn documents() -> Result<(), String> {
    let ctx = Context::load()?;
    let documents = ctx
        .api
        .list_user_documents()
        .await
        .map_err(|e| format!("Failed to load documents: {}", e))?;
    for doc in documents {
        println!(
            "{}  {}  [{}]  {}",
            doc.id,
            doc.name,
            doc.workspace_name,
            doc.created_at.unwrap_or_default()
        );
    }
    Ok(())
}

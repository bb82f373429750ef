mod auth;
mod chat;
mod config;
mod papers;
mod render;
mod workspace_view;
mod workspaces;

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::services::auth_service::AuthService;
use crate::services::config_service::{self, Settings};
use crate::services::{ApiClient, StaticToken, TokenSource};

pub const TOKEN_ENV: &str = "RESEARCHPILOT_TOKEN";

#[derive(Debug, Parser)]
#[command(name = "researchpilot", version, about = "Search, import and chat with research papers")]
pub struct Cli {
    /// Log more (repeat for debug output)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show or change settings
    Config {
        #[command(subcommand)]
        action: config::ConfigAction,
    },
    /// Manage workspaces
    Workspaces {
        #[command(subcommand)]
        action: workspaces::WorkspaceAction,
    },
    /// List documents across all workspaces
    Documents,
    /// Search for papers
    Search { query: Vec<String> },
    /// Summarize a paper from its title and abstract
    Summarize {
        #[arg(long)]
        title: String,
        #[arg(long = "abstract")]
        abstract_text: String,
    },
    /// Upload a PDF into a workspace
    Upload { workspace: String, file: PathBuf },
    /// Chat with a workspace's documents
    Chat {
        #[arg(short, long)]
        workspace: Option<String>,
        /// Ask one question and exit
        #[arg(short, long)]
        question: Option<String>,
    },
    /// Open a workspace: papers, search/import and chat
    Open { workspace: Option<String> },
}

pub(crate) struct Context {
    pub settings: Settings,
    pub api: ApiClient,
}

impl Context {
    pub fn load() -> Result<Self, String> {
        let settings = config_service::get_settings()?;
        let api = ApiClient::from_settings(&settings, token_source(&settings))
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;
        Ok(Self { settings, api })
    }

    /// Explicit workspace, else the configured default.
    pub fn workspace_or_default(&self, workspace: Option<String>) -> Option<String> {
        workspace.or_else(|| self.settings.default_workspace.clone())
    }
}

fn token_source(settings: &Settings) -> Arc<dyn TokenSource> {
    if let Some(token) = std::env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty()) {
        return Arc::new(StaticToken::new(token));
    }
    match AuthService::from_settings(settings) {
        Ok(auth) => Arc::new(auth),
        Err(e) => {
            tracing::debug!(reason = %e, "No identity provider configured; requests go out anonymous");
            Arc::new(StaticToken::anonymous())
        }
    }
}

pub async fn dispatch(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Login { email, password } => auth::login(&email, password).await,
        Command::Signup { email, password } => auth::signup(&email, password).await,
        Command::Logout => auth::logout(),
        Command::Whoami => auth::whoami().await,
        Command::Config { action } => config::run(action),
        Command::Workspaces { action } => workspaces::run(action).await,
        Command::Documents => workspaces::documents().await,
        Command::Search { query } => papers::search(&query.join(" ")).await,
        Command::Summarize { title, abstract_text } => papers::summarize(title, abstract_text).await,
        Command::Upload { workspace, file } => papers::upload(&workspace, &file).await,
        Command::Chat { workspace, question } => chat::run(workspace, question).await,
        Command::Open { workspace } => workspace_view::run(workspace).await,
    }
}

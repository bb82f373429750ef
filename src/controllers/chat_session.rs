use std::sync::{Arc, Weak};

use chrono::Utc;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::task::JoinHandle;

use crate::models::{ChatMessage, ChatRequest, Role, Workspace};
use crate::services::ApiClient;

pub const GREETING: &str = "Hello! I'm your ResearchPilot AI assistant. I can help you analyze papers, answer research questions, generate summaries, and find connections across your imported documents. What would you like to explore today?";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error("Message is empty")]
    EmptyInput,
    #[error("Still waiting for the previous reply")]
    Busy,
    #[error("Please select a workspace first")]
    NoWorkspace,
    #[error("The reply could not be completed")]
    TurnFailed,
}

struct Transcript {
    workspace_id: Option<String>,
    messages: Vec<ChatMessage>,
    pending: bool,
    last_id: i64,
}

impl Transcript {
    fn fresh(workspace_id: Option<String>) -> Self {
        let mut transcript = Self {
            workspace_id,
            messages: Vec::new(),
            pending: false,
            last_id: 0,
        };
        transcript.push(Role::Assistant, GREETING.to_string());
        transcript
    }

    /// Ids follow the clock in milliseconds but never repeat or go backwards.
    fn push(&mut self, role: Role, content: String) {
        let timestamp = Utc::now();
        let id = timestamp.timestamp_millis().max(self.last_id + 1);
        self.last_id = id;
        self.messages.push(ChatMessage {
            id: id.to_string(),
            role,
            content,
            timestamp,
        });
    }
}

/// Holds the `pending` flag for one chat turn. The reply is appended and
/// the flag cleared together; if the turn never reaches that point the
/// flag is cleared on drop.
struct TurnGuard {
    transcript: Weak<Mutex<Transcript>>,
    finished: bool,
}

impl TurnGuard {
    fn finish(mut self, content: String) {
        self.finished = true;
        match self.transcript.upgrade() {
            Some(transcript) => {
                let mut transcript = transcript.lock();
                transcript.push(Role::Assistant, content);
                transcript.pending = false;
            }
            None => tracing::debug!("Chat session closed before the reply arrived"),
        }
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Some(transcript) = self.transcript.upgrade() {
            transcript.lock().pending = false;
        }
    }
}

/// Transcript and turn-taking for chatting with one workspace's documents.
pub struct ChatSession {
    api: ApiClient,
    transcript: Arc<Mutex<Transcript>>,
    workspaces: Vec<Workspace>,
}

impl ChatSession {
    pub fn new(api: ApiClient, workspace_id: Option<String>) -> Self {
        Self {
            api,
            transcript: Arc::new(Mutex::new(Transcript::fresh(workspace_id))),
            workspaces: Vec::new(),
        }
    }

    /// Bind to `workspace_id`, or when none is given, to the first of the
    /// user's workspaces.
    pub async fn bind(api: ApiClient, workspace_id: Option<String>) -> Self {
        if workspace_id.is_some() {
            return Self::new(api, workspace_id);
        }

        let mut session = Self::new(api, None);
        match session.api.list_workspaces().await {
            Ok(workspaces) => {
                let first = workspaces.first().map(|w| w.id.clone());
                tracing::debug!(count = workspaces.len(), selected = ?first, "Discovered workspaces");
                session.transcript.lock().workspace_id = first;
                session.workspaces = workspaces;
            }
            Err(e) => tracing::warn!(error = %e, "Failed to fetch workspaces"),
        }
        session
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn workspace_id(&self) -> Option<String> {
        self.transcript.lock().workspace_id.clone()
    }

    pub fn messages(&self) -> Vec<ChatMessage> {
        self.transcript.lock().messages.clone()
    }

    pub fn last_message(&self) -> Option<ChatMessage> {
        self.transcript.lock().messages.last().cloned()
    }

    pub fn is_pending(&self) -> bool {
        self.transcript.lock().pending
    }

    /// Switching to another workspace starts over with a new transcript.
    pub fn select_workspace(&self, workspace_id: &str) -> Result<(), ChatError> {
        let mut transcript = self.transcript.lock();
        if transcript.pending {
            return Err(ChatError::Busy);
        }
        if transcript.workspace_id.as_deref() == Some(workspace_id) {
            return Ok(());
        }
        *transcript = Transcript::fresh(Some(workspace_id.to_string()));
        Ok(())
    }

    /// Append the user's message and ask the backend. The returned task
    /// appends exactly one assistant message, the answer or an `Error: ...`
    /// line, and runs to completion even if the handle is dropped.
    pub fn submit(&self, text: &str) -> Result<JoinHandle<()>, ChatError> {
        let question = text.trim();
        if question.is_empty() {
            return Err(ChatError::EmptyInput);
        }

        let workspace_id = {
            let mut transcript = self.transcript.lock();
            if transcript.pending {
                return Err(ChatError::Busy);
            }
            let workspace_id = transcript
                .workspace_id
                .clone()
                .ok_or(ChatError::NoWorkspace)?;
            transcript.push(Role::User, question.to_string());
            transcript.pending = true;
            workspace_id
        };

        let guard = TurnGuard {
            transcript: Arc::downgrade(&self.transcript),
            finished: false,
        };
        let api = self.api.clone();
        let request = ChatRequest {
            workspace_id,
            question: question.to_string(),
        };

        Ok(tokio::spawn(async move {
            let content = match api.chat(&request).await {
                Ok(response) => response.into_content(),
                Err(e) => {
                    tracing::warn!(workspace_id = %request.workspace_id, error = %e, "Chat request failed");
                    format!("Error: {}", e)
                }
            };
            guard.finish(content);
        }))
    }

    /// Submit and wait for the reply.
    pub async fn ask(&self, text: &str) -> Result<ChatMessage, ChatError> {
        let turn = self.submit(text)?;
        self.await_reply(turn).await
    }

    /// The assistant message a finished turn appended.
    async fn await_reply(&self, turn: JoinHandle<()>) -> Result<ChatMessage, ChatError> {
        if let Err(e) = turn.await {
            tracing::error!(error = %e, "Chat turn did not complete");
            return Err(ChatError::TurnFailed);
        }
        match self.last_message() {
            Some(message) if message.role == Role::Assistant => Ok(message),
            _ => Err(ChatError::TurnFailed),
        }
    }
}

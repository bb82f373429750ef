use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// Body of `POST /rag/chat`
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub workspace_id: String,
    pub question: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
    #[serde(default)]
    pub sources: Option<Vec<String>>,
}

impl ChatResponse {
    /// Render the answer as transcript content, with a trailing sources list
    /// when the backend cited anything.
    pub fn into_content(self) -> String {
        match self.sources {
            Some(sources) if !sources.is_empty() => {
                let list = sources
                    .iter()
                    .map(|s| format!("- {}", s))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("{}\n\n**Sources:**\n{}", self.answer, list)
            }
            _ => self.answer,
        }
    }
}

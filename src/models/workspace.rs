use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of `POST /workspaces/`
#[derive(Debug, Clone, Serialize)]
pub struct NewWorkspace {
    pub name: String,
    pub description: Option<String>,
}

/// Raw row of `GET /workspaces/user/papers`
#[derive(Debug, Clone, Deserialize)]
pub struct UserDocumentRow {
    pub id: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub workspace_id: Option<String>,
    #[serde(default)]
    pub workspace_name: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A document as listed across all of the user's workspaces
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserDocument {
    pub id: String,
    pub name: String,
    pub workspace_id: Option<String>,
    pub workspace_name: String,
    pub created_at: Option<String>,
}

impl From<UserDocumentRow> for UserDocument {
    fn from(row: UserDocumentRow) -> Self {
        let name = row
            .filename
            .filter(|s| !s.is_empty())
            .or(row.title.filter(|s| !s.is_empty()))
            .unwrap_or_else(|| "Untitled".to_string());

        Self {
            id: row.id,
            name,
            workspace_id: row.workspace_id,
            workspace_name: row
                .workspace_name
                .unwrap_or_else(|| "Unknown Workspace".to_string()),
            created_at: row.created_at,
        }
    }
}

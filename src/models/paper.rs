use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_TAG: &str = "Research";

/// Uploaded documents come back with `null` metadata; treat it like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Paper as returned by `GET /papers/search`, before defaults are applied.
#[derive(Debug, Clone, Deserialize)]
pub struct RawSearchPaper {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(default, rename = "abstract", deserialize_with = "null_as_default")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default)]
    pub citations: Option<u32>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub papers: Vec<RawSearchPaper>,
}

/// A search hit; not tied to any workspace until imported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub id: String,
    pub title: String,
    pub authors: Vec<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub date: String,
    pub source: String,
    pub link: String,
    pub citations: u32,
    pub tags: Vec<String>,
}

impl From<RawSearchPaper> for SearchResult {
    fn from(raw: RawSearchPaper) -> Self {
        let tags = match raw.tags {
            Some(tags) if !tags.is_empty() => tags,
            _ => vec![DEFAULT_TAG.to_string()],
        };

        Self {
            id: raw.id,
            title: raw.title,
            authors: raw.authors,
            abstract_text: raw.abstract_text,
            date: raw.date,
            source: raw.source,
            link: raw.link,
            citations: raw.citations.unwrap_or(0),
            tags,
        }
    }
}

impl SearchResult {
    /// Direct PDF location for arXiv-style abstract links.
    pub fn pdf_url(&self) -> String {
        format!("{}.pdf", self.link.replace("/abs/", "/pdf/"))
    }

    pub fn into_workspace_paper(self, workspace_id: &str) -> WorkspacePaper {
        WorkspacePaper {
            id: self.id,
            workspace_id: workspace_id.to_string(),
            title: self.title,
            authors: self.authors,
            abstract_text: self.abstract_text,
            date: self.date,
            source: self.source,
            link: self.link,
            tags: self.tags,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspacePaper {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub workspace_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub authors: Vec<String>,
    #[serde(default, rename = "abstract", deserialize_with = "null_as_default")]
    pub abstract_text: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub date: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub source: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
}

/// Body of `POST /workspaces/{id}/papers`
#[derive(Debug, Clone, Serialize)]
pub struct PaperPayload<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub authors: &'a [String],
    #[serde(rename = "abstract")]
    pub abstract_text: &'a str,
    pub date: &'a str,
    pub source: &'a str,
    pub link: &'a str,
}

impl<'a> From<&'a WorkspacePaper> for PaperPayload<'a> {
    fn from(paper: &'a WorkspacePaper) -> Self {
        Self {
            id: &paper.id,
            title: &paper.title,
            authors: &paper.authors,
            abstract_text: &paper.abstract_text,
            date: &paper.date,
            source: &paper.source,
            link: &paper.link,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummarizeRequest {
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SummarizeResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub document_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;

use super::notify::Notifier;
use crate::models::{SearchResult, SummarizeRequest, WorkspacePaper};
use crate::services::{ApiClient, ApiError};

const DEFAULT_WORKSPACE_NAME: &str = "Workspace";

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Search query is empty")]
    EmptyQuery,
    #[error("A search is already running")]
    Busy,
    #[error("Paper {0} is already in this workspace")]
    AlreadyPresent(String),
    #[error("Paper {0} is not in this workspace")]
    NotFound(String),
    #[error("Paper {0} still has a request in flight")]
    InFlight(String),
    #[error("Please upload PDF files only")]
    NotPdf,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Client-visible lifecycle of one paper. Untracked papers are absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaperStatus {
    /// Shown, waiting for the server to accept the import.
    PendingAdd,
    Present,
    /// Hidden, waiting for the server to confirm the delete.
    PendingRemove,
}

impl PaperStatus {
    pub fn is_visible(self) -> bool {
        !matches!(self, PaperStatus::PendingRemove)
    }
}

#[derive(Debug, Clone)]
struct TrackedPaper {
    paper: WorkspacePaper,
    status: PaperStatus,
}

#[derive(Debug, Default)]
struct DocumentState {
    name: String,
    papers: Vec<TrackedPaper>,
    results: Vec<SearchResult>,
    has_searched: bool,
    searching: bool,
    loading: bool,
}

impl DocumentState {
    fn position(&self, paper_id: &str) -> Option<usize> {
        self.papers.iter().position(|t| t.paper.id == paper_id)
    }

    fn status(&self, paper_id: &str) -> Option<PaperStatus> {
        self.position(paper_id).map(|i| self.papers[i].status)
    }

    fn forget(&mut self, paper_id: &str) {
        self.papers.retain(|t| t.paper.id != paper_id);
    }

    fn set_status(&mut self, paper_id: &str, status: PaperStatus) {
        if let Some(i) = self.position(paper_id) {
            self.papers[i].status = status;
        }
    }
}

/// Set → request → cleared on every exit path.
struct BusyFlag {
    state: Arc<Mutex<DocumentState>>,
    flag: fn(&mut DocumentState) -> &mut bool,
}

impl BusyFlag {
    /// `None` if the flag is already raised.
    fn raise(state: &Arc<Mutex<DocumentState>>, flag: fn(&mut DocumentState) -> &mut bool) -> Option<Self> {
        let mut guard = state.lock();
        let raised = flag(&mut *guard);
        if *raised {
            return None;
        }
        *raised = true;
        Some(Self {
            state: state.clone(),
            flag,
        })
    }
}

impl Drop for BusyFlag {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        *(self.flag)(&mut *state) = false;
    }
}

/// Rolls an optimistic import back unless the server confirmed it.
struct PendingAdd<'a> {
    state: &'a Mutex<DocumentState>,
    paper_id: String,
    confirmed: bool,
}

impl PendingAdd<'_> {
    fn confirm(mut self) {
        self.confirmed = true;
        self.state.lock().set_status(&self.paper_id, PaperStatus::Present);
    }
}

impl Drop for PendingAdd<'_> {
    fn drop(&mut self) {
        if self.confirmed {
            return;
        }
        let mut state = self.state.lock();
        if state.status(&self.paper_id) == Some(PaperStatus::PendingAdd) {
            state.forget(&self.paper_id);
        }
    }
}

/// The papers of one workspace as the user sees them, kept in step with
/// the server through optimistic edits, rollbacks and refetches.
pub struct WorkspaceDocumentSet {
    api: ApiClient,
    workspace_id: String,
    state: Arc<Mutex<DocumentState>>,
    notifier: Notifier,
}

impl WorkspaceDocumentSet {
    /// Unloaded set; call [`refresh`](Self::refresh) to populate it.
    pub fn new(api: ApiClient, workspace_id: &str, notifier: Notifier) -> Self {
        Self {
            api,
            workspace_id: workspace_id.to_string(),
            state: Arc::new(Mutex::new(DocumentState {
                name: DEFAULT_WORKSPACE_NAME.to_string(),
                ..DocumentState::default()
            })),
            notifier,
        }
    }

    /// Load the workspace's details and papers.
    pub async fn open(api: ApiClient, workspace_id: &str, notifier: Notifier) -> Self {
        let set = Self::new(api, workspace_id, notifier);

        let (details, papers) = futures::join!(
            set.api.get_workspace(&set.workspace_id),
            set.refresh()
        );
        match details {
            Ok(workspace) => set.state.lock().name = workspace.name,
            Err(e) => tracing::warn!(workspace_id = %set.workspace_id, error = %e, "Error fetching workspace details"),
        }
        if let Err(e) = papers {
            set.notifier.error(format!("Failed to load papers: {}", e));
        }
        set
    }

    pub fn workspace_id(&self) -> &str {
        &self.workspace_id
    }

    pub fn name(&self) -> String {
        self.state.lock().name.clone()
    }

    /// Papers currently shown, in insertion order.
    pub fn papers(&self) -> Vec<WorkspacePaper> {
        self.state
            .lock()
            .papers
            .iter()
            .filter(|t| t.status.is_visible())
            .map(|t| t.paper.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.state.lock().papers.iter().filter(|t| t.status.is_visible()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn status(&self, paper_id: &str) -> Option<PaperStatus> {
        self.state.lock().status(paper_id)
    }

    /// An import is only offered for papers not tracked yet.
    pub fn can_import(&self, paper_id: &str) -> bool {
        self.status(paper_id).is_none()
    }

    pub fn results(&self) -> Vec<SearchResult> {
        self.state.lock().results.clone()
    }

    pub fn has_searched(&self) -> bool {
        self.state.lock().has_searched
    }

    pub fn is_searching(&self) -> bool {
        self.state.lock().searching
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Replace the set with the server's view. Imports still in flight stay.
    pub async fn refresh(&self) -> Result<(), DocumentError> {
        let _loading = BusyFlag::raise(&self.state, |s| &mut s.loading);

        let fetched = self
            .api
            .list_workspace_papers(&self.workspace_id)
            .await
            .map_err(|e| {
                tracing::warn!(workspace_id = %self.workspace_id, error = %e, "Error fetching papers");
                e
            })?;

        let mut state = self.state.lock();
        let in_flight: Vec<TrackedPaper> = state
            .papers
            .drain(..)
            .filter(|t| t.status == PaperStatus::PendingAdd)
            .filter(|t| !fetched.iter().any(|p| p.id == t.paper.id))
            .collect();

        state.papers = fetched
            .into_iter()
            .map(|paper| TrackedPaper {
                paper,
                status: PaperStatus::Present,
            })
            .chain(in_flight)
            .collect();
        tracing::debug!(workspace_id = %self.workspace_id, count = state.papers.len(), "Papers loaded");
        Ok(())
    }

    /// Search the paper index. Returns how many results came back.
    pub async fn search(&self, query: &str) -> Result<usize, DocumentError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(DocumentError::EmptyQuery);
        }

        let _searching =
            BusyFlag::raise(&self.state, |s| &mut s.searching).ok_or(DocumentError::Busy)?;
        self.state.lock().has_searched = true;

        match self.api.search_papers(query).await {
            Ok(results) => {
                let count = results.len();
                self.state.lock().results = results;
                tracing::debug!(query, count, "Search finished");
                Ok(count)
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "Search failed");
                self.notifier.error(format!("Search failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Import a search result. It is shown immediately and withdrawn again
    /// if the server refuses it.
    pub async fn add_paper(&self, result: &SearchResult) -> Result<(), DocumentError> {
        let paper = result.clone().into_workspace_paper(&self.workspace_id);
        {
            let mut state = self.state.lock();
            if state.status(&paper.id).is_some() {
                return Err(DocumentError::AlreadyPresent(paper.id));
            }
            state.papers.push(TrackedPaper {
                paper: paper.clone(),
                status: PaperStatus::PendingAdd,
            });
        }

        let pending = PendingAdd {
            state: self.state.as_ref(),
            paper_id: paper.id.clone(),
            confirmed: false,
        };

        match self.api.add_workspace_paper(&self.workspace_id, &paper).await {
            Ok(_) => {
                pending.confirm();
                tracing::info!(workspace_id = %self.workspace_id, paper_id = %paper.id, "Paper added");
                self.notifier.success("Paper added to workspace");
                Ok(())
            }
            Err(e) => {
                drop(pending);
                tracing::warn!(workspace_id = %self.workspace_id, paper_id = %paper.id, error = %e, "Add rolled back");
                self.notifier.error(format!("Failed to add paper: {}", e));
                Err(e.into())
            }
        }
    }

    /// Remove a paper. On failure the whole set is fetched again rather
    /// than restoring the old entry.
    pub async fn remove_paper(&self, paper_id: &str) -> Result<(), DocumentError> {
        {
            let mut state = self.state.lock();
            match state.status(paper_id) {
                None => return Err(DocumentError::NotFound(paper_id.to_string())),
                Some(PaperStatus::Present) => state.set_status(paper_id, PaperStatus::PendingRemove),
                Some(_) => return Err(DocumentError::InFlight(paper_id.to_string())),
            }
        }

        match self.api.remove_workspace_paper(&self.workspace_id, paper_id).await {
            Ok(()) => {
                self.state.lock().forget(paper_id);
                tracing::info!(workspace_id = %self.workspace_id, paper_id, "Paper removed");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(workspace_id = %self.workspace_id, paper_id, error = %e, "Remove failed, refetching");
                self.notifier.error("Failed to remove paper");
                if let Err(refetch) = self.refresh().await {
                    tracing::warn!(error = %refetch, "Refetch after failed remove also failed");
                    // Keep showing the paper rather than a set we know is wrong.
                    self.state.lock().set_status(paper_id, PaperStatus::Present);
                }
                Err(e.into())
            }
        }
    }

    /// Ask the backend to ingest a paper for chat. Only notifications change.
    pub async fn process_paper(&self, paper_id: &str) -> Result<(), DocumentError> {
        self.notifier.info("Processing Paper", "Analysing content for AI chat...");

        match self.api.process_paper(paper_id).await {
            Ok(()) => {
                tracing::info!(paper_id, "Paper processed");
                self.notifier.success("Paper processed! You can now chat about it.");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(paper_id, error = %e, "Processing failed");
                self.notifier.error("Failed to process paper");
                Err(e.into())
            }
        }
    }

    /// Summaries of the given papers as one markdown document. Papers that
    /// fail to summarize are left out.
    pub async fn summarize(&self, paper_ids: &[String]) -> String {
        let papers: Vec<WorkspacePaper> = self
            .papers()
            .into_iter()
            .filter(|p| paper_ids.contains(&p.id))
            .collect();

        let mut output = String::new();
        for paper in papers {
            let request = SummarizeRequest {
                title: paper.title.clone(),
                abstract_text: paper.abstract_text.clone(),
            };
            match self.api.summarize_paper(&request).await {
                Ok(response) => {
                    output.push_str(&format!("### {}\n{}\n\n", paper.title, response.summary));
                }
                Err(e) => {
                    tracing::warn!(paper_id = %paper.id, error = %e, "Summary failed");
                    self.notifier
                        .error(format!("Failed to generate summary for {}", paper.title));
                }
            }
        }
        output
    }

    /// Upload a local PDF into this workspace, then reload the set.
    pub async fn upload_pdf(&self, path: &Path) -> Result<(), DocumentError> {
        let is_pdf = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case("pdf"));
        if !is_pdf {
            self.notifier.error("Please upload PDF files only");
            return Err(DocumentError::NotPdf);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        match self.api.upload_pdf(&self.workspace_id, path).await {
            Ok(response) => {
                tracing::info!(document_id = ?response.document_id, file = %name, "Upload indexed");
                self.notifier
                    .success(format!("\"{}\" uploaded and indexed successfully", name));
                if let Err(e) = self.refresh().await {
                    tracing::warn!(error = %e, "Reload after upload failed");
                }
                Ok(())
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Upload failed");
                self.notifier
                    .error(format!("Failed to upload {}: {}", name, e));
                Err(e.into())
            }
        }
    }
}

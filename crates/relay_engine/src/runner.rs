use std::path::{Path, PathBuf};
use std::sync::Arc;

use relay_core::{classify_path, update, ColumnProjection, Effect, Msg, PageRole, SessionError};
use relay_logging::{relay_debug, relay_info, relay_warn, set_page_load};
use thiserror::Error;

use crate::export::{export_results, ExportSettings};
use crate::form::FormError;
use crate::persist::PersistError;
use crate::scrape::ScrapeError;
use crate::store::{clear_session, load_snapshot, save_snapshot, KeyValueStore, StoreError};
use crate::upload::{upload_queries, UploadError, UploadSummary};
use crate::{Browser, FetchError, Page, RunEvent, SiteProfile};

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("page load failed: {0}")]
    Fetch(#[from] FetchError),
    #[error("form injection failed: {0}")]
    Form(#[from] FormError),
    #[error("scraping failed: {0}")]
    Scrape(#[from] ScrapeError),
    #[error("state store failed: {0}")]
    Store(#[from] StoreError),
    #[error("export failed: {0}")]
    Export(#[from] PersistError),
    #[error("upload failed: {0}")]
    Upload(#[from] UploadError),
    #[error("{remaining} queries remain but the session was cleared")]
    QueriesRemain { remaining: usize },
    #[error("page load at {0} led nowhere")]
    Stalled(String),
}

/// Result of handling one page load.
#[derive(Debug)]
pub enum Step {
    /// The page navigated on; handle the new page next.
    Navigated(Page),
    /// Autoclick is off and the user chose to stop here.
    Paused { remaining: usize },
    /// The queue is drained and the results were written to this file.
    Finished(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Finished { path: PathBuf, page_loads: u64 },
    Paused { remaining: usize },
}

pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: RunEvent);
}

/// Reports progress through the workspace logger.
#[derive(Debug, Default)]
pub struct LogProgressSink;

impl ProgressSink for LogProgressSink {
    fn emit(&self, event: RunEvent) {
        match event {
            RunEvent::QuerySubmitted { row, remaining } => {
                relay_info!("Submitted query [{}], {} left", row, remaining)
            }
            RunEvent::ResultAppended { rows, remaining } => {
                relay_info!("Result appended, {} rows scraped, {} queries left", rows, remaining)
            }
            RunEvent::Paused { remaining } => {
                relay_info!("Paused with {} queries left", remaining)
            }
            RunEvent::Finished { path, rows } => {
                relay_info!("Finished: {} rows written to {:?}", rows, path)
            }
        }
    }
}

/// Asked between queries when autoclick is off.
#[async_trait::async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, remaining: usize) -> bool;
}

#[derive(Debug, Default)]
pub struct AlwaysConfirm;

#[async_trait::async_trait]
impl Confirmer for AlwaysConfirm {
    async fn confirm(&self, _remaining: usize) -> bool {
        true
    }
}

/// Drives a site one page load at a time.
///
/// Nothing is carried from one page load to the next except the page itself:
/// every call to [`QueryRunner::handle_page`] starts by reading the session
/// back from the store.
pub struct QueryRunner {
    browser: Arc<dyn Browser>,
    store: Arc<dyn KeyValueStore>,
    site: Arc<dyn SiteProfile>,
    confirmer: Arc<dyn Confirmer>,
    sink: Arc<dyn ProgressSink>,
    export: ExportSettings,
}

impl QueryRunner {
    pub fn new(
        browser: Arc<dyn Browser>,
        store: Arc<dyn KeyValueStore>,
        site: Arc<dyn SiteProfile>,
        export: ExportSettings,
    ) -> Self {
        Self {
            browser,
            store,
            site,
            confirmer: Arc::new(AlwaysConfirm),
            sink: Arc::new(LogProgressSink),
            export,
        }
    }

    pub fn with_confirmer(mut self, confirmer: Arc<dyn Confirmer>) -> Self {
        self.confirmer = confirmer;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Stores a query file as a new session, then follows the upload's
    /// navigation and runs until the session ends.
    pub async fn upload_and_run(
        &self,
        path: &Path,
        projection: Option<&ColumnProjection>,
        autoclick: bool,
    ) -> Result<(UploadSummary, RunOutcome), RunError> {
        let summary = upload_queries(
            self.store.as_ref(),
            &self.site.keys(),
            path,
            projection,
            autoclick,
        )
        .await?;
        if !summary.effects.contains(&Effect::NavigateToStart) {
            return Err(RunError::Stalled(path.display().to_string()));
        }
        let outcome = self.start().await?;
        Ok((summary, outcome))
    }

    /// Opens the start page and runs from the persisted session.
    pub async fn start(&self) -> Result<RunOutcome, RunError> {
        set_page_load(0);
        let page = self.browser.open(self.site.start_url()).await?;
        self.run(page).await
    }

    pub async fn run(&self, first: Page) -> Result<RunOutcome, RunError> {
        let mut page = first;
        let mut page_loads = 0u64;
        loop {
            page_loads += 1;
            set_page_load(page_loads);
            match self.handle_page(page).await? {
                Step::Navigated(next) => page = next,
                Step::Paused { remaining } => return Ok(RunOutcome::Paused { remaining }),
                Step::Finished(path) => return Ok(RunOutcome::Finished { path, page_loads }),
            }
        }
    }

    /// Handles a single page load.
    pub async fn handle_page(&self, page: Page) -> Result<Step, RunError> {
        let keys = self.site.keys();
        let snapshot = load_snapshot(self.store.as_ref(), &keys).await?;
        let role = classify_path(page.path(), self.site.paths())?;
        relay_debug!("Page {} classified as {:?}", page.url, role);
        if role == PageRole::Result && snapshot.queue.is_none() {
            return Err(SessionError::NoQueryFile.into());
        }

        let msg = match role {
            PageRole::Input => Msg::InputPageLoaded,
            PageRole::Result => Msg::ResultPageLoaded {
                scraped: self.site.scrape(&page)?,
            },
        };
        let (snapshot, effects) = update(snapshot, msg)?;
        // The shortened queue is stored before the form goes out.
        save_snapshot(self.store.as_ref(), &keys, &snapshot).await?;

        let remaining = snapshot.remaining();
        let rows = snapshot.results.row_count();
        if role == PageRole::Result {
            self.sink.emit(RunEvent::ResultAppended { rows, remaining });
        }

        let mut step = None;
        for effect in effects {
            match effect {
                Effect::NavigateToStart => {
                    step = Some(Step::Navigated(
                        self.browser.open(self.site.start_url()).await?,
                    ));
                }
                Effect::SubmitQuery { row } => {
                    let form = self.site.fill_form(&page, &row)?;
                    self.sink.emit(RunEvent::QuerySubmitted { row, remaining });
                    step = Some(Step::Navigated(self.browser.submit(&form).await?));
                }
                Effect::ReturnToInput => {
                    step = Some(self.return_to_input(&page).await?);
                }
                Effect::AwaitConfirmation { remaining } => {
                    if self.confirmer.confirm(remaining).await {
                        step = Some(self.return_to_input(&page).await?);
                    } else {
                        self.sink.emit(RunEvent::Paused { remaining });
                        step = Some(Step::Paused { remaining });
                    }
                }
                Effect::Download { csv } => {
                    let stamp = (self.export.timestamp)();
                    let path =
                        export_results(&self.export.output_dir, self.site.source(), &stamp, &csv)?;
                    self.sink.emit(RunEvent::Finished {
                        path: path.clone(),
                        rows,
                    });
                    step = Some(Step::Finished(path));
                }
                Effect::ClearSession => {
                    clear_session(self.store.as_ref(), &keys).await?;
                    let after = load_snapshot(self.store.as_ref(), &keys).await?;
                    if let Some(queue) = after.queue {
                        relay_warn!("Session cleared but {} still present", keys.queries);
                        return Err(RunError::QueriesRemain {
                            remaining: queue.len(),
                        });
                    }
                }
            }
        }

        step.ok_or_else(|| RunError::Stalled(page.url.to_string()))
    }

    async fn return_to_input(&self, page: &Page) -> Result<Step, RunError> {
        let target = self.site.return_to_input(page);
        Ok(Step::Navigated(self.browser.open(&target).await?))
    }
}

//! Relay engine: browser session, page handling and persisted session state.
mod browser;
mod decode;
mod export;
mod form;
mod persist;
mod runner;
mod scrape;
mod site;
mod store;
mod types;
mod upload;

pub use browser::{Browser, FetchSettings, ReqwestBrowser};
pub use decode::{decode_page, DecodeError};
pub use export::{export_filename, export_results, ExportSettings};
pub use form::{build_submission, FormError, SubmitButton};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use runner::{
    AlwaysConfirm, Confirmer, LogProgressSink, ProgressSink, QueryRunner, RunError, RunOutcome,
    Step,
};
pub use scrape::{scrape_table, ScrapeError};
pub use site::{SiteConfig, SiteProfile, TableFormSite};
pub use store::{
    clear_session, load_snapshot, save_snapshot, FileStore, KeyValueStore, MemoryStore,
    StoreError, StoreKeys, StoredValue, AUTOCLICK_KEY, STATE_FILENAME,
};
pub use types::{FailureKind, FetchError, FormMethod, FormSubmission, Page, RunEvent};
pub use upload::{upload_queries, UploadError, UploadSummary};

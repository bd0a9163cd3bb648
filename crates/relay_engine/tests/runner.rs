use std::fs;
use std::sync::{Arc, Mutex, Once};

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use relay_core::{ColumnProjection, SessionError};
use relay_engine::{
    load_snapshot, Confirmer, ExportSettings, FetchSettings, FileStore, KeyValueStore,
    MemoryStore, Page, ProgressSink, QueryRunner, ReqwestBrowser, RunError, RunEvent, RunOutcome,
    SiteConfig, SiteProfile, StoreError, StoredValue, SubmitButton, TableFormSite,
};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEARCH_PAGE: &str = r#"<html><body>
<form id="search" action="/reports/result" method="post">
  <input type="hidden" name="token" value="t0k">
  <input name="req"><input name="po">
  <input type="submit" name="go" value="Search">
</form></body></html>"#;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

fn result_page(req: &str, status: &str) -> String {
    format!(
        "<html><body><table id=\"out\"><tr><th>Req</th><th>Status</th></tr>\
         <tr><td>{req}</td><td>{status}</td></tr></table></body></html>"
    )
}

async fn mount_site(server: &MockServer, answers: &[(&str, &str)]) {
    Mock::given(method("GET"))
        .and(path("/reports/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SEARCH_PAGE, "text/html"))
        .mount(server)
        .await;
    for (req, status) in answers {
        Mock::given(method("POST"))
            .and(path("/reports/result"))
            .and(body_string_contains(format!("req={req}&")))
            .and(body_string_contains("token=t0k"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(result_page(req, status), "text/html"),
            )
            .expect(1)
            .mount(server)
            .await;
    }
}

fn site(server: &MockServer) -> TableFormSite {
    TableFormSite::new(SiteConfig {
        source: "po".to_string(),
        start_url: format!("{}/reports/search", server.uri()),
        input_path: "/reports/search".to_string(),
        result_path: "/reports/result".to_string(),
        form_selector: "form#search".to_string(),
        fields: vec!["req".to_string(), "po".to_string()],
        submit: Some(SubmitButton {
            name: "go".to_string(),
            value: "Search".to_string(),
        }),
        table_selector: "table#out".to_string(),
        return_url: None,
    })
}

struct Harness {
    _temp: TempDir,
    state_dir: std::path::PathBuf,
    output_dir: std::path::PathBuf,
    queries: std::path::PathBuf,
    store: Arc<FileStore>,
}

impl Harness {
    fn new(queries: &str) -> Self {
        let temp = TempDir::new().unwrap();
        let state_dir = temp.path().join("state");
        let output_dir = temp.path().join("out");
        let query_path = temp.path().join("queries.csv");
        fs::write(&query_path, queries).unwrap();
        Self {
            store: Arc::new(FileStore::new(&state_dir)),
            state_dir,
            output_dir,
            queries: query_path,
            _temp: temp,
        }
    }

    fn runner(&self, server: &MockServer) -> QueryRunner {
        let browser = ReqwestBrowser::new(FetchSettings::default()).unwrap();
        let mut export = ExportSettings::new(&self.output_dir);
        export.timestamp = Arc::new(|| "test".to_string());
        QueryRunner::new(
            Arc::new(browser),
            self.store.clone(),
            Arc::new(site(server)),
            export,
        )
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl ProgressSink for RecordingSink {
    fn emit(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}

struct Decline;

#[async_trait]
impl Confirmer for Decline {
    async fn confirm(&self, _remaining: usize) -> bool {
        false
    }
}

/// Store whose `del` silently leaves one key in place.
struct StickyKeyStore {
    inner: MemoryStore,
    sticky: String,
}

#[async_trait]
impl KeyValueStore for StickyKeyStore {
    async fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.inner.set(key, value).await
    }

    async fn del(&self, key: &str) -> Result<(), StoreError> {
        if key == self.sticky {
            return Ok(());
        }
        self.inner.del(key).await
    }
}

#[tokio::test]
async fn upload_runs_every_query_and_downloads_one_csv() {
    init_logging();
    let server = MockServer::start().await;
    mount_site(&server, &[("R2", "Shipped"), ("R4", "Open")]).await;
    let harness = Harness::new(
        "\"Req ID\",\"PO ID\"\n\"R1\",\"PO is awaiting dispatch\"\n\"R2\",\"P200\"\n\" \",\"P300\"\n\"R4\",\"P400\"\n",
    );
    let sink = Arc::new(RecordingSink::default());
    let runner = harness.runner(&server).with_sink(sink.clone());

    let (summary, outcome) = runner
        .upload_and_run(&harness.queries, Some(&ColumnProjection::default()), true)
        .await
        .expect("run completes");

    assert_eq!(summary.rows, 2);
    let path = match outcome {
        RunOutcome::Finished { path, page_loads } => {
            assert_eq!(page_loads, 4);
            path
        }
        other => panic!("unexpected outcome {other:?}"),
    };
    assert_eq!(path, harness.output_dir.join("po_results_test.csv"));
    assert_eq!(
        fs::read_to_string(&path).unwrap(),
        "Req,Status\nR2,Shipped\nR4,Open\n"
    );

    let keys = site(&server).keys();
    for key in [keys.queries.as_str(), keys.results.as_str(), "autoclick"] {
        assert_eq!(harness.store.get(key).await.unwrap(), None);
    }

    let events = sink.events.lock().unwrap();
    let submitted: Vec<String> = events
        .iter()
        .filter_map(|event| match event {
            RunEvent::QuerySubmitted { row, .. } => Some(row.to_string()),
            _ => None,
        })
        .collect();
    assert_eq!(submitted, vec!["R2,P200", "R4,P400"]);
    assert!(matches!(events.last(), Some(RunEvent::Finished { rows: 2, .. })));
}

#[tokio::test]
async fn declined_confirmation_pauses_and_resume_finishes() {
    init_logging();
    let server = MockServer::start().await;
    mount_site(&server, &[("R1", "Shipped"), ("R2", "Open")]).await;
    let harness = Harness::new("Req ID,PO ID\nR1,P1\nR2,P2\n");

    let paused = harness
        .runner(&server)
        .with_confirmer(Arc::new(Decline))
        .upload_and_run(&harness.queries, None, false)
        .await
        .expect("run pauses");
    assert_eq!(paused.1, RunOutcome::Paused { remaining: 1 });

    // A fresh runner over the same state directory picks up where it stopped.
    let store = FileStore::new(&harness.state_dir);
    let snapshot = load_snapshot(&store, &site(&server).keys()).await.unwrap();
    assert_eq!(snapshot.remaining(), 1);
    assert_eq!(snapshot.results.as_str(), "Req,Status\nR1,Shipped\n");
    assert!(!snapshot.autoclick);

    let outcome = harness.runner(&server).start().await.expect("resume");
    let path = match outcome {
        RunOutcome::Finished { path, .. } => path,
        other => panic!("resume did not finish: {other:?}"),
    };
    assert_eq!(
        fs::read_to_string(path).unwrap(),
        "Req,Status\nR1,Shipped\nR2,Open\n"
    );
}

#[tokio::test]
async fn start_without_upload_fails_with_no_query_file() {
    init_logging();
    let server = MockServer::start().await;
    mount_site(&server, &[]).await;
    let harness = Harness::new("");

    let err = harness.runner(&server).start().await.unwrap_err();
    assert!(matches!(err, RunError::Session(SessionError::NoQueryFile)));
}

#[tokio::test]
async fn unexpected_page_halts_the_run() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/search"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/login"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/login"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<form></form>", "text/html"))
        .mount(&server)
        .await;
    let harness = Harness::new("h\nR1,P1\n");

    let err = harness
        .runner(&server)
        .upload_and_run(&harness.queries, None, true)
        .await
        .unwrap_err();
    match err {
        RunError::Session(SessionError::UnknownPage { path }) => assert_eq!(path, "/login"),
        other => panic!("unexpected error {other:?}"),
    }

    // Nothing was consumed: the queue is still whole.
    assert_eq!(
        harness.store.get("po_queries").await.unwrap(),
        Some(StoredValue::Text("R1,P1".to_string()))
    );
}

#[tokio::test]
async fn missing_result_table_stops_after_queue_was_shortened() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/reports/search"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(SEARCH_PAGE, "text/html"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/reports/result"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<p>no data</p>", "text/html"))
        .mount(&server)
        .await;
    let harness = Harness::new("h\nR1,P1\nR2,P2\n");

    let err = harness
        .runner(&server)
        .upload_and_run(&harness.queries, None, true)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::Scrape(_)));
    assert_eq!(
        harness.store.get("po_queries").await.unwrap(),
        Some(StoredValue::Text("R2,P2".to_string()))
    );
}

#[tokio::test]
async fn queue_surviving_the_clear_is_reported() {
    init_logging();
    let server = MockServer::start().await;
    mount_site(&server, &[("R1", "Shipped")]).await;
    let harness = Harness::new("h\nR1,P1\n");
    let store = Arc::new(StickyKeyStore {
        inner: MemoryStore::new(),
        sticky: "po_queries".to_string(),
    });
    let mut export = ExportSettings::new(&harness.output_dir);
    export.timestamp = Arc::new(|| "test".to_string());
    let runner = QueryRunner::new(
        Arc::new(ReqwestBrowser::new(FetchSettings::default()).unwrap()),
        store.clone(),
        Arc::new(site(&server)),
        export,
    );

    let err = runner
        .upload_and_run(&harness.queries, None, true)
        .await
        .unwrap_err();
    assert!(matches!(err, RunError::QueriesRemain { remaining: 0 }));

    // The download happened before the clear; the other keys are gone.
    assert!(harness.output_dir.join("po_results_test.csv").exists());
    assert_eq!(store.get("po_results").await.unwrap(), None);
    assert_eq!(
        store.get("po_queries").await.unwrap(),
        Some(StoredValue::Text(String::new()))
    );
}

#[tokio::test]
async fn result_page_without_session_is_not_scraped() {
    init_logging();
    let server = MockServer::start().await;
    let harness = Harness::new("");
    let page = Page::new(
        Url::parse(&format!("{}/reports/result", server.uri())).unwrap(),
        "<p>no data</p>",
    );

    // The page has no table, so reaching the scraper would give a scrape error.
    let err = harness.runner(&server).handle_page(page).await.unwrap_err();
    assert!(matches!(err, RunError::Session(SessionError::NoQueryFile)));
    assert_eq!(harness.store.get("po_results").await.unwrap(), None);
}

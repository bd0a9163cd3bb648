use std::time::Duration;

use relay_engine::{
    Browser, FailureKind, FetchSettings, FormMethod, FormSubmission, ReqwestBrowser,
};
use url::Url;
use wiremock::matchers::{body_string, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn browser(settings: FetchSettings) -> ReqwestBrowser {
    ReqwestBrowser::new(settings).expect("client builds")
}

#[tokio::test]
async fn open_returns_decoded_page_at_final_url() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/start"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", "/reports/search"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reports/search"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("<html>form</html>", "text/html; charset=utf-8"),
        )
        .mount(&server)
        .await;

    let page = browser(FetchSettings::default())
        .open(&format!("{}/start", server.uri()))
        .await
        .expect("open ok");

    assert_eq!(page.path(), "/reports/search");
    assert_eq!(page.html, "<html>form</html>");
}

#[tokio::test]
async fn open_fails_on_http_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = browser(FetchSettings::default())
        .open(&format!("{}/missing", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::HttpStatus(404));
}

#[tokio::test]
async fn open_rejects_invalid_url() {
    let err = browser(FetchSettings::default())
        .open("not a url")
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::InvalidUrl);
}

#[tokio::test]
async fn open_rejects_non_html_content() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("%PDF", "application/pdf"))
        .mount(&server)
        .await;

    let err = browser(FetchSettings::default())
        .open(&format!("{}/report.pdf", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(
        err.kind,
        FailureKind::UnsupportedContentType {
            content_type: "application/pdf".to_string()
        }
    );
}

#[tokio::test]
async fn open_times_out_on_slow_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(250))
                .set_body_raw("slow", "text/html"),
        )
        .mount(&server)
        .await;

    let settings = FetchSettings {
        request_timeout: Duration::from_millis(50),
        ..FetchSettings::default()
    };
    let err = browser(settings)
        .open(&format!("{}/slow", server.uri()))
        .await
        .unwrap_err();
    assert_eq!(err.kind, FailureKind::Timeout);
}

#[tokio::test]
async fn open_rejects_too_large_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/large"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("01234567890", "text/html"))
        .mount(&server)
        .await;

    let settings = FetchSettings {
        max_bytes: 10,
        ..FetchSettings::default()
    };
    let err = browser(settings)
        .open(&format!("{}/large", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err.kind, FailureKind::TooLarge { max_bytes: 10, .. }));
}

#[tokio::test]
async fn submit_posts_urlencoded_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/reports/result"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string("token=abc&req=R+1&po=P%2F2"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("<table></table>", "text/html"))
        .mount(&server)
        .await;

    let form = FormSubmission {
        action: Url::parse(&format!("{}/reports/result", server.uri())).unwrap(),
        method: FormMethod::Post,
        fields: vec![
            ("token".to_string(), "abc".to_string()),
            ("req".to_string(), "R 1".to_string()),
            ("po".to_string(), "P/2".to_string()),
        ],
    };
    let page = browser(FetchSettings::default())
        .submit(&form)
        .await
        .expect("submit ok");
    assert_eq!(page.path(), "/reports/result");
}

#[tokio::test]
async fn submit_get_replaces_query_string() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/lookup"))
        .and(query_param("req", "R1"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("found", "text/html"))
        .mount(&server)
        .await;

    let form = FormSubmission {
        action: Url::parse(&format!("{}/lookup?stale=1", server.uri())).unwrap(),
        method: FormMethod::Get,
        fields: vec![("req".to_string(), "R1".to_string())],
    };
    let page = browser(FetchSettings::default())
        .submit(&form)
        .await
        .expect("submit ok");
    assert_eq!(page.url.query(), Some("req=R1"));
    assert_eq!(page.html, "found");
}

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use std::time::Duration;

use futures_util::StreamExt;
use relay_logging::relay_debug;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use url::form_urlencoded;

use crate::decode::decode_page;
use crate::{FailureKind, FetchError, FormMethod, FormSubmission, Page};

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub redirect_limit: usize,
    pub max_bytes: u64,
    pub allowed_content_types: Vec<String>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
            redirect_limit: 10,
            max_bytes: 10 * 1024 * 1024,
            allowed_content_types: vec![
                "text/html".to_string(),
                "application/xhtml+xml".to_string(),
            ],
        }
    }
}

/// The tab the session drives: loads pages and submits their forms.
#[async_trait::async_trait]
pub trait Browser: Send + Sync {
    async fn open(&self, url: &str) -> Result<Page, FetchError>;

    async fn submit(&self, form: &FormSubmission) -> Result<Page, FetchError>;
}

/// HTTP-backed browser. One client is kept for the whole session so cookies
/// set by the site survive from one page load to the next.
#[derive(Debug, Clone)]
pub struct ReqwestBrowser {
    settings: FetchSettings,
    client: reqwest::Client,
    redirect_counter: Arc<AtomicUsize>,
}

impl ReqwestBrowser {
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let redirect_counter = Arc::new(AtomicUsize::new(0));
        let counter = redirect_counter.clone();
        let redirect_limit = settings.redirect_limit;
        let policy = reqwest::redirect::Policy::custom(move |attempt| {
            let count = attempt.previous().len();
            counter.store(count, Ordering::Relaxed);
            if count >= redirect_limit {
                attempt.error("redirect limit exceeded")
            } else {
                attempt.follow()
            }
        });

        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .redirect(policy)
            .cookie_store(true)
            .build()
            .map_err(|err| FetchError::new(FailureKind::Network, err.to_string()))?;

        Ok(Self {
            settings,
            client,
            redirect_counter,
        })
    }

    fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let ct = content_type.split(';').next().unwrap_or(content_type).trim();
        self.settings
            .allowed_content_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(ct))
    }

    async fn load(&self, request: reqwest::RequestBuilder) -> Result<Page, FetchError> {
        self.redirect_counter.store(0, Ordering::Relaxed);
        let response = request.send().await.map_err(map_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FailureKind::HttpStatus(status.as_u16()),
                status.to_string(),
            ));
        }

        if let Some(content_len) = response.content_length() {
            if content_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(content_len),
                    },
                    "response too large",
                ));
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.to_string());

        if let Some(ct) = content_type.as_deref() {
            if !self.is_content_type_allowed(ct) {
                return Err(FetchError::new(
                    FailureKind::UnsupportedContentType {
                        content_type: ct.to_string(),
                    },
                    "unsupported content type",
                ));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(map_reqwest_error)?;
            let next_len = bytes.len() as u64 + chunk.len() as u64;
            if next_len > self.settings.max_bytes {
                return Err(FetchError::new(
                    FailureKind::TooLarge {
                        max_bytes: self.settings.max_bytes,
                        actual: Some(next_len),
                    },
                    "response too large",
                ));
            }
            bytes.extend_from_slice(&chunk);
        }

        let html = decode_page(&bytes, content_type.as_deref())
            .map_err(|err| FetchError::new(FailureKind::Decode, err.to_string()))?;

        relay_debug!(
            "Loaded {} ({} bytes, {} redirects)",
            final_url,
            bytes.len(),
            self.redirect_counter.load(Ordering::Relaxed)
        );
        Ok(Page::new(final_url, html))
    }
}

#[async_trait::async_trait]
impl Browser for ReqwestBrowser {
    async fn open(&self, url: &str) -> Result<Page, FetchError> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| FetchError::new(FailureKind::InvalidUrl, err.to_string()))?;
        self.load(self.client.get(parsed)).await
    }

    async fn submit(&self, form: &FormSubmission) -> Result<Page, FetchError> {
        let request = match form.method {
            FormMethod::Get => {
                let mut url = form.action.clone();
                url.query_pairs_mut()
                    .clear()
                    .extend_pairs(form.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())));
                self.client.get(url)
            }
            FormMethod::Post => {
                let body = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(form.fields.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                    .finish();
                self.client
                    .post(form.action.clone())
                    .header(
                        CONTENT_TYPE,
                        HeaderValue::from_static("application/x-www-form-urlencoded"),
                    )
                    .body(body)
            }
        };
        self.load(request).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::new(FailureKind::Timeout, err.to_string());
    }
    if err.is_redirect() {
        return FetchError::new(FailureKind::RedirectLimitExceeded, err.to_string());
    }
    FetchError::new(FailureKind::Network, err.to_string())
}

use relay_core::{PagePaths, QueryRow};
use relay_logging::relay_warn;
use serde::{Deserialize, Serialize};

use crate::form::{build_submission, FormError, SubmitButton};
use crate::scrape::{scrape_table, ScrapeError};
use crate::store::StoreKeys;
use crate::{FormSubmission, Page};

/// What differs from one target site to the next. The runner only ever talks
/// to a site through this trait.
pub trait SiteProfile: Send + Sync {
    /// Short name used to namespace the persisted keys.
    fn source(&self) -> &str;

    fn start_url(&self) -> &str;

    fn paths(&self) -> &PagePaths;

    fn keys(&self) -> StoreKeys {
        StoreKeys::for_source(self.source())
    }

    /// Injects the row's values into the input page's form.
    fn fill_form(&self, page: &Page, row: &QueryRow) -> Result<FormSubmission, FormError>;

    /// Reads the result page as CSV text whose first line is the header.
    fn scrape(&self, page: &Page) -> Result<String, ScrapeError>;

    /// URL to open to get from a result page back to the input page.
    fn return_to_input(&self, page: &Page) -> String;
}

fn default_form_selector() -> String {
    "form".to_string()
}

/// Description of a site whose input page is an HTML form and whose result
/// page shows the answer as an HTML table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    pub source: String,
    pub start_url: String,
    pub input_path: String,
    pub result_path: String,
    #[serde(default = "default_form_selector")]
    pub form_selector: String,
    /// Form field names, in query column order.
    pub fields: Vec<String>,
    #[serde(default)]
    pub submit: Option<SubmitButton>,
    pub table_selector: String,
    /// Defaults to `start_url`. May be relative to the result page.
    #[serde(default)]
    pub return_url: Option<String>,
}

pub struct TableFormSite {
    config: SiteConfig,
    paths: PagePaths,
}

impl TableFormSite {
    pub fn new(config: SiteConfig) -> Self {
        let paths = PagePaths {
            input_path: config.input_path.clone(),
            result_path: config.result_path.clone(),
        };
        Self { config, paths }
    }
}

impl SiteProfile for TableFormSite {
    fn source(&self) -> &str {
        &self.config.source
    }

    fn start_url(&self) -> &str {
        &self.config.start_url
    }

    fn paths(&self) -> &PagePaths {
        &self.paths
    }

    fn fill_form(&self, page: &Page, row: &QueryRow) -> Result<FormSubmission, FormError> {
        if row.values().len() > self.config.fields.len() {
            relay_warn!(
                "Query row has {} values but only {} fields are mapped; extra values ignored",
                row.values().len(),
                self.config.fields.len()
            );
        }
        build_submission(
            page,
            &self.config.form_selector,
            &self.config.fields,
            row,
            self.config.submit.as_ref(),
        )
    }

    fn scrape(&self, page: &Page) -> Result<String, ScrapeError> {
        scrape_table(&page.html, &self.config.table_selector)
    }

    fn return_to_input(&self, page: &Page) -> String {
        let target = self
            .config
            .return_url
            .as_deref()
            .unwrap_or(&self.config.start_url);
        page.url
            .join(target)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| target.to_string())
    }
}

use relay_core::QueryRow;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{FormMethod, FormSubmission, Page};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("invalid selector {0}")]
    InvalidSelector(String),
    #[error("no form matches {0:?}")]
    FormNotFound(String),
    #[error("query row has no value for field {field:?} (column {index})")]
    MissingValue { field: String, index: usize },
    #[error("form action {0:?} cannot be resolved")]
    InvalidAction(String),
}

/// Named submit control to send along with the form, if the site expects one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitButton {
    pub name: String,
    pub value: String,
}

/// Fills the form selected by `form_selector` with the values of `row`.
///
/// Inputs already present on the page (hidden state, tokens, defaults) are
/// carried over as a browser would send them. Row value `i` then overwrites or
/// adds field `field_names[i]`.
pub fn build_submission(
    page: &Page,
    form_selector: &str,
    field_names: &[String],
    row: &QueryRow,
    submit: Option<&SubmitButton>,
) -> Result<FormSubmission, FormError> {
    let doc = Html::parse_document(&page.html);
    let selector = parse_selector(form_selector)?;
    let form = doc
        .select(&selector)
        .next()
        .ok_or_else(|| FormError::FormNotFound(form_selector.to_string()))?;

    let action = match form.value().attr("action").map(str::trim) {
        Some(action) if !action.is_empty() => page
            .url
            .join(action)
            .map_err(|_| FormError::InvalidAction(action.to_string()))?,
        _ => page.url.clone(),
    };
    let method = match form.value().attr("method") {
        Some(method) if method.eq_ignore_ascii_case("post") => FormMethod::Post,
        _ => FormMethod::Get,
    };

    let mut fields = collect_defaults(form)?;
    for (index, name) in field_names.iter().enumerate() {
        let value = row
            .values()
            .get(index)
            .ok_or_else(|| FormError::MissingValue {
                field: name.clone(),
                index,
            })?;
        set_field(&mut fields, name, value);
    }
    if let Some(button) = submit {
        set_field(&mut fields, &button.name, &button.value);
    }

    Ok(FormSubmission {
        action,
        method,
        fields,
    })
}

fn parse_selector(raw: &str) -> Result<Selector, FormError> {
    Selector::parse(raw).map_err(|err| FormError::InvalidSelector(format!("{raw}: {err:?}")))
}

fn collect_defaults(form: ElementRef<'_>) -> Result<Vec<(String, String)>, FormError> {
    let controls = parse_selector("input[name], select[name], textarea[name]")?;
    let selected = parse_selector("option[selected]")?;
    let any_option = parse_selector("option")?;

    let mut fields = Vec::new();
    for control in form.select(&controls) {
        let element = control.value();
        let Some(name) = element.attr("name") else {
            continue;
        };
        let value = match element.name() {
            "input" => {
                let kind = element.attr("type").unwrap_or("text").to_ascii_lowercase();
                match kind.as_str() {
                    "submit" | "button" | "image" | "reset" | "file" => continue,
                    "checkbox" | "radio" if element.attr("checked").is_none() => continue,
                    "checkbox" | "radio" => element.attr("value").unwrap_or("on").to_string(),
                    _ => element.attr("value").unwrap_or_default().to_string(),
                }
            }
            "select" => control
                .select(&selected)
                .next()
                .or_else(|| control.select(&any_option).next())
                .map(option_value)
                .unwrap_or_default(),
            _ => control.text().collect(),
        };
        fields.push((name.to_string(), value));
    }
    Ok(fields)
}

fn option_value(option: ElementRef<'_>) -> String {
    option
        .value()
        .attr("value")
        .map(ToOwned::to_owned)
        .unwrap_or_else(|| option.text().collect::<String>().trim().to_string())
}

fn set_field(fields: &mut Vec<(String, String)>, name: &str, value: &str) {
    match fields.iter_mut().find(|(key, _)| key == name) {
        Some((_, existing)) => *existing = value.to_string(),
        None => fields.push((name.to_string(), value.to_string())),
    }
}

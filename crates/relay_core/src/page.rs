use crate::SessionError;

/// Paths that identify the two pages the session moves between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PagePaths {
    pub input_path: String,
    pub result_path: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageRole {
    Input,
    Result,
}

/// Maps a URL path onto the page role it plays. Trailing slashes are ignored.
pub fn classify_path(path: &str, paths: &PagePaths) -> Result<PageRole, SessionError> {
    let path = normalize(path);
    if path == normalize(&paths.input_path) {
        Ok(PageRole::Input)
    } else if path == normalize(&paths.result_path) {
        Ok(PageRole::Result)
    } else {
        Err(SessionError::UnknownPage {
            path: path.to_string(),
        })
    }
}

fn normalize(path: &str) -> &str {
    let trimmed = path.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

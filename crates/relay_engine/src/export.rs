use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::persist::{AtomicFileWriter, PersistError};

/// Where the final CSV goes and how its file name is stamped.
#[derive(Clone)]
pub struct ExportSettings {
    pub output_dir: PathBuf,
    pub timestamp: Arc<dyn Fn() -> String + Send + Sync>,
}

impl ExportSettings {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            timestamp: Arc::new(|| "latest".to_string()),
        }
    }
}

/// `<source>_results_<stamp>.csv`, with characters that are unsafe in file
/// names replaced by `-`.
pub fn export_filename(source: &str, stamp: &str) -> String {
    let clean = |s: &str| -> String {
        s.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c if c.is_control() || c.is_whitespace() => '-',
                c => c,
            })
            .collect()
    };
    format!("{}_results_{}.csv", clean(source), clean(stamp))
}

/// Offers the accumulated CSV to the user by writing it into the output directory.
pub fn export_results(
    output_dir: &Path,
    source: &str,
    stamp: &str,
    csv: &str,
) -> Result<PathBuf, PersistError> {
    AtomicFileWriter::new(output_dir).write(&export_filename(source, stamp), csv)
}

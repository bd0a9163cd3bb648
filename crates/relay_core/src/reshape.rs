use crate::ReshapeError;

pub const DEFAULT_EXCLUDED_STATUS: &str = "PO is awaiting dispatch";

/// Re-projects an uploaded file onto two named columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnProjection {
    /// Column that must be non-blank for a row to be kept.
    pub id_column: String,
    /// Column compared against `excluded_status`.
    pub status_column: String,
    pub excluded_status: String,
}

impl Default for ColumnProjection {
    fn default() -> Self {
        Self {
            id_column: "Req ID".to_string(),
            status_column: "PO ID".to_string(),
            excluded_status: DEFAULT_EXCLUDED_STATUS.to_string(),
        }
    }
}

/// Removes every double-quote character from a field.
pub fn strip_quotes(field: &str) -> String {
    field.replace('"', "")
}

/// Turns an uploaded CSV file into queue text.
///
/// The header line is removed exactly once. With a projection, each row is
/// reduced to `id,status` with quotes stripped, and rows with a blank id or
/// the excluded status are dropped.
pub fn reshape_upload(
    text: &str,
    projection: Option<&ColumnProjection>,
) -> Result<String, ReshapeError> {
    match projection {
        None => Ok(strip_header(text)),
        Some(projection) => project(text, projection),
    }
}

fn strip_header(text: &str) -> String {
    text.lines()
        .skip(1)
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn project(text: &str, projection: &ColumnProjection) -> Result<String, ReshapeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| strip_quotes(h).trim() == name)
            .ok_or_else(|| ReshapeError::MissingColumn(name.to_string()))
    };
    let id_idx = column(&projection.id_column)?;
    let status_idx = column(&projection.status_column)?;

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    for record in reader.records() {
        let record = record?;
        let id = strip_quotes(record.get(id_idx).unwrap_or_default());
        let status = strip_quotes(record.get(status_idx).unwrap_or_default());
        let (id, status) = (id.trim(), status.trim());
        if id.is_empty() || status == projection.excluded_status {
            continue;
        }
        // Fields holding a comma come out quoted so the queue row parses back whole.
        writer.write_record([id, status])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| ReshapeError::Csv(err.to_string()))?;
    let text = String::from_utf8(bytes).map_err(|err| ReshapeError::Csv(err.to_string()))?;
    Ok(text.trim_end_matches('\n').to_string())
}

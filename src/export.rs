//! View exports.
//!
//! CSV is written here. Spreadsheet encoders get [`view_records`] (one ordered
//! mapping per row) and do their own encoding.

use indexmap::IndexMap;
use log::info;

use crate::data::filter::View;
use crate::data::model::{Dataset, Value, cell_text};
use crate::error::{PipelineError, Result};

pub const DEFAULT_CSV_NAME: &str = "export.csv";
pub const DEFAULT_JSON_NAME: &str = "export.json";

/// One exported row: header → value, in header order.
pub type Record = IndexMap<String, Value>;

fn ensure_rows(view: &View) -> Result<()> {
    if view.is_empty() {
        return Err(PipelineError::ExportPrecondition);
    }
    Ok(())
}

/// Render the view as CSV.
///
/// The header row lists the dataset headers, quoted only where needed. Every
/// data field is quoted with inner quotes doubled. Lines are separated by
/// `\n` with no trailing terminator.
pub fn to_csv(dataset: &Dataset, view: &View) -> Result<String> {
    ensure_rows(view)?;

    let mut header = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    header.write_record(&dataset.headers)?;
    let buf = header
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))?;

    let mut body = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(buf);
    for row in view.rows(dataset) {
        body.write_record(dataset.headers.iter().map(|h| cell_text(row, h)))?;
    }
    let mut bytes = body
        .into_inner()
        .map_err(|e| PipelineError::Io(e.into_error()))?;

    if bytes.last() == Some(&b'\n') {
        bytes.pop();
    }
    let text = String::from_utf8(bytes)
        .map_err(|e| PipelineError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))?;

    info!("Exported {} rows × {} columns as CSV", view.len(), dataset.headers.len());
    Ok(text)
}

/// The view as ordered mappings, for spreadsheet encoders. Cells a row lacks
/// are filled with `Null`.
pub fn view_records(dataset: &Dataset, view: &View) -> Result<Vec<Record>> {
    ensure_rows(view)?;
    Ok(view
        .rows(dataset)
        .map(|row| {
            dataset
                .headers
                .iter()
                .map(|h| (h.clone(), row.get(h).cloned().unwrap_or(Value::Null)))
                .collect()
        })
        .collect())
}

/// The view as a pretty-printed JSON array of records.
pub fn to_json(dataset: &Dataset, view: &View) -> Result<String> {
    let records = view_records(dataset, view)?;
    let text = serde_json::to_string_pretty(&records)?;
    info!("Exported {} rows as JSON", records.len());
    Ok(text)
}

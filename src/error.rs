use thiserror::Error;

/// Failures surfaced by the pipeline controller.
///
/// A failed operation never touches the dataset or view that were installed
/// before it ran.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The input file could not be decoded. Carries the full context chain.
    #[error("failed to parse file: {0}")]
    Decode(String),

    #[error("no data: the file decoded to zero rows")]
    EmptyDataset,

    #[error("geocoding failed: {0}")]
    Lookup(#[from] GeocodeError),

    #[error("nothing to export: the current view is empty")]
    ExportPrecondition,

    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// A filter value that is not among the column's checkboxes.
    #[error("column '{column}' has no value '{value}'")]
    UnknownValue { column: String, value: String },

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("CSV error")]
    Csv(#[from] csv::Error),

    #[error("JSON error")]
    Json(#[from] serde_json::Error),
}

/// A single place-name lookup that did not produce a coordinate.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("request failed")]
    Http(#[from] reqwest::Error),

    #[error("service answered with status {0}")]
    Status(u16),

    #[error("no match for '{0}'")]
    NoMatch(String),

    #[error("invalid coordinate in response: lat={lat:?} lon={lon:?}")]
    InvalidCoordinate { lat: String, lon: String },
}

pub type Result<T, E = PipelineError> = std::result::Result<T, E>;

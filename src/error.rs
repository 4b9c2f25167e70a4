use thiserror::Error;

/// Failures of one upload. None of them leave partial output behind.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported file type '{extension}'. Please upload .csv, .xlsx or .xls")]
    UnsupportedFormat { extension: String },

    #[error("Malformed input at row {row}: {message}")]
    MalformedInput { row: usize, message: String },

    #[error("Failed to import jobs: {0}")]
    UpstreamPersistenceFailure(String),

    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),
}

pub type ImportResult<T> = Result<T, ImportError>;

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FibraError {
    #[error("document extraction failed: {0}")]
    Extraction(String),

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("no trace decoder configured for binary trace files. Set 'trace_decoder' in the diagnosis profile")]
    DecoderNotConfigured,

    #[error("trace decoder failed with exit code {code}: {stderr}")]
    DecoderFailed { code: i32, stderr: String },

    #[error("unsupported input '{0}'. Expected .pdf, .csv, .xlsx, .xls, .ods, .sor or .json")]
    UnsupportedInput(String),

    #[error("failed to parse document: {0}")]
    ParseError(String),

    #[error("failed to load profile from {path}: {reason}")]
    ProfileLoad { path: PathBuf, reason: String },

    #[error("invalid profile: {0}")]
    ProfileInvalid(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("spreadsheet export failed: {0}")]
    Export(#[from] rust_xlsxwriter::XlsxError),
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum MunroError {
    #[error("missing required column: {0}")]
    MissingColumn(String),

    #[error("no munro with running number {0}")]
    NotFound(u32),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "extract")]
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

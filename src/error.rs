use thiserror::Error;

#[derive(Error, Debug)]
pub enum GpError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("dataset contains no records")]
    EmptyDataset,

    #[error("failed to load dataset: {0}")]
    DataLoad(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parameter file error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GpError>;

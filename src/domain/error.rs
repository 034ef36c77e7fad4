use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestionError {
    #[error("decode error: {0}")]
    Decode(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("configuration error: {0}")]
    Config(String),
}

impl IngestionError {
    /// Short name of the failure class, used in log lines.
    pub fn class(&self) -> &'static str {
        match self {
            IngestionError::Decode(_) => "decode",
            IngestionError::Transport(_) => "transport",
            IngestionError::Parse(_) => "parse",
            IngestionError::Config(_) => "config",
        }
    }
}

impl From<sqlx::Error> for IngestionError {
    fn from(e: sqlx::Error) -> Self {
        IngestionError::Transport(e.to_string())
    }
}

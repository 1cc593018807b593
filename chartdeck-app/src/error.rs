use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Api(#[from] chartdeck_client::Error),
    #[error("render failed: {0}")]
    Render(String),
    #[error("export failed: {0}")]
    Export(String),
    #[error("another action is still running")]
    Busy,
    #[error("{0}")]
    Message(String),
}

impl AppError {
    /// The message shown in a toast or inline panel.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Api(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

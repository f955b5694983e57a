use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Server rejected request ({status}): {}", message.as_deref().unwrap_or("no message"))]
    Server { status: u16, message: Option<String> },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl SyncError {
    /// One-line message suitable for a toast.
    ///
    /// Server rejections use the server's own `message` when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            SyncError::Validation(msg) => msg.clone(),
            SyncError::Transport(_) => {
                "Could not reach the server. Check your connection and try again.".to_string()
            }
            SyncError::Server {
                message: Some(msg), ..
            } if !msg.trim().is_empty() => msg.clone(),
            SyncError::Server { .. } | SyncError::MalformedResponse(_) => {
                "Something went wrong. Please try again.".to_string()
            }
            SyncError::RecordNotFound(id) => format!("Item {} no longer exists.", id),
            SyncError::Io(_) | SyncError::Serialization(_) | SyncError::Store(_) => {
                "Could not save changes on this device.".to_string()
            }
            SyncError::Config(msg) => format!("Configuration problem: {}", msg),
        }
    }

    /// True for failures that happened before any request left the client.
    pub fn is_validation(&self) -> bool {
        matches!(self, SyncError::Validation(_))
    }
}

impl From<confique::Error> for SyncError {
    fn from(err: confique::Error) -> Self {
        SyncError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

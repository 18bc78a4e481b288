pub type SeqResult<T> = Result<T, SeqError>;

/// Errors only exist where input enters the crate. Coordinator operations never fail: bad
/// indexes and missing bindings degrade to "that frame never activates".
#[derive(thiserror::Error, Debug)]
pub enum SeqError {
    #[error("config error: {0}")]
    Config(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("replay error: {0}")]
    Replay(String),

    #[error("serialization error: {0}")]
    Serde(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SeqError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn session(msg: impl Into<String>) -> Self {
        Self::Session(msg.into())
    }

    pub fn replay(msg: impl Into<String>) -> Self {
        Self::Replay(msg.into())
    }

    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for SeqError {
    fn from(e: serde_json::Error) -> Self {
        Self::serde(e.to_string())
    }
}

/// Core error type for the tender bot.
///
/// Adapter crates (HTTP registry client, Telegram) map their specific errors
/// into this type so the pipeline can log and degrade consistently.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("dispatch error: {0}")]
    Dispatch(String),

    #[error("external error: {0}")]
    External(String),
}

impl Error {
    /// Whether a retry of the same request may succeed (429, 5xx, transport).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Http { status, .. } => *status == 429 || (500..600).contains(status),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

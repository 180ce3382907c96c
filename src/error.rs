use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed playlist: {0}")]
    Playlist(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("no playlist entry matches \"{0}\"")]
    GameNotFound(String),
    #[error("\"{0}\" is already running")]
    AlreadyRunning(String),
    #[error("achievement service request failed: {0}")]
    Backend(#[from] reqwest::Error),
    #[error("unknown response from achievement service for {url}")]
    UnknownBackendResponse { url: String },
}

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Store Error: {0}")]
    Store(String),
    #[error("Stub Error: {0}")]
    Stub(String),
    #[error("Invalid event name pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Chaincode has already been instantiated")]
    AlreadyInstantiated,
    #[error("Chaincode has not been instantiated")]
    NotInstantiated,
    #[error("Config Error: {0}")]
    Config(String),
    #[error(transparent)]
    Toml(#[from] toml_edit::TomlError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A result type bound to the standard events-cc error type.
pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Reasons a command is rejected back to its sender. The display text is what
/// the client receives in `errorMessage`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    #[error("Missing data for team selection: {0}")]
    MissingField(&'static str),

    #[error("Unknown team: {0}")]
    UnknownTeam(String),

    #[error("Unknown class: {0}")]
    UnknownClass(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read world config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid world config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value for {name}: {value}")]
    InvalidEnv { name: &'static str, value: String },
}

pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

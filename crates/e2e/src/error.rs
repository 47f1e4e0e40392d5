//! Error types for E2E testing

use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("App server failed to start: {0}")]
    AppStartup(String),

    #[error("App readiness check failed after {0} attempts")]
    AppReadiness(usize),

    #[error("Node with Playwright not found. Install with: npm install playwright")]
    DriverUnavailable,

    #[error("Driver protocol error: {0}")]
    Driver(String),

    #[error("Browser command failed: {command} - {reason}")]
    CommandFailed { command: String, reason: String },

    #[error("Exploration spec error: {0}")]
    Exploration(String),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Unexpected console errors:\n{0}")]
    ConsoleErrors(String),

    #[error("Embedding log mismatch:\nexpected: {expected:#?}\nactual: {actual:#?}")]
    LogMismatch {
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

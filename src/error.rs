#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("UserError: {0}")]
    UserError(String),

    #[error("ConfigError: {0}")]
    ConfigError(String),

    #[error("ParseError: {0}")]
    ParseError(String),

    #[error("RenderError: {0}")]
    RenderError(String),

    #[error(transparent)]
    RemoteError(#[from] crate::client::Error),

    /// A single link of the role chain failed. `step` is 1-based.
    #[error("assume-role chain step {step}/{total} ({role_arn}) failed")]
    ChainStep {
        step: usize,
        total: usize,
        role_arn: String,
        #[source]
        source: Box<Error>,
    },

    #[error("interrupted after {completed_steps} assume-role chain step(s)")]
    Cancelled { completed_steps: usize },

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    YamlError(#[from] serde_yaml::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error(transparent)]
    ReqwestError(#[from] reqwest::Error),

    #[error("ApiError({url}): {message}; {status_code:}")]
    ApiError {
        url: url::Url,
        status_code: reqwest::StatusCode,
        message: String,
    },

    /// Failure, but we don't want to emit error to stderr/out anymore. Used in cmd
    #[error("")]
    SilentlyExitWithCode(std::process::ExitCode),
}

pub type Result<T> = std::result::Result<T, Error>;

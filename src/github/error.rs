use reqwest::StatusCode;

use crate::validation::ValidationError;

// -------------------------------------------------------------------------------------------------
// Error
// -------------------------------------------------------------------------------------------------
#[derive(Debug)]
pub enum Error {
    /// The credential was rejected (HTTP 401); terminal for the whole invocation
    Unauthorized {
        /// The `message` field of the response, if any
        message: String,
    },

    /// The endpoint answered with a status that retrying will not change, e.g., 404 or 422
    UnexpectedStatus {
        status: StatusCode,
        /// The `message` field of the response, if any
        message: Option<String>,
    },

    /// A transient condition (rate limiting, 5xx, network trouble) outlived the retry budget
    RetriesExhausted {
        attempts: u32,
        /// The status of the last response, if any response was received
        last_status: Option<StatusCode>,
    },

    /// The response decoded, but lacked something the operation needs
    UnexpectedResponse(String),

    InvalidName(ValidationError),
    UrlParseError(url::ParseError),
    UrlBaseError(url::Url),
    UrlSlashError(String),
    JsonError(serde_json::Error),
    ReqwestError(reqwest::Error),
}

impl Error {
    /// The HTTP status behind this error, if there is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Unauthorized { .. } => Some(StatusCode::UNAUTHORIZED),
            Error::UnexpectedStatus { status, .. } => Some(*status),
            Error::RetriesExhausted { last_status, .. } => *last_status,
            Error::ReqwestError(e) => e.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(StatusCode::NOT_FOUND)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Unauthorized { message } => write!(f, "request was unauthorized: {message}"),
            Error::UnexpectedStatus { status, message: Some(message) } => {
                write!(f, "unexpected response status {status}: {message}")
            }
            Error::UnexpectedStatus { status, message: None } => {
                write!(f, "unexpected response status {status}")
            }
            Error::RetriesExhausted { attempts, last_status: Some(status) } => {
                write!(f, "gave up after {attempts} attempts; last response status {status}")
            }
            Error::RetriesExhausted { attempts, last_status: None } => {
                write!(f, "gave up after {attempts} attempts; no response received")
            }
            Error::UnexpectedResponse(what) => write!(f, "unexpected response: {what}"),
            Error::InvalidName(e) => write!(f, "{e}"),
            Error::UrlParseError(e) => write!(f, "error parsing URL: {e}"),
            Error::UrlBaseError(u) => write!(f, "error building URL: {u} cannot be a base"),
            Error::UrlSlashError(p) => write!(f, "error building URL: component {p:?} contains a slash"),
            Error::JsonError(e) => write!(f, "error decoding response: {e}"),
            Error::ReqwestError(e) => write!(f, "error making request: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidName(e) => Some(e),
            Error::UrlParseError(e) => Some(e),
            Error::JsonError(e) => Some(e),
            Error::ReqwestError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::UrlParseError(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ReqwestError(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::JsonError(e)
    }
}

impl From<ValidationError> for Error {
    fn from(e: ValidationError) -> Self {
        Error::InvalidName(e)
    }
}

use std::fmt;

#[derive(Debug)]
pub enum Error {
    Http(reqwest::Error),
    Auth(String),
    NotAuthenticated,
    InvalidResponse(String),
    MissingField(String),
    InvalidValue { field: String, value: String },
    Io(std::io::Error),
}

impl Error {
    /// True for failures of the request itself (transport, body, or shape),
    /// as opposed to login rejection or a value that could not be mapped.
    pub fn is_request_error(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::NotAuthenticated
                | Error::InvalidResponse(_)
                | Error::MissingField(_)
        )
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Auth(reason) => write!(f, "login failed: {reason}"),
            Error::NotAuthenticated => write!(f, "not logged in"),
            Error::InvalidResponse(body) => write!(f, "response is not JSON: {body}"),
            Error::MissingField(path) => write!(f, "missing field: {path}"),
            Error::InvalidValue { field, value } => {
                write!(f, "invalid value for {field}: {value}")
            }
            Error::Io(e) => write!(f, "IO error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Http(e) => Some(e),
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Http(e)
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

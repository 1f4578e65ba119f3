use std::{fmt, io};

#[derive(Debug)]
pub enum RelayError {
    /// An environment variable held a value we could not use.
    Config { key: &'static str, value: String },
    IoError(io::Error),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::Config { key, value } => {
                write!(f, "invalid value {:?} for {}", value, key)
            }
            RelayError::IoError(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for RelayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RelayError::IoError(e) => Some(e),
            RelayError::Config { .. } => None,
        }
    }
}

// `From` trait implementation to allow using the `?` operator on io errors.
impl From<io::Error> for RelayError {
    fn from(err: io::Error) -> Self {
        RelayError::IoError(err)
    }
}

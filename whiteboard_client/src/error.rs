use std::{fmt, io};

#[derive(Debug)]
pub enum ClientError {
    /// The surface could not be allocated with these dimensions.
    InvalidSize { width: u32, height: u32 },
    /// Exporting the surface pixels as an image failed.
    Encode(String),
    IoError(io::Error),
    /// The host platform (browser DOM) refused an operation.
    Platform(String),
}

impl fmt::Display for ClientError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClientError::InvalidSize { width, height } => {
                write!(f, "invalid surface size {}x{}", width, height)
            }
            ClientError::Encode(e) => write!(f, "failed to encode image: {}", e),
            ClientError::IoError(e) => write!(f, "io error: {}", e),
            ClientError::Platform(e) => write!(f, "platform error: {}", e),
        }
    }
}

impl std::error::Error for ClientError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClientError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ClientError {
    fn from(err: io::Error) -> Self {
        ClientError::IoError(err)
    }
}

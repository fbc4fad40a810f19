/*!
    Error types shared across the playhead crates.
*/

use std::fmt;

/**
    Error type for the playhead crates.

    Only fatal startup conditions surface as `Error` values; once playback
    is running, decode failures are recovered internally and end-of-stream
    is signalled through return values rather than errors.
*/
#[derive(Debug)]
pub enum Error {
    /// Container could not be opened or probed.
    Open { message: String },
    /// No decodable audio or video stream was found.
    NoStream { message: String },
    /// Codec error (decoder construction or decode failure).
    Codec { message: String },
    /// Invalid data (malformed input).
    InvalidData { message: String },
    /// Unsupported format (valid but not handled).
    UnsupportedFormat { message: String },
    /// Audio output device error.
    Device { message: String },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { message } => write!(f, "could not open input: {message}"),
            Self::NoStream { message } => write!(f, "no stream: {message}"),
            Self::Codec { message } => write!(f, "codec error: {message}"),
            Self::InvalidData { message } => write!(f, "invalid data: {message}"),
            Self::UnsupportedFormat { message } => write!(f, "unsupported format: {message}"),
            Self::Device { message } => write!(f, "audio device error: {message}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /**
        Create an open error with the given message.
    */
    pub fn open(message: impl Into<String>) -> Self {
        Self::Open {
            message: message.into(),
        }
    }

    /**
        Create a no-stream error with the given message.
    */
    pub fn no_stream(message: impl Into<String>) -> Self {
        Self::NoStream {
            message: message.into(),
        }
    }

    /**
        Create a codec error with the given message.
    */
    pub fn codec(message: impl Into<String>) -> Self {
        Self::Codec {
            message: message.into(),
        }
    }

    /**
        Create an invalid data error with the given message.
    */
    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    /**
        Create an unsupported format error with the given message.
    */
    pub fn unsupported_format(message: impl Into<String>) -> Self {
        Self::UnsupportedFormat {
            message: message.into(),
        }
    }

    /**
        Create an audio device error with the given message.
    */
    pub fn device(message: impl Into<String>) -> Self {
        Self::Device {
            message: message.into(),
        }
    }
}

/**
    Result type alias for the playhead crates.
*/
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let e = Error::open("no such file");
        assert_eq!(format!("{e}"), "could not open input: no such file");

        let e = Error::no_stream("no audio or video streams");
        assert_eq!(format!("{e}"), "no stream: no audio or video streams");

        let e = Error::codec("send_packet failed");
        assert_eq!(format!("{e}"), "codec error: send_packet failed");

        let e = Error::invalid_data("truncated packet");
        assert_eq!(format!("{e}"), "invalid data: truncated packet");

        let e = Error::unsupported_format("no f32 output config");
        assert_eq!(format!("{e}"), "unsupported format: no f32 output config");

        let e = Error::device("stream build failed");
        assert_eq!(format!("{e}"), "audio device error: stream build failed");
    }

    #[test]
    fn error_is_std_error() {
        fn takes_std_error(_: &dyn std::error::Error) {}
        takes_std_error(&Error::codec("x"));
    }
}

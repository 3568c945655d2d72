// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Error types for channel operations.

use std::fmt;

/// The category of an [`Error`].
///
/// Reaching the end of the remote file is not an error; reads report it through
/// [`ReadOutcome::EndOfResource`](crate::ReadOutcome::EndOfResource).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The operation is not supported by the channel, such as resizing the remote
    /// file or seeking outside of its bounds.
    Unsupported,

    /// The remote call failed. The transport error is available as the source.
    Transport,

    /// The remote response carried a content range that could not be parsed.
    InvalidContentRange,

    /// The caller supplied an argument that can never succeed, such as a seek
    /// before the start of the file or a zero chunk size.
    InvalidInput,

    /// The channel was already closed.
    Closed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unsupported => "operation not supported",
            Self::Transport => "remote call failed",
            Self::InvalidContentRange => "invalid content range",
            Self::InvalidInput => "invalid input",
            Self::Closed => "channel is closed",
        })
    }
}

/// An error from a channel or behavior operation.
///
/// Inspect [`Error::kind`] to tell the failure categories apart. Transport failures keep the
/// original error from the [`ShareFileClient`](crate::ShareFileClient) as their source.
///
/// # Example
///
/// ```
/// use share_file_channel::{Error, ErrorKind};
///
/// let error = Error::transport("connection reset");
/// assert_eq!(error.kind(), ErrorKind::Transport);
/// ```
#[ohno::error]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Returns the category of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Creates a transport error wrapping the failure reported by a remote call.
    ///
    /// [`ShareFileClient`](crate::ShareFileClient) implementations use this to surface
    /// their own errors.
    pub fn transport(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Transport, cause)
    }

    pub(crate) fn unsupported(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Unsupported, cause)
    }

    pub(crate) fn invalid_input(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::InvalidInput, cause)
    }

    pub(crate) fn closed() -> Self {
        Self::new(ErrorKind::Closed)
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        let kind = match error.kind() {
            ErrorKind::Unsupported => std::io::ErrorKind::Unsupported,
            ErrorKind::InvalidContentRange => std::io::ErrorKind::InvalidData,
            ErrorKind::InvalidInput => std::io::ErrorKind::InvalidInput,
            ErrorKind::Closed => std::io::ErrorKind::BrokenPipe,
            ErrorKind::Transport => std::io::ErrorKind::Other,
        };
        Self::new(kind, error)
    }
}

/// A specialized [`Result`] type for channel operations.
pub type Result<T> = std::result::Result<T, Error>;

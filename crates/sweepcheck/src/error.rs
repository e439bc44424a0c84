//! Structural errors that abort a single test case.
//!
//! A metric failure is not an error: it is a fully computed
//! [`ComparisonResult`](crate::ComparisonResult) whose `passed()` is false.

use std::error::Error as StdError;
use std::fmt;
use std::io;
use std::path::PathBuf;

/// Boxed error produced by external collaborators (loaders, engines).
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Errors returned by the harness and its collaborators.
#[derive(Debug)]
pub enum Error {
    /// A sweep or render parameter is non-positive or not finite.
    InvalidParameter { name: &'static str, value: f64 },
    /// Reference and rendered buffers differ in length, or are empty.
    LengthMismatch { reference: usize, rendered: usize },
    /// Reference and rendered buffers were produced at different rates.
    SampleRateMismatch { reference: u32, rendered: u32 },
    /// The reference audio for a test could not be loaded or decoded.
    Decode { test_id: String, source: BoxError },
    /// The rendering engine failed to produce output.
    Render { source: BoxError },
    /// A WAV file could not be written.
    Wav { path: PathBuf, source: hound::Error },
    /// A filesystem operation failed.
    Io { path: PathBuf, source: io::Error },
}

impl Error {
    /// Wraps an engine failure.
    pub fn render(source: impl Into<BoxError>) -> Self {
        Self::Render {
            source: source.into(),
        }
    }

    /// Wraps a reference loading failure for `test_id`.
    pub fn decode(test_id: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Decode {
            test_id: test_id.into(),
            source: source.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParameter { name, value } => {
                write!(f, "invalid {name} {value}; expected a finite value > 0")
            }
            Self::LengthMismatch {
                reference,
                rendered,
            } if reference == rendered => {
                write!(f, "cannot compare empty buffers")
            }
            Self::LengthMismatch {
                reference,
                rendered,
            } => write!(
                f,
                "reference has {reference} frames but rendered output has {rendered}",
            ),
            Self::SampleRateMismatch {
                reference,
                rendered,
            } => write!(
                f,
                "reference sample rate {reference} Hz does not match rendered {rendered} Hz",
            ),
            Self::Decode { test_id, .. } => {
                write!(f, "failed to load reference audio for {test_id}")
            }
            Self::Render { .. } => write!(f, "rendering failed"),
            Self::Wav { path, .. } => write!(f, "failed to write {}", path.display()),
            Self::Io { path, .. } => write!(f, "i/o error on {}", path.display()),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Decode { source, .. } | Self::Render { source } => Some(source.as_ref()),
            Self::Wav { source, .. } => Some(source),
            Self::Io { source, .. } => Some(source),
            Self::InvalidParameter { .. }
            | Self::LengthMismatch { .. }
            | Self::SampleRateMismatch { .. } => None,
        }
    }
}

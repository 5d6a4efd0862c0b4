//! Errors raised along the stdin to `.prom` pipeline.
use std::{
    io,
    path::{
        Path,
        PathBuf,
    },
};
use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure is terminal for the process. The variants mirror the stage that failed so the
/// caller (usually a cron job or systemd timer) can tell them apart by exit code.
#[derive(Error, Debug)]
pub enum Error {
    /// A command line value is missing or invalid
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Standard input is not a pipe, or reading from it failed
    #[error("input error: {0}")]
    InputSource(String),

    /// The payload is not valid JSON, or does not match the expected shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Emission was attempted on results that cannot be emitted
    #[error("precondition failed: {0}")]
    Precondition(&'static str),

    /// Creating, writing or closing the output failed
    #[error(
        "output error: {}{}",
        .path.as_ref().map(|p| format!("{}: ", p.display())).unwrap_or_default(),
        .source
    )]
    Output {
        /// Unknown while writing to an arbitrary sink
        path: Option<PathBuf>,
        #[source]
        source: io::Error,
    },
}

impl From<io::Error> for Error {
    fn from(source: io::Error) -> Self {
        Self::Output { path: None, source }
    }
}

impl Error {
    /// Attach the output file to an `Output` error raised by a sink. Other errors pass through.
    pub(crate) fn at(self, file: &Path) -> Self {
        match self {
            Self::Output { path: None, source } => Self::Output {
                path: Some(file.to_path_buf()),
                source,
            },
            other => other,
        }
    }

    /// The process exit code reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::InputSource(_) => 3,
            Self::Decode(_) => 4,
            Self::Precondition(_) => 5,
            Self::Output { .. } => 6,
        }
    }
}

//! Reading the report from standard input.
use crate::{
    Error,
    Result,
};
use std::io::Read;
use tracing::debug;

/// Fail unless `source` is a pipe.
///
/// Running interactively, or with a file redirected to stdin, is almost always a mistake in
/// the job definition, so both are rejected.
#[cfg(unix)]
pub fn ensure_piped(source: impl std::os::fd::AsFd) -> Result<()> {
    use std::{
        fs::File,
        os::unix::fs::FileTypeExt,
    };

    let inspect_error = |err: std::io::Error| {
        Error::InputSource(format!("cannot inspect standard input: {err}"))
    };
    let fd = source.as_fd().try_clone_to_owned().map_err(inspect_error)?;
    let file_type = File::from(fd).metadata().map_err(inspect_error)?.file_type();
    debug!(?file_type, "standard input");
    // Some process supervisors hand over a socket pair rather than a pipe
    if file_type.is_fifo() || file_type.is_socket() {
        Ok(())
    } else {
        Err(Error::InputSource("program must be called as a pipe".into()))
    }
}

/// Fail when `source` is a terminal. Pipes cannot be told apart from files on this platform.
#[cfg(not(unix))]
pub fn ensure_piped(source: &impl std::io::IsTerminal) -> Result<()> {
    if source.is_terminal() {
        return Err(Error::InputSource("program must be called as a pipe".into()));
    }
    Ok(())
}

/// Read until end of stream.
pub fn read_all(mut reader: impl Read) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    reader
        .read_to_end(&mut data)
        .map_err(|err| Error::InputSource(format!("reading standard input failed: {err}")))?;
    debug!(bytes = data.len(), "read input");
    Ok(data)
}

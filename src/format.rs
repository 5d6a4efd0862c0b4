//! Selecting an input format and writing its `.prom` file.
use crate::{
    GossFormatter,
    Result,
};
use std::{
    fmt::Debug,
    fs::File,
    io::{
        BufWriter,
        Write,
    },
    path::Path,
};
use tracing::{
    debug,
    info,
};

/// Knows how to read one report format and write it out as exposition lines.
pub trait Formatter {
    /// The decoded report.
    type Results: Debug;

    /// Decode a complete report.
    fn decode(&self, data: &[u8]) -> Result<Self::Results>;

    /// Reject results that `emit` would refuse, before any output is touched.
    fn check(&self, _results: &Self::Results) -> Result<()> {
        Ok(())
    }

    /// Write `results` to `sink`, one sample per line. `tag` is the name of the output file.
    ///
    /// Stops at the first failed write, whatever was written before stays written.
    fn emit(&self, results: &Self::Results, sink: &mut dyn Write, tag: &str) -> Result<()>;
}

/// The input formats understood by the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, strum::EnumString, strum::Display)]
#[strum(ascii_case_insensitive)]
#[strum(serialize_all = "snake_case")]
pub enum Format {
    #[default]
    Goss,
}

impl Format {
    /// Decode `data` and write it to `path`, truncating any previous content.
    ///
    /// Nothing is created when the data cannot be decoded.
    pub fn convert(self, data: &[u8], path: &Path, tag: &str) -> Result<()> {
        match self {
            Self::Goss => decode_and_write(&GossFormatter, data, path, tag),
        }
    }
}

fn decode_and_write<F: Formatter>(formatter: &F, data: &[u8], path: &Path, tag: &str) -> Result<()> {
    let results = formatter.decode(data)?;
    write_prom_file(formatter, &results, path, tag)
}

/// Create (or truncate) `path` and emit `results` into it.
///
/// Results failing [`Formatter::check`] leave an existing file untouched. Otherwise the file is
/// flushed and synced before returning, and on failure the partially written file is left
/// behind.
pub fn write_prom_file<F: Formatter>(
    formatter: &F,
    results: &F::Results,
    path: &Path,
    tag: &str,
) -> Result<()> {
    formatter.check(results)?;
    debug!(path = %path.display(), "creating output file");
    let write = || -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        formatter.emit(results, &mut writer, tag)?;
        let file = writer.into_inner().map_err(|err| err.into_error())?;
        file.sync_all()?;
        Ok(())
    };
    write().map_err(|err| err.at(path))?;
    info!(path = %path.display(), "wrote metrics");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        write_prom_file,
        Format,
        Formatter,
    };
    use crate::{
        tests::{
            init_test_logging,
            GOSS_01,
            GOSS_01_PROM,
        },
        Error,
        Result,
    };
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::{
        cell::RefCell,
        fs,
        io::Write,
        str::FromStr,
    };

    #[rstest]
    #[case("goss", Format::Goss)]
    #[case("GOSS", Format::Goss)]
    #[case("Goss", Format::Goss)]
    fn test_format_from_str(#[case] expr: &str, #[case] expected: Format) {
        assert_eq!(Format::from_str(expr).unwrap(), expected);
    }

    #[rstest]
    #[case("")]
    #[case("json")]
    #[case("goss ")]
    fn test_format_from_str_failure(#[case] expr: &str) {
        assert!(Format::from_str(expr).is_err());
    }

    #[test]
    fn test_format_display() {
        assert_eq!(Format::Goss.to_string(), "goss");
        assert_eq!(Format::default(), Format::Goss);
    }

    /// Records what it was given, and writes it back out verbatim.
    #[derive(Default)]
    struct Echo {
        decoded: RefCell<Vec<u8>>,
    }

    impl Formatter for Echo {
        type Results = Vec<u8>;

        fn decode(&self, data: &[u8]) -> Result<Vec<u8>> {
            self.decoded.replace(data.to_vec());
            Ok(data.to_vec())
        }

        fn emit(&self, results: &Vec<u8>, sink: &mut dyn Write, tag: &str) -> Result<()> {
            sink.write_all(results)?;
            writeln!(sink, " {tag}")?;
            Ok(())
        }
    }

    #[test]
    fn test_write_prom_file_with_custom_formatter() {
        init_test_logging();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("echo.prom");
        fs::write(&path, "stale content that is longer than the new one\n").unwrap();

        let echo = Echo::default();
        let results = echo.decode(b"test data").unwrap();
        assert_eq!(*echo.decoded.borrow(), b"test data");
        write_prom_file(&echo, &results, &path, "echo.prom").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "test data echo.prom\n");
    }

    #[test]
    fn test_convert_goss() {
        init_test_logging();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goss.prom");
        Format::Goss
            .convert(GOSS_01.as_bytes(), &path, "goss.prom")
            .unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), GOSS_01_PROM);
    }

    #[test]
    fn test_convert_decode_error_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goss.prom");
        let err = Format::Goss.convert(b"{", &path, "goss.prom").unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_convert_null_results_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goss.prom");
        fs::write(&path, "previous\n").unwrap();
        let err = Format::Goss
            .convert(br#"{"results": null}"#, &path, "goss.prom")
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "previous\n");
    }

    #[test]
    fn test_convert_null_results_creates_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goss.prom");
        let err = Format::Goss
            .convert(br#"{"results": null}"#, &path, "goss.prom")
            .unwrap_err();
        assert!(matches!(err, Error::Precondition(_)));
        assert!(!path.exists());
    }

    #[test]
    fn test_convert_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("goss.prom");
        let err = Format::Goss
            .convert(br#"{"results": []}"#, &path, "goss.prom")
            .unwrap_err();
        match err {
            Error::Output {
                path: Some(failed), ..
            } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other}"),
        }
    }
}

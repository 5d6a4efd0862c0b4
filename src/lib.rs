#![forbid(unsafe_code)]
//! Convert the JSON results of a [goss](https://github.com/goss-org/goss) run into the
//! Prometheus exposition text format, ready to be picked up by node_exporter's textfile
//! collector.
//!
//! The exposition format is described here:
//! <https://prometheus.io/docs/instrumenting/exposition_formats/>
use derive_more::Constructor;
pub use config::{
    tidy_directory,
    tidy_file_name,
    Cli,
    Config,
    DEFAULT_DIRECTORY,
};
pub use error::{
    Error,
    Result,
};
pub use format::{
    write_prom_file,
    Format,
    Formatter,
};
pub use goss::{
    normalize_resource_id,
    GossFormatter,
    ResultSet,
    Summary,
    TestResult,
};
pub use input::{
    ensure_piped,
    read_all,
};
pub use parser::SampleParseError;
use std::fmt::Display;

mod config;
mod error;
mod format;
mod goss;
mod input;
mod parser;

/// A single label in a sample.
///
/// Example:
/// ```text
/// resource="sshd"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Label {
    /// Label key
    pub key: String,
    /// Label value (without the quotes)
    pub value: String,
}

/// The labels attached to a sample, in the order they are written.
///
/// Example:
/// ```text
/// {property="running",resource="sshd",skipped="false"}
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Default,
    derive_more::Deref,
    derive_more::DerefMut,
    derive_more::From,
)]
#[repr(transparent)]
pub struct Labels(Vec<Label>);

impl Labels {
    /// Build a label set from `(key, value)` pairs, keeping their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs
            .into_iter()
            .map(|(key, value)| Label::new(key.into(), value.into()))
            .collect::<Vec<_>>()
            .into()
    }
}

impl Display for Labels {
    /// Values are written verbatim. Nothing is escaped, so a value holding `"`, `\` or a new line
    /// produces a line Prometheus will refuse.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            return Ok(());
        }
        let last_idx = self.0.len() - 1;
        f.write_str("{")?;
        for (idx, label) in self.0.iter().enumerate() {
            f.write_str(&label.key)?;
            f.write_str("=\"")?;
            f.write_str(&label.value)?;
            f.write_str("\"")?;
            if idx != last_idx {
                f.write_str(",")?;
            }
        }
        f.write_str("}")?;
        Ok(())
    }
}

/// One exposition line: a metric name, its labels and an integer value.
///
/// Example:
/// ```text
/// goss_result_process{property="running",resource="sshd",skipped="false"} 0
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Constructor)]
pub struct Sample {
    pub name: String,
    pub labels: Labels,
    pub value: i64,
}

impl Sample {
    /// Read back a line as written by the `Display` implementation.
    pub fn parse(line: &str) -> std::result::Result<Self, SampleParseError> {
        parser::parse_sample(line)
    }
}

impl Display for Sample {
    /// NOTE: New line is not added.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{} {}", self.name, self.labels, self.value)
    }
}

#[cfg(test)]
pub mod tests {
    use super::{
        Label,
        Labels,
        Sample,
    };
    use pretty_assertions::assert_eq;
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT_LOGGER: Once = Once::new();

    pub(crate) fn init_test_logging() {
        INIT_LOGGER.call_once(|| {
            tracing_subscriber::fmt::fmt()
                .with_env_filter(EnvFilter::new("warn,promify=debug"))
                .with_test_writer()
                .init();
        });
    }

    pub const GOSS_01: &str = include_str!("../test_data/goss-01.json");
    pub const GOSS_01_PROM: &str = include_str!("../test_data/goss-01.prom");
    pub const GOSS_SUMMARY_ONLY: &str = include_str!("../test_data/goss-summary-only.json");

    #[test]
    fn test_labels_display() {
        let labels = Labels::from_pairs([("textfile", "goss.prom"), ("name", "tested")]);
        assert_eq!(labels.to_string(), r#"{textfile="goss.prom",name="tested"}"#);
        assert_eq!(Labels::default().to_string(), "");
    }

    #[test]
    fn test_sample_display_and_parse() {
        init_test_logging();

        let sample = Sample::new(
            "goss_result_addr".into(),
            vec![
                Label::new("property".into(), "reachable".into()),
                Label::new("resource".into(), "tcp://localhost:22".into()),
                Label::new("skipped".into(), "false".into()),
            ]
            .into(),
            0,
        );
        let line = sample.to_string();
        assert_eq!(
            line,
            r#"goss_result_addr{property="reachable",resource="tcp://localhost:22",skipped="false"} 0"#
        );
        assert_eq!(Sample::parse(&line).unwrap(), sample);
    }

    #[test]
    fn test_unescaped_value_is_not_readable() {
        let sample = Sample::new(
            "goss_result_command".into(),
            Labels::from_pairs([("resource", r#"echo "hi""#)]),
            0,
        );
        assert!(Sample::parse(&sample.to_string()).is_err());
    }
}

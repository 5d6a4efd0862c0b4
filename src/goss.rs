//! The goss JSON report, and how it maps onto exposition lines.
//!
//! Produced by `goss validate --format json`. Only the fields needed for the metrics are kept,
//! anything else in the report is ignored.
use crate::{
    Error,
    Formatter,
    Labels,
    Result,
    Sample,
};
use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};
use std::io::Write;
use tracing::{
    debug,
    warn,
};

/// Go encodes empty slices (and sometimes strings) as `null`. Treat those as the zero value.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One evaluated assertion.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TestResult {
    /// As reported by goss (nanoseconds)
    #[serde(deserialize_with = "null_as_default")]
    pub duration: i64,
    #[serde(
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub expected: Vec<String>,
    #[serde(
        deserialize_with = "null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub found: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub property: String,
    #[serde(alias = "resourceID", deserialize_with = "null_as_default")]
    pub resource_id: String,
    #[serde(alias = "resourceType", deserialize_with = "null_as_default")]
    pub resource_type: String,
    /// 0 success, 1 failure, 2 skipped
    #[serde(deserialize_with = "null_as_default")]
    pub result: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub skipped: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub successful: bool,
    #[serde(alias = "testType", deserialize_with = "null_as_default")]
    pub test_type: i64,
}

/// Counters over the whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Summary {
    #[serde(alias = "failedCount", deserialize_with = "null_as_default")]
    pub failed_count: i64,
    #[serde(alias = "testCount", deserialize_with = "null_as_default")]
    pub test_count: i64,
    #[serde(alias = "totalDuration", deserialize_with = "null_as_default")]
    pub total_duration: i64,
}

fn present_but_empty() -> Option<Vec<TestResult>> {
    Some(Vec::new())
}

/// The decoded report.
///
/// A missing `results` key decodes to an empty list, while an explicit `"results": null`
/// decodes to `None`, which cannot be emitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultSet {
    #[serde(default = "present_but_empty")]
    pub results: Option<Vec<TestResult>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Summary>,
}

impl ResultSet {
    fn tested(&self) -> Result<&[TestResult]> {
        self.results
            .as_deref()
            .ok_or(Error::Precondition("the report has no results list (null)"))
    }
}

/// Derive a single flat label value from the raw resource id.
///
/// * `Command`: the command line up to the first `|`, with every ` -` removed and trimmed,
///   so `run -x|extra` becomes `runx`.
/// * `Process`: every `/` becomes `_`.
/// * `Addr`, and any other type: unchanged.
pub fn normalize_resource_id(resource_type: &str, resource_id: &str) -> String {
    match resource_type {
        "Command" => {
            let command = resource_id.split('|').next().unwrap_or_default();
            command.replace(" -", "").trim().to_owned()
        }
        "Process" => resource_id.replace('/', "_"),
        _ => resource_id.to_owned(),
    }
}

impl TestResult {
    /// The result line followed by the duration line.
    pub fn samples(&self) -> [Sample; 2] {
        let metric_type = self.resource_type.to_lowercase();
        let labels = Labels::from_pairs([
            ("property", self.property.clone()),
            (
                "resource",
                normalize_resource_id(&self.resource_type, &self.resource_id),
            ),
            ("skipped", self.skipped.to_string()),
        ]);
        [
            Sample::new(
                format!("goss_result_{metric_type}"),
                labels.clone(),
                self.result,
            ),
            Sample::new(
                format!("goss_result_{metric_type}_duration"),
                labels,
                self.duration,
            ),
        ]
    }
}

/// The `name` label of the summary lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "snake_case")]
enum SummaryName {
    Tested,
    Failed,
    Duration,
}

impl Summary {
    /// The three summary lines, `tag` being the name of the `.prom` file.
    pub fn samples(&self, tag: &str) -> [Sample; 3] {
        [
            (SummaryName::Tested, self.test_count),
            (SummaryName::Failed, self.failed_count),
            (SummaryName::Duration, self.total_duration),
        ]
        .map(|(name, value)| {
            Sample::new(
                "goss_results_summary".into(),
                Labels::from_pairs([("textfile", tag.to_owned()), ("name", name.to_string())]),
                value,
            )
        })
    }
}

/// Reads goss JSON reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct GossFormatter;

impl Formatter for GossFormatter {
    type Results = ResultSet;

    fn decode(&self, data: &[u8]) -> Result<ResultSet> {
        let results: ResultSet = serde_json::from_slice(data)?;
        debug!(
            results = results.results.as_ref().map(Vec::len),
            has_summary = results.summary.is_some(),
            "decoded goss report"
        );
        Ok(results)
    }

    fn check(&self, results: &ResultSet) -> Result<()> {
        results.tested().map(|_| ())
    }

    fn emit(&self, results: &ResultSet, sink: &mut dyn Write, tag: &str) -> Result<()> {
        let tested = results.tested()?;
        for result in tested {
            for sample in result.samples() {
                writeln!(sink, "{sample}")?;
            }
        }
        let summary = results.summary.unwrap_or_else(|| {
            warn!("the report has no summary, writing zeroes");
            Summary::default()
        });
        for sample in summary.samples(tag) {
            writeln!(sink, "{sample}")?;
        }
        Ok(())
    }
}

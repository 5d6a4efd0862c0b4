use super::{
    Label,
    Labels,
    Sample,
};
use winnow::{
    ascii::{
        digit1,
        escaped,
        space0,
        space1,
    },
    combinator::{
        cut_err,
        delimited,
        opt,
        preceded,
        separated,
        terminated,
    },
    error::ParseError,
    stream::{
        Accumulate,
        AsBStr,
    },
    token::{
        none_of,
        one_of,
        take_while,
    },
    PResult,
    Parser,
};

/// Parse a valid prometheus `metric_name` or `label_name`.
fn name_parser(input: &mut &str) -> PResult<String> {
    let start_group = ('a'..='z', 'A'..='Z', '_', ':');
    let rest_group = ('a'..='z', 'A'..='Z', '0'..='9', '_', ':');
    (one_of(start_group), take_while(0.., rest_group))
        .map(|(ch, rest)| format!("{ch}{rest}"))
        .parse_next(input)
}

/// Parse a quoted label value.
///
/// Examples:
///
/// * `"sshd"`
/// * `"_usr_bin_sshd"`
fn label_value_parser(input: &mut &str) -> PResult<String> {
    let escaped = escaped(none_of(br#""\"#), '\\', one_of(br#""n\"#));
    preceded('\"', cut_err(terminated(escaped, '\"')))
        .parse_to()
        .parse_next(input)
}

fn label_key_value_parser(input: &mut &str) -> PResult<(String, String)> {
    let key = name_parser.parse_next(input)?;
    let _ = (space0, '=', space0).parse_next(input)?;
    let val = label_value_parser.parse_next(input)?;
    Ok((key, val))
}

impl Accumulate<(String, String)> for Labels {
    fn initial(capacity: Option<usize>) -> Self {
        Vec::with_capacity(capacity.unwrap_or(3)).into()
    }

    fn accumulate(&mut self, acc: (String, String)) {
        self.push(Label::new(acc.0, acc.1));
    }
}

/// Parses a list of labels delimited by braces, e.g. `{property="running",skipped="false"}`
fn labels_parser(input: &mut &str) -> PResult<Labels> {
    let separator = (space0, ',', space0);
    let list = separated(1.., label_key_value_parser, separator);
    delimited(("{", space0), list, (space0, "}")).parse_next(input)
}

/// Sample values written by this crate are always integers.
fn int_value_parser(input: &mut &str) -> PResult<i64> {
    let prefix = opt(one_of(['+', '-']));
    (prefix, digit1).recognize().parse_to().parse_next(input)
}

/// Parse a single sample line, without a timestamp and without the trailing newline.
///
/// Examples:
/// * `goss_result_process{property="running",resource="sshd",skipped="false"} 0`
/// * `goss_results_summary{textfile="goss.prom",name="tested"} 12`
fn sample_line_parser(input: &mut &str) -> PResult<Sample> {
    let name = name_parser.parse_next(input)?;
    let labels = opt(labels_parser).parse_next(input)?.unwrap_or_default();
    let value = delimited(space1, int_value_parser, space0).parse_next(input)?;
    Ok(Sample::new(name, labels, value))
}

/// A line that is not a well formed sample.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
#[display(fmt = "invalid sample line: {_0}")]
pub struct SampleParseError(String);

impl<I, E> From<ParseError<I, E>> for SampleParseError
where
    I: AsBStr,
    E: std::fmt::Display,
{
    fn from(value: ParseError<I, E>) -> Self {
        Self(value.to_string())
    }
}

impl std::error::Error for SampleParseError {}

pub fn parse_sample(line: &str) -> Result<Sample, SampleParseError> {
    Ok(sample_line_parser.parse(line)?)
}

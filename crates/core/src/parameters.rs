//! Job parameter parsing.
//!
//! Parameterized jobs receive their parameters as newline-delimited
//! `name=value` lines. The first `=` separates name from value, so values
//! may themselves contain `=`.
//!
//! Jenkins accepts undeclared parameters, coerces anything other than
//! `true` (case-insensitive) to `false` for boolean parameters, and answers
//! an invalid choice value with a 500. None of that is checked here.

use crate::error::CoreError;

/// Ordered `name -> value` pairs sent as form fields with the trigger
/// request. A repeated name keeps its first position and its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobParameters {
    pairs: Vec<(String, String)>,
}

impl JobParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a parameter.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(n, _)| *n == name) {
            Some(existing) => existing.1 = value,
            None => self.pairs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The pairs in insertion order, ready for form encoding.
    pub fn as_pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Parse a single `name=value` line.
///
/// Fails when the line has no `=` or when the name before it is empty.
pub fn parse_parameter_line(line: &str) -> Result<(String, String), CoreError> {
    match line.find('=') {
        Some(split) if split > 0 => {
            Ok((line[..split].to_string(), line[split + 1..].to_string()))
        }
        _ => Err(CoreError::InvalidParameter(format!(
            "Job parameters should be specified as \"parameterName=parameterValue\" \
             with one name, value pair per line. Invalid parameter line: {line}"
        ))),
    }
}

/// Parse newline-delimited parameter text.
///
/// Blank lines are skipped and a trailing `\r` is dropped so that CRLF
/// input behaves like LF input. The first invalid line aborts parsing.
pub fn parse_job_parameters(input: &str) -> Result<JobParameters, CoreError> {
    let mut params = JobParameters::new();
    for line in input.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            continue;
        }
        let (name, value) = parse_parameter_line(line)?;
        params.insert(name, value);
    }
    Ok(params)
}

/// Parse an already-split list of parameter lines.
pub fn parse_parameter_lines<S: AsRef<str>>(lines: &[S]) -> Result<JobParameters, CoreError> {
    let mut params = JobParameters::new();
    for line in lines {
        let (name, value) = parse_parameter_line(line.as_ref())?;
        params.insert(name, value);
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn splits_on_first_equals() {
        let (name, value) = parse_parameter_line("url=http://h/?a=b").unwrap();
        assert_eq!(name, "url");
        assert_eq!(value, "http://h/?a=b");
    }

    #[test]
    fn empty_value_is_allowed() {
        let (name, value) = parse_parameter_line("flag=").unwrap();
        assert_eq!(name, "flag");
        assert_eq!(value, "");
    }

    #[test]
    fn missing_equals_is_rejected() {
        assert_matches!(
            parse_parameter_line("novalue"),
            Err(CoreError::InvalidParameter(msg)) if msg.ends_with("Invalid parameter line: novalue")
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        assert_matches!(
            parse_parameter_line("=value"),
            Err(CoreError::InvalidParameter(_))
        );
    }

    #[test]
    fn parses_lines_in_order() {
        let params = parse_parameter_lines(&["foo=bar", "baz=1"]).unwrap();
        assert_eq!(
            params.as_pairs(),
            &[
                ("foo".to_string(), "bar".to_string()),
                ("baz".to_string(), "1".to_string())
            ]
        );
    }

    #[test]
    fn text_input_skips_blank_lines_and_crlf() {
        let params = parse_job_parameters("foo=bar\r\n\r\nbaz=1\n").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.get("foo"), Some("bar"));
        assert_eq!(params.get("baz"), Some("1"));
    }

    #[test]
    fn one_bad_line_fails_the_whole_input() {
        assert_matches!(
            parse_job_parameters("foo=bar\nbroken\nbaz=1"),
            Err(CoreError::InvalidParameter(_))
        );
    }

    #[test]
    fn repeated_name_keeps_last_value() {
        let params = parse_job_parameters("a=1\nb=2\na=3").unwrap();
        assert_eq!(params.len(), 2);
        assert_eq!(params.as_pairs()[0], ("a".to_string(), "3".to_string()));
    }

    #[test]
    fn empty_input_yields_no_parameters() {
        assert!(parse_job_parameters("").unwrap().is_empty());
    }
}

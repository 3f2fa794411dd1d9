//! Whitespace field splitting and lenient numeric parsing for kernel text.
//!
//! Kernel text sources occasionally carry a malformed or missing field (a
//! newer kernel appending columns, a value racing with an update). A single
//! bad token must not abort the whole record, so [`FieldReader`] hands back
//! zero for such tokens and remembers which fields it had to default.

use tracing::debug;

/// Error type for parsing failures.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

/// Splits a line on runs of whitespace.
pub fn fields(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

/// Parses a token as an unsigned 64-bit decimal integer.
pub fn parse_u64(token: &str) -> Result<u64, ParseError> {
    token
        .parse()
        .map_err(|_| ParseError::new(format!("invalid unsigned integer {:?}", token)))
}

/// Strips exactly one surrounding pair of parentheses, if present.
///
/// `"(bash)"` becomes `"bash"`, `"((sd-pam))"` becomes `"(sd-pam)"`.
pub fn strip_parens(token: &str) -> &str {
    token
        .strip_prefix('(')
        .and_then(|s| s.strip_suffix(')'))
        .unwrap_or(token)
}

/// Drops a single trailing NUL byte.
pub fn chop(bytes: &[u8]) -> &[u8] {
    bytes.strip_suffix(&[0]).unwrap_or(bytes)
}

/// Positional reader over the tokens of one record.
///
/// Every accessor returns the parsed value, or zero when the token is absent
/// or unparseable. Defaulted field names are collected and reported once by
/// [`FieldReader::finish`].
#[derive(Debug)]
pub struct FieldReader<'a> {
    tokens: Vec<&'a str>,
    defaulted: Vec<&'static str>,
}

impl<'a> FieldReader<'a> {
    pub fn new(tokens: Vec<&'a str>) -> Self {
        Self {
            tokens,
            defaulted: Vec::new(),
        }
    }

    /// Builds a reader over the whitespace-separated tokens of `line`.
    pub fn from_line(line: &'a str) -> Self {
        Self::new(fields(line))
    }

    /// Raw token at `idx`.
    pub fn token(&self, idx: usize) -> Option<&'a str> {
        self.tokens.get(idx).copied()
    }

    pub fn u64(&mut self, idx: usize, name: &'static str) -> u64 {
        self.parse(idx, name)
    }

    pub fn i32(&mut self, idx: usize, name: &'static str) -> i32 {
        self.parse(idx, name)
    }

    pub fn f64(&mut self, idx: usize, name: &'static str) -> f64 {
        self.parse(idx, name)
    }

    fn parse<T: std::str::FromStr + Default>(&mut self, idx: usize, name: &'static str) -> T {
        match self.tokens.get(idx).map(|s| s.parse::<T>()) {
            Some(Ok(value)) => value,
            _ => {
                self.defaulted.push(name);
                T::default()
            }
        }
    }

    /// Names of the fields that fell back to zero so far.
    pub fn defaulted(&self) -> &[&'static str] {
        &self.defaulted
    }

    /// Reports defaulted fields of `record` and consumes the reader.
    pub fn finish(self, record: &str) -> Vec<&'static str> {
        if !self.defaulted.is_empty() {
            debug!(
                record,
                fields = ?self.defaulted,
                "malformed fields defaulted to zero"
            );
        }
        self.defaulted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_collapses_whitespace() {
        assert_eq!(fields("cpu  100\t5   50\n"), vec!["cpu", "100", "5", "50"]);
        assert!(fields("   ").is_empty());
    }

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("18446744073709551615"), Ok(u64::MAX));
        assert!(parse_u64("-1").is_err());
        assert!(parse_u64("12kB").is_err());
        assert!(parse_u64("").is_err());
    }

    #[test]
    fn test_strip_parens_only_outer_pair() {
        assert_eq!(strip_parens("(bash)"), "bash");
        assert_eq!(strip_parens("((sd-pam))"), "(sd-pam)");
        assert_eq!(strip_parens("bash"), "bash");
        assert_eq!(strip_parens("(unterminated"), "(unterminated");
    }

    #[test]
    fn test_chop() {
        assert_eq!(chop(b"arg\0"), b"arg");
        assert_eq!(chop(b"arg"), b"arg");
        assert_eq!(chop(b"\0"), b"");
    }

    #[test]
    fn test_field_reader_defaults_malformed_and_missing() {
        let mut reader = FieldReader::from_line("10 x 30");

        assert_eq!(reader.u64(0, "a"), 10);
        assert_eq!(reader.u64(1, "b"), 0);
        assert_eq!(reader.u64(2, "c"), 30);
        assert_eq!(reader.i32(7, "d"), 0);
        assert_eq!(reader.defaulted(), &["b", "d"]);

        let defaulted = reader.finish("test");
        assert_eq!(defaulted, vec!["b", "d"]);
    }

    #[test]
    fn test_field_reader_signed_and_float() {
        let mut reader = FieldReader::from_line("-5 0.75");
        assert_eq!(reader.i32(0, "nice"), -5);
        assert!((reader.f64(1, "load") - 0.75).abs() < f64::EPSILON);
        assert!(reader.defaulted().is_empty());
    }
}

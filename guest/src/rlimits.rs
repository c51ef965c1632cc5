//! Parsing of the `KRUN_RLIMITS` resource limit list.
//!
//! The value is a comma separated list of `ID=SOFT:HARD` records, for
//! example `6=4096:8192,7=1024:1024`. `ID` is the kernel resource number
//! (`RLIMIT_NOFILE` is 7 on Linux) and both limits are decimal `u64`
//! values, where `u64::MAX` is `RLIM_INFINITY`.
//!
//! Records are parsed lazily so the caller can apply each one before the
//! next is looked at. The first malformed record ends the iteration.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const RECORD_SEPARATOR: u8 = b',';
pub const RESOURCE_SEPARATOR: u8 = b'=';
pub const LIMIT_SEPARATOR: u8 = b':';

/// Kernel value meaning "no limit".
pub const UNLIMITED: u64 = u64::MAX;

/// One resource limit record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rlimit {
    pub resource: u32,
    pub soft: u64,
    pub hard: u64,
}

impl fmt::Display for Rlimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}=", self.resource)?;
        write_limit(f, self.soft)?;
        f.write_str(":")?;
        write_limit(f, self.hard)
    }
}

fn write_limit(f: &mut fmt::Formatter<'_>, limit: u64) -> fmt::Result {
    if limit == UNLIMITED {
        f.write_str("unlimited")
    } else {
        write!(f, "{}", limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Resource,
    Soft,
    Hard,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Field::Resource => "resource id",
            Field::Soft => "soft limit",
            Field::Hard => "hard limit",
        })
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RlimitParseErrorKind {
    #[error("expected digits for {0}")]
    MissingDigits(Field),

    #[error("{0} out of range")]
    Overflow(Field),

    #[error("expected {expected:?}, found {found:?}")]
    UnexpectedChar { expected: char, found: char },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} at offset {offset}")]
pub struct RlimitParseError {
    pub offset: usize,
    pub kind: RlimitParseErrorKind,
}

/// Streaming parser over a `KRUN_RLIMITS` value.
///
/// Yields one `Ok(Rlimit)` per well formed record, left to right. After
/// the first `Err` the iterator is exhausted.
#[derive(Debug)]
pub struct RlimitParser<'a> {
    input: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> RlimitParser<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            done: input.is_empty(),
        }
    }

    fn error(&self, kind: RlimitParseErrorKind) -> RlimitParseError {
        RlimitParseError {
            offset: self.pos,
            kind,
        }
    }

    fn number<T: FromStr>(&mut self, field: Field) -> Result<T, RlimitParseError> {
        let start = self.pos;
        let len = self.input[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count();
        if len == 0 {
            return Err(self.error(RlimitParseErrorKind::MissingDigits(field)));
        }

        // Only ASCII digits were consumed, so the slice is valid UTF-8 and
        // the parse can only fail on overflow.
        let digits = std::str::from_utf8(&self.input[start..start + len])
            .map_err(|_| self.error(RlimitParseErrorKind::MissingDigits(field)))?;
        let value = digits
            .parse()
            .map_err(|_| self.error(RlimitParseErrorKind::Overflow(field)))?;

        self.pos += len;
        Ok(value)
    }

    fn expect(&mut self, separator: u8, field: Field) -> Result<(), RlimitParseError> {
        match self.input.get(self.pos) {
            Some(&b) if b == separator => {
                self.pos += 1;
                Ok(())
            }
            Some(&b) => Err(self.error(RlimitParseErrorKind::UnexpectedChar {
                expected: separator as char,
                found: b as char,
            })),
            None => Err(self.error(RlimitParseErrorKind::MissingDigits(field))),
        }
    }

    fn record(&mut self) -> Result<Rlimit, RlimitParseError> {
        let resource = self.number(Field::Resource)?;
        self.expect(RESOURCE_SEPARATOR, Field::Soft)?;
        let soft = self.number(Field::Soft)?;
        self.expect(LIMIT_SEPARATOR, Field::Hard)?;
        let hard = self.number(Field::Hard)?;

        if self.pos < self.input.len() {
            self.expect(RECORD_SEPARATOR, Field::Resource)?;
        } else {
            self.done = true;
        }

        Ok(Rlimit {
            resource,
            soft,
            hard,
        })
    }
}

impl Iterator for RlimitParser<'_> {
    type Item = Result<Rlimit, RlimitParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let record = self.record();
        if record.is_err() {
            self.done = true;
        }
        Some(record)
    }
}

impl std::iter::FusedIterator for RlimitParser<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_rlimits(input: &str) -> Result<Vec<Rlimit>, RlimitParseError> {
        RlimitParser::new(input).collect()
    }

    fn err_kind(input: &str) -> RlimitParseErrorKind {
        parse_rlimits(input).unwrap_err().kind
    }

    #[test]
    fn test_single_record() {
        let limits = parse_rlimits("6=4096:8192").unwrap();
        assert_eq!(
            limits,
            vec![Rlimit {
                resource: 6,
                soft: 4096,
                hard: 8192
            }]
        );
    }

    #[test]
    fn test_multiple_records_in_order() {
        let limits = parse_rlimits("7=1024:4096,6=10:20,4=0:0").unwrap();
        let resources: Vec<u32> = limits.iter().map(|l| l.resource).collect();
        assert_eq!(resources, vec![7, 6, 4]);
        assert_eq!(limits[2].soft, 0);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(RlimitParser::new("").count(), 0);
    }

    #[test]
    fn test_unlimited_is_not_an_error() {
        let limits = parse_rlimits("3=18446744073709551615:18446744073709551615").unwrap();
        assert_eq!(limits[0].soft, UNLIMITED);
        assert_eq!(limits[0].hard, UNLIMITED);
        assert_eq!(limits[0].to_string(), "3=unlimited:unlimited");
    }

    #[test]
    fn test_missing_resource_digits() {
        let err = parse_rlimits("=100:200").unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.kind, RlimitParseErrorKind::MissingDigits(Field::Resource));
    }

    #[test]
    fn test_stops_after_first_error() {
        let mut parser = RlimitParser::new("7=1:2,x=3:4,6=5:6");
        assert!(parser.next().unwrap().is_ok());
        assert!(parser.next().unwrap().is_err());
        assert!(parser.next().is_none());
    }

    #[test]
    fn test_resource_overflow() {
        assert_eq!(
            err_kind("4294967296=1:2"),
            RlimitParseErrorKind::Overflow(Field::Resource)
        );
    }

    #[test]
    fn test_limit_overflow() {
        assert_eq!(
            err_kind("7=18446744073709551616:1"),
            RlimitParseErrorKind::Overflow(Field::Soft)
        );
    }

    #[test]
    fn test_truncated_record() {
        assert_eq!(err_kind("7=10"), RlimitParseErrorKind::MissingDigits(Field::Hard));
        assert_eq!(err_kind("7=10:"), RlimitParseErrorKind::MissingDigits(Field::Hard));
        assert_eq!(err_kind("7"), RlimitParseErrorKind::MissingDigits(Field::Soft));
    }

    #[test]
    fn test_trailing_separator() {
        let mut parser = RlimitParser::new("7=10:20,");
        assert_eq!(
            parser.next(),
            Some(Ok(Rlimit {
                resource: 7,
                soft: 10,
                hard: 20
            }))
        );
        let err = parser.next().unwrap().unwrap_err();
        assert_eq!(err.offset, 8);
        assert_eq!(err.kind, RlimitParseErrorKind::MissingDigits(Field::Resource));
    }

    #[test]
    fn test_wrong_separator() {
        assert_eq!(
            err_kind("7:10=20"),
            RlimitParseErrorKind::UnexpectedChar {
                expected: '=',
                found: ':'
            }
        );
        assert_eq!(
            err_kind("7=10:20;6=1:2"),
            RlimitParseErrorKind::UnexpectedChar {
                expected: ',',
                found: ';'
            }
        );
    }

    #[test]
    fn test_no_whitespace_tolerance() {
        assert_eq!(
            err_kind(" 7=10:20"),
            RlimitParseErrorKind::MissingDigits(Field::Resource)
        );
        assert_eq!(
            err_kind("+7=10:20"),
            RlimitParseErrorKind::MissingDigits(Field::Resource)
        );
    }
}

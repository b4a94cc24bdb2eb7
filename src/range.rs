//! Range expressions over a 1-based file listing.
//!
//! Grammar: comma separated tokens, each one of
//! - `N` - a single index
//! - `N-M` - every index from `N` to `M` inclusive
//! - `N-` - every index from `N` to the end of the listing
//!
//! Tokens are applied in the order written and overlaps are kept, so
//! `"2,1-3"` yields `2, 1, 2, 3`.

use std::fmt;
use std::str::FromStr;

/// Errors produced while parsing a range expression.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("empty range")]
    Empty,

    #[error("empty element in range '{0}'")]
    EmptyToken(String),

    #[error("'{0}' is not a valid image number")]
    NotANumber(String),

    #[error("image numbers start at 1, got 0")]
    Zero,

    #[error("decreasing range {start}-{end}")]
    Decreasing { start: usize, end: usize },
}

/// One element of a range: a start index and an optional inclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: usize,
    /// `None` means "to the last file"
    pub end: Option<usize>,
}

impl Interval {
    pub fn single(index: usize) -> Self {
        Self {
            start: index,
            end: Some(index),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.end {
            Some(end) if end == self.start => write!(f, "{}", self.start),
            Some(end) => write!(f, "{}-{}", self.start, end),
            None => write!(f, "{}-", self.start),
        }
    }
}

/// Parsed range expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSpec {
    intervals: Vec<Interval>,
}

impl RangeSpec {
    /// Parse a range expression.
    pub fn parse(text: &str) -> Result<Self, RangeError> {
        if text.trim().is_empty() {
            return Err(RangeError::Empty);
        }

        let intervals = text
            .split(',')
            .map(|token| parse_token(token.trim(), text))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { intervals })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    /// Selected 1-based indices against a listing of `len` entries.
    ///
    /// Indices past the end of the listing are dropped.
    pub fn indices(&self, len: usize) -> Vec<usize> {
        let mut selected = Vec::new();
        for interval in &self.intervals {
            let end = interval.end.unwrap_or(len).min(len);
            selected.extend(interval.start..=end);
        }
        selected
    }
}

impl FromStr for RangeSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn parse_token(token: &str, whole: &str) -> Result<Interval, RangeError> {
    if token.is_empty() {
        return Err(RangeError::EmptyToken(whole.to_string()));
    }

    match token.split_once('-') {
        None => Ok(Interval::single(parse_index(token)?)),
        Some((start, "")) => Ok(Interval {
            start: parse_index(start.trim())?,
            end: None,
        }),
        Some((start, end)) => {
            let start = parse_index(start.trim())?;
            let end = parse_index(end.trim())?;
            if end < start {
                return Err(RangeError::Decreasing { start, end });
            }
            Ok(Interval {
                start,
                end: Some(end),
            })
        }
    }
}

fn parse_index(text: &str) -> Result<usize, RangeError> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::NotANumber(text.to_string()));
    }
    match text.parse::<usize>() {
        Ok(0) => Err(RangeError::Zero),
        Ok(n) => Ok(n),
        Err(_) => Err(RangeError::NotANumber(text.to_string())),
    }
}

/// Whether a range argument names a single file instead of a range.
///
/// A filename has an extension marker and no path separator.
pub fn looks_like_filename(arg: &str) -> bool {
    arg.contains('.') && !arg.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mixed_tokens() {
        let spec = RangeSpec::parse("1,3-5,9-").unwrap();
        assert_eq!(spec.indices(10), vec![1, 3, 4, 5, 9, 10]);
    }

    #[test]
    fn test_degenerate_interval() {
        let spec = RangeSpec::parse("2-2").unwrap();
        assert_eq!(spec.indices(6), vec![2]);
    }

    #[test]
    fn test_out_of_range_indices_are_absent() {
        let spec = RangeSpec::parse("4,12,5-20").unwrap();
        assert_eq!(spec.indices(6), vec![4, 5, 6]);

        let past_end = RangeSpec::parse("9-").unwrap();
        assert!(past_end.indices(5).is_empty());
    }

    #[test]
    fn test_overlaps_are_not_deduplicated() {
        let spec = RangeSpec::parse("2,1-3").unwrap();
        assert_eq!(spec.indices(5), vec![2, 1, 2, 3]);
    }

    #[test]
    fn test_written_order_is_kept() {
        let spec = RangeSpec::parse("5,1").unwrap();
        assert_eq!(spec.indices(5), vec![5, 1]);
    }

    #[test]
    fn test_whitespace_is_ignored() {
        let spec = RangeSpec::parse(" 1 , 3 - 4 ").unwrap();
        assert_eq!(spec.indices(5), vec![1, 3, 4]);
    }

    #[test]
    fn test_invalid_expressions() {
        assert_eq!(RangeSpec::parse(""), Err(RangeError::Empty));
        assert_eq!(RangeSpec::parse("0"), Err(RangeError::Zero));
        assert_eq!(
            RangeSpec::parse("abc"),
            Err(RangeError::NotANumber("abc".to_string()))
        );
        assert_eq!(
            RangeSpec::parse("5-2"),
            Err(RangeError::Decreasing { start: 5, end: 2 })
        );
        assert!(matches!(RangeSpec::parse("1,,2"), Err(RangeError::EmptyToken(_))));
        assert!(matches!(RangeSpec::parse("-3"), Err(RangeError::NotANumber(_))));
        assert!(matches!(RangeSpec::parse("1-2-3"), Err(RangeError::NotANumber(_))));
    }

    #[test]
    fn test_interval_display() {
        let spec: RangeSpec = "1,3-5,9-".parse().unwrap();
        let rendered: Vec<String> = spec.intervals().iter().map(|i| i.to_string()).collect();
        assert_eq!(rendered, vec!["1", "3-5", "9-"]);
    }

    #[test]
    fn test_looks_like_filename() {
        assert!(looks_like_filename("IMG_0001.JPG"));
        assert!(!looks_like_filename("1-3"));
        assert!(!looks_like_filename("DCIM/IMG_0001.JPG"));
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::{Error, ErrorKind, Result};

/// A non-empty, contiguous range of bytes within a remote file.
///
/// The range starts at `offset` and spans `len` bytes, so its last byte is at
/// `offset + len - 1`. Remote protocols usually express ranges with an inclusive end;
/// [`ByteRange::last`] and the [`Display`](fmt::Display) impl (`bytes=<first>-<last>`)
/// provide that form.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ByteRange {
    offset: u64,
    len: u64,
}

impl ByteRange {
    /// Creates a range of `len` bytes starting at `offset`.
    ///
    /// Returns `None` if `len` is zero or the range would extend past `u64::MAX`.
    #[must_use]
    pub fn new(offset: u64, len: u64) -> Option<Self> {
        if len == 0 {
            return None;
        }
        offset.checked_add(len - 1)?;
        Some(Self { offset, len })
    }

    /// The offset of the first byte.
    #[must_use]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// The number of bytes covered.
    #[must_use]
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Always `false`; empty ranges cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// The offset of the last byte, inclusive.
    #[must_use]
    pub fn last(&self) -> u64 {
        self.offset + (self.len - 1)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.offset, self.last())
    }
}

/// Extracts the total resource length from a content range value.
///
/// Accepts `<first>-<last>/<total>` with or without the leading `bytes ` unit, and the
/// unsatisfied form `*/<total>`. Only the total is returned; `Ok(None)` means the server
/// reported the total as unknown (`*`).
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidContentRange`] if the value is not in one of the forms above.
pub fn parse_content_range_total(value: &str) -> Result<Option<u64>> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix("bytes ").unwrap_or(trimmed).trim_start();

    let Some((range, total)) = body.split_once('/') else {
        return Err(invalid_content_range(value));
    };

    if range != "*" {
        let Some((first, last)) = range.split_once('-') else {
            return Err(invalid_content_range(value));
        };
        let first: u64 = first.parse().map_err(|_parse_error| invalid_content_range(value))?;
        let last: u64 = last.parse().map_err(|_parse_error| invalid_content_range(value))?;
        if last < first {
            return Err(invalid_content_range(value));
        }
    }

    if total == "*" {
        return Ok(None);
    }

    total.parse().map(Some).map_err(|_parse_error| invalid_content_range(value))
}

fn invalid_content_range(value: &str) -> Error {
    Error::caused_by(ErrorKind::InvalidContentRange, format!("malformed content range {value:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_reports_inclusive_last_byte() {
        let range = ByteRange::new(450, 50).unwrap();

        assert_eq!(range.offset(), 450);
        assert_eq!(range.len(), 50);
        assert_eq!(range.last(), 499);
        assert_eq!(range.to_string(), "bytes=450-499");
    }

    #[test]
    fn empty_or_overflowing_range_is_rejected() {
        assert!(ByteRange::new(0, 0).is_none());
        assert!(ByteRange::new(u64::MAX, 2).is_none());
        assert!(ByteRange::new(u64::MAX, 1).is_some());
    }

    #[test]
    fn total_is_parsed_with_and_without_unit() {
        assert_eq!(parse_content_range_total("bytes 0-99/500").unwrap(), Some(500));
        assert_eq!(parse_content_range_total("0-99/500").unwrap(), Some(500));
        assert_eq!(parse_content_range_total("bytes */1024").unwrap(), Some(1024));
    }

    #[test]
    fn unknown_total_is_none() {
        assert_eq!(parse_content_range_total("bytes 0-99/*").unwrap(), None);
    }

    #[test]
    fn malformed_values_are_rejected() {
        for value in ["", "bytes", "0-99", "bytes 0-99/abc", "bytes 99-0/500", "bytes a-b/500", "bytes 0/500"] {
            let error = parse_content_range_total(value).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidContentRange, "value: {value:?}");
        }
    }
}

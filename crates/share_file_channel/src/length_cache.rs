// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::Result;
use crate::range::parse_content_range_total;

/// The last total length of a remote file reported by the server.
///
/// Starts out unknown. Each observation overwrites the previous one; nothing else ever
/// clears it. The value is only as fresh as the last response, so another writer may
/// have grown or shrunk the file since.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LengthCache {
    length: Option<u64>,
}

impl LengthCache {
    /// Creates a cache with no known length.
    #[must_use]
    pub const fn new() -> Self {
        Self { length: None }
    }

    /// The last observed length, or `None` if no response has reported one.
    #[must_use]
    pub fn get(&self) -> Option<u64> {
        self.length
    }

    /// Records an authoritative total length.
    pub fn observe(&mut self, length: u64) {
        tracing::trace!(previous = ?self.length, length, "updating cached resource length");
        self.length = Some(length);
    }

    /// Records the total carried by a content range value, if any.
    ///
    /// Missing metadata or an unknown (`*`) total leave the cache as it is.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidContentRange`](crate::ErrorKind::InvalidContentRange) if
    /// the value is malformed. The cache is left untouched in that case.
    pub fn observe_content_range(&mut self, content_range: Option<&str>) -> Result<()> {
        if let Some(total) = content_range.map(parse_content_range_total).transpose()?.flatten() {
            self.observe(total);
        }
        Ok(())
    }
}

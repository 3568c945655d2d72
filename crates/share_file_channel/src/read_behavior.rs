// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::BytesMut;

use crate::length_cache::LengthCache;
use crate::{AccessConditions, ByteRange, Result, ShareFileClient};

/// The result of a single read.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadOutcome {
    /// The given number of bytes were appended to the destination buffer.
    ///
    /// Zero is only reported when the server returned an empty body.
    Bytes(usize),

    /// Nothing can be transferred: the requested offset is at or past the last known
    /// length of the resource, or the destination has no spare capacity.
    EndOfResource,
}

impl ReadOutcome {
    /// The number of bytes transferred, zero at the end of the resource.
    #[must_use]
    pub fn bytes_read(self) -> usize {
        match self {
            Self::Bytes(n) => n,
            Self::EndOfResource => 0,
        }
    }

    /// Returns `true` if the end of the resource was reached.
    #[must_use]
    pub fn is_end(self) -> bool {
        matches!(self, Self::EndOfResource)
    }
}

/// Reads ranges of a remote resource on behalf of a seekable channel.
///
/// The channel owns the cursor; the behavior turns one `(buffer, offset)` request into at
/// most one remote call.
///
/// # Ownership
///
/// Methods take `&mut self`, so only one read can be in flight per behavior.
#[trait_variant::make(Send)]
pub trait ReadBehavior: Debug {
    /// Reads bytes starting at `offset` into the spare capacity of `destination`.
    ///
    /// Never appends more than `destination.capacity() - destination.len()` bytes. Bytes
    /// already in the buffer are left untouched. A destination without spare capacity
    /// reports [`ReadOutcome::EndOfResource`].
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails or its response metadata is malformed.
    async fn read(&mut self, destination: &mut BytesMut, offset: u64) -> Result<ReadOutcome>;

    /// The last total length of the resource reported by the server, if any.
    fn cached_length(&self) -> Option<u64>;
}

/// A [`ReadBehavior`] that downloads ranges of a share file through a [`ShareFileClient`].
///
/// Each read is clipped to the last known length of the file, so reads at or past that
/// length end without a remote call. Every response with content-range metadata refreshes
/// the known length.
///
/// The known length can go stale: if another client grows the file, reads stop at the old
/// end; if it shrinks the file, a request may cover bytes that no longer exist and the
/// server's range error is returned as is. Neither case is retried.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::BytesMut;
/// use share_file_channel::{AccessConditions, ReadBehavior, ShareFileClient, ShareFileReadBehavior};
///
/// async fn first_kilobyte<C: ShareFileClient>(client: Arc<C>) -> share_file_channel::Result<BytesMut> {
///     let mut behavior = ShareFileReadBehavior::new(client, Arc::new(AccessConditions::new()));
///     let mut buf = BytesMut::with_capacity(1024);
///
///     // A short file ends the read early; the buffer then holds the whole file.
///     behavior.read(&mut buf, 0).await?;
///     Ok(buf)
/// }
/// ```
#[derive(Debug)]
pub struct ShareFileReadBehavior<C> {
    client: Arc<C>,
    conditions: Arc<AccessConditions>,
    length: LengthCache,
}

impl<C: ShareFileClient> ShareFileReadBehavior<C> {
    /// Creates a behavior reading from `client` with no known length.
    #[must_use]
    pub fn new(client: Arc<C>, conditions: Arc<AccessConditions>) -> Self {
        Self {
            client,
            conditions,
            length: LengthCache::new(),
        }
    }

    /// Seeds the known length, for callers that already fetched the file properties.
    #[must_use]
    pub fn with_known_length(mut self, length: u64) -> Self {
        self.length.observe(length);
        self
    }

    /// The conditions attached to every download.
    #[must_use]
    pub fn conditions(&self) -> &AccessConditions {
        &self.conditions
    }
}

impl<C: ShareFileClient> ReadBehavior for ShareFileReadBehavior<C> {
    async fn read(&mut self, destination: &mut BytesMut, offset: u64) -> Result<ReadOutcome> {
        let known = self.length.get();
        if known.is_some_and(|length| offset >= length) {
            tracing::trace!(offset, length = ?known, "read at or past known end of resource");
            return Ok(ReadOutcome::EndOfResource);
        }

        let requested = destination.capacity() - destination.len();
        if requested == 0 {
            return Ok(ReadOutcome::EndOfResource);
        }

        let available = known.map_or(u64::MAX - offset, |length| length - offset);
        let Some(range) = ByteRange::new(offset, (requested as u64).min(available)) else {
            return Ok(ReadOutcome::EndOfResource);
        };

        tracing::debug!(offset, len = range.len(), "downloading range");
        let download = self.client.download_range(range, &self.conditions).await?;
        self.length.observe_content_range(download.content_range.as_deref())?;

        let len = usize::try_from(range.len()).map_or(download.content.len(), |max| download.content.len().min(max));
        destination.extend_from_slice(&download.content[..len]);

        Ok(ReadOutcome::Bytes(len))
    }

    fn cached_length(&self) -> Option<u64> {
        self.length.get()
    }
}

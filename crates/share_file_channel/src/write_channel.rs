// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::SeekFrom;

use bytes::{Bytes, BytesMut};

use crate::{Error, Result, WriteBehavior};

/// A seekable, write-only view of a remote resource.
///
/// Writes are collected into a pending buffer of up to `chunk_size` bytes and sent through
/// the [`WriteBehavior`] whenever the buffer fills up, the cursor moves, or the channel is
/// flushed or closed. Writes of a full chunk or more with nothing pending skip the buffer.
///
/// Seeks are checked by the behavior before the cursor moves. [`close`](Self::close) flushes
/// and commits; dropping the channel without closing it discards pending bytes.
///
/// Obtain a `WriteChannel` from
/// [`ChannelOptions::open_write`](crate::ChannelOptions::open_write), or wrap any behavior
/// with [`WriteChannel::new`].
#[derive(Debug)]
pub struct WriteChannel<B: WriteBehavior> {
    behavior: B,
    position: u64,
    pending: BytesMut,
    pending_offset: u64,
    chunk_size: usize,
    extent: u64,
    closed: bool,
}

impl<B: WriteBehavior> WriteChannel<B> {
    /// Creates a channel writing through `behavior`, starting at position 0.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) if `chunk_size`
    /// is zero.
    pub fn new(behavior: B, chunk_size: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::invalid_input("chunk size must be greater than zero"));
        }
        Ok(Self {
            behavior,
            position: 0,
            pending: BytesMut::new(),
            pending_offset: 0,
            chunk_size,
            extent: 0,
            closed: false,
        })
    }

    /// Writes `data` at the current position and advances the cursor past it.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or a chunk upload fails. On failure the
    /// cursor points past the bytes accepted before the failing upload, which are either
    /// uploaded or still pending; the rest of `data` was not written and can be written
    /// again from [`stream_position`](Self::stream_position). Use
    /// [`write_some`](Self::write_some) to learn how many bytes were accepted.
    pub async fn write(&mut self, data: Bytes) -> Result<()> {
        self.ensure_open()?;
        self.write_accepting(data).await.1
    }

    /// Writes a prefix of `data` and returns its length.
    ///
    /// Stops at the first failed upload. If some bytes were accepted before it, their count
    /// is returned and the failure is left for the next call to surface.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the upload fails before any byte of
    /// `data` was accepted. Nothing of `data` is written in that case.
    pub async fn write_some(&mut self, data: Bytes) -> Result<usize> {
        self.ensure_open()?;
        match self.write_accepting(data).await {
            (0, Err(error)) => Err(error),
            (accepted, _) => Ok(accepted),
        }
    }

    /// Copies `data` and writes it at the current position.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`write`](Self::write).
    pub async fn write_slice(&mut self, data: &[u8]) -> Result<()> {
        self.write(Bytes::copy_from_slice(data)).await
    }

    /// Uploads any pending bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the upload fails. Pending bytes are
    /// kept on failure.
    pub async fn flush(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.flush_pending().await
    }

    /// Flushes, then moves the cursor after the behavior accepted the new position.
    ///
    /// [`SeekFrom::End`] is resolved against
    /// [`WriteBehavior::resource_length`], which may fetch the size of the resource.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Unsupported`](crate::ErrorKind::Unsupported) if the behavior
    /// rejects the position or the end is unknown, and
    /// [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) if the target cannot be
    /// expressed as a signed 64-bit offset.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        self.flush_pending().await?;

        let base = match pos {
            SeekFrom::Start(_) => 0,
            SeekFrom::Current(_) => self.position,
            SeekFrom::End(_) => self
                .behavior
                .resource_length()
                .await?
                .ok_or_else(|| Error::unsupported("cannot seek from the end of a resource of unknown length"))?,
        };
        let target = match pos {
            SeekFrom::Start(offset) => i64::try_from(offset).ok(),
            SeekFrom::Current(delta) | SeekFrom::End(delta) => i64::try_from(base).ok().and_then(|base| base.checked_add(delta)),
        }
        .ok_or_else(|| Error::invalid_input(format!("{pos:?} moves the cursor outside of the addressable range")))?;

        self.behavior.assert_can_seek(target).await?;

        // `assert_can_seek` rejects negative positions.
        let target = u64::try_from(target).map_err(Error::invalid_input)?;
        tracing::trace!(from = self.position, to = target, "seeking write channel");
        self.position = target;
        Ok(target)
    }

    /// Returns the current position of the cursor.
    #[must_use]
    pub fn stream_position(&self) -> u64 {
        self.position
    }

    /// Flushes, then asks the behavior to resize the resource to `len` bytes.
    ///
    /// # Errors
    ///
    /// Returns the behavior's error; share files cannot be resized through a channel.
    pub async fn truncate(&mut self, len: u64) -> Result<()> {
        self.ensure_open()?;
        self.flush_pending().await?;
        self.behavior.resize(len).await
    }

    /// Flushes pending bytes and commits everything written.
    ///
    /// The commit receives the end of the furthest byte written through this channel.
    /// Later I/O fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed). Closing an
    /// already closed channel does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the flush or commit fails; the channel stays open in that case.
    pub async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.flush_pending().await?;
        self.behavior.commit(self.extent).await?;
        tracing::debug!(extent = self.extent, "closed write channel");
        self.closed = true;
        Ok(())
    }

    /// Returns `true` once [`close`](Self::close) succeeded.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// The number of bytes written but not yet uploaded.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// The chunk size used for remote writes.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the behavior the channel writes through.
    #[must_use]
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::closed());
        }
        Ok(())
    }

    /// Writes `data`, returning how many bytes were accepted alongside the outcome.
    ///
    /// Accepted bytes are uploaded or pending. A chunk whose upload fails is not accepted.
    async fn write_accepting(&mut self, mut data: Bytes) -> (usize, Result<()>) {
        let mut accepted = 0;
        while !data.is_empty() {
            if self.pending.is_empty() && data.len() >= self.chunk_size {
                let chunk = data.split_to(self.chunk_size);
                let len = chunk.len();
                if let Err(error) = self.behavior.write(chunk, self.position).await {
                    return (accepted, Err(error));
                }
                self.advance(len as u64);
                accepted += len;
                continue;
            }

            if self.pending.is_empty() {
                self.pending_offset = self.position;
                self.pending.reserve(self.chunk_size);
            }

            let take = data.len().min(self.chunk_size - self.pending.len());
            let extent = self.extent;
            self.pending.extend_from_slice(&data.split_to(take));
            self.advance(take as u64);

            if self.pending.len() == self.chunk_size
                && let Err(error) = self.flush_pending().await
            {
                // Bytes pending from earlier calls stay; only this step is undone.
                self.pending.truncate(self.pending.len() - take);
                self.position -= take as u64;
                self.extent = extent;
                return (accepted, Err(error));
            }
            accepted += take;
        }
        (accepted, Ok(()))
    }

    fn advance(&mut self, len: u64) {
        self.position += len;
        self.extent = self.extent.max(self.position);
    }

    async fn flush_pending(&mut self) -> Result<()> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let data = self.pending.split().freeze();
        if let Err(error) = self.behavior.write(data.clone(), self.pending_offset).await {
            self.pending.extend_from_slice(&data);
            return Err(error);
        }
        Ok(())
    }
}

impl<B: WriteBehavior> Drop for WriteChannel<B> {
    fn drop(&mut self) {
        if !self.closed && !self.pending.is_empty() {
            tracing::warn!(
                pending = self.pending.len(),
                offset = self.pending_offset,
                "write channel dropped with unflushed bytes"
            );
        }
    }
}

#[cfg(feature = "sync-compat")]
impl<B: WriteBehavior> std::io::Write for WriteChannel<B> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        futures::executor::block_on(self.write_some(Bytes::copy_from_slice(buf))).map_err(Into::into)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        futures::executor::block_on(Self::flush(self)).map_err(Into::into)
    }
}

#[cfg(feature = "sync-compat")]
impl<B: WriteBehavior> std::io::Seek for WriteChannel<B> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        futures::executor::block_on(Self::seek(self, pos)).map_err(Into::into)
    }
}

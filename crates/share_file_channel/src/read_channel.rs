// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::SeekFrom;

use bytes::{Bytes, BytesMut};

use crate::{Error, ReadBehavior, ReadOutcome, Result};

/// A seekable, read-only view of a remote resource.
///
/// The channel keeps a cursor and reads through a [`ReadBehavior`] in chunks of
/// `chunk_size` bytes, serving smaller reads from the last chunk it fetched. A chunk is
/// fetched with a single behavior read, so each call below costs at most one remote
/// round trip.
///
/// Because the cursor is shared mutable state, all I/O methods take `&mut self`.
///
/// Obtain a `ReadChannel` from [`ChannelOptions::open_read`](crate::ChannelOptions::open_read),
/// or wrap any behavior with [`ReadChannel::new`].
#[derive(Debug)]
pub struct ReadChannel<B> {
    behavior: B,
    position: u64,
    chunk: Bytes,
    chunk_offset: u64,
    chunk_size: usize,
    closed: bool,
}

impl<B: ReadBehavior> ReadChannel<B> {
    /// Creates a channel reading through `behavior`, starting at position 0.
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
            chunk: Bytes::new(),
            chunk_offset: 0,
            chunk_size,
            closed: false,
        })
    }

    /// Reads at most `len` bytes from the current position.
    ///
    /// May return fewer bytes than requested. An empty result indicates the end of the
    /// resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the underlying read fails.
    pub async fn read_max(&mut self, len: usize) -> Result<Bytes> {
        self.ensure_open()?;
        if len == 0 || !self.fill().await? {
            return Ok(Bytes::new());
        }
        Ok(self.take_buffered(len))
    }

    /// Reads up to `len` bytes from the current position, making a best effort to return
    /// the full amount.
    ///
    /// Returns fewer bytes only when the end of the resource is reached first.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or any underlying read fails. Bytes read
    /// before the failure stay consumed.
    pub async fn read(&mut self, len: usize) -> Result<Bytes> {
        let first = self.read_max(len).await?;
        if first.len() == len || first.is_empty() {
            return Ok(first);
        }

        let mut buf = BytesMut::from(&first[..]);
        while buf.len() < len {
            let part = self.read_max(len - buf.len()).await?;
            if part.is_empty() {
                break;
            }
            buf.extend_from_slice(&part);
        }
        Ok(buf.freeze())
    }

    /// Reads from the current position into the spare capacity of `destination`.
    ///
    /// Like [`ReadBehavior::read`], a destination without spare capacity reports
    /// [`ReadOutcome::EndOfResource`].
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the underlying read fails.
    pub async fn read_into(&mut self, destination: &mut BytesMut) -> Result<ReadOutcome> {
        let spare = destination.capacity() - destination.len();
        let bytes = self.read_max(spare).await?;
        if bytes.is_empty() {
            return Ok(ReadOutcome::EndOfResource);
        }
        destination.extend_from_slice(&bytes);
        Ok(ReadOutcome::Bytes(bytes.len()))
    }

    /// Reads from the current position into `buf`, returning the number of bytes copied.
    ///
    /// A return of zero with a non-empty `buf` indicates the end of the resource.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed or the underlying read fails.
    pub async fn read_into_slice(&mut self, buf: &mut [u8]) -> Result<usize> {
        let bytes = self.read_max(buf.len()).await?;
        buf[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Moves the cursor, returning the new position measured from the start.
    ///
    /// Seeking past the end is allowed; reads there report the end of the resource.
    /// [`SeekFrom::End`] is resolved against the length last reported by the server.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) if the target
    /// is before the start or overflows, and
    /// [`ErrorKind::Unsupported`](crate::ErrorKind::Unsupported) for [`SeekFrom::End`]
    /// while the length is still unknown.
    pub async fn seek(&mut self, pos: SeekFrom) -> Result<u64> {
        self.ensure_open()?;
        let target = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::Current(delta) => self.position.checked_add_signed(delta),
            SeekFrom::End(delta) => {
                let length = self
                    .behavior
                    .cached_length()
                    .ok_or_else(|| Error::unsupported("cannot seek from the end before the resource length is known"))?;
                length.checked_add_signed(delta)
            }
        }
        .ok_or_else(|| Error::invalid_input(format!("{pos:?} moves the cursor outside of the addressable range")))?;

        tracing::trace!(from = self.position, to = target, "seeking read channel");
        self.position = target;
        Ok(target)
    }

    /// Returns the current position of the cursor.
    #[must_use]
    pub fn stream_position(&self) -> u64 {
        self.position
    }

    /// Moves the cursor back to the start.
    ///
    /// # Errors
    ///
    /// Returns an error if the channel is closed.
    pub async fn rewind(&mut self) -> Result<()> {
        self.seek(SeekFrom::Start(0)).await.map(|_| ())
    }

    /// The length of the resource as last reported by the server, if known.
    #[must_use]
    pub fn size(&self) -> Option<u64> {
        self.behavior.cached_length()
    }

    /// The chunk size used for remote reads.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Closes the channel and releases the buffered chunk.
    ///
    /// Later I/O fails with [`ErrorKind::Closed`](crate::ErrorKind::Closed). Closing twice
    /// is allowed.
    ///
    /// # Errors
    ///
    /// A read channel holds nothing that must reach the remote side, so closing it
    /// always succeeds.
    pub async fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.chunk = Bytes::new();
        Ok(())
    }

    /// Returns `true` once [`close`](Self::close) was called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Returns the behavior the channel reads through.
    #[must_use]
    pub fn behavior(&self) -> &B {
        &self.behavior
    }

    /// Consumes the channel, returning its behavior.
    #[must_use]
    pub fn into_behavior(self) -> B {
        self.behavior
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::closed());
        }
        Ok(())
    }

    /// Makes sure the chunk covers the cursor. Returns `false` at the end of the resource.
    async fn fill(&mut self) -> Result<bool> {
        let chunk_end = self.chunk_offset + self.chunk.len() as u64;
        if (self.chunk_offset..chunk_end).contains(&self.position) {
            return Ok(true);
        }

        self.chunk = Bytes::new();
        let mut buf = BytesMut::with_capacity(self.chunk_size);
        match self.behavior.read(&mut buf, self.position).await? {
            ReadOutcome::EndOfResource | ReadOutcome::Bytes(0) => Ok(false),
            ReadOutcome::Bytes(_) => {
                self.chunk = buf.freeze();
                self.chunk_offset = self.position;
                Ok(true)
            }
        }
    }

    fn take_buffered(&mut self, len: usize) -> Bytes {
        // `fill` guarantees the cursor lies within the chunk.
        let start = usize::try_from(self.position - self.chunk_offset).unwrap_or(self.chunk.len());
        let end = start + len.min(self.chunk.len() - start);
        self.position += (end - start) as u64;
        self.chunk.slice(start..end)
    }
}

#[cfg(feature = "sync-compat")]
impl<B: ReadBehavior> std::io::Read for ReadChannel<B> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        futures::executor::block_on(self.read_into_slice(buf)).map_err(Into::into)
    }
}

#[cfg(feature = "sync-compat")]
impl<B: ReadBehavior> std::io::Seek for ReadChannel<B> {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        futures::executor::block_on(Self::seek(self, pos)).map_err(Into::into)
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::sync::Arc;

use crate::{
    AccessConditions, Error, LastWrittenMode, ReadChannel, Result, ShareFileClient, ShareFileReadBehavior, ShareFileWriteBehavior,
    WriteChannel,
};

/// The chunk size used when none is configured: 4 MiB, the largest range a single
/// share file upload accepts.
pub const DEFAULT_CHUNK_SIZE: usize = 4 * 1024 * 1024;

/// Options used to open channels over a share file.
///
/// Call [`ChannelOptions::new`], adjust the options you need, then open a
/// [`ReadChannel`] with [`open_read`](Self::open_read) or a [`WriteChannel`] with
/// [`open_write`](Self::open_write). One set of options can open any number of channels.
///
/// With the `serde` feature the options can be loaded from configuration; missing fields
/// take their default values.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use share_file_channel::{AccessConditions, ChannelOptions, ShareFileClient};
///
/// async fn header<C: ShareFileClient>(client: Arc<C>) -> share_file_channel::Result<bytes::Bytes> {
///     let mut channel = ChannelOptions::new()
///         .chunk_size(64 * 1024)
///         .conditions(AccessConditions::new().with_lease_id("6a4c3a8e-0d0a-4a5c-9f34-7c1f7ad3c2b1"))
///         .open_read(client)?;
///
///     channel.read(16).await
/// }
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelOptions {
    chunk_size: usize,
    last_written_mode: LastWrittenMode,
    conditions: AccessConditions,
}

impl ChannelOptions {
    /// Creates options with a [`DEFAULT_CHUNK_SIZE`] chunk, [`LastWrittenMode::Now`] and no
    /// access conditions.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            last_written_mode: LastWrittenMode::Now,
            conditions: AccessConditions::new(),
        }
    }

    /// Sets the number of bytes each remote call transfers at most.
    ///
    /// Opening a channel fails if this is zero.
    pub const fn chunk_size(&mut self, chunk_size: usize) -> &mut Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Sets how uploads treat the last-written timestamp of the file.
    pub const fn last_written_mode(&mut self, mode: LastWrittenMode) -> &mut Self {
        self.last_written_mode = mode;
        self
    }

    /// Sets the conditions attached to every remote call.
    pub fn conditions(&mut self, conditions: AccessConditions) -> &mut Self {
        self.conditions = conditions;
        self
    }

    /// The configured chunk size.
    #[must_use]
    pub const fn get_chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The configured last-written mode.
    #[must_use]
    pub const fn get_last_written_mode(&self) -> LastWrittenMode {
        self.last_written_mode
    }

    /// The configured access conditions.
    #[must_use]
    pub const fn get_conditions(&self) -> &AccessConditions {
        &self.conditions
    }

    /// Opens a read channel over `client`.
    ///
    /// No remote call is made until the first read.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) if the chunk size
    /// is zero.
    pub fn open_read<C: ShareFileClient>(&self, client: Arc<C>) -> Result<ReadChannel<ShareFileReadBehavior<C>>> {
        self.validate()?;
        let behavior = ShareFileReadBehavior::new(client, Arc::new(self.conditions.clone()));
        tracing::debug!(chunk_size = self.chunk_size, "opening read channel");
        ReadChannel::new(behavior, self.chunk_size)
    }

    /// Opens a write channel over `client`.
    ///
    /// No remote call is made until the first write or seek.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidInput`](crate::ErrorKind::InvalidInput) if the chunk size
    /// is zero.
    pub fn open_write<C: ShareFileClient>(&self, client: Arc<C>) -> Result<WriteChannel<ShareFileWriteBehavior<C>>> {
        self.validate()?;
        let behavior = ShareFileWriteBehavior::new(client, Arc::new(self.conditions.clone()), self.last_written_mode);
        tracing::debug!(
            chunk_size = self.chunk_size,
            last_written_mode = ?self.last_written_mode,
            "opening write channel"
        );
        WriteChannel::new(behavior, self.chunk_size)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::invalid_input("chunk size must be greater than zero"));
        }
        Ok(())
    }
}

impl Default for ChannelOptions {
    fn default() -> Self {
        Self::new()
    }
}

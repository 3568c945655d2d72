// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;
use std::sync::Arc;

use bytes::Bytes;

use crate::length_cache::LengthCache;
use crate::{AccessConditions, Error, LastWrittenMode, Result, ShareFileClient};

/// Writes ranges of a remote resource on behalf of a seekable channel.
///
/// Besides plain writes, the behavior answers the lifecycle hooks a channel calls on seek,
/// close and truncate.
///
/// # Ownership
///
/// Methods take `&mut self`, so only one operation can be in flight per behavior.
#[trait_variant::make(Send)]
pub trait WriteBehavior: Debug {
    /// Writes all of `source` starting at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if the remote call fails. Nothing is retried and a failure means
    /// the write as a whole failed.
    async fn write(&mut self, source: Bytes, offset: u64) -> Result<()>;

    /// Checks that the channel may move its cursor to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Unsupported`](crate::ErrorKind::Unsupported) if the position
    /// is outside of the resource, or a transport error if its size could not be fetched.
    async fn assert_can_seek(&mut self, position: i64) -> Result<()>;

    /// Finalizes the channel after `total_length` bytes have been written.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource could not be finalized.
    async fn commit(&mut self, total_length: u64) -> Result<()>;

    /// Changes the size of the resource.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Unsupported`](crate::ErrorKind::Unsupported) if the resource
    /// cannot be resized through the channel.
    async fn resize(&mut self, new_size: u64) -> Result<()>;

    /// The length of the resource that seeks relative to its end resolve against.
    ///
    /// Returns `None` if the behavior has no way to tell.
    ///
    /// # Errors
    ///
    /// Returns an error if the length had to be fetched and the fetch failed.
    async fn resource_length(&mut self) -> Result<Option<u64>>;

    /// The last total length of the resource reported by a write response, if any.
    fn cached_length(&self) -> Option<u64>;
}

/// A [`WriteBehavior`] that uploads ranges to a share file through a [`ShareFileClient`].
///
/// A share file has a fixed size, set when it is created or resized through the file
/// service. Writes therefore never grow it, [`commit`](WriteBehavior::commit) has nothing
/// to do and [`resize`](WriteBehavior::resize) is not supported.
///
/// Seek checks compare against the size of the file fetched on the first check and kept
/// for the lifetime of the behavior. Later changes to the size, by this writer or anyone
/// else, are not observed. The same size backs [`resource_length`](WriteBehavior::resource_length)
/// unless a write response reported a newer one.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
///
/// use bytes::Bytes;
/// use share_file_channel::{AccessConditions, LastWrittenMode, ShareFileClient, ShareFileWriteBehavior, WriteBehavior};
///
/// async fn stamp<C: ShareFileClient>(client: Arc<C>, offset: u64) -> share_file_channel::Result<()> {
///     let mut behavior = ShareFileWriteBehavior::new(client, Arc::new(AccessConditions::new()), LastWrittenMode::Preserve);
///
///     behavior.assert_can_seek(offset.try_into().unwrap_or(i64::MAX)).await?;
///     behavior.write(Bytes::from_static(b"STAMP"), offset).await
/// }
/// ```
#[derive(Debug)]
pub struct ShareFileWriteBehavior<C> {
    client: Arc<C>,
    conditions: Arc<AccessConditions>,
    last_written: LastWrittenMode,
    size: Option<u64>,
    length: LengthCache,
}

impl<C: ShareFileClient> ShareFileWriteBehavior<C> {
    /// Creates a behavior writing to `client`.
    #[must_use]
    pub fn new(client: Arc<C>, conditions: Arc<AccessConditions>, last_written: LastWrittenMode) -> Self {
        Self {
            client,
            conditions,
            last_written,
            size: None,
            length: LengthCache::new(),
        }
    }

    /// The conditions attached to every remote call.
    #[must_use]
    pub fn conditions(&self) -> &AccessConditions {
        &self.conditions
    }

    /// The last-written mode forwarded with every upload.
    #[must_use]
    pub fn last_written(&self) -> LastWrittenMode {
        self.last_written
    }

    /// The size fetched for seek checks, fetching it on first use.
    async fn size(&mut self) -> Result<u64> {
        if let Some(size) = self.size {
            return Ok(size);
        }

        let properties = self.client.properties(&self.conditions).await?;
        tracing::debug!(size = properties.content_length, "fetched resource size for seek checks");
        self.size = Some(properties.content_length);
        Ok(properties.content_length)
    }
}

impl<C: ShareFileClient> WriteBehavior for ShareFileWriteBehavior<C> {
    async fn write(&mut self, source: Bytes, offset: u64) -> Result<()> {
        if source.is_empty() {
            return Ok(());
        }

        tracing::debug!(offset, len = source.len(), "uploading range");
        let upload = self
            .client
            .upload_range(source, offset, &self.conditions, self.last_written)
            .await?;
        self.length.observe_content_range(upload.content_range.as_deref())
    }

    async fn assert_can_seek(&mut self, position: i64) -> Result<()> {
        let size = self.size().await?;
        match u64::try_from(position) {
            Ok(position) if position <= size => Ok(()),
            _ => Err(Error::unsupported(format!(
                "cannot seek to position {position}, resource size is {size}"
            ))),
        }
    }

    async fn commit(&mut self, _total_length: u64) -> Result<()> {
        Ok(())
    }

    async fn resize(&mut self, new_size: u64) -> Result<()> {
        Err(Error::unsupported(format!(
            "cannot resize the resource to {new_size} bytes through a channel"
        )))
    }

    async fn resource_length(&mut self) -> Result<Option<u64>> {
        match self.length.get() {
            Some(length) => Ok(Some(length)),
            None => self.size().await.map(Some),
        }
    }

    fn cached_length(&self) -> Option<u64> {
        self.length.get()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::ErrorKind;
    use crate::testing::{MockShareFile, ShareFileOp};

    fn behavior(file: &MockShareFile) -> ShareFileWriteBehavior<MockShareFile> {
        ShareFileWriteBehavior::new(Arc::new(file.clone()), Arc::new(AccessConditions::new()), LastWrittenMode::Now)
    }

    #[test]
    fn write_issues_one_upload_without_size_fetch() {
        let file = MockShareFile::new(32);
        let mut behavior = behavior(&file);

        block_on(behavior.write(Bytes::from_static(b"0123456789"), 0)).unwrap();

        assert_eq!(file.properties_calls(), 0);
        assert_eq!(
            file.operations(),
            vec![ShareFileOp::Upload {
                offset: 0,
                data: Bytes::from_static(b"0123456789"),
                conditions: AccessConditions::new(),
                last_written: LastWrittenMode::Now,
            }]
        );
    }

    #[test]
    fn conditions_and_last_written_mode_are_forwarded() {
        let file = MockShareFile::new(32);
        let conditions = AccessConditions::new().with_if_match("etag");
        let mut behavior = ShareFileWriteBehavior::new(
            Arc::new(file.clone()),
            Arc::new(conditions.clone()),
            LastWrittenMode::Preserve,
        );

        block_on(behavior.write(Bytes::from_static(b"x"), 5)).unwrap();

        let operations = file.operations();
        let [ShareFileOp::Upload {
            conditions: sent,
            last_written,
            ..
        }] = operations.as_slice()
        else {
            panic!("expected a single upload, got {operations:?}");
        };
        assert_eq!(sent, &conditions);
        assert_eq!(*last_written, LastWrittenMode::Preserve);
        assert_eq!(behavior.last_written(), LastWrittenMode::Preserve);
        assert_eq!(behavior.conditions(), &conditions);
    }

    #[test]
    fn empty_write_skips_remote_call() {
        let file = MockShareFile::new(32);
        let mut behavior = behavior(&file);

        block_on(behavior.write(Bytes::new(), 3)).unwrap();

        assert!(file.operations().is_empty());
    }

    #[test]
    fn failed_upload_fails_the_write() {
        let file = MockShareFile::new(4);
        let mut behavior = behavior(&file);

        let error = block_on(behavior.write(Bytes::from_static(b"too long"), 0)).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Transport);
        assert_eq!(file.operations().len(), 1);
    }

    #[test]
    fn seek_bounds_are_inclusive_of_end() {
        let file = MockShareFile::new(100);
        let mut behavior = behavior(&file);

        block_on(behavior.assert_can_seek(0)).unwrap();
        block_on(behavior.assert_can_seek(50)).unwrap();
        block_on(behavior.assert_can_seek(100)).unwrap();

        for position in [-1, 101, i64::MIN, i64::MAX] {
            let error = block_on(behavior.assert_can_seek(position)).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Unsupported, "position {position}");
        }
    }

    #[test]
    fn size_is_fetched_once() {
        let file = MockShareFile::new(100);
        let mut behavior = behavior(&file);

        for position in [0, 10, 100, 101] {
            let _ = block_on(behavior.assert_can_seek(position));
        }

        assert_eq!(file.properties_calls(), 1);
    }

    #[test]
    fn size_memo_ignores_later_changes() {
        let file = MockShareFile::new(100);
        let mut behavior = behavior(&file);
        block_on(behavior.assert_can_seek(0)).unwrap();

        file.set_content(vec![0; 200]);

        assert_eq!(block_on(behavior.assert_can_seek(150)).unwrap_err().kind(), ErrorKind::Unsupported);
        assert_eq!(file.properties_calls(), 1);
    }

    #[test]
    fn failed_size_fetch_is_retried_on_next_check() {
        let file = MockShareFile::new(100);
        file.fail_when(|op| matches!(op, ShareFileOp::Properties { .. }));
        let mut behavior = behavior(&file);

        assert_eq!(block_on(behavior.assert_can_seek(0)).unwrap_err().kind(), ErrorKind::Transport);

        file.clear_failures();
        block_on(behavior.assert_can_seek(0)).unwrap();
        assert_eq!(file.properties_calls(), 2);
    }

    #[test]
    fn commit_is_a_no_op() {
        let file = MockShareFile::new(100);
        let mut behavior = behavior(&file);

        for total in [0, 100, u64::MAX] {
            block_on(behavior.commit(total)).unwrap();
        }

        assert!(file.operations().is_empty());
        assert_eq!(file.content(), vec![0; 100]);
    }

    #[test]
    fn resize_is_unsupported() {
        let file = MockShareFile::new(100);
        let mut behavior = behavior(&file);

        for size in [0, 100, 200] {
            assert_eq!(block_on(behavior.resize(size)).unwrap_err().kind(), ErrorKind::Unsupported);
        }

        assert!(file.operations().is_empty());
    }

    #[test]
    fn resource_length_uses_memoized_size() {
        let file = MockShareFile::new(64);
        let mut behavior = behavior(&file);

        assert_eq!(block_on(behavior.resource_length()).unwrap(), Some(64));
        block_on(behavior.assert_can_seek(64)).unwrap();

        assert_eq!(file.properties_calls(), 1);
        assert_eq!(behavior.cached_length(), None);
    }

    #[test]
    fn resource_length_prefers_reported_length() {
        let file = MockShareFile::new(64);
        file.report_upload_range();
        let mut behavior = behavior(&file);
        block_on(behavior.write(Bytes::from_static(b"abc"), 0)).unwrap();

        assert_eq!(block_on(behavior.resource_length()).unwrap(), Some(64));
        assert_eq!(file.properties_calls(), 0);
    }

    #[test]
    fn upload_metadata_updates_cached_length() {
        let file = MockShareFile::new(64);
        file.report_upload_range();
        let mut behavior = behavior(&file);
        assert_eq!(behavior.cached_length(), None);

        block_on(behavior.write(Bytes::from_static(b"abc"), 8)).unwrap();

        assert_eq!(behavior.cached_length(), Some(64));
    }
}

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! In-memory share file for testing.
//!
//! This module provides [`MockShareFile`], a fixed-size remote file held in memory that
//! records all operations and supports failure injection for testing error paths.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::{AccessConditions, ByteRange, Error, FileProperties, LastWrittenMode, RangeDownload, RangeUpload, Result, ShareFileClient};

/// Recorded remote operation with full context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareFileOp {
    /// A ranged download was requested.
    Download {
        /// The requested range.
        range: ByteRange,
        /// The conditions sent with the request.
        conditions: AccessConditions,
    },
    /// A ranged upload was requested.
    Upload {
        /// The offset of the first written byte.
        offset: u64,
        /// The uploaded bytes.
        data: Bytes,
        /// The conditions sent with the request.
        conditions: AccessConditions,
        /// The last-written mode sent with the request.
        last_written: LastWrittenMode,
    },
    /// The file properties were requested.
    Properties {
        /// The conditions sent with the request.
        conditions: AccessConditions,
    },
}

type FailPredicate = Box<dyn Fn(&ShareFileOp) -> bool + Send + Sync>;

#[derive(Debug, Default)]
struct FileState {
    content: Vec<u8>,
    version: u64,
    serve_at_most: Option<usize>,
    serve_extra: usize,
    content_range: Option<String>,
    omit_content_range: bool,
    report_upload_range: bool,
}

/// A configurable in-memory share file for testing.
///
/// Like a real share file, the file has a fixed size: downloads starting at or past the
/// end fail, downloads crossing the end are cut short, and uploads must lie entirely
/// within the file. Responses carry a `bytes <first>-<last>/<total>` content range.
///
/// Clones share the same file, so a test can keep a handle for inspection while the
/// behaviors own another.
///
/// # Examples
///
/// ```
/// use share_file_channel::testing::{MockShareFile, ShareFileOp};
/// use share_file_channel::{AccessConditions, ByteRange, ShareFileClient};
///
/// # futures::executor::block_on(async {
/// let file = MockShareFile::with_content(*b"hello world");
///
/// let download = file
///     .download_range(ByteRange::new(6, 5).unwrap(), &AccessConditions::new())
///     .await
///     .unwrap();
///
/// assert_eq!(&download.content[..], b"world");
/// assert_eq!(download.content_range.as_deref(), Some("bytes 6-10/11"));
/// assert_eq!(file.operations().len(), 1);
/// # });
/// ```
///
/// # Failure Injection
///
/// ```
/// use share_file_channel::testing::{MockShareFile, ShareFileOp};
/// use share_file_channel::{AccessConditions, ErrorKind, ShareFileClient};
///
/// # futures::executor::block_on(async {
/// let file = MockShareFile::new(16);
/// file.fail_when(|op| matches!(op, ShareFileOp::Properties { .. }));
///
/// let error = file.properties(&AccessConditions::new()).await.unwrap_err();
/// assert_eq!(error.kind(), ErrorKind::Transport);
/// # });
/// ```
#[derive(Clone)]
pub struct MockShareFile {
    state: Arc<Mutex<FileState>>,
    operations: Arc<Mutex<Vec<ShareFileOp>>>,
    fail_when: Arc<Mutex<Option<FailPredicate>>>,
}

impl fmt::Debug for MockShareFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockShareFile")
            .field("state", &self.state)
            .field("operations", &self.operations)
            .field("fail_when", &self.fail_when.lock().is_some())
            .finish()
    }
}

impl MockShareFile {
    /// Creates a zero-filled file of `len` bytes.
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self::with_content(vec![0; len])
    }

    /// Creates a file holding `content`.
    #[must_use]
    pub fn with_content(content: impl Into<Vec<u8>>) -> Self {
        Self {
            state: Arc::new(Mutex::new(FileState {
                content: content.into(),
                ..FileState::default()
            })),
            operations: Arc::new(Mutex::new(Vec::new())),
            fail_when: Arc::new(Mutex::new(None)),
        }
    }

    /// Returns a copy of the current file content.
    #[must_use]
    pub fn content(&self) -> Vec<u8> {
        self.state.lock().content.clone()
    }

    /// Replaces the file content, simulating a change made by another client.
    pub fn set_content(&self, content: impl Into<Vec<u8>>) {
        let mut state = self.state.lock();
        state.content = content.into();
        state.version += 1;
    }

    /// Limits every download to at most `len` bytes, simulating partial responses.
    pub fn serve_at_most(&self, len: usize) {
        self.state.lock().serve_at_most = Some(len);
    }

    /// Appends `len` bytes past the requested range to every download, simulating a
    /// server that returns more than it was asked for.
    pub fn serve_extra(&self, len: usize) {
        self.state.lock().serve_extra = len;
    }

    /// Answers every download with the given raw content range instead of a computed one.
    pub fn respond_with_content_range(&self, value: impl Into<String>) {
        self.state.lock().content_range = Some(value.into());
    }

    /// Stops attaching a content range to download responses.
    pub fn omit_content_range(&self) {
        self.state.lock().omit_content_range = true;
    }

    /// Attaches a content range to upload responses.
    ///
    /// Real share files do not report one, so this is off by default.
    pub fn report_upload_range(&self) {
        self.state.lock().report_upload_range = true;
    }

    /// Fails every operation for which `predicate` returns `true`.
    ///
    /// Replaces any previously installed predicate. Failed operations are still recorded.
    pub fn fail_when(&self, predicate: impl Fn(&ShareFileOp) -> bool + Send + Sync + 'static) {
        *self.fail_when.lock() = Some(Box::new(predicate));
    }

    /// Removes the failure predicate.
    pub fn clear_failures(&self) {
        *self.fail_when.lock() = None;
    }

    /// Returns all operations recorded so far, oldest first.
    #[must_use]
    pub fn operations(&self) -> Vec<ShareFileOp> {
        self.operations.lock().clone()
    }

    /// Returns the number of properties requests recorded so far.
    #[must_use]
    pub fn properties_calls(&self) -> usize {
        self.operations
            .lock()
            .iter()
            .filter(|op| matches!(op, ShareFileOp::Properties { .. }))
            .count()
    }

    /// Forgets all recorded operations.
    pub fn clear_operations(&self) {
        self.operations.lock().clear();
    }

    fn record(&self, op: ShareFileOp) -> Result<()> {
        let fail = self.fail_when.lock().as_ref().is_some_and(|predicate| predicate(&op));
        self.operations.lock().push(op);
        if fail {
            return Err(Error::transport("injected failure"));
        }
        Ok(())
    }
}

impl ShareFileClient for MockShareFile {
    async fn download_range(&self, range: ByteRange, conditions: &AccessConditions) -> Result<RangeDownload> {
        self.record(ShareFileOp::Download {
            range,
            conditions: conditions.clone(),
        })?;

        let state = self.state.lock();
        let total = state.content.len() as u64;
        if range.offset() >= total {
            return Err(Error::transport(format!("InvalidRange: {range} is not satisfiable for length {total}")));
        }

        let mut end = (range.last() + 1).min(total);
        if let Some(limit) = state.serve_at_most {
            end = end.min(range.offset() + limit as u64);
        }

        let mut content = state.content[range.offset() as usize..end as usize].to_vec();
        let content_range = if state.omit_content_range || content.is_empty() {
            None
        } else if let Some(value) = &state.content_range {
            Some(value.clone())
        } else {
            Some(format!("bytes {}-{}/{total}", range.offset(), end - 1))
        };
        content.resize(content.len() + state.serve_extra, 0xFF);
        let content = Bytes::from(content);

        Ok(RangeDownload { content, content_range })
    }

    async fn upload_range(
        &self,
        data: Bytes,
        offset: u64,
        conditions: &AccessConditions,
        last_written: LastWrittenMode,
    ) -> Result<RangeUpload> {
        self.record(ShareFileOp::Upload {
            offset,
            data: data.clone(),
            conditions: conditions.clone(),
            last_written,
        })?;

        let mut state = self.state.lock();
        let total = state.content.len() as u64;
        let end = offset.saturating_add(data.len() as u64);
        if data.is_empty() || end > total {
            return Err(Error::transport(format!(
                "InvalidRange: {} bytes at offset {offset} do not fit in length {total}",
                data.len()
            )));
        }

        state.content[offset as usize..end as usize].copy_from_slice(&data);
        state.version += 1;

        let content_range = state.report_upload_range.then(|| format!("bytes {offset}-{}/{total}", end - 1));
        Ok(RangeUpload { content_range })
    }

    async fn properties(&self, conditions: &AccessConditions) -> Result<FileProperties> {
        self.record(ShareFileOp::Properties {
            conditions: conditions.clone(),
        })?;

        let state = self.state.lock();
        Ok(FileProperties {
            content_length: state.content.len() as u64,
            etag: Some(format!("\"0x{:X}\"", state.version)),
        })
    }
}

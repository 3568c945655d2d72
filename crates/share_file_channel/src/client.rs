// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! The transport contract the behaviors are built on.
//!
//! [`ShareFileClient`] is implemented by whatever performs authenticated range requests
//! against one remote file. Retries, timeouts and credentials live behind this trait;
//! the behaviors issue each call once and surface whatever it returns.

use std::fmt::Debug;

use bytes::Bytes;

use crate::{AccessConditions, ByteRange, LastWrittenMode, Result};

/// Body and metadata of a successful ranged download.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeDownload {
    /// The bytes the server returned. May be shorter than the requested range.
    pub content: Bytes,

    /// The raw content range of the response, such as `bytes 0-99/500`.
    pub content_range: Option<String>,
}

/// Metadata of a successful ranged upload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeUpload {
    /// The raw content range of the response, if the transport reports one.
    pub content_range: Option<String>,
}

/// Properties of a remote file.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileProperties {
    /// The declared size of the file in bytes.
    pub content_length: u64,

    /// The current entity tag of the file.
    pub etag: Option<String>,
}

/// A client bound to a single remote file that supports ranged reads and writes.
///
/// Every method receives the caller's [`AccessConditions`] and must attach them to the
/// remote request. Failures are reported with [`Error::transport`](crate::Error::transport).
///
/// # Example
///
/// ```
/// use bytes::Bytes;
/// use share_file_channel::{
///     AccessConditions, ByteRange, FileProperties, LastWrittenMode, RangeDownload, RangeUpload,
///     Result, ShareFileClient,
/// };
///
/// #[derive(Debug)]
/// struct StaticFile(Bytes);
///
/// impl ShareFileClient for StaticFile {
///     async fn download_range(&self, range: ByteRange, _: &AccessConditions) -> Result<RangeDownload> {
///         let len = self.0.len() as u64;
///         let end = (range.last() + 1).min(len);
///         Ok(RangeDownload {
///             content: self.0.slice(range.offset() as usize..end as usize),
///             content_range: Some(format!("bytes {}-{}/{len}", range.offset(), end - 1)),
///         })
///     }
///
///     async fn upload_range(
///         &self,
///         _: Bytes,
///         _: u64,
///         _: &AccessConditions,
///         _: LastWrittenMode,
///     ) -> Result<RangeUpload> {
///         Err(share_file_channel::Error::transport("read-only file"))
///     }
///
///     async fn properties(&self, _: &AccessConditions) -> Result<FileProperties> {
///         Ok(FileProperties { content_length: self.0.len() as u64, etag: None })
///     }
/// }
/// ```
pub trait ShareFileClient: Debug + Send + Sync {
    /// Downloads the bytes in `range`.
    ///
    /// The response may hold fewer bytes than requested. Its content range reports the
    /// total length of the file as known to the server.
    fn download_range(&self, range: ByteRange, conditions: &AccessConditions) -> impl Future<Output = Result<RangeDownload>> + Send;

    /// Writes `data` to the file starting at `offset`.
    ///
    /// The byte count of the upload is `data.len()`. The write either succeeds as a whole
    /// or fails.
    fn upload_range(
        &self,
        data: Bytes,
        offset: u64,
        conditions: &AccessConditions,
        last_written: LastWrittenMode,
    ) -> impl Future<Output = Result<RangeUpload>> + Send;

    /// Fetches the current properties of the file.
    fn properties(&self, conditions: &AccessConditions) -> impl Future<Output = Result<FileProperties>> + Send;
}

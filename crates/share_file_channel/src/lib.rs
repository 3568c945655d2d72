// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Seekable channels over range-addressable remote files on a cloud file share.
//!
//! A share file is a fixed-size remote file that can be read and written in byte ranges.
//! This crate turns such a file into a cursor-based channel:
//!
//! - [`ReadBehavior`] and [`WriteBehavior`] translate one channel request into at most one
//!   remote call. [`ShareFileReadBehavior`] and [`ShareFileWriteBehavior`] implement them
//!   on top of a [`ShareFileClient`].
//! - [`ReadChannel`] and [`WriteChannel`] own the cursor and the chunk buffer, and drive
//!   a behavior.
//! - [`ChannelOptions`] bundles the chunk size, the [`AccessConditions`] and the
//!   [`LastWrittenMode`] used to open channels.
//!
//! The transport itself, including authentication and retries, lives behind
//! [`ShareFileClient`]; nothing in this crate retries a failed call.
//!
//! # Quick start
//!
//! ```
//! use std::sync::Arc;
//!
//! use share_file_channel::{ChannelOptions, SeekFrom, ShareFileClient};
//!
//! async fn patch<C: ShareFileClient>(client: Arc<C>) -> share_file_channel::Result<()> {
//!     let options = ChannelOptions::new();
//!
//!     // Read the first 8 bytes.
//!     let mut reader = options.open_read(Arc::clone(&client))?;
//!     let magic = reader.read(8).await?;
//!
//!     // Overwrite the next 8 bytes with the same content.
//!     let mut writer = options.open_write(client)?;
//!     writer.seek(SeekFrom::Start(8)).await?;
//!     writer.write(magic).await?;
//!     writer.close().await
//! }
//! ```
//!
//! # Length tracking
//!
//! Behaviors remember the last total length the server reported in a content range and
//! use it to end reads without a remote call. The value is never refreshed on its own, so
//! changes made by other clients may be missed.
//!
//! # Features
//!
//! - `serde`: serialization for [`ChannelOptions`], [`AccessConditions`] and
//!   [`LastWrittenMode`].
//! - `sync-compat`: [`std::io::Read`], [`std::io::Write`] and [`std::io::Seek`] for the
//!   channels, blocking the current thread on each call.
//! - `test-util`: the [`testing`] module with an in-memory share file.

mod client;
mod conditions;
pub mod error;
mod length_cache;
mod options;
mod range;
mod read_behavior;
mod read_channel;
#[cfg(any(feature = "test-util", test))]
pub mod testing;
mod write_behavior;
mod write_channel;

#[doc(inline)]
pub use client::{FileProperties, RangeDownload, RangeUpload, ShareFileClient};
#[doc(inline)]
pub use conditions::{AccessConditions, LastWrittenMode};
#[doc(inline)]
pub use error::{Error, ErrorKind, Result};
#[doc(inline)]
pub use length_cache::LengthCache;
#[doc(inline)]
pub use options::{ChannelOptions, DEFAULT_CHUNK_SIZE};
#[doc(inline)]
pub use range::{ByteRange, parse_content_range_total};
#[doc(inline)]
pub use read_behavior::{ReadBehavior, ReadOutcome, ShareFileReadBehavior};
#[doc(inline)]
pub use read_channel::ReadChannel;
pub use std::io::SeekFrom;
#[doc(inline)]
pub use write_behavior::{ShareFileWriteBehavior, WriteBehavior};
#[doc(inline)]
pub use write_channel::WriteChannel;

// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! End-to-end tests for channels opened through `ChannelOptions` over a scripted client.

use std::sync::{Arc, Mutex};

use bytes::{Bytes, BytesMut};
use rstest::rstest;
use share_file_channel::{
    AccessConditions, ByteRange, ChannelOptions, ErrorKind, FileProperties, LastWrittenMode, RangeDownload, RangeUpload,
    ReadBehavior, ReadOutcome, Result, SeekFrom, ShareFileClient, ShareFileReadBehavior, ShareFileWriteBehavior, WriteBehavior,
};
use tracing_test::traced_test;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Call {
    Download(u64, u64),
    Upload(u64, usize),
    Properties,
}

/// A share file that answers with bare `<first>-<last>/<total>` content ranges.
#[derive(Debug)]
struct ScriptedFile {
    content: Mutex<Vec<u8>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedFile {
    fn new(len: usize) -> Arc<Self> {
        Arc::new(Self {
            content: Mutex::new((0..len).map(|i| (i % 251) as u8).collect()),
            calls: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("lock poisoned").clone()
    }

    fn content(&self) -> Vec<u8> {
        self.content.lock().expect("lock poisoned").clone()
    }
}

impl ShareFileClient for ScriptedFile {
    async fn download_range(&self, range: ByteRange, _conditions: &AccessConditions) -> Result<RangeDownload> {
        self.calls.lock().expect("lock poisoned").push(Call::Download(range.offset(), range.len()));

        let content = self.content.lock().expect("lock poisoned");
        let total = content.len() as u64;
        if range.offset() >= total {
            return Err(share_file_channel::Error::transport("InvalidRange"));
        }
        let end = (range.last() + 1).min(total);
        Ok(RangeDownload {
            content: Bytes::copy_from_slice(&content[range.offset() as usize..end as usize]),
            content_range: Some(format!("{}-{}/{total}", range.offset(), end - 1)),
        })
    }

    async fn upload_range(
        &self,
        data: Bytes,
        offset: u64,
        _conditions: &AccessConditions,
        _last_written: LastWrittenMode,
    ) -> Result<RangeUpload> {
        self.calls.lock().expect("lock poisoned").push(Call::Upload(offset, data.len()));

        let mut content = self.content.lock().expect("lock poisoned");
        let start = offset as usize;
        let end = start + data.len();
        if end > content.len() {
            return Err(share_file_channel::Error::transport("InvalidRange"));
        }
        content[start..end].copy_from_slice(&data);
        Ok(RangeUpload::default())
    }

    async fn properties(&self, _conditions: &AccessConditions) -> Result<FileProperties> {
        self.calls.lock().expect("lock poisoned").push(Call::Properties);

        Ok(FileProperties {
            content_length: self.content.lock().expect("lock poisoned").len() as u64,
            etag: None,
        })
    }
}

#[tokio::test]
async fn first_read_learns_total_length() {
    let file = ScriptedFile::new(500);
    let mut behavior = ShareFileReadBehavior::new(Arc::clone(&file), Arc::new(AccessConditions::new()));
    let mut buf = BytesMut::with_capacity(100);

    let outcome = behavior.read(&mut buf, 0).await.expect("read failed");

    assert_eq!(outcome, ReadOutcome::Bytes(100));
    assert_eq!(behavior.cached_length(), Some(500));
}

#[tokio::test]
async fn read_near_end_is_clipped() {
    let file = ScriptedFile::new(500);
    let mut behavior = ShareFileReadBehavior::new(Arc::clone(&file), Arc::new(AccessConditions::new())).with_known_length(500);
    let mut buf = BytesMut::with_capacity(100);

    let outcome = behavior.read(&mut buf, 450).await.expect("read failed");

    assert_eq!(outcome, ReadOutcome::Bytes(50));
    assert_eq!(file.calls(), vec![Call::Download(450, 50)]);
}

#[tokio::test]
async fn read_at_end_makes_no_call() {
    let file = ScriptedFile::new(500);
    let mut behavior = ShareFileReadBehavior::new(Arc::clone(&file), Arc::new(AccessConditions::new())).with_known_length(500);
    let mut buf = BytesMut::with_capacity(100);

    let outcome = behavior.read(&mut buf, 500).await.expect("read failed");

    assert_eq!(outcome, ReadOutcome::EndOfResource);
    assert!(file.calls().is_empty());
}

#[tokio::test]
async fn fresh_write_does_not_fetch_size() {
    let file = ScriptedFile::new(500);
    let mut behavior = ShareFileWriteBehavior::new(Arc::clone(&file), Arc::new(AccessConditions::new()), LastWrittenMode::Now);

    behavior.write(Bytes::from(vec![9_u8; 10]), 0).await.expect("write failed");

    assert_eq!(file.calls(), vec![Call::Upload(0, 10)]);
}

#[rstest]
#[case::start(0, true)]
#[case::middle(250, true)]
#[case::end(500, true)]
#[case::past_end(501, false)]
#[case::negative(-1, false)]
#[tokio::test]
async fn seek_checks_against_file_size(#[case] position: i64, #[case] allowed: bool) {
    let file = ScriptedFile::new(500);
    let mut behavior = ShareFileWriteBehavior::new(Arc::clone(&file), Arc::new(AccessConditions::new()), LastWrittenMode::Now);

    let result = behavior.assert_can_seek(position).await;

    if allowed {
        result.expect("seek rejected");
    } else {
        assert_eq!(result.expect_err("seek allowed").kind(), ErrorKind::Unsupported);
    }
    assert_eq!(file.calls(), vec![Call::Properties]);
}

#[tokio::test]
async fn read_channel_streams_whole_file() {
    let file = ScriptedFile::new(1000);
    let mut channel = ChannelOptions::new()
        .chunk_size(128)
        .open_read(Arc::clone(&file))
        .expect("open failed");

    let data = channel.read(4096).await.expect("read failed");

    assert_eq!(&data[..], &file.content()[..]);
    assert_eq!(channel.size(), Some(1000));
    assert_eq!(channel.stream_position(), 1000);
    // 7 full chunks and one partial one; the end is then known without a call.
    assert_eq!(file.calls().len(), 8);
}

#[tokio::test]
async fn write_channel_round_trips_through_read_channel() {
    let file = ScriptedFile::new(64);
    let options = ChannelOptions::new().chunk_size(16).clone();

    let mut writer = options.open_write(Arc::clone(&file)).expect("open failed");
    writer.seek(SeekFrom::Start(10)).await.expect("seek failed");
    writer.write_slice(b"the quick brown fox jumps").await.expect("write failed");
    writer.close().await.expect("close failed");

    let mut reader = options.open_read(Arc::clone(&file)).expect("open failed");
    reader.seek(SeekFrom::Start(10)).await.expect("seek failed");
    let data = reader.read(25).await.expect("read failed");

    assert_eq!(&data[..], b"the quick brown fox jumps");
    assert_eq!(
        file.calls()[..3],
        [Call::Properties, Call::Upload(10, 16), Call::Upload(26, 9)]
    );
}

#[tokio::test]
async fn write_channel_rejects_io_after_close() {
    let file = ScriptedFile::new(8);
    let mut writer = ChannelOptions::new().open_write(file).expect("open failed");

    writer.close().await.expect("close failed");

    let error = writer.write_slice(b"x").await.expect_err("write after close");
    assert_eq!(error.kind(), ErrorKind::Closed);
}

#[tokio::test]
async fn write_channel_cannot_truncate() {
    let file = ScriptedFile::new(8);
    let mut writer = ChannelOptions::new().open_write(file).expect("open failed");

    let error = writer.truncate(4).await.expect_err("truncate succeeded");
    assert_eq!(error.kind(), ErrorKind::Unsupported);
}

#[tokio::test]
#[traced_test]
async fn behaviors_log_remote_calls() {
    let file = ScriptedFile::new(32);
    let mut reader = ChannelOptions::new().chunk_size(8).open_read(Arc::clone(&file)).expect("open failed");
    let mut writer = ChannelOptions::new().open_write(file).expect("open failed");

    let _head = reader.read(4).await.expect("read failed");
    writer.seek(SeekFrom::Start(4)).await.expect("seek failed");

    assert!(logs_contain("downloading range"));
    assert!(logs_contain("fetched resource size for seek checks"));
}

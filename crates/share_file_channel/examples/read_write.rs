// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Reading and writing a share file through channels.
//!
//! Uses the in-memory [`MockShareFile`] in place of a real file share client, so the
//! remote calls each channel issues can be printed afterwards.

use std::sync::Arc;

use share_file_channel::testing::MockShareFile;
use share_file_channel::{ChannelOptions, SeekFrom};

#[tokio::main(flavor = "current_thread")]
async fn main() -> share_file_channel::Result<()> {
    let file = Arc::new(MockShareFile::new(64));
    let mut options = ChannelOptions::new();
    options.chunk_size(16);

    // Share files have a fixed size; writes land inside it.
    let mut writer = options.open_write(Arc::clone(&file))?;
    writer.seek(SeekFrom::Start(8)).await?;
    writer.write_slice(b"Hello from a share file channel!").await?;
    writer.close().await?;

    // Reads are served in chunks and stop at the length the server reported.
    let mut reader = options.open_read(Arc::clone(&file))?;
    reader.seek(SeekFrom::Start(8)).await?;
    let greeting = reader.read(32).await?;
    println!("read back: {}", String::from_utf8_lossy(&greeting));
    println!("file length: {:?}", reader.size());
    reader.close().await?;

    for op in file.operations() {
        println!("{op:?}");
    }

    Ok(())
}

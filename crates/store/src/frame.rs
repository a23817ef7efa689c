//! On-disk frame format
//!
//! Each record is one frame: an 8-byte little-endian unsigned length
//! prefix followed by exactly that many payload bytes. Frames are
//! contiguous, immutable, and carry no header, footer, or checksum.
//!
//! A short read at the end of the file means the writer has not finished
//! flushing the last frame yet. That frame is "not yet visible", never
//! corrupt: the caller retries later at the same offset.

use bytes::{BufMut, Bytes, BytesMut};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};

use crate::error::Result;

/// Size of the length prefix preceding every payload
pub const LEN_PREFIX_SIZE: u64 = 8;

/// Outcome of a positioned frame read
#[derive(Debug)]
pub enum ReadFrame {
    /// A complete frame was read
    Frame {
        /// The record payload
        payload: Bytes,
        /// Start offset of the next frame
        next_offset: u64,
    },
    /// A prefix (or part of one) is present but the frame is not fully
    /// on disk yet; retry later at the same offset
    Incomplete,
    /// No bytes available at the requested offset
    EndOfLog,
}

/// Encode one frame into a contiguous buffer
pub fn encode_frame(payload: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(LEN_PREFIX_SIZE as usize + payload.len());
    buf.put_u64_le(payload.len() as u64);
    buf.put_slice(payload);
    buf.freeze()
}

/// Total on-disk size of a frame holding `payload_len` bytes
pub fn frame_size(payload_len: u64) -> u64 {
    LEN_PREFIX_SIZE + payload_len
}

/// Read one frame starting at `offset`.
///
/// Returns `EndOfLog` when no bytes exist at `offset`, and `Incomplete`
/// when the prefix or payload is only partially present. Neither advances
/// the caller's position.
pub async fn read_frame_at(file: &mut File, offset: u64) -> Result<ReadFrame> {
    file.seek(SeekFrom::Start(offset)).await?;

    let mut len_buf = [0u8; LEN_PREFIX_SIZE as usize];
    let got = read_full(file, &mut len_buf).await?;
    if got == 0 {
        return Ok(ReadFrame::EndOfLog);
    }
    if got < len_buf.len() {
        return Ok(ReadFrame::Incomplete);
    }

    let len = u64::from_le_bytes(len_buf);
    let mut payload = vec![0u8; len as usize];
    let got = read_full(file, &mut payload).await?;
    if (got as u64) < len {
        return Ok(ReadFrame::Incomplete);
    }

    Ok(ReadFrame::Frame {
        payload: payload.into(),
        next_offset: offset + frame_size(len),
    })
}

/// Read until `buf` is full or the file ends; returns the bytes read
async fn read_full(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "frame_test.rs"]
mod tests;

//! Append-only record log with tailing readers
//!
//! Records are stored as length-prefixed frames in a single file. One
//! `RecordLog` writer appends; any number of `TailingReader`s follow the
//! file, replaying existing frames and then polling for new ones. An
//! in-memory `OffsetIndex` maps record ordinals to frame start offsets
//! for random access.
//!
//! ```text
//!   RecordLog::append ──► [len u64 LE][payload] ──► data.bin
//!        │                                            │
//!        └──► OffsetIndex (ordinal → offset)          │
//!                  │                                  ▼
//!                  └──────────────► TailingReader::next (replay, then poll)
//! ```
//!
//! The index is derived state: it is never persisted and can always be
//! rebuilt by scanning the file from offset 0.

pub mod error;
pub mod frame;
pub mod index;
pub mod log;
pub mod reader;

pub use error::{Result, StoreError};
pub use frame::{LEN_PREFIX_SIZE, ReadFrame};
pub use index::{OffsetIndex, SharedIndex};
pub use log::RecordLog;
pub use reader::{DEFAULT_POLL_INTERVAL, TailingReader};

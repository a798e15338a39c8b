//! Binary queue snapshot decoding.
//!
//! The legacy client writes a fixed 7168-byte `queue.dat`: a 4-byte format
//! version, a 4-byte current-slot index, ten 712-byte entry records and a
//! trailing 40-byte statistics block. Decoding is all-or-nothing: a wrong
//! total size yields `QueueError`, never a partial queue.

mod decode;
mod types;

pub use decode::decode;
pub use types::{
    ClientQueue, Endianness, QueueEntry, QueueEntryStatus, QueueError, ENTRY_COUNT, ENTRY_LENGTH,
    QUEUE_LENGTH,
};

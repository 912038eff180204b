use core::fmt;

use crate::encode_base36;

/// The packed 64-bit value behind a baseline ID.
///
/// ```text
///  Bit Index:  63                 18 17       12 11          0
///              +---------------------+-----------+-------------+
///  Field:      | timestamp (46)      | worker (6)| sequence(12)|
///              +---------------------+-----------+-------------+
///              |<----- MSB ---------- 64 bits -------- LSB --->|
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BaselineId {
    id: u64,
}

const _: () = {
    assert!(
        BaselineId::TIMESTAMP_BITS + BaselineId::WORKER_BITS + BaselineId::SEQUENCE_BITS
            == u64::BITS,
        "baseline layout must fill a u64"
    );
};

impl BaselineId {
    pub const TIMESTAMP_BITS: u32 = 46;
    pub const WORKER_BITS: u32 = 6;
    pub const SEQUENCE_BITS: u32 = 12;

    pub const SEQUENCE_SHIFT: u32 = 0;
    pub const WORKER_SHIFT: u32 = Self::SEQUENCE_SHIFT + Self::SEQUENCE_BITS;
    pub const TIMESTAMP_SHIFT: u32 = Self::WORKER_SHIFT + Self::WORKER_BITS;

    pub const TIMESTAMP_MASK: u64 = (1 << Self::TIMESTAMP_BITS) - 1;
    pub const WORKER_MASK: u64 = (1 << Self::WORKER_BITS) - 1;
    pub const SEQUENCE_MASK: u64 = (1 << Self::SEQUENCE_BITS) - 1;

    pub const fn from(timestamp: u64, worker_id: u64, sequence: u64) -> Self {
        let t = (timestamp & Self::TIMESTAMP_MASK) << Self::TIMESTAMP_SHIFT;
        let w = (worker_id & Self::WORKER_MASK) << Self::WORKER_SHIFT;
        let s = (sequence & Self::SEQUENCE_MASK) << Self::SEQUENCE_SHIFT;
        Self { id: t | w | s }
    }

    pub const fn from_raw(raw: u64) -> Self {
        Self { id: raw }
    }

    pub const fn to_raw(&self) -> u64 {
        self.id
    }

    /// Milliseconds since the generator's epoch.
    pub const fn timestamp(&self) -> u64 {
        (self.id >> Self::TIMESTAMP_SHIFT) & Self::TIMESTAMP_MASK
    }

    pub const fn worker_id(&self) -> u64 {
        (self.id >> Self::WORKER_SHIFT) & Self::WORKER_MASK
    }

    pub const fn sequence(&self) -> u64 {
        (self.id >> Self::SEQUENCE_SHIFT) & Self::SEQUENCE_MASK
    }

    pub const fn max_worker_id() -> u64 {
        Self::WORKER_MASK
    }

    pub const fn max_sequence() -> u64 {
        Self::SEQUENCE_MASK
    }

    /// Returns true if the current sequence value can be incremented.
    pub const fn has_sequence_room(&self) -> bool {
        self.sequence() < Self::max_sequence()
    }

    /// Returns a new ID with the sequence incremented. Callers check
    /// [`Self::has_sequence_room`] first.
    pub const fn increment_sequence(&self) -> Self {
        Self::from(self.timestamp(), self.worker_id(), self.sequence() + 1)
    }

    /// Returns a new ID for `timestamp` with the sequence reset to zero.
    pub const fn rollover_to_timestamp(&self, timestamp: u64) -> Self {
        Self::from(timestamp, self.worker_id(), 0)
    }

    /// The 13-character, zero-padded, upper-case base-36 payload.
    pub fn to_base36(&self) -> [u8; crate::BASE36_WIDTH] {
        encode_base36(self.id)
    }
}

impl fmt::Display for BaselineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let buf = self.to_base36();
        // The alphabet is ASCII
        f.write_str(core::str::from_utf8(&buf).map_err(|_| fmt::Error)?)
    }
}

impl fmt::Debug for BaselineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BaselineId")
            .field("id", &format_args!("{} (0x{:x})", self.id, self.id))
            .field("base36", &format_args!("{self}"))
            .field("timestamp", &self.timestamp())
            .field("worker_id", &self.worker_id())
            .field("sequence", &self.sequence())
            .finish()
    }
}

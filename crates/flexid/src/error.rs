use thiserror::Error as ThisError;

/// A result type defaulting to the crate-wide [`enum@Error`].
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Construction-time failures. There is no degraded mode: a generator that
/// fails to construct must not be used.
#[derive(Clone, Debug, PartialEq, Eq, Hash, ThisError)]
#[non_exhaustive]
pub enum ConfigError {
    /// The machine (or worker) id does not fit the layout's machine field.
    #[error("machine id {machine_id} is outside [0, {max}]")]
    MachineIdOutOfRange { machine_id: u64, max: u64 },

    /// The preset leaves too few bits for the timestamp field.
    #[error("preset leaves {bits} timestamp bits, at least {min} are required")]
    InsufficientTimestampBits { bits: u32, min: u32 },

    /// A field width the generator's arithmetic cannot work with.
    #[error("{field} width of {bits} bits is not supported")]
    InvalidFieldWidth { field: &'static str, bits: u32 },

    /// The machine obfuscation table needs at least one entry.
    #[error("machine obfuscation table must not be empty")]
    EmptyObfuscationTable,

    /// Baseline prefixes are exactly two ASCII characters.
    #[error("prefix {prefix:?} must be exactly {expected} ASCII characters")]
    InvalidPrefix { prefix: String, expected: usize },

    /// The clock reads earlier than the configured epoch.
    #[error("clock ({now_ms} ms) is earlier than the epoch ({epoch_ms} ms)")]
    ClockBeforeEpoch { now_ms: u64, epoch_ms: u64 },
}

/// Call-time failures of the flexible generator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, ThisError)]
#[non_exhaustive]
pub enum Error {
    /// The generator could not be constructed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The clock moved behind the last issued timestamp. Fatal: the
    /// generator refuses to issue a value that could break ordering.
    #[error("clock moved backwards: now {now} ms, last issued {last} ms")]
    ClockRegression { now: u64, last: u64 },

    /// Elapsed time since the epoch no longer fits the timestamp field.
    #[error("elapsed time {elapsed} ms exceeds the timestamp field maximum {max}")]
    TimestampOverflow { elapsed: u64, max: u64 },

    /// The state lock was poisoned by a panicking holder.
    ///
    /// Never produced with the `parking-lot` feature, which does not poison.
    #[error("generator state lock is poisoned")]
    LockPoisoned,
}

/// Failures decoding a baseline identifier.
#[derive(Clone, Debug, PartialEq, Eq, Hash, ThisError)]
#[non_exhaustive]
pub enum ParseError {
    #[error("invalid length: {len}, expected {expected}")]
    InvalidLength { len: usize, expected: usize },

    #[error("invalid base-36 byte {byte:#04x} at index {index}")]
    InvalidDigit { byte: u8, index: usize },

    #[error("base-36 payload overflows 64 bits")]
    Overflow,
}

#[cfg(not(feature = "parking-lot"))]
use crate::generator::{MutexGuard, PoisonError};

// Collapse all poisoned lock errors into `LockPoisoned`
#[cfg(not(feature = "parking-lot"))]
impl<T> From<PoisonError<MutexGuard<'_, T>>> for Error {
    fn from(_: PoisonError<MutexGuard<'_, T>>) -> Self {
        Self::LockPoisoned
    }
}

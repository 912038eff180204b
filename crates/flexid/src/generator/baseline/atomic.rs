use core::{cmp, convert::Infallible, time::Duration};

use portable_atomic::{AtomicU64, Ordering};
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::id::BaselineId;
use crate::{
    BASE36_WIDTH, ConfigError, DEFAULT_EPOCH, IdGenerator, ParseError, SystemClock, TimeSource,
    decode_base36,
};

/// Length of the fixed prefix of a baseline ID.
pub const BASELINE_PREFIX_LEN: usize = 2;

/// Length of a rendered baseline ID: prefix plus padded base-36 payload.
pub const BASELINE_ID_LEN: usize = BASELINE_PREFIX_LEN + BASE36_WIDTH;

/// A lock-free Snowflake-style generator with base-36 output.
///
/// The packed [`BaselineId`] state is stored in an [`AtomicU64`] and advanced
/// with a compare-and-swap retry loop, so callers never block on each other.
/// IDs render as a two-character prefix followed by 13 upper-case base-36
/// digits, and [`BaselineGenerator::parse`] reverses the rendering exactly.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Fixed-width, reversible output
/// - ❌ No clock-regression guard: a clock that moves backwards restarts the
///   sequence at the earlier millisecond, which can repeat earlier IDs
/// - ❌ No fairness: any contending caller may win a given slot
///
/// ## Recommended When
/// - Availability matters more than rejecting a misbehaving clock
/// - IDs must be decoded back into their worker and timestamp
///
/// ## See Also
/// - [`FlexibleGenerator`]
///
/// [`FlexibleGenerator`]: crate::FlexibleGenerator
pub struct BaselineGenerator<T = SystemClock>
where
    T: TimeSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<AtomicU64>,
    #[cfg(not(feature = "cache-padded"))]
    state: AtomicU64,
    prefix: [u8; BASELINE_PREFIX_LEN],
    worker_id: u64,
    epoch_millis: u64,
    time: T,
}

impl BaselineGenerator {
    /// Creates a generator on the system clock with [`DEFAULT_EPOCH`].
    ///
    /// # Errors
    ///
    /// See [`BaselineGenerator::with_time`].
    ///
    /// # Example
    ///
    /// ```
    /// use flexid::{BaselineGenerator, IdGenerator};
    ///
    /// let generator = BaselineGenerator::new("FI", 1).unwrap();
    /// let id = generator.next_id();
    /// assert_eq!(id.len(), 15);
    ///
    /// let parsed = generator.parse(&id).unwrap();
    /// assert_eq!(parsed.prefix, "FI");
    /// assert_eq!(parsed.worker_id, 1);
    /// ```
    pub fn new(prefix: &str, worker_id: u64) -> Result<Self, ConfigError> {
        Self::with_time(prefix, worker_id, DEFAULT_EPOCH, SystemClock::new())
    }
}

impl<T> BaselineGenerator<T>
where
    T: TimeSource,
{
    /// Creates a generator reading time from `time`, measuring timestamps
    /// from `epoch`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidPrefix`] unless `prefix` is exactly two ASCII
    ///   characters
    /// - [`ConfigError::MachineIdOutOfRange`] if `worker_id` exceeds 63
    /// - [`ConfigError::ClockBeforeEpoch`] if `time` reads earlier than
    ///   `epoch`
    pub fn with_time(
        prefix: &str,
        worker_id: u64,
        epoch: Duration,
        time: T,
    ) -> Result<Self, ConfigError> {
        let prefix: [u8; BASELINE_PREFIX_LEN] = prefix
            .as_bytes()
            .try_into()
            .ok()
            .filter(|p: &[u8; BASELINE_PREFIX_LEN]| p.is_ascii())
            .ok_or_else(|| ConfigError::InvalidPrefix {
                prefix: prefix.to_owned(),
                expected: BASELINE_PREFIX_LEN,
            })?;

        if worker_id > BaselineId::max_worker_id() {
            return Err(ConfigError::MachineIdOutOfRange {
                machine_id: worker_id,
                max: BaselineId::max_worker_id(),
            });
        }

        let epoch_ms = epoch.as_millis() as u64;
        let now_ms = time.current_millis();
        if now_ms < epoch_ms {
            return Err(ConfigError::ClockBeforeEpoch { now_ms, epoch_ms });
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(worker_id, epoch_ms, "baseline generator ready");

        let initial = BaselineId::from(0, worker_id, 0).to_raw();
        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(AtomicU64::new(initial)),
            #[cfg(not(feature = "cache-padded"))]
            state: AtomicU64::new(initial),
            prefix,
            worker_id,
            epoch_millis: epoch_ms,
            time,
        })
    }

    /// Generates the next packed ID.
    ///
    /// Each iteration recomputes the candidate from the latest observed
    /// state and the live clock, then publishes it with a weak CAS. A lost
    /// race or an exhausted sequence simply retries; the loop ends once this
    /// caller wins a slot.
    ///
    /// # Errors
    ///
    /// This method never fails.
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_raw(&self) -> Result<BaselineId, Infallible> {
        loop {
            // Load before reading the clock so a slow reader never mistakes a
            // newer slot for a backward clock.
            let current_raw = self.state.load(Ordering::Relaxed);
            let current = BaselineId::from_raw(current_raw);
            let now = self.elapsed_millis();

            let next = match now.cmp(&current.timestamp()) {
                cmp::Ordering::Equal => {
                    if current.has_sequence_room() {
                        current.increment_sequence()
                    } else {
                        core::hint::spin_loop();
                        continue;
                    }
                }
                cmp::Ordering::Greater => current.rollover_to_timestamp(now),
                cmp::Ordering::Less => Self::cold_clock_behind(current, now),
            };

            if self
                .state
                .compare_exchange_weak(
                    current_raw,
                    next.to_raw(),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                )
                .is_ok()
            {
                return Ok(next);
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(current: BaselineId, now: u64) -> BaselineId {
        #[cfg(feature = "tracing")]
        tracing::warn!(
            now,
            last = current.timestamp(),
            "clock moved backwards, restarting sequence"
        );
        current.rollover_to_timestamp(now)
    }

    fn elapsed_millis(&self) -> u64 {
        self.time.current_millis().saturating_sub(self.epoch_millis) & BaselineId::TIMESTAMP_MASK
    }

    /// Renders a packed ID with this generator's prefix.
    pub fn render(&self, id: BaselineId) -> String {
        let mut out = String::with_capacity(BASELINE_ID_LEN);
        out.extend(self.prefix.iter().map(|&b| char::from(b)));
        out.extend(id.to_base36().iter().map(|&b| char::from(b)));
        out
    }

    /// Decodes an ID rendered by a generator sharing this one's epoch.
    ///
    /// # Errors
    ///
    /// See [`ParsedBaselineId::parse`].
    pub fn parse(&self, id: &str) -> Result<ParsedBaselineId, ParseError> {
        ParsedBaselineId::parse(id, self.epoch_millis)
    }

    pub fn worker_id(&self) -> u64 {
        self.worker_id
    }

    pub fn prefix(&self) -> &str {
        // Validated as ASCII at construction
        core::str::from_utf8(&self.prefix).unwrap_or_default()
    }

    /// The configured epoch in Unix milliseconds.
    pub fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }
}

impl<T> IdGenerator for BaselineGenerator<T>
where
    T: TimeSource,
{
    type Err = Infallible;

    fn try_next_id(&self) -> Result<String, Self::Err> {
        let id = self.try_next_raw()?;
        Ok(self.render(id))
    }
}

/// The fields recovered from a rendered baseline ID.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParsedBaselineId {
    pub prefix: String,
    pub worker_id: u64,
    pub sequence: u64,
    /// Unix milliseconds: the stored offset plus the epoch.
    pub timestamp_ms: u64,
}

impl ParsedBaselineId {
    /// Decodes a rendered baseline ID whose timestamp is measured from
    /// `epoch_millis`.
    ///
    /// Lower-case digits are accepted.
    ///
    /// # Errors
    ///
    /// - [`ParseError::InvalidLength`] if `id` is not exactly 15 bytes
    /// - [`ParseError::InvalidDigit`] for a non-ASCII prefix byte or a payload
    ///   byte outside `[0-9A-Za-z]`
    /// - [`ParseError::Overflow`] if the payload exceeds `u64`
    ///
    /// # Example
    ///
    /// ```
    /// use flexid::ParsedBaselineId;
    ///
    /// let parsed = ParsedBaselineId::parse("FI000000000035S", 0).unwrap();
    /// assert_eq!(parsed.prefix, "FI");
    /// assert_eq!(parsed.worker_id, 1);
    /// assert_eq!(parsed.sequence, 0);
    /// assert_eq!(parsed.timestamp_ms, 0);
    /// ```
    pub fn parse(id: &str, epoch_millis: u64) -> Result<Self, ParseError> {
        let bytes = id.as_bytes();
        if bytes.len() != BASELINE_ID_LEN {
            return Err(ParseError::InvalidLength {
                len: bytes.len(),
                expected: BASELINE_ID_LEN,
            });
        }

        let (prefix, payload) = bytes.split_at(BASELINE_PREFIX_LEN);
        if let Some(index) = prefix.iter().position(|b| !b.is_ascii()) {
            return Err(ParseError::InvalidDigit {
                byte: prefix[index],
                index,
            });
        }

        let raw = BaselineId::from_raw(decode_base36(payload, BASELINE_PREFIX_LEN)?);
        Ok(Self {
            prefix: prefix.iter().map(|&b| char::from(b)).collect(),
            worker_id: raw.worker_id(),
            sequence: raw.sequence(),
            timestamp_ms: raw.timestamp().saturating_add(epoch_millis),
        })
    }
}

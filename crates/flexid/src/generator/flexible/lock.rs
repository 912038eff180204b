
#[cfg(feature = "tracing")]
use tracing::instrument;

use super::{
    mixer::Mixer,
    state::{GeneratorState, StepTable},
};
use crate::{
    ConfigError, Error, GeneratorConfig, IdGenerator, Layout, RandSource, Result, SystemClock,
    ThreadRandom, TimeSource, generator::Mutex,
};

/// A lock-based generator of monotonic, obfuscated, time-ordered IDs.
///
/// Each ID is a 63-bit integer laid out per a [`CapacityPreset`]: a timestamp
/// in the high bits, then a machine field, a sequence field, and a random
/// filler field (in a permuted order for high-capacity presets), rendered as
/// the configured prefix followed by the integer in decimal.
///
/// All state lives behind one [`Mutex`]; the whole generation step,
/// including a short spin when a millisecond's sequence space is exhausted,
/// runs under it.
///
/// ## Features
/// - ✅ Thread-safe
/// - ✅ Strictly increasing within one instance
/// - ✅ Rejects backward clock motion instead of reissuing
/// - ❌ Rendered IDs are not padded, so a prefix ending in digits cannot be
///   split from the number unambiguously
///
/// ## Recommended When
/// - IDs are primary keys whose order should follow creation time
/// - Exposing per-node counters or node ids in keys is undesirable
///
/// ## See Also
/// - [`BaselineGenerator`]
///
/// [`CapacityPreset`]: crate::CapacityPreset
/// [`BaselineGenerator`]: crate::BaselineGenerator
pub struct FlexibleGenerator<T = SystemClock, R = ThreadRandom>
where
    T: TimeSource,
    R: RandSource,
{
    #[cfg(feature = "cache-padded")]
    state: crossbeam_utils::CachePadded<Mutex<GeneratorState>>,
    #[cfg(not(feature = "cache-padded"))]
    state: Mutex<GeneratorState>,
    layout: Layout,
    mixer: Mixer,
    machine_id: u64,
    prefix: String,
    epoch_millis: u64,
    time: T,
    rng: R,
}

impl FlexibleGenerator {
    /// Creates a generator on the system clock and the thread-local RNG.
    ///
    /// # Errors
    ///
    /// See [`FlexibleGenerator::with_sources`].
    ///
    /// # Example
    ///
    /// ```
    /// use flexid::{CapacityPreset, FlexibleGenerator, GeneratorConfig, IdGenerator};
    ///
    /// let generator =
    ///     FlexibleGenerator::new(GeneratorConfig::new(CapacityPreset::SMALL, 0).with_prefix("U"))
    ///         .unwrap();
    /// let ids = generator.try_next_ids(3).unwrap();
    /// assert!(ids.iter().all(|id| id.starts_with('U')));
    /// assert!(generator.verify_increasing_sequence(&ids));
    /// ```
    pub fn new(config: GeneratorConfig) -> Result<Self, ConfigError> {
        Self::with_sources(config, SystemClock::new(), ThreadRandom)
    }
}

impl<T, R> FlexibleGenerator<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    /// Creates a generator reading time from `time` and randomness from
    /// `rng`.
    ///
    /// The layout (including any field permutation), the machine secret, and
    /// the initial step table are fixed here for the generator's lifetime.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ClockBeforeEpoch`] if `time` reads earlier than the
    ///   configured epoch
    /// - any layout error from [`Layout::resolve`]
    /// - [`ConfigError::EmptyObfuscationTable`] for a zero table size
    pub fn with_sources(config: GeneratorConfig, time: T, rng: R) -> Result<Self, ConfigError> {
        let now_ms = time.current_millis();
        let epoch_ms = config.epoch_millis();
        if now_ms < epoch_ms {
            return Err(ConfigError::ClockBeforeEpoch { now_ms, epoch_ms });
        }

        let layout = Layout::resolve(config.preset, config.machine_id, &rng)?;
        let mixer = Mixer::new(
            &layout,
            config.machine_id,
            now_ms,
            config.obfuscation_table_size,
            &rng,
        )?;
        let state = Mutex::new(GeneratorState::new(StepTable::new(&rng)));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            machine_id = config.machine_id,
            timestamp_bits = layout.timestamp_bits(),
            order = ?layout.order(),
            "flexible generator ready"
        );

        Ok(Self {
            #[cfg(feature = "cache-padded")]
            state: crossbeam_utils::CachePadded::new(state),
            #[cfg(not(feature = "cache-padded"))]
            state,
            layout,
            mixer,
            machine_id: config.machine_id,
            prefix: config.prefix,
            epoch_millis: epoch_ms,
            time,
            rng,
        })
    }

    /// Generates the next ID as a raw integer, without the prefix.
    ///
    /// # Errors
    ///
    /// - [`Error::ClockRegression`] if the clock reads earlier than the last
    ///   issued timestamp
    /// - [`Error::TimestampOverflow`] once the timestamp field is exhausted
    /// - [`Error::LockPoisoned`] if another caller panicked while holding the
    ///   lock (not with `parking-lot`)
    #[cfg_attr(feature = "tracing", instrument(level = "trace", skip(self)))]
    pub fn try_next_raw(&self) -> Result<u64> {
        let mut state = {
            #[cfg(feature = "parking-lot")]
            {
                self.state.lock()
            }
            #[cfg(not(feature = "parking-lot"))]
            {
                self.state.lock()?
            }
        };

        let tick = state.advance(&self.time, &self.rng, self.layout.max_sequence())?;

        let Some(elapsed) = tick.timestamp.checked_sub(self.epoch_millis) else {
            return Err(ConfigError::ClockBeforeEpoch {
                now_ms: tick.timestamp,
                epoch_ms: self.epoch_millis,
            }
            .into());
        };
        if elapsed > self.layout.max_timestamp() {
            return Err(Error::TimestampOverflow {
                elapsed,
                max: self.layout.max_timestamp(),
            });
        }

        // A random field above the sequence must not change within a
        // millisecond, so it uses the reading latched at rollover.
        let nanos = if self.layout.random_below_sequence() {
            self.time.current_nanos()
        } else {
            tick.tick_nanos
        };

        let machine = self.mixer.machine(tick.call_counter);
        let random = self.mixer.filler(tick.call_counter, nanos);
        Ok(self.layout.assemble(elapsed, machine, tick.sequence, random))
    }

    /// Checks that `ids` were issued by this generator in the given order:
    /// every entry carries this generator's prefix followed by a decimal
    /// number, and the numbers strictly increase.
    ///
    /// Returns `false` for any entry that does not parse.
    pub fn verify_increasing_sequence<S: AsRef<str>>(&self, ids: &[S]) -> bool {
        let mut previous = None;
        for id in ids {
            let Some(value) = self.numeric_suffix(id.as_ref()) else {
                return false;
            };
            if previous.is_some_and(|p| p >= value) {
                return false;
            }
            previous = Some(value);
        }
        true
    }

    fn numeric_suffix(&self, id: &str) -> Option<u64> {
        let digits = id.strip_prefix(self.prefix.as_str())?;
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// The true machine id. It does not appear verbatim in generated IDs.
    pub fn machine_id(&self) -> u64 {
        self.machine_id
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The configured epoch in Unix milliseconds.
    pub fn epoch_millis(&self) -> u64 {
        self.epoch_millis
    }
}

impl<T, R> IdGenerator for FlexibleGenerator<T, R>
where
    T: TimeSource,
    R: RandSource,
{
    type Err = Error;

    /// Generates the next ID: the prefix followed by the decimal ID.
    ///
    /// # Errors
    ///
    /// See [`FlexibleGenerator::try_next_raw`].
    fn try_next_id(&self) -> Result<String, Self::Err> {
        let raw = self.try_next_raw()?;
        let mut id = String::with_capacity(self.prefix.len() + 19);
        id.push_str(&self.prefix);
        id.push_str(&raw.to_string());
        Ok(id)
    }
}

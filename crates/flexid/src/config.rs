use core::time::Duration;

use crate::{CapacityPreset, DEFAULT_EPOCH};

/// Construction parameters for a [`FlexibleGenerator`].
///
/// The epoch and table size are per-instance values, so two generators in
/// one process never share configuration or state.
///
/// # Example
///
/// ```
/// use flexid::{CapacityPreset, GeneratorConfig, TWITTER_EPOCH};
///
/// let config = GeneratorConfig::new(CapacityPreset::MEDIUM, 12)
///     .with_prefix("ORD")
///     .with_epoch(TWITTER_EPOCH);
/// assert_eq!(config.prefix, "ORD");
/// assert_eq!(config.obfuscation_table_size, 64);
/// ```
///
/// [`FlexibleGenerator`]: crate::FlexibleGenerator
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub preset: CapacityPreset,
    /// Externally assigned and assumed unique across nodes.
    pub machine_id: u64,
    /// Prepended verbatim to every rendered ID.
    pub prefix: String,
    /// Origin of the timestamp field, as a [`Duration`] since 1970-01-01 UTC.
    pub epoch: Duration,
    /// Entries in the precomputed machine obfuscation table.
    pub obfuscation_table_size: usize,
}

impl GeneratorConfig {
    pub const DEFAULT_OBFUSCATION_TABLE_SIZE: usize = 64;

    pub fn new(preset: CapacityPreset, machine_id: u64) -> Self {
        Self {
            preset,
            machine_id,
            prefix: String::new(),
            epoch: DEFAULT_EPOCH,
            obfuscation_table_size: Self::DEFAULT_OBFUSCATION_TABLE_SIZE,
        }
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_epoch(mut self, epoch: Duration) -> Self {
        self.epoch = epoch;
        self
    }

    #[must_use]
    pub fn with_obfuscation_table_size(mut self, size: usize) -> Self {
        self.obfuscation_table_size = size;
        self
    }

    pub(crate) fn epoch_millis(&self) -> u64 {
        self.epoch.as_millis() as u64
    }
}

/// A fixed capacity configuration for the flexible generator.
///
/// A preset trades machine capacity and per-millisecond throughput against
/// timestamp range. All presets share a 63-bit integer space so that every ID
/// fits a signed 64-bit database column.
///
/// ```text
///  preset   machines  digits  machine  sequence  random  timestamp
///  SMALL          16      16        4         8       3         48
///  MEDIUM         64      18        6         9       4         44
///  LARGE         256      19        8        10       5         40
/// ```
///
/// Presets with `target_digits >= 18` randomize the order of the machine,
/// sequence, and random fields below the timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CapacityPreset {
    machine_count: u64,
    machine_bits: u32,
    target_digits: u32,
    sequence_bits: u32,
    random_bits: u32,
}

impl CapacityPreset {
    /// Up to 16 machines, ~8.9k years of timestamp range.
    pub const SMALL: Self = Self::new(4, 16, 8, 3);

    /// Up to 64 machines, ~557 years of timestamp range. Permuted layout.
    pub const MEDIUM: Self = Self::new(6, 18, 9, 4);

    /// Up to 256 machines, ~34 years of timestamp range. Permuted layout.
    pub const LARGE: Self = Self::new(8, 19, 10, 5);

    /// Digit count at which the field order below the timestamp is permuted.
    pub const PERMUTE_AT_DIGITS: u32 = 18;

    /// Defines a custom preset. Widths are validated when a layout is
    /// resolved, not here.
    pub const fn new(
        machine_bits: u32,
        target_digits: u32,
        sequence_bits: u32,
        random_bits: u32,
    ) -> Self {
        let machine_count = if machine_bits >= u64::BITS {
            u64::MAX
        } else {
            1 << machine_bits
        };
        Self {
            machine_count,
            machine_bits,
            target_digits,
            sequence_bits,
            random_bits,
        }
    }

    pub const fn machine_count(&self) -> u64 {
        self.machine_count
    }

    pub const fn machine_bits(&self) -> u32 {
        self.machine_bits
    }

    pub const fn target_digits(&self) -> u32 {
        self.target_digits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    pub const fn random_bits(&self) -> u32 {
        self.random_bits
    }

    /// Returns true if layouts for this preset get a permuted field order.
    pub const fn is_permuted(&self) -> bool {
        self.target_digits >= Self::PERMUTE_AT_DIGITS
    }

    /// Looks up a built-in preset by its (case-insensitive) name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "small" => Some(Self::SMALL),
            "medium" => Some(Self::MEDIUM),
            "large" => Some(Self::LARGE),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_in_presets_grow_in_every_dimension() {
        let presets = [
            CapacityPreset::SMALL,
            CapacityPreset::MEDIUM,
            CapacityPreset::LARGE,
        ];
        for pair in presets.windows(2) {
            assert!(pair[0].machine_count() < pair[1].machine_count());
            assert!(pair[0].sequence_bits() < pair[1].sequence_bits());
            assert!(pair[0].random_bits() < pair[1].random_bits());
        }
    }

    #[test]
    fn only_high_digit_presets_are_permuted() {
        assert!(!CapacityPreset::SMALL.is_permuted());
        assert!(CapacityPreset::MEDIUM.is_permuted());
        assert!(CapacityPreset::LARGE.is_permuted());
    }

    #[test]
    fn from_name_is_case_insensitive() {
        assert_eq!(CapacityPreset::from_name("Large"), Some(CapacityPreset::LARGE));
        assert_eq!(CapacityPreset::from_name("tiny"), None);
    }
}

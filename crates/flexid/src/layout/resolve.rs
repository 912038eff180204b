use crate::{ConfigError, RandSource, layout::CapacityPreset, rand::shuffle};

/// A field stored below the timestamp.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Random,
    Sequence,
    Machine,
}

/// The fields of an assembled ID, as stored (the machine field holds the
/// obfuscated value, not the true machine id).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Components {
    /// Milliseconds since the generator's epoch.
    pub timestamp: u64,
    pub machine: u64,
    pub sequence: u64,
    pub random: u64,
}

/// The resolved bit layout of a flexible generator.
///
/// The timestamp always occupies the most significant bits. Below it sit
/// the machine, sequence, and random fields, in standard order or in an order
/// permuted once at resolution time. Shifts are computed here and never
/// recomputed on the assembly path.
///
/// ```text
///  standard:  | 0 | timestamp | machine | sequence | random |
///  permuted:  | 0 | timestamp |   order[2]  |  order[1]  |  order[0]  |
///             |<------ MSB ---------- 64 bits ---------- LSB ------>|
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Layout {
    machine_bits: u32,
    sequence_bits: u32,
    random_bits: u32,
    timestamp_bits: u32,
    max_machine: u64,
    max_sequence: u64,
    max_random: u64,
    max_timestamp: u64,
    timestamp_shift: u32,
    machine_shift: u32,
    sequence_shift: u32,
    random_shift: u32,
    component_order: Option<[Component; 3]>,
}

const fn mask(bits: u32) -> u64 {
    if bits >= u64::BITS {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

impl Layout {
    /// Usable bits; the sign bit of a 64-bit signed key stays clear.
    pub const ID_BITS: u32 = 63;

    /// Lower bound on timestamp width.
    pub const MIN_TIMESTAMP_BITS: u32 = 30;

    /// Largest width accepted for any single field below the timestamp.
    pub const MAX_FIELD_BITS: u32 = 32;

    /// Standard order, least significant first.
    pub const STANDARD_ORDER: [Component; 3] =
        [Component::Random, Component::Sequence, Component::Machine];

    /// Resolves the layout for `preset` and validates `machine_id` against
    /// it.
    ///
    /// For presets with [`CapacityPreset::is_permuted`], a Fisher–Yates
    /// permutation of the three lower fields is drawn from `rng`.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::InvalidFieldWidth`] if a field width is zero, too
    ///   wide, or (for the sequence) narrower than 3 bits
    /// - [`ConfigError::InsufficientTimestampBits`] if fewer than
    ///   [`Self::MIN_TIMESTAMP_BITS`] remain for the timestamp
    /// - [`ConfigError::MachineIdOutOfRange`] if `machine_id` does not fit
    ///
    /// # Example
    ///
    /// ```
    /// use flexid::{CapacityPreset, Layout, ThreadRandom};
    ///
    /// let layout = Layout::resolve(CapacityPreset::SMALL, 3, &ThreadRandom).unwrap();
    /// assert_eq!(layout.timestamp_bits(), 48);
    /// assert_eq!(layout.timestamp_shift(), 15);
    /// assert!(layout.component_order().is_none());
    /// ```
    pub fn resolve<R: RandSource>(
        preset: CapacityPreset,
        machine_id: u64,
        rng: &R,
    ) -> Result<Self, ConfigError> {
        let machine_bits = preset.machine_bits();
        let sequence_bits = preset.sequence_bits();
        let random_bits = preset.random_bits();

        check_width("machine", machine_bits, 1)?;
        // max_sequence / 4 is the base-sequence window and must be non-empty
        check_width("sequence", sequence_bits, 3)?;
        check_width("random", random_bits, 1)?;

        let used = machine_bits + sequence_bits + random_bits;
        let timestamp_bits = Self::ID_BITS.saturating_sub(used);
        if timestamp_bits < Self::MIN_TIMESTAMP_BITS {
            return Err(ConfigError::InsufficientTimestampBits {
                bits: timestamp_bits,
                min: Self::MIN_TIMESTAMP_BITS,
            });
        }

        let max_machine = mask(machine_bits);
        if machine_id > max_machine {
            return Err(ConfigError::MachineIdOutOfRange {
                machine_id,
                max: max_machine,
            });
        }

        let component_order = preset.is_permuted().then(|| {
            let mut order = Self::STANDARD_ORDER;
            shuffle(&mut order, rng);
            order
        });

        let mut layout = Self {
            machine_bits,
            sequence_bits,
            random_bits,
            timestamp_bits,
            max_machine,
            max_sequence: mask(sequence_bits),
            max_random: mask(random_bits),
            max_timestamp: mask(timestamp_bits),
            timestamp_shift: used,
            machine_shift: 0,
            sequence_shift: 0,
            random_shift: 0,
            component_order,
        };

        let mut shift = 0;
        for component in layout.order() {
            match component {
                Component::Random => layout.random_shift = shift,
                Component::Sequence => layout.sequence_shift = shift,
                Component::Machine => layout.machine_shift = shift,
            }
            shift += layout.width(component);
        }
        debug_assert_eq!(shift, layout.timestamp_shift);

        Ok(layout)
    }

    /// Packs the four fields into an ID. Each field is masked to its width;
    /// callers check the timestamp range beforehand.
    #[inline]
    pub const fn assemble(&self, timestamp: u64, machine: u64, sequence: u64, random: u64) -> u64 {
        ((timestamp & self.max_timestamp) << self.timestamp_shift)
            | ((machine & self.max_machine) << self.machine_shift)
            | ((sequence & self.max_sequence) << self.sequence_shift)
            | ((random & self.max_random) << self.random_shift)
    }

    /// Splits an ID back into its stored fields.
    pub const fn decompose(&self, id: u64) -> Components {
        Components {
            timestamp: (id >> self.timestamp_shift) & self.max_timestamp,
            machine: (id >> self.machine_shift) & self.max_machine,
            sequence: (id >> self.sequence_shift) & self.max_sequence,
            random: (id >> self.random_shift) & self.max_random,
        }
    }

    /// Field order in effect, least significant first.
    pub fn order(&self) -> [Component; 3] {
        self.component_order.unwrap_or(Self::STANDARD_ORDER)
    }

    /// The permuted order, or `None` for a standard layout.
    pub const fn component_order(&self) -> Option<[Component; 3]> {
        self.component_order
    }

    /// Returns true if the random field is less significant than the
    /// sequence, so it may vary freely within one millisecond.
    pub const fn random_below_sequence(&self) -> bool {
        self.random_shift < self.sequence_shift
    }

    pub const fn width(&self, component: Component) -> u32 {
        match component {
            Component::Random => self.random_bits,
            Component::Sequence => self.sequence_bits,
            Component::Machine => self.machine_bits,
        }
    }

    pub const fn shift(&self, component: Component) -> u32 {
        match component {
            Component::Random => self.random_shift,
            Component::Sequence => self.sequence_shift,
            Component::Machine => self.machine_shift,
        }
    }

    pub const fn machine_bits(&self) -> u32 {
        self.machine_bits
    }

    pub const fn sequence_bits(&self) -> u32 {
        self.sequence_bits
    }

    pub const fn random_bits(&self) -> u32 {
        self.random_bits
    }

    pub const fn timestamp_bits(&self) -> u32 {
        self.timestamp_bits
    }

    pub const fn max_machine(&self) -> u64 {
        self.max_machine
    }

    pub const fn max_sequence(&self) -> u64 {
        self.max_sequence
    }

    pub const fn max_random(&self) -> u64 {
        self.max_random
    }

    pub const fn max_timestamp(&self) -> u64 {
        self.max_timestamp
    }

    pub const fn timestamp_shift(&self) -> u32 {
        self.timestamp_shift
    }
}

fn check_width(field: &'static str, bits: u32, min: u32) -> Result<(), ConfigError> {
    if bits < min || bits > Layout::MAX_FIELD_BITS {
        return Err(ConfigError::InvalidFieldWidth { field, bits });
    }
    Ok(())
}

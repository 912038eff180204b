use crate::{ConfigError, Layout, RandSource};

/// Obfuscates the random and machine fields of flexible IDs.
///
/// Everything here is a deterministic function of a per-instance secret,
/// internal counters, and the clock. It defeats casual pattern reading of
/// consecutive IDs; it is not a defense against an observer with many
/// samples, and it is not a source of cryptographic randomness.
#[derive(Clone, Debug)]
pub(crate) struct Mixer {
    secret: u64,
    machine_table: Box<[u64]>,
    max_random: u64,
}

impl Mixer {
    /// Multiplier applied to the counter sum before adding the secret.
    const FILLER_MULTIPLIER: u64 = 31;

    /// Stride between consecutive obfuscation table entries.
    const MACHINE_STRIDE: u64 = 7;

    pub(crate) fn new<R: RandSource>(
        layout: &Layout,
        machine_id: u64,
        construction_millis: u64,
        table_size: usize,
        rng: &R,
    ) -> Result<Self, ConfigError> {
        if table_size == 0 {
            return Err(ConfigError::EmptyObfuscationTable);
        }

        let modulus = layout.max_machine() + 1;
        let machine_table = (0..table_size as u64)
            .map(|i| {
                machine_id.wrapping_add(i.wrapping_mul(Self::MACHINE_STRIDE)) % modulus
            })
            .collect();

        Ok(Self {
            secret: mix(machine_id, construction_millis, rng.rand()),
            machine_table,
            max_random: layout.max_random(),
        })
    }

    /// Filler for the random field: `((counter + nanos) * 31 + secret) mod
    /// max_random`. The result is always below `max_random` and therefore
    /// fits the field.
    #[inline]
    pub(crate) fn filler(&self, call_counter: u64, nanos: u64) -> u64 {
        let value = call_counter
            .wrapping_add(nanos)
            .wrapping_mul(Self::FILLER_MULTIPLIER)
            .wrapping_add(self.secret);
        (value % self.max_random) & self.max_random
    }

    /// The value emitted in the machine field. It rotates through the
    /// table, so the true machine id cannot be read back from an ID.
    #[inline]
    pub(crate) fn machine(&self, call_counter: u64) -> u64 {
        let index = call_counter % self.machine_table.len() as u64;
        self.machine_table[index as usize]
    }

    #[cfg(test)]
    pub(crate) fn table(&self) -> &[u64] {
        &self.machine_table
    }
}

/// Folds the machine id, construction time, and an entropy draw into one
/// 64-bit secret with the splitmix64 finalizer.
pub(crate) fn mix(machine_id: u64, construction_millis: u64, entropy: u64) -> u64 {
    let mut z = machine_id.wrapping_mul(0x9E37_79B9_7F4A_7C15)
        ^ construction_millis.rotate_left(32)
        ^ entropy;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CapacityPreset, ThreadRandom};

    struct Fixed(u64);

    impl RandSource for Fixed {
        fn rand(&self) -> u64 {
            self.0
        }
    }

    fn small_layout(machine_id: u64) -> Layout {
        Layout::resolve(CapacityPreset::SMALL, machine_id, &ThreadRandom).unwrap()
    }

    #[test]
    fn rejects_empty_table() {
        let layout = small_layout(0);
        assert_eq!(
            Mixer::new(&layout, 0, 0, 0, &ThreadRandom).unwrap_err(),
            ConfigError::EmptyObfuscationTable
        );
    }

    #[test]
    fn table_strides_by_seven_modulo_machine_space() {
        let layout = small_layout(3);
        let mixer = Mixer::new(&layout, 3, 0, 64, &ThreadRandom).unwrap();
        assert_eq!(mixer.table().len(), 64);
        for (i, &m) in mixer.table().iter().enumerate() {
            assert_eq!(m, (3 + i as u64 * 7) % 16);
        }
        assert_eq!(mixer.machine(0), 3);
        assert_eq!(mixer.machine(1), 10);
        assert_eq!(mixer.machine(64), 3);
    }

    #[test]
    fn obfuscated_machine_stays_in_range() {
        for preset in [
            CapacityPreset::SMALL,
            CapacityPreset::MEDIUM,
            CapacityPreset::LARGE,
        ] {
            let layout = Layout::resolve(preset, 1, &ThreadRandom).unwrap();
            let mixer = Mixer::new(&layout, 1, 1_700_000_000_000, 64, &ThreadRandom).unwrap();
            for counter in 0..1_000 {
                assert!(mixer.machine(counter) <= layout.max_machine());
            }
        }
    }

    #[test]
    fn filler_is_below_max_random() {
        let layout = Layout::resolve(CapacityPreset::LARGE, 9, &ThreadRandom).unwrap();
        let mixer = Mixer::new(&layout, 9, 1_700_000_000_000, 64, &ThreadRandom).unwrap();
        for counter in 0..200 {
            for nanos in [0, 1, 999_999, u64::MAX - counter] {
                assert!(mixer.filler(counter, nanos) < layout.max_random());
            }
        }
    }

    #[test]
    fn filler_is_deterministic_for_its_inputs() {
        let layout = small_layout(2);
        let a = Mixer::new(&layout, 2, 123, 64, &Fixed(77)).unwrap();
        let b = Mixer::new(&layout, 2, 123, 64, &Fixed(77)).unwrap();
        let secret = mix(2, 123, 77);
        for counter in 0..50_u64 {
            let expected = counter.wrapping_add(500).wrapping_mul(31).wrapping_add(secret) % 7;
            assert_eq!(a.filler(counter, 500), expected);
            assert_eq!(a.filler(counter, 500), b.filler(counter, 500));
        }
    }

    #[test]
    fn secret_depends_on_every_input() {
        let base = mix(1, 2, 3);
        assert_ne!(base, mix(0, 2, 3));
        assert_ne!(base, mix(1, 0, 3));
        assert_ne!(base, mix(1, 2, 0));
    }
}

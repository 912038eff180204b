use rand::{Rng, rng};

/// A trait for random sources that return random integers.
///
/// This abstraction allows you to plug in a real random source or a mocked
/// random source in tests. Generators use it for their one-time secret, the
/// layout permutation, the step table, and base-sequence jumps.
///
/// # Example
/// ```
/// use flexid::RandSource;
///
/// struct FixedRand;
/// impl RandSource for FixedRand {
///     fn rand(&self) -> u64 {
///         1234
///     }
/// }
///
/// let rng = FixedRand;
/// assert_eq!(rng.rand(), 1234);
/// assert_eq!(rng.rand_below(1000), 234);
/// ```
pub trait RandSource {
    /// Returns a random integer.
    fn rand(&self) -> u64;

    /// Returns a value in `[0, bound)`. `bound` must be non-zero.
    fn rand_below(&self, bound: u64) -> u64 {
        debug_assert!(bound > 0);
        self.rand() % bound
    }
}

impl<R: RandSource + ?Sized> RandSource for &R {
    fn rand(&self) -> u64 {
        (**self).rand()
    }

    fn rand_below(&self, bound: u64) -> u64 {
        (**self).rand_below(bound)
    }
}

/// A `RandSource` that uses the thread-local RNG (`rand::rng()`).
///
/// This RNG is cryptographically secure (ChaCha-based), seeded from the
/// operating system, and automatically reseeded periodically.
///
/// ⚠️ NOTE: The underlying `ThreadRng` is not `Send` or `Sync`. Since this type
/// is a zero-sized wrapper that does not store the RNG, it **is** thread-safe
/// and may be freely used across threads.
#[derive(Default, Clone, Copy, Debug)]
pub struct ThreadRandom;

impl RandSource for ThreadRandom {
    fn rand(&self) -> u64 {
        rng().random()
    }

    fn rand_below(&self, bound: u64) -> u64 {
        rng().random_range(0..bound)
    }
}

/// In-place Fisher–Yates shuffle driven by a [`RandSource`].
pub(crate) fn shuffle<T, R: RandSource>(items: &mut [T], rng: &R) {
    for i in (1..items.len()).rev() {
        let j = rng.rand_below(i as u64 + 1) as usize;
        items.swap(i, j);
    }
}

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Default epoch: Monday, January 1, 2024 00:00:00 UTC
pub const DEFAULT_EPOCH: Duration = Duration::from_millis(1_704_067_200_000);

/// Twitter epoch: Thursday, November 4, 2010 1:42:54.657 UTC
pub const TWITTER_EPOCH: Duration = Duration::from_millis(1_288_834_974_657);

/// A source of wall-clock milliseconds and a monotonic nanosecond counter.
///
/// Generators subtract their own configured epoch from
/// [`TimeSource::current_millis`], so implementations report plain Unix
/// milliseconds. This abstraction allows you to plug in the system clock or
/// a mocked time source in tests.
///
/// # Example
///
/// ```
/// use flexid::TimeSource;
///
/// struct FixedTime;
/// impl TimeSource for FixedTime {
///     fn current_millis(&self) -> u64 {
///         1_704_067_200_123
///     }
/// }
///
/// let time = FixedTime;
/// assert_eq!(time.current_millis(), 1_704_067_200_123);
/// assert_eq!(time.current_nanos(), 1_704_067_200_123_000_000);
/// ```
pub trait TimeSource {
    /// Returns milliseconds since 1970-01-01 UTC.
    fn current_millis(&self) -> u64;

    /// Returns a nanosecond reading with an arbitrary origin.
    ///
    /// Only differences and low bits of this value are meaningful. The
    /// default derives it from [`TimeSource::current_millis`].
    fn current_nanos(&self) -> u64 {
        self.current_millis().wrapping_mul(1_000_000)
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn current_millis(&self) -> u64 {
        (**self).current_millis()
    }

    fn current_nanos(&self) -> u64 {
        (**self).current_nanos()
    }
}

/// The operating system's wall clock.
///
/// Unlike a monotonic ticker, this clock can move backwards when the host
/// time is adjusted. The flexible generator detects that and fails; the
/// baseline generator does not.
#[derive(Clone, Copy, Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemClock {
    fn current_millis(&self) -> u64 {
        // A host clock set before 1970 reads as zero and then fails epoch checks.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis() as u64)
    }

    fn current_nanos(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_past_default_epoch() {
        let clock = SystemClock::new();
        assert!(clock.current_millis() > DEFAULT_EPOCH.as_millis() as u64);
    }

    #[test]
    fn system_clock_nanos_do_not_go_backwards() {
        let clock = SystemClock::new();
        let a = clock.current_nanos();
        std::thread::sleep(Duration::from_millis(1));
        let b = clock.current_nanos();
        assert!(b > a);
    }
}

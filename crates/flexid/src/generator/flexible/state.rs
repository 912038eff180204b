use core::cmp::Ordering;

use crate::{Error, RandSource, TimeSource, rand::shuffle};

/// Number of entries in a [`StepTable`].
pub(crate) const STEP_TABLE_LEN: usize = 16;

/// Largest increment a step table may hold.
pub(crate) const MAX_STEP: u64 = 7;

/// The step table is reshuffled on every call whose index is a multiple of
/// this value.
pub(crate) const RESHUFFLE_EVERY: u64 = 50;

/// Base-sequence jumps are drawn from `[1, BASE_JUMP_BOUND)`.
const BASE_JUMP_BOUND: u64 = 10;

/// Per-instance increments applied to the sequence within one millisecond.
///
/// Every entry is in `1..=MAX_STEP`, so the sequence always moves forward; the
/// table only varies how far.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct StepTable {
    steps: [u64; STEP_TABLE_LEN],
}

impl StepTable {
    pub(crate) fn new<R: RandSource>(rng: &R) -> Self {
        let mut steps = [0; STEP_TABLE_LEN];
        for step in &mut steps {
            *step = 1 + rng.rand_below(MAX_STEP);
        }
        Self { steps }
    }

    /// Returns the step for a (monotonically increasing) call index.
    #[inline]
    pub(crate) fn step(&self, index: u64) -> u64 {
        self.steps[(index % STEP_TABLE_LEN as u64) as usize]
    }

    pub(crate) fn reshuffle<R: RandSource>(&mut self, rng: &R) {
        shuffle(&mut self.steps, rng);
    }

    #[cfg(test)]
    pub(crate) fn as_slice(&self) -> &[u64] {
        &self.steps
    }
}

/// What one advance hands to the encoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Tick {
    /// Wall-clock milliseconds of the issued slot.
    pub timestamp: u64,
    pub sequence: u64,
    /// Number of millisecond rollovers so far.
    pub call_counter: u64,
    /// Nanosecond reading latched at the last rollover.
    pub tick_nanos: u64,
}

/// Mutable state of one flexible generator.
///
/// The state lives only in memory and starts from zero on every
/// construction. Monotonicity holds within one continuous process lifetime
/// for one machine id; a restart within the same millisecond (or after the
/// clock was set back) may reissue low sequences at an equal or lower
/// timestamp. This boundary is known and left to the deployment.
///
/// `call_counter` counts millisecond rollovers, so the machine field and
/// filler derived from it hold still within a millisecond. The step-table
/// reshuffle runs on its own per-call count instead.
///
/// The only mutation is [`GeneratorState::advance`], which the generator
/// calls while holding its lock.
#[derive(Clone, Debug)]
pub(crate) struct GeneratorState {
    last_timestamp: u64,
    sequence: u64,
    step_index: u64,
    base_sequence: u64,
    call_counter: u64,
    calls: u64,
    tick_nanos: u64,
    steps: StepTable,
}

impl GeneratorState {
    pub(crate) fn new(steps: StepTable) -> Self {
        Self {
            last_timestamp: 0,
            sequence: 0,
            step_index: 0,
            base_sequence: 0,
            call_counter: 0,
            calls: 0,
            tick_nanos: 0,
            steps,
        }
    }

    /// Advances to the next (timestamp, sequence) slot.
    ///
    /// - Same millisecond: the sequence moves forward by the next table step.
    ///   If that would pass `max_sequence`, spin until the clock moves on and
    ///   roll over.
    /// - Later millisecond: roll over to a fresh base sequence.
    /// - Earlier millisecond: fail without touching the state.
    ///
    /// The overflow spin holds the caller's lock. It yields to the scheduler
    /// on each iteration and ends as soon as the clock ticks, which is within
    /// about one millisecond on a healthy clock.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ClockRegression`] if the clock reads earlier than the
    /// last issued timestamp, on entry or while waiting.
    pub(crate) fn advance<T, R>(&mut self, clock: &T, rng: &R, max_sequence: u64) -> Result<Tick, Error>
    where
        T: TimeSource,
        R: RandSource,
    {
        let now = clock.current_millis();
        match now.cmp(&self.last_timestamp) {
            Ordering::Equal => {
                let step = self.steps.step(self.step_index);
                self.step_index = self.step_index.wrapping_add(1);
                let next = self.sequence + step;
                if next <= max_sequence {
                    self.sequence = next;
                } else {
                    let now = self.wait_for_next_millis(clock)?;
                    self.rollover(now, clock, rng, max_sequence);
                }
            }
            Ordering::Greater => self.rollover(now, clock, rng, max_sequence),
            Ordering::Less => return Err(Self::cold_clock_behind(now, self.last_timestamp)),
        }

        self.calls = self.calls.wrapping_add(1);
        if self.calls % RESHUFFLE_EVERY == 0 {
            self.steps.reshuffle(rng);
            #[cfg(feature = "tracing")]
            tracing::trace!(calls = self.calls, "reshuffled step table");
        }

        Ok(Tick {
            timestamp: self.last_timestamp,
            sequence: self.sequence,
            call_counter: self.call_counter,
            tick_nanos: self.tick_nanos,
        })
    }

    fn rollover<T, R>(&mut self, now: u64, clock: &T, rng: &R, max_sequence: u64)
    where
        T: TimeSource,
        R: RandSource,
    {
        // Start in the lowest quarter so the millisecond has room to grow.
        let window = max_sequence / 4;
        let jump = 1 + rng.rand_below(BASE_JUMP_BOUND - 1);
        self.base_sequence = (self.base_sequence + jump) % window;
        self.sequence = self.base_sequence;
        self.last_timestamp = now;
        self.tick_nanos = clock.current_nanos();
        self.call_counter = self.call_counter.wrapping_add(1);
    }

    fn wait_for_next_millis<T: TimeSource>(&self, clock: &T) -> Result<u64, Error> {
        #[cfg(feature = "tracing")]
        tracing::trace!(last = self.last_timestamp, "sequence exhausted, waiting for clock");

        loop {
            let now = clock.current_millis();
            match now.cmp(&self.last_timestamp) {
                Ordering::Greater => return Ok(now),
                Ordering::Equal => std::thread::yield_now(),
                Ordering::Less => return Err(Self::cold_clock_behind(now, self.last_timestamp)),
            }
        }
    }

    #[cold]
    #[inline(never)]
    fn cold_clock_behind(now: u64, last: u64) -> Error {
        #[cfg(feature = "tracing")]
        tracing::warn!(now, last, "clock moved backwards, refusing to issue an id");
        Error::ClockRegression { now, last }
    }

    #[cfg(test)]
    pub(crate) fn steps(&self) -> &StepTable {
        &self.steps
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ThreadRandom;
    use std::cell::Cell;

    struct MockTime {
        millis: Cell<u64>,
    }

    impl TimeSource for MockTime {
        fn current_millis(&self) -> u64 {
            self.millis.get()
        }
    }

    /// Reports `millis` for the first `stall` reads, then `millis + 1`.
    struct StallingTime {
        millis: u64,
        stall: Cell<u32>,
    }

    impl TimeSource for StallingTime {
        fn current_millis(&self) -> u64 {
            let left = self.stall.get();
            if left == 0 {
                self.millis + 1
            } else {
                self.stall.set(left - 1);
                self.millis
            }
        }
    }

    struct Zeros;

    impl RandSource for Zeros {
        fn rand(&self) -> u64 {
            0
        }
    }

    #[test]
    fn step_table_entries_are_small_and_positive() {
        let mut table = StepTable::new(&ThreadRandom);
        for _ in 0..100 {
            assert!(table.as_slice().iter().all(|s| (1..=MAX_STEP).contains(s)));
            table.reshuffle(&ThreadRandom);
        }
    }

    #[test]
    fn reshuffle_preserves_the_steps() {
        let mut table = StepTable::new(&ThreadRandom);
        let mut before = table.as_slice().to_vec();
        table.reshuffle(&ThreadRandom);
        let mut after = table.as_slice().to_vec();
        before.sort_unstable();
        after.sort_unstable();
        assert_eq!(before, after);
    }

    #[test]
    fn first_advance_rolls_over() {
        let clock = MockTime {
            millis: Cell::new(1_000),
        };
        let mut state = GeneratorState::new(StepTable::new(&Zeros));
        let tick = state.advance(&clock, &Zeros, 255).unwrap();
        // jump = 1 + 0, window = 63
        assert_eq!(tick.timestamp, 1_000);
        assert_eq!(tick.sequence, 1);
        assert_eq!(tick.call_counter, 1);
    }

    #[test]
    fn same_millis_advances_by_table_steps() {
        let clock = MockTime {
            millis: Cell::new(1_000),
        };
        let mut state = GeneratorState::new(StepTable::new(&ThreadRandom));
        let mut last = state.advance(&clock, &ThreadRandom, 1023).unwrap();
        for i in 0..16 {
            let tick = state.advance(&clock, &ThreadRandom, 1023).unwrap();
            assert_eq!(tick.sequence - last.sequence, state.steps().step(i));
            assert_eq!(tick.call_counter, last.call_counter);
            last = tick;
        }
    }

    #[test]
    fn base_sequence_stays_in_lowest_quarter() {
        let clock = MockTime {
            millis: Cell::new(1),
        };
        let mut state = GeneratorState::new(StepTable::new(&ThreadRandom));
        for ms in 1..500 {
            clock.millis.set(ms);
            let tick = state.advance(&clock, &ThreadRandom, 255).unwrap();
            assert!(tick.sequence < 63);
        }
    }

    #[test]
    fn overflow_waits_for_next_millis() {
        let clock = StallingTime {
            millis: 5_000,
            stall: Cell::new(u32::MAX),
        };
        let mut state = GeneratorState::new(StepTable::new(&ThreadRandom));
        let first = state.advance(&clock, &ThreadRandom, 7).unwrap();
        assert_eq!(first.timestamp, 5_000);

        // max_sequence 7 allows at most 7 increments of at least 1 each
        let mut rolled = None;
        clock.stall.set(64);
        for _ in 0..8 {
            let tick = state.advance(&clock, &ThreadRandom, 7).unwrap();
            assert!(tick.sequence <= 7);
            if tick.timestamp == 5_001 {
                rolled = Some(tick);
                break;
            }
        }
        let rolled = rolled.expect("sequence never overflowed");
        assert_eq!(rolled.call_counter, 2);
        assert!(rolled.sequence < 7 / 4 + 1);
    }

    #[test]
    fn clock_regression_is_fatal() {
        let clock = MockTime {
            millis: Cell::new(2_000),
        };
        let mut state = GeneratorState::new(StepTable::new(&ThreadRandom));
        state.advance(&clock, &ThreadRandom, 255).unwrap();

        clock.millis.set(1_999);
        assert_eq!(
            state.advance(&clock, &ThreadRandom, 255),
            Err(Error::ClockRegression {
                now: 1_999,
                last: 2_000
            })
        );

        // nothing was consumed; the clock catching up resumes issuance
        clock.millis.set(2_000);
        assert!(state.advance(&clock, &ThreadRandom, 255).is_ok());
    }

    #[test]
    fn step_table_reshuffles_every_fifty_calls() {
        /// LCG that counts how many values it has handed out.
        struct Counting {
            state: Cell<u64>,
            draws: Cell<u64>,
        }
        impl RandSource for Counting {
            fn rand(&self) -> u64 {
                let v = self.state.get();
                self.state
                    .set(v.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1));
                self.draws.set(self.draws.get() + 1);
                v
            }
        }

        let rng = Counting {
            state: Cell::new(17),
            draws: Cell::new(0),
        };
        let clock = MockTime {
            millis: Cell::new(10),
        };
        let mut state = GeneratorState::new(StepTable::new(&rng));
        let initial = state.steps().clone();

        // first call rolls over (one draw), the rest stay in the same millisecond
        state.advance(&clock, &rng, u64::MAX >> 1).unwrap();
        let after_rollover = rng.draws.get();
        for _ in 1..RESHUFFLE_EVERY - 1 {
            state.advance(&clock, &rng, u64::MAX >> 1).unwrap();
        }
        assert_eq!(rng.draws.get(), after_rollover);
        assert_eq!(state.steps(), &initial);

        // the 50th call reshuffles without a rollover
        let tick = state.advance(&clock, &rng, u64::MAX >> 1).unwrap();
        assert_eq!(tick.call_counter, 1);
        assert_eq!(
            rng.draws.get() - after_rollover,
            STEP_TABLE_LEN as u64 - 1
        );
        let mut reshuffled = state.steps().as_slice().to_vec();
        let mut original = initial.as_slice().to_vec();
        reshuffled.sort_unstable();
        original.sort_unstable();
        assert_eq!(reshuffled, original);
    }

    #[test]
    fn clock_regression_does_not_count_as_a_call() {
        let clock = MockTime {
            millis: Cell::new(10),
        };
        let mut state = GeneratorState::new(StepTable::new(&Zeros));
        state.advance(&clock, &Zeros, 255).unwrap();
        clock.millis.set(9);
        for _ in 0..RESHUFFLE_EVERY {
            assert!(state.advance(&clock, &Zeros, 255).is_err());
        }
        assert_eq!(state.calls, 1);
    }
}

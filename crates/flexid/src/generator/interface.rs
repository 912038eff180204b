use core::fmt;

/// A minimal interface shared by every generator in this crate.
///
/// Generators render IDs to opaque strings. Callers invoke
/// [`IdGenerator::try_next_id`] once per new entity, before persisting it,
/// and use the result as the primary key.
pub trait IdGenerator {
    /// The error type returned by [`IdGenerator::try_next_id`].
    type Err: fmt::Debug;

    /// Generates the next ID with fallible error handling.
    ///
    /// # Errors
    ///
    /// Implementation defined. See the generator's own documentation.
    fn try_next_id(&self) -> Result<String, Self::Err>;

    /// Generates the next ID.
    ///
    /// This is the infallible counterpart to [`IdGenerator::try_next_id`],
    /// available only for generators that cannot fail.
    fn next_id(&self) -> String
    where
        Self::Err: Into<core::convert::Infallible>,
    {
        match self.try_next_id() {
            Ok(id) => id,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match e.into() {}
            }
        }
    }

    /// Generates `count` IDs by calling [`IdGenerator::try_next_id`]
    /// sequentially, stopping at the first failure.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by [`IdGenerator::try_next_id`].
    fn try_next_ids(&self, count: usize) -> Result<Vec<String>, Self::Err> {
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(self.try_next_id()?);
        }
        Ok(ids)
    }

    /// The infallible counterpart to [`IdGenerator::try_next_ids`].
    fn next_ids(&self, count: usize) -> Vec<String>
    where
        Self::Err: Into<core::convert::Infallible>,
    {
        match self.try_next_ids(count) {
            Ok(ids) => ids,
            Err(e) => {
                #[allow(unreachable_code)]
                // `into()` satisfies the trait bound at compile time.
                match e.into() {}
            }
        }
    }
}

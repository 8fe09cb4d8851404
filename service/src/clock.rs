//! [`Clock`] definitions.

use common::{Date, DateTime};

/// Source of the current moment for the [`Service`].
///
/// [`Service`]: crate::Service
#[derive(Clone, Copy, Debug, Default)]
pub enum Clock {
    /// Real system time.
    #[default]
    System,

    /// Time frozen at the provided [`DateTime`].
    Fixed(DateTime),
}

impl Clock {
    /// Returns the current [`DateTime`] according to this [`Clock`].
    #[must_use]
    pub fn now(&self) -> DateTime {
        match self {
            Self::System => DateTime::now(),
            Self::Fixed(at) => *at,
        }
    }

    /// Returns the current UTC [`Date`] according to this [`Clock`].
    #[must_use]
    pub fn today(&self) -> Date {
        self.now().date()
    }
}

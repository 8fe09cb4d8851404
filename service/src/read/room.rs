//! [`Room`]-related read definitions.

#[cfg(doc)]
use crate::domain::Room;

pub mod list {
    //! [`Room`] list definitions.

    use std::ops::RangeInclusive;

    use common::{define_pagination, Date, Money};
    use derive_more::{From, Into};

    use crate::domain::room;
    #[cfg(doc)]
    use crate::domain::Room;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = room::Id;

    /// Cursor pointing to a specific [`Room`] in a list.
    pub type Cursor = room::Id;

    /// Filter for [`Selector`].
    ///
    /// Only active [`Room`]s are ever listed.
    #[derive(Clone, Debug, Default)]
    pub struct Filter {
        /// Maximum [`room::DayPrice`] of a listed [`Room`].
        ///
        /// [`Room`]s priced in another currency are not listed.
        pub max_day_price: Option<Money>,

        /// Minimum [`room::Capacity`] of a listed [`Room`].
        pub min_capacity: Option<room::Capacity>,

        /// Range of days a listed [`Room`] must have at least one free day
        /// within.
        pub free_between: Option<RangeInclusive<Date>>,
    }

    /// Total count of [`Room`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}

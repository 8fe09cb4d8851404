//! [`Reservation`]-related read definitions.

use derive_more::{Deref, From, Into, IntoIterator};

use crate::domain::Reservation;
#[cfg(doc)]
use crate::domain::{reservation::Status, Room};

/// [`Reservation`]s of a single [`Room`] holding its days (being in
/// [`Status::Booked`] or [`Status::Active`]).
#[derive(Clone, Debug, Default, Deref, From, Into, IntoIterator)]
pub struct Holding(pub Vec<Reservation>);

/// [`Reservation`]s not being in a terminal [`Status`] yet.
#[derive(Clone, Debug, Default, Deref, From, Into, IntoIterator)]
pub struct Unfinished(pub Vec<Reservation>);

pub mod list {
    //! [`Reservation`] list definitions.

    use common::define_pagination;
    use derive_more::{From, Into};

    use crate::domain::{reservation, room, user};
    #[cfg(doc)]
    use crate::domain::Reservation;

    define_pagination!(Cursor, Node, Filter);

    /// Node in a [`Connection`].
    pub type Node = reservation::Id;

    /// Cursor pointing to a specific [`Reservation`] in a list.
    pub type Cursor = reservation::Id;

    /// Filter for [`Selector`].
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Filter {
        /// ID of the user owning listed [`Reservation`]s.
        pub user_id: Option<user::Id>,

        /// ID of the room listed [`Reservation`]s are made for.
        pub room_id: Option<room::Id>,
    }

    /// Total count of [`Reservation`] list items.
    #[derive(Clone, Copy, Debug, Eq, From, Hash, Into, PartialEq)]
    pub struct TotalCount(i32);
}

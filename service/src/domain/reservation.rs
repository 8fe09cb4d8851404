//! [`Reservation`] definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, Date, DateTimeOf};
use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{room, user};

/// Reservation of a [`Room`] by a [`User`] for a range of days.
///
/// [`Room`]: crate::domain::Room
/// [`User`]: crate::domain::user::Actor
#[derive(Clone, Debug)]
pub struct Reservation {
    /// ID of this [`Reservation`].
    pub id: Id,

    /// ID of the reserved [`Room`].
    ///
    /// [`Room`]: crate::domain::Room
    pub room_id: room::Id,

    /// ID of the [`User`] owning this [`Reservation`].
    ///
    /// [`User`]: crate::domain::user::Actor
    pub user_id: user::Id,

    /// [`DateTime`] this [`Reservation`] starts at.
    pub starts_at: StartDateTime,

    /// [`DateTime`] this [`Reservation`] ends at.
    pub ends_at: EndDateTime,

    /// Current [`Status`] of this [`Reservation`].
    pub status: Status,

    /// [`DateTime`] when this [`Reservation`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Reservation`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Reservation {
    /// Returns the UTC calendar [`Date`] this [`Reservation`] starts on.
    #[must_use]
    pub fn starts_on(&self) -> Date {
        self.starts_at.date()
    }

    /// Returns the UTC calendar [`Date`] this [`Reservation`] ends on.
    #[must_use]
    pub fn ends_on(&self) -> Date {
        self.ends_at.date()
    }

    /// Indicates whether this [`Reservation`] holds its days of the [`Room`].
    ///
    /// [`Room`]: crate::domain::Room
    #[must_use]
    pub fn is_holding(&self) -> bool {
        self.status.is_holding()
    }
}

/// ID of a [`Reservation`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

define_kind! {
    #[doc = "Status of a [`Reservation`]."]
    enum Status {
        #[doc = "Reservation is made, but its first day hasn't come yet."]
        Booked = 1,

        #[doc = "Reservation is in progress."]
        Active = 2,

        #[doc = "Reservation is over."]
        Expired = 3,

        #[doc = "Reservation is cancelled."]
        Refused = 4,
    }
}

impl Status {
    /// Indicates whether a [`Reservation`] in this [`Status`] holds its days
    /// of the [`Room`].
    ///
    /// [`Room`]: crate::domain::Room
    #[must_use]
    pub const fn is_holding(self) -> bool {
        matches!(self, Self::Booked | Self::Active)
    }

    /// Indicates whether this [`Status`] is final, so a [`Reservation`] never
    /// leaves it.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Refused)
    }
}

/// Change of a [`Reservation`]'s [`Status`].
///
/// Applied only if the [`Reservation`] is still in the `from` [`Status`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StatusTransition {
    /// ID of the [`Reservation`] to transition.
    pub id: Id,

    /// [`Status`] the [`Reservation`] is expected to be in.
    pub from: Status,

    /// [`Status`] to put the [`Reservation`] into.
    pub to: Status,

    /// [`DateTime`] of the transition.
    pub at: ModificationDateTime,
}

/// Moment a [`Reservation`] starts.
#[derive(Clone, Copy, Debug)]
pub struct Arrival;

/// Moment a [`Reservation`] ends.
#[derive(Clone, Copy, Debug)]
pub struct Departure;

/// [`DateTime`] when a [`Reservation`] starts.
pub type StartDateTime = DateTimeOf<(Reservation, Arrival)>;

/// [`DateTime`] when a [`Reservation`] ends.
pub type EndDateTime = DateTimeOf<(Reservation, Departure)>;

/// [`DateTime`] when a [`Reservation`] was created.
pub type CreationDateTime = DateTimeOf<(Reservation, unit::Creation)>;

/// [`DateTime`] when a [`Reservation`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Reservation, unit::Modification)>;

#[cfg(test)]
mod spec {
    use super::Status;

    #[test]
    fn classifies_statuses() {
        let holding = Status::ALL
            .iter()
            .filter(|s| s.is_holding())
            .copied()
            .collect::<Vec<_>>();
        let terminal = Status::ALL
            .iter()
            .filter(|s| s.is_terminal())
            .copied()
            .collect::<Vec<_>>();

        assert_eq!(holding, [Status::Booked, Status::Active]);
        assert_eq!(terminal, [Status::Expired, Status::Refused]);
    }

    #[test]
    fn keeps_storage_codes() {
        assert_eq!(Status::Booked.u8(), 1);
        assert_eq!(Status::Active.u8(), 2);
        assert_eq!(Status::Expired.u8(), 3);
        assert_eq!(Status::Refused.u8(), 4);
        assert_eq!(Status::from_u8(5), None);
    }
}

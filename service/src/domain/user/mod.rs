//! User identity definitions.
//!
//! Users are not stored by the service: a user is known only by the [`Id`]
//! and the [`Role`] carried in a verified [`Session`].

pub mod session;

use derive_more::{Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumString};
use uuid::Uuid;

pub use self::session::Session;

/// ID of a user.
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

/// Role of a user.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    EnumString,
    Eq,
    Hash,
    PartialEq,
    Serialize,
    StrumDisplay,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Regular user managing only their own reservations.
    #[default]
    Guest,

    /// Operator managing rooms and any reservation.
    Admin,
}

/// User performing an operation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Actor {
    /// ID of this [`Actor`].
    pub id: Id,

    /// [`Role`] of this [`Actor`].
    pub role: Role,
}

impl Actor {
    /// Indicates whether this [`Actor`] is an [`Role::Admin`].
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self.role, Role::Admin)
    }

    /// Checks whether this [`Actor`] is allowed to manage a resource owned by
    /// the user with the provided `owner` ID.
    ///
    /// Admins may manage any resource, while other users only their own ones.
    #[must_use]
    pub fn can_manage(&self, owner: Id) -> bool {
        self.is_admin() || self.id == owner
    }
}

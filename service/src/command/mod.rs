//! [`Command`] definition.

pub mod authorize_user_session;
pub mod cancel_reservation;
pub mod create_reservation;
pub mod create_room;
pub mod create_user_session;
pub mod update_reservation;
pub mod update_room;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    cancel_reservation::CancelReservation,
    create_reservation::CreateReservation, create_room::CreateRoom,
    create_user_session::CreateUserSession,
    update_reservation::UpdateReservation, update_room::UpdateRoom,
};

#[cfg(test)]
pub(crate) mod fixture {
    //! Shared setup of [`Command`] and [`Task`] tests.
    //!
    //! [`Task`]: crate::Task

    use std::time::Duration;

    use common::{Date, DateTime, DateTimeOf};

    use crate::{
        domain::{reservation, room, user, Reservation, Room},
        infra::database::Memory,
        task, Clock, Config, Service,
    };

    use super::{Command as _, CreateReservation, CreateRoom};

    /// Returns the [`Date`] the [`service()`] considers today.
    pub(crate) fn today() -> Date {
        Date::from_ymd(2024, 6, 10).unwrap()
    }

    /// Returns the [`Date`] the provided number of days after [`today()`].
    pub(crate) fn day(offset: i64) -> Date {
        today().checked_add_days(offset).unwrap()
    }

    /// Returns the midday of the [`day()`] with the provided offset.
    pub(crate) fn at<Of: ?Sized>(offset: i64) -> DateTimeOf<Of> {
        (DateTime::at_midnight(day(offset)) + Duration::from_secs(12 * 3600))
            .coerce()
    }

    /// Creates a new [`Service`] over an empty [`Memory`] database with the
    /// clock frozen at the midday of [`today()`].
    pub(crate) fn service() -> Service<Memory> {
        service_with_secret(b"secret")
    }

    /// Same as [`service()`], but signs tokens with the provided `secret`.
    pub(crate) fn service_with_secret(secret: &[u8]) -> Service<Memory> {
        Service::without_tasks(
            Config::with_secret(
                secret,
                Clock::Fixed(at(0)),
                task::advance_reservation_statuses::Config::default(),
            ),
            Memory::default(),
        )
    }

    /// Returns an admin [`user::Actor`].
    pub(crate) fn admin() -> user::Actor {
        user::Actor {
            id: user::Id::new(),
            role: user::Role::Admin,
        }
    }

    /// Returns a new guest [`user::Actor`].
    pub(crate) fn guest() -> user::Actor {
        user::Actor {
            id: user::Id::new(),
            role: user::Role::Guest,
        }
    }

    /// Returns the guest [`user::Actor`] owning the provided [`Reservation`].
    pub(crate) fn owner(reservation: &Reservation) -> user::Actor {
        user::Actor {
            id: reservation.user_id,
            role: user::Role::Guest,
        }
    }

    /// Returns the [`room::Hash`] of the provided `name` and `number`.
    pub(crate) fn hash(name: &str, number: &str) -> room::Hash {
        room::Hash::new(
            &room::Name::new(name).unwrap(),
            &room::Number::new(number).unwrap(),
        )
    }

    /// Returns a [`CreateRoom`] of an active refundable double room.
    pub(crate) fn new_room(name: &str, number: &str) -> CreateRoom {
        CreateRoom {
            actor: admin(),
            name: room::Name::new(name).unwrap(),
            number: room::Number::new(number).unwrap(),
            day_price: "120.50EUR".parse().unwrap(),
            bed_type: room::BedType::Double,
            rating: room::Rating::default(),
            refundable: true,
            active: true,
        }
    }

    /// Creates a new [`Room`] with the [`new_room()`] defaults.
    pub(crate) async fn room(
        svc: &Service<Memory>,
        name: &str,
        number: &str,
    ) -> Room {
        svc.execute(new_room(name, number)).await.unwrap()
    }

    /// Reserves the provided [`Room`] for the days between the provided
    /// offsets from [`today()`] by a new guest.
    pub(crate) async fn reservation(
        svc: &Service<Memory>,
        room_id: room::Id,
        start: i64,
        end: i64,
    ) -> Reservation {
        svc.execute(CreateReservation {
            actor: guest(),
            room_id,
            starts_at: at(start),
            ends_at: at(end),
        })
        .await
        .unwrap()
    }

    /// Returns a stored-like [`Reservation`] in the provided
    /// [`reservation::Status`], bypassing any checks.
    pub(crate) fn raw_reservation(
        room_id: room::Id,
        start: i64,
        end: i64,
        status: reservation::Status,
    ) -> Reservation {
        Reservation {
            id: reservation::Id::new(),
            room_id,
            user_id: user::Id::new(),
            starts_at: at(start),
            ends_at: at(end),
            status,
            created_at: at(-30),
            updated_at: at(-30),
        }
    }
}

//! [`Command`] for rescheduling an existing [`Reservation`].

use std::collections::BTreeSet;

use common::{
    operations::{By, Commit, Lock, Select, Transact, Transacted, Update},
    Date,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        availability::{self, DateRangeError},
        reservation, room, user, Reservation, Room,
    },
    infra::{database, Database},
    read, Service,
};

use super::Command;

/// [`Command`] for rescheduling an existing [`Reservation`].
///
/// Only the provided fields are changed. The [`Reservation`] itself never
/// conflicts with the days it already holds.
#[derive(Clone, Copy, Debug)]
pub struct UpdateReservation {
    /// [`user::Actor`] updating the [`Reservation`].
    pub actor: user::Actor,

    /// ID of the [`Reservation`] to update.
    pub id: reservation::Id,

    /// ID of the [`Room`] to move the [`Reservation`] into.
    pub room_id: Option<room::Id>,

    /// New [`reservation::StartDateTime`] of the [`Reservation`].
    pub starts_at: Option<reservation::StartDateTime>,

    /// New [`reservation::EndDateTime`] of the [`Reservation`].
    pub ends_at: Option<reservation::EndDateTime>,
}

impl<Db> Command<UpdateReservation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Reservation>, reservation::Id>>,
            Ok = Option<Reservation>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::reservation::Holding, room::Id>>,
            Ok = read::reservation::Holding,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<Update<Reservation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateReservation {
            actor,
            id,
            room_id,
            starts_at,
            ends_at,
        } = cmd;

        let now = self.clock().now();
        let today = now.date();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Both the current and the target `Room`s are locked, in a stable
        // order. The `Reservation` is re-read under the locks, and the
        // locking is repeated if it has been moved meanwhile.
        let mut reservation = loop {
            let seen = tx
                .execute(Select(By::<Option<Reservation>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| tracerr::new!(E::ReservationNotExists(id)))?;

            let rooms = [seen.room_id, room_id.unwrap_or(seen.room_id)]
                .into_iter()
                .collect::<BTreeSet<_>>();
            for room in rooms {
                tx.execute(Lock(By::<Room, _>::new(room)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
            }

            let locked = tx
                .execute(Select(By::<Option<Reservation>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| tracerr::new!(E::ReservationNotExists(id)))?;
            if locked.room_id == seen.room_id {
                break locked;
            }
        };

        if !actor.can_manage(reservation.user_id) {
            return Err(tracerr::new!(E::NotPermitted(actor.id)));
        }
        if reservation.status.is_terminal() {
            return Err(tracerr::new!(E::ReservationFinished(id)));
        }

        let start = starts_at
            .map_or_else(|| reservation.starts_on(), |s| s.date());
        let end =
            ends_at.map_or_else(|| reservation.ends_on(), |e| e.date());
        if starts_at.is_some() || ends_at.is_some() {
            // A start day that has already passed is kept as is.
            let checked_start =
                if starts_at.is_some() { start } else { start.max(today) };
            availability::validate_date_range(checked_start, end, today)
                .map_err(tracerr::from_and_wrap!(=> E))?;
        }

        let target = room_id.unwrap_or(reservation.room_id);
        let room = tx
            .execute(Select(By::<Option<Room>, _>::new(target)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::RoomNotExists(target)))?;
        if !room.active {
            return Err(tracerr::new!(E::RoomInactive(target)));
        }

        let holding = tx
            .execute(Select(
                By::<read::reservation::Holding, _>::new(target),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let conflict =
            availability::check_conflict(&*holding, start, end, Some(id));
        if !conflict.is_empty() {
            return Err(tracerr::new!(E::Conflict(conflict)));
        }

        reservation.room_id = target;
        if let Some(starts_at) = starts_at {
            reservation.starts_at = starts_at;
        }
        if let Some(ends_at) = ends_at {
            reservation.ends_at = ends_at;
        }
        reservation.updated_at = now.coerce();

        tx.execute(Update(reservation.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(reservation)
    }
}

/// Error of [`UpdateReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`Reservation`] with the provided ID does not exist.
    #[display("`Reservation(id: {_0})` does not exist")]
    ReservationNotExists(#[error(not(source))] reservation::Id),

    /// [`user::Actor`] is not allowed to manage the [`Reservation`].
    #[display("`User(id: {_0})` is not permitted to manage the reservation")]
    NotPermitted(#[error(not(source))] user::Id),

    /// [`Reservation`] is already in a terminal [`reservation::Status`].
    #[display("`Reservation(id: {_0})` is finished")]
    ReservationFinished(#[error(not(source))] reservation::Id),

    /// Requested range of days can't be booked.
    #[display("Invalid date range: {_0}")]
    #[from]
    DateRange(DateRangeError),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    RoomNotExists(#[error(not(source))] room::Id),

    /// [`Room`] doesn't accept reservations.
    #[display("`Room(id: {_0})` is inactive")]
    RoomInactive(#[error(not(source))] room::Id),

    /// Requested days are already reserved.
    #[display("{} day(s) are already reserved", _0.len())]
    Conflict(#[error(not(source))] BTreeSet<Date>),
}

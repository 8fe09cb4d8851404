//! [`Command`] for creating a new [`Reservation`].

use std::collections::BTreeSet;

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
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

/// [`Command`] for creating a new [`Reservation`].
#[derive(Clone, Copy, Debug)]
pub struct CreateReservation {
    /// [`user::Actor`] making the [`Reservation`].
    pub actor: user::Actor,

    /// ID of the [`Room`] to reserve.
    pub room_id: room::Id,

    /// [`reservation::StartDateTime`] of a new [`Reservation`].
    pub starts_at: reservation::StartDateTime,

    /// [`reservation::EndDateTime`] of a new [`Reservation`].
    pub ends_at: reservation::EndDateTime,
}

impl<Db> Command<CreateReservation> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<read::reservation::Holding, room::Id>>,
            Ok = read::reservation::Holding,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<Insert<Reservation>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateReservation {
            actor,
            room_id,
            starts_at,
            ends_at,
        } = cmd;

        let now = self.clock().now();
        let (start, end) = (starts_at.date(), ends_at.date());
        availability::validate_date_range(start, end, now.date())
            .map_err(tracerr::from_and_wrap!(=> E))?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Serialize bookings of the same `Room`.
        tx.execute(Lock(By::<Room, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let room = tx
            .execute(Select(By::<Option<Room>, _>::new(room_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::RoomNotExists(room_id)))?;
        if !room.active {
            return Err(tracerr::new!(E::RoomInactive(room_id)));
        }

        let holding = tx
            .execute(Select(
                By::<read::reservation::Holding, _>::new(room_id),
            ))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        let conflict =
            availability::check_conflict(&*holding, start, end, None);
        if !conflict.is_empty() {
            return Err(tracerr::new!(E::Conflict(conflict)));
        }

        let reservation = Reservation {
            id: reservation::Id::new(),
            room_id,
            user_id: actor.id,
            starts_at,
            ends_at,
            status: reservation::Status::Booked,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };
        tx.execute(Insert(reservation.clone()))
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

/// Error of [`CreateReservation`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

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

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, CreateReservation, UpdateRoom},
        domain::{availability::DateRangeError, reservation},
        Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn books_free_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        let guest = fixture::guest();

        let reservation = svc
            .execute(CreateReservation {
                actor: guest,
                room_id: room.id,
                starts_at: fixture::at(0),
                ends_at: fixture::at(2),
            })
            .await
            .unwrap();

        assert_eq!(reservation.status, reservation::Status::Booked);
        assert_eq!(reservation.user_id, guest.id);
        assert_eq!(reservation.starts_on(), fixture::day(0));
        assert_eq!(reservation.ends_on(), fixture::day(2));
    }

    #[tokio::test]
    async fn rejects_overlapping_days() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        drop(fixture::reservation(&svc, room.id, 3, 5).await);

        let err = svc
            .execute(CreateReservation {
                actor: fixture::guest(),
                room_id: room.id,
                starts_at: fixture::at(5),
                ends_at: fixture::at(7),
            })
            .await
            .unwrap_err();

        match err.as_ref() {
            E::Conflict(days) => {
                assert_eq!(days.iter().copied().collect::<Vec<_>>(), [
                    fixture::day(5)
                ]);
            }
            e => panic!("unexpected error: {e}"),
        }
    }

    #[tokio::test]
    async fn books_adjacent_days() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        drop(fixture::reservation(&svc, room.id, 3, 5).await);

        drop(fixture::reservation(&svc, room.id, 6, 8).await);
        drop(fixture::reservation(&svc, room.id, 1, 2).await);
    }

    #[tokio::test]
    async fn validates_date_range() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        let book = |start, end| CreateReservation {
            actor: fixture::guest(),
            room_id: room.id,
            starts_at: fixture::at(start),
            ends_at: fixture::at(end),
        };

        let err = svc.execute(book(-1, 2)).await.unwrap_err();
        assert!(
            matches!(err.as_ref(), E::DateRange(DateRangeError::InPast(_))),
            "{err}",
        );

        let err = svc.execute(book(10, 15)).await.unwrap_err();
        assert!(
            matches!(err.as_ref(), E::DateRange(DateRangeError::TooFar(_))),
            "{err}",
        );

        let err = svc.execute(book(5, 3)).await.unwrap_err();
        assert!(
            matches!(
                err.as_ref(),
                E::DateRange(DateRangeError::Inverted { .. }),
            ),
            "{err}",
        );

        drop(svc.execute(book(0, 14)).await.unwrap());
    }

    #[tokio::test]
    async fn rejects_inactive_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        drop(
            svc.execute(UpdateRoom {
                actor: fixture::admin(),
                id: room.id,
                name: None,
                number: None,
                day_price: None,
                bed_type: None,
                rating: None,
                refundable: None,
                active: Some(false),
            })
            .await
            .unwrap(),
        );

        let err = svc
            .execute(CreateReservation {
                actor: fixture::guest(),
                room_id: room.id,
                starts_at: fixture::at(1),
                ends_at: fixture::at(2),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::RoomInactive(_)), "{err}");
    }

    #[tokio::test]
    async fn allows_single_of_concurrent_overlapping_bookings() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        let book = |start, end| CreateReservation {
            actor: fixture::guest(),
            room_id: room.id,
            starts_at: fixture::at(start),
            ends_at: fixture::at(end),
        };

        let (a, b) =
            tokio::join!(svc.execute(book(2, 4)), svc.execute(book(4, 6)));

        assert!(a.is_ok() != b.is_ok(), "exactly one must succeed");
        let err = a.err().or(b.err()).unwrap();
        assert!(matches!(err.as_ref(), E::Conflict(_)), "{err}");
    }
}

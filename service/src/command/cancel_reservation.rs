//! [`Command`] for cancelling a [`Reservation`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        reservation::{self, Status, StatusTransition},
        room, user, Reservation, Room,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for cancelling a [`Reservation`], putting it into the
/// [`Status::Refused`].
#[derive(Clone, Copy, Debug)]
pub struct CancelReservation {
    /// [`user::Actor`] cancelling the [`Reservation`].
    pub actor: user::Actor,

    /// ID of the [`Reservation`] to cancel.
    pub id: reservation::Id,
}

impl<Db> Command<CancelReservation> for Service<Db>
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
            Update<StatusTransition>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Reservation;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CancelReservation,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CancelReservation { actor, id } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let mut locked = None;
        // `Status` may be advanced concurrently, so the transition is retried
        // until it's applied or the `Reservation` becomes finished.
        let reservation = loop {
            let mut reservation = tx
                .execute(Select(By::<Option<Reservation>, _>::new(id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| tracerr::new!(E::ReservationNotExists(id)))?;

            if locked != Some(reservation.room_id) {
                tx.execute(Lock(By::<Room, _>::new(reservation.room_id)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))
                    .map(drop)?;
                locked = Some(reservation.room_id);
                continue;
            }

            if !actor.can_manage(reservation.user_id) {
                return Err(tracerr::new!(E::NotPermitted(actor.id)));
            }
            if reservation.status.is_terminal() {
                return Err(tracerr::new!(E::ReservationFinished(id)));
            }

            let room = tx
                .execute(Select(By::<Option<Room>, _>::new(
                    reservation.room_id,
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or_else(|| {
                    tracerr::new!(E::RoomNotExists(reservation.room_id))
                })?;
            if !room.refundable {
                return Err(tracerr::new!(E::RoomUnrefundable(
                    reservation.room_id
                )));
            }

            let transition = StatusTransition {
                id,
                from: reservation.status,
                to: Status::Refused,
                at: self.clock().now().coerce(),
            };
            let applied = tx
                .execute(Update(transition))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if applied {
                reservation.status = transition.to;
                reservation.updated_at = transition.at;
                break reservation;
            }
        };

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(reservation)
    }
}

/// Error of [`CancelReservation`] [`Command`] execution.
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

    /// [`Reservation`] is already in a terminal [`Status`].
    #[display("`Reservation(id: {_0})` is finished")]
    ReservationFinished(#[error(not(source))] reservation::Id),

    /// [`Room`] of the [`Reservation`] does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    RoomNotExists(#[error(not(source))] room::Id),

    /// Reservations of the [`Room`] can't be cancelled.
    #[display("`Room(id: {_0})` is not refundable")]
    RoomUnrefundable(#[error(not(source))] room::Id),
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::{fixture, CancelReservation, CreateRoom},
        domain::{
            reservation::{self, Status},
            room,
        },
        infra::Database as _,
        Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn refuses_reservation_and_releases_days() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        let reservation = fixture::reservation(&svc, room.id, 3, 5).await;

        let cancelled = svc
            .execute(CancelReservation {
                actor: fixture::owner(&reservation),
                id: reservation.id,
            })
            .await
            .unwrap();
        assert_eq!(cancelled.status, Status::Refused);

        drop(fixture::reservation(&svc, room.id, 3, 5).await);
    }

    #[tokio::test]
    async fn rejects_second_cancellation() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        let reservation = fixture::reservation(&svc, room.id, 3, 5).await;
        let cancel = CancelReservation {
            actor: fixture::admin(),
            id: reservation.id,
        };

        drop(svc.execute(cancel).await.unwrap());
        let err = svc.execute(cancel).await.unwrap_err();

        assert!(matches!(err.as_ref(), E::ReservationFinished(_)), "{err}");
    }

    #[tokio::test]
    async fn rejects_unrefundable_room() {
        let svc = fixture::service();
        let room = svc
            .execute(CreateRoom {
                refundable: false,
                ..fixture::new_room("Sea View", "101")
            })
            .await
            .unwrap();
        let reservation = fixture::reservation(&svc, room.id, 3, 5).await;

        let err = svc
            .execute(CancelReservation {
                actor: fixture::owner(&reservation),
                id: reservation.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::RoomUnrefundable(_)), "{err}");
    }

    #[tokio::test]
    async fn rejects_reservation_of_unknown_room() {
        let svc = fixture::service();
        let reservation = fixture::raw_reservation(
            room::Id::new(),
            3,
            5,
            Status::Booked,
        );
        svc.database()
            .execute(Insert(reservation.clone()))
            .await
            .unwrap();

        let err = svc
            .execute(CancelReservation {
                actor: fixture::admin(),
                id: reservation.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::RoomNotExists(_)), "{err}");
    }

    #[tokio::test]
    async fn checks_permissions() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        let reservation = fixture::reservation(&svc, room.id, 3, 5).await;

        let err = svc
            .execute(CancelReservation {
                actor: fixture::guest(),
                id: reservation.id,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::NotPermitted(_)), "{err}");
    }

    #[tokio::test]
    async fn rejects_unknown_reservation() {
        let svc = fixture::service();

        let err = svc
            .execute(CancelReservation {
                actor: fixture::admin(),
                id: reservation::Id::new(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::ReservationNotExists(_)), "{err}");
    }
}

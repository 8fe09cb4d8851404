//! [`AdvanceReservationStatuses`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Select, Start, Update};
use smart_default::SmartDefault;
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{availability, reservation::StatusTransition},
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`AdvanceReservationStatuses`] [`Task`].
#[derive(Clone, Copy, Debug, SmartDefault)]
pub struct Config {
    /// Interval between [`Reservation`] statuses reconciliations.
    ///
    /// [`Reservation`]: crate::domain::Reservation
    #[default(time::Duration::from_secs(20))]
    pub interval: time::Duration,
}

/// [`Task`] moving [`Reservation`]s through their statuses as days pass.
///
/// [`Reservation`]: crate::domain::Reservation
#[derive(Clone, Copy, Debug)]
pub struct AdvanceReservationStatuses<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<AdvanceReservationStatuses<Self>, Config>>>
    for Service<Db>
where
    AdvanceReservationStatuses<Service<Db>>:
        Task<Perform<()>, Ok = usize, Err: Error>,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<AdvanceReservationStatuses<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = AdvanceReservationStatuses {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            _ = task.execute(Perform(())).await.map_err(|e| {
                log::error!("`task::AdvanceReservationStatuses` failed: {e}");
            });
        }
    }
}

impl<Db> Task<Perform<()>> for AdvanceReservationStatuses<Service<Db>>
where
    Db: Database<
            Select<By<read::reservation::Unfinished, ()>>,
            Ok = read::reservation::Unfinished,
            Err = Traced<database::Error>,
        > + Database<
            Update<StatusTransition>,
            Ok = bool,
            Err = Traced<database::Error>,
        >,
{
    /// Number of applied [`StatusTransition`]s.
    type Ok = usize;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        let now = self.service.clock().now();
        let today = now.date();

        let transitions = self
            .service
            .database()
            .execute(Select(By::new(())))
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .filter_map(|r| {
                availability::advance_status(r, today).map(|to| {
                    StatusTransition {
                        id: r.id,
                        from: r.status,
                        to,
                        at: now.coerce(),
                    }
                })
            })
            .collect::<Vec<_>>();

        let mut applied = 0;
        for transition in transitions {
            let StatusTransition { id, from, to, .. } = transition;
            match self.service.database().execute(Update(transition)).await {
                Ok(true) => {
                    applied += 1;
                    log::debug!(
                        "`Reservation(id: {id})` status advanced: \
                         {from} -> {to}",
                    );
                }
                // Changed concurrently, so will be reconsidered next time.
                Ok(false) => {}
                Err(e) => {
                    log::error!(
                        "Failed to advance `Reservation(id: {id})` status: {e}",
                    );
                }
            }
        }

        Ok(applied)
    }
}

/// Error of [`AdvanceReservationStatuses`] execution.
pub type ExecutionError = Traced<database::Error>;

#[cfg(test)]
mod spec {
    use common::operations::{By, Insert, Perform, Select, Update};

    use crate::{
        command::fixture,
        domain::{
            reservation::{self, Status, StatusTransition},
            room, Reservation,
        },
        infra::{database::Memory, Database as _},
        Service, Task as _,
    };

    use super::{AdvanceReservationStatuses, Config};

    async fn insert(svc: &Service<Memory>, reservation: &Reservation) {
        svc.database()
            .execute(Insert(reservation.clone()))
            .await
            .unwrap();
    }

    async fn status(svc: &Service<Memory>, id: reservation::Id) -> Status {
        svc.database()
            .execute(Select(By::<Option<Reservation>, _>::new(id)))
            .await
            .unwrap()
            .unwrap()
            .status
    }

    fn task(
        svc: &Service<Memory>,
    ) -> AdvanceReservationStatuses<Service<Memory>> {
        AdvanceReservationStatuses {
            config: Config::default(),
            service: svc.clone(),
        }
    }

    #[tokio::test]
    async fn advances_statuses_by_today() {
        let svc = fixture::service();
        let room = room::Id::new();
        let raw = |start, end, status| {
            fixture::raw_reservation(room, start, end, status)
        };

        let starting = raw(0, 2, Status::Booked);
        let upcoming = raw(1, 2, Status::Booked);
        let ended = raw(-3, -1, Status::Active);
        let ending = raw(-3, 0, Status::Active);
        let missed = raw(-5, -2, Status::Booked);
        let refused = raw(-5, -2, Status::Refused);
        for r in [&starting, &upcoming, &ended, &ending, &missed, &refused] {
            insert(&svc, r).await;
        }

        let applied = task(&svc).execute(Perform(())).await.unwrap();

        assert_eq!(applied, 3);
        assert_eq!(status(&svc, starting.id).await, Status::Active);
        assert_eq!(status(&svc, upcoming.id).await, Status::Booked);
        assert_eq!(status(&svc, ended.id).await, Status::Expired);
        assert_eq!(status(&svc, ending.id).await, Status::Active);
        assert_eq!(status(&svc, missed.id).await, Status::Expired);
        assert_eq!(status(&svc, refused.id).await, Status::Refused);
    }

    #[tokio::test]
    async fn is_idempotent_within_a_day() {
        let svc = fixture::service();
        let room = room::Id::new();
        insert(&svc, &fixture::raw_reservation(room, 0, 1, Status::Booked))
            .await;
        insert(&svc, &fixture::raw_reservation(room, -4, -2, Status::Active))
            .await;

        assert_eq!(task(&svc).execute(Perform(())).await.unwrap(), 2);
        assert_eq!(task(&svc).execute(Perform(())).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn never_overwrites_changed_status() {
        let svc = fixture::service();
        let reservation =
            fixture::raw_reservation(room::Id::new(), 0, 1, Status::Refused);
        insert(&svc, &reservation).await;

        let applied = svc
            .database()
            .execute(Update(StatusTransition {
                id: reservation.id,
                from: Status::Booked,
                to: Status::Active,
                at: fixture::at(0),
            }))
            .await
            .unwrap();

        assert!(!applied);
        assert_eq!(status(&svc, reservation.id).await, Status::Refused);
    }
}

//! [`Query`] collection related to a single [`Room`].

use std::collections::BTreeSet;

use common::{
    operations::{By, Select},
    Date,
};
use tracerr::Traced;

use crate::{
    domain::{availability, room, Room},
    infra::{database, Database},
    read, Query, Service,
};

use super::DatabaseQuery;

/// Queries a [`Room`] by its [`room::Id`].
pub type ById = DatabaseQuery<By<Option<Room>, room::Id>>;

/// [`Query`] for the days of a [`Room`] held by its reservations, starting
/// from today.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct OccupiedDays {
    /// ID of the [`Room`] to query the days of.
    pub room_id: room::Id,
}

impl<Db> Query<OccupiedDays> for Service<Db>
where
    Db: Database<
        Select<By<read::reservation::Holding, room::Id>>,
        Ok = read::reservation::Holding,
        Err = Traced<database::Error>,
    >,
{
    type Ok = BTreeSet<Date>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        OccupiedDays { room_id }: OccupiedDays,
    ) -> Result<Self::Ok, Self::Err> {
        let holding = self
            .database()
            .execute(Select(By::new(room_id)))
            .await
            .map_err(tracerr::wrap!())?;

        let mut days = availability::room_occupied_days(holding.iter(), None);
        Ok(days.split_off(&self.clock().today()))
    }
}

#[cfg(test)]
mod spec {
    use common::operations::Insert;

    use crate::{
        command::{fixture, CancelReservation},
        domain::reservation::Status,
        infra::Database as _,
        Command as _, Query as _,
    };

    use super::OccupiedDays;

    #[tokio::test]
    async fn lists_held_days_from_today() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;
        drop(fixture::reservation(&svc, room.id, 1, 2).await);
        drop(fixture::reservation(&svc, room.id, 4, 4).await);
        let cancelled = fixture::reservation(&svc, room.id, 6, 7).await;
        drop(
            svc.execute(CancelReservation {
                actor: fixture::admin(),
                id: cancelled.id,
            })
            .await
            .unwrap(),
        );
        svc.database()
            .execute(Insert(fixture::raw_reservation(
                room.id,
                -2,
                0,
                Status::Active,
            )))
            .await
            .unwrap();

        let days = svc
            .execute(OccupiedDays { room_id: room.id })
            .await
            .unwrap();

        assert_eq!(
            days.into_iter().collect::<Vec<_>>(),
            [0, 1, 2, 4].map(fixture::day),
        );
    }
}

//! In-memory [`Database`] implementation for tests.
//!
//! Writes are applied immediately, so a transaction only holds its [`Lock`]s
//! until committed or dropped and is never rolled back. Every operation
//! yields to the runtime first, letting concurrent executions interleave.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Update},
    pagination,
};
use tokio::{sync, task};
use tracerr::Traced;

use crate::{
    domain::{
        availability, reservation, reservation::StatusTransition, room,
        Reservation, Room,
    },
    infra::{database, Database},
    read,
};

/// In-memory [`Database`].
///
/// Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored data.
    state: Arc<Mutex<State>>,

    /// Locks serializing transactions over the same [`LockKey`].
    locks: Arc<Mutex<HashMap<LockKey, Arc<sync::Mutex<()>>>>>,

    /// Guards of the `locks` acquired by the current transaction, if any.
    held: Option<Arc<Mutex<HashMap<LockKey, sync::OwnedMutexGuard<()>>>>>,
}

/// Scope of a [`Lock`] taken in a [`Memory`] database.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum LockKey {
    /// [`Room`] with the provided ID.
    Room(room::Id),

    /// Creation of a [`Room`] with the provided [`room::Hash`].
    Creation(room::Hash),
}

/// Data stored in a [`Memory`] database.
#[derive(Debug, Default)]
struct State {
    /// Stored [`Room`]s.
    rooms: BTreeMap<room::Id, Room>,

    /// Stored [`Reservation`]s.
    reservations: BTreeMap<reservation::Id, Reservation>,
}

impl Memory {
    /// Returns the stored [`State`] after yielding to the runtime.
    async fn state(&self) -> MutexGuard<'_, State> {
        task::yield_now().await;
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires the lock of the provided [`LockKey`] for the current
    /// transaction, if it's not acquired yet.
    ///
    /// Does nothing outside a transaction.
    async fn acquire(&self, key: LockKey) {
        let Some(held) = &self.held else {
            return;
        };
        if held
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&key)
        {
            return;
        }
        let lock = Arc::clone(
            self.locks
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(key)
                .or_default(),
        );
        let guard = lock.lock_owned().await;
        drop(
            held.lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key, guard),
        );
    }

    /// Selects a [`pagination::Page`] of the provided `ids` sorted in the
    /// ascending order.
    fn page<I: Copy + Ord>(
        arguments: &pagination::Arguments<I>,
        ids: impl DoubleEndedIterator<Item = I>,
    ) -> pagination::Page<I, I> {
        let direction = arguments.direction();
        let ids: Box<dyn Iterator<Item = I>> = match direction {
            pagination::Direction::Forward => Box::new(ids),
            pagination::Direction::Backward => Box::new(ids.rev()),
        };
        pagination::Page::new(
            arguments,
            ids.filter(|id| {
                arguments.cursor().map_or(true, |c| direction.is_past(id, c))
            })
            .map(|id| (id, id)),
        )
    }
}

impl Database<Transact> for Memory {
    type Ok = Self;
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Transact) -> Result<Self::Ok, Self::Err> {
        let mut tx = self.clone();
        if tx.held.is_none() {
            tx.held = Some(Arc::default());
        }
        Ok(tx)
    }
}

impl Database<Commit> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(&self, _: Commit) -> Result<Self::Ok, Self::Err> {
        if let Some(held) = &self.held {
            held.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
        Ok(())
    }
}

impl Database<Select<By<Option<Room>, room::Id>>> for Memory {
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.rooms.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Room>, room::Hash>>> for Memory {
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        let hash = by.into_inner();
        Ok(self
            .state()
            .await
            .rooms
            .values()
            .find(|r| r.hash == hash)
            .cloned())
    }
}

impl Database<Insert<Room>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(room)).await
    }
}

impl Database<Update<Room>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(self.state().await.rooms.insert(room.id, room));
        Ok(())
    }
}

impl Database<Lock<By<Room, room::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.acquire(LockKey::Room(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Lock<By<Room, room::Hash>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.acquire(LockKey::Creation(by.into_inner())).await;
        Ok(())
    }
}

impl Database<Select<By<read::room::list::Page, read::room::list::Selector>>>
    for Memory
{
    type Ok = read::room::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::room::list::Page, read::room::list::Selector>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::room::list::Selector { arguments, filter } = by.into_inner();
        let state = self.state().await;
        let ids = state
            .rooms
            .values()
            .filter(|r| state.is_listed(r, &filter))
            .map(|r| r.id)
            .collect::<Vec<_>>();
        Ok(Self::page(&arguments, ids.into_iter()))
    }
}

impl
    Database<
        Select<By<read::room::list::TotalCount, read::room::list::Filter>>,
    > for Memory
{
    type Ok = read::room::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<read::room::list::TotalCount, read::room::list::Filter>,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let state = self.state().await;
        let count = state
            .rooms
            .values()
            .filter(|r| state.is_listed(r, &filter))
            .count();
        Ok(i32::try_from(count).unwrap_or(i32::MAX).into())
    }
}

impl State {
    /// Checks whether the provided [`Room`] passes the given
    /// [`read::room::list::Filter`].
    fn is_listed(
        &self,
        room: &Room,
        filter: &read::room::list::Filter,
    ) -> bool {
        let read::room::list::Filter {
            max_day_price,
            min_capacity,
            free_between,
        } = filter;

        let price_fits = max_day_price.map_or(true, |max| {
            room.day_price
                .money()
                .compare(&max)
                .is_some_and(std::cmp::Ordering::is_le)
        });
        let capacity_fits = min_capacity.map_or(true, |c| room.capacity >= c);
        let has_free_day = free_between.as_ref().map_or(true, |range| {
            let occupied = availability::room_occupied_days(
                self.reservations.values().filter(|r| r.room_id == room.id),
                None,
            );
            availability::occupied_days(*range.start(), *range.end())
                .any(|d| !occupied.contains(&d))
        });

        room.active && price_fits && capacity_fits && has_free_day
    }
}

impl Database<Select<By<Option<Reservation>, reservation::Id>>> for Memory {
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .await
            .reservations
            .get(&by.into_inner())
            .cloned())
    }
}

impl Database<Select<By<read::reservation::Holding, room::Id>>> for Memory {
    type Ok = read::reservation::Holding;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::reservation::Holding, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let room_id = by.into_inner();
        Ok(self
            .state()
            .await
            .reservations
            .values()
            .filter(|r| r.room_id == room_id && r.is_holding())
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }
}

impl Database<Select<By<read::reservation::Unfinished, ()>>> for Memory {
    type Ok = read::reservation::Unfinished;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::reservation::Unfinished, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self
            .state()
            .await
            .reservations
            .values()
            .filter(|r| !r.status.is_terminal())
            .cloned()
            .collect::<Vec<_>>()
            .into())
    }
}

impl Database<Insert<Reservation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        drop(
            self.state()
                .await
                .reservations
                .insert(reservation.id, reservation),
        );
        Ok(())
    }
}

impl Database<Update<Reservation>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        if let Some(stored) = state.reservations.get_mut(&reservation.id) {
            stored.room_id = reservation.room_id;
            stored.starts_at = reservation.starts_at;
            stored.ends_at = reservation.ends_at;
            stored.updated_at = reservation.updated_at;
        }
        Ok(())
    }
}

impl Database<Update<StatusTransition>> for Memory {
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(transition): Update<StatusTransition>,
    ) -> Result<Self::Ok, Self::Err> {
        let StatusTransition { id, from, to, at } = transition;
        let mut state = self.state().await;
        Ok(state
            .reservations
            .get_mut(&id)
            .filter(|r| r.status == from)
            .map(|r| {
                r.status = to;
                r.updated_at = at;
            })
            .is_some())
    }
}

impl
    Database<
        Select<
            By<
                read::reservation::list::Page,
                read::reservation::list::Selector,
            >,
        >,
    > for Memory
{
    type Ok = read::reservation::list::Page;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::reservation::list::Page,
                read::reservation::list::Selector,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let read::reservation::list::Selector { arguments, filter } =
            by.into_inner();
        let ids = self
            .state()
            .await
            .reservations
            .values()
            .filter(|r| is_listed(r, filter))
            .map(|r| r.id)
            .collect::<Vec<_>>();
        Ok(Self::page(&arguments, ids.into_iter()))
    }
}

impl
    Database<
        Select<
            By<
                read::reservation::list::TotalCount,
                read::reservation::list::Filter,
            >,
        >,
    > for Memory
{
    type Ok = read::reservation::list::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<
            By<
                read::reservation::list::TotalCount,
                read::reservation::list::Filter,
            >,
        >,
    ) -> Result<Self::Ok, Self::Err> {
        let filter = by.into_inner();
        let count = self
            .state()
            .await
            .reservations
            .values()
            .filter(|r| is_listed(r, filter))
            .count();
        Ok(i32::try_from(count).unwrap_or(i32::MAX).into())
    }
}

/// Checks whether the provided [`Reservation`] passes the given
/// [`read::reservation::list::Filter`].
fn is_listed(
    reservation: &Reservation,
    filter: read::reservation::list::Filter,
) -> bool {
    let read::reservation::list::Filter { user_id, room_id } = filter;
    user_id.map_or(true, |id| reservation.user_id == id)
        && room_id.map_or(true, |id| reservation.room_id == id)
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Commit, Lock, Transact};
    use futures::FutureExt as _;

    use crate::{
        domain::{room, Room},
        infra::Database as _,
    };

    use super::Memory;

    #[tokio::test]
    async fn locks_each_room_separately() {
        let db = Memory::default();
        let (a, b) = (room::Id::new(), room::Id::new());

        let first = db.execute(Transact).await.unwrap();
        first.execute(Lock(By::<Room, _>::new(a))).await.unwrap();

        let second = db.execute(Transact).await.unwrap();
        assert!(
            second
                .execute(Lock(By::<Room, _>::new(b)))
                .now_or_never()
                .is_some(),
            "other room must not be blocked",
        );

        let third = db.execute(Transact).await.unwrap();
        let mut blocked = Box::pin(third.execute(Lock(By::<Room, _>::new(a))));
        assert!(
            (&mut blocked).now_or_never().is_none(),
            "same room must be blocked",
        );

        first.execute(Commit).await.unwrap();
        blocked.await.unwrap();
    }

    #[tokio::test]
    async fn releases_locks_of_dropped_transaction() {
        let db = Memory::default();
        let id = room::Id::new();

        let tx = db.execute(Transact).await.unwrap();
        tx.execute(Lock(By::<Room, _>::new(id))).await.unwrap();
        drop(tx);

        let tx = db.execute(Transact).await.unwrap();
        assert!(
            tx.execute(Lock(By::<Room, _>::new(id)))
                .now_or_never()
                .is_some(),
        );
    }
}

//! [`Command`] for updating an existing [`Room`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{room, user, Room},
    infra::{database, Database},
    Service,
};

use super::{create_room::NAME_NUMBER_CONSTRAINT, Command};

/// [`Command`] for updating an existing [`Room`].
///
/// Only the provided fields are changed.
#[derive(Clone, Debug)]
pub struct UpdateRoom {
    /// [`user::Actor`] updating the [`Room`].
    pub actor: user::Actor,

    /// ID of the [`Room`] to update.
    pub id: room::Id,

    /// New [`room::Name`] of the [`Room`].
    pub name: Option<room::Name>,

    /// New [`room::Number`] of the [`Room`].
    pub number: Option<room::Number>,

    /// New [`room::DayPrice`] of the [`Room`].
    pub day_price: Option<room::DayPrice>,

    /// New [`room::BedType`] of the [`Room`].
    ///
    /// The [`room::Capacity`] follows it.
    pub bed_type: Option<room::BedType>,

    /// New [`room::Rating`] of the [`Room`].
    pub rating: Option<room::Rating>,

    /// New indicator whether reservations of the [`Room`] may be cancelled.
    pub refundable: Option<bool>,

    /// New indicator whether the [`Room`] accepts reservations.
    pub active: Option<bool>,
}

impl<Db> Command<UpdateRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Room>, room::Id>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Room>, room::Hash>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Room, room::Id>>, Err = Traced<database::Error>>
        + Database<Lock<By<Room, room::Hash>>, Err = Traced<database::Error>>
        + Database<Update<Room>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateRoom {
            actor,
            id,
            name,
            number,
            day_price,
            bed_type,
            rating,
            refundable,
            active,
        } = cmd;

        if !actor.is_admin() {
            return Err(tracerr::new!(E::NotAdmin(actor.id)));
        }

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::<Room, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut room = tx
            .execute(Select(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or_else(|| tracerr::new!(E::RoomNotExists(id)))?;

        let renamed = name.as_ref().is_some_and(|n| *n != room.name)
            || number.as_ref().is_some_and(|n| *n != room.number);
        if let Some(name) = name {
            room.name = name;
        }
        if let Some(number) = number {
            room.number = number;
        }
        if let Some(price) = day_price {
            room.day_price = price;
        }
        if let Some(bed_type) = bed_type {
            room.set_bed_type(bed_type);
        }
        if let Some(rating) = rating {
            room.rating = rating;
        }
        if let Some(refundable) = refundable {
            room.refundable = refundable;
        }
        if let Some(active) = active {
            room.active = active;
        }
        room.updated_at = self.clock().now().coerce();

        if renamed {
            let hash = room::Hash::new(&room.name, &room.number);
            tx.execute(Lock(By::<Room, _>::new(hash)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            let existing = tx
                .execute(Select(By::new(hash)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if let Some(existing) = existing.filter(|r| r.id != id) {
                return Err(tracerr::new!(E::RoomExists(existing.id)));
            }
            room.hash = hash;
        }

        tx.execute(Update(room.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(NAME_NUMBER_CONSTRAINT))
                {
                    tracerr::new!(E::RoomExists(id))
                } else {
                    tracerr::map_from(e)
                }
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(room)
    }
}

/// Error of [`UpdateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Actor`] is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Room`] with the provided ID does not exist.
    #[display("`Room(id: {_0})` does not exist")]
    RoomNotExists(#[error(not(source))] room::Id),

    /// Another [`Room`] with the same [`room::Name`] and [`room::Number`]
    /// exists.
    #[display("`Room(id: {_0})` with the same name and number exists")]
    RoomExists(#[error(not(source))] room::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{fixture, UpdateRoom},
        domain::room,
        Command as _,
    };

    use super::ExecutionError as E;

    fn update(id: room::Id) -> UpdateRoom {
        UpdateRoom {
            actor: fixture::admin(),
            id,
            name: None,
            number: None,
            day_price: None,
            bed_type: None,
            rating: None,
            refundable: None,
            active: None,
        }
    }

    #[tokio::test]
    async fn recomputes_capacity() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;

        let updated = svc
            .execute(UpdateRoom {
                bed_type: Some(room::BedType::DoubleTwinBunk),
                ..update(room.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.bed_type, room::BedType::DoubleTwinBunk);
        assert_eq!(updated.capacity, 4);
        assert_eq!(updated.name, room.name);
    }

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;

        let updated = svc
            .execute(UpdateRoom {
                active: Some(false),
                ..update(room.id)
            })
            .await
            .unwrap();

        assert!(!updated.active);
        assert_eq!(updated.capacity, room.capacity);
        assert_eq!(updated.day_price, room.day_price);
        assert_eq!(updated.hash, room.hash);
    }

    #[tokio::test]
    async fn rehashes_renamed_room() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;

        let updated = svc
            .execute(UpdateRoom {
                number: Some(room::Number::new("102").unwrap()),
                ..update(room.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.hash, fixture::hash("Sea View", "102"));
    }

    #[tokio::test]
    async fn rejects_taken_name_and_number() {
        let svc = fixture::service();
        let taken = fixture::room(&svc, "Sea View", "101").await;
        let room = fixture::room(&svc, "Sea View", "102").await;

        let err = svc
            .execute(UpdateRoom {
                number: Some(room::Number::new("101").unwrap()),
                ..update(room.id)
            })
            .await
            .unwrap_err();

        assert!(
            matches!(err.as_ref(), E::RoomExists(id) if *id == taken.id),
            "{err}",
        );
    }

    #[tokio::test]
    async fn rejects_unknown_room() {
        let svc = fixture::service();

        let err = svc.execute(update(room::Id::new())).await.unwrap_err();

        assert!(matches!(err.as_ref(), E::RoomNotExists(_)), "{err}");
    }

    #[tokio::test]
    async fn requires_admin() {
        let svc = fixture::service();
        let room = fixture::room(&svc, "Sea View", "101").await;

        let err = svc
            .execute(UpdateRoom {
                actor: fixture::guest(),
                ..update(room.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::NotAdmin(_)), "{err}");
    }
}

//! [`Command`] for creating a new [`Room`].

use common::operations::{
    By, Commit, Insert, Lock, Select, Transact, Transacted,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{room, user, Room},
    infra::{database, Database},
    Service,
};

use super::Command;

/// Name of the database constraint keeping [`room::Name`] and
/// [`room::Number`] pairs unique.
pub(crate) const NAME_NUMBER_CONSTRAINT: &str = "rooms_name_number_key";

/// [`Command`] for creating a new [`Room`].
#[derive(Clone, Debug)]
pub struct CreateRoom {
    /// [`user::Actor`] creating the [`Room`].
    pub actor: user::Actor,

    /// [`room::Name`] of a new [`Room`].
    pub name: room::Name,

    /// [`room::Number`] of a new [`Room`].
    pub number: room::Number,

    /// [`room::DayPrice`] of a new [`Room`].
    pub day_price: room::DayPrice,

    /// [`room::BedType`] of a new [`Room`].
    pub bed_type: room::BedType,

    /// [`room::Rating`] of a new [`Room`].
    pub rating: room::Rating,

    /// Indicator whether reservations of a new [`Room`] may be cancelled.
    pub refundable: bool,

    /// Indicator whether a new [`Room`] accepts reservations.
    pub active: bool,
}

impl<Db> Command<CreateRoom> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Select<By<Option<Room>, room::Hash>>,
            Ok = Option<Room>,
            Err = Traced<database::Error>,
        > + Database<Lock<By<Room, room::Hash>>, Err = Traced<database::Error>>
        + Database<Insert<Room>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Room;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateRoom) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateRoom {
            actor,
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

        let now = self.clock().now();
        let hash = room::Hash::new(&name, &number);
        let room = Room {
            id: room::Id::new(),
            hash,
            name,
            number,
            day_price,
            bed_type,
            capacity: bed_type.capacity(),
            rating,
            refundable,
            active,
            created_at: now.coerce(),
            updated_at: now.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent creation of the same `Room`.
        tx.execute(Lock(By::new(hash)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let existing = tx
            .execute(Select(By::new(hash)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if let Some(existing) = existing {
            return Err(tracerr::new!(E::RoomExists(existing.id)));
        }

        tx.execute(Insert(room.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(NAME_NUMBER_CONSTRAINT))
                {
                    tracerr::new!(E::RoomExists(room.id))
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

/// Error of [`CreateRoom`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`user::Actor`] is not an admin.
    #[display("`User(id: {_0})` is not an admin")]
    NotAdmin(#[error(not(source))] user::Id),

    /// [`Room`] with the same [`room::Name`] and [`room::Number`] already
    /// exists.
    #[display("`Room(id: {_0})` with the same name and number exists")]
    RoomExists(#[error(not(source))] room::Id),
}

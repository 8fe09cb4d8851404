//! [`Reservation`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select, Update};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        reservation::{self, Status, StatusTransition},
        room, Reservation,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`Reservation`] row, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, room_id, user_id, starts_at, ends_at, status, \
    created_at, updated_at";

/// Reads a [`Reservation`] out of the provided [`Row`] selected with
/// [`COLUMNS`].
fn from_row(row: &Row) -> Reservation {
    Reservation {
        id: row.get("id"),
        room_id: row.get("room_id"),
        user_id: row.get("user_id"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        status: row.get("status"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Reservation>, reservation::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Reservation>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Reservation>, reservation::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: reservation::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE id = $1::UUID \
             LIMIT 1",
        );
        Ok(self
            .query_opt(sql.as_str(), &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(from_row))
    }
}

impl<C> Database<Select<By<read::reservation::Holding, room::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::reservation::Holding;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<read::reservation::Holding, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let room_id: room::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE room_id = $1::UUID \
               AND status IN ($2::INT2, $3::INT2) \
             ORDER BY starts_at ASC",
        );
        Ok(self
            .query(sql.as_str(), &[&room_id, &Status::Booked, &Status::Active])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect::<Vec<_>>()
            .into())
    }
}

impl<C> Database<Select<By<read::reservation::Unfinished, ()>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = read::reservation::Unfinished;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::reservation::Unfinished, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let sql = format!(
            "SELECT {COLUMNS} \
             FROM reservations \
             WHERE status NOT IN ($1::INT2, $2::INT2)",
        );
        Ok(self
            .query(sql.as_str(), &[&Status::Expired, &Status::Refused])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(from_row)
            .collect::<Vec<_>>()
            .into())
    }
}

impl<C> Database<Insert<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(reservation): Insert<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        let Reservation {
            id,
            room_id,
            user_id,
            starts_at,
            ends_at,
            status,
            created_at,
            updated_at,
        } = reservation;

        const SQL: &str = "\
            INSERT INTO reservations (\
                id, room_id, user_id, starts_at, ends_at, status, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::UUID, \
                $4::TIMESTAMPTZ, $5::TIMESTAMPTZ, $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ\
            )";
        self.exec(
            SQL,
            &[
                &id,
                &room_id,
                &user_id,
                &starts_at,
                &ends_at,
                &status,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Reservation>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(reservation): Update<Reservation>,
    ) -> Result<Self::Ok, Self::Err> {
        // `status` is changed with `StatusTransition`s only.
        let Reservation {
            id,
            room_id,
            starts_at,
            ends_at,
            updated_at,
            ..
        } = reservation;

        const SQL: &str = "\
            UPDATE reservations \
            SET room_id = $2::UUID, \
                starts_at = $3::TIMESTAMPTZ, \
                ends_at = $4::TIMESTAMPTZ, \
                updated_at = $5::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id, &room_id, &starts_at, &ends_at, &updated_at])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<StatusTransition>> for Postgres<C>
where
    C: Connection,
{
    /// Indicator whether the [`StatusTransition`] has been applied.
    type Ok = bool;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(transition): Update<StatusTransition>,
    ) -> Result<Self::Ok, Self::Err> {
        let StatusTransition { id, from, to, at } = transition;

        const SQL: &str = "\
            UPDATE reservations \
            SET status = $3::INT2, \
                updated_at = $4::TIMESTAMPTZ \
            WHERE id = $1::UUID \
              AND status = $2::INT2";
        self.exec(SQL, &[&id, &from, &to, &at])
            .await
            .map_err(tracerr::wrap!())
            .map(|updated| updated > 0)
    }
}

/// Builds SQL conditions of the provided [`read::reservation::list::Filter`],
/// pushing their parameters into `ps`.
fn filter_conditions<'p>(
    filter: &'p read::reservation::list::Filter,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let user = filter.user_id.as_ref().map(|id| {
        ps.push(id);
        format!("AND user_id = ${}::UUID", ps.len())
    });
    let room = filter.room_id.as_ref().map(|id| {
        ps.push(id);
        format!("AND room_id = ${}::UUID", ps.len())
    });

    [user, room].into_iter().flatten().join(" ")
}

impl<C>
    Database<
        Select<
            By<
                read::reservation::list::Page,
                read::reservation::list::Selector,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
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

        let limit = i64::try_from(arguments.limit())
            .unwrap_or(i64::MAX)
            .saturating_add(1);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filter_conditions(&filter, &mut ps);

        let direction = arguments.direction();
        let sql = format!(
            "SELECT id \
             FROM reservations \
             WHERE TRUE \
                   {cursor} \
                   {filtering} \
             ORDER BY id {order} \
             LIMIT $1::INT8",
            cursor = cursor_idx.into_iter().format_with("", |idx, f| {
                let op = direction.operator();
                f(&format_args!("AND id {op} ${idx}::UUID"))
            }),
            order = direction.order().sql(),
        );
        let rows = self
            .query(sql.as_str(), &ps)
            .await
            .map_err(tracerr::wrap!())?;

        Ok(read::reservation::list::Page::new(
            &arguments,
            rows.iter().map(|row| {
                let id: reservation::Id = row.get("id");
                (id, id)
            }),
        ))
    }
}

impl<C>
    Database<
        Select<
            By<
                read::reservation::list::TotalCount,
                read::reservation::list::Filter,
            >,
        >,
    > for Postgres<C>
where
    C: Connection,
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

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filter_conditions(&filter, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 AS total \
             FROM reservations \
             WHERE TRUE {filtering}",
        );
        Ok(self
            .query_opt(sql.as_str(), &ps)
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i32>("total"))
            .into())
    }
}

//! [`Room`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{room, Room},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Columns of a [`Room`] row, in the order [`from_row()`] expects them.
const COLUMNS: &str = "\
    id, hash, name, number, \
    day_price_amount, day_price_currency, \
    bed_type, rating, refundable, active, \
    created_at, updated_at";

/// Reads a [`Room`] out of the provided [`Row`] selected with [`COLUMNS`].
fn from_row(row: &Row) -> Room {
    let bed_type: room::BedType = row.get("bed_type");
    #[expect(unsafe_code, reason = "checked by database constraint")]
    let day_price = unsafe {
        room::DayPrice::new_unchecked(Money {
            amount: row.get("day_price_amount"),
            currency: row.get("day_price_currency"),
        })
    };
    Room {
        id: row.get("id"),
        hash: row.get("hash"),
        name: row.get("name"),
        number: row.get("number"),
        day_price,
        bed_type,
        capacity: bed_type.capacity(),
        rating: row.get("rating"),
        refundable: row.get("refundable"),
        active: row.get("active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl<C> Database<Select<By<Option<Room>, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: room::Id = by.into_inner();

        let sql = format!(
            "SELECT {COLUMNS} \
             FROM rooms \
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

impl<C> Database<Select<By<Option<Room>, room::Hash>>> for Postgres<C>
where
    C: Connection,
    Self: Database<
        Select<By<Option<Room>, room::Id>>,
        Ok = Option<Room>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Option<Room>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Room>, room::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let hash: room::Hash = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM rooms \
            WHERE hash = $1::UUID \
            LIMIT 1";
        let Some(row) = self
            .query_opt(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())?
        else {
            return Ok(None);
        };

        self.execute(Select(By::new(row.get::<_, room::Id>("id"))))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Insert<Room>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Room>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(room): Insert<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(room)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Room>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(room): Update<Room>,
    ) -> Result<Self::Ok, Self::Err> {
        let Room {
            id,
            hash,
            name,
            number,
            day_price,
            bed_type,
            capacity,
            rating,
            refundable,
            active,
            created_at,
            updated_at,
        } = room;
        let Money { amount, currency } = day_price.money();
        let capacity = i16::from(capacity);

        const SQL: &str = "\
            INSERT INTO rooms (\
                id, hash, name, number, \
                day_price_amount, day_price_currency, \
                bed_type, capacity, rating, refundable, active, \
                created_at, updated_at\
            ) \
            VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, $4::VARCHAR, \
                $5::NUMERIC, $6::INT2, \
                $7::INT2, $8::INT2, $9::NUMERIC, $10::BOOL, $11::BOOL, \
                $12::TIMESTAMPTZ, $13::TIMESTAMPTZ\
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET hash = EXCLUDED.hash, \
                name = EXCLUDED.name, \
                number = EXCLUDED.number, \
                day_price_amount = EXCLUDED.day_price_amount, \
                day_price_currency = EXCLUDED.day_price_currency, \
                bed_type = EXCLUDED.bed_type, \
                capacity = EXCLUDED.capacity, \
                rating = EXCLUDED.rating, \
                refundable = EXCLUDED.refundable, \
                active = EXCLUDED.active, \
                updated_at = EXCLUDED.updated_at";
        self.exec(
            SQL,
            &[
                &id,
                &hash,
                &name,
                &number,
                &amount,
                &currency,
                &bed_type,
                &capacity,
                &rating,
                &refundable,
                &active,
                &created_at,
                &updated_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Room, room::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: room::Id = by.into_inner();

        // Touching the conflicting row keeps it locked until the transaction
        // ends, even when it was inserted by a previous one.
        const SQL: &str = "\
            INSERT INTO rooms_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (id) DO UPDATE SET id = EXCLUDED.id";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Lock<By<Room, room::Hash>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Room, room::Hash>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let hash: room::Hash = by.into_inner();

        const SQL: &str = "\
            INSERT INTO rooms_creation_lock \
            VALUES ($1::UUID) \
            ON CONFLICT (hash) DO UPDATE SET hash = EXCLUDED.hash";
        self.exec(SQL, &[&hash])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

/// Builds SQL conditions of the provided [`read::room::list::Filter`],
/// pushing their parameters into `ps`.
fn filter_conditions<'p>(
    filter: &'p read::room::list::Filter,
    min_capacity: &'p Option<i16>,
    ps: &mut Vec<&'p (dyn ToSql + Sync)>,
) -> String {
    let mut push = |p: &'p (dyn ToSql + Sync)| {
        ps.push(p);
        ps.len()
    };

    let price = filter.max_day_price.as_ref().map(|m| {
        format!(
            "AND day_price_currency = ${}::INT2 \
             AND day_price_amount <= ${}::NUMERIC",
            push(&m.currency),
            push(&m.amount),
        )
    });
    let capacity = min_capacity
        .as_ref()
        .map(|c| format!("AND capacity >= ${}::INT2", push(c)));
    let free = filter.free_between.as_ref().map(|range| {
        format!(
            "AND EXISTS (\
                SELECT 1 \
                FROM generate_series(\
                    ${start}::DATE, ${end}::DATE, '1 day'::INTERVAL\
                ) AS day \
                WHERE NOT EXISTS (\
                    SELECT 1 \
                    FROM reservations \
                    WHERE reservations.room_id = rooms.id \
                      AND reservations.status IN (1, 2) \
                      AND (reservations.starts_at AT TIME ZONE 'UTC')::DATE \
                          <= day::DATE \
                      AND (reservations.ends_at AT TIME ZONE 'UTC')::DATE \
                          >= day::DATE\
                )\
            )",
            start = push(range.start()),
            end = push(range.end()),
        )
    });

    [price, capacity, free].into_iter().flatten().join(" ")
}

impl<C> Database<Select<By<read::room::list::Page, read::room::list::Selector>>>
    for Postgres<C>
where
    C: Connection,
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

        let limit = i64::try_from(arguments.limit())
            .unwrap_or(i64::MAX)
            .saturating_add(1);
        let min_capacity = filter.min_capacity.map(i16::from);

        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![&limit];
        let cursor_idx = arguments.cursor().map(|c| {
            ps.push(c);
            ps.len()
        });
        let filtering = filter_conditions(&filter, &min_capacity, &mut ps);

        let direction = arguments.direction();
        let sql = format!(
            "SELECT id \
             FROM rooms \
             WHERE active \
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

        Ok(read::room::list::Page::new(
            &arguments,
            rows.iter().map(|row| {
                let id: room::Id = row.get("id");
                (id, id)
            }),
        ))
    }
}

impl<C>
    Database<
        Select<By<read::room::list::TotalCount, read::room::list::Filter>>,
    > for Postgres<C>
where
    C: Connection,
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

        let min_capacity = filter.min_capacity.map(i16::from);
        let mut ps: Vec<&(dyn ToSql + Sync)> = vec![];
        let filtering = filter_conditions(&filter, &min_capacity, &mut ps);

        let sql = format!(
            "SELECT COUNT(*)::INT4 AS total \
             FROM rooms \
             WHERE active {filtering}",
        );
        Ok(self
            .query_opt(sql.as_str(), &ps)
            .await
            .map_err(tracerr::wrap!())?
            .map_or(0, |row| row.get::<_, i32>("total"))
            .into())
    }
}

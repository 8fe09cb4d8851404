//! GraphQL [`Query`]s definitions.

use std::ops::RangeInclusive;

use common::{Date, Money};
use juniper::graphql_object;
use service::{domain::availability, query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Default number of nodes on a page.
const DEFAULT_PAGE_SIZE: i32 = 10;

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the `Room` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "room",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn room(
        id: api::room::Id,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        ctx.service()
            .execute(query::room::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| RoomError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Fetches the page of active `Room`s.
    ///
    /// Only `Room`s having at least one free day within the
    /// `freeFrom..=freeTo` range are listed. The range defaults to today and
    /// the following 14 days, and can't span more days than that.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous;
    /// - `INVALID_DATE_RANGE` - `freeFrom` goes after `freeTo`, or the range
    ///                          spans more than 14 days.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            free_from = ?free_from,
            free_to = ?free_to,
            gql.name = "rooms",
            last = ?last,
            max_day_price = ?max_day_price,
            min_capacity = ?min_capacity,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn rooms(
        first: Option<i32>,
        after: Option<api::room::list::Cursor>,
        last: Option<i32>,
        before: Option<api::room::list::Cursor>,
        max_day_price: Option<Money>,
        min_capacity: Option<i32>,
        free_from: Option<Date>,
        free_to: Option<Date>,
        ctx: &Context,
    ) -> Result<api::room::list::Connection, Error> {
        let arguments = read::room::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            DEFAULT_PAGE_SIZE,
        )
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

        let free_between =
            free_window(free_from, free_to, ctx.service().clock().today())
                .map_err(Error::from)
                .map_err(ctx.error())?;

        let filter = read::room::list::Filter {
            max_day_price,
            // Negative capacity restricts nothing, while an unreachable one
            // matches no `Room`.
            min_capacity: min_capacity
                .map(|c| u8::try_from(c.max(0)).unwrap_or(u8::MAX)),
            free_between: Some(free_between),
        };
        ctx.service()
            .execute(query::rooms::List::by(read::room::list::Selector {
                arguments,
                filter: filter.clone(),
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::room::list::Connection::new(page, filter))
    }

    /// Returns the `Reservation` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `NOT_PERMITTED` - the current `User` is neither an admin, nor the
    ///                     owner of the `Reservation`.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "reservation",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let actor = ctx.current_session().await?.actor();

        let reservation = ctx
            .service()
            .execute(query::reservation::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| ReservationError::NotExists.into())
            .map_err(ctx.error())?;
        if !actor.can_manage(reservation.user_id) {
            return Err(Error::from(api::PrivilegeError::Owner))
                .map_err(ctx.error());
        }

        Ok(reservation.into())
    }

    /// Fetches the page of the current `User`'s `Reservation`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "myReservations",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            room_id = ?room_id,
        ),
    )]
    pub async fn my_reservations(
        first: Option<i32>,
        after: Option<api::reservation::list::Cursor>,
        last: Option<i32>,
        before: Option<api::reservation::list::Cursor>,
        room_id: Option<api::room::Id>,
        ctx: &Context,
    ) -> Result<api::reservation::list::Connection, Error> {
        let my_id = ctx.current_session().await?.user_id;

        Self::list_reservations(
            (first, after, last, before),
            read::reservation::list::Filter {
                user_id: Some(my_id.into()),
                room_id: room_id.map(Into::into),
            },
            ctx,
        )
        .await
    }

    /// Fetches the page of all `Reservation`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `AMBIGUOUS_PAGINATION_ARGUMENTS` - the pagination arguments are
    ///                                      ambiguous.
    #[tracing::instrument(
        skip_all,
        fields(
            after = ?after,
            before = ?before,
            first = ?first,
            gql.name = "reservations",
            last = ?last,
            otel.name = Self::SPAN_NAME,
            room_id = ?room_id,
            user_id = ?user_id,
        ),
    )]
    pub async fn reservations(
        first: Option<i32>,
        after: Option<api::reservation::list::Cursor>,
        last: Option<i32>,
        before: Option<api::reservation::list::Cursor>,
        user_id: Option<api::user::Id>,
        room_id: Option<api::room::Id>,
        ctx: &Context,
    ) -> Result<api::reservation::list::Connection, Error> {
        if !ctx.current_session().await?.actor().is_admin() {
            return Err(Error::from(api::PrivilegeError::Admin))
                .map_err(ctx.error());
        }

        Self::list_reservations(
            (first, after, last, before),
            read::reservation::list::Filter {
                user_id: user_id.map(Into::into),
                room_id: room_id.map(Into::into),
            },
            ctx,
        )
        .await
    }
}

/// Resolves the range of days a listed [`Room`] must have a free day within.
///
/// `from` defaults to `today`, and `to` defaults to the end of the booking
/// horizon counted from `from`.
///
/// [`Room`]: api::Room
fn free_window(
    from: Option<Date>,
    to: Option<Date>,
    today: Date,
) -> Result<RangeInclusive<Date>, FilterError> {
    let horizon = availability::BOOKING_HORIZON_DAYS;

    let from = from.unwrap_or(today);
    let to =
        to.unwrap_or_else(|| from.checked_add_days(horizon).unwrap_or(from));
    if from > to || from.days_until(to) > horizon {
        return Err(FilterError::InvalidDateRange);
    }
    Ok(from..=to)
}

/// Raw pagination arguments of a [`Reservation`] list.
///
/// [`Reservation`]: api::Reservation
type ReservationListArguments = (
    Option<i32>,
    Option<api::reservation::list::Cursor>,
    Option<i32>,
    Option<api::reservation::list::Cursor>,
);

impl Query {
    /// Fetches the page of [`api::Reservation`]s matching the provided
    /// `filter`.
    async fn list_reservations(
        (first, after, last, before): ReservationListArguments,
        filter: read::reservation::list::Filter,
        ctx: &Context,
    ) -> Result<api::reservation::list::Connection, Error> {
        let arguments = read::reservation::list::Arguments::new(
            first,
            after.map(Into::into),
            last,
            before.map(Into::into),
            DEFAULT_PAGE_SIZE,
        )
        .map_err(AsError::into_error)
        .map_err(ctx.error())?;

        ctx.service()
            .execute(query::reservations::List::by(
                read::reservation::list::Selector { arguments, filter },
            ))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|page| api::reservation::list::Connection::new(page, filter))
    }
}

define_error! {
    enum RoomError {
        #[code = "ROOM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Room` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum ReservationError {
        #[code = "RESERVATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Reservation` with the specified ID does not exist"]
        NotExists,
    }
}

define_error! {
    enum FilterError {
        #[code = "INVALID_DATE_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Date range is inverted or too long"]
        InvalidDateRange,
    }
}

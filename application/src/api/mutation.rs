//! GraphQL [`Mutation`]s definitions.

use std::collections::BTreeSet;

use common::{Date, DateTime};
use juniper::graphql_object;
use service::{command, domain::availability::DateRangeError, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Room` with the provided details.
    ///
    /// `Room` capacity is derived from its `bedType`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `ROOM_EXISTS` - a `Room` with the same name and number exists.
    #[tracing::instrument(
        skip_all,
        fields(
            active = ?active,
            bed_type = ?bed_type,
            day_price = %day_price,
            gql.name = "createRoom",
            name = %name,
            number = %number,
            otel.name = Self::SPAN_NAME,
            rating = ?rating.as_ref().map(ToString::to_string),
            refundable = ?refundable,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_room(
        name: api::room::Name,
        number: api::room::Number,
        day_price: api::room::DayPrice,
        bed_type: api::room::BedType,
        rating: Option<api::room::Rating>,
        refundable: Option<bool>,
        active: Option<bool>,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        let actor = ctx.current_session().await?.actor();

        ctx.service()
            .execute(command::CreateRoom {
                actor,
                name: name.into(),
                number: number.into(),
                day_price: day_price.into(),
                bed_type: bed_type.into(),
                rating: rating.map(Into::into).unwrap_or_default(),
                refundable: refundable.unwrap_or(true),
                active: active.unwrap_or(true),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the provided details of the `Room` with the specified ID.
    ///
    /// Omitted details are left unchanged.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `NOT_ADMIN` - the current `User` is not an admin;
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist;
    /// - `ROOM_EXISTS` - another `Room` with the same name and number exists.
    #[tracing::instrument(
        skip_all,
        fields(
            active = ?active,
            bed_type = ?bed_type,
            day_price = ?day_price.as_ref().map(ToString::to_string),
            gql.name = "updateRoom",
            id = %id,
            name = ?name.as_ref().map(ToString::to_string),
            number = ?number.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
            rating = ?rating.as_ref().map(ToString::to_string),
            refundable = ?refundable,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn update_room(
        id: api::room::Id,
        name: Option<api::room::Name>,
        number: Option<api::room::Number>,
        day_price: Option<api::room::DayPrice>,
        bed_type: Option<api::room::BedType>,
        rating: Option<api::room::Rating>,
        refundable: Option<bool>,
        active: Option<bool>,
        ctx: &Context,
    ) -> Result<api::Room, Error> {
        let actor = ctx.current_session().await?.actor();

        ctx.service()
            .execute(command::UpdateRoom {
                actor,
                id: id.into(),
                name: name.map(Into::into),
                number: number.map(Into::into),
                day_price: day_price.map(Into::into),
                bed_type: bed_type.map(Into::into),
                rating: rating.map(Into::into),
                refundable,
                active,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Reserves the `Room` with the specified ID for every day from
    /// `startsAt` to `endsAt` inclusively.
    ///
    /// Both days must lie within today and the following 14 days.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `DATE_OUT_OF_WINDOW` - a day is in the past or too far ahead;
    /// - `INVALID_DATE_RANGE` - `startsAt` goes after `endsAt`;
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist;
    /// - `ROOM_INACTIVE` - the `Room` doesn't accept reservations;
    /// - `RESERVATION_CONFLICT` - some of the days are already reserved (they
    ///                            are listed in the `conflictingDates`
    ///                            extension).
    #[tracing::instrument(
        skip_all,
        fields(
            ends_at = ?ends_at,
            gql.name = "createReservation",
            otel.name = Self::SPAN_NAME,
            room_id = %room_id,
            starts_at = ?starts_at,
        ),
    )]
    pub async fn create_reservation(
        room_id: api::room::Id,
        starts_at: DateTime,
        ends_at: DateTime,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let actor = ctx.current_session().await?.actor();

        ctx.service()
            .execute(command::CreateReservation {
                actor,
                room_id: room_id.into(),
                starts_at: starts_at.coerce(),
                ends_at: ends_at.coerce(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the `Reservation` with the specified ID to another `Room` and/or
    /// days.
    ///
    /// Omitted details are left unchanged. Days held by the `Reservation`
    /// itself never conflict with it.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `NOT_PERMITTED` - the current `User` is neither an admin, nor the
    ///                     owner of the `Reservation`;
    /// - `RESERVATION_FINISHED` - the `Reservation` is expired or refused;
    /// - `DATE_OUT_OF_WINDOW` - a day is in the past or too far ahead;
    /// - `INVALID_DATE_RANGE` - `startsAt` goes after `endsAt`;
    /// - `ROOM_NOT_EXISTS` - the `Room` with the specified ID does not exist;
    /// - `ROOM_INACTIVE` - the `Room` doesn't accept reservations;
    /// - `RESERVATION_CONFLICT` - some of the days are already reserved (they
    ///                            are listed in the `conflictingDates`
    ///                            extension).
    #[tracing::instrument(
        skip_all,
        fields(
            ends_at = ?ends_at,
            gql.name = "updateReservation",
            id = %id,
            otel.name = Self::SPAN_NAME,
            room_id = ?room_id,
            starts_at = ?starts_at,
        ),
    )]
    pub async fn update_reservation(
        id: api::reservation::Id,
        room_id: Option<api::room::Id>,
        starts_at: Option<DateTime>,
        ends_at: Option<DateTime>,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let actor = ctx.current_session().await?.actor();

        ctx.service()
            .execute(command::UpdateReservation {
                actor,
                id: id.into(),
                room_id: room_id.map(Into::into),
                starts_at: starts_at.map(DateTime::coerce),
                ends_at: ends_at.map(DateTime::coerce),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Cancels the `Reservation` with the specified ID, releasing its days.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `NOT_PERMITTED` - the current `User` is neither an admin, nor the
    ///                     owner of the `Reservation`;
    /// - `RESERVATION_FINISHED` - the `Reservation` is expired or refused;
    /// - `ROOM_NOT_EXISTS` - the `Room` of the `Reservation` does not exist;
    /// - `ROOM_UNREFUNDABLE` - reservations of the `Room` can't be cancelled.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "cancelReservation",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn cancel_reservation(
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<api::Reservation, Error> {
        let actor = ctx.current_session().await?.actor();

        ctx.service()
            .execute(command::CancelReservation {
                actor,
                id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

define_error! {
    enum RoomError {
        #[code = "ROOM_EXISTS"]
        #[status = CONFLICT]
        #[message = "`Room` with the same name and number already exists"]
        Exists,

        #[code = "ROOM_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Room` with the specified ID does not exist"]
        NotExists,

        #[code = "ROOM_INACTIVE"]
        #[status = CONFLICT]
        #[message = "`Room` doesn't accept reservations"]
        Inactive,

        #[code = "ROOM_UNREFUNDABLE"]
        #[status = CONFLICT]
        #[message = "Reservations of the `Room` can't be cancelled"]
        Unrefundable,
    }
}

define_error! {
    enum ReservationError {
        #[code = "RESERVATION_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Reservation` with the specified ID does not exist"]
        NotExists,

        #[code = "RESERVATION_FINISHED"]
        #[status = CONFLICT]
        #[message = "`Reservation` is already expired or refused"]
        Finished,

        #[code = "RESERVATION_CONFLICT"]
        #[status = CONFLICT]
        #[message = "Requested days are already reserved"]
        Conflict,
    }
}

define_error! {
    enum DateError {
        #[code = "DATE_OUT_OF_WINDOW"]
        #[status = BAD_REQUEST]
        #[message = "Reserved days must lie within today and the following \
                     14 days"]
        OutOfWindow,

        #[code = "INVALID_DATE_RANGE"]
        #[status = BAD_REQUEST]
        #[message = "Start of the date range goes after its end"]
        InvalidRange,
    }
}

/// Builds an [`Error`] listing the already reserved `days`.
fn conflict_error(days: &BTreeSet<Date>) -> Error {
    let mut err = Error::from(ReservationError::Conflict);
    err.message = format!(
        "{}: {}",
        err.message,
        days.iter().map(ToString::to_string).collect::<Vec<_>>().join(", "),
    );
    err.with_detail("conflictingDates", days)
}

impl AsError for DateRangeError {
    fn try_as_error(&self) -> Option<Error> {
        Some(if self.is_out_of_window() {
            DateError::OutOfWindow.into()
        } else {
            DateError::InvalidRange.into()
        })
    }
}

impl AsError for command::create_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotAdmin(_) => api::PrivilegeError::Admin.into(),
            Self::RoomExists(_) => RoomError::Exists.into(),
        })
    }
}

impl AsError for command::update_room::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::NotAdmin(_) => api::PrivilegeError::Admin.into(),
            Self::RoomNotExists(_) => RoomError::NotExists.into(),
            Self::RoomExists(_) => RoomError::Exists.into(),
        })
    }
}

impl AsError for command::create_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::DateRange(e) => return e.try_as_error(),
            Self::RoomNotExists(_) => RoomError::NotExists.into(),
            Self::RoomInactive(_) => RoomError::Inactive.into(),
            Self::Conflict(days) => conflict_error(days),
        })
    }
}

impl AsError for command::update_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::DateRange(e) => return e.try_as_error(),
            Self::ReservationNotExists(_) => ReservationError::NotExists.into(),
            Self::NotPermitted(_) => api::PrivilegeError::Owner.into(),
            Self::ReservationFinished(_) => ReservationError::Finished.into(),
            Self::RoomNotExists(_) => RoomError::NotExists.into(),
            Self::RoomInactive(_) => RoomError::Inactive.into(),
            Self::Conflict(days) => conflict_error(days),
        })
    }
}

impl AsError for command::cancel_reservation::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::ReservationNotExists(_) => ReservationError::NotExists.into(),
            Self::NotPermitted(_) => api::PrivilegeError::Owner.into(),
            Self::ReservationFinished(_) => ReservationError::Finished.into(),
            Self::RoomNotExists(_) => RoomError::NotExists.into(),
            Self::RoomUnrefundable(_) => RoomError::Unrefundable.into(),
        })
    }
}

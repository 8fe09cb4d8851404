//! [`Reservation`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _};
use derive_more::{Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, AsError, Context, Error};

/// A reservation of a [`api::Room`] for a range of days.
#[derive(Clone, Debug, From)]
pub struct Reservation {
    /// ID of this [`Reservation`].
    id: Id,

    /// Underlying [`domain::Reservation`].
    reservation: OnceCell<domain::Reservation>,
}

impl From<domain::Reservation> for Reservation {
    fn from(reservation: domain::Reservation) -> Self {
        Self {
            id: reservation.id.into(),
            reservation: OnceCell::new_with(Some(reservation)),
        }
    }
}

impl Reservation {
    /// Creates a new [`Reservation`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Reservation`] with the provided ID exists,
    /// otherwise accessing this [`Reservation`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            reservation: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Reservation`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Reservation`] doesn't exist.
    async fn reservation(
        &self,
        ctx: &Context,
    ) -> Result<&domain::Reservation, Error> {
        let id = self.id.into();
        self.reservation
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::reservation::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|r| {
                        future::ready(r.ok_or_else(|| {
                            api::query::ReservationError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A reservation of a `Room` for a range of days.
///
/// Holds every day from `startsOn` to `endsOn` inclusively, while being
/// `BOOKED` or `ACTIVE`.
#[graphql_object(context = Context)]
impl Reservation {
    /// Unique identifier of this `Reservation`.
    pub fn id(&self) -> Id {
        self.id
    }

    /// `Room` this `Reservation` is made for.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.room",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn room(&self, ctx: &Context) -> Result<api::Room, Error> {
        let room_id = self.reservation(ctx).await?.room_id;
        #[expect(
            unsafe_code,
            reason = "`Reservation` always references an existing `Room`"
        )]
        let room = unsafe { api::Room::new_unchecked(room_id) };
        Ok(room)
    }

    /// ID of the `User` owning this `Reservation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.userId",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn user_id(
        &self,
        ctx: &Context,
    ) -> Result<api::user::Id, Error> {
        Ok(self.reservation(ctx).await?.user_id.into())
    }

    /// `DateTime` when this `Reservation` starts.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.startsAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn starts_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.reservation(ctx).await?.starts_at.coerce())
    }

    /// `DateTime` when this `Reservation` ends.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.endsAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn ends_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.reservation(ctx).await?.ends_at.coerce())
    }

    /// First UTC day held by this `Reservation`.
    pub async fn starts_on(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.reservation(ctx).await?.starts_on())
    }

    /// Last UTC day held by this `Reservation`.
    pub async fn ends_on(&self, ctx: &Context) -> Result<Date, Error> {
        Ok(self.reservation(ctx).await?.ends_on())
    }

    /// Current status of this `Reservation`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Reservation.status",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn status(&self, ctx: &Context) -> Result<Status, Error> {
        Ok(self.reservation(ctx).await?.status.into())
    }

    /// `DateTime` when this `Reservation` was created.
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.reservation(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Reservation` was last modified.
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.reservation(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Reservation`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::reservation::Id)]
#[into(domain::reservation::Id)]
#[graphql(name = "ReservationId", transparent)]
pub struct Id(Uuid);

/// Status of a `Reservation`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "ReservationStatus")]
pub enum Status {
    /// Reservation is made, but its first day hasn't come yet.
    Booked,

    /// Reservation is in progress.
    Active,

    /// Reservation is over.
    Expired,

    /// Reservation is cancelled.
    Refused,
}

impl From<domain::reservation::Status> for Status {
    fn from(status: domain::reservation::Status) -> Self {
        use domain::reservation::Status as S;
        match status {
            S::Booked => Self::Booked,
            S::Active => Self::Active,
            S::Expired => Self::Expired,
            S::Refused => Self::Refused,
        }
    }
}

pub mod list {
    //! Definitions related to the [`Reservation`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Id, Reservation};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Reservation` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::reservation::list::Cursor)]
    #[graphql(
        name = "ReservationListCursor",
        with = scalar::Via::<read::reservation::list::Cursor>,
    )]
    pub struct Cursor(pub read::reservation::list::Cursor);

    /// Edge in the [`Reservation`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::reservation::list::Edge);

    /// Edge in the `Reservation` list.
    #[graphql_object(name = "ReservationListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `ReservationListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `ReservationListEdge`.
        #[must_use]
        pub fn node(&self) -> Reservation {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees \
                          `Reservation` existence"
            )]
            unsafe {
                Reservation::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Reservation`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::reservation::list::Connection`].
        page: read::reservation::list::Connection,

        /// [`read::reservation::list::Filter`] the `page` was selected with.
        filter: read::reservation::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the `page` selected with the
        /// provided `filter`.
        #[must_use]
        pub fn new(
            page: read::reservation::list::Connection,
            filter: read::reservation::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `Reservation` list.
    #[graphql_object(name = "ReservationListConnection", context = Context)]
    impl Connection {
        /// Edges of this `ReservationListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.page.page_info(),
                filter: self.filter,
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Copy, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::reservation::list::PageInfo`].
        info: read::reservation::list::PageInfo,

        /// [`read::reservation::list::Filter`] the page was selected with.
        filter: read::reservation::list::Filter,
    }

    /// Information about a `ReservationListConnection` page.
    #[graphql_object(name = "ReservationListPageInfo", context = Context)]
    impl PageInfo {
        /// Indicator whether there is a next page.
        #[must_use]
        pub fn has_next_page(&self) -> bool {
            self.info.has_next_page
        }

        /// Indicator whether there is a previous page.
        #[must_use]
        pub fn has_previous_page(&self) -> bool {
            self.info.has_previous_page
        }

        /// Start cursor of the page.
        #[must_use]
        pub fn start_cursor(&self) -> Option<Cursor> {
            self.info.start_cursor.map(Into::into)
        }

        /// End cursor of the page.
        #[must_use]
        pub fn end_cursor(&self) -> Option<Cursor> {
            self.info.end_cursor.map(Into::into)
        }

        /// Total count of `Reservation`s matching the requested filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::reservations::TotalCount::by(self.filter))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}

//! [`Room`]-related definitions.

use std::future;

use common::{Date, DateTime, Handler as _};
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A bookable room.
#[derive(Clone, Debug, From)]
pub struct Room {
    /// ID of this [`Room`].
    id: Id,

    /// Underlying [`domain::Room`].
    room: OnceCell<domain::Room>,
}

impl From<domain::Room> for Room {
    fn from(room: domain::Room) -> Self {
        Self {
            id: room.id.into(),
            room: OnceCell::new_with(Some(room)),
        }
    }
}

impl Room {
    /// Creates a new [`Room`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`Room`] with the provided ID exists,
    /// otherwise accessing this [`Room`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            room: OnceCell::new(),
        }
    }

    /// Returns the underlying [`domain::Room`].
    ///
    /// # Errors
    ///
    /// Errors if the [`domain::Room`] doesn't exist.
    async fn room(&self, ctx: &Context) -> Result<&domain::Room, Error> {
        let id = self.id.into();
        self.room
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::room::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|r| {
                        future::ready(r.ok_or_else(|| {
                            api::query::RoomError::NotExists.into()
                        }))
                    })
            })
            .await
    }
}

/// A bookable room.
#[graphql_object(context = Context)]
impl Room {
    /// Unique identifier of this `Room`.
    pub fn id(&self) -> Id {
        self.id
    }

    /// Display name of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.name",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn name(&self, ctx: &Context) -> Result<Name, Error> {
        Ok(self.room(ctx).await?.name.clone().into())
    }

    /// Unit number of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.number",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn number(&self, ctx: &Context) -> Result<Number, Error> {
        Ok(self.room(ctx).await?.number.clone().into())
    }

    /// Price of a single day in this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.dayPrice",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn day_price(&self, ctx: &Context) -> Result<DayPrice, Error> {
        Ok(self.room(ctx).await?.day_price.into())
    }

    /// Type of beds in this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.bedType",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn bed_type(&self, ctx: &Context) -> Result<BedType, Error> {
        Ok(self.room(ctx).await?.bed_type.into())
    }

    /// Number of guests this `Room` accommodates.
    ///
    /// Always follows the `bedType` of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.capacity",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn capacity(&self, ctx: &Context) -> Result<i32, Error> {
        Ok(self.room(ctx).await?.capacity.into())
    }

    /// Quality rating of this `Room`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.rating",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn rating(&self, ctx: &Context) -> Result<Rating, Error> {
        Ok(self.room(ctx).await?.rating.into())
    }

    /// Indicator whether reservations of this `Room` may be cancelled.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.refundable",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn refundable(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.room(ctx).await?.refundable)
    }

    /// Indicator whether this `Room` accepts new reservations.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.active",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn active(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(self.room(ctx).await?.active)
    }

    /// Days of this `Room` held by its reservations, starting from today.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.occupiedDays",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn occupied_days(
        &self,
        ctx: &Context,
    ) -> Result<Vec<Date>, Error> {
        ctx.service()
            .execute(query::room::OccupiedDays {
                room_id: self.id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|days| days.into_iter().collect())
    }

    /// `DateTime` when this `Room` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.room(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `Room` was last modified.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Room.updatedAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn updated_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.room(ctx).await?.updated_at.coerce())
    }
}

/// Unique identifier of a `Room`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::room::Id)]
#[into(domain::room::Id)]
#[graphql(name = "RoomId", transparent)]
pub struct Id(Uuid);

/// Display name of a `Room`, up to 256 characters without surrounding
/// whitespace.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "RoomName", with = scalar::Via::<domain::room::Name>)]
pub struct Name(domain::room::Name);

/// Unit number of a `Room`, up to 20 letters, digits or dashes.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "RoomNumber", with = scalar::Via::<domain::room::Number>)]
pub struct Number(domain::room::Number);

/// Non-negative price of a single day in a `Room`, in the `Money` format.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "RoomDayPrice",
    with = scalar::Via::<domain::room::DayPrice>,
)]
pub struct DayPrice(domain::room::DayPrice);

/// Quality rating of a `Room` within `0..=10` range.
#[derive(AsRef, Clone, Copy, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "RoomRating", with = scalar::Via::<domain::room::Rating>)]
pub struct Rating(domain::room::Rating);

/// Type of beds in a `Room`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "RoomBedType")]
pub enum BedType {
    /// A single bed, accommodating 1 guest.
    Twin,

    /// A double bed, accommodating 2 guests.
    Double,

    /// A bunk of two single beds, accommodating 2 guests.
    TwinBunk,

    /// A bunk of two double beds, accommodating 4 guests.
    DoubleTwinBunk,
}

impl From<domain::room::BedType> for BedType {
    fn from(bed_type: domain::room::BedType) -> Self {
        use domain::room::BedType as B;
        match bed_type {
            B::Twin => Self::Twin,
            B::Double => Self::Double,
            B::TwinBunk => Self::TwinBunk,
            B::DoubleTwinBunk => Self::DoubleTwinBunk,
        }
    }
}

impl From<BedType> for domain::room::BedType {
    fn from(bed_type: BedType) -> Self {
        match bed_type {
            BedType::Twin => Self::Twin,
            BedType::Double => Self::Double,
            BedType::TwinBunk => Self::TwinBunk,
            BedType::DoubleTwinBunk => Self::DoubleTwinBunk,
        }
    }
}

pub mod list {
    //! Definitions related to the [`Room`] list.

    use derive_more::{AsRef, From, Into};
    use juniper::{graphql_object, GraphQLScalar};
    use service::{query, read, Query as _};

    use super::{Id, Room};
    use crate::{api::scalar, AsError, Context, Error};

    /// Cursor for the `Room` list.
    #[derive(AsRef, Clone, Copy, Debug, From, GraphQLScalar, Into)]
    #[from(Id, read::room::list::Cursor)]
    #[graphql(
        name = "RoomListCursor",
        with = scalar::Via::<read::room::list::Cursor>,
    )]
    pub struct Cursor(pub read::room::list::Cursor);

    /// Edge in the [`Room`] list.
    #[derive(Clone, Copy, Debug, From, Into)]
    pub struct Edge(read::room::list::Edge);

    /// Edge in the `Room` list.
    #[graphql_object(name = "RoomListEdge", context = Context)]
    impl Edge {
        /// Cursor of this `RoomListEdge`.
        #[must_use]
        pub fn cursor(&self) -> Cursor {
            self.0.cursor.into()
        }

        /// Node of this `RoomListEdge`.
        #[must_use]
        pub fn node(&self) -> Room {
            #[expect(
                unsafe_code,
                reason = "`Edge` loaded from repository guarantees `Room` \
                          existence"
            )]
            unsafe {
                Room::new_unchecked(self.0.node)
            }
        }
    }

    /// Connection of the [`Room`] list.
    #[derive(Clone, Debug)]
    pub struct Connection {
        /// Underlying [`read::room::list::Connection`].
        page: read::room::list::Connection,

        /// [`read::room::list::Filter`] the `page` was selected with.
        filter: read::room::list::Filter,
    }

    impl Connection {
        /// Creates a new [`Connection`] out of the `page` selected with the
        /// provided `filter`.
        #[must_use]
        pub fn new(
            page: read::room::list::Connection,
            filter: read::room::list::Filter,
        ) -> Self {
            Self { page, filter }
        }
    }

    /// Connection of the `Room` list.
    #[graphql_object(name = "RoomListConnection", context = Context)]
    impl Connection {
        /// Edges of this `RoomListConnection`.
        #[must_use]
        pub fn edges(&self) -> Vec<Edge> {
            self.page.edges.iter().copied().map(Into::into).collect()
        }

        /// Information about the page.
        #[must_use]
        pub fn page_info(&self) -> PageInfo {
            PageInfo {
                info: self.page.page_info(),
                filter: self.filter.clone(),
            }
        }
    }

    /// Information about a [`Connection`] page.
    #[derive(Clone, Debug)]
    pub struct PageInfo {
        /// Underlying [`read::room::list::PageInfo`].
        info: read::room::list::PageInfo,

        /// [`read::room::list::Filter`] the page was selected with.
        filter: read::room::list::Filter,
    }

    /// Information about a `RoomListConnection` page.
    #[graphql_object(name = "RoomListPageInfo", context = Context)]
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

        /// Total count of `Room`s matching the requested filter.
        pub async fn total_count(&self, ctx: &Context) -> Result<i32, Error> {
            ctx.service()
                .execute(query::rooms::TotalCount::by(self.filter.clone()))
                .await
                .map_err(AsError::into_error)
                .map_err(ctx.error())
                .map(Into::into)
        }
    }
}

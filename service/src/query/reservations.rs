//! [`Query`] collection related to multiple [`Reservation`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Reservation, Query};

use super::DatabaseQuery;

/// Queries a list of [`Reservation`]s.
pub type List = DatabaseQuery<
    By<read::reservation::list::Page, read::reservation::list::Selector>,
>;

/// Queries total count of [`Reservation`]s matching the provided filter.
pub type TotalCount = DatabaseQuery<
    By<read::reservation::list::TotalCount, read::reservation::list::Filter>,
>;

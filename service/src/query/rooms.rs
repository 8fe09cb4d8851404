//! [`Query`] collection related to multiple [`Room`]s.

use common::operations::By;

use crate::read;
#[cfg(doc)]
use crate::{domain::Room, Query};

use super::DatabaseQuery;

/// Queries a list of active [`Room`]s.
pub type List =
    DatabaseQuery<By<read::room::list::Page, read::room::list::Selector>>;

/// Queries total count of active [`Room`]s matching the provided filter.
pub type TotalCount =
    DatabaseQuery<By<read::room::list::TotalCount, read::room::list::Filter>>;

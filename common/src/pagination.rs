//! Cursor-based pagination.
//!
//! Every page is selected by a cursor-exclusive window of a stable ordering:
//! [`Direction::Forward`] pages go after the cursor in the ascending order,
//! [`Direction::Backward`] ones go before it in the descending order. Edges of
//! a built [`Page`] are always kept in the ascending order, whichever
//! [`Direction`] was requested.

use derive_more::{Display, Error};

/// Page of `I` nodes identified by `C` cursors.
#[derive(Clone, Debug)]
pub struct Page<C, I> {
    /// [`Edge`]s of this [`Page`] in the ascending order.
    pub edges: Vec<Edge<C, I>>,

    /// [`Direction`] this [`Page`] was requested in.
    pub direction: Direction,

    /// Indicator whether more nodes follow in the requested [`Direction`].
    pub has_more: bool,
}

/// Connection of `I` nodes, as named by GraphQL Cursor Connections.
pub type Connection<C, I> = Page<C, I>;

impl<C, I> Page<C, I> {
    /// Builds a new [`Page`] out of the `nodes` fetched for the provided
    /// [`Arguments`].
    ///
    /// The `nodes` are expected in the order of [`Direction::order()`] and
    /// may contain one extra node (indicating there are more of them).
    #[must_use]
    pub fn new(
        args: &Arguments<C>,
        nodes: impl IntoIterator<Item = impl Into<Edge<C, I>>>,
    ) -> Self {
        let limit = args.limit();
        let mut edges = nodes
            .into_iter()
            .map(Into::into)
            .take(limit.saturating_add(1))
            .collect::<Vec<_>>();
        let has_more = edges.len() > limit;
        edges.truncate(limit);

        let direction = args.direction();
        if direction == Direction::Backward {
            edges.reverse();
        }

        Self {
            edges,
            direction,
            has_more,
        }
    }

    /// Returns [`PageInfo`] of this [`Page`].
    #[must_use]
    pub fn page_info(&self) -> PageInfo<C>
    where
        C: Clone,
    {
        PageInfo {
            start_cursor: self.edges.first().map(|e| e.cursor.clone()),
            end_cursor: self.edges.last().map(|e| e.cursor.clone()),
            has_next_page: self.has_more
                && self.direction == Direction::Forward,
            has_previous_page: self.has_more
                && self.direction == Direction::Backward,
        }
    }
}

/// Information about a [`Page`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PageInfo<C> {
    /// Cursor of the first [`Edge`] on the [`Page`].
    pub start_cursor: Option<C>,

    /// Cursor of the last [`Edge`] on the [`Page`].
    pub end_cursor: Option<C>,

    /// Indicator whether more nodes follow the [`Page`].
    pub has_next_page: bool,

    /// Indicator whether more nodes precede the [`Page`].
    pub has_previous_page: bool,
}

/// Edge of a [`Page`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Edge<C, I> {
    /// Cursor pointing to the `node`.
    pub cursor: C,

    /// The node itself.
    pub node: I,
}

impl<C, I> From<(C, I)> for Edge<C, I> {
    fn from((cursor, node): (C, I)) -> Self {
        Self { cursor, node }
    }
}

/// Arguments requesting a [`Page`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Arguments<C> {
    /// Nodes going after the cursor.
    Forward {
        /// Maximum number of nodes to return.
        first: usize,

        /// Cursor to return nodes after (from the very beginning if
        /// [`None`]).
        after: Option<C>,
    },

    /// Nodes going before the cursor.
    Backward {
        /// Maximum number of nodes to return.
        last: usize,

        /// Cursor to return nodes before (from the very end if [`None`]).
        before: Option<C>,
    },
}

/// Error of combining contradicting pagination arguments (`first` along with
/// `last`, for example).
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("ambiguous pagination arguments")]
pub struct AmbiguousArguments;

impl<C> Arguments<C> {
    /// Builds new [`Arguments`] out of the raw GraphQL-style ones.
    ///
    /// Only one [`Direction`] may be requested at a time. If no limit is
    /// provided, the `default` one is used.
    ///
    /// # Errors
    ///
    /// With [`AmbiguousArguments`] if both directions are requested, or the
    /// provided limit is negative.
    pub fn new<Num>(
        first: Option<Num>,
        after: Option<C>,
        last: Option<Num>,
        before: Option<C>,
        default: Num,
    ) -> Result<Self, AmbiguousArguments>
    where
        Num: TryInto<usize>,
    {
        let limit = |n: Num| n.try_into().map_err(|_| AmbiguousArguments);

        match (first, after, last, before) {
            (first, after, None, None) => Ok(Self::Forward {
                first: limit(first.unwrap_or(default))?,
                after,
            }),
            (None, None, last, before @ Some(_))
            | (None, None, last @ Some(_), before) => Ok(Self::Backward {
                last: limit(last.unwrap_or(default))?,
                before,
            }),
            _ => Err(AmbiguousArguments),
        }
    }

    /// Returns the cursor these [`Arguments`] start from, if any.
    #[must_use]
    pub const fn cursor(&self) -> Option<&C> {
        match self {
            Self::Forward { after, .. } => after.as_ref(),
            Self::Backward { before, .. } => before.as_ref(),
        }
    }

    /// Returns [`Direction`] of these [`Arguments`].
    #[must_use]
    pub const fn direction(&self) -> Direction {
        match self {
            Self::Forward { .. } => Direction::Forward,
            Self::Backward { .. } => Direction::Backward,
        }
    }

    /// Returns maximum number of nodes requested by these [`Arguments`].
    #[must_use]
    pub const fn limit(&self) -> usize {
        match *self {
            Self::Forward { first, .. } => first,
            Self::Backward { last, .. } => last,
        }
    }
}

/// Selector of a [`Page`] with an additional filter.
#[derive(Clone, Copy, Debug)]
pub struct Selector<C, F> {
    /// Pagination [`Arguments`].
    pub arguments: Arguments<C>,

    /// Filter of the nodes.
    pub filter: F,
}

/// Direction of pagination.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Direction {
    /// Towards the end.
    Forward,

    /// Towards the beginning.
    Backward,
}

impl Direction {
    /// Returns comparison operator selecting nodes past a cursor in this
    /// [`Direction`].
    #[must_use]
    pub const fn operator(self) -> &'static str {
        match self {
            Self::Forward => ">",
            Self::Backward => "<",
        }
    }

    /// Returns [`Order`] to fetch nodes in this [`Direction`] with.
    #[must_use]
    pub const fn order(self) -> Order {
        match self {
            Self::Forward => Order::Ascending,
            Self::Backward => Order::Descending,
        }
    }

    /// Checks whether the `node` cursor lies past the `cursor` in this
    /// [`Direction`].
    #[must_use]
    pub fn is_past<C: Ord>(self, node: &C, cursor: &C) -> bool {
        match self {
            Self::Forward => node > cursor,
            Self::Backward => node < cursor,
        }
    }
}

/// Order of fetched nodes.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Order {
    /// Ascending order.
    Ascending,

    /// Descending order.
    Descending,
}

impl Order {
    /// Returns SQL keyword of this [`Order`].
    #[cfg(feature = "postgres")]
    #[must_use]
    pub const fn sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// Defines pagination types for the provided cursor, node and filter.
#[expect(clippy::module_name_repetitions, reason = "more readable")]
#[macro_export]
macro_rules! define_pagination {
    ($cursor:ty, $node:ty, $filter:ty) => {
        #[doc = "Edge of a [`Page`]."]
        pub type Edge = $crate::pagination::Edge<$cursor, $node>;

        #[doc = "Page of nodes."]
        pub type Page = $crate::pagination::Page<$cursor, $node>;

        #[doc = "Connection of nodes."]
        pub type Connection = $crate::pagination::Connection<$cursor, $node>;

        #[doc = "Information about a [`Page`]."]
        pub type PageInfo = $crate::pagination::PageInfo<$cursor>;

        #[doc = "Arguments for selecting a [`Page`]."]
        pub type Arguments = $crate::pagination::Arguments<$cursor>;

        #[doc = "[`Page`] selector."]
        pub type Selector = $crate::pagination::Selector<$cursor, $filter>;
    };
}

#[cfg(test)]
mod spec {
    use super::{Arguments, Direction, Page};

    #[test]
    fn builds_arguments() {
        assert_eq!(
            Arguments::<u8>::new(None, None, None, None, 10).unwrap(),
            Arguments::Forward {
                first: 10,
                after: None,
            },
        );
        assert_eq!(
            Arguments::new(Some(3), Some(7_u8), None, None, 10).unwrap(),
            Arguments::Forward {
                first: 3,
                after: Some(7),
            },
        );
        assert_eq!(
            Arguments::new(None, None, None, Some(7_u8), 10).unwrap(),
            Arguments::Backward {
                last: 10,
                before: Some(7),
            },
        );
        assert_eq!(
            Arguments::<u8>::new(None, None, Some(2), None, 10).unwrap(),
            Arguments::Backward {
                last: 2,
                before: None,
            },
        );
    }

    #[test]
    fn rejects_ambiguous_arguments() {
        type Args = Arguments<u8>;

        assert!(Args::new(Some(1), None, Some(1), None, 10).is_err());
        assert!(Args::new(None, Some(1), None, Some(2), 10).is_err());
        assert!(Args::new(Some(1), None, None, Some(2), 10).is_err());
        assert!(Args::new(Some(-1), None, None, None, 10).is_err());
    }

    #[test]
    fn detects_more_nodes() {
        let args = Arguments::Forward {
            first: 2,
            after: None,
        };

        let page = Page::<u8, char>::new(&args, [(1, 'a'), (2, 'b'), (3, 'c')]);
        assert_eq!(page.edges.len(), 2);
        assert!(page.page_info().has_next_page);
        assert!(!page.page_info().has_previous_page);
        assert_eq!(page.page_info().start_cursor, Some(1));
        assert_eq!(page.page_info().end_cursor, Some(2));

        let page = Page::<u8, char>::new(&args, [(1, 'a'), (2, 'b')]);
        assert!(!page.page_info().has_next_page);
    }

    #[test]
    fn keeps_backward_page_ascending() {
        let args = Arguments::Backward {
            last: 2,
            before: Some(9),
        };

        let page =
            Page::<u8, char>::new(&args, [(8, 'h'), (7, 'g'), (6, 'f')]);
        assert_eq!(
            page.edges.iter().map(|e| e.node).collect::<String>(),
            "gh",
        );
        assert!(page.page_info().has_previous_page);
        assert!(!page.page_info().has_next_page);
    }

    #[test]
    fn compares_cursors_by_direction() {
        assert!(Direction::Forward.is_past(&2, &1));
        assert!(!Direction::Forward.is_past(&1, &1));
        assert!(Direction::Backward.is_past(&1, &2));
        assert!(!Direction::Backward.is_past(&2, &2));
    }
}

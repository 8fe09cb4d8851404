//! GraphQL API definitions.

mod mutation;
mod query;
pub mod reservation;
pub mod room;
pub mod scalar;
mod subscription;
pub mod user;

use crate::define_error;

pub use self::{
    mutation::Mutation, query::Query, reservation::Reservation, room::Room,
    subscription::Subscription,
};

/// GraphQL schema.
pub type Schema = juniper::RootNode<'static, Query, Mutation, Subscription>;

/// Creates a new [`Schema`].
#[must_use]
pub fn schema() -> Schema {
    Schema::new(Query, Mutation, Subscription)
}

define_error! {
    enum PrivilegeError {
        #[code = "NOT_ADMIN"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` must be an admin"]
        Admin,

        #[code = "NOT_PERMITTED"]
        #[status = FORBIDDEN]
        #[message = "Authenticated `User` is not permitted to manage the \
                     `Reservation`"]
        Owner,
    }
}

define_error! {
    enum PaginationError {
        #[code = "AMBIGUOUS_PAGINATION_ARGUMENTS"]
        #[status = BAD_REQUEST]
        #[message = "Ambiguous pagination arguments"]
        Ambiguous,
    }
}

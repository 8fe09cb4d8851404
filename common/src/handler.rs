//! [`Handler`] abstraction.
//!
//! Commands, queries, background tasks and database operations are all
//! expressed as a [`Handler`] of some argument type, so the same value (a
//! service or a database client) may handle many unrelated operations, each
//! with its own output and error types.

use std::future::Future;

/// Asynchronous handler of `Args`.
pub trait Handler<Args = ()> {
    /// Output of a successful execution.
    type Ok;

    /// Error of a failed execution.
    type Err;

    /// Executes this [`Handler`] with the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

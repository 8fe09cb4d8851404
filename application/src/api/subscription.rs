//! GraphQL [`Subscription`]s definitions.

use std::time::Duration;

use futures::stream::{self, BoxStream, StreamExt as _};
use juniper::graphql_subscription;
use service::{query, Query as _};

use crate::{api, AsError, Context, Error};

/// Interval between polls of a watched `Reservation`.
const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Root of all GraphQL subscription.
#[derive(Clone, Copy, Debug)]
pub struct Subscription;

#[graphql_subscription(context = Context)]
impl Subscription {
    /// Streams the status of the `Reservation` with the specified ID.
    ///
    /// Emits the current status first and then every change of it, ending
    /// once the `Reservation` becomes `EXPIRED` or `REFUSED`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated;
    /// - `RESERVATION_NOT_EXISTS` - the `Reservation` with the specified ID
    ///                              does not exist;
    /// - `NOT_PERMITTED` - the current `User` is neither an admin, nor the
    ///                     owner of the `Reservation`.
    pub async fn reservation_status(
        &self,
        id: api::reservation::Id,
        ctx: &Context,
    ) -> Result<
        BoxStream<'static, Result<api::reservation::Status, Error>>,
        Error,
    > {
        let actor = ctx.current_session().await?.actor();
        let id = id.into();

        let owner = ctx
            .service()
            .execute(query::reservation::ById::by(id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::query::ReservationError::NotExists.into())
            .map_err(ctx.error())?
            .user_id;
        if !actor.can_manage(owner) {
            return Err(Error::from(api::PrivilegeError::Owner))
                .map_err(ctx.error());
        }

        let service = ctx.service().clone();
        Ok(stream::unfold(Some((service, None)), move |state| async move {
            let (service, mut last) = state?;
            loop {
                if last.is_some() {
                    tokio::time::sleep(POLL_INTERVAL).await;
                }

                let status = match service
                    .execute(query::reservation::ById::by(id))
                    .await
                {
                    Ok(Some(r)) => r.status,
                    Ok(None) => {
                        let err = api::query::ReservationError::NotExists;
                        return Some((Err(err.into()), None));
                    }
                    Err(e) => return Some((Err(e.into_error()), None)),
                };
                if last == Some(status) {
                    continue;
                }
                last = Some(status);

                let next = (!status.is_terminal()).then_some((service, last));
                return Some((Ok(status.into()), next));
            }
        })
        .boxed())
    }
}

//! [`Command`] for authorizing a [`Session`].

use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::user::{self, session, Session},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] by its [`session::Token`].
///
/// Users are not stored, so a [`Session`] carrying a valid signature and not
/// being expired yet is enough.
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`Session`] token to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db> {
    type Ok = Session;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let AuthorizeUserSession { token } = cmd;

        // Expiration is checked against the `Service` clock instead.
        let mut validation = Validation::default();
        validation.validate_exp = false;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &validation,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        if session.expires_at <= self.clock().now().coerce() {
            return Err(tracerr::new!(E::SessionExpired(session.user_id)));
        }

        Ok(session)
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`Session`] has already expired.
    #[display("`Session` of `User(id: {_0})` has expired")]
    #[from(ignore)]
    SessionExpired(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::{
        command::{fixture, AuthorizeUserSession, CreateUserSession},
        domain::user::{self, session},
        Command as _,
    };

    use super::ExecutionError as E;

    #[tokio::test]
    async fn authorizes_issued_token() {
        let svc = fixture::service();
        let user_id = user::Id::new();
        let issued = svc
            .execute(CreateUserSession {
                user_id,
                role: user::Role::Admin,
                ttl: Duration::from_secs(60),
            })
            .await
            .unwrap();

        let session = svc
            .execute(AuthorizeUserSession {
                token: issued.token,
            })
            .await
            .unwrap();

        assert_eq!(session.user_id, user_id);
        assert_eq!(session.role, user::Role::Admin);
        assert_eq!(session.actor().id, user_id);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let svc = fixture::service();
        let issued = svc
            .execute(CreateUserSession {
                user_id: user::Id::new(),
                role: user::Role::Guest,
                ttl: Duration::ZERO,
            })
            .await
            .unwrap();

        let err = svc
            .execute(AuthorizeUserSession {
                token: issued.token,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), E::SessionExpired(_)), "{err}");
    }

    #[tokio::test]
    async fn rejects_malformed_token() {
        let svc = fixture::service();

        let res = svc
            .execute(AuthorizeUserSession {
                token: "not.a.token".parse::<session::Token>().unwrap(),
            })
            .await;

        assert!(res.is_err());
    }

    #[tokio::test]
    async fn rejects_foreign_signature() {
        let svc = fixture::service();
        let other = fixture::service_with_secret(b"another secret");
        let issued = other
            .execute(CreateUserSession {
                user_id: user::Id::new(),
                role: user::Role::Guest,
                ttl: Duration::from_secs(60),
            })
            .await
            .unwrap();

        let res = svc
            .execute(AuthorizeUserSession {
                token: issued.token,
            })
            .await;

        assert!(res.is_err());
    }
}

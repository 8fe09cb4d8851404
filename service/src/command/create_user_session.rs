//! [`Command`] for creating a [`Session`].

use std::time::Duration;

use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::user::{self, session, Session},
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`] of a user.
///
/// Users are not stored, so the [`Session`] is issued for whatever
/// [`user::Id`] and [`user::Role`] the operator provides.
#[derive(Clone, Copy, Debug)]
pub struct CreateUserSession {
    /// ID of the user to create a [`Session`] for.
    pub user_id: user::Id,

    /// [`user::Role`] of the user.
    pub role: user::Role,

    /// [`Duration`] the [`Session`] stays valid for.
    pub ttl: Duration,
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`session::Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`DateTime`] when the [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db> {
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession { user_id, role, ttl } = cmd;

        let expires_at = (self.clock().now() + ttl).coerce();
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id,
                role,
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        Ok(Output { token, expires_at })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),
}

//! [`Command`] for authorizing a [`Session`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use jsonwebtoken::Validation;
use tracerr::Traced;

use crate::{
    domain::{
        user::{self, session, Session},
        User,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for authorizing a [`Session`] by its [`session::Token`].
#[derive(Clone, Debug, From)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] to authorize.
    pub token: session::Token,
}

/// Output of [`AuthorizeUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Decoded [`Session`].
    pub session: Session,

    /// [`User`] the [`Session`] belongs to.
    pub user: User,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db>
where
    Db: Database<
        Select<By<Option<User>, user::Id>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        AuthorizeUserSession { token }: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let session = jsonwebtoken::decode::<Session>(
            token.as_ref(),
            &self.config().jwt_decoding_key,
            &Validation::default(),
        )
        .map_err(tracerr::from_and_wrap!(=> E))?
        .claims;

        let user = self
            .database()
            .execute(Select(By::new(session.user_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(session.user_id))
            .map_err(tracerr::wrap!())?;

        Ok(Output { session, user })
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] decoding error.
    #[display("Failed to decode a JSON Web Token: {_0}")]
    JsonWebTokenDecodeError(jsonwebtoken::errors::Error),

    /// [`User`] the [`Session`] belongs to does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::CreateUserSession,
        domain::{
            user::{self, session},
            User,
        },
        infra::database::memory::Memory,
        Command as _, Service,
    };

    use super::{AuthorizeUserSession, ExecutionError};

    fn admin() -> User {
        User {
            id: user::Id::new(),
            display_name: user::DisplayName::new("Agent").unwrap(),
            email: None,
            phone: None,
            password_hash: None,
            provider: user::Provider::Google,
            role: user::Role::Admin,
            created_at: user::CreationDateTime::now(),
            last_login_at: None,
        }
    }

    #[tokio::test]
    async fn resolves_session_user() {
        let db = Memory::default();
        let admin = admin();
        db.users().push(admin.clone());
        let service = Service::for_tests(db);

        let signed_in = service
            .execute(CreateUserSession::ByUserId(admin.id))
            .await
            .unwrap();
        let out = service
            .execute(AuthorizeUserSession {
                token: signed_in.token,
            })
            .await
            .unwrap();

        assert_eq!(out.session.user_id, admin.id);
        assert!(out.user.is_admin());
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let service = Service::for_tests(Memory::default());

        let err = service
            .execute(AuthorizeUserSession {
                token: "not-a-jwt".parse::<session::Token>().unwrap(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::JsonWebTokenDecodeError(_),
        ));
    }

    #[tokio::test]
    async fn rejects_session_of_removed_user() {
        let db = Memory::default();
        let admin = admin();
        db.users().push(admin.clone());
        let service = Service::for_tests(db.clone());
        let signed_in = service
            .execute(CreateUserSession::ByUserId(admin.id))
            .await
            .unwrap();
        db.users().clear();

        let err = service
            .execute(AuthorizeUserSession {
                token: signed_in.token,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}

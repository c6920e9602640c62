//! [`Command`] for registering a new [`User`] by email and password.

use common::operations::{By, Commit, Insert, Select, Transact, Transacted};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::{DisplayName, Email, Password};
use crate::{
    domain::{user, User},
    infra::{
        database::{self, Constraint},
        Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for registering a new [`User`] by email and password.
#[derive(Debug)]
pub struct CreateUser {
    /// [`Email`] of a new [`User`].
    pub email: user::Email,

    /// [`Password`] of a new [`User`].
    pub password: SecretBox<user::Password>,

    /// [`DisplayName`] of a new [`User`].
    ///
    /// Derived from the [`Email`], if [`None`].
    pub display_name: Option<user::DisplayName>,
}

impl<Db> Command<CreateUser> for Service<Db>
where
    Db: for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<User>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = User;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUser {
            email,
            password,
            display_name,
        } = cmd;

        let existing = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::EmailOccupied(email)));
        }

        let user = User {
            id: user::Id::new(),
            display_name: display_name
                .unwrap_or_else(|| user::DisplayName::from_email(&email)),
            email: Some(email.clone()),
            phone: None,
            password_hash: Some(user::PasswordHash::new(
                password.expose_secret(),
            )),
            provider: user::Provider::Password,
            role: user::Role::User,
            created_at: user::CreationDateTime::now(),
            last_login_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(user.clone()))
            .await
            .map_err(|e| {
                if e
                    .as_ref()
                    .is_unique_violation(Some(Constraint::UserEmail))
                {
                    return tracerr::new!(E::EmailOccupied(email.clone()));
                }
                let wrap = tracerr::map_from_and_wrap!(=> E);
                wrap(e)
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`User(id: {})` signed up by email", user.id);

        Ok(user)
    }
}

/// Error of [`CreateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Email`] is already used by another [`User`].
    #[display("`{_0}` email is occupied")]
    #[from(ignore)]
    EmailOccupied(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        domain::user::{self, DisplayName, Email, Password},
        infra::database::memory::Memory,
        Command as _, Service,
    };

    use super::{CreateUser, ExecutionError};

    fn sign_up(email: &str, display_name: Option<&str>) -> CreateUser {
        CreateUser {
            email: Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                Password::new("secret-pass").unwrap(),
            )),
            display_name: display_name.map(|n| DisplayName::new(n).unwrap()),
        }
    }

    #[tokio::test]
    async fn registers_regular_user() {
        let db = Memory::default();
        let service = Service::for_tests(db.clone());

        let user = service
            .execute(sign_up("traveller@example.com", None))
            .await
            .unwrap();

        assert_eq!(user.display_name.to_string(), "traveller");
        assert_eq!(user.role, user::Role::User);
        assert_eq!(user.provider, user::Provider::Password);
        assert!(user
            .password_hash
            .as_ref()
            .unwrap()
            .verify(&Password::new("secret-pass").unwrap()));
        assert_eq!(db.users().len(), 1);
    }

    #[tokio::test]
    async fn keeps_provided_display_name() {
        let service = Service::for_tests(Memory::default());

        let user = service
            .execute(sign_up("traveller@example.com", Some("Asha")))
            .await
            .unwrap();

        assert_eq!(user.display_name.to_string(), "Asha");
    }

    #[tokio::test]
    async fn rejects_occupied_email() {
        let db = Memory::default();
        let service = Service::for_tests(db.clone());
        drop(
            service
                .execute(sign_up("traveller@example.com", None))
                .await
                .unwrap(),
        );

        let err = service
            .execute(sign_up("Traveller@Example.com", None))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
        assert_eq!(db.users().len(), 1);
    }
}

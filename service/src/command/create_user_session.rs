//! [`Command`] for creating a [`Session`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::{session::Token, Email, Password, Phone};
use crate::{
    domain::{
        user::{self, otp, session, Session},
        User,
    },
    infra::{
        database::{self, Constraint},
        Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for creating a [`Session`].
#[derive(Debug, From)]
pub enum CreateUserSession {
    /// Create a new [`Session`] by [`User`] credentials.
    #[from(ignore)]
    ByCredentials {
        /// [`Email`] of a [`User`].
        email: user::Email,

        /// [`Password`] of a [`User`].
        password: SecretBox<user::Password>,
    },

    /// Create a new [`Session`] by [`User`] ID.
    ByUserId(user::Id),

    /// Create a new [`Session`] by a one-time code sent to a [`Phone`].
    ///
    /// A new [`User`] is signed up on the first sign-in.
    #[from(ignore)]
    ByPhoneOtp {
        /// [`Phone`] the code was sent to.
        phone: user::Phone,

        /// One-time code received on the [`Phone`].
        code: otp::Code,
    },
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`Token`] of the created [`Session`].
    pub token: session::Token,

    /// [`User`] whose [`Session`] has been created.
    pub user: User,

    /// [`DateTime`] when the [`Session`] expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: session::ExpirationDateTime,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'e> Database<
            Select<By<Option<User>, &'e user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'p> Database<
            Select<By<Option<User>, &'p user::Phone>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use CreateUserSession as Cmd;
        use ExecutionError as E;

        let user = match cmd {
            Cmd::ByCredentials { email, password } => {
                let user = self
                    .database()
                    .execute(Select(By::new(&email)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .ok_or(E::WrongCredentials)
                    .map_err(tracerr::wrap!())?;

                let matches = user
                    .password_hash
                    .as_ref()
                    .is_some_and(|h| h.verify(password.expose_secret()));
                if !matches {
                    return Err(tracerr::new!(E::WrongCredentials));
                }

                self.record_login(user).await.map_err(tracerr::wrap!())?
            }
            Cmd::ByUserId(user_id) => self
                .database()
                .execute(Select(By::new(user_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::UserNotExists(user_id))
                .map_err(tracerr::wrap!())?,
            Cmd::ByPhoneOtp { phone, code } => {
                let now = otp::ExpirationDateTime::now();
                match self.otp().verify(&phone, &code, now) {
                    Some(otp::Verdict::Accepted) => {}
                    Some(otp::Verdict::Rejected { attempts_left }) => {
                        return Err(tracerr::new!(E::WrongCode {
                            attempts_left
                        }));
                    }
                    Some(otp::Verdict::Exhausted) => {
                        return Err(tracerr::new!(E::TooManyAttempts));
                    }
                    Some(otp::Verdict::Expired) => {
                        return Err(tracerr::new!(E::CodeExpired));
                    }
                    None => return Err(tracerr::new!(E::NoPendingCode)),
                }

                if let Some(user) = self.user_by_phone(&phone).await? {
                    self.record_login(user).await.map_err(tracerr::wrap!())?
                } else {
                    log::info!("signing up a new `User` by phone");
                    let user = User {
                        id: user::Id::new(),
                        display_name: user::DisplayName::from_phone(&phone),
                        email: None,
                        phone: Some(phone.clone()),
                        password_hash: None,
                        provider: user::Provider::Phone,
                        role: user::Role::User,
                        created_at: user::CreationDateTime::now(),
                        last_login_at: None,
                    };
                    match self.record_login(user).await {
                        Err(e) if e.as_ref().is_phone_taken() => {
                            log::info!(
                                "the phone was signed up concurrently, \
                                 signing in its `User` instead",
                            );
                            let user = self
                                .user_by_phone(&phone)
                                .await?
                                .ok_or(e)?;
                            self.record_login(user)
                                .await
                                .map_err(tracerr::wrap!())?
                        }
                        res => res.map_err(tracerr::wrap!())?,
                    }
                }
            }
        };

        let expires_at =
            session::ExpirationDateTime::now() + self.config().session_ttl;
        let token = jsonwebtoken::encode::<Session>(
            &jsonwebtoken::Header::default(),
            &Session {
                user_id: user.id,
                expires_at,
            },
            &self.config().jwt_encoding_key,
        )
        .map_err(tracerr::from_and_wrap!(=> E))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid
        //         `session::Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { session::Token::new_unchecked(token) };

        Ok(Output {
            token,
            user,
            expires_at,
        })
    }
}

impl<Db> Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<User, user::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    /// Looks up the [`User`] signed up with the provided [`Phone`].
    async fn user_by_phone(
        &self,
        phone: &user::Phone,
    ) -> Result<Option<User>, Traced<ExecutionError>>
    where
        Db: for<'p> Database<
            Select<By<Option<User>, &'p user::Phone>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        >,
    {
        self.database()
            .execute(Select(By::new(phone)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> ExecutionError))
    }

    /// Stores the provided [`User`] as signed in just now.
    async fn record_login(
        &self,
        mut user: User,
    ) -> Result<User, Traced<ExecutionError>> {
        use ExecutionError as E;

        user.last_login_at = Some(user::LoginDateTime::now());

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Lock(By::new(user.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Update(user.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(user)
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`jsonwebtoken`] encoding error.
    #[display("Failed to encode a JSON Web Token: {_0}")]
    JsonWebTokenEncodeError(jsonwebtoken::errors::Error),

    /// [`User`] with the provided ID does not exist.
    #[display("`User(id: {_0})` does not exist")]
    #[from(ignore)]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`CreateUserSession::ByCredentials`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,

    /// No one-time code was requested for the [`Phone`].
    #[display("No one-time code is pending for this phone")]
    #[from(ignore)]
    NoPendingCode,

    /// One-time code doesn't match.
    #[display("Wrong one-time code, {attempts_left} attempts left")]
    #[from(ignore)]
    WrongCode {
        /// Number of attempts left.
        attempts_left: u8,
    },

    /// Too many wrong one-time codes were provided.
    #[display("Too many wrong one-time codes, request a new one")]
    #[from(ignore)]
    TooManyAttempts,

    /// One-time code has expired.
    #[display("One-time code has expired, request a new one")]
    #[from(ignore)]
    CodeExpired,
}

impl ExecutionError {
    /// Indicates whether this [`ExecutionError`] is caused by the [`Phone`]
    /// being signed up by another [`User`] already.
    fn is_phone_taken(&self) -> bool {
        matches!(
            self,
            Self::Db(e) if e.is_unique_violation(Some(Constraint::UserPhone)),
        )
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use secrecy::SecretBox;

    use crate::{
        command::CreateUser,
        domain::user::{self, otp, Email, Password, Phone},
        infra::database::memory::Memory,
        Command as _, Service,
    };

    use super::{CreateUserSession, ExecutionError};

    fn credentials(email: &str, password: &str) -> CreateUserSession {
        CreateUserSession::ByCredentials {
            email: Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                Password::new(password).unwrap(),
            )),
        }
    }

    async fn signed_up(service: &Service<Memory>) -> user::Id {
        service
            .execute(CreateUser {
                email: Email::new("traveller@example.com").unwrap(),
                password: SecretBox::new(Box::new(
                    Password::new("secret-pass").unwrap(),
                )),
                display_name: None,
            })
            .await
            .map(|user| user.id)
            .unwrap()
    }

    #[tokio::test]
    async fn signs_in_by_credentials() {
        let service = Service::for_tests(Memory::default());
        let id = signed_up(&service).await;

        let out = service
            .execute(credentials("Traveller@Example.com", "secret-pass"))
            .await
            .unwrap();

        assert_eq!(out.user.id, id);
        assert!(out.user.last_login_at.is_some());
        assert!(!out.token.as_ref().is_empty());
    }

    #[tokio::test]
    async fn rejects_wrong_password() {
        let service = Service::for_tests(Memory::default());
        let _ = signed_up(&service).await;

        let err = service
            .execute(credentials("traveller@example.com", "wrong-pass"))
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::WrongCredentials));
    }

    #[tokio::test]
    async fn signs_up_by_phone_on_first_sign_in() {
        let db = Memory::default();
        let service = Service::for_tests(db.clone());
        let phone = Phone::new("+919876543210").unwrap();
        let code =
            service.otp().issue(phone.clone(), Duration::from_secs(300), 3);

        let out = service
            .execute(CreateUserSession::ByPhoneOtp {
                phone: phone.clone(),
                code: code.clone(),
            })
            .await
            .unwrap();

        assert_eq!(out.user.phone.as_ref(), Some(&phone));
        assert_eq!(out.user.provider, user::Provider::Phone);
        assert_eq!(out.user.display_name.to_string(), "User 3210");
        assert_eq!(db.users().len(), 1);

        let err = service
            .execute(CreateUserSession::ByPhoneOtp { phone, code })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::NoPendingCode));
    }

    #[tokio::test]
    async fn counts_wrong_codes() {
        let service = Service::for_tests(Memory::default());
        let phone = Phone::new("+919876543210").unwrap();
        let code =
            service.otp().issue(phone.clone(), Duration::from_secs(300), 2);
        let wrong = otp::Code::new(if code.as_ref() == "000000" {
            "111111"
        } else {
            "000000"
        })
        .unwrap();

        let err = service
            .execute(CreateUserSession::ByPhoneOtp {
                phone: phone.clone(),
                code: wrong.clone(),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::WrongCode { attempts_left: 1 },
        ));

        let err = service
            .execute(CreateUserSession::ByPhoneOtp { phone, code: wrong })
            .await
            .unwrap_err();
        assert!(matches!(err.as_ref(), ExecutionError::TooManyAttempts));
    }
}

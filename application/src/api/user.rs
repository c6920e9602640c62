//! [`User`]-related definitions.

use std::future;

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use futures::TryFutureExt as _;
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::{
    api::{self, scalar},
    AsError, Context, Error,
};

/// A [`User`] of the system.
#[derive(Clone, Debug, From)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`domain::User`] representing this [`User`].
    user: OnceCell<domain::User>,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        Self {
            id: user.id.into(),
            user: OnceCell::new_with(Some(user)),
        }
    }
}

impl User {
    /// Creates a new [`User`] with the provided ID.
    ///
    /// # Safety
    ///
    /// Caller must ensure that [`User`] with the provided ID exists,
    /// otherwise accessing this [`User`] will result with an error.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(id: impl Into<Id>) -> Self {
        Self {
            id: id.into(),
            user: OnceCell::new(),
        }
    }

    /// Returns the [`domain::User`] representing this [`User`].
    ///
    /// # Errors
    ///
    /// Error if the [`domain::User`] doesn't exist.
    async fn user(&self, ctx: &Context) -> Result<&domain::User, Error> {
        let id = self.id.into();
        self.user
            .get_or_try_init(|| {
                ctx.service()
                    .execute(query::user::ById::by(id))
                    .map_err(AsError::into_error)
                    .map_err(ctx.error())
                    .and_then(|u| {
                        future::ready(u.ok_or_else(|| {
                            api::query::UserError::NotExists.into()
                        }))
                    })
            })
            .await
    }

    /// Indicates whether the contacts of this [`User`] may be shown to the
    /// current one.
    ///
    /// Only the [`User`] itself and administrators see them.
    async fn contacts_visible(&self, ctx: &Context) -> Result<bool, Error> {
        Ok(ctx
            .try_current_session()
            .await?
            .is_some_and(|s| s.user_id == self.id || s.is_admin()))
    }
}

/// A `User` of the system.
#[graphql_object(context = Context)]
impl User {
    /// Unique identifier of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.id
    }

    /// Name of this `User` shown to others.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.displayName",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn display_name(
        &self,
        ctx: &Context,
    ) -> Result<DisplayName, Error> {
        Ok(self.user(ctx).await?.display_name.clone().into())
    }

    /// Email of this `User`.
    ///
    /// Hidden from anyone but this `User` and administrators.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.email",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn email(&self, ctx: &Context) -> Result<Option<Email>, Error> {
        Ok(if self.contacts_visible(ctx).await? {
            self.user(ctx).await?.email.clone().map(Into::into)
        } else {
            None
        })
    }

    /// Phone of this `User`.
    ///
    /// Hidden from anyone but this `User` and administrators.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.phone",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn phone(&self, ctx: &Context) -> Result<Option<Phone>, Error> {
        Ok(if self.contacts_visible(ctx).await? {
            self.user(ctx).await?.phone.clone().map(Into::into)
        } else {
            None
        })
    }

    /// Role of this `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.role",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn role(&self, ctx: &Context) -> Result<Role, Error> {
        Ok(self.user(ctx).await?.role.into())
    }

    /// Way this `User` signed up.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.provider",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn provider(&self, ctx: &Context) -> Result<Provider, Error> {
        Ok(self.user(ctx).await?.provider.into())
    }

    /// `DateTime` when this `User` was created.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.createdAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn created_at(&self, ctx: &Context) -> Result<DateTime, Error> {
        Ok(self.user(ctx).await?.created_at.coerce())
    }

    /// `DateTime` when this `User` signed in last time.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "User.lastLoginAt",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn last_login_at(
        &self,
        ctx: &Context,
    ) -> Result<Option<DateTime>, Error> {
        Ok(self.user(ctx).await?.last_login_at.map(|at| at.coerce()))
    }
}

/// Unique identifier of a `User`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::user::Id)]
#[into(domain::user::Id)]
#[graphql(name = "UserId", transparent)]
pub struct Id(Uuid);

/// Name of a `User` shown to others.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserDisplayName",
    with = scalar::Via::<domain::user::DisplayName>,
)]
pub struct DisplayName(domain::user::DisplayName);

/// Password of a `User`.
#[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPassword",
    with = scalar::Via::<domain::user::Password>,
)]
pub struct Password(domain::user::Password);

/// Email of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserEmail",
    with = scalar::Via::<domain::user::Email>,
)]
pub struct Email(domain::user::Email);

/// Phone of a `User`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "UserPhone",
    with = scalar::Via::<domain::user::Phone>,
)]
pub struct Phone(domain::user::Phone);

/// Role of a `User`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "UserRole")]
pub enum Role {
    /// Regular customer.
    User,

    /// Agency staff managing packages.
    Admin,
}

impl From<domain::user::Role> for Role {
    fn from(role: domain::user::Role) -> Self {
        use domain::user::Role as R;

        match role {
            R::User => Self::User,
            R::Admin => Self::Admin,
        }
    }
}

/// Way a `User` signed up.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "UserProvider")]
pub enum Provider {
    /// Email and password.
    Password,

    /// Phone verified with a one-time code.
    Phone,

    /// Hosted Google sign-in.
    Google,
}

impl From<domain::user::Provider> for Provider {
    fn from(provider: domain::user::Provider) -> Self {
        use domain::user::Provider as P;

        match provider {
            P::Password => Self::Password,
            P::Phone => Self::Phone,
            P::Google => Self::Google,
        }
    }
}

pub mod session {
    //! [`Session`]-related definitions.
    //!
    //! [`Session`]: crate::Session

    use common::DateTime;
    use derive_more::{AsRef, From, Into};
    use juniper::{GraphQLObject, GraphQLScalar};
    use service::{command, domain};

    use crate::{
        api::{self, scalar},
        Context, Session,
    };

    /// `Session` access token.
    #[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "UserAuthToken",
        with = scalar::Via::<domain::user::session::Token>,
    )]
    pub struct Token(domain::user::session::Token);

    /// One-time code sent to a `UserPhone`.
    #[derive(AsRef, Clone, Debug, From, GraphQLScalar, Into)]
    #[graphql(
        name = "UserOtpCode",
        with = scalar::Via::<domain::user::otp::Code>,
    )]
    pub struct OtpCode(domain::user::otp::Code);

    /// Result of a `Session` creation.
    #[derive(Clone, Debug, From, GraphQLObject)]
    #[graphql(context = Context, name = "CreateSessionResult")]
    pub struct CreateResult {
        /// Access token of the created `Session`.
        pub token: Token,

        /// `User` associated with the created `Session`.
        pub user: api::User,

        /// `DateTime` when the created `Session` expires.
        pub expires_at: DateTime,
    }

    impl CreateResult {
        /// Converts the provided [`command::create_user_session::Output`]
        /// into a [`CreateResult`] along with the [`Session`] it represents.
        #[must_use]
        pub fn with_session(
            output: command::create_user_session::Output,
        ) -> (Self, Session) {
            let command::create_user_session::Output {
                token,
                user,
                expires_at,
            } = output;
            let session = Session {
                user_id: user.id.into(),
                role: user.role,
                token: token.clone(),
                expires_at: expires_at.coerce(),
            };
            let result = Self {
                token: token.into(),
                user: user.into(),
                expires_at: expires_at.coerce(),
            };
            (result, session)
        }
    }

    /// Result of a one-time code request.
    #[derive(Clone, Copy, Debug, GraphQLObject)]
    #[graphql(context = Context, name = "RequestOtpResult")]
    pub struct RequestOtpResult {
        /// `DateTime` when the sent one-time code expires.
        pub expires_at: DateTime,
    }

    impl From<command::request_phone_otp::Output> for RequestOtpResult {
        fn from(output: command::request_phone_otp::Output) -> Self {
            Self {
                expires_at: output.expires_at.coerce(),
            }
        }
    }
}

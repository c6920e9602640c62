//! GraphQL [`Mutation`]s definitions.

use common::Price;
use juniper::graphql_object;
use service::{command, domain::package, Command as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Registers a new `User` with the provided email and password, and
    /// signs it in.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `EMAIL_OCCUPIED` - provided `UserEmail` is used by another `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            display_name = ?display_name.as_ref().map(ToString::to_string),
            email = %email,
            gql.name = "createUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user(
        email: api::user::Email,
        password: api::user::Password,
        display_name: Option<api::user::DisplayName>,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let user = ctx
            .service()
            .execute(command::CreateUser {
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
                display_name: display_name.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByUserId(user.id))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        let (result, session) =
            api::user::session::CreateResult::with_session(output);
        ctx.set_current_session(session).await;
        Ok(result)
    }

    /// Signs in the `User` with the provided email and password.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `WRONG_CREDENTIALS` - provided credentials does not match any `User`.
    #[tracing::instrument(
        skip_all,
        fields(
            email = %email,
            gql.name = "createUserSession",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_user_session(
        email: api::user::Email,
        password: api::user::Password,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByCredentials {
                email: email.into(),
                password: secrecy::SecretBox::init_with(move || {
                    password.into()
                }),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        let (result, session) =
            api::user::session::CreateResult::with_session(output);
        ctx.set_current_session(session).await;
        Ok(result)
    }

    /// Sends a one-time code to the provided phone, replacing the pending
    /// one, if any.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "requestPhoneOtp",
            otel.name = Self::SPAN_NAME,
            phone = %phone,
        ),
    )]
    pub async fn request_phone_otp(
        phone: api::user::Phone,
        ctx: &Context,
    ) -> Result<api::user::session::RequestOtpResult, Error> {
        ctx.service()
            .execute(command::RequestPhoneOtp {
                phone: phone.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Signs in with the one-time code sent to the provided phone.
    ///
    /// A new `User` is registered on the first sign-in.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NO_PENDING_CODE` - no one-time code was requested for the phone;
    /// - `WRONG_CODE` - provided one-time code does not match;
    /// - `CODE_EXPIRED` - the one-time code has expired;
    /// - `TOO_MANY_ATTEMPTS` - too many wrong one-time codes were provided.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createUserSessionByPhone",
            otel.name = Self::SPAN_NAME,
            phone = %phone,
        ),
    )]
    pub async fn create_user_session_by_phone(
        phone: api::user::Phone,
        code: api::user::session::OtpCode,
        ctx: &Context,
    ) -> Result<api::user::session::CreateResult, Error> {
        let output = ctx
            .service()
            .execute(command::CreateUserSession::ByPhoneOtp {
                phone: phone.into(),
                code: code.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?;

        let (result, session) =
            api::user::session::CreateResult::with_session(output);
        ctx.set_current_session(session).await;
        Ok(result)
    }

    /// Creates a new `Package` out of the required fields.
    ///
    /// Everything else gets its default value, to be filled in later with
    /// `updatePackage`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `SLUG_OCCUPIED` - the `PackageSlug` is used by another `Package`;
    /// - `SLUG_UNDERIVABLE` - no `PackageSlug` is provided, and it cannot be
    ///                        derived from the `PackageName`;
    /// - `INVALID_DURATION` - the `PackageDuration` has no days.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            gql.name = "createPackage",
            name = %name,
            otel.name = Self::SPAN_NAME,
            slug = ?slug.as_ref().map(ToString::to_string),
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "still readable")]
    pub async fn create_package(
        name: api::package::Name,
        slug: Option<api::package::Slug>,
        price: Price,
        description: api::package::Description,
        category: Option<api::package::Category>,
        #[graphql(name = "type")] r#type: Option<api::package::Type>,
        duration: Option<api::package::DurationInput>,
        ctx: &Context,
    ) -> Result<api::Package, Error> {
        _ = ctx.current_admin_session().await?;

        let duration = duration
            .map(package::Duration::try_from)
            .transpose()
            .map_err(ctx.error())?;
        ctx.service()
            .execute(command::CreatePackage {
                name: name.into(),
                slug: slug.map(Into::into),
                price,
                description: description.into(),
                category: category.map(Into::into),
                r#type: r#type.map(Into::into),
                duration,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Overwrites the `Package` with the provided whole document.
    ///
    /// Concurrent writes are not merged, the last one wins.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `PACKAGE_NOT_EXISTS` - the `Package` with the provided ID does not
    ///                          exist;
    /// - `SLUG_OCCUPIED` - the `PackageSlug` is used by another `Package`;
    /// - `INVALID_DURATION` - the `PackageDuration` has no days;
    /// - `INVALID_REVIEWS_COUNT` - the `reviewsCount` is negative;
    /// - `DUPLICATE_COST_ID` - several cost columns or rows share an
    ///                         identifier.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updatePackage",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn update_package(
        id: api::package::Id,
        document: api::package::Input,
        ctx: &Context,
    ) -> Result<api::Package, Error> {
        _ = ctx.current_admin_session().await?;

        let document =
            package::Document::try_from(document).map_err(ctx.error())?;
        ctx.service()
            .execute(command::UpdatePackage {
                id: id.into(),
                document,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Package` permanently.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - the current `User` is not an administrator;
    /// - `PACKAGE_NOT_EXISTS` - the `Package` with the provided ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deletePackage",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_package(
        id: api::package::Id,
        ctx: &Context,
    ) -> Result<api::package::Id, Error> {
        _ = ctx.current_admin_session().await?;

        ctx.service()
            .execute(command::DeletePackage { id: id.into() })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|()| id)
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "EMAIL_OCCUPIED"]
                #[status = CONFLICT]
                #[message = "`UserEmail` is used by another `User`"]
                EmailOccupied,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::EmailOccupied(_) => Some(Error::EmailOccupied.into()),
        }
    }
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = FORBIDDEN]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,

                #[code = "NO_PENDING_CODE"]
                #[status = BAD_REQUEST]
                #[message = "No one-time code was requested for the phone"]
                NoPendingCode,

                #[code = "WRONG_CODE"]
                #[status = FORBIDDEN]
                #[message = "Provided one-time code does not match"]
                WrongCode,

                #[code = "TOO_MANY_ATTEMPTS"]
                #[status = TOO_MANY_REQUESTS]
                #[message = "Too many wrong one-time codes, request a new one"]
                TooManyAttempts,

                #[code = "CODE_EXPIRED"]
                #[status = GONE]
                #[message = "One-time code has expired, request a new one"]
                CodeExpired,
            }
        }

        Some(match self {
            Self::Db(e) => return e.try_as_error(),
            Self::JsonWebTokenEncodeError(_) => return None,
            Self::UserNotExists(_) | Self::WrongCredentials => {
                Error::WrongCredentials.into()
            }
            Self::NoPendingCode => Error::NoPendingCode.into(),
            Self::WrongCode { attempts_left } => {
                let mut err = crate::Error::from(Error::WrongCode);
                err.message = format!("{}, {attempts_left} left", err.message);
                err
            }
            Self::TooManyAttempts => Error::TooManyAttempts.into(),
            Self::CodeExpired => Error::CodeExpired.into(),
        })
    }
}

define_error! {
    enum SlugError {
        #[code = "SLUG_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`PackageSlug` is used by another `Package`"]
        Occupied,

        #[code = "SLUG_UNDERIVABLE"]
        #[status = BAD_REQUEST]
        #[message = "`PackageSlug` cannot be derived from the `PackageName`"]
        Underivable,
    }
}

impl AsError for command::create_package::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::SlugOccupied(_) => Some(SlugError::Occupied.into()),
            Self::SlugUnderivable => Some(SlugError::Underivable.into()),
        }
    }
}

impl AsError for command::update_package::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PackageNotExists(_) => {
                Some(api::query::PackageError::NotExists.into())
            }
            Self::SlugOccupied(_) => Some(SlugError::Occupied.into()),
        }
    }
}

impl AsError for command::delete_package::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PackageNotExists(_) => {
                Some(api::query::PackageError::NotExists.into())
            }
        }
    }
}

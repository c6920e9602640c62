//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, read, Query as _};

use crate::{api, define_error, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns the currently authenticated `User`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - the request is not authenticated.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "myUser",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn my_user(ctx: &Context) -> Result<api::User, Error> {
        let my_id = ctx.current_session().await?.user_id;
        ctx.service()
            .execute(query::user::ById::by(my_id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| UserError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Package` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PACKAGE_NOT_EXISTS` - the `Package` with the specified ID does not
    ///                          exist.
    #[tracing::instrument(
        skip_all,
        fields(
            id = %id,
            gql.name = "package",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn package(
        id: api::package::Id,
        ctx: &Context,
    ) -> Result<api::Package, Error> {
        ctx.service()
            .execute(query::package::ById::by(id.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PackageError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Package` with the specified slug.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `PACKAGE_NOT_EXISTS` - the `Package` with the specified slug does
    ///                          not exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "packageBySlug",
            otel.name = Self::SPAN_NAME,
            slug = %slug,
        ),
    )]
    pub async fn package_by_slug(
        slug: api::package::Slug,
        ctx: &Context,
    ) -> Result<api::Package, Error> {
        ctx.service()
            .execute(query::package::BySlug::by(slug.into()))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| PackageError::NotExists.into())
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Lists `Package`s, newest first.
    ///
    /// Every provided argument narrows the list down.
    #[tracing::instrument(
        skip_all,
        fields(
            category = ?category,
            featured = ?featured,
            gql.name = "packages",
            kind = ?r#type.as_ref().map(ToString::to_string),
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn packages(
        category: Option<api::package::Category>,
        #[graphql(name = "type")] r#type: Option<api::package::Type>,
        featured: Option<bool>,
        ctx: &Context,
    ) -> Result<Vec<api::Package>, Error> {
        ctx.service()
            .execute(query::packages::List::by(read::package::list::Filter {
                category: category.map(Into::into),
                r#type: r#type.map(Into::into),
                featured,
            }))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(|list| list.into_iter().map(Into::into).collect())
    }
}

define_error! {
    enum PackageError {
        #[code = "PACKAGE_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`Package` with the specified key does not exist"]
        NotExists,
    }
}

define_error! {
    enum UserError {
        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the specified ID does not exist"]
        NotExists,
    }
}

//! GraphQL [`Subscription`]s definitions.

use common::{
    operations::{By, Watch},
    DateTime,
};
use futures::{
    stream::{self, BoxStream},
    FutureExt as _, StreamExt as _,
};
use juniper::graphql_subscription;
use service::{domain, query::package::Watching, Query as _};

use crate::{api, context, AsError, Context, Error};

/// Live stream of a `Package` state.
type PackageStream = BoxStream<'static, Result<Option<api::Package>, Error>>;

/// Root of all GraphQL subscription.
#[derive(Clone, Copy, Debug)]
pub struct Subscription;

impl Subscription {
    /// Name of the [`tracing::Span`] for the subscriptions.
    const SPAN_NAME: &'static str = "GraphQL subscription";

    /// Converts the provided [`Watching`] stream into a [`PackageStream`].
    fn package_stream(watching: Watching) -> PackageStream {
        watching
            .map(|emission| {
                emission
                    .map(|pkg| pkg.map(Into::into))
                    .map_err(AsError::into_error)
            })
            .boxed()
    }
}

#[graphql_subscription(context = Context)]
impl Subscription {
    /// Subscription waiting for the current authenticated session to expire.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `AUTHORIZATION_REQUIRED` - if the current session is not
    ///                              authenticated or session expired.
    pub async fn wait_session(
        &self,
        ctx: &Context,
    ) -> Result<BoxStream<'static, Result<bool, Error>>, Error> {
        let session = ctx.current_session().await?;
        let timeout = session.expires_at - DateTime::now();
        Ok(stream::once(
            tokio::time::sleep(timeout).map(|()| {
                Err(context::AuthError::AuthorizationRequired.into())
            }),
        )
        .boxed())
    }

    /// Live state of the `Package` with the specified ID.
    ///
    /// Emits the current state first, and then the state after every change,
    /// with `null` meaning the `Package` does not exist (or was deleted).
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SUBSCRIPTION_LAGGED` - the subscriber fell behind the changes and
    ///                           should resubscribe.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "package",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn package(
        &self,
        id: api::package::Id,
        ctx: &Context,
    ) -> Result<PackageStream, Error> {
        let by = By::<Option<domain::Package>, domain::package::Id>::new(
            id.into(),
        );
        ctx.service()
            .execute(Watch(by))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Self::package_stream)
    }

    /// Live state of the `Package` with the specified slug.
    ///
    /// Follows the slug rather than a `Package`: renaming a `Package` away
    /// from it emits `null`, and taking it by another one emits that one.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `SUBSCRIPTION_LAGGED` - the subscriber fell behind the changes and
    ///                           should resubscribe.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "packageBySlug",
            otel.name = Self::SPAN_NAME,
            slug = %slug,
        ),
    )]
    pub async fn package_by_slug(
        &self,
        slug: api::package::Slug,
        ctx: &Context,
    ) -> Result<PackageStream, Error> {
        let by = By::<Option<domain::Package>, domain::package::Slug>::new(
            slug.into(),
        );
        ctx.service()
            .execute(Watch(by))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Self::package_stream)
    }
}

//! [`Query`] collection related to a single [`Package`].

use common::operations::{By, Select, Watch};
use futures::{future, stream, stream::BoxStream, StreamExt as _};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracerr::Traced;

use crate::{
    domain::{package, Package},
    infra::{database, feed, feed::Change, Database},
    Service,
};

use super::{DatabaseQuery, Query};

/// Queries a [`Package`] by its [`package::Id`].
pub type ById = DatabaseQuery<By<Option<Package>, package::Id>>;

/// Queries a [`Package`] by its [`package::Slug`].
pub type BySlug = DatabaseQuery<By<Option<Package>, package::Slug>>;

/// Watches a [`Package`] by its [`package::Id`].
pub type WatchById = Watch<By<Option<Package>, package::Id>>;

/// Watches a [`Package`] by its [`package::Slug`].
pub type WatchBySlug = Watch<By<Option<Package>, package::Slug>>;

/// Live stream of a watched [`Package`].
///
/// Yields the current state first, and then the state after every committed
/// [`Change`] of it, with [`None`] meaning the [`Package`] doesn't exist.
pub type Watching = BoxStream<'static, Result<Option<Package>, feed::Error>>;

impl<Db, K> Query<Watch<By<Option<Package>, K>>> for Service<Db>
where
    Db: Database<
        Select<By<Option<Package>, K>>,
        Ok = Option<Package>,
        Err = Traced<database::Error>,
    >,
    K: Key,
{
    type Ok = Watching;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Watch(by): Watch<By<Option<Package>, K>>,
    ) -> Result<Self::Ok, Self::Err> {
        let key = by.into_inner();

        // Subscribing before selecting ensures no `Change` is missed between.
        let changes = self.feed().subscribe();
        let current = self
            .database()
            .execute(Select(By::new(key.clone())))
            .await
            .map_err(tracerr::wrap!())?;

        let mut tracker = key.tracker(current.as_ref());
        let updates = changes.filter_map(move |item| {
            future::ready(match item {
                Ok(change) => tracker.track(change).map(Ok),
                Err(BroadcastStreamRecvError::Lagged(n)) => {
                    Some(Err(feed::Error::Lagged(n)))
                }
            })
        });

        Ok(stream::once(future::ready(Ok(current)))
            .chain(updates)
            .boxed())
    }
}

/// Key a [`Package`] can be watched by.
pub trait Key: Clone + Send + 'static {
    /// Creates a new [`Tracker`] of the [`Package`] with this [`Key`], being
    /// in the provided `current` state.
    fn tracker(&self, current: Option<&Package>) -> Tracker;
}

impl Key for package::Id {
    fn tracker(&self, _: Option<&Package>) -> Tracker {
        Tracker::Id(*self)
    }
}

impl Key for package::Slug {
    fn tracker(&self, current: Option<&Package>) -> Tracker {
        Tracker::Slug {
            slug: self.clone(),
            id: current.map(|p| p.id),
        }
    }
}

/// Tracker deciding which [`Change`]s affect a watched [`Package`].
#[derive(Clone, Debug)]
pub enum Tracker {
    /// [`Package`] watched by its [`package::Id`].
    Id(package::Id),

    /// [`Package`] watched by its [`package::Slug`].
    Slug {
        /// Watched [`package::Slug`].
        slug: package::Slug,

        /// ID of the [`Package`] holding the [`package::Slug`] at the moment.
        id: Option<package::Id>,
    },
}

impl Tracker {
    /// Tracks the provided [`Change`].
    ///
    /// Returns the new state of the watched [`Package`], or [`None`] if the
    /// [`Change`] doesn't affect it.
    #[expect(clippy::option_option, reason = "absence is a valid state")]
    pub fn track(&mut self, change: Change) -> Option<Option<Package>> {
        match (self, change) {
            (Self::Id(id), Change::Saved(pkg)) => {
                (pkg.id == *id).then_some(Some(pkg))
            }
            (Self::Id(id), Change::Removed(removed)) => {
                (removed == *id).then_some(None)
            }
            (Self::Slug { slug, id }, Change::Saved(pkg)) => {
                if pkg.slug == *slug {
                    *id = Some(pkg.id);
                    Some(Some(pkg))
                } else if *id == Some(pkg.id) {
                    // The slug was renamed away.
                    *id = None;
                    Some(None)
                } else {
                    None
                }
            }
            (Self::Slug { id, .. }, Change::Removed(removed)) => {
                (*id == Some(removed)).then(|| {
                    *id = None;
                    None
                })
            }
        }
    }
}

#[cfg(test)]
mod spec {
    use common::operations::{By, Watch};
    use futures::StreamExt as _;

    use crate::{
        command::{DeletePackage, UpdatePackage},
        domain::{
            package::{self, Slug},
            Package,
        },
        infra::{database::memory::Memory, feed::Change},
        Command as _, Query as _, Service,
    };

    use super::{DatabaseQuery, Tracker};

    #[tokio::test]
    async fn selects_by_slug() {
        let pkg = Package::sample("goa-getaway");
        let service =
            Service::for_tests(Memory::with_packages([pkg.clone()]));

        let found = service
            .execute(DatabaseQuery::<By<Option<Package>, _>>::by(
                Slug::new("goa-getaway").unwrap(),
            ))
            .await
            .unwrap();

        assert_eq!(found.map(|p| p.id), Some(pkg.id));
    }

    #[tokio::test]
    async fn watches_by_id_until_deleted() {
        let pkg = Package::sample("goa-getaway");
        let service =
            Service::for_tests(Memory::with_packages([pkg.clone()]));

        let mut watching = service
            .execute(Watch(By::<Option<Package>, _>::new(pkg.id)))
            .await
            .unwrap();
        let first = watching.next().await.unwrap().unwrap();
        assert_eq!(first.map(|p| p.id), Some(pkg.id));

        let mut document = pkg.document.clone();
        document.featured = true;
        drop(
            service
                .execute(UpdatePackage {
                    id: pkg.id,
                    document,
                })
                .await
                .unwrap(),
        );
        let updated = watching.next().await.unwrap().unwrap().unwrap();
        assert!(updated.featured);

        service.execute(DeletePackage { id: pkg.id }).await.unwrap();
        assert!(watching.next().await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn watches_missing_package() {
        let service = Service::for_tests(Memory::default());

        let mut watching = service
            .execute(Watch(By::<Option<Package>, _>::new(
                Slug::new("nowhere").unwrap(),
            )))
            .await
            .unwrap();

        assert!(watching.next().await.unwrap().unwrap().is_none());
    }

    #[tokio::test]
    async fn reports_lag() {
        let service = Service::for_tests(Memory::default());
        let mut watching = service
            .execute(Watch(By::<Option<Package>, _>::new(package::Id::new())))
            .await
            .unwrap();

        for _ in 0..64 {
            service.feed().publish(Change::Removed(package::Id::new()));
        }

        assert!(watching.next().await.unwrap().unwrap().is_none());
        assert!(watching.next().await.unwrap().is_err());
    }

    #[test]
    fn tracks_slug_across_renames() {
        let goa = Package::sample("goa-getaway");
        let mut tracker = Tracker::Slug {
            slug: goa.slug.clone(),
            id: None,
        };

        let created = tracker.track(Change::Saved(goa.clone()));
        assert_eq!(created.flatten().map(|p| p.id), Some(goa.id));

        let other = Package::sample("kerala-backwaters");
        assert!(tracker.track(Change::Saved(other.clone())).is_none());
        assert!(tracker.track(Change::Removed(other.id)).is_none());

        let mut renamed = goa.clone();
        renamed.document.slug = Slug::new("goa-beaches").unwrap();
        assert!(matches!(tracker.track(Change::Saved(renamed)), Some(None)));
        assert!(tracker.track(Change::Removed(goa.id)).is_none());
    }

    #[test]
    fn tracks_id() {
        let goa = Package::sample("goa-getaway");
        let mut tracker = Tracker::Id(goa.id);

        assert!(matches!(
            tracker.track(Change::Saved(goa.clone())),
            Some(Some(_)),
        ));
        assert!(tracker
            .track(Change::Saved(Package::sample("kerala-backwaters")))
            .is_none());
        assert!(matches!(tracker.track(Change::Removed(goa.id)), Some(None)));
    }
}

//! [`Command`] for creating a new [`Package`].

use common::{
    operations::{By, Commit, Insert, Select, Transact, Transacted},
    Price,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{package, Package},
    infra::{
        database::{self, Constraint},
        feed::Change,
        Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Package`].
///
/// Everything not provided gets its default value and is expected to be
/// filled in later with an [`UpdatePackage`] [`Command`].
///
/// [`UpdatePackage`]: super::UpdatePackage
#[derive(Clone, Debug)]
pub struct CreatePackage {
    /// [`package::Name`] of a new [`Package`].
    pub name: package::Name,

    /// [`package::Slug`] of a new [`Package`].
    ///
    /// Derived from the [`package::Name`], if [`None`].
    pub slug: Option<package::Slug>,

    /// [`Price`] of a new [`Package`].
    pub price: Price,

    /// [`package::Description`] of a new [`Package`].
    pub description: package::Description,

    /// [`package::Category`] of a new [`Package`], if not the default one.
    pub category: Option<package::Category>,

    /// [`package::Type`] of a new [`Package`], if not the default one.
    pub r#type: Option<package::Type>,

    /// [`package::Duration`] of a new [`Package`], if not the default one.
    pub duration: Option<package::Duration>,
}

impl<Db> Command<CreatePackage> for Service<Db>
where
    Db: Database<
            Select<By<Option<Package>, package::Slug>>,
            Ok = Option<Package>,
            Err = Traced<database::Error>,
        > + Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<Insert<Package>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Package;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreatePackage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePackage {
            name,
            slug,
            price,
            description,
            category,
            r#type,
            duration,
        } = cmd;

        let slug = match slug {
            Some(s) => s,
            None => package::Slug::from_name(name.as_ref())
                .ok_or(E::SlugUnderivable)
                .map_err(tracerr::wrap!())?,
        };

        let existing = self
            .database()
            .execute(Select(By::new(slug.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if existing.is_some() {
            return Err(tracerr::new!(E::SlugOccupied(slug)));
        }

        let mut document =
            package::Document::new(name, slug.clone(), price, description);
        if let Some(category) = category {
            document.category = category;
        }
        if let Some(ty) = r#type {
            document.r#type = ty;
        }
        if let Some(duration) = duration {
            document.duration = duration;
        }

        let created_at = package::CreationDateTime::now();
        let pkg = Package {
            id: package::Id::new(),
            document,
            created_at,
            updated_at: created_at.coerce(),
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        tx.execute(Insert(pkg.clone()))
            .await
            .map_err(|e| {
                if e
                    .as_ref()
                    .is_unique_violation(Some(Constraint::PackageSlug))
                {
                    return tracerr::new!(E::SlugOccupied(slug.clone()));
                }
                let wrap = tracerr::map_from_and_wrap!(=> E);
                wrap(e)
            })
            .map(drop)?;
        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        log::info!("`Package(id: {})` created", pkg.id);
        self.feed().publish(Change::Saved(pkg.clone()));

        Ok(pkg)
    }
}

/// Error of [`CreatePackage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`package::Slug`] is already used by another [`Package`].
    #[display("`{_0}` slug is occupied")]
    #[from(ignore)]
    SlugOccupied(#[error(not(source))] package::Slug),

    /// [`package::Slug`] cannot be derived from the [`package::Name`].
    #[display("Cannot derive a slug from the `Package` name")]
    SlugUnderivable,
}

#[cfg(test)]
mod spec {
    use common::Price;
    use futures::StreamExt as _;

    use crate::{
        domain::{
            package::{Description, Name, Slug},
            Package,
        },
        infra::{database::memory::Memory, feed::Change},
        Command as _, Service,
    };

    use super::{CreatePackage, ExecutionError};

    fn goa_getaway(slug: Option<&str>) -> CreatePackage {
        CreatePackage {
            name: Name::new("Goa Getaway").unwrap(),
            slug: slug.map(|s| Slug::new(s).unwrap()),
            price: Price::from(12_000),
            description: Description::new("Beach trip").unwrap(),
            category: None,
            r#type: None,
            duration: None,
        }
    }

    #[tokio::test]
    async fn creates_with_defaults() {
        let db = Memory::default();
        let service = Service::for_tests(db.clone());

        let pkg = service
            .execute(goa_getaway(Some("goa-getaway")))
            .await
            .unwrap();

        assert_eq!(pkg.slug.to_string(), "goa-getaway");
        assert!(pkg.itinerary.is_empty());
        assert!(pkg.images.is_empty());
        assert!(pkg.inclusions.is_empty());
        assert_eq!(pkg.rating.to_string(), "4.5");
        assert_eq!(pkg.reviews_count, 10);
        assert_eq!(db.packages().len(), 1);
    }

    #[tokio::test]
    async fn derives_slug_from_name() {
        let service = Service::for_tests(Memory::default());

        let pkg = service.execute(goa_getaway(None)).await.unwrap();

        assert_eq!(pkg.slug.to_string(), "goa-getaway");
    }

    #[tokio::test]
    async fn rejects_occupied_slug() {
        let db = Memory::with_packages([Package::sample("goa-getaway")]);
        let service = Service::for_tests(db.clone());

        let err = service.execute(goa_getaway(None)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::SlugOccupied(_)));
        assert_eq!(db.packages().len(), 1);
    }

    #[tokio::test]
    async fn publishes_created_package() {
        let service = Service::for_tests(Memory::default());
        let mut feed = service.feed().subscribe();

        let pkg = service.execute(goa_getaway(None)).await.unwrap();

        match feed.next().await {
            Some(Ok(Change::Saved(saved))) => assert_eq!(saved.id, pkg.id),
            other => panic!("unexpected change: {other:?}"),
        }
    }
}

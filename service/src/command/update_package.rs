//! [`Command`] for overwriting a [`Package`] with a new [`Document`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::package::Document;
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

/// [`Command`] for overwriting a [`Package`] with a new [`Document`].
///
/// The whole [`Document`] is written, so concurrent writes don't merge: the
/// last one wins.
#[derive(Clone, Debug)]
pub struct UpdatePackage {
    /// ID of the [`Package`] to overwrite.
    pub id: package::Id,

    /// New [`Document`] of the [`Package`].
    pub document: package::Document,
}

impl<Db> Command<UpdatePackage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Package, package::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Package>, package::Id>>,
            Ok = Option<Package>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Package>, package::Slug>>,
            Ok = Option<Package>,
            Err = Traced<database::Error>,
        > + Database<Update<Package>, Ok = (), Err = Traced<database::Error>>
        + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Package;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdatePackage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdatePackage { id, document } = cmd;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent writes of the same `Package`.
        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let existing = tx
            .execute(Select(By::<Option<Package>, _>::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::PackageNotExists(id))
            .map_err(tracerr::wrap!())?;

        if existing.slug != document.slug {
            let holder = tx
                .execute(Select(By::<Option<Package>, _>::new(
                    document.slug.clone(),
                )))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if holder.is_some_and(|p| p.id != id) {
                return Err(tracerr::new!(E::SlugOccupied(document.slug)));
            }
        }

        let slug = document.slug.clone();
        let pkg = Package {
            id,
            document,
            created_at: existing.created_at,
            updated_at: package::ModificationDateTime::now(),
        };
        tx.execute(Update(pkg.clone())).await.map_err(|e| {
            if e
                .as_ref()
                .is_unique_violation(Some(Constraint::PackageSlug))
            {
                return tracerr::new!(E::SlugOccupied(slug));
            }
            let wrap = tracerr::map_from_and_wrap!(=> E);
            wrap(e)
        })?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Package(id: {id})` updated");
        self.feed().publish(Change::Saved(pkg.clone()));

        Ok(pkg)
    }
}

/// Error of [`UpdatePackage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Package`] doesn't exist.
    #[display("`Package(id: {_0})` does not exist")]
    #[from(ignore)]
    PackageNotExists(#[error(not(source))] package::Id),

    /// [`package::Slug`] is already used by another [`Package`].
    #[display("`{_0}` slug is occupied")]
    #[from(ignore)]
    SlugOccupied(#[error(not(source))] package::Slug),
}

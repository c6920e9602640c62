//! [`Command`] for deleting a [`Package`].

use common::operations::{By, Commit, Delete, Lock, Transact, Transacted};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    domain::{package, Package},
    infra::{database, feed::Change, Database},
    Service,
};

use super::Command;

/// [`Command`] for deleting a [`Package`] permanently.
#[derive(Clone, Copy, Debug, From)]
pub struct DeletePackage {
    /// ID of the [`Package`] to delete.
    pub id: package::Id,
}

impl<Db> Command<DeletePackage> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>,
    Transacted<Db>: Database<
            Lock<By<Package, package::Id>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Delete<By<Package, package::Id>>,
            Ok = bool,
            Err = Traced<database::Error>,
        > + Database<Commit, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        DeletePackage { id }: DeletePackage,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Lock(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        let deleted = tx
            .execute(Delete(By::new(id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;
        if !deleted {
            return Err(tracerr::new!(E::PackageNotExists(id)));
        }

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        log::info!("`Package(id: {id})` deleted");
        self.feed().publish(Change::Removed(id));

        Ok(())
    }
}

/// Error of [`DeletePackage`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    Db(database::Error),

    /// [`Package`] doesn't exist.
    #[display("`Package(id: {_0})` does not exist")]
    #[from(ignore)]
    PackageNotExists(#[error(not(source))] package::Id),
}

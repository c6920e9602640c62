//! Postgres database client definitions.

use std::{future::Future, sync::Arc};

use tokio::sync::{RwLock, RwLockReadGuard};
use tokio_postgres::{types::ToSql, Row, ToStatement};
use tracerr::Traced;

use crate::infra::database::{
    self,
    postgres::{self, connection, Connection},
};

/// Lazily acquired [`Connection`] shared by all clones of a client.
#[derive(Debug)]
struct Slot<C>(RwLock<Option<C>>);

impl<C> Default for Slot<C> {
    fn default() -> Self {
        Self(RwLock::new(None))
    }
}

impl<C> Slot<C> {
    /// Returns the [`Connection`] held in this [`Slot`], acquiring it with
    /// the provided `acquire` function first, if there is none yet.
    async fn get_or_acquire<F, Fut>(
        &self,
        acquire: F,
    ) -> Result<RwLockReadGuard<'_, C>, Traced<database::Error>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<C, Traced<database::Error>>>,
    {
        let read = self.0.read().await;
        let guard = if read.is_some() {
            read
        } else {
            drop(read);

            let mut write = self.0.write().await;
            if write.is_none() {
                *write = Some(acquire().await.map_err(tracerr::wrap!())?);
            }
            write.downgrade()
        };

        Ok(RwLockReadGuard::map(guard, |conn| {
            conn.as_ref()
                .expect("connection cannot be dropped while guard is alive")
        }))
    }

    /// Takes the [`Connection`] out of this [`Slot`], so the next use
    /// acquires a new one.
    async fn take(&self) -> Option<C> {
        self.0.write().await.take()
    }
}

/// Acquires a new [`connection::NonTx`] from the provided
/// [`connection::Pool`].
async fn acquire(
    pool: &connection::Pool,
) -> Result<connection::NonTx, Traced<database::Error>> {
    pool.get()
        .await
        .map_err(tracerr::from_and_wrap!(=> postgres::Error))
        .map_err(tracerr::map_from)
}

/// Non-transactional Postgres database client.
#[derive(Clone, Debug)]
pub struct NonTx {
    /// [`connection::Pool`] to acquire [`Connection`]s from.
    pool: connection::Pool,

    /// [`Connection`] used by this client, once acquired.
    slot: Arc<Slot<connection::NonTx>>,
}

impl NonTx {
    /// Creates a new [`NonTx`] client over the provided [`connection::Pool`].
    #[must_use]
    pub(crate) fn from_pool(pool: connection::Pool) -> Self {
        Self {
            pool,
            slot: Arc::default(),
        }
    }

    /// Acquires a new [`Connection`] from the [`connection::Pool`] of this
    /// [`NonTx`] client, not shared with it.
    pub(crate) async fn detached(
        &self,
    ) -> Result<connection::NonTx, Traced<database::Error>> {
        acquire(&self.pool).await
    }

    /// Returns the [`Connection`] of this [`NonTx`] client.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::NonTx>, Traced<database::Error>>
    {
        self.slot.get_or_acquire(|| acquire(&self.pool)).await
    }
}

/// Transactional Postgres database client.
///
/// The transaction begins lazily on first use, reusing the [`Connection`] of
/// the [`NonTx`] client it was created from, if that one has any.
#[derive(Clone, Debug)]
pub struct Tx {
    /// [`connection::Pool`] to acquire a [`Connection`] from.
    pool: connection::Pool,

    /// [`NonTx`] client this [`Tx`] client was created from, until its
    /// [`Connection`] is taken over.
    origin: Arc<RwLock<Option<NonTx>>>,

    /// Running transaction, once begun.
    slot: Arc<Slot<connection::Tx>>,
}

impl Tx {
    /// Creates a new [`Tx`] client from the provided [`NonTx`] client.
    #[must_use]
    pub fn from_non_tx(client: NonTx) -> Self {
        Self {
            pool: client.pool.clone(),
            origin: Arc::new(RwLock::new(Some(client))),
            slot: Arc::default(),
        }
    }

    /// Returns the transactional [`Connection`] of this [`Tx`] client.
    async fn connection(
        &self,
    ) -> Result<RwLockReadGuard<'_, connection::Tx>, Traced<database::Error>>
    {
        self.slot
            .get_or_acquire(|| async {
                let reused = match self.origin.write().await.take() {
                    Some(origin) => origin.slot.take().await,
                    None => None,
                };
                let conn = match reused {
                    Some(conn) => conn,
                    None => acquire(&self.pool).await?,
                };
                connection::Tx::from_non_tx(conn)
                    .await
                    .map_err(tracerr::wrap!())
            })
            .await
    }

    /// Commits the transaction of this [`Tx`] client.
    ///
    /// Does nothing if the transaction hasn't begun.
    ///
    /// # Errors
    ///
    /// If failed to commit the transaction.
    pub async fn commit(&self) -> Result<(), Traced<database::Error>> {
        match self.slot.take().await {
            Some(tx) => tx.commit().await.map_err(tracerr::wrap!()),
            None => Ok(()),
        }
    }
}

/// Implements [`Connection`] for a client by delegating to its lazily
/// acquired [`Connection`].
macro_rules! delegate_to_connection {
    ($client:ty) => {
        impl Connection for $client {
            async fn query<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Vec<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn query_opt<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<Option<Row>, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .query_opt(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn exec<T>(
                &self,
                stmt: &T,
                params: &[&(dyn ToSql + Sync)],
            ) -> Result<u64, Traced<database::Error>>
            where
                T: ToStatement + ?Sized,
            {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .exec(stmt, params)
                    .await
                    .map_err(tracerr::wrap!())
            }

            async fn batch_exec(
                &self,
                query: &str,
            ) -> Result<(), Traced<database::Error>> {
                self.connection()
                    .await
                    .map_err(tracerr::wrap!())?
                    .batch_exec(query)
                    .await
                    .map_err(tracerr::wrap!())
            }
        }
    };
}

delegate_to_connection!(NonTx);
delegate_to_connection!(Tx);

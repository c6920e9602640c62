//! Postgres [`Database`] implementation.

pub mod client;
pub mod connection;
mod impls;

use deadpool_postgres::Runtime;
use derive_more::{Deref, Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, NoTls};
use tracerr::Traced;

use crate::infra::database::{self, Constraint};
#[cfg(doc)]
use crate::infra::Database;

pub use refinery::embed_migrations;

pub use self::{
    client::{NonTx, Tx},
    connection::Connection,
};

pub use deadpool_postgres::Config;

/// Postgres [`Database`] client.
#[derive(Clone, Copy, Debug, Deref)]
pub struct Postgres<T = NonTx>(T);

impl Postgres {
    /// Creates a new [`Postgres`] client with the provided [`Config`].
    ///
    /// # Errors
    ///
    /// If failed to create a new [`Postgres`] client.
    pub fn new(conf: &Config) -> Result<Self, Traced<database::Error>> {
        let pool = conf
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(tracerr::from_and_wrap!(=> Error))
            .map_err(tracerr::map_from)?;
        Ok(Self(NonTx::from_pool(pool)))
    }
}

/// Postgres database [`Error`].
#[derive(Debug, Display, StdError, From)]
pub enum Error {
    /// [`Connection`] error.
    #[display("`Connection` error: {_0}")]
    Connection(connection::Error),

    /// Error of creating a new [`connection::Pool`] client.
    #[display("Failed to create a new `connection::Pool`: {_0}")]
    PoolCreationError(connection::PoolCreationError),

    /// [`connection::Pool`] error.
    #[display("`connection::Pool` error: {_0}")]
    PoolError(connection::PoolError),
}

impl Error {
    /// Checks if the error is a unique violation of the specified
    /// [`Constraint`] (or of any, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<Constraint>) -> bool {
        let Self::Connection(e) = self else {
            return false;
        };
        if e.code() != Some(&SqlState::UNIQUE_VIOLATION) {
            return false;
        }
        constraint.map_or(true, |c| {
            e.as_db_error().and_then(|e| e.constraint())
                == Some(constraint_name(c))
        })
    }
}

/// Returns the name of the provided [`Constraint`] in the migrations.
const fn constraint_name(constraint: Constraint) -> &'static str {
    match constraint {
        Constraint::PackageSlug => "packages_slug_key",
        Constraint::UserEmail => "users_email_key",
        Constraint::UserPhone => "users_phone_key",
    }
}

#[cfg(test)]
mod spec {
    use super::{constraint_name, Constraint};

    #[test]
    fn names_migrations_constraints() {
        let migrations = [
            include_str!("../../../../../migrations/V1__packages.sql"),
            include_str!("../../../../../migrations/V2__users.sql"),
        ]
        .concat();

        let all = [
            Constraint::PackageSlug,
            Constraint::UserEmail,
            Constraint::UserPhone,
        ];
        for name in all.map(constraint_name) {
            assert!(migrations.contains(name), "`{name}` is not migrated");
        }
    }
}

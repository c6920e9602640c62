//! [`Database`]-related implementations.

#[cfg(test)]
pub(crate) mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use derive_more::{Display, Error as StdError, From};

#[cfg(feature = "postgres")]
pub use self::postgres::Postgres;

/// Database operation.
pub use common::Handler as Database;

/// [`Database`] error.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[cfg(feature = "postgres")]
    /// [`Postgres`] error.
    Postgres(postgres::Error),
}

/// Uniqueness constraint kept by a [`Database`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Constraint {
    /// Every `Package` has its own `package::Slug`.
    PackageSlug,

    /// Every `User` has its own `user::Email`.
    UserEmail,

    /// Every `User` has its own `user::Phone`.
    UserPhone,
}

impl Error {
    /// Checks whether this [`Error`] is a violation of the specified unique
    /// [`Constraint`] (or of any, if [`None`]).
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<Constraint>) -> bool {
        match *self {
            #[cfg(feature = "postgres")]
            Self::Postgres(ref e) => e.is_unique_violation(constraint),
        }
    }
}

//! Abstract operations executed by [`Handler`]s.

use std::marker::PhantomData;

#[cfg(doc)]
use crate::Handler;

/// Inserts a new value.
#[derive(Clone, Copy, Debug)]
pub struct Insert<T>(pub T);

/// Overwrites an existing value as a whole.
#[derive(Clone, Copy, Debug)]
pub struct Update<T>(pub T);

/// Deletes a value.
#[derive(Clone, Copy, Debug)]
pub struct Delete<T>(pub T);

/// Selects a value.
#[derive(Clone, Copy, Debug)]
pub struct Select<T>(pub T);

/// Locks a value until the end of the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Lock<T>(pub T);

/// Opens a live stream of a value's changes.
#[derive(Clone, Copy, Debug)]
pub struct Watch<T>(pub T);

/// Starts a long-running value (a background task, for example).
#[derive(Clone, Copy, Debug)]
pub struct Start<T>(pub T);

/// Performs a single iteration of a value.
#[derive(Clone, Copy, Debug)]
pub struct Perform<T>(pub T);

/// Opens a transaction.
#[derive(Clone, Copy, Debug)]
pub struct Transact;

/// Client returned by a [`Handler`] of [`Transact`].
pub type Transacted<T> = <T as crate::Handler<Transact>>::Ok;

/// Commits the current transaction.
#[derive(Clone, Copy, Debug)]
pub struct Commit;

/// Selector of a `W`hat by a `B`y key.
#[derive(Clone, Copy, Debug)]
pub struct By<W, B> {
    /// Type being selected.
    _what: PhantomData<W>,

    /// Key to select by.
    by: B,
}

impl<W, B> By<W, B> {
    /// Creates a new [`By`] selector with the provided key.
    #[must_use]
    pub fn new(by: B) -> Self {
        Self {
            _what: PhantomData,
            by,
        }
    }

    /// Returns the key of this [`By`] selector.
    #[must_use]
    pub fn into_inner(self) -> B {
        self.by
    }
}

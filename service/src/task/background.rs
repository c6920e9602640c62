//! Background environment for running [`Task`]s.

use std::{
    error::Error,
    future::{Future, IntoFuture},
    iter,
};

use futures::{
    future::{self, LocalBoxFuture},
    FutureExt as _, TryFutureExt as _,
};
use tokio::task;
use tracing as log;

#[cfg(doc)]
use crate::Task;

/// Boxed error of a [`Task`] that stopped.
type Failure = Box<dyn Error + 'static>;

/// Background environment for running [`Task`]s on the current thread.
///
/// Resolves once every spawned [`Task`] finishes, or with the first
/// failure.
#[derive(Debug, Default)]
pub struct Background {
    /// Local set the [`Task`]s are driven by.
    set: task::LocalSet,

    /// Names and handles of the spawned [`Task`]s.
    tasks: Vec<(&'static str, task::JoinHandle<Result<(), Failure>>)>,
}

impl Background {
    /// Spawns a new [`Task`] under the provided `name` inside this
    /// [`Background`] environment.
    pub fn spawn<F, E>(&mut self, name: &'static str, future: F)
    where
        F: Future<Output = Result<(), E>> + 'static,
        E: Error + 'static,
    {
        log::debug!("spawning `{name}` background task");
        let handle = self.set.spawn_local(future.map_err(move |e| {
            log::error!("`{name}` background task stopped: {e}");
            Failure::from(Box::new(e))
        }));
        self.tasks.push((name, handle));
    }

    /// Returns the number of spawned [`Task`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Indicates whether no [`Task`] has been spawned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl IntoFuture for Background {
    type Output = Result<(), Failure>;
    type IntoFuture = LocalBoxFuture<'static, Self::Output>;

    fn into_future(self) -> Self::IntoFuture {
        let Self { set, tasks } = self;
        let joined = tasks.into_iter().map(|(name, handle)| {
            handle
                .map(move |res| {
                    res.unwrap_or_else(|e| {
                        log::error!("`{name}` background task panicked: {e}");
                        Err(Failure::from(Box::new(e)))
                    })
                })
                .boxed_local()
        });
        let set = set.map(Ok).boxed_local();
        future::try_join_all(iter::once(set).chain(joined))
            .map_ok(drop)
            .boxed_local()
    }
}

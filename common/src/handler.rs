//! [`Handler`] abstraction every layer is built upon.

use std::future::Future;

/// Asynchronous handler of `Args`.
///
/// Commands, queries, database operations and background tasks are all
/// [`Handler`]s distinguished by their argument type only.
pub trait Handler<Args = ()> {
    /// Value produced on success.
    type Ok;

    /// Error produced on failure.
    type Err;

    /// Handles the provided `args`.
    fn execute(
        &self,
        args: Args,
    ) -> impl Future<Output = Result<Self::Ok, Self::Err>>;
}

//! Infrastructure layer.

pub mod database;
pub mod feed;
pub mod otp;

pub use self::{database::Database, feed::Feed};
#[cfg(feature = "postgres")]
pub use self::database::{postgres, Postgres};

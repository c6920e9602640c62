//! Domain definitions.

pub mod package;
pub mod user;

pub use self::{package::Package, user::User};

//! [`Command`] definition.

pub mod authorize_user_session;
pub mod create_package;
pub mod create_user;
pub mod create_user_session;
pub mod delete_package;
pub mod request_phone_otp;
pub mod update_package;

/// [`Command`] of the [`Service`].
///
/// [`Service`]: crate::Service
pub use common::Handler as Command;

pub use self::{
    authorize_user_session::AuthorizeUserSession,
    create_package::CreatePackage, create_user::CreateUser,
    create_user_session::CreateUserSession, delete_package::DeletePackage,
    request_phone_otp::RequestPhoneOtp, update_package::UpdatePackage,
};

//! [`Command`] for requesting a one-time code sign-in by [`Phone`].

use std::convert::Infallible;

use tracing as log;

#[cfg(doc)]
use crate::domain::user::{otp::Challenge, Phone};
use crate::{domain::user, Service};

use super::Command;

/// [`Command`] for requesting a one-time code sign-in by [`Phone`].
///
/// Issues a new [`Challenge`], replacing the pending one, if any.
#[derive(Clone, Debug)]
pub struct RequestPhoneOtp {
    /// [`Phone`] to deliver a one-time code to.
    pub phone: user::Phone,
}

/// Output of [`RequestPhoneOtp`] [`Command`].
#[derive(Clone, Copy, Debug)]
pub struct Output {
    /// [`DateTime`] when the issued code expires.
    ///
    /// [`DateTime`]: common::DateTime
    pub expires_at: user::otp::ExpirationDateTime,
}

impl<Db> Command<RequestPhoneOtp> for Service<Db> {
    type Ok = Output;
    type Err = Infallible;

    async fn execute(
        &self,
        RequestPhoneOtp { phone }: RequestPhoneOtp,
    ) -> Result<Self::Ok, Self::Err> {
        let config = &self.config().otp;
        let expires_at = user::otp::ExpirationDateTime::now() + config.ttl;
        let code =
            self.otp()
                .issue(phone.clone(), config.ttl, config.max_attempts);

        // Delivery is left to an external SMS gateway.
        log::info!(%phone, "one-time code issued");
        if config.log_codes {
            log::debug!(%phone, %code, "one-time code to deliver");
        }

        Ok(Output { expires_at })
    }
}

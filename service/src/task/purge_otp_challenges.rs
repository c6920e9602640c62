//! [`PurgeOtpChallenges`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Start};
use tokio::time::interval;
use tracing as log;

#[cfg(doc)]
use crate::domain::user::otp::Challenge;
use crate::{domain::user::otp, Service};

use super::Task;

/// Configuration for [`PurgeOtpChallenges`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between expired [`Challenge`]s purges.
    pub interval: time::Duration,
}

/// [`Task`] removing expired [`Challenge`]s nobody has verified.
#[derive(Clone, Copy, Debug)]
pub struct PurgeOtpChallenges<S> {
    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<PurgeOtpChallenges<Self>, Config>>> for Service<Db>
where
    PurgeOtpChallenges<Service<Db>>:
        Task<Perform<()>, Ok = usize, Err: Error> + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<PurgeOtpChallenges<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = PurgeOtpChallenges {
            service: self.clone(),
        };

        let mut interval = interval(config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(0) => {}
                Ok(n) => log::debug!("{n} expired OTP challenges purged"),
                Err(e) => {
                    log::error!("`task::PurgeOtpChallenges` failed: {e}");
                }
            }
        }
    }
}

impl<Db> Task<Perform<()>> for PurgeOtpChallenges<Service<Db>> {
    type Ok = usize;
    type Err = Infallible;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        Ok(self.service.otp().purge(otp::ExpirationDateTime::now()))
    }
}

//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod command;
pub mod domain;
pub mod editor;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::time::Duration;

use common::operations::{By, Start};
use derive_more::Debug;

#[cfg(doc)]
use infra::Database;
use infra::{otp, Feed};

pub use self::{command::Command, editor::Editor, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [JWT] encoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_encoding_key: jsonwebtoken::EncodingKey,

    /// [JWT] decoding key.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    pub jwt_decoding_key: jsonwebtoken::DecodingKey,

    /// Lifetime of a newly created [`domain::user::Session`].
    pub session_ttl: Duration,

    /// [`OtpConfig`] of phone sign-ins.
    pub otp: OtpConfig,

    /// Number of package changes buffered for a slow [`Feed`] subscriber.
    pub feed_capacity: usize,

    /// [`task::PurgeOtpChallenges`] configuration.
    pub purge_otp_challenges: task::purge_otp_challenges::Config,
}

/// Configuration of one-time codes sent to phones.
#[derive(Clone, Copy, Debug)]
pub struct OtpConfig {
    /// Lifetime of an issued code.
    pub ttl: Duration,

    /// Number of wrong codes tolerated before the challenge is dropped.
    pub max_attempts: u8,

    /// Indicator whether issued codes are logged on `DEBUG` level.
    ///
    /// Meant for development only, when no SMS gateway delivers them.
    pub log_codes: bool,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,

    /// [`Feed`] of committed package changes.
    feed: Feed,

    /// Pending one-time code challenges.
    otp: otp::Registry,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::PurgeOtpChallenges<Self>,
                        task::purge_otp_challenges::Config,
                    >,
                >,
                Ok = (),
                Err: std::error::Error,
            > + Clone
            + 'static,
    {
        let this = Service {
            feed: Feed::new(config.feed_capacity),
            otp: otp::Registry::default(),
            config,
            database,
        };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn("purge_otp_challenges", async move {
            svc.execute(Start(By::new(svc.config().purge_otp_challenges)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`Feed`] of this [`Service`].
    #[must_use]
    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    /// Returns the registry of pending one-time code challenges.
    #[must_use]
    pub fn otp(&self) -> &otp::Registry {
        &self.otp
    }
}

#[cfg(test)]
impl<Db> Service<Db> {
    /// Creates a new [`Service`] over the provided [`Database`] without
    /// spawning any background task.
    pub(crate) fn for_tests(database: Db) -> Self {
        let secret = b"test-secret";
        Self {
            config: Config {
                jwt_encoding_key: jsonwebtoken::EncodingKey::from_secret(
                    secret,
                ),
                jwt_decoding_key: jsonwebtoken::DecodingKey::from_secret(
                    secret,
                ),
                session_ttl: Duration::from_secs(30 * 60),
                otp: OtpConfig {
                    ttl: Duration::from_secs(300),
                    max_attempts: 3,
                    log_codes: false,
                },
                feed_capacity: 16,
                purge_otp_challenges: task::purge_otp_challenges::Config {
                    interval: Duration::from_secs(60),
                },
            },
            database,
            feed: Feed::new(16),
            otp: otp::Registry::default(),
        }
    }
}

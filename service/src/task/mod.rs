//! Background [`Task`]s definitions.

mod background;
pub mod purge_otp_challenges;

pub use common::Handler as Task;

pub use self::{
    background::Background, purge_otp_challenges::PurgeOtpChallenges,
};

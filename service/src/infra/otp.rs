//! [`Registry`] of pending one-time code [`Challenge`]s.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tracing as log;

use crate::domain::user::{
    otp::{self, Challenge, Verdict},
    Phone,
};

/// Pending [`Challenge`]s, at most one per [`Phone`].
///
/// Clones share the same [`Challenge`]s.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    /// Pending [`Challenge`]s by their [`Phone`].
    challenges: Arc<Mutex<HashMap<Phone, Challenge>>>,
}

impl Registry {
    /// Issues a new [`Challenge`] for the provided [`Phone`], replacing the
    /// pending one, if any.
    ///
    /// Returns the [`otp::Code`] to be delivered to the [`Phone`].
    pub fn issue(
        &self,
        phone: Phone,
        ttl: Duration,
        max_attempts: u8,
    ) -> otp::Code {
        let challenge = Challenge::issue(phone.clone(), ttl, max_attempts);
        let code = challenge.code().clone();
        if self.lock().insert(phone, challenge).is_some() {
            log::debug!("pending `Challenge` replaced with a new one");
        }
        code
    }

    /// Verifies the provided [`otp::Code`] against the [`Challenge`] pending
    /// for the provided [`Phone`].
    ///
    /// Returns [`None`] if there is no pending [`Challenge`]. The
    /// [`Challenge`] is removed once its [`Verdict`] is final.
    pub fn verify(
        &self,
        phone: &Phone,
        code: &otp::Code,
        now: otp::ExpirationDateTime,
    ) -> Option<Verdict> {
        let mut challenges = self.lock();
        let verdict = challenges.get_mut(phone)?.verify(code, now);
        if verdict.is_final() {
            drop(challenges.remove(phone));
        }
        Some(verdict)
    }

    /// Removes all the [`Challenge`]s expired at the provided moment.
    ///
    /// Returns the number of removed [`Challenge`]s.
    pub fn purge(&self, now: otp::ExpirationDateTime) -> usize {
        let mut challenges = self.lock();
        let before = challenges.len();
        challenges.retain(|_, ch| !ch.is_expired_at(now));
        before - challenges.len()
    }

    /// Returns the number of pending [`Challenge`]s.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Indicates whether there are no pending [`Challenge`]s.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Locks the pending [`Challenge`]s.
    fn lock(&self) -> MutexGuard<'_, HashMap<Phone, Challenge>> {
        // Every operation leaves the map consistent, so a poisoned lock is
        // still usable.
        self.challenges
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::domain::user::{
        otp::{Code, ExpirationDateTime, Verdict},
        Phone,
    };

    use super::Registry;

    const TTL: Duration = Duration::from_secs(300);

    fn phone() -> Phone {
        Phone::new("+919876543210").unwrap()
    }

    fn wrong(code: &Code) -> Code {
        let wrong = if code.as_ref() == "000000" {
            "111111"
        } else {
            "000000"
        };
        Code::new(wrong).unwrap()
    }

    #[test]
    fn removes_challenge_once_accepted() {
        let otp = Registry::default();
        let code = otp.issue(phone(), TTL, 3);

        let now = ExpirationDateTime::now();
        assert_eq!(otp.verify(&phone(), &code, now), Some(Verdict::Accepted));
        assert_eq!(otp.verify(&phone(), &code, now), None);
        assert!(otp.is_empty());
    }

    #[test]
    fn removes_challenge_after_too_many_attempts() {
        let otp = Registry::default();
        let code = otp.issue(phone(), TTL, 2);
        let bad = wrong(&code);
        let now = ExpirationDateTime::now();

        assert_eq!(
            otp.verify(&phone(), &bad, now),
            Some(Verdict::Rejected { attempts_left: 1 }),
        );
        assert_eq!(otp.verify(&phone(), &bad, now), Some(Verdict::Exhausted));
        assert_eq!(otp.verify(&phone(), &code, now), None);
    }

    #[test]
    fn reissuing_replaces_challenge() {
        let otp = Registry::default();
        let first = otp.issue(phone(), TTL, 3);
        let second = otp.issue(phone(), TTL, 3);

        assert_eq!(otp.len(), 1);
        if first != second {
            assert_eq!(
                otp.verify(&phone(), &first, ExpirationDateTime::now()),
                Some(Verdict::Rejected { attempts_left: 2 }),
            );
        }
        assert_eq!(
            otp.verify(&phone(), &second, ExpirationDateTime::now()),
            Some(Verdict::Accepted),
        );
    }

    #[test]
    fn purges_expired_challenges() {
        let otp = Registry::default();
        let _ = otp.issue(phone(), Duration::from_secs(1), 3);
        let _ = otp.issue(Phone::new("+15550109999").unwrap(), TTL, 3);

        let later = ExpirationDateTime::now() + Duration::from_secs(60);

        assert_eq!(otp.purge(later), 1);
        assert_eq!(otp.len(), 1);
    }

    #[test]
    fn shares_challenges_between_clones() {
        let otp = Registry::default();
        let code = otp.clone().issue(phone(), TTL, 3);

        assert_eq!(
            otp.verify(&phone(), &code, ExpirationDateTime::now()),
            Some(Verdict::Accepted),
        );
    }
}

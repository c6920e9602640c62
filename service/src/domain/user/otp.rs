//! One-time code [`Challenge`] definitions.

use std::{str::FromStr, sync::LazyLock, time::Duration};

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display};
use rand::Rng as _;
use regex::Regex;

use super::Phone;

/// Pending verification of a [`Phone`] by a one-time [`Code`].
#[derive(Clone, Debug)]
pub struct Challenge {
    /// [`Phone`] being verified.
    pub phone: Phone,

    /// Expected [`Code`].
    code: Code,

    /// [`DateTime`] when this [`Challenge`] expires.
    pub expires_at: ExpirationDateTime,

    /// Number of wrong [`Code`]s this [`Challenge`] still tolerates.
    attempts_left: u8,
}

impl Challenge {
    /// Creates a new [`Challenge`] for the provided [`Phone`] with a freshly
    /// generated [`Code`].
    #[must_use]
    pub fn issue(phone: Phone, ttl: Duration, max_attempts: u8) -> Self {
        Self {
            phone,
            code: Code::generate(),
            expires_at: ExpirationDateTime::now() + ttl,
            attempts_left: max_attempts.max(1),
        }
    }

    /// Returns the expected [`Code`] of this [`Challenge`].
    #[must_use]
    pub fn code(&self) -> &Code {
        &self.code
    }

    /// Indicates whether this [`Challenge`] is expired at the provided moment.
    #[must_use]
    pub fn is_expired_at(&self, now: ExpirationDateTime) -> bool {
        now >= self.expires_at
    }

    /// Checks the provided [`Code`] against this [`Challenge`].
    ///
    /// Every wrong [`Code`] consumes an attempt.
    pub fn verify(&mut self, code: &Code, now: ExpirationDateTime) -> Verdict {
        if self.is_expired_at(now) {
            return Verdict::Expired;
        }
        if *code == self.code {
            return Verdict::Accepted;
        }
        self.attempts_left = self.attempts_left.saturating_sub(1);
        if self.attempts_left == 0 {
            Verdict::Exhausted
        } else {
            Verdict::Rejected {
                attempts_left: self.attempts_left,
            }
        }
    }
}

/// Outcome of [`Challenge::verify()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// [`Code`] matches.
    Accepted,

    /// [`Code`] doesn't match, but more attempts are allowed.
    Rejected {
        /// Number of attempts left.
        attempts_left: u8,
    },

    /// [`Code`] doesn't match and no attempts are left.
    Exhausted,

    /// [`Challenge`] has expired.
    Expired,
}

impl Verdict {
    /// Indicates whether the [`Challenge`] is over after this [`Verdict`].
    #[must_use]
    pub fn is_final(self) -> bool {
        !matches!(self, Self::Rejected { .. })
    }
}

/// Six-digit one-time code.
///
/// Its [`Debug`] output is redacted.
///
/// [`Debug`]: std::fmt::Debug
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str)]
#[debug("Code(******)")]
pub struct Code(String);

impl Code {
    /// Number of digits in a [`Code`].
    pub const LEN: usize = 6;

    /// Creates a new [`Code`] if the given `code` is valid.
    #[must_use]
    pub fn new(code: impl AsRef<str>) -> Option<Self> {
        /// Regular expression checking [`Code`] format.
        static REGEX: LazyLock<Regex> =
            LazyLock::new(|| Regex::new(r"^\d{6}$").expect("valid regex"));

        let code = code.as_ref().trim();
        REGEX.is_match(code).then(|| Self(code.to_owned()))
    }

    /// Generates a new random [`Code`].
    #[must_use]
    pub fn generate() -> Self {
        let n: u32 = rand::thread_rng().gen_range(0..1_000_000);
        Self(format!("{n:06}"))
    }
}

impl FromStr for Code {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Code`")
    }
}

/// [`DateTime`] when a [`Challenge`] expires.
pub type ExpirationDateTime = DateTimeOf<(Challenge, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use super::{Challenge, Code, ExpirationDateTime, Phone, Verdict};

    fn challenge(max_attempts: u8) -> Challenge {
        Challenge::issue(
            Phone::new("+919876543210").unwrap(),
            Duration::from_secs(300),
            max_attempts,
        )
    }

    #[test]
    fn redacts_debug_output() {
        let code = Code::new("123456").unwrap();

        assert_eq!(format!("{code:?}"), "Code(******)");
        assert_eq!(code.to_string(), "123456");
        assert!(format!("{:?}", challenge(3)).contains("code: Code(******)"));
    }

    #[test]
    fn generates_six_digits() {
        for _ in 0..100 {
            let code = Code::generate();
            assert_eq!(code.as_ref().len(), Code::LEN);
            assert!(Code::new(code.as_ref()).is_some());
        }
        assert!(Code::new("12345").is_none());
        assert!(Code::new("12a456").is_none());
        assert_eq!(Code::new(" 012345 ").unwrap().to_string(), "012345");
    }

    #[test]
    fn accepts_matching_code() {
        let mut ch = challenge(3);
        let code = ch.code().clone();

        let verdict = ch.verify(&code, ExpirationDateTime::now());

        assert_eq!(verdict, Verdict::Accepted);
        assert!(verdict.is_final());
    }

    #[test]
    fn exhausts_attempts() {
        let mut ch = challenge(2);
        let wrong = if ch.code().as_ref() == "000000" {
            Code::new("111111").unwrap()
        } else {
            Code::new("000000").unwrap()
        };
        let now = ExpirationDateTime::now();

        assert_eq!(
            ch.verify(&wrong, now),
            Verdict::Rejected { attempts_left: 1 },
        );
        assert_eq!(ch.verify(&wrong, now), Verdict::Exhausted);
    }

    #[test]
    fn expires() {
        let mut ch = challenge(3);
        let code = ch.code().clone();
        let later = ch.expires_at + Duration::from_secs(1);

        assert!(ch.is_expired_at(later));
        assert_eq!(ch.verify(&code, later), Verdict::Expired);
    }
}

//! [`User`] definitions.

pub mod otp;
pub mod session;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use argon2::{
    password_hash::{
        self, rand_core::OsRng, PasswordHasher as _, PasswordVerifier as _,
        SaltString,
    },
    Argon2,
};
use common::{define_kind, unit, DateTimeOf};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Session;

/// Platform user.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`].
    pub id: Id,

    /// [`DisplayName`] of this [`User`].
    pub display_name: DisplayName,

    /// [`Email`] of this [`User`], if signed up with one.
    pub email: Option<Email>,

    /// [`Phone`] of this [`User`], if signed up with one.
    pub phone: Option<Phone>,

    /// [`PasswordHash`] of this [`User`], if signed up with a password.
    pub password_hash: Option<PasswordHash>,

    /// [`Provider`] this [`User`] signed up with.
    pub provider: Provider,

    /// [`Role`] of this [`User`].
    pub role: Role,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`User`] signed in last time.
    pub last_login_at: Option<LoginDateTime>,
}

impl User {
    /// Indicates whether this [`User`] may manage packages.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// ID of a [`User`].
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Deserialize,
    Display,
    Eq,
    From,
    FromStr,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Name of a [`User`] shown in the interface.
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct DisplayName(String);

impl DisplayName {
    /// Creates a new [`DisplayName`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Derives a [`DisplayName`] from the local part of the provided
    /// [`Email`].
    #[must_use]
    pub fn from_email(email: &Email) -> Self {
        let local = AsRef::<str>::as_ref(email).split('@').next().unwrap_or_default();
        Self::new(local).unwrap_or_else(|| Self("User".into()))
    }

    /// Derives a [`DisplayName`] for a [`User`] signing in by [`Phone`].
    #[must_use]
    pub fn from_phone(phone: &Phone) -> Self {
        let digits: &str = phone.as_ref();
        let tail = &digits[digits.len().saturating_sub(4)..];
        Self(format!("User {tail}"))
    }

    /// Checks whether the given `name` is a valid [`DisplayName`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 128
    }
}

impl FromStr for DisplayName {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `DisplayName`")
    }
}

/// Password of a [`User`].
#[derive(Clone, Debug, Display, Eq, From, PartialEq)]
#[from(&str, String)]
pub struct Password(String);

impl Password {
    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`].
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        password.len() >= 6 && password.len() <= 128
    }
}

impl FromStr for Password {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Password`")
    }
}

impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [Argon2] hash of a [`User`]'s [`Password`], stored as a [PHC string].
///
/// [Argon2]: https://wikipedia.org/wiki/Argon2
/// [PHC string]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Display, Eq, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the provided [`Password`] with a fresh random salt.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    #[must_use]
    pub fn new(password: &Password) -> Self {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.0.as_bytes(), &salt)
            .expect("default params accept a generated salt");
        Self(hash.to_string())
    }

    /// Checks whether the provided [`Password`] matches this [`PasswordHash`].
    ///
    /// A malformed hash matches nothing.
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        password_hash::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    ///
    /// The `address` is trimmed and lowercased beforehand.
    #[must_use]
    pub fn new(address: impl AsRef<str>) -> Option<Self> {
        let address = address.as_ref().trim().to_lowercase();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex")
        });

        let address = address.as_ref();
        address.len() <= 320 && REGEX.is_match(address)
    }
}

impl FromStr for Email {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Email`")
    }
}

/// Phone number of a [`User`] in E.164 format.
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Phone(String);

impl Phone {
    /// Creates a new [`Phone`] if the given `number` is valid.
    ///
    /// Spaces, dashes and parentheses are removed, and the leading `+` is
    /// added when missing.
    #[must_use]
    pub fn new(number: impl AsRef<str>) -> Option<Self> {
        let digits = number
            .as_ref()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')' | '.'))
            .collect::<String>();
        let number = if digits.starts_with('+') {
            digits
        } else {
            format!("+{digits}")
        };
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Phone`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking E.164 format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^\+[1-9]\d{7,14}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Phone {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Phone`")
    }
}

define_kind! {
    #[doc = "Way a [`User`] signed up."]
    #[serialize_all = "SCREAMING_SNAKE_CASE"]
    enum Provider {
        #[doc = "Email address and password."]
        Password = 1,

        #[doc = "Phone number verified with a one-time code."]
        Phone = 2,

        #[doc = "Hosted Google sign-in."]
        Google = 3,
    }
}

define_kind! {
    #[doc = "Role of a [`User`]."]
    #[serialize_all = "SCREAMING_SNAKE_CASE"]
    enum Role {
        #[doc = "Regular customer."]
        User = 1,

        #[doc = "Agency staff managing packages."]
        Admin = 2,
    }
}

/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

/// [`DateTime`] when a [`User`] signed in last time.
pub type LoginDateTime = DateTimeOf<(User, unit::Modification)>;

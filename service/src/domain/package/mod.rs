//! [`Package`] definitions.

pub mod cost;
pub mod itinerary;
pub mod record;
pub mod text;

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Price, Rating};
use derive_more::{AsRef, Deref, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::{cost::CostSection, itinerary::Day, record::Record};

/// Number of reviews a new [`Package`] is shown with.
pub const DEFAULT_REVIEWS_COUNT: u32 = 10;

/// Curated trip offered by the agency.
#[derive(Clone, Debug, Deref)]
pub struct Package {
    /// ID of this [`Package`].
    pub id: Id,

    /// [`Document`] of this [`Package`].
    #[deref]
    pub document: Document,

    /// [`DateTime`] when this [`Package`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Package`] was last written.
    pub updated_at: ModificationDateTime,
}

#[cfg(test)]
impl Package {
    /// Creates a new [`Package`] addressed by the provided `slug`, with the
    /// required fields filled in and everything else defaulted.
    pub(crate) fn sample(slug: &str) -> Self {
        let now = CreationDateTime::now();
        Self {
            id: Id::new(),
            document: Document::new(
                Name::new(slug.replace('-', " ")).unwrap(),
                Slug::new(slug).unwrap(),
                Price::from(12_000),
                Description::new("Sample trip").unwrap(),
            ),
            created_at: now,
            updated_at: now.coerce(),
        }
    }
}

/// Editable contents of a [`Package`], always written as a whole.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    /// [`Name`] of the [`Package`].
    pub name: Name,

    /// [`Slug`] the [`Package`] is publicly addressed by.
    pub slug: Slug,

    /// [`Category`] of the [`Package`].
    pub category: Category,

    /// [`Type`] of the [`Package`] within its [`Category`].
    pub r#type: Type,

    /// [`Duration`] of the trip.
    pub duration: Duration,

    /// [`Price`] of the trip.
    pub price: Price,

    /// [`Description`] of the [`Package`].
    pub description: Description,

    /// URLs of the cover images.
    pub images: Vec<String>,

    /// URLs of the gallery images.
    pub gallery_images: Vec<String>,

    /// What the price includes, line by line.
    pub inclusions: Vec<String>,

    /// What the price doesn't include, line by line.
    pub exclusions: Vec<String>,

    /// Terms and conditions, line by line.
    pub terms_and_conditions: Vec<String>,

    /// Cancellation policy, line by line.
    pub cancellation_policy: Vec<String>,

    /// Day-by-day itinerary, ordered by [`Day::day`].
    pub itinerary: Vec<Day>,

    /// [`CostSection`] of the [`Package`].
    pub cost_section: CostSection,

    /// Displayed [`Rating`].
    pub rating: Rating,

    /// Displayed number of reviews.
    pub reviews_count: u32,

    /// Indicator whether the [`Package`] is promoted on the home page.
    pub featured: bool,
}

impl Document {
    /// Creates a new [`Document`] out of the required fields, filling
    /// everything else with defaults.
    #[must_use]
    pub fn new(
        name: Name,
        slug: Slug,
        price: Price,
        description: Description,
    ) -> Self {
        Self {
            name,
            slug,
            category: Category::default(),
            r#type: Type::default(),
            duration: Duration::default(),
            price,
            description,
            images: vec![],
            gallery_images: vec![],
            inclusions: vec![],
            exclusions: vec![],
            terms_and_conditions: vec![],
            cancellation_policy: vec![],
            itinerary: vec![],
            cost_section: CostSection::default(),
            rating: Rating::DEFAULT,
            reviews_count: DEFAULT_REVIEWS_COUNT,
            featured: false,
        }
    }
}

/// ID of a [`Package`].
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

/// Name of a [`Package`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Public URL slug of a [`Package`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Slug(String);

impl Slug {
    /// Creates a new [`Slug`] if the given `slug` is valid.
    #[must_use]
    pub fn new(slug: impl Into<String>) -> Option<Self> {
        let slug = slug.into();
        Self::check(&slug).then_some(Self(slug))
    }

    /// Derives a [`Slug`] from the provided [`Package`] `name`.
    ///
    /// The `name` is lowercased, every run of non-alphanumeric characters is
    /// replaced with a single `-`, and leading/trailing dashes are dropped.
    /// Returns [`None`] if nothing alphanumeric is left.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        let mut slug = String::with_capacity(name.len());
        for c in name.chars().flat_map(char::to_lowercase) {
            if c.is_ascii_alphanumeric() {
                slug.push(c);
            } else if !slug.is_empty() && !slug.ends_with('-') {
                slug.push('-');
            }
        }
        while slug.ends_with('-') {
            _ = slug.pop();
        }
        Self::new(slug)
    }

    /// Checks whether the given `slug` is a valid [`Slug`].
    fn check(slug: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Slug`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[a-z0-9]+(-[a-z0-9]+)*$").expect("valid regex")
        });

        let slug = slug.as_ref();
        slug.len() <= 256 && REGEX.is_match(slug)
    }
}

impl FromStr for Slug {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Slug`")
    }
}

define_kind! {
    #[doc = "Category of a [`Package`]."]
    #[serialize_all = "kebab-case"]
    enum Category {
        #[doc = "Trips for newlyweds and couples."]
        RomanticHoneymoon = 1,

        #[doc = "Birthdays, anniversaries and other occasions."]
        CelebrationPackages = 2,

        #[doc = "Trips with friends before the wedding."]
        BachelorHolidays = 3,

        #[doc = "Trips for the whole family."]
        FamilyHolidays = 4,
    }
}

impl Default for Category {
    fn default() -> Self {
        Self::RomanticHoneymoon
    }
}

/// Type of a [`Package`] within its [`Category`] (`domestic`, `birthday`,
/// `festival` and so on).
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Type(String);

impl Type {
    /// Creates a new [`Type`] if the given `ty` is valid.
    #[must_use]
    pub fn new(ty: impl Into<String>) -> Option<Self> {
        let ty = ty.into();
        Self::check(&ty).then_some(Self(ty))
    }

    /// Checks whether the given `ty` is a valid [`Type`].
    fn check(ty: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Type`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[a-z0-9]+([-_][a-z0-9]+)*$").expect("valid regex")
        });

        let ty = ty.as_ref();
        ty.len() <= 64 && REGEX.is_match(ty)
    }
}

impl Default for Type {
    fn default() -> Self {
        Self("domestic".into())
    }
}

impl FromStr for Type {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Type`")
    }
}

/// Duration of a [`Package`] trip.
#[derive(
    Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize,
)]
#[display("{days}D/{nights}N")]
#[serde(default)]
pub struct Duration {
    /// Number of days, at least one.
    days: u16,

    /// Number of nights.
    nights: u16,
}

impl Duration {
    /// Creates a new [`Duration`] if it has at least one day.
    #[must_use]
    pub fn new(days: u16, nights: u16) -> Option<Self> {
        (days >= 1).then_some(Self { days, nights })
    }

    /// Returns the number of days of this [`Duration`].
    #[must_use]
    pub fn days(self) -> u16 {
        self.days
    }

    /// Returns the number of nights of this [`Duration`].
    #[must_use]
    pub fn nights(self) -> u16 {
        self.nights
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self { days: 1, nights: 0 }
    }
}

/// Description of a [`Package`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Description(String);

impl Description {
    /// Creates a new [`Description`] if the given `text` is valid.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Option<Self> {
        let text = text.into();
        Self::check(&text).then_some(Self(text))
    }

    /// Checks whether the given `text` is a valid [`Description`].
    fn check(text: impl AsRef<str>) -> bool {
        let text = text.as_ref();
        !text.trim().is_empty() && text.len() <= 16 * 1024
    }
}

impl FromStr for Description {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Description`")
    }
}

/// [`DateTime`] when a [`Package`] was created.
pub type CreationDateTime = DateTimeOf<(Package, unit::Creation)>;

/// [`DateTime`] when a [`Package`] was last written.
pub type ModificationDateTime = DateTimeOf<(Package, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{Price, Rating};

    use super::{Category, Description, Document, Duration, Name, Slug, Type};

    #[test]
    fn derives_slug_from_name() {
        let slug = |n| Slug::from_name(n).map(|s| s.to_string());

        assert_eq!(slug("Goa Getaway").as_deref(), Some("goa-getaway"));
        assert_eq!(
            slug("  Kerala: Backwaters & Hills!! ").as_deref(),
            Some("kerala-backwaters-hills"),
        );
        assert_eq!(
            slug("5 Nights in Bali").as_deref(),
            Some("5-nights-in-bali"),
        );
        assert_eq!(slug("!!!"), None);
    }

    #[test]
    fn validates_slug() {
        assert!(Slug::new("goa-getaway").is_some());
        assert!(Slug::new("Goa").is_none());
        assert!(Slug::new("goa--getaway").is_none());
        assert!(Slug::new("-goa").is_none());
        assert!(Slug::new("").is_none());
    }

    #[test]
    fn validates_required_text() {
        assert!(Name::new("Goa Getaway").is_some());
        assert!(Name::new(" Goa").is_none());
        assert!(Name::new("").is_none());
        assert!(Description::new("  Beach trip\n").is_some());
        assert!(Description::new(" \n ").is_none());
    }

    #[test]
    fn duration_needs_a_day() {
        assert!(Duration::new(0, 0).is_none());
        assert_eq!(Duration::new(4, 3).unwrap().to_string(), "4D/3N");
        assert_eq!(Duration::default(), Duration::new(1, 0).unwrap());
    }

    #[test]
    fn parses_category_and_type() {
        assert_eq!(
            "celebration-packages".parse::<Category>().unwrap(),
            Category::CelebrationPackages,
        );
        assert_eq!(Category::FamilyHolidays.as_str(), "family-holidays");
        assert_eq!(Category::default(), Category::RomanticHoneymoon);

        assert_eq!(Type::default().to_string(), "domestic");
        assert!(Type::new("new_year").is_some());
        assert!(Type::new("Domestic").is_none());
    }

    #[test]
    fn new_document_has_defaults() {
        let doc = Document::new(
            Name::new("Goa Getaway").unwrap(),
            Slug::new("goa-getaway").unwrap(),
            Price::from(12_000),
            Description::new("Beach trip").unwrap(),
        );

        assert!(doc.itinerary.is_empty());
        assert!(doc.images.is_empty());
        assert!(doc.gallery_images.is_empty());
        assert!(doc.inclusions.is_empty());
        assert!(doc.exclusions.is_empty());
        assert_eq!(doc.rating, Rating::DEFAULT);
        assert_eq!(doc.reviews_count, 10);
        assert!(!doc.featured);
        assert!(!doc.cost_section.enabled);
        assert_eq!(doc.category, Category::RomanticHoneymoon);
        assert_eq!(doc.r#type.to_string(), "domestic");
    }
}

//! [`Package`]-related definitions.

use std::collections::BTreeMap;

use common::{DateTime, Price, Rating};
use derive_more::{AsRef, Display, From, Into};
use juniper::{
    graphql_object, GraphQLEnum, GraphQLInputObject, GraphQLObject,
    GraphQLScalar,
};
use service::{
    domain::{
        self,
        package::{itinerary, text},
    },
    read,
};
use uuid::Uuid;

use crate::{api, api::scalar, define_error, Context, Error};

/// A travel package as shown to the public.
#[derive(Clone, Debug, From)]
pub struct Package(read::package::Display);

impl From<domain::Package> for Package {
    fn from(pkg: domain::Package) -> Self {
        Self(pkg.into())
    }
}

/// A travel package.
#[graphql_object(context = Context)]
impl Package {
    /// Unique identifier of this `Package`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Package.id",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `Package`.
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// URL-safe unique key of this `Package`.
    pub fn slug(&self) -> Slug {
        self.0.slug.clone().into()
    }

    /// Category of this `Package`.
    pub fn category(&self) -> Category {
        self.0.category.into()
    }

    /// Type of this `Package` within its `PackageCategory`.
    #[graphql(name = "type")]
    pub fn r#type(&self) -> Type {
        self.0.r#type.clone().into()
    }

    /// Duration of this `Package` trip.
    pub fn duration(&self) -> Duration {
        self.0.duration.into()
    }

    /// Price of this `Package` per person.
    pub fn price(&self) -> Price {
        self.0.price
    }

    /// Price of this `Package` formatted for display (`₹12,000/person`).
    pub fn price_per_person(&self) -> String {
        self.0.price_per_person().to_string()
    }

    /// Description of this `Package`.
    pub fn description(&self) -> Description {
        self.0.description.clone().into()
    }

    /// URLs of the main images of this `Package`.
    pub fn images(&self) -> &[String] {
        &self.0.images
    }

    /// URLs of the gallery images of this `Package`.
    pub fn gallery_images(&self) -> &[String] {
        &self.0.gallery_images
    }

    /// What's included into this `Package`.
    pub fn inclusions(&self) -> &[String] {
        &self.0.inclusions
    }

    /// What's not included into this `Package`.
    pub fn exclusions(&self) -> &[String] {
        &self.0.exclusions
    }

    /// Terms and conditions of this `Package`.
    pub fn terms_and_conditions(&self) -> &[String] {
        &self.0.terms_and_conditions
    }

    /// Cancellation policy of this `Package`.
    pub fn cancellation_policy(&self) -> &[String] {
        &self.0.cancellation_policy
    }

    /// Day by day itinerary of this `Package`.
    pub fn itinerary(&self) -> Vec<Day> {
        self.0.itinerary.iter().map(Into::into).collect()
    }

    /// Cost breakdown of this `Package`.
    ///
    /// Disabled or empty breakdowns are omitted, unless `all` is requested.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_ADMIN` - `all` is requested by a non-administrator.
    #[tracing::instrument(
        skip_all,
        fields(
            all = ?all,
            gql.name = "Package.costSection",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn cost_section(
        &self,
        all: Option<bool>,
        ctx: &Context,
    ) -> Result<Option<CostSection>, Error> {
        if all.unwrap_or_default() {
            _ = ctx.current_admin_session().await?;
            Ok(Some((&self.0.cost_section).into()))
        } else {
            Ok(self.0.cost_section().map(Into::into))
        }
    }

    /// Rating of this `Package`.
    pub fn rating(&self) -> Rating {
        self.0.rating
    }

    /// Number of reviews this `Package` has.
    pub fn reviews_count(&self) -> i32 {
        i32::try_from(self.0.reviews_count).unwrap_or(i32::MAX)
    }

    /// Indicator whether this `Package` is featured.
    pub fn featured(&self) -> bool {
        self.0.featured
    }

    /// `DateTime` when this `Package` was created.
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `DateTime` when this `Package` was updated last time.
    pub fn updated_at(&self) -> DateTime {
        self.0.updated_at.coerce()
    }
}

/// Unique identifier of a `Package`.
#[derive(
    Clone, Copy, Debug, Display, Eq, From, GraphQLScalar, Into, PartialEq,
)]
#[from(domain::package::Id)]
#[into(domain::package::Id)]
#[graphql(name = "PackageId", transparent)]
pub struct Id(Uuid);

/// Name of a `Package`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PackageName",
    with = scalar::Via::<domain::package::Name>,
)]
pub struct Name(domain::package::Name);

/// URL-safe unique key of a `Package`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PackageSlug",
    with = scalar::Via::<domain::package::Slug>,
)]
pub struct Slug(domain::package::Slug);

/// Type of a `Package` within its `PackageCategory` (`domestic`, `birthday`
/// and so on).
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PackageType",
    with = scalar::Via::<domain::package::Type>,
)]
pub struct Type(domain::package::Type);

/// Description of a `Package`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PackageDescription",
    with = scalar::Via::<domain::package::Description>,
)]
pub struct Description(domain::package::Description);

/// Category of a `Package`.
#[derive(Clone, Copy, Debug, Eq, GraphQLEnum, PartialEq)]
#[graphql(name = "PackageCategory")]
pub enum Category {
    /// Trips for newlyweds and couples.
    RomanticHoneymoon,

    /// Birthdays, anniversaries and other occasions.
    CelebrationPackages,

    /// Trips with friends before the wedding.
    BachelorHolidays,

    /// Trips for the whole family.
    FamilyHolidays,
}

impl From<domain::package::Category> for Category {
    fn from(category: domain::package::Category) -> Self {
        use domain::package::Category as C;

        match category {
            C::RomanticHoneymoon => Self::RomanticHoneymoon,
            C::CelebrationPackages => Self::CelebrationPackages,
            C::BachelorHolidays => Self::BachelorHolidays,
            C::FamilyHolidays => Self::FamilyHolidays,
        }
    }
}

impl From<Category> for domain::package::Category {
    fn from(category: Category) -> Self {
        match category {
            Category::RomanticHoneymoon => Self::RomanticHoneymoon,
            Category::CelebrationPackages => Self::CelebrationPackages,
            Category::BachelorHolidays => Self::BachelorHolidays,
            Category::FamilyHolidays => Self::FamilyHolidays,
        }
    }
}

/// Duration of a `Package` trip.
#[derive(Clone, Copy, Debug, GraphQLObject)]
#[graphql(name = "PackageDuration")]
pub struct Duration {
    /// Number of days.
    pub days: i32,

    /// Number of nights.
    pub nights: i32,
}

impl From<domain::package::Duration> for Duration {
    fn from(duration: domain::package::Duration) -> Self {
        Self {
            days: duration.days().into(),
            nights: duration.nights().into(),
        }
    }
}

/// Duration of a `Package` trip.
#[derive(Clone, Copy, Debug, GraphQLInputObject)]
#[graphql(name = "PackageDurationInput")]
pub struct DurationInput {
    /// Number of days, at least one.
    pub days: i32,

    /// Number of nights.
    pub nights: i32,
}

impl TryFrom<DurationInput> for domain::package::Duration {
    type Error = Error;

    fn try_from(input: DurationInput) -> Result<Self, Self::Error> {
        let days = u16::try_from(input.days).ok();
        let nights = u16::try_from(input.nights).ok();
        days.zip(nights)
            .and_then(|(d, n)| Self::new(d, n))
            .ok_or_else(|| InputError::Duration.into())
    }
}

/// Single day of a `Package` itinerary.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PackageDay")]
pub struct Day {
    /// 1-based number of this `PackageDay`.
    pub day: i32,

    /// Title of this `PackageDay`.
    pub title: String,

    /// Description of this `PackageDay`.
    pub description: String,

    /// Non-empty lines of the description of this `PackageDay`.
    pub description_lines: Vec<String>,

    /// Meals included into this `PackageDay`.
    pub meals: String,

    /// Hotel to stay at during this `PackageDay`.
    pub hotel: String,
}

impl From<&domain::package::Day> for Day {
    fn from(day: &domain::package::Day) -> Self {
        Self {
            day: day.day.into(),
            title: day.title.clone(),
            description: day.description.clone(),
            description_lines: day.description_lines(),
            meals: day.meals.clone(),
            hotel: day.hotel.clone(),
        }
    }
}

/// Single day of a `Package` itinerary.
///
/// Days are numbered by their position, so no number is accepted.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PackageDayInput")]
pub struct DayInput {
    /// Title of the day.
    #[graphql(default)]
    pub title: String,

    /// Description of the day, line by line.
    #[graphql(default)]
    pub description: String,

    /// Meals included into the day.
    #[graphql(default)]
    pub meals: String,

    /// Hotel to stay at during the day.
    #[graphql(default)]
    pub hotel: String,
}

/// Cost breakdown table of a `Package`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PackageCostSection")]
pub struct CostSection {
    /// Indicator whether this breakdown is shown to the public.
    pub enabled: bool,

    /// Title of this breakdown.
    pub title: String,

    /// Subtitle of this breakdown.
    pub subtitle: String,

    /// Note shown below this breakdown.
    pub note: String,

    /// Columns of this breakdown, in display order.
    pub columns: Vec<CostColumn>,

    /// Rows of this breakdown, in display order.
    pub rows: Vec<CostRow>,
}

impl From<&domain::package::CostSection> for CostSection {
    fn from(section: &domain::package::CostSection) -> Self {
        let columns = &section.table.columns;
        Self {
            enabled: section.enabled,
            title: section.title.clone(),
            subtitle: section.subtitle.clone(),
            note: section.note.clone(),
            columns: columns
                .iter()
                .map(|c| CostColumn {
                    id: c.id.to_string(),
                    label: c.label.clone(),
                })
                .collect(),
            rows: section
                .table
                .rows
                .iter()
                .map(|r| CostRow {
                    id: r.id.to_string(),
                    highlight: r.highlight,
                    cells: columns
                        .iter()
                        .map(|c| CostCell {
                            column: c.id.to_string(),
                            value: r
                                .cells
                                .get(&c.id)
                                .cloned()
                                .unwrap_or_default(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// Column of a `PackageCostSection`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PackageCostColumn")]
pub struct CostColumn {
    /// Opaque identifier of this column.
    pub id: String,

    /// Header label of this column.
    pub label: String,
}

/// Row of a `PackageCostSection`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PackageCostRow")]
pub struct CostRow {
    /// Opaque identifier of this row.
    pub id: String,

    /// Indicator whether this row is emphasized.
    pub highlight: bool,

    /// Cells of this row, one per column, in the columns order.
    pub cells: Vec<CostCell>,
}

/// Cell of a `PackageCostRow`.
#[derive(Clone, Debug, GraphQLObject)]
#[graphql(name = "PackageCostCell")]
pub struct CostCell {
    /// Identifier of the `PackageCostColumn` of this cell.
    pub column: String,

    /// Value of this cell.
    pub value: String,
}

/// Cost breakdown table of a `Package`.
#[derive(Clone, Debug, Default, GraphQLInputObject)]
#[graphql(name = "PackageCostSectionInput")]
pub struct CostSectionInput {
    /// Indicator whether the breakdown is shown to the public.
    #[graphql(default)]
    pub enabled: bool,

    /// Title of the breakdown.
    #[graphql(default)]
    pub title: String,

    /// Subtitle of the breakdown.
    #[graphql(default)]
    pub subtitle: String,

    /// Note shown below the breakdown.
    #[graphql(default)]
    pub note: String,

    /// Columns of the breakdown, in display order.
    #[graphql(default)]
    pub columns: Vec<CostColumnInput>,

    /// Rows of the breakdown, in display order.
    #[graphql(default)]
    pub rows: Vec<CostRowInput>,
}

/// Column of a `PackageCostSectionInput`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PackageCostColumnInput")]
pub struct CostColumnInput {
    /// Opaque identifier of the column, generated if omitted.
    pub id: Option<String>,

    /// Header label of the column.
    pub label: String,
}

/// Row of a `PackageCostSectionInput`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PackageCostRowInput")]
pub struct CostRowInput {
    /// Opaque identifier of the row, generated if omitted.
    pub id: Option<String>,

    /// Indicator whether the row is emphasized.
    #[graphql(default)]
    pub highlight: bool,

    /// Cells of the row, referring to columns by their identifiers.
    #[graphql(default)]
    pub cells: Vec<CostCellInput>,
}

/// Cell of a `PackageCostRowInput`.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PackageCostCellInput")]
pub struct CostCellInput {
    /// Identifier of the column of the cell.
    pub column: String,

    /// Value of the cell.
    pub value: String,
}

impl TryFrom<CostSectionInput> for domain::package::CostSection {
    type Error = Error;

    fn try_from(input: CostSectionInput) -> Result<Self, Self::Error> {
        use domain::package::cost::{column, row, Column, Row, Table};

        let columns = input
            .columns
            .into_iter()
            .map(|c| Column {
                id: c.id.map_or_else(column::Id::random, Into::into),
                label: c.label,
            })
            .collect::<Vec<_>>();
        let rows = input
            .rows
            .into_iter()
            .map(|r| {
                let mut cells = r
                    .cells
                    .into_iter()
                    .map(|c| (column::Id::from(c.column), c.value))
                    .collect::<BTreeMap<_, _>>();
                for c in &columns {
                    _ = cells.entry(c.id.clone()).or_default();
                }
                Row {
                    id: r.id.map_or_else(row::Id::random, Into::into),
                    highlight: r.highlight,
                    cells,
                }
            })
            .collect();

        let mut table = Table { columns, rows };
        table
            .check_unique_ids()
            .map_err(|_| Error::from(InputError::CostIds))?;
        table.strip_orphans();
        Ok(Self {
            enabled: input.enabled,
            title: input.title,
            subtitle: input.subtitle,
            note: input.note,
            table,
        })
    }
}

/// Whole `Package` document to be written.
#[derive(Clone, Debug, GraphQLInputObject)]
#[graphql(name = "PackageInput")]
pub struct Input {
    /// Name of the `Package`.
    pub name: Name,

    /// URL-safe unique key of the `Package`.
    pub slug: Slug,

    /// Category of the `Package`.
    pub category: Category,

    /// Type of the `Package` within its `PackageCategory`.
    #[graphql(name = "type")]
    pub r#type: Type,

    /// Duration of the `Package` trip.
    pub duration: DurationInput,

    /// Price of the `Package` per person.
    pub price: Price,

    /// Description of the `Package`.
    pub description: Description,

    /// URLs of the main images, blank ones are dropped.
    #[graphql(default)]
    pub images: Vec<String>,

    /// URLs of the gallery images, blank ones are dropped.
    #[graphql(default)]
    pub gallery_images: Vec<String>,

    /// What's included, blank lines are dropped.
    #[graphql(default)]
    pub inclusions: Vec<String>,

    /// What's not included, blank lines are dropped.
    #[graphql(default)]
    pub exclusions: Vec<String>,

    /// Terms and conditions, blank lines are dropped.
    #[graphql(default)]
    pub terms_and_conditions: Vec<String>,

    /// Cancellation policy, blank lines are dropped.
    #[graphql(default)]
    pub cancellation_policy: Vec<String>,

    /// Day by day itinerary.
    #[graphql(default)]
    pub itinerary: Vec<DayInput>,

    /// Cost breakdown table.
    #[graphql(default)]
    pub cost_section: CostSectionInput,

    /// Rating of the `Package`.
    pub rating: Rating,

    /// Number of reviews the `Package` has.
    pub reviews_count: i32,

    /// Indicator whether the `Package` is featured.
    #[graphql(default)]
    pub featured: bool,
}

impl TryFrom<Input> for domain::package::Document {
    type Error = Error;

    fn try_from(input: Input) -> Result<Self, Self::Error> {
        let Input {
            name,
            slug,
            category,
            r#type,
            duration,
            price,
            description,
            images,
            gallery_images,
            inclusions,
            exclusions,
            terms_and_conditions,
            cancellation_policy,
            itinerary,
            cost_section,
            rating,
            reviews_count,
            featured,
        } = input;

        let mut itinerary = itinerary
            .into_iter()
            .map(|d| domain::package::Day {
                day: 0,
                title: d.title,
                description: text::normalize(&d.description),
                meals: d.meals,
                hotel: d.hotel,
            })
            .collect::<Vec<_>>();
        itinerary::renumber(&mut itinerary);

        Ok(Self {
            category: category.into(),
            r#type: r#type.into(),
            duration: duration.try_into()?,
            images: text::non_blank(images),
            gallery_images: text::non_blank(gallery_images),
            inclusions: text::non_blank(inclusions),
            exclusions: text::non_blank(exclusions),
            terms_and_conditions: text::non_blank(terms_and_conditions),
            cancellation_policy: text::non_blank(cancellation_policy),
            itinerary,
            cost_section: cost_section.try_into()?,
            rating,
            reviews_count: u32::try_from(reviews_count)
                .map_err(|_| Error::from(InputError::ReviewsCount))?,
            featured,
            ..Self::new(name.into(), slug.into(), price, description.into())
        })
    }
}

define_error! {
    enum InputError {
        #[code = "INVALID_DURATION"]
        #[status = BAD_REQUEST]
        #[message = "`PackageDuration` must have at least one day and no \
                     negative nights"]
        Duration,

        #[code = "INVALID_REVIEWS_COUNT"]
        #[status = BAD_REQUEST]
        #[message = "`reviewsCount` must not be negative"]
        ReviewsCount,

        #[code = "DUPLICATE_COST_ID"]
        #[status = BAD_REQUEST]
        #[message = "`PackageCostSectionInput` columns and rows must have \
                     unique identifiers"]
        CostIds,
    }
}

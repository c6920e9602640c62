//! [`Record`] definitions.

use common::{Price, Rating};
use serde::{Deserialize, Deserializer, Serialize};
use tracing as log;

use super::{
    cost::CostSection, itinerary, text, Category, Day, Description, Document,
    Duration, Name, Slug, Type, DEFAULT_REVIEWS_COUNT,
};

/// [`Name`] a stored [`Document`] gets when its own one is missing or invalid.
pub const FALLBACK_NAME: &str = "Untitled package";

/// [`Slug`] a stored [`Document`] gets when neither its own one nor its
/// [`Name`] gives a valid one.
pub const FALLBACK_SLUG: &str = "untitled-package";

/// Stored shape of a [`Document`].
///
/// Reading is lenient: every key is optional, `null`s are treated as absent
/// values and older layouts are accepted. Converting into a [`Document`]
/// normalizes the contents into the canonical shape.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Record {
    /// Name of the package.
    #[serde(deserialize_with = "nullable")]
    pub name: String,

    /// Slug of the package.
    #[serde(deserialize_with = "nullable")]
    pub slug: String,

    /// Category of the package.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Type of the package within its category.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r#type: Option<String>,

    /// Duration of the trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,

    /// Price of the trip.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,

    /// Description of the package.
    #[serde(deserialize_with = "nullable")]
    pub description: String,

    /// Cover image URLs.
    #[serde(deserialize_with = "nullable")]
    pub images: Vec<String>,

    /// Gallery image URLs.
    #[serde(deserialize_with = "nullable")]
    pub gallery_images: Vec<String>,

    /// Inclusions, line by line.
    #[serde(deserialize_with = "lines")]
    pub inclusions: Vec<String>,

    /// Exclusions, line by line.
    #[serde(deserialize_with = "lines")]
    pub exclusions: Vec<String>,

    /// Terms and conditions, line by line.
    #[serde(deserialize_with = "lines")]
    pub terms_and_conditions: Vec<String>,

    /// Cancellation policy, line by line.
    #[serde(deserialize_with = "lines")]
    pub cancellation_policy: Vec<String>,

    /// Itinerary days.
    #[serde(deserialize_with = "nullable")]
    pub itinerary: Vec<Day>,

    /// Cost section.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_section: Option<CostSection>,

    /// Displayed rating.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,

    /// Displayed number of reviews.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviews_count: Option<u32>,

    /// Indicator whether the package is featured.
    #[serde(deserialize_with = "nullable")]
    pub featured: bool,
}

impl Record {
    /// Normalizes this [`Record`] into a [`Document`].
    ///
    /// Missing values get their defaults, itinerary [`Day`]s are renumbered
    /// by position. Cost table [`Column`]s and [`Row`]s repeating an ID are
    /// dropped, the same as cells without a column.
    ///
    /// A missing or invalid [`Name`] becomes [`FALLBACK_NAME`]. A missing or
    /// invalid [`Slug`] is derived from the [`Name`], or becomes
    /// [`FALLBACK_SLUG`] if it cannot be. A missing or blank [`Description`]
    /// repeats the [`Name`].
    ///
    /// [`Column`]: super::cost::Column
    /// [`Row`]: super::cost::Row
    #[must_use]
    pub fn into_document(self) -> Document {
        let Self {
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
            mut itinerary,
            cost_section,
            rating,
            reviews_count,
            featured,
        } = self;

        itinerary::renumber(&mut itinerary);
        for day in &mut itinerary {
            if day.title.trim().is_empty() {
                day.title = format!("Day {}", day.day);
            }
        }

        let mut cost_section = cost_section.unwrap_or_default();
        cost_section.table.dedupe();
        cost_section.table.strip_orphans();

        let lines =
            |l: Vec<String>| text::from_editable(&text::to_editable(&l));

        let name = Name::new(name.trim()).unwrap_or_else(|| {
            log::warn!("stored package has invalid name: {name:?}");
            Name(FALLBACK_NAME.into())
        });
        let slug = Slug::new(slug.trim()).unwrap_or_else(|| {
            log::warn!("stored package `{name}` has invalid slug: {slug:?}");
            Slug::from_name(name.as_ref())
                .unwrap_or_else(|| Slug(FALLBACK_SLUG.into()))
        });
        let description = Description::new(description)
            .unwrap_or_else(|| Description(name.to_string()));

        Document {
            name,
            slug,
            category: category
                .and_then(|c| c.parse().ok())
                .unwrap_or_default(),
            r#type: r#type
                .and_then(|t| Type::new(t.trim().to_lowercase()))
                .unwrap_or_default(),
            duration: duration
                .and_then(|d| Duration::new(d.days(), d.nights()))
                .unwrap_or_default(),
            price: price.unwrap_or_default(),
            description,
            images,
            gallery_images,
            inclusions: lines(inclusions),
            exclusions: lines(exclusions),
            terms_and_conditions: lines(terms_and_conditions),
            cancellation_policy: lines(cancellation_policy),
            itinerary,
            cost_section,
            rating: rating
                .and_then(|r| Rating::try_from(r).ok())
                .unwrap_or_default(),
            reviews_count: reviews_count.unwrap_or(DEFAULT_REVIEWS_COUNT),
            featured,
        }
    }
}

impl From<&Document> for Record {
    fn from(doc: &Document) -> Self {
        Self {
            name: doc.name.to_string(),
            slug: doc.slug.to_string(),
            category: Some(doc.category.as_str().to_owned()),
            r#type: Some(doc.r#type.to_string()),
            duration: Some(doc.duration),
            price: Some(doc.price),
            description: doc.description.to_string(),
            images: doc.images.clone(),
            gallery_images: doc.gallery_images.clone(),
            inclusions: doc.inclusions.clone(),
            exclusions: doc.exclusions.clone(),
            terms_and_conditions: doc.terms_and_conditions.clone(),
            cancellation_policy: doc.cancellation_policy.clone(),
            itinerary: doc.itinerary.clone(),
            cost_section: Some(doc.cost_section.clone()),
            rating: Some(doc.rating.as_f64()),
            reviews_count: Some(doc.reviews_count),
            featured: doc.featured,
        }
    }
}

/// Deserializes `null` as a default value.
fn nullable<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Deserializes a sequence of lines, accepting a single multi-line string as
/// well.
fn lines<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Lines(Vec<String>),
        Text(String),
    }

    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Lines(l)) => l,
        Some(Raw::Text(t)) => text::from_editable(&t),
        None => vec![],
    })
}

#[cfg(test)]
mod spec {
    use common::{Price, Rating};
    use serde_json::json;

    use crate::domain::package::{
        Category, Description, Document, Name, Slug,
    };

    use super::{Record, FALLBACK_NAME, FALLBACK_SLUG};

    fn normalize(value: serde_json::Value) -> Document {
        serde_json::from_value::<Record>(value)
            .unwrap()
            .into_document()
    }

    #[test]
    fn fills_missing_values() {
        let doc = normalize(json!({
            "name": "Goa Getaway",
            "slug": "goa-getaway",
            "price": 12000,
            "description": "Beach trip",
        }));

        assert_eq!(doc.price, Price::from(12_000));
        assert_eq!(doc.category, Category::RomanticHoneymoon);
        assert_eq!(doc.r#type.to_string(), "domestic");
        assert_eq!((doc.duration.days(), doc.duration.nights()), (1, 0));
        assert!(doc.itinerary.is_empty());
        assert!(doc.images.is_empty());
        assert!(doc.inclusions.is_empty());
        assert!(!doc.cost_section.enabled);
        assert!(doc.cost_section.table.columns.is_empty());
        assert_eq!(doc.rating, Rating::DEFAULT);
        assert_eq!(doc.reviews_count, 10);
    }

    #[test]
    fn tolerates_nulls_and_legacy_layouts() {
        let doc = normalize(json!({
            "name": "Manali",
            "slug": "manali",
            "category": "family-holidays",
            "type": "Domestic",
            "images": null,
            "inclusions": "Breakfast\n\n Sightseeing ",
            "exclusions": ["Flights", "  ", ""],
            "costSection": null,
            "itinerary": [
                {"day": 5, "title": "Arrive", "description": ["Land", "Rest"]},
                {"day": 5, "description": "Snow point"},
            ],
            "rating": 9,
        }));

        assert_eq!(doc.category, Category::FamilyHolidays);
        assert_eq!(doc.r#type.to_string(), "domestic");
        assert!(doc.images.is_empty());
        assert_eq!(doc.inclusions, ["Breakfast", "Sightseeing"]);
        assert_eq!(doc.exclusions, ["Flights"]);
        assert_eq!(doc.itinerary[0].day, 1);
        assert_eq!(doc.itinerary[0].description, "Land\nRest");
        assert_eq!(doc.itinerary[1].day, 2);
        assert_eq!(doc.itinerary[1].title, "Day 2");
        assert_eq!(doc.rating, Rating::DEFAULT);
    }

    #[test]
    fn drops_orphan_cells() {
        let doc = normalize(json!({
            "costSection": {
                "enabled": true,
                "table": {
                    "columns": [{"id": "c1", "label": "Item"}],
                    "rows": [{
                        "id": "r1",
                        "cells": {"c1": "Hotel", "gone": "x"},
                    }],
                },
            },
        }));

        let table = &doc.cost_section.table;
        assert_eq!(table.rows[0].cells.len(), 1);
        assert_eq!(table.cell(&"r1".into(), &"c1".into()), Some("Hotel"));
    }

    #[test]
    fn keeps_first_of_repeated_cost_ids() {
        let doc = normalize(json!({
            "name": "Goa Getaway",
            "slug": "goa-getaway",
            "costSection": {
                "table": {
                    "columns": [
                        {"id": "c1", "label": "Item"},
                        {"id": "c1", "label": "Copy"},
                    ],
                    "rows": [
                        {"id": "r1", "cells": {"c1": "Hotel"}},
                        {"id": "r1", "cells": {"c1": "Flight"}},
                    ],
                },
            },
        }));

        let table = &doc.cost_section.table;
        assert_eq!(table.check_unique_ids(), Ok(()));
        assert_eq!(table.columns.len(), 1);
        assert_eq!(table.columns[0].label, "Item");
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.cell(&"r1".into(), &"c1".into()), Some("Hotel"));
    }

    #[test]
    fn validates_identity_values() {
        let doc = normalize(json!({"price": 100}));
        assert_eq!(doc.name.to_string(), FALLBACK_NAME);
        assert_eq!(doc.slug.to_string(), FALLBACK_SLUG);
        assert_eq!(doc.description.to_string(), FALLBACK_NAME);

        let doc = normalize(json!({
            "name": "  Kerala Backwaters ",
            "slug": "Not A Slug",
            "description": "   ",
        }));
        assert_eq!(doc.name.to_string(), "Kerala Backwaters");
        assert_eq!(doc.slug.to_string(), "kerala-backwaters");
        assert_eq!(doc.description.to_string(), "Kerala Backwaters");

        let doc = normalize(json!({"name": "!!!", "slug": null}));
        assert_eq!(doc.name.to_string(), "!!!");
        assert_eq!(doc.slug.to_string(), FALLBACK_SLUG);
    }

    #[test]
    fn stores_camel_case_document() {
        let doc = Document::new(
            Name::new("Goa Getaway").unwrap(),
            Slug::new("goa-getaway").unwrap(),
            Price::from(12_000),
            Description::new("Beach trip").unwrap(),
        );

        let stored = serde_json::to_value(Record::from(&doc)).unwrap();

        assert_eq!(stored["name"], "Goa Getaway");
        assert_eq!(stored["type"], "domestic");
        assert_eq!(stored["category"], "romantic-honeymoon");
        assert_eq!(stored["price"], 12000);
        assert_eq!(stored["itinerary"], json!([]));
        assert_eq!(stored["images"], json!([]));
        assert_eq!(stored["galleryImages"], json!([]));
        assert_eq!(stored["termsAndConditions"], json!([]));
        assert_eq!(stored["rating"], 4.5);
        assert_eq!(stored["reviewsCount"], 10);
        assert_eq!(stored["duration"], json!({"days": 1, "nights": 0}));
        assert_eq!(stored["costSection"]["table"]["rows"], json!([]));

        let back = serde_json::from_value::<Record>(stored)
            .unwrap()
            .into_document();
        assert_eq!(back, doc);
    }
}

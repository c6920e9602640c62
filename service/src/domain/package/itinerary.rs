//! [`Day`] definitions.

use serde::{Deserialize, Deserializer, Serialize};

#[cfg(doc)]
use crate::domain::Package;

use super::text;

/// Single entry of a [`Package`] itinerary.
///
/// Order of [`Day`]s is their position in the itinerary, and the
/// [`Day::day`] number is always derived from it.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Day {
    /// 1-based sequence number of this [`Day`].
    pub day: u16,

    /// Title of this [`Day`].
    #[serde(deserialize_with = "nullable")]
    pub title: String,

    /// Description of this [`Day`], rendered line by line.
    #[serde(deserialize_with = "text_or_lines")]
    pub description: String,

    /// Meals included in this [`Day`].
    #[serde(deserialize_with = "nullable")]
    pub meals: String,

    /// Hotel to stay at during this [`Day`].
    #[serde(deserialize_with = "nullable")]
    pub hotel: String,
}

impl Day {
    /// Creates a new empty [`Day`] with the provided sequence number.
    #[must_use]
    pub fn numbered(day: u16) -> Self {
        Self {
            day,
            ..Self::default()
        }
    }

    /// Returns the [`Day::description`] split into trimmed non-empty lines.
    #[must_use]
    pub fn description_lines(&self) -> Vec<String> {
        text::from_editable(&self.description)
    }
}

/// Re-derives [`Day::day`] numbers of the provided `days` from their
/// positions.
pub fn renumber<'d>(days: impl IntoIterator<Item = &'d mut Day>) {
    for (n, day) in (1..).zip(days) {
        day.day = n;
    }
}

/// Returns the sequence number a [`Day`] appended after `len` entries gets.
#[must_use]
pub fn next_number(len: usize) -> u16 {
    u16::try_from(len).map_or(u16::MAX, |n| n.saturating_add(1))
}

/// Deserializes `null` as an empty [`String`].
fn nullable<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(d)?.unwrap_or_default())
}

/// Deserializes a [`Day::description`] either from a string or from a list of
/// lines (older documents stored it this way).
fn text_or_lines<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Option::<Raw>::deserialize(d)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Lines(lines)) => lines.join("\n"),
        None => String::new(),
    })
}

#[cfg(test)]
mod spec {
    use super::{next_number, renumber, Day};

    #[test]
    fn renumbers_by_position() {
        let mut days =
            vec![Day::numbered(7), Day::numbered(3), Day::numbered(3)];

        renumber(&mut days);

        assert_eq!(days.iter().map(|d| d.day).collect::<Vec<_>>(), [1, 2, 3]);
    }

    #[test]
    fn next_number_follows_length() {
        assert_eq!(next_number(0), 1);
        assert_eq!(next_number(4), 5);
    }

    #[test]
    fn accepts_legacy_description_lines() {
        let day: Day = serde_json::from_str(
            r#"{"day": 2, "title": "Arrival", "description": ["Land","Rest"]}"#,
        )
        .unwrap();

        assert_eq!(day.description, "Land\nRest");
        assert_eq!(day.meals, "");
        assert_eq!(day.description_lines(), ["Land", "Rest"]);
    }

    #[test]
    fn tolerates_nulls() {
        let day: Day = serde_json::from_str(
            r#"{"title": null, "description": null, "hotel": "Taj"}"#,
        )
        .unwrap();

        assert_eq!(day.title, "");
        assert_eq!(day.description, "");
        assert_eq!(day.hotel, "Taj");
    }
}

//! [`Price`]-related definitions.

use std::{fmt, str::FromStr};

use derive_more::Display;
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use rust_decimal::{Decimal, RoundingStrategy};

/// Non-negative amount of money.
///
/// Stored without a currency: the agency sells in a single currency and only
/// the presentation layer decides how to render it (see [`Price::display()`]).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Display,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Price(Decimal);

impl Price {
    /// Zero [`Price`].
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Creates a new [`Price`] if the provided `amount` is not negative.
    #[must_use]
    pub fn new(amount: Decimal) -> Option<Self> {
        (!amount.is_sign_negative() || amount.is_zero()).then_some(Self(amount))
    }

    /// Returns the amount of this [`Price`].
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Indicates whether this [`Price`] is zero.
    #[must_use]
    pub fn is_zero(self) -> bool {
        self.0.is_zero()
    }

    /// Renders this [`Price`] in Indian Rupees, rounded to whole rupees and
    /// grouped the Indian way (`₹12,34,567`).
    #[must_use]
    pub fn display(self) -> Formatted {
        Formatted { price: self, unit: None }
    }

    /// Renders this [`Price`] as a per-person amount (`₹12,000/person`).
    #[must_use]
    pub fn per_person(self) -> Formatted {
        Formatted {
            price: self,
            unit: Some("person"),
        }
    }

    /// Renders this [`Price`] as a per-kilometer amount (`₹15/km`).
    #[must_use]
    pub fn per_km(self) -> Formatted {
        Formatted {
            price: self,
            unit: Some("km"),
        }
    }
}

impl FromStr for Price {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .ok()
            .and_then(Self::new)
            .ok_or("invalid `Price`")
    }
}

impl TryFrom<f64> for Price {
    type Error = &'static str;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_f64_retain(value)
            .map(|d| d.normalize())
            .and_then(Self::new)
            .ok_or("invalid `Price`")
    }
}

impl From<u32> for Price {
    fn from(value: u32) -> Self {
        Self(value.into())
    }
}

/// Human-readable rendering of a [`Price`].
#[derive(Clone, Copy, Debug)]
pub struct Formatted {
    /// [`Price`] to render.
    price: Price,

    /// Unit the [`Price`] is quoted per, if any.
    unit: Option<&'static str>,
}

impl fmt::Display for Formatted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rupees = self
            .price
            .0
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .trunc()
            .to_string();

        // Last three digits form the first group, every next group has two.
        let (head, tail) = rupees.split_at(rupees.len().saturating_sub(3));
        let mut groups = Vec::new();
        let mut rest = head;
        while !rest.is_empty() {
            let (more, group) = rest.split_at(rest.len().saturating_sub(2));
            groups.push(group);
            rest = more;
        }
        groups.reverse();
        groups.push(tail);

        write!(f, "₹{}", groups.join(","))?;
        if let Some(unit) = self.unit {
            write!(f, "/{unit}")?;
        }
        Ok(())
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! [`serde`] integration.
    //!
    //! [`Price`] is a plain JSON number in stored documents.

    use std::fmt;

    use rust_decimal::{prelude::ToPrimitive as _, Decimal};
    use serde::{
        de::{self, Visitor},
        Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::Price;

    impl Serialize for Price {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            if self.0.is_integer() {
                if let Some(int) = self.0.to_u64() {
                    return s.serialize_u64(int);
                }
            }
            s.serialize_f64(self.0.to_f64().unwrap_or_default())
        }
    }

    impl<'de> Deserialize<'de> for Price {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            d.deserialize_any(PriceVisitor)
        }
    }

    /// [`Visitor`] accepting any non-negative number or numeric string.
    struct PriceVisitor;

    impl Visitor<'_> for PriceVisitor {
        type Value = Price;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a non-negative number")
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Price, E> {
            Ok(Price(Decimal::from(v)))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Price, E> {
            Price::new(Decimal::from(v))
                .ok_or_else(|| E::custom("price cannot be negative"))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Price, E> {
            Price::try_from(v).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Price, E> {
            v.parse().map_err(E::custom)
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! [`juniper`] integration.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Non-negative decimal amount, as a string (`"12000"`, `"149.50"`).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Price = super::Price;

    impl Price {
        fn to_output<S: ScalarValue>(p: &Price) -> Value<S> {
            Value::scalar(p.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            let s = input.as_string_value().ok_or_else(|| {
                format!("expected `Price` string, found: {input}")
            })?;
            s.parse()
                .map_err(|e| format!("cannot parse `Price` input scalar: {e}"))
        }
    }
}

#[cfg(test)]
mod spec {
    use rust_decimal::Decimal;

    use super::Price;

    fn price(s: &str) -> Price {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_negative() {
        assert!(Price::new(Decimal::NEGATIVE_ONE).is_none());
        assert!("-5".parse::<Price>().is_err());
        assert!("abc".parse::<Price>().is_err());
        assert_eq!(price("0"), Price::ZERO);
        assert_eq!(price(" 12000 "), Price::from(12_000));
    }

    #[test]
    fn formats_indian_grouping() {
        assert_eq!(price("0").display().to_string(), "₹0");
        assert_eq!(price("999").display().to_string(), "₹999");
        assert_eq!(price("12000").display().to_string(), "₹12,000");
        assert_eq!(price("123456").display().to_string(), "₹1,23,456");
        assert_eq!(price("1234567").display().to_string(), "₹12,34,567");
        assert_eq!(price("149.5").display().to_string(), "₹150");
    }

    #[test]
    fn formats_units() {
        assert_eq!(price("12000").per_person().to_string(), "₹12,000/person");
        assert_eq!(price("15").per_km().to_string(), "₹15/km");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn serializes_as_number() {
        assert_eq!(serde_json::to_string(&price("12000")).unwrap(), "12000");
        assert_eq!(serde_json::to_string(&price("149.5")).unwrap(), "149.5");

        let p: Price = serde_json::from_str("12000").unwrap();
        assert_eq!(p, price("12000"));
        let p: Price = serde_json::from_str("149.5").unwrap();
        assert_eq!(p, price("149.5"));
        assert!(serde_json::from_str::<Price>("-1").is_err());
    }
}

//! [`Rating`]-related definitions.

use std::str::FromStr;

use derive_more::Display;
use rust_decimal::{prelude::FromPrimitive as _, Decimal};

/// Score between `0.0` and `5.0` with a single fraction digit.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Rating(Decimal);

impl Rating {
    /// Highest possible [`Rating`].
    pub const MAX: Self = Self(Decimal::from_parts(50, 0, 0, false, 1));

    /// [`Rating`] assigned to packages nobody has rated explicitly.
    pub const DEFAULT: Self = Self(Decimal::from_parts(45, 0, 0, false, 1));

    /// Creates a new [`Rating`] if the provided `value` lies within
    /// `0.0..=5.0`.
    ///
    /// Extra fraction digits are rounded away.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        let value = value.round_dp(1);
        (value >= Decimal::ZERO && value <= Self::MAX.0).then_some(Self(value))
    }

    /// Returns this [`Rating`] as a floating-point number.
    #[must_use]
    pub fn as_f64(self) -> f64 {
        use rust_decimal::prelude::ToPrimitive as _;

        self.0.to_f64().unwrap_or_default()
    }
}

impl Default for Rating {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<f64> for Rating {
    type Error = &'static str;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Decimal::from_f64(value)
            .and_then(Self::new)
            .ok_or("`Rating` must be within 0.0..=5.0")
    }
}

impl FromStr for Rating {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s)
            .ok()
            .and_then(Self::new)
            .ok_or("`Rating` must be within 0.0..=5.0")
    }
}

#[cfg(feature = "serde")]
mod serde {
    //! [`serde`] integration.

    use serde::{
        de::Error as _, Deserialize, Deserializer, Serialize, Serializer,
    };

    use super::Rating;

    impl Serialize for Rating {
        fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_f64(self.as_f64())
        }
    }

    impl<'de> Deserialize<'de> for Rating {
        fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            Rating::try_from(f64::deserialize(d)?).map_err(D::Error::custom)
        }
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! [`juniper`] integration.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Score between `0.0` and `5.0`.
    #[graphql_scalar(with = Self, parse_token(f64))]
    type Rating = super::Rating;

    impl Rating {
        fn to_output<S: ScalarValue>(r: &Rating) -> Value<S> {
            Value::scalar(r.as_f64())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            let v = input.as_float_value().ok_or_else(|| {
                format!("expected `Rating` number, found: {input}")
            })?;
            Self::try_from(v).map_err(str::to_owned)
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Rating;

    #[test]
    fn bounds() {
        assert!(Rating::try_from(0.0).is_ok());
        assert!(Rating::try_from(5.0).is_ok());
        assert!(Rating::try_from(5.1).is_err());
        assert!(Rating::try_from(-0.1).is_err());
        assert!("6".parse::<Rating>().is_err());
    }

    #[test]
    fn default_is_four_and_a_half() {
        assert_eq!(Rating::default(), "4.5".parse().unwrap());
        assert_eq!(Rating::default().to_string(), "4.5");
        assert!((Rating::default().as_f64() - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn rounds_to_single_digit() {
        assert_eq!(
            Rating::try_from(4.26).unwrap(),
            "4.3".parse::<Rating>().unwrap(),
        );
    }
}

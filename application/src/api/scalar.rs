//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute.
///
/// Represents the target type as a GraphQL string, parsed with the [`FromStr`]
/// and printed with the [`Display`] impls of the `As` domain type, so the
/// validation rules (of a `PackageSlug` or a `UserPhone`, for example) live
/// in one place.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Prints the target type as a scalar [`Value`].
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Parses the target type out of an [`InputValue`].
    ///
    /// # Errors
    ///
    /// If the [`InputValue`] is not a string, or if it's rejected either by
    /// the `As` type or by the target type.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr + fmt::Display,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = Self::name_of::<T, S>();
        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` scalar expects a string, found: {input}")
        })?;
        let parsed = s
            .parse::<As>()
            .map_err(|e| format!("`{name}` scalar rejects \"{s}\": {e}"))?;
        T::try_from(parsed).map_err(|e| format!("`{name}` scalar: {e}"))
    }

    /// Parses the provided [`ScalarToken`] as a [`String`].
    ///
    /// # Errors
    ///
    /// If the token is not a string literal.
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }

    /// Returns the GraphQL name of the target type.
    #[expect(clippy::missing_panics_doc, reason = "infallible")]
    fn name_of<T, S>() -> &'static str
    where
        T: GraphQLType<S, TypeInfo = ()>,
        S: ScalarValue,
    {
        T::name(&()).expect("scalars always have a name")
    }
}

#[cfg(test)]
mod spec {
    use derive_more::{AsRef, From};
    use juniper::{DefaultScalarValue, GraphQLScalar, InputValue};

    use super::Via;

    #[derive(AsRef, Debug, From, GraphQLScalar)]
    #[graphql(name = "NightsCount", with = Via::<u8>)]
    struct Nights(u8);

    fn parse(input: InputValue<DefaultScalarValue>) -> Result<Nights, String> {
        Via::<u8>::from_input(&input)
    }

    #[test]
    fn parses_strings_only() {
        let nights = parse(InputValue::scalar("4".to_owned())).unwrap();
        assert_eq!(nights.0, 4);

        let err = parse(InputValue::scalar(4)).unwrap_err();
        assert!(err.starts_with("`NightsCount` scalar expects"), "{err}");
    }

    #[test]
    fn names_rejected_scalar() {
        let err = parse(InputValue::scalar("forty".to_owned())).unwrap_err();

        assert!(
            err.starts_with("`NightsCount` scalar rejects \"forty\""),
            "{err}",
        );
    }
}

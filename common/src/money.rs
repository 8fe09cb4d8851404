//! [`Money`] definitions.

use std::{cmp::Ordering, fmt, str::FromStr};

use derive_more::{Display, Error};
use rust_decimal::Decimal;

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a new [`Money`] out of the provided `amount` and `currency`.
    #[must_use]
    pub const fn new(amount: Decimal, currency: Currency) -> Self {
        Self { amount, currency }
    }

    /// Indicates whether this [`Money`] amount is below zero.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    /// Compares amounts of this and the `other` [`Money`].
    ///
    /// [`None`] is returned if the [`Currency`]s differ, as such amounts are
    /// not comparable without a conversion rate.
    #[must_use]
    pub fn compare(&self, other: &Self) -> Option<Ordering> {
        (self.currency == other.currency)
            .then(|| self.amount.cmp(&other.amount))
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount.normalize(), self.currency)
    }
}

/// Error of parsing [`Money`] from a string.
#[derive(Clone, Copy, Debug, Display, Error)]
pub enum ParseError {
    /// Input is too short to contain both an amount and a [`Currency`] code.
    #[display("too short")]
    TooShort,

    /// Amount is not a valid decimal number.
    #[display("invalid amount")]
    Amount,

    /// [`Currency`] code is unknown.
    #[display("invalid currency")]
    Currency,
}

impl FromStr for Money {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let split = s
            .len()
            .checked_sub(3)
            .filter(|at| *at > 0 && s.is_char_boundary(*at))
            .ok_or(ParseError::TooShort)?;
        let (amount, currency) = s.split_at(split);

        Ok(Self {
            amount: amount.parse().map_err(|_| ParseError::Amount)?,
            currency: currency.parse().map_err(|_| ParseError::Currency)?,
        })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "US Dollar."]
        Usd = 1,

        #[doc = "Euro."]
        Eur = 2,

        #[doc = "Russian Ruble."]
        Rub = 3,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in a `{amount}{currency}` format, where `amount` is a decimal
    /// number and `currency` is a three-letter currency code (`120.50EUR`,
    /// for example).
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            let s = input.as_string_value().ok_or_else(|| {
                format!(
                    "Cannot parse `Money` input scalar from non-string value: \
                     {input}",
                )
            })?;
            s.parse()
                .map_err(|e| format!("Cannot parse `Money` input scalar: {e}"))
        }
    }
}

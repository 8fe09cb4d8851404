//! [`Room`] definitions.

use std::sync::LazyLock;

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, unit, DateTimeOf, Money};
use derive_more::{AsRef, Display, From, FromStr, Into};
#[cfg(feature = "postgres")]
use postgres_types::{FromSql, ToSql};
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use xxhash_rust::xxh3;

/// Bookable room.
#[derive(Clone, Debug)]
pub struct Room {
    /// ID of this [`Room`].
    pub id: Id,

    /// [`Hash`] of this [`Room`] used for deduplication.
    ///
    /// [`Hash`]: struct@Hash
    pub hash: Hash,

    /// [`Name`] of this [`Room`].
    pub name: Name,

    /// [`Number`] of this [`Room`].
    pub number: Number,

    /// [`DayPrice`] of this [`Room`].
    pub day_price: DayPrice,

    /// [`BedType`] of this [`Room`].
    pub bed_type: BedType,

    /// [`Capacity`] of this [`Room`], derived from its [`BedType`].
    ///
    /// Must be recomputed with [`BedType::capacity()`] whenever the
    /// [`BedType`] changes.
    pub capacity: Capacity,

    /// [`Rating`] of this [`Room`].
    pub rating: Rating,

    /// Indicator whether reservations of this [`Room`] may be cancelled.
    pub refundable: bool,

    /// Indicator whether this [`Room`] accepts new reservations.
    pub active: bool,

    /// [`DateTime`] when this [`Room`] was created.
    pub created_at: CreationDateTime,

    /// [`DateTime`] when this [`Room`] was last modified.
    pub updated_at: ModificationDateTime,
}

impl Room {
    /// Sets the [`BedType`] of this [`Room`] along with the derived
    /// [`Capacity`].
    pub fn set_bed_type(&mut self, bed_type: BedType) {
        self.bed_type = bed_type;
        self.capacity = bed_type.capacity();
    }
}

/// ID of a [`Room`].
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
    Ord,
    PartialEq,
    PartialOrd,
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

/// Hash of a [`Room`] identifying its [`Name`] and [`Number`] pair.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(ToSql, FromSql), postgres(transparent))]
pub struct Hash(Uuid);

impl Hash {
    /// Calculates a new [`Hash`] of a [`Room`].
    ///
    /// [`Hash`]: struct@Hash
    #[must_use]
    pub fn new(name: &Name, number: &Number) -> Self {
        use std::hash::Hash as _;

        // WARNING: Changing the order of the hashed fields changes hashes of
        //          all the existing rooms.
        let mut hasher = xxh3::Xxh3Builder::new().build();
        name.hash(&mut hasher);
        number.hash(&mut hasher);

        Self(Uuid::from_u128(hasher.digest128()))
    }
}

/// Display name of a [`Room`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `name` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name
            && !name.is_empty()
            && name.chars().count() <= 256
    }
}

impl FromStr for Name {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Name`")
    }
}

/// Unit number of a [`Room`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
#[as_ref(forward)]
pub struct Number(String);

impl Number {
    /// Creates a new [`Number`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `number` matches the format.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub unsafe fn new_unchecked(number: impl Into<String>) -> Self {
        Self(number.into())
    }

    /// Creates a new [`Number`] if the given `number` is valid.
    #[must_use]
    pub fn new(number: impl Into<String>) -> Option<Self> {
        let number = number.into();
        Self::check(&number).then_some(Self(number))
    }

    /// Checks whether the given `number` is a valid [`Number`].
    fn check(number: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Number`] format: up to 20 letters,
        /// digits or dashes.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(r"^[\p{L}\p{N}-]{1,20}$").expect("valid regex")
        });

        REGEX.is_match(number.as_ref())
    }
}

impl FromStr for Number {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or("invalid `Number`")
    }
}

/// Price of a single day in a [`Room`].
#[derive(Clone, Copy, Debug, Display, Eq, Hash, Into, PartialEq)]
pub struct DayPrice(Money);

impl DayPrice {
    /// Creates a new [`DayPrice`].
    ///
    /// # Safety
    ///
    /// The caller must ensure that the given `price` is not negative.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(price: Money) -> Self {
        Self(price)
    }

    /// Creates a new [`DayPrice`] if the given `price` is not negative.
    #[must_use]
    pub fn new(price: Money) -> Option<Self> {
        (!price.is_negative()).then_some(Self(price))
    }

    /// Returns the [`Money`] of this [`DayPrice`].
    #[must_use]
    pub const fn money(&self) -> Money {
        self.0
    }
}

impl FromStr for DayPrice {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let price = s.parse().map_err(|_| "invalid `Money`")?;
        Self::new(price).ok_or("negative `DayPrice`")
    }
}

/// Quality rating of a [`Room`] within `0..=10`.
#[derive(Clone, Copy, Debug, Default, Display, Eq, Hash, Into, PartialEq)]
#[cfg_attr(feature = "postgres", derive(FromSql, ToSql), postgres(transparent))]
pub struct Rating(Decimal);

impl Rating {
    /// Maximum value of a [`Rating`].
    pub const MAX: Decimal = Decimal::TEN;

    /// Creates a new [`Rating`] if the given `rating` lies within
    /// `0..=`[`Rating::MAX`].
    #[must_use]
    pub fn new(rating: Decimal) -> Option<Self> {
        (Decimal::ZERO..=Self::MAX)
            .contains(&rating)
            .then_some(Self(rating))
    }
}

impl FromStr for Rating {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rating = s.parse().map_err(|_| "invalid `Decimal`")?;
        Self::new(rating).ok_or("`Rating` out of `0..=10` range")
    }
}

/// Number of guests a [`Room`] accommodates.
pub type Capacity = u8;

define_kind! {
    #[doc = "Type of beds in a [`Room`]."]
    enum BedType {
        #[doc = "A single bed."]
        Twin = 1,

        #[doc = "A double bed."]
        Double = 2,

        #[doc = "A bunk of two single beds."]
        TwinBunk = 3,

        #[doc = "A bunk of two double beds."]
        DoubleTwinBunk = 4,
    }
}

impl BedType {
    /// Returns the [`Capacity`] this [`BedType`] provides.
    #[must_use]
    pub const fn capacity(self) -> Capacity {
        match self {
            Self::Twin => 1,
            Self::Double | Self::TwinBunk => 2,
            Self::DoubleTwinBunk => 4,
        }
    }
}

impl Default for BedType {
    fn default() -> Self {
        Self::Twin
    }
}

/// [`DateTime`] when a [`Room`] was created.
pub type CreationDateTime = DateTimeOf<(Room, unit::Creation)>;

/// [`DateTime`] when a [`Room`] was last modified.
pub type ModificationDateTime = DateTimeOf<(Room, unit::Modification)>;

#[cfg(test)]
mod spec {
    use common::{money::Currency, Money};
    use rust_decimal::Decimal;

    use super::{BedType, DayPrice, Hash, Name, Number, Rating};

    #[test]
    fn derives_capacity_from_bed_type() {
        let table = BedType::ALL
            .iter()
            .map(|b| (*b, b.capacity()))
            .collect::<Vec<_>>();

        assert_eq!(
            table,
            [
                (BedType::Twin, 1),
                (BedType::Double, 2),
                (BedType::TwinBunk, 2),
                (BedType::DoubleTwinBunk, 4),
            ],
        );
    }

    #[test]
    fn formats_bed_type() {
        assert_eq!(BedType::DoubleTwinBunk.to_string(), "DOUBLE_TWIN_BUNK");
        assert_eq!("TWIN_BUNK".parse::<BedType>().unwrap(), BedType::TwinBunk);
        assert_eq!(BedType::default(), BedType::Twin);
    }

    #[test]
    fn validates_number() {
        assert!(Number::new("101").is_some());
        assert!(Number::new("B-12a").is_some());
        assert!(Number::new("1".repeat(20)).is_some());

        assert!(Number::new("").is_none());
        assert!(Number::new("1".repeat(21)).is_none());
        assert!(Number::new("10 1").is_none());
        assert!(Number::new("#101").is_none());
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("Sea View").is_some());
        assert!(Name::new("ы".repeat(256)).is_some());

        assert!(Name::new("").is_none());
        assert!(Name::new(" Sea View").is_none());
        assert!(Name::new("x".repeat(257)).is_none());
    }

    #[test]
    fn bounds_rating() {
        assert!(Rating::new(Decimal::ZERO).is_some());
        assert!(Rating::new(Decimal::TEN).is_some());
        assert!(Rating::new("7.5".parse().unwrap()).is_some());

        assert!(Rating::new("-0.1".parse().unwrap()).is_none());
        assert!(Rating::new("10.01".parse().unwrap()).is_none());
    }

    #[test]
    fn rejects_negative_day_price() {
        let price = |amount: &str| Money {
            amount: amount.parse().unwrap(),
            currency: Currency::Eur,
        };

        assert!(DayPrice::new(price("0")).is_some());
        assert!(DayPrice::new(price("99.90")).is_some());
        assert!(DayPrice::new(price("-1")).is_none());
        assert!("-5EUR".parse::<DayPrice>().is_err());
    }

    #[test]
    fn hashes_name_and_number_pair() {
        let name = |s: &str| Name::new(s).unwrap();
        let number = |s: &str| Number::new(s).unwrap();

        assert_eq!(
            Hash::new(&name("Sea View"), &number("101")),
            Hash::new(&name("Sea View"), &number("101")),
        );
        assert_ne!(
            Hash::new(&name("Sea View"), &number("101")),
            Hash::new(&name("Sea View"), &number("102")),
        );
        assert_ne!(
            Hash::new(&name("Sea View"), &number("101")),
            Hash::new(&name("Garden"), &number("101")),
        );
    }
}

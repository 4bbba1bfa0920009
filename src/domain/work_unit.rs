//! Remediation cost values.
//!
//! A [`WorkUnit`] pairs a non-negative decimal value with a [`TimeUnit`].
//! Values are stored as fixed-point thousandths, so conversions between the
//! supported units (integral multiples of each other) are exact.

use std::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    num::NonZeroU64,
    str::FromStr,
};

use serde::Serialize;

/// Unit used when a document leaves a cost unit unspecified.
///
/// This is also the unit of the zero offset given to requirements that
/// declare no offset.
pub const DEFAULT_UNIT: TimeUnit = TimeUnit::Hours;

/// Fixed-point scale: values are kept to three decimal places.
const SCALE: u64 = 1000;

const FRACTION_DIGITS: usize = 3;

const MINUTES_IN_HOUR: u64 = 60;

/// A unit of remediation time.
///
/// Variants are ordered from the finest to the coarsest unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    /// Minutes (`mn`).
    Minutes,
    /// Hours (`h`).
    Hours,
    /// Days (`d`).
    Days,
}

impl TimeUnit {
    /// The short symbol used when displaying a cost, e.g. `h` in `3.2h`.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Minutes => "mn",
            Self::Hours => "h",
            Self::Days => "d",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Error returned when a unit token is not one of the known time units.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unknown time unit '{0}': expected one of d, h, mn")]
pub struct UnknownUnitError(String);

impl FromStr for TimeUnit {
    type Err = UnknownUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mn" | "min" | "mins" | "minute" | "minutes" => Ok(Self::Minutes),
            "h" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            _ => Err(UnknownUnitError(s.to_string())),
        }
    }
}

/// Conversion ratios between time units.
///
/// An hour is always sixty minutes; the length of a working day is
/// configurable. [`UnitRatios::STANDARD`] (eight-hour days) is the ratio
/// used by [`WorkUnit`] equality and ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitRatios {
    hours_in_day: NonZeroU64,
}

impl UnitRatios {
    /// Eight-hour working days.
    pub const STANDARD: Self = Self {
        hours_in_day: NonZeroU64::new(8).unwrap(),
    };

    /// Ratios for a working day of the given number of hours.
    #[must_use]
    pub const fn new(hours_in_day: NonZeroU64) -> Self {
        Self { hours_in_day }
    }

    /// The number of hours in a working day.
    #[must_use]
    pub const fn hours_in_day(self) -> u64 {
        self.hours_in_day.get()
    }

    pub(crate) const fn hours_in_day_nonzero(self) -> NonZeroU64 {
        self.hours_in_day
    }

    /// The number of minutes in one `unit`.
    #[must_use]
    pub const fn minutes_in(self, unit: TimeUnit) -> u64 {
        match unit {
            TimeUnit::Minutes => 1,
            TimeUnit::Hours => MINUTES_IN_HOUR,
            TimeUnit::Days => MINUTES_IN_HOUR * self.hours_in_day.get(),
        }
    }
}

impl Default for UnitRatios {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Errors raised when a cost value cannot be read.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseWorkUnitError {
    /// The text is not a decimal number.
    #[error("'{0}' is not a numeric value")]
    NotNumeric(String),

    /// The text is a number below zero.
    #[error("'{0}' is negative")]
    Negative(String),

    /// The number needs more than three decimal places.
    #[error("'{0}' has more than three decimal places")]
    TooPrecise(String),

    /// The number is too large to represent.
    #[error("'{0}' is too large")]
    TooLarge(String),
}

/// A remediation cost: a non-negative value expressed in a [`TimeUnit`].
///
/// Two work units are equal when they represent the same number of minutes,
/// so `1d == 8h`. Comparisons use [`UnitRatios::STANDARD`].
#[derive(Debug, Clone, Copy)]
pub struct WorkUnit {
    /// The value in thousandths of `unit`.
    millis: u64,
    unit: TimeUnit,
}

impl WorkUnit {
    /// A zero cost expressed in `unit`.
    #[must_use]
    pub const fn zero(unit: TimeUnit) -> Self {
        Self { millis: 0, unit }
    }

    /// A whole number of `unit`s.
    ///
    /// Returns `None` if the value cannot be represented.
    #[must_use]
    pub const fn whole(value: u64, unit: TimeUnit) -> Option<Self> {
        match value.checked_mul(SCALE) {
            Some(millis) => Some(Self { millis, unit }),
            None => None,
        }
    }

    /// Parses a decimal value such as `3.2`, ` 0.25 ` or `1.5e2` into a cost
    /// in `unit`.
    ///
    /// At most three decimal places are representable. Trailing zeros beyond
    /// that are fine (`1.2000`), other digits are refused rather than
    /// rounded.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not a decimal number, is negative,
    /// needs more than three decimal places, or is too large to represent.
    pub fn parse(value: &str, unit: TimeUnit) -> Result<Self, ParseWorkUnitError> {
        let trimmed = value.trim();
        let (negative, magnitude) = match trimmed.strip_prefix('-') {
            Some(magnitude) => (true, magnitude),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        match (negative, parse_millis(magnitude)) {
            (_, Err(Malformed::NotNumeric)) => {
                Err(ParseWorkUnitError::NotNumeric(value.to_string()))
            }
            (false, Ok(millis)) | (true, Ok(millis @ 0)) => Ok(Self { millis, unit }),
            (true, _) => Err(ParseWorkUnitError::Negative(value.to_string())),
            (false, Err(Malformed::TooPrecise)) => {
                Err(ParseWorkUnitError::TooPrecise(value.to_string()))
            }
            (false, Err(Malformed::TooLarge)) => {
                Err(ParseWorkUnitError::TooLarge(value.to_string()))
            }
        }
    }

    /// The unit the value is expressed in.
    #[must_use]
    pub const fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// The value, as a floating point number.
    ///
    /// This is for display only; comparisons never go through floats.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn value(&self) -> f64 {
        self.millis as f64 / SCALE as f64
    }

    /// Whether this is a zero cost.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.millis == 0
    }

    /// The cost in minutes, using the given conversion ratios.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn minutes_with(&self, ratios: UnitRatios) -> f64 {
        self.scaled_minutes(ratios) as f64 / SCALE as f64
    }

    /// The cost in minutes, using [`UnitRatios::STANDARD`].
    #[must_use]
    pub fn minutes(&self) -> f64 {
        self.minutes_with(UnitRatios::STANDARD)
    }

    /// Expresses this cost in another unit.
    ///
    /// Returns `None` when the conversion is not exact at three decimal
    /// places (e.g. one minute in days), or would overflow.
    #[must_use]
    pub fn converted_to(&self, unit: TimeUnit, ratios: UnitRatios) -> Option<Self> {
        let scaled = self.scaled_minutes(ratios);
        let per_unit = u128::from(ratios.minutes_in(unit));
        if scaled % per_unit != 0 {
            return None;
        }
        let millis = u64::try_from(scaled / per_unit).ok()?;
        Some(Self { millis, unit })
    }

    /// Adds two costs exactly.
    ///
    /// The result is expressed in the finer of the two units. Returns `None`
    /// on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        let unit = self.unit.min(other.unit);
        let lhs = self.converted_to(unit, UnitRatios::STANDARD)?;
        let rhs = other.converted_to(unit, UnitRatios::STANDARD)?;
        Some(Self {
            millis: lhs.millis.checked_add(rhs.millis)?,
            unit,
        })
    }

    /// Subtracts `other` from this cost exactly.
    ///
    /// The result is expressed in the finer of the two units. Returns `None`
    /// if the result would be negative.
    #[must_use]
    pub fn checked_sub(self, other: Self) -> Option<Self> {
        let unit = self.unit.min(other.unit);
        let lhs = self.converted_to(unit, UnitRatios::STANDARD)?;
        let rhs = other.converted_to(unit, UnitRatios::STANDARD)?;
        Some(Self {
            millis: lhs.millis.checked_sub(rhs.millis)?,
            unit,
        })
    }

    /// Thousandths of a minute.
    pub(crate) fn scaled_minutes(&self, ratios: UnitRatios) -> u128 {
        u128::from(self.millis) * u128::from(ratios.minutes_in(self.unit))
    }
}

/// Why unsigned decimal text could not be read as thousandths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Malformed {
    NotNumeric,
    TooPrecise,
    TooLarge,
}

/// Parses unsigned decimal text, optionally with an exponent, into
/// thousandths.
fn parse_millis(text: &str) -> Result<u64, Malformed> {
    let (mantissa, exponent) = match text.split_once(['e', 'E']) {
        Some((mantissa, exponent)) => (mantissa, parse_exponent(exponent)?),
        None => (text, 0),
    };
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return Err(Malformed::NotNumeric);
    }
    if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
        return Err(Malformed::NotNumeric);
    }

    // value = significand * 10^power / SCALE
    let digits = format!("{whole}{fraction}");
    let digits = digits.trim_start_matches('0');
    let significand = digits.trim_end_matches('0');
    if significand.is_empty() {
        return Ok(0);
    }
    let count = |n: usize| i64::try_from(n).unwrap_or(i64::MAX);
    let power = exponent
        .saturating_add(count(FRACTION_DIGITS + digits.len() - significand.len()))
        .saturating_sub(count(fraction.len()));
    if power < 0 {
        return Err(Malformed::TooPrecise);
    }

    let significand = significand
        .parse::<u64>()
        .map_err(|_| Malformed::TooLarge)?;
    u32::try_from(power)
        .ok()
        .and_then(|power| 10_u64.checked_pow(power))
        .and_then(|scale| significand.checked_mul(scale))
        .ok_or(Malformed::TooLarge)
}

/// Parses the signed exponent following an `e`, clamped well outside the
/// representable range.
fn parse_exponent(text: &str) -> Result<i64, Malformed> {
    const LIMIT: i64 = 1_000;

    let (negative, digits) = match text.strip_prefix('-') {
        Some(digits) => (true, digits),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(Malformed::NotNumeric);
    }
    let magnitude = digits.parse::<i64>().map_or(LIMIT, |value| value.min(LIMIT));
    Ok(if negative { -magnitude } else { magnitude })
}

impl PartialEq for WorkUnit {
    fn eq(&self, other: &Self) -> bool {
        self.scaled_minutes(UnitRatios::STANDARD) == other.scaled_minutes(UnitRatios::STANDARD)
    }
}

impl Eq for WorkUnit {}

impl PartialOrd for WorkUnit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for WorkUnit {
    fn cmp(&self, other: &Self) -> Ordering {
        self.scaled_minutes(UnitRatios::STANDARD)
            .cmp(&other.scaled_minutes(UnitRatios::STANDARD))
    }
}

impl Hash for WorkUnit {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scaled_minutes(UnitRatios::STANDARD).hash(state);
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let whole = self.millis / SCALE;
        let fraction = self.millis % SCALE;
        if fraction == 0 {
            write!(f, "{whole}{}", self.unit)
        } else {
            let fraction = format!("{fraction:03}");
            write!(f, "{whole}.{}{}", fraction.trim_end_matches('0'), self.unit)
        }
    }
}

impl Serialize for WorkUnit {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    fn hours(value: &str) -> WorkUnit {
        WorkUnit::parse(value, TimeUnit::Hours).unwrap()
    }

    #[test]
    fn one_day_is_eight_hours() {
        assert_eq!(
            WorkUnit::whole(1, TimeUnit::Days),
            WorkUnit::whole(8, TimeUnit::Hours)
        );
        assert_eq!(
            WorkUnit::whole(1, TimeUnit::Hours),
            WorkUnit::whole(60, TimeUnit::Minutes)
        );
    }

    #[test]
    fn zero_is_zero_in_any_unit() {
        assert_eq!(WorkUnit::zero(TimeUnit::Days), WorkUnit::zero(TimeUnit::Minutes));
        assert_eq!(WorkUnit::zero(TimeUnit::Hours), hours("0.0"));
    }

    #[test]
    fn different_costs_are_not_equal() {
        assert_ne!(hours("3.2"), hours("3.25"));
        assert!(hours("3.2") < WorkUnit::whole(1, TimeUnit::Days).unwrap());
    }

    #[test_case("3.2", 3200; "decimal")]
    #[test_case("  7 ", 7000; "surrounding whitespace")]
    #[test_case("0.5", 500; "leading zero")]
    #[test_case(".5", 500; "no whole part")]
    #[test_case("2.", 2000; "no fraction")]
    #[test_case("+4", 4000; "explicit sign")]
    #[test_case("1.2000", 1200; "trailing zeros")]
    #[test_case("0.001", 1; "smallest step")]
    #[test_case("1e3", 1_000_000; "exponent")]
    #[test_case("1000.0", 1_000_000; "exponent written out")]
    #[test_case("2.5E+2", 250_000; "signed exponent")]
    #[test_case("15e-1", 1500; "negative exponent")]
    #[test_case("0e99999", 0; "huge exponent on zero")]
    #[test_case("-0", 0; "negative zero")]
    fn parses_decimal_text(text: &str, millis: u64) {
        let unit = WorkUnit::parse(text, TimeUnit::Hours).unwrap();
        assert_eq!(unit.millis, millis);
        assert_eq!(unit.unit(), TimeUnit::Hours);
    }

    #[test_case("abc"; "letters")]
    #[test_case(""; "empty")]
    #[test_case("."; "lone point")]
    #[test_case("1.2.3"; "two points")]
    #[test_case("1e"; "missing exponent")]
    #[test_case("e3"; "missing mantissa")]
    #[test_case("1e3.5"; "fractional exponent")]
    #[test_case("NaN"; "not a number")]
    #[test_case(".inf"; "infinity")]
    fn rejects_non_numeric_text(text: &str) {
        assert_eq!(
            WorkUnit::parse(text, TimeUnit::Hours),
            Err(ParseWorkUnitError::NotNumeric(text.to_string()))
        );
    }

    #[test_case("-1.5"; "decimal")]
    #[test_case("-1e30"; "too large as well")]
    #[test_case("-0.0004"; "too precise as well")]
    fn rejects_negative_values(text: &str) {
        assert_eq!(
            WorkUnit::parse(text, TimeUnit::Days),
            Err(ParseWorkUnitError::Negative(text.to_string()))
        );
    }

    #[test_case("0.0004"; "below the smallest step")]
    #[test_case("1.0005"; "fourth decimal place")]
    #[test_case("1e-4"; "negative exponent")]
    #[test_case("0.00010"; "trailing zero does not help")]
    fn refuses_to_round(text: &str) {
        assert_eq!(
            WorkUnit::parse(text, TimeUnit::Hours),
            Err(ParseWorkUnitError::TooPrecise(text.to_string()))
        );
    }

    #[test_case("99999999999999999999"; "many digits")]
    #[test_case("1e20"; "exponent")]
    #[test_case("1e99999"; "huge exponent")]
    fn rejects_values_too_large_to_represent(text: &str) {
        assert_eq!(
            WorkUnit::parse(text, TimeUnit::Hours),
            Err(ParseWorkUnitError::TooLarge(text.to_string()))
        );
    }

    #[test_case("d", TimeUnit::Days)]
    #[test_case("days", TimeUnit::Days)]
    #[test_case("H", TimeUnit::Hours)]
    #[test_case(" hours ", TimeUnit::Hours)]
    #[test_case("mn", TimeUnit::Minutes)]
    #[test_case("min", TimeUnit::Minutes)]
    fn parses_unit_tokens(token: &str, expected: TimeUnit) {
        assert_eq!(token.parse::<TimeUnit>(), Ok(expected));
    }

    #[test]
    fn unknown_unit_token() {
        let error = "weeks".parse::<TimeUnit>().unwrap_err();
        assert_eq!(
            error.to_string(),
            "Unknown time unit 'weeks': expected one of d, h, mn"
        );
    }

    #[test]
    fn conversion_is_exact() {
        let day = WorkUnit::whole(1, TimeUnit::Days).unwrap();
        let minutes = day
            .converted_to(TimeUnit::Minutes, UnitRatios::STANDARD)
            .unwrap();
        assert_eq!(minutes.millis, 480_000);
        assert_eq!(minutes.unit(), TimeUnit::Minutes);

        let half_hour = WorkUnit::whole(30, TimeUnit::Minutes).unwrap();
        let as_hours = half_hour
            .converted_to(TimeUnit::Hours, UnitRatios::STANDARD)
            .unwrap();
        assert_eq!(as_hours.to_string(), "0.5h");
    }

    #[test]
    fn inexact_conversion_is_refused() {
        let minute = WorkUnit::whole(1, TimeUnit::Minutes).unwrap();
        assert!(minute
            .converted_to(TimeUnit::Days, UnitRatios::STANDARD)
            .is_none());
    }

    #[test]
    fn configurable_day_length() {
        let ratios = UnitRatios::new(NonZeroU64::new(7).unwrap());
        let day = WorkUnit::whole(1, TimeUnit::Days).unwrap();
        assert!((day.minutes_with(ratios) - 420.0).abs() < f64::EPSILON);
        assert!((day.minutes() - 480.0).abs() < f64::EPSILON);
    }

    #[test]
    fn addition_uses_the_finer_unit() {
        let sum = WorkUnit::whole(1, TimeUnit::Days)
            .unwrap()
            .checked_add(hours("0.5"))
            .unwrap();
        assert_eq!(sum.unit(), TimeUnit::Hours);
        assert_eq!(sum.to_string(), "8.5h");
    }

    #[test]
    fn subtraction_never_goes_negative() {
        let small = hours("1");
        let large = WorkUnit::whole(1, TimeUnit::Days).unwrap();
        assert_eq!(large.checked_sub(small), Some(hours("7")));
        assert_eq!(small.checked_sub(large), None);
    }

    #[test_case("3.2", TimeUnit::Hours, "3.2h")]
    #[test_case("1", TimeUnit::Days, "1d")]
    #[test_case("30", TimeUnit::Minutes, "30mn")]
    #[test_case("0.125", TimeUnit::Days, "0.125d")]
    fn display(text: &str, unit: TimeUnit, expected: &str) {
        assert_eq!(WorkUnit::parse(text, unit).unwrap().to_string(), expected);
    }

    #[test]
    fn equal_costs_hash_equally() {
        use std::collections::HashSet;

        let set: HashSet<WorkUnit> = [
            WorkUnit::whole(1, TimeUnit::Days).unwrap(),
            WorkUnit::whole(8, TimeUnit::Hours).unwrap(),
            WorkUnit::whole(480, TimeUnit::Minutes).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 1);
    }
}

//! Signed timespans with the gateway's textual syntax.
//!
//! A timespan is written either as a bare number of microseconds (`"1500"`)
//! or as a number followed by a unit, separated by blanks (`"500 ms"`).
//! Supported units are `d`, `h`, `m`, `s`, `ms` and `us`. A unit glued to the
//! number (`"16s"`) is rejected.
//!
//! ```rust
//! use rebound_core::Timespan;
//! use std::time::Duration;
//!
//! let span: Timespan = "15 m".parse().unwrap();
//! assert_eq!(span.to_duration("max elapsed time").unwrap(), Duration::from_secs(900));
//! assert!(Timespan::try_parse("16s").is_none());
//! ```

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const MICROSECONDS: i64 = 1;
const MILLISECONDS: i64 = 1_000 * MICROSECONDS;
const SECONDS: i64 = 1_000 * MILLISECONDS;
const MINUTES: i64 = 60 * SECONDS;
const HOURS: i64 = 60 * MINUTES;
const DAYS: i64 = 24 * HOURS;

/// Units ordered from the largest, used for both parsing and display.
const UNITS: [(&str, i64); 6] = [
    ("d", DAYS),
    ("h", HOURS),
    ("m", MINUTES),
    ("s", SECONDS),
    ("ms", MILLISECONDS),
    ("us", MICROSECONDS),
];

/// A signed span of time with microsecond resolution.
///
/// Configuration values are parsed into a `Timespan` first so that negative
/// input can be reported with the name of the offending option instead of
/// failing inside the parser.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timespan(i64);

impl Timespan {
    /// The zero-length span.
    pub const ZERO: Timespan = Timespan(0);

    /// Create a timespan from a signed number of microseconds.
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros)
    }

    /// Create a timespan from a signed number of milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis.saturating_mul(MILLISECONDS))
    }

    /// The signed number of microseconds.
    pub const fn as_micros(self) -> i64 {
        self.0
    }

    /// Returns true for spans shorter than zero.
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Parse a timespan, returning `None` for malformed input.
    pub fn try_parse(input: &str) -> Option<Self> {
        Self::parse(input).ok()
    }

    /// Parse a timespan.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidTimespan`] when the input is not one or
    /// two blank-separated tokens, the number is not a decimal integer, the
    /// unit is unknown or the result overflows.
    pub fn parse(input: &str) -> Result<Self> {
        let tokens: Vec<&str> = input.split_whitespace().collect();

        let (number, multiplier) = match tokens.as_slice() {
            [number] => (*number, MICROSECONDS),
            [number, unit] => (*number, parse_unit(unit)?),
            _ => return Err(ConfigError::InvalidTimespan(input.to_string())),
        };

        let span: i64 = number
            .parse()
            .map_err(|_| ConfigError::InvalidTimespan(input.to_string()))?;

        span.checked_mul(multiplier)
            .map(Self)
            .ok_or_else(|| ConfigError::InvalidTimespan(input.to_string()))
    }

    /// Convert into a [`Duration`], rejecting negative spans.
    ///
    /// `field` names the option in the resulting error.
    pub fn to_duration(self, field: &'static str) -> Result<Duration> {
        u64::try_from(self.0)
            .map(Duration::from_micros)
            .map_err(|_| ConfigError::NegativeDuration {
                field,
                micros: self.0,
            })
    }
}

fn parse_unit(unit: &str) -> Result<i64> {
    UNITS
        .iter()
        .find(|(name, _)| *name == unit)
        .map(|(_, multiplier)| *multiplier)
        .ok_or_else(|| {
            let shown: String = unit.chars().take(5).collect();
            ConfigError::InvalidTimespan(format!("invalid timespan unit: {shown}"))
        })
}

impl From<Duration> for Timespan {
    fn from(duration: Duration) -> Self {
        Self(i64::try_from(duration.as_micros()).unwrap_or(i64::MAX))
    }
}

impl FromStr for Timespan {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Timespan {
    /// Formats with the largest unit that divides the span exactly.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "0 us");
        }

        let (unit, multiplier) = UNITS
            .iter()
            .find(|(_, multiplier)| self.0 % multiplier == 0)
            .copied()
            .unwrap_or(("us", MICROSECONDS));

        write!(f, "{} {}", self.0 / multiplier, unit)
    }
}

impl Serialize for Timespan {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timespan {
    /// Accepts the textual syntax or an integer number of microseconds.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Micros(i64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Micros(micros) => Ok(Self(micros)),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("441 d", 441 * DAYS)]
    #[case("15 h", 15 * HOURS)]
    #[case("90 m", 90 * MINUTES)]
    #[case("10 s", 10 * SECONDS)]
    #[case("4332 ms", 4332 * MILLISECONDS)]
    #[case("12190 us", 12190)]
    #[case("0", 0)]
    #[case("-56 d", -56 * DAYS)]
    #[case("-632 ms", -632 * MILLISECONDS)]
    #[case("-9", -9)]
    #[case("0015", 15)]
    #[case("  7 \t s ", 7 * SECONDS)]
    fn test_parse_valid(#[case] input: &str, #[case] micros: i64) {
        assert_eq!(Timespan::parse(input).unwrap().as_micros(), micros);
        assert_eq!(Timespan::try_parse(input), Some(Timespan::from_micros(micros)));
    }

    #[rstest]
    #[case("foeiere")]
    #[case("---")]
    #[case("0x10")]
    #[case("16d")]
    #[case("16h")]
    #[case("16m")]
    #[case("16s")]
    #[case("16ms")]
    #[case("16us")]
    #[case("")]
    #[case("1 s extra")]
    #[case("1 weeks")]
    fn test_parse_invalid(#[case] input: &str) {
        assert!(Timespan::try_parse(input).is_none());
        assert!(matches!(
            Timespan::parse(input),
            Err(ConfigError::InvalidTimespan(_))
        ));
    }

    #[test]
    fn test_unknown_unit_is_truncated_in_message() {
        let err = Timespan::parse("1 fortnights").unwrap_err();
        assert_eq!(err.to_string(), "invalid timespan: invalid timespan unit: fortn");
    }

    #[test]
    fn test_overflow_is_rejected() {
        assert!(Timespan::try_parse("9223372036854775807 d").is_none());
    }

    #[test]
    fn test_to_duration() {
        let span = Timespan::parse("500 ms").unwrap();
        assert_eq!(span.to_duration("interval").unwrap(), Duration::from_millis(500));

        let err = Timespan::parse("-1 s").unwrap().to_duration("interval").unwrap_err();
        assert_eq!(
            err,
            ConfigError::NegativeDuration {
                field: "interval",
                micros: -SECONDS,
            }
        );
    }

    #[test]
    fn test_display_picks_largest_exact_unit() {
        assert_eq!(Timespan::from_millis(500).to_string(), "500 ms");
        assert_eq!(Timespan::from_micros(MINUTES).to_string(), "1 m");
        assert_eq!(Timespan::from_micros(90 * SECONDS).to_string(), "90 s");
        assert_eq!(Timespan::from_micros(-1_500).to_string(), "-1500 us");
        assert_eq!(Timespan::ZERO.to_string(), "0 us");
    }

    #[test]
    fn test_deserialize_text_and_integer() {
        #[derive(Deserialize)]
        struct Holder {
            a: Timespan,
            b: Timespan,
        }

        let holder: Holder = toml::from_str("a = \"2 s\"\nb = 250").unwrap();
        assert_eq!(holder.a, Timespan::from_millis(2_000));
        assert_eq!(holder.b, Timespan::from_micros(250));

        let bad = serde_json::from_str::<Timespan>("\"2s\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_serialize_as_text() {
        let json = serde_json::to_string(&Timespan::from_millis(1_500)).unwrap();
        assert_eq!(json, "\"1500 ms\"");
    }
}

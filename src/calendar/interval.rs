use crate::core::{DeletionError, Result};
use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Signed calendar interval with month and day granularity.
///
/// Months are calendar months: adding one month to January 31st lands on the
/// last day of February, never on a fixed 30-day offset. Weeks are stored as
/// seven days and years as twelve months.
///
/// Accepts ISO-8601 date durations (`P3W`, `P1Y2M`, `-P1D`) and plain English
/// (`3 weeks`, `1 month 2 days`, `-1 week`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Interval {
    months: i32,
    days: i32,
}

impl Interval {
    pub const ZERO: Interval = Interval { months: 0, days: 0 };

    pub const fn days(days: i32) -> Self {
        Self { months: 0, days }
    }

    pub const fn weeks(weeks: i32) -> Self {
        Self {
            months: 0,
            days: weeks * 7,
        }
    }

    pub const fn months(months: i32) -> Self {
        Self { months, days: 0 }
    }

    pub const fn years(years: i32) -> Self {
        Self {
            months: years * 12,
            days: 0,
        }
    }

    pub fn month_component(&self) -> i32 {
        self.months
    }

    pub fn day_component(&self) -> i32 {
        self.days
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.days == 0
    }

    /// True when the interval moves strictly forward in time.
    pub fn is_positive(&self) -> bool {
        self.months >= 0 && self.days >= 0 && !self.is_zero()
    }

    pub fn negate(self) -> Self {
        Self {
            months: -self.months,
            days: -self.days,
        }
    }

    pub fn checked_add(self, other: Interval) -> Option<Interval> {
        Some(Self {
            months: self.months.checked_add(other.months)?,
            days: self.days.checked_add(other.days)?,
        })
    }

    /// Shift a wall-clock datetime: months first, then days.
    pub(crate) fn apply(self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        let shifted = if self.months >= 0 {
            at.checked_add_months(Months::new(self.months.unsigned_abs()))?
        } else {
            at.checked_sub_months(Months::new(self.months.unsigned_abs()))?
        };
        shifted.checked_add_signed(Duration::days(i64::from(self.days)))
    }

    fn parse_iso(raw: &str, body: &str, negative: bool) -> Result<Self> {
        let invalid = |reason: &str| DeletionError::InvalidInterval(raw.to_string(), reason.to_string());

        if body.is_empty() {
            return Err(invalid("duration has no components"));
        }

        let mut interval = Interval::ZERO;
        let mut number = String::new();
        for ch in body.chars() {
            match ch {
                '0'..='9' => number.push(ch),
                '-' if number.is_empty() => number.push(ch),
                'T' | 't' => return Err(invalid("time components are not supported")),
                unit => {
                    if number.is_empty() || number == "-" {
                        return Err(invalid("unit without a number"));
                    }
                    let value: i32 = number
                        .parse()
                        .map_err(|_| invalid("component does not fit in 32 bits"))?;
                    let component = Self::unit(unit.to_ascii_uppercase(), value)
                        .ok_or_else(|| invalid(&format!("unknown unit '{}'", unit)))?;
                    interval = interval
                        .checked_add(component)
                        .ok_or_else(|| invalid("overflow"))?;
                    number.clear();
                }
            }
        }

        if !number.is_empty() {
            return Err(invalid("trailing number without a unit"));
        }

        Ok(if negative { interval.negate() } else { interval })
    }

    fn parse_words(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| DeletionError::InvalidInterval(raw.to_string(), reason.to_string());

        let tokens: Vec<&str> = raw
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|token| !token.is_empty() && !token.eq_ignore_ascii_case("and"))
            .collect();

        if tokens.is_empty() || tokens.len() % 2 != 0 {
            return Err(invalid("expected '<number> <unit>' pairs"));
        }

        let mut interval = Interval::ZERO;
        for pair in tokens.chunks(2) {
            let value: i32 = pair[0]
                .parse()
                .map_err(|_| invalid(&format!("'{}' is not a number", pair[0])))?;
            let unit = match pair[1].to_ascii_lowercase().as_str() {
                "day" | "days" => 'D',
                "week" | "weeks" => 'W',
                "month" | "months" => 'M',
                "year" | "years" => 'Y',
                other => return Err(invalid(&format!("unknown unit '{}'", other))),
            };
            let component = Self::unit(unit, value).ok_or_else(|| invalid("overflow"))?;
            interval = interval
                .checked_add(component)
                .ok_or_else(|| invalid("overflow"))?;
        }

        Ok(interval)
    }

    fn unit(unit: char, value: i32) -> Option<Interval> {
        match unit {
            'D' => Some(Self::days(value)),
            'W' => value.checked_mul(7).map(Self::days),
            'M' => Some(Self::months(value)),
            'Y' => value.checked_mul(12).map(Self::months),
            _ => None,
        }
    }
}

impl FromStr for Interval {
    type Err = DeletionError;

    fn from_str(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let (negative, unsigned) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };

        match unsigned.strip_prefix(['P', 'p']) {
            Some(body) => Self::parse_iso(raw, body, negative),
            None => Self::parse_words(trimmed),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("P0D");
        }
        if self.months <= 0 && self.days <= 0 {
            return write!(f, "-{}", self.negate());
        }

        f.write_str("P")?;
        let (years, months) = (self.months / 12, self.months % 12);
        if years != 0 {
            write!(f, "{}Y", years)?;
        }
        if months != 0 {
            write!(f, "{}M", months)?;
        }
        if self.days != 0 {
            if self.days % 7 == 0 {
                write!(f, "{}W", self.days / 7)?;
            } else {
                write!(f, "{}D", self.days)?;
            }
        }
        Ok(())
    }
}

impl Serialize for Interval {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Interval {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

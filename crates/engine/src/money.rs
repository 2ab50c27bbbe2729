use std::{
    fmt,
    ops::{AddAssign, Sub},
    str::FromStr,
};

use serde_json::Value;

use crate::{EngineError, ResultEngine};

/// Money amount represented as **integer cents**.
///
/// Budgets, expense and receipt amounts all use this type, so sums never pick
/// up floating-point drift.
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount: MoneyCents = "12.34".parse().unwrap();
/// assert_eq!(amount.cents(), 1234);
/// assert_eq!(amount.to_string(), "12.34");
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// assert!("10,5".parse::<MoneyCents>().is_err());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Value in major units, for presentation only.
    #[must_use]
    pub fn as_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the amount if it is strictly positive.
    pub fn require_positive(self, label: &str) -> ResultEngine<Self> {
        if !self.is_positive() {
            return Err(EngineError::InvalidAmount(format!("{label} must be > 0")));
        }
        Ok(self)
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a plain decimal number (`12`, `12.5`, `-0.01`) into cents.
    ///
    /// Only `.` separates the fraction, which may have at most two digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EngineError::InvalidAmount(format!("not a number: {s:?}"));
        let overflow = || EngineError::InvalidAmount("amount too large".to_string());

        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidAmount("amount is required".to_string()));
        }
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let (units, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if units.is_empty() || !all_digits(units) || !all_digits(fraction) {
            return Err(invalid());
        }
        if fraction.len() > 2 {
            return Err(EngineError::InvalidAmount(format!(
                "at most two decimals allowed: {trimmed}"
            )));
        }

        let units: i64 = units.parse().map_err(|_| overflow())?;
        let fraction: i64 = format!("{fraction:0<2}").parse().map_err(|_| invalid())?;
        let cents = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(fraction))
            .ok_or_else(overflow)?;
        Ok(MoneyCents(if negative { -cents } else { cents }))
    }
}

impl TryFrom<&Value> for MoneyCents {
    type Error = EngineError;

    /// Reads an amount from a JSON payload field.
    ///
    /// Numbers are taken in major units (`12.5` is 1250 cents). Numeric
    /// strings are accepted with the same rules as [`FromStr`].
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Number(number) => number.to_string().parse(),
            Value::String(raw) => raw.parse(),
            Value::Null => Err(EngineError::InvalidAmount("amount is required".to_string())),
            _ => Err(EngineError::InvalidAmount(
                "amount must be a number".to_string(),
            )),
        }
    }
}

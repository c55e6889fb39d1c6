// Domain type definitions for the discount engine
// Shared enums and value types used by the matcher, eligibility evaluator,
// and adjustment calculator

use chrono::{DateTime, Datelike, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sign of an adjustment rule
///
/// Discounts subtract from the cart, surcharges add to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentMode {
    Discount,
    Surcharge,
}

impl AdjustmentMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentMode::Discount => "discount",
            AdjustmentMode::Surcharge => "surcharge",
        }
    }
}

impl fmt::Display for AdjustmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How an adjustment value is interpreted
///
/// Percent values are a percentage of the targeted item's subtotal;
/// amount values are a fixed currency amount per targeted item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdjustmentKind {
    Percent,
    Amount,
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdjustmentKind::Percent => write!(f, "percent"),
            AdjustmentKind::Amount => write!(f, "amount"),
        }
    }
}

/// Recurring calendar period for frequency limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FrequencyPeriod {
    Day,
    Week,
    Month,
    Year,
}

impl FrequencyPeriod {
    pub fn as_str(&self) -> &'static str {
        match self {
            FrequencyPeriod::Day => "day",
            FrequencyPeriod::Week => "week",
            FrequencyPeriod::Month => "month",
            FrequencyPeriod::Year => "year",
        }
    }

    /// Start of the calendar bucket containing `now`
    ///
    /// Buckets are calendar-aligned, not sliding windows: "day" is the
    /// calendar day containing `now`, "week" starts on Monday (ISO),
    /// "month" on the 1st, "year" on January 1st. Usage counts reset at
    /// the bucket boundary.
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let date = now.date_naive();
        let start = match self {
            FrequencyPeriod::Day => date,
            FrequencyPeriod::Week => {
                date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
            }
            FrequencyPeriod::Month => date.with_day(1).unwrap_or(date),
            FrequencyPeriod::Year => date.with_ordinal(1).unwrap_or(date),
        };
        start.and_time(NaiveTime::MIN).and_utc()
    }
}

impl fmt::Display for FrequencyPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FrequencyPeriod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(FrequencyPeriod::Day),
            "week" => Ok(FrequencyPeriod::Week),
            "month" => Ok(FrequencyPeriod::Month),
            "year" => Ok(FrequencyPeriod::Year),
            _ => Err(format!("Invalid frequency period: {}", s)),
        }
    }
}

/// Weekday availability map for a discount rule
///
/// A rule is only usable on days that are enabled. Missing fields
/// deserialize as enabled, so an empty JSON object means "every day".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaysOfWeek {
    #[serde(default = "enabled")]
    pub monday: bool,
    #[serde(default = "enabled")]
    pub tuesday: bool,
    #[serde(default = "enabled")]
    pub wednesday: bool,
    #[serde(default = "enabled")]
    pub thursday: bool,
    #[serde(default = "enabled")]
    pub friday: bool,
    #[serde(default = "enabled")]
    pub saturday: bool,
    #[serde(default = "enabled")]
    pub sunday: bool,
}

fn enabled() -> bool {
    true
}

impl DaysOfWeek {
    /// Every day enabled
    pub fn all() -> Self {
        Self {
            monday: true,
            tuesday: true,
            wednesday: true,
            thursday: true,
            friday: true,
            saturday: true,
            sunday: true,
        }
    }

    /// Whether the rule is usable on the given weekday
    pub fn allows(&self, weekday: Weekday) -> bool {
        match weekday {
            Weekday::Mon => self.monday,
            Weekday::Tue => self.tuesday,
            Weekday::Wed => self.wednesday,
            Weekday::Thu => self.thursday,
            Weekday::Fri => self.friday,
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
        }
    }

    /// Whether at least one day is enabled
    pub fn any_enabled(&self) -> bool {
        self.monday
            || self.tuesday
            || self.wednesday
            || self.thursday
            || self.friday
            || self.saturday
            || self.sunday
    }
}

impl Default for DaysOfWeek {
    fn default() -> Self {
        Self::all()
    }
}

/// Why a discount cannot currently be used
///
/// These are expected, user-facing outcomes: the checkout flow renders the
/// message and proceeds without the discount. The variant order mirrors
/// the order the eligibility evaluator performs its checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ineligibility {
    Archived,
    RequiresCustomer,
    NotYetActive,
    Expired,
    NotAvailableToday,
    RequiredItemsMissing,
    AlreadyUsed,
    UsageLimitReached,
    FrequencyLimitReached {
        count: i32,
        period: FrequencyPeriod,
    },
}

impl fmt::Display for Ineligibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ineligibility::Archived => write!(f, "discount is archived"),
            Ineligibility::RequiresCustomer => write!(f, "discount requires a customer"),
            Ineligibility::NotYetActive => write!(f, "discount is not yet active"),
            Ineligibility::Expired => write!(f, "discount has expired"),
            Ineligibility::NotAvailableToday => write!(f, "discount is not available today"),
            Ineligibility::RequiredItemsMissing => write!(f, "required items are not in the cart"),
            Ineligibility::AlreadyUsed => write!(f, "discount already used"),
            Ineligibility::UsageLimitReached => write!(f, "maximum usage limit reached"),
            Ineligibility::FrequencyLimitReached { count, period } => {
                write!(f, "discount used the maximum {} time(s) per {}", count, period)
            }
        }
    }
}

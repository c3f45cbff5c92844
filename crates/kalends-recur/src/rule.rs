//! Normalized recurrence rule model.
//!
//! A rule describes a repeating pattern (frequency, interval, day selectors)
//! plus exactly one terminator. Unterminated rules may exist transiently in
//! drafts but are rejected by [`RecurrenceRule::validate`] before anything is
//! persisted.

use chrono::{DateTime, Utc, Weekday};
use kalends_core::constants::{ERR_RULE_INVALID, ERR_RULE_UNBOUNDED};
use kalends_core::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// How often the series repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Bitmask of weekdays, bit 0 = Monday.
///
/// Iteration order is always ascending Monday..Sunday, which fixes the
/// emission order of weekly occurrences inside one week block.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[must_use]
    pub fn from_days(days: &[Weekday]) -> Self {
        let mut set = Self::empty();
        for day in days {
            set.insert(*day);
        }
        set
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[must_use]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    /// Weekdays in this set, ascending Monday..Sunday.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEKDAYS.into_iter().filter(move |day| self.contains(*day))
    }
}

/// Which occurrence of a weekday within a month an nth-weekday pattern picks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

impl Ordinal {
    /// Zero-based index from the start of the month, `None` for `Last`.
    #[must_use]
    pub const fn index(self) -> Option<u32> {
        match self {
            Self::First => Some(0),
            Self::Second => Some(1),
            Self::Third => Some(2),
            Self::Fourth => Some(3),
            Self::Fifth => Some(4),
            Self::Last => None,
        }
    }
}

/// Day selector for monthly rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthlyPattern {
    /// A fixed calendar day. Months lacking that day are skipped, not
    /// clamped (day 31 never fires in February).
    DayOfMonth { day: u32 },
    /// The nth weekday of the month, e.g. second Tuesday or last Friday.
    NthWeekday { ordinal: Ordinal, day: Weekday },
}

/// Terminator of a bounded series: an inclusive end instant or a total
/// occurrence count. Exactly one is required on a persisted rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terminator {
    /// Inclusive end instant. Compared against the occurrence start in the
    /// series' declared timezone, not raw UTC.
    Until(DateTime<Utc>),
    /// Total number of occurrences in the series.
    Count(u32),
}

/// Normalized description of a repeating pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceRule {
    pub frequency: Frequency,
    /// Step between recurrence blocks (days, weeks, months or years
    /// depending on frequency). Must be >= 1.
    pub interval: u32,
    /// Weekday selection for weekly rules.
    pub days_of_week: WeekdaySet,
    /// Day selector for monthly rules.
    pub monthly: Option<MonthlyPattern>,
    /// Month (1..=12) for yearly rules.
    pub month: Option<u32>,
    /// Day in month (1..=31) for yearly rules.
    pub day_in_month: Option<u32>,
    /// `None` only transiently in drafts; required before persistence.
    pub terminator: Option<Terminator>,
}

impl RecurrenceRule {
    #[must_use]
    pub fn daily(interval: u32, terminator: Terminator) -> Self {
        Self {
            frequency: Frequency::Daily,
            interval,
            days_of_week: WeekdaySet::empty(),
            monthly: None,
            month: None,
            day_in_month: None,
            terminator: Some(terminator),
        }
    }

    #[must_use]
    pub fn weekly(interval: u32, days: &[Weekday], terminator: Terminator) -> Self {
        Self {
            frequency: Frequency::Weekly,
            interval,
            days_of_week: WeekdaySet::from_days(days),
            monthly: None,
            month: None,
            day_in_month: None,
            terminator: Some(terminator),
        }
    }

    #[must_use]
    pub fn monthly_on_day(interval: u32, day: u32, terminator: Terminator) -> Self {
        Self {
            frequency: Frequency::Monthly,
            interval,
            days_of_week: WeekdaySet::empty(),
            monthly: Some(MonthlyPattern::DayOfMonth { day }),
            month: None,
            day_in_month: None,
            terminator: Some(terminator),
        }
    }

    #[must_use]
    pub fn monthly_on_weekday(
        interval: u32,
        ordinal: Ordinal,
        day: Weekday,
        terminator: Terminator,
    ) -> Self {
        Self {
            frequency: Frequency::Monthly,
            interval,
            days_of_week: WeekdaySet::empty(),
            monthly: Some(MonthlyPattern::NthWeekday { ordinal, day }),
            month: None,
            day_in_month: None,
            terminator: Some(terminator),
        }
    }

    #[must_use]
    pub fn yearly(interval: u32, month: u32, day: u32, terminator: Terminator) -> Self {
        Self {
            frequency: Frequency::Yearly,
            interval,
            days_of_week: WeekdaySet::empty(),
            monthly: None,
            month: Some(month),
            day_in_month: Some(day),
            terminator: Some(terminator),
        }
    }

    /// The occurrence count this rule terminates at, if count-terminated.
    #[must_use]
    pub const fn count_limit(&self) -> Option<u32> {
        match self.terminator {
            Some(Terminator::Count(n)) => Some(n),
            _ => None,
        }
    }

    /// ## Summary
    /// Validates the rule for persistence.
    ///
    /// ## Errors
    /// Returns a validation error with a stable code if the rule is
    /// unbounded, has a zero interval, or its frequency-specific selectors
    /// are missing or out of range.
    pub fn validate(&self) -> CoreResult<()> {
        if self.interval == 0 {
            return Err(CoreError::validation(
                ERR_RULE_INVALID,
                "recurrence interval must be at least 1",
            ));
        }

        match self.terminator {
            None => {
                return Err(CoreError::validation(
                    ERR_RULE_UNBOUNDED,
                    "recurrence rule has neither until nor count",
                ));
            }
            Some(Terminator::Count(0)) => {
                return Err(CoreError::validation(
                    ERR_RULE_INVALID,
                    "occurrence count must be at least 1",
                ));
            }
            Some(_) => {}
        }

        match self.frequency {
            Frequency::Daily => {}
            Frequency::Weekly => {
                if self.days_of_week.is_empty() {
                    return Err(CoreError::validation(
                        ERR_RULE_INVALID,
                        "weekly rule selects no weekdays",
                    ));
                }
            }
            Frequency::Monthly => match self.monthly {
                Some(MonthlyPattern::DayOfMonth { day }) if (1..=31).contains(&day) => {}
                Some(MonthlyPattern::NthWeekday { .. }) => {}
                Some(MonthlyPattern::DayOfMonth { day }) => {
                    return Err(CoreError::validation(
                        ERR_RULE_INVALID,
                        format!("day in month out of range: {day}"),
                    ));
                }
                None => {
                    return Err(CoreError::validation(
                        ERR_RULE_INVALID,
                        "monthly rule has no day selector",
                    ));
                }
            },
            Frequency::Yearly => {
                let month_ok = self.month.is_some_and(|m| (1..=12).contains(&m));
                let day_ok = self.day_in_month.is_some_and(|d| (1..=31).contains(&d));
                if !month_ok || !day_ok {
                    return Err(CoreError::validation(
                        ERR_RULE_INVALID,
                        "yearly rule needs month 1..=12 and day 1..=31",
                    ));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use kalends_core::constants;

    #[test]
    fn test_weekday_set_orders_ascending_from_monday() {
        let set = WeekdaySet::from_days(&[Weekday::Sun, Weekday::Tue, Weekday::Mon]);
        let days: Vec<Weekday> = set.iter().collect();
        assert_eq!(days, vec![Weekday::Mon, Weekday::Tue, Weekday::Sun]);
    }

    #[test]
    fn test_unbounded_rule_rejected() {
        let mut rule = RecurrenceRule::daily(1, Terminator::Count(3));
        rule.terminator = None;
        let err = rule.validate().unwrap_err();
        assert_eq!(err.code(), Some(constants::ERR_RULE_UNBOUNDED));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let rule = RecurrenceRule::daily(0, Terminator::Count(3));
        let err = rule.validate().unwrap_err();
        assert_eq!(err.code(), Some(constants::ERR_RULE_INVALID));
    }

    #[test]
    fn test_weekly_without_days_rejected() {
        let rule = RecurrenceRule::weekly(1, &[], Terminator::Count(3));
        assert!(rule.validate().is_err());
    }

    #[test]
    fn test_valid_rules_pass() {
        let until = Utc.with_ymd_and_hms(2014, 1, 1, 0, 0, 0).unwrap();
        assert!(RecurrenceRule::daily(2, Terminator::Until(until)).validate().is_ok());
        assert!(
            RecurrenceRule::weekly(1, &[Weekday::Tue], Terminator::Count(3))
                .validate()
                .is_ok()
        );
        assert!(
            RecurrenceRule::monthly_on_day(1, 31, Terminator::Count(12))
                .validate()
                .is_ok()
        );
        assert!(
            RecurrenceRule::monthly_on_weekday(1, Ordinal::Last, Weekday::Fri, Terminator::Count(6))
                .validate()
                .is_ok()
        );
        assert!(
            RecurrenceRule::yearly(1, 2, 29, Terminator::Count(4))
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_yearly_month_out_of_range_rejected() {
        let rule = RecurrenceRule::yearly(1, 13, 1, Terminator::Count(2));
        assert!(rule.validate().is_err());
    }
}

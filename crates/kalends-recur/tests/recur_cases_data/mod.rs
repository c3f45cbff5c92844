use chrono::{Datelike, TimeZone, Timelike, Utc, Weekday};
use chrono_tz::Tz;

use crate::generator::expand_all;
use crate::model::SeriesMaster;
use crate::rule::{Ordinal, RecurrenceRule, Terminator};
use kalends_core::config::RecurrenceConfig;
use kalends_core::types::{SeriesId, ShownAs};

pub struct RecurCase {
    pub name: &'static str,
    pub rule: RecurrenceRule,
    /// Master start as local wall clock `(y, m, d, h, min)` in `zone`.
    pub start_local: (i32, u32, u32, u32, u32),
    pub duration_minutes: i64,
    pub zone: Tz,
    /// Expected occurrence starts as local wall clock in `zone`.
    pub expected_local: &'static [(i32, u32, u32, u32, u32)],
}

pub fn recur_cases() -> Vec<RecurCase> {
    vec![
        RecurCase {
            name: "daily_interval_three",
            rule: RecurrenceRule::daily(3, Terminator::Count(4)),
            start_local: (2013, 10, 14, 9, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 10, 14, 9, 0),
                (2013, 10, 17, 9, 0),
                (2013, 10, 20, 9, 0),
                (2013, 10, 23, 9, 0),
            ],
        },
        RecurCase {
            name: "weekly_two_days",
            rule: RecurrenceRule::weekly(1, &[Weekday::Tue, Weekday::Thu], Terminator::Count(4)),
            start_local: (2013, 10, 15, 9, 0),
            duration_minutes: 30,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 10, 15, 9, 0),
                (2013, 10, 17, 9, 0),
                (2013, 10, 22, 9, 0),
                (2013, 10, 24, 9, 0),
            ],
        },
        RecurCase {
            name: "weekly_interval_two",
            rule: RecurrenceRule::weekly(2, &[Weekday::Wed], Terminator::Count(3)),
            start_local: (2013, 10, 16, 9, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 10, 16, 9, 0),
                (2013, 10, 30, 9, 0),
                (2013, 11, 13, 9, 0),
            ],
        },
        RecurCase {
            name: "monthly_fifteenth",
            rule: RecurrenceRule::monthly_on_day(1, 15, Terminator::Count(3)),
            start_local: (2013, 1, 15, 10, 30),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 1, 15, 10, 30),
                (2013, 2, 15, 10, 30),
                (2013, 3, 15, 10, 30),
            ],
        },
        RecurCase {
            name: "monthly_interval_three",
            rule: RecurrenceRule::monthly_on_day(3, 10, Terminator::Count(3)),
            start_local: (2013, 2, 10, 14, 0),
            duration_minutes: 120,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 2, 10, 14, 0),
                (2013, 5, 10, 14, 0),
                (2013, 8, 10, 14, 0),
            ],
        },
        RecurCase {
            name: "monthly_first_monday",
            rule: RecurrenceRule::monthly_on_weekday(
                1,
                Ordinal::First,
                Weekday::Mon,
                Terminator::Count(3),
            ),
            start_local: (2013, 11, 4, 9, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 11, 4, 9, 0),
                (2013, 12, 2, 9, 0),
                (2014, 1, 6, 9, 0),
            ],
        },
        RecurCase {
            name: "yearly_new_year",
            rule: RecurrenceRule::yearly(1, 1, 1, Terminator::Count(3)),
            start_local: (2013, 1, 1, 12, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 1, 1, 12, 0),
                (2014, 1, 1, 12, 0),
                (2015, 1, 1, 12, 0),
            ],
        },
        RecurCase {
            name: "yearly_interval_two",
            rule: RecurrenceRule::yearly(2, 6, 30, Terminator::Count(3)),
            start_local: (2013, 6, 30, 8, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 6, 30, 8, 0),
                (2015, 6, 30, 8, 0),
                (2017, 6, 30, 8, 0),
            ],
        },
        RecurCase {
            name: "until_is_inclusive_of_matching_start",
            rule: RecurrenceRule::daily(
                1,
                // 09:00 Berlin on the 16th; the 16th fires, the 17th does not.
                Terminator::Until(Utc.with_ymd_and_hms(2013, 10, 16, 7, 0, 0).unwrap()),
            ),
            start_local: (2013, 10, 14, 9, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 10, 14, 9, 0),
                (2013, 10, 15, 9, 0),
                (2013, 10, 16, 9, 0),
            ],
        },
        RecurCase {
            name: "daily_across_fall_back_keeps_local_hour",
            rule: RecurrenceRule::daily(1, Terminator::Count(3)),
            start_local: (2013, 10, 26, 9, 0),
            duration_minutes: 60,
            zone: chrono_tz::Europe::Berlin,
            expected_local: &[
                (2013, 10, 26, 9, 0),
                (2013, 10, 27, 9, 0),
                (2013, 10, 28, 9, 0),
            ],
        },
    ]
}

pub fn assert_case(case: &RecurCase) {
    let (y, mo, d, h, mi) = case.start_local;
    let start_utc = case
        .zone
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .single()
        .unwrap_or_else(|| panic!("ambiguous start in case {}", case.name))
        .with_timezone(&Utc);

    let master = SeriesMaster {
        id: SeriesId::random(),
        title: case.name.to_string(),
        location: None,
        note: None,
        start_utc,
        end_utc: start_utc + chrono::TimeDelta::minutes(case.duration_minutes),
        timezone: case.zone,
        full_time: false,
        shown_as: ShownAs::Busy,
        rule: Some(case.rule.clone()),
        participants: vec![],
    };

    let occurrences = expand_all(&master, &RecurrenceConfig::default())
        .unwrap_or_else(|err| panic!("case {} failed to expand: {err}", case.name));

    let actual: Vec<(i32, u32, u32, u32, u32)> = occurrences
        .iter()
        .map(|occ| {
            let local = occ.start_utc.with_timezone(&case.zone);
            (
                local.year(),
                local.month(),
                local.day(),
                local.hour(),
                local.minute(),
            )
        })
        .collect();

    assert_eq!(actual, case.expected_local, "case {}", case.name);
}

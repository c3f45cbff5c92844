//! Occurrence generation: expands a series master into ordered, finite
//! sequences of `(position, start, end)` instances.
//!
//! All stepping happens on wall-clock values in the series' declared
//! timezone, so the local start hour survives DST transitions; each
//! candidate is resolved back to UTC through [`crate::timezone`].

use chrono::{Datelike, Days, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Weekday};
use kalends_core::config::RecurrenceConfig;
use kalends_core::types::TimeRange;

use crate::error::{RecurError, RecurResult};
use crate::model::{Occurrence, SeriesMaster};
use crate::rule::{Frequency, MonthlyPattern, Ordinal, RecurrenceRule, Terminator, WeekdaySet};

/// Consecutive pattern misses after which a stepper gives up.
///
/// Bounds pathological rules that can never fire again (a yearly Feb-29
/// rule whose interval dodges every leap year).
const MAX_CONSECUTIVE_MISSES: u32 = 400;

/// ## Summary
/// Expands the series over `range`, honoring the rule terminator.
///
/// Positions are 1-based over the unfiltered expansion: occurrences before
/// `range.start` still consume positions, so the numbering is stable across
/// different query windows. Exceptions are NOT applied here; see
/// [`crate::exception::ExceptionSet::apply`].
///
/// ## Errors
/// Returns an error for an invalid rule, a DST gap under the `Reject`
/// policy, or an expansion exceeding the configured occurrence cap.
pub fn expand(
    master: &SeriesMaster,
    range: TimeRange,
    cfg: &RecurrenceConfig,
) -> RecurResult<Vec<Occurrence>> {
    let Some(rule) = &master.rule else {
        return Ok(expand_single(master, range));
    };
    rule.validate()?;

    let tz = master.timezone;
    let wall_start = master.start_utc.with_timezone(&tz).naive_local();
    let duration = master.duration();
    let day_count = full_day_count(master);

    let until_wall = match rule.terminator {
        Some(Terminator::Until(until)) => Some(until.with_timezone(&tz).naive_local()),
        _ => None,
    };
    let count_limit = rule.count_limit();

    let mut out = Vec::new();
    let mut position: u32 = 0;

    for candidate in Stepper::new(rule, wall_start) {
        position += 1;

        if let Some(limit) = count_limit
            && position > limit
        {
            break;
        }
        if let Some(until) = until_wall
            && candidate > until
        {
            break;
        }
        if position > cfg.max_occurrences {
            return Err(RecurError::LimitExceeded(cfg.max_occurrences));
        }

        let (start_utc, end_utc) = if master.full_time {
            let day = candidate.date();
            let end_day = day
                .checked_add_days(Days::new(day_count.unsigned_abs()))
                .unwrap_or(day);
            (
                crate::timezone::resolve_wall_clock(
                    day.and_time(NaiveTime::MIN),
                    tz,
                    cfg.dst_gap_policy,
                )?,
                crate::timezone::resolve_wall_clock(
                    end_day.and_time(NaiveTime::MIN),
                    tz,
                    cfg.dst_gap_policy,
                )?,
            )
        } else {
            let start = crate::timezone::resolve_wall_clock(candidate, tz, cfg.dst_gap_policy)?;
            (start, start + duration)
        };

        if start_utc >= range.end {
            break;
        }
        if end_utc <= range.start {
            continue;
        }

        out.push(Occurrence::derived(
            master,
            Some(position),
            start_utc,
            end_utc,
        ));
    }

    tracing::trace!(
        series = %master.id,
        emitted = out.len(),
        last_position = position,
        "expanded series"
    );
    Ok(out)
}

/// ## Summary
/// Expands the whole series, bounded only by its terminator.
///
/// ## Errors
/// Same failure modes as [`expand`]; an unterminated rule is rejected by
/// validation before any stepping happens.
pub fn expand_all(master: &SeriesMaster, cfg: &RecurrenceConfig) -> RecurResult<Vec<Occurrence>> {
    let range = TimeRange {
        start: chrono::DateTime::<chrono::Utc>::MIN_UTC,
        end: chrono::DateTime::<chrono::Utc>::MAX_UTC,
    };
    expand(master, range, cfg)
}

/// ## Summary
/// Total number of positions the series terminator admits.
///
/// Used to reconcile exceptions after a rule update shrinks the series.
///
/// ## Errors
/// Same failure modes as [`expand`].
pub fn total_positions(master: &SeriesMaster, cfg: &RecurrenceConfig) -> RecurResult<u32> {
    let all = expand_all(master, cfg)?;
    Ok(u32::try_from(all.len()).unwrap_or(u32::MAX))
}

/// ## Summary
/// The occurrence at a given recurrence position, if the expansion
/// reaches it.
///
/// ## Errors
/// Same failure modes as [`expand`].
pub fn occurrence_at(
    master: &SeriesMaster,
    position: u32,
    cfg: &RecurrenceConfig,
) -> RecurResult<Option<Occurrence>> {
    let all = expand_all(master, cfg)?;
    Ok(all.into_iter().find(|occ| occ.position == Some(position)))
}

fn expand_single(master: &SeriesMaster, range: TimeRange) -> Vec<Occurrence> {
    let zero_length = master.start_utc == master.end_utc;
    let intersects = master.start_utc < range.end
        && (master.end_utc > range.start || (zero_length && master.start_utc >= range.start));
    if intersects {
        vec![Occurrence::single(master)]
    } else {
        Vec::new()
    }
}

/// Whole calendar days a full-time master covers, derived from its
/// wall-clock span. Never less than one.
fn full_day_count(master: &SeriesMaster) -> i64 {
    let tz = master.timezone;
    let wall_start = master.start_utc.with_timezone(&tz).naive_local();
    let wall_end = master.end_utc.with_timezone(&tz).naive_local();
    let mut days = (wall_end.date() - wall_start.date()).num_days();
    if wall_end.time() > NaiveTime::MIN {
        days += 1;
    }
    days.max(1)
}

/// Infinite iterator over candidate wall-clock start datetimes, beginning
/// at the first candidate on or after the master start. Terminators and
/// caps are applied by the caller.
enum Stepper {
    Daily {
        next: NaiveDateTime,
        step: TimeDelta,
    },
    Weekly {
        monday: NaiveDate,
        time: NaiveTime,
        days: WeekdaySet,
        interval: u32,
        cursor: u32,
        floor: NaiveDateTime,
    },
    MonthlyDay {
        year: i32,
        month: u32,
        day: u32,
        time: NaiveTime,
        interval: u32,
        floor: NaiveDateTime,
        misses: u32,
    },
    MonthlyNth {
        year: i32,
        month: u32,
        ordinal: Ordinal,
        weekday: Weekday,
        time: NaiveTime,
        interval: u32,
        floor: NaiveDateTime,
        misses: u32,
    },
    Yearly {
        year: i32,
        month: u32,
        day: u32,
        time: NaiveTime,
        interval: u32,
        floor: NaiveDateTime,
        misses: u32,
    },
}

impl Stepper {
    fn new(rule: &RecurrenceRule, wall_start: NaiveDateTime) -> Self {
        let time = wall_start.time();
        match rule.frequency {
            Frequency::Daily => Self::Daily {
                next: wall_start,
                step: TimeDelta::days(i64::from(rule.interval)),
            },
            Frequency::Weekly => {
                let monday = wall_start.date()
                    - TimeDelta::days(i64::from(wall_start.weekday().num_days_from_monday()));
                Self::Weekly {
                    monday,
                    time,
                    days: rule.days_of_week,
                    interval: rule.interval,
                    cursor: 0,
                    floor: wall_start,
                }
            }
            Frequency::Monthly => {
                if let Some(MonthlyPattern::NthWeekday { ordinal, day }) = rule.monthly {
                    Self::MonthlyNth {
                        year: wall_start.year(),
                        month: wall_start.month(),
                        ordinal,
                        weekday: day,
                        time,
                        interval: rule.interval,
                        floor: wall_start,
                        misses: 0,
                    }
                } else {
                    // Validation guarantees a selector is present.
                    let day = match rule.monthly {
                        Some(MonthlyPattern::DayOfMonth { day }) => day,
                        _ => wall_start.day(),
                    };
                    Self::MonthlyDay {
                        year: wall_start.year(),
                        month: wall_start.month(),
                        day,
                        time,
                        interval: rule.interval,
                        floor: wall_start,
                        misses: 0,
                    }
                }
            }
            Frequency::Yearly => Self::Yearly {
                year: wall_start.year(),
                month: rule.month.unwrap_or(wall_start.month()),
                day: rule.day_in_month.unwrap_or(wall_start.day()),
                time,
                interval: rule.interval,
                floor: wall_start,
                misses: 0,
            },
        }
    }
}

impl Iterator for Stepper {
    type Item = NaiveDateTime;

    fn next(&mut self) -> Option<NaiveDateTime> {
        match self {
            Self::Daily { next, step } => {
                let current = *next;
                *next = current + *step;
                Some(current)
            }
            Self::Weekly {
                monday,
                time,
                days,
                interval,
                cursor,
                floor,
            } => loop {
                if *cursor >= 7 {
                    *monday += TimeDelta::days(7 * i64::from(*interval));
                    *cursor = 0;
                }
                let idx = *cursor;
                *cursor += 1;
                let day = weekday_from_index(idx);
                if !days.contains(day) {
                    continue;
                }
                let candidate = (*monday + TimeDelta::days(i64::from(idx))).and_time(*time);
                if candidate < *floor {
                    continue;
                }
                return Some(candidate);
            },
            Self::MonthlyDay {
                year,
                month,
                day,
                time,
                interval,
                floor,
                misses,
            } => loop {
                let date = NaiveDate::from_ymd_opt(*year, *month, *day);
                (*year, *month) = add_months(*year, *month, *interval);
                match date {
                    Some(date) if date.and_time(*time) >= *floor => {
                        *misses = 0;
                        return Some(date.and_time(*time));
                    }
                    _ => {
                        *misses += 1;
                        if *misses > MAX_CONSECUTIVE_MISSES {
                            return None;
                        }
                    }
                }
            },
            Self::MonthlyNth {
                year,
                month,
                ordinal,
                weekday,
                time,
                interval,
                floor,
                misses,
            } => loop {
                let date = nth_weekday_of_month(*year, *month, *ordinal, *weekday);
                (*year, *month) = add_months(*year, *month, *interval);
                match date {
                    Some(date) if date.and_time(*time) >= *floor => {
                        *misses = 0;
                        return Some(date.and_time(*time));
                    }
                    _ => {
                        *misses += 1;
                        if *misses > MAX_CONSECUTIVE_MISSES {
                            return None;
                        }
                    }
                }
            },
            Self::Yearly {
                year,
                month,
                day,
                time,
                interval,
                floor,
                misses,
            } => loop {
                let date = NaiveDate::from_ymd_opt(*year, *month, *day);
                *year += i32::try_from(*interval).unwrap_or(1);
                match date {
                    Some(date) if date.and_time(*time) >= *floor => {
                        *misses = 0;
                        return Some(date.and_time(*time));
                    }
                    _ => {
                        *misses += 1;
                        if *misses > MAX_CONSECUTIVE_MISSES {
                            return None;
                        }
                    }
                }
            },
        }
    }
}

const fn weekday_from_index(idx: u32) -> Weekday {
    match idx {
        0 => Weekday::Mon,
        1 => Weekday::Tue,
        2 => Weekday::Wed,
        3 => Weekday::Thu,
        4 => Weekday::Fri,
        5 => Weekday::Sat,
        _ => Weekday::Sun,
    }
}

/// Advances a 1-based `(year, month)` pair by `delta` months.
fn add_months(year: i32, month: u32, delta: u32) -> (i32, u32) {
    let zero_based = i64::from(month) - 1 + i64::from(delta);
    let year_delta = zero_based.div_euclid(12);
    let new_month = zero_based.rem_euclid(12) + 1;
    (
        year + i32::try_from(year_delta).unwrap_or(0),
        u32::try_from(new_month).unwrap_or(1),
    )
}

/// The `ordinal`-th `weekday` of the given month, if the month has one.
fn nth_weekday_of_month(
    year: i32,
    month: u32,
    ordinal: Ordinal,
    weekday: Weekday,
) -> Option<NaiveDate> {
    if let Some(index) = ordinal.index() {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let offset =
            (7 + weekday.num_days_from_monday() - first.weekday().num_days_from_monday()) % 7;
        let date = first + TimeDelta::days(i64::from(offset + index * 7));
        (date.month() == month).then_some(date)
    } else {
        let (next_year, next_month) = add_months(year, month, 1);
        let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
        let back =
            (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
        Some(last - TimeDelta::days(i64::from(back)))
    }
}

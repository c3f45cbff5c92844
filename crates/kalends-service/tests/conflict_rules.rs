//! Integration tests for conflict detection through the appointment
//! service: hard vs soft severity, the ignore flag, and full-day
//! calendar-day comparison.

use chrono::{TimeZone, Utc};
use kalends_core::config::RecurrenceConfig;
use kalends_core::types::{ParticipantId, SeriesId, ShownAs};
use kalends_recur::model::{Participant, SeriesMaster};
use kalends_recur::rule::{RecurrenceRule, Terminator};
use kalends_service::appointment::AppointmentService;
use kalends_service::error::ServiceError;
use kalends_store::memory::MemoryStore;
use kalends_store::store::SeriesStore;

fn service() -> AppointmentService<MemoryStore> {
    AppointmentService::new(MemoryStore::new(), RecurrenceConfig::default())
}

fn create_test_series(
    title: &str,
    start_hour: u32,
    end_hour: u32,
    participants: Vec<Participant>,
) -> SeriesMaster {
    SeriesMaster {
        id: SeriesId::random(),
        title: title.to_string(),
        location: None,
        note: None,
        start_utc: Utc.with_ymd_and_hms(2013, 10, 14, start_hour, 0, 0).unwrap(),
        end_utc: Utc.with_ymd_and_hms(2013, 10, 14, end_hour, 0, 0).unwrap(),
        timezone: chrono_tz::Europe::Berlin,
        full_time: false,
        shown_as: ShownAs::Busy,
        rule: None,
        participants,
    }
}

#[test_log::test]
fn test_soft_conflict_reported_but_not_blocking() {
    let service = service();
    let alice = ParticipantId::random();

    service
        .insert(
            create_test_series("existing", 8, 9, vec![Participant::internal(alice)]),
            false,
        )
        .unwrap();

    let outcome = service
        .insert(
            create_test_series("overlapping", 8, 9, vec![Participant::internal(alice)]),
            false,
        )
        .unwrap();
    assert_eq!(outcome.conflicts.len(), 1);
    assert!(!outcome.conflicts[0].is_hard());
}

#[test_log::test]
fn test_hard_conflict_blocks_insert() {
    let service = service();
    let room = ParticipantId::random();

    service
        .insert(
            create_test_series("existing", 8, 9, vec![Participant::resource(room)]),
            false,
        )
        .unwrap();

    let blocked = create_test_series("double booking", 8, 9, vec![Participant::resource(room)]);
    let blocked_id = blocked.id;
    let err = service.insert(blocked, false).unwrap_err();
    let ServiceError::SchedulingConflict(conflicts) = err else {
        panic!("expected a scheduling conflict, got {err}");
    };
    assert!(conflicts.iter().any(|c| c.is_hard()));
    assert!(service.store().get(blocked_id).is_err());
}

#[test_log::test]
fn test_ignore_flag_overrides_hard_conflict() {
    let service = service();
    let room = ParticipantId::random();

    service
        .insert(
            create_test_series("existing", 8, 9, vec![Participant::resource(room)]),
            false,
        )
        .unwrap();

    let outcome = service
        .insert(
            create_test_series("forced booking", 8, 9, vec![Participant::resource(room)]),
            true,
        )
        .unwrap();
    assert!(outcome.conflicts.iter().any(|c| c.is_hard()));
    assert!(service.store().get(outcome.series_id).is_ok());
}

#[test_log::test]
fn test_adjacent_appointments_do_not_conflict() {
    let service = service();
    let alice = ParticipantId::random();

    service
        .insert(
            create_test_series("morning", 8, 9, vec![Participant::internal(alice)]),
            false,
        )
        .unwrap();

    // Half-open intervals: end 09:00 touches start 09:00 without overlap.
    let outcome = service
        .insert(
            create_test_series("next slot", 9, 10, vec![Participant::internal(alice)]),
            false,
        )
        .unwrap();
    assert!(outcome.conflicts.is_empty());
}

#[test_log::test]
fn test_free_appointments_never_conflict() {
    let service = service();
    let alice = ParticipantId::random();

    let mut existing = create_test_series("ooo marker", 8, 9, vec![Participant::internal(alice)]);
    existing.shown_as = ShownAs::Free;
    service.insert(existing, false).unwrap();

    let outcome = service
        .insert(
            create_test_series("meeting", 8, 9, vec![Participant::internal(alice)]),
            false,
        )
        .unwrap();
    assert!(outcome.conflicts.is_empty());
}

#[test_log::test]
fn test_full_day_conflicts_by_calendar_day_across_offsets() {
    let service = service();
    let alice = ParticipantId::random();

    // Full-day appointment covering October 14th, declared in UTC.
    let mut full_day = create_test_series("offsite", 0, 0, vec![Participant::internal(alice)]);
    full_day.timezone = chrono_tz::UTC;
    full_day.full_time = true;
    full_day.start_utc = Utc.with_ymd_and_hms(2013, 10, 14, 0, 0, 0).unwrap();
    full_day.end_utc = Utc.with_ymd_and_hms(2013, 10, 15, 0, 0, 0).unwrap();
    service.insert(full_day, false).unwrap();

    // 00:30-01:00 on October 14th in Athens (UTC+3 in summer) is still
    // October 13th in UTC. Calendar days overlap, instants do not.
    let mut late_night = create_test_series("call", 0, 0, vec![Participant::internal(alice)]);
    late_night.timezone = chrono_tz::Europe::Athens;
    late_night.start_utc = Utc.with_ymd_and_hms(2013, 10, 13, 21, 30, 0).unwrap();
    late_night.end_utc = Utc.with_ymd_and_hms(2013, 10, 13, 22, 0, 0).unwrap();

    let outcome = service.insert(late_night, false).unwrap();
    assert_eq!(outcome.conflicts.len(), 1);
}

#[test_log::test]
fn test_recurring_series_conflicts_inside_window() {
    let service = service();
    let alice = ParticipantId::random();

    let mut weekly = create_test_series("weekly sync", 8, 9, vec![Participant::internal(alice)]);
    weekly.rule = Some(RecurrenceRule::weekly(
        1,
        &[chrono::Weekday::Mon],
        Terminator::Count(10),
    ));
    service.insert(weekly, false).unwrap();

    // One week later, same slot: conflicts with the second occurrence.
    let mut next_monday =
        create_test_series("one-off", 8, 9, vec![Participant::internal(alice)]);
    next_monday.start_utc = Utc.with_ymd_and_hms(2013, 10, 21, 8, 0, 0).unwrap();
    next_monday.end_utc = Utc.with_ymd_and_hms(2013, 10, 21, 9, 0, 0).unwrap();

    let outcome = service.insert(next_monday, false).unwrap();
    assert_eq!(outcome.conflicts.len(), 1);
}

#[test_log::test]
fn test_deleted_occurrence_frees_its_slot() {
    let service = service();
    let room = ParticipantId::random();

    let mut daily = create_test_series("room booking", 8, 9, vec![Participant::resource(room)]);
    daily.rule = Some(RecurrenceRule::daily(1, Terminator::Count(5)));
    let outcome = service.insert(daily, false).unwrap();
    let id = outcome.series_id;

    // Delete-except the second occurrence (October 15th).
    service
        .delete(
            kalends_service::appointment::Target::Occurrence(id, 2),
            outcome.token,
        )
        .unwrap();

    let mut replacement =
        create_test_series("replacement", 8, 9, vec![Participant::resource(room)]);
    replacement.start_utc = Utc.with_ymd_and_hms(2013, 10, 15, 8, 0, 0).unwrap();
    replacement.end_utc = Utc.with_ymd_and_hms(2013, 10, 15, 9, 0, 0).unwrap();

    let outcome = service.insert(replacement, false).unwrap();
    assert!(outcome.conflicts.is_empty());
}

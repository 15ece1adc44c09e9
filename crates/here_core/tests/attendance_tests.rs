mod support;

use std::sync::Arc;

use here_core::attendance::{ActionOutcome, AttendanceService, DEFAULT_WAVE_MOOD};
use here_core::domain::{GeoPoint, SchedulePattern, SectionType};
use here_core::{Clock, DataStore};
use support::{date, local, section, FixedClock, MemoryStore};
use uuid::Uuid;

fn service(store: &Arc<MemoryStore>, clock: Arc<FixedClock>) -> AttendanceService {
    AttendanceService::new(store.clone() as Arc<dyn DataStore>, clock as Arc<dyn Clock>)
}

#[tokio::test]
async fn waves_require_presence_enabled() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock);

    let mut no_presence = section("Quiet Room", SectionType::InPerson, SchedulePattern::EveryDay);
    no_presence.presence_enabled = false;
    store.add_section(no_presence.clone());

    let outcome = attendance
        .record_presence_wave(Uuid::new_v4(), no_presence.id, None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Denied {
            reason: "Presence waves not enabled for this section".to_string()
        }
    );
    assert_eq!(store.presence_count(), 0);
}

#[tokio::test]
async fn waves_default_their_mood_and_may_repeat() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock);

    let advisory = section("Advisory", SectionType::InPerson, SchedulePattern::EveryDay);
    store.add_section(advisory.clone());
    let student_id = Uuid::new_v4();

    let first = attendance
        .record_presence_wave(student_id, advisory.id, None)
        .await
        .unwrap();
    assert_eq!(first, ActionOutcome::Completed);

    // Waves are a social signal: no per-day uniqueness.
    let second = attendance
        .record_presence_wave(student_id, advisory.id, Some("🎉".to_string()))
        .await
        .unwrap();
    assert_eq!(second, ActionOutcome::Completed);
    assert_eq!(store.presence_count(), 2);

    let status = attendance
        .get_status(student_id, advisory.id, date(2026, 1, 13))
        .await
        .unwrap();
    assert!(status.has_waved);

    // The first wave of the day carries the default mood.
    let mood = store
        .first_presence_mood(student_id, advisory.id)
        .expect("wave recorded");
    assert_eq!(mood, DEFAULT_WAVE_MOOD);
}

#[tokio::test]
async fn check_in_is_rejected_for_in_person_sections() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock);

    let advisory = section("Advisory", SectionType::InPerson, SchedulePattern::EveryDay);
    store.add_section(advisory.clone());

    let outcome = attendance
        .record_check_in(Uuid::new_v4(), advisory.id, "plans", None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Denied {
            reason: "This section does not require check-in".to_string()
        }
    );
}

#[tokio::test]
async fn duplicate_check_in_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock);

    let remote = section("Remote Work", SectionType::Remote, SchedulePattern::EveryDay);
    store.add_section(remote.clone());
    let student_id = Uuid::new_v4();

    let first = attendance
        .record_check_in(student_id, remote.id, "write the report", None)
        .await
        .unwrap();
    assert_eq!(first, ActionOutcome::Completed);

    let second = attendance
        .record_check_in(student_id, remote.id, "write it again", None)
        .await
        .unwrap();
    assert_eq!(
        second,
        ActionOutcome::Denied {
            reason: "Already checked in today".to_string()
        }
    );
    assert_eq!(store.event_count(), 1);
}

#[tokio::test]
async fn check_out_requires_a_same_day_check_in() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 10, 0)));
    let attendance = service(&store, clock);

    let remote = section("Remote Work", SectionType::Remote, SchedulePattern::EveryDay);
    store.add_section(remote.clone());

    let outcome = attendance
        .record_check_out(Uuid::new_v4(), remote.id, "done")
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Denied {
            reason: "Must check in before checking out".to_string()
        }
    );
}

#[tokio::test]
async fn duplicate_check_out_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock.clone());

    let remote = section("Remote Work", SectionType::Remote, SchedulePattern::EveryDay);
    store.add_section(remote.clone());
    let student_id = Uuid::new_v4();

    attendance
        .record_check_in(student_id, remote.id, "plans", None)
        .await
        .unwrap();
    clock.set(local(date(2026, 1, 13), 11, 30));
    attendance
        .record_check_out(student_id, remote.id, "progress")
        .await
        .unwrap();

    let again = attendance
        .record_check_out(student_id, remote.id, "more progress")
        .await
        .unwrap();
    assert_eq!(
        again,
        ActionOutcome::Denied {
            reason: "Already checked out today".to_string()
        }
    );
}

#[tokio::test]
async fn internship_geofence_is_soft() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock);

    let site = GeoPoint {
        latitude: 40.0,
        longitude: -75.0,
    };
    let mut internship = section("Hospital Internship", SectionType::Internship, SchedulePattern::EveryDay);
    internship.expected_location = Some(site);
    internship.geofence_radius_m = Some(200.0);
    store.add_section(internship.clone());

    // Far outside the fence: the check-in still succeeds.
    let far_away = GeoPoint {
        latitude: 41.0,
        longitude: -75.0,
    };
    let outcome = attendance
        .record_check_in(Uuid::new_v4(), internship.id, "rounds", Some(far_away))
        .await
        .unwrap();
    assert_eq!(outcome, ActionOutcome::Completed);

    let event = store.last_event().expect("event stored");
    assert_eq!(event.location_verified, Some(false));
    assert_eq!(event.location, Some(far_away));
}

#[tokio::test]
async fn unknown_sections_are_a_structured_denial() {
    let store = Arc::new(MemoryStore::new());
    let clock = Arc::new(FixedClock::at(local(date(2026, 1, 13), 9, 0)));
    let attendance = service(&store, clock);

    let outcome = attendance
        .record_check_in(Uuid::new_v4(), Uuid::new_v4(), "plans", None)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Denied {
            reason: "Section not found".to_string()
        }
    );
}

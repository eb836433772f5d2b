use super::*;

#[test]
fn fake_clock_advances_by_delta() {
    let start = DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let clock = FakeClock::new(start);
    assert_eq!(clock.now(), start);

    clock.advance(chrono::Duration::seconds(90));
    assert_eq!(clock.now(), start + chrono::Duration::seconds(90));
}

#[test]
fn fake_clock_set_overrides_current_time() {
    let start = Utc::now();
    let clock = FakeClock::new(start);
    let later = start + chrono::Duration::days(1);
    clock.set(later);
    assert_eq!(clock.now(), later);
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let a = clock.now();
    let b = clock.now();
    assert!(b >= a);
}

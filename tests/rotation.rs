#![forbid(unsafe_code)]
use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use roulement::{
    scheduler::{self, ComposeOptions, ScheduleComposer},
    BlockSource, Layer, SchedError, UserId, UserProfile,
};

fn t(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
}

fn layer(users: &[&str], hours: u32) -> Layer {
    let mut l = Layer::new("primary".into(), t(1, 0), None, hours).unwrap();
    for u in users {
        l.add_user(UserId::new(u), UserProfile::new(u.to_uppercase()));
    }
    l
}

fn summary(blocks: &[roulement::ScheduleBlock]) -> Vec<(&str, DateTime<Utc>, DateTime<Utc>)> {
    blocks
        .iter()
        .map(|b| (b.user_id.as_str(), b.start, b.end))
        .collect()
}

#[test]
fn daily_rotation_alternates_members() {
    let l = layer(&["a", "b"], 24);
    let blocks = scheduler::resolve(&l, t(1, 0), t(5, 0)).unwrap();
    assert_eq!(
        summary(&blocks),
        vec![
            ("a", t(1, 0), t(2, 0)),
            ("b", t(2, 0), t(3, 0)),
            ("a", t(3, 0), t(4, 0)),
            ("b", t(4, 0), t(5, 0)),
        ]
    );
    assert!(blocks.iter().all(|b| b.source == BlockSource::Rotation));
    assert!(blocks.iter().all(|b| b.layer_name == "primary"));
    assert_eq!(blocks[1].user.name, "B");
}

#[test]
fn first_and_last_blocks_are_clipped_to_window() {
    let l = layer(&["a", "b"], 24);
    let blocks = scheduler::resolve(&l, t(1, 12), t(3, 6)).unwrap();
    assert_eq!(
        summary(&blocks),
        vec![
            ("a", t(1, 12), t(2, 0)),
            ("b", t(2, 0), t(3, 0)),
            ("a", t(3, 0), t(3, 6)),
        ]
    );
}

#[test]
fn layer_without_members_has_no_coverage() {
    let l = layer(&[], 24);
    assert!(scheduler::resolve(&l, t(1, 0), t(5, 0)).unwrap().is_empty());
}

#[test]
fn layer_outside_window_yields_nothing() {
    let mut l = layer(&["a"], 24);
    l.end = Some(t(3, 0));
    assert!(scheduler::resolve(&l, t(3, 0), t(5, 0)).unwrap().is_empty());

    let mut later = layer(&["a"], 24);
    later.start = t(5, 0);
    assert!(scheduler::resolve(&later, t(1, 0), t(5, 0))
        .unwrap()
        .is_empty());
}

#[test]
fn layer_end_truncates_last_block() {
    let mut l = layer(&["a", "b"], 24);
    l.end = Some(t(2, 12));
    let blocks = scheduler::resolve(&l, t(1, 0), t(4, 0)).unwrap();
    assert_eq!(
        summary(&blocks),
        vec![("a", t(1, 0), t(2, 0)), ("b", t(2, 0), t(2, 12))]
    );
}

#[test]
fn window_before_layer_start_begins_at_layer_start() {
    let l = layer(&["a", "b"], 24);
    let before = Utc.with_ymd_and_hms(2023, 12, 30, 0, 0, 0).unwrap();
    let blocks = scheduler::resolve(&l, before, t(2, 0)).unwrap();
    assert_eq!(summary(&blocks), vec![("a", t(1, 0), t(2, 0))]);
}

#[test]
fn rotation_index_is_anchored_on_layer_start() {
    let l = layer(&["a", "b", "c"], 8);
    // 3 jours après le début : 9 rotations de 8h écoulées -> index 9 -> "a"
    let blocks = scheduler::resolve(&l, t(4, 0), t(4, 8)).unwrap();
    assert_eq!(summary(&blocks), vec![("a", t(4, 0), t(4, 8))]);
    // 4 rotations -> "b"
    let blocks = scheduler::resolve(&l, t(2, 9), t(2, 10)).unwrap();
    assert_eq!(summary(&blocks), vec![("b", t(2, 9), t(2, 10))]);
}

#[test]
fn members_rotate_in_position_order() {
    let mut l = layer(&["a", "b"], 24);
    for u in l.users.iter_mut() {
        u.position = if u.user_id.as_str() == "a" { 2 } else { 1 };
    }
    let blocks = scheduler::resolve(&l, t(1, 0), t(3, 0)).unwrap();
    assert_eq!(blocks[0].user_id.as_str(), "b");
    assert_eq!(blocks[1].user_id.as_str(), "a");
}

#[test]
fn daily_rotation_counts_real_hours_across_dst() {
    let tz: chrono_tz::Tz = "Europe/Paris".parse().unwrap();
    // samedi 30 mars 2024 00:00 heure de Paris, la veille du passage à l'heure d'été
    let start = Utc.with_ymd_and_hms(2024, 3, 29, 23, 0, 0).unwrap();
    let mut l = Layer::new("paris".into(), start, None, 24).unwrap();
    l.add_user(UserId::new("a"), UserProfile::new("A"));
    l.add_user(UserId::new("b"), UserProfile::new("B"));

    let blocks = scheduler::resolve(&l, start, start + Duration::days(3)).unwrap();
    assert_eq!(blocks.len(), 3);
    assert!(blocks.iter().all(|b| b.duration() == Duration::hours(24)));
    // la relève glisse d'une heure en heure locale
    assert_eq!(blocks[0].start.with_timezone(&tz).hour(), 0);
    assert_eq!(blocks[2].start.with_timezone(&tz).hour(), 1);
}

#[test]
fn zero_rotation_length_fails_fast() {
    let mut l = layer(&["a"], 24);
    l.rotation_length_hours = 0;
    assert!(matches!(
        scheduler::resolve(&l, t(1, 0), t(2, 0)),
        Err(SchedError::InvalidRotationLength(_))
    ));
}

#[test]
fn inverted_window_fails_fast() {
    let l = layer(&["a"], 24);
    assert!(matches!(
        scheduler::resolve(&l, t(2, 0), t(1, 0)),
        Err(SchedError::InvalidWindow)
    ));
    assert!(matches!(
        scheduler::resolve(&l, t(2, 0), t(2, 0)),
        Err(SchedError::InvalidWindow)
    ));
}

#[test]
fn pathological_window_is_rejected() {
    let l = layer(&["a", "b"], 1);
    let far = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert!(matches!(
        scheduler::resolve(&l, t(1, 0), far),
        Err(SchedError::TooManyBlocks { .. })
    ));

    let composer = ScheduleComposer::with_options(ComposeOptions {
        max_blocks_per_layer: 100_000,
        ..ComposeOptions::default()
    });
    let blocks = composer.resolve(&l, t(1, 0), far).unwrap();
    assert_eq!(blocks.len(), 731 * 24);
}

//! Reveal schedule applied to opened links.

mod common;

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, Utc};
use common::factories::{fast_seal_options, ConfigFactory};
use proptest::prelude::*;
use sanctuary::model::SanctuaryConfig;
use sanctuary::payload::{open, seal};
use sanctuary::render::RevealView;
use sanctuary::schedule::{DebugOverride, FixedClock, RevealGate, RevealSchedule};

fn at(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
}

fn gate(config: &SanctuaryConfig, now: &str) -> RevealGate {
    let schedule = RevealSchedule::from_config(config, FixedOffset::east_opt(0).unwrap()).unwrap();
    RevealGate::new(schedule, Arc::new(FixedClock::new(at(now))))
}

#[tokio::test]
async fn day_two_unlocks_at_its_midnight() {
    let config = ConfigFactory::new()
        .with_note(2, "<p>early</p>")
        .with_note(0, "<p>finale</p>")
        .build();
    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    let opened = open(sealed.url.as_str()).await.expect("open");

    let before = RevealView::build(opened.config(), &gate(opened.config(), "2030-01-07T23:59:59Z"));
    let day2 = &before.days[0];
    assert_eq!(day2.offset, 2);
    assert!(!day2.unlocked);
    assert_eq!(day2.countdown.hours, 0);
    assert_eq!(day2.countdown.minutes, 0);
    assert_eq!(day2.countdown.seconds, 1);
    assert!(day2.notes.is_empty());
    assert!(day2.gallery.is_empty());

    let after = RevealView::build(opened.config(), &gate(opened.config(), "2030-01-08T00:00:00Z"));
    let day2 = &after.days[0];
    assert!(day2.unlocked);
    assert_eq!(day2.notes[0].as_str(), "<p>early</p>");
    assert_eq!(day2.gallery, vec!["https://cdn.example/2a.jpg".to_string()]);
    assert!(!after.days[2].unlocked);
}

#[tokio::test]
async fn locked_link_reveals_no_notes_until_passcode() {
    let config = ConfigFactory::new()
        .with_passcode("2468")
        .with_note(2, "<p>secret</p>")
        .build();
    let sealed = seal(&config, &fast_seal_options()).await.expect("seal");
    let mut opened = open(sealed.url.as_str()).await.expect("open");

    let now = "2030-02-01T00:00:00Z";
    let view = RevealView::build(opened.config(), &gate(opened.config(), now));
    assert!(view.days.iter().all(|d| d.unlocked && d.notes.is_empty()));

    opened.unlock_with("2468").await.expect("unlock");
    let view = RevealView::build(opened.config(), &gate(opened.config(), now));
    assert_eq!(view.days[0].notes[0].as_str(), "<p>secret</p>");
}

#[test]
fn debug_override_is_client_local() {
    let config = ConfigFactory::new().with_note(0, "x").build();
    let live = gate(&config, "2029-12-01T00:00:00Z");
    let preview = gate(&config, "2029-12-01T00:00:00Z").with_debug(DebugOverride::UnlockAll);

    assert!(RevealView::build(&config, &preview).days.iter().all(|d| d.unlocked));
    assert!(RevealView::build(&config, &live).days.iter().all(|d| !d.unlocked));
}

#[test]
fn branding_follows_plan() {
    use sanctuary::model::Plan;
    let spark = ConfigFactory::new().with_plan(Plan::Spark).with_total_days(1).build();
    let plus = ConfigFactory::new().with_plan(Plan::Plus).build();
    assert!(RevealView::build(&spark, &gate(&spark, "2030-01-10T00:00:00Z")).branding);
    assert!(!RevealView::build(&plus, &gate(&plus, "2030-01-10T00:00:00Z")).branding);
}

proptest! {
    /// A day's countdown reaches zero exactly when the view reports it unlocked
    #[test]
    fn view_countdown_consistent(secs in 0i64..(5 * 86_400)) {
        let config = ConfigFactory::new().build();
        let now = at("2030-01-06T00:00:00Z") + chrono::Duration::seconds(secs);
        let schedule = RevealSchedule::from_config(&config, FixedOffset::east_opt(0).unwrap()).unwrap();
        let gate = RevealGate::new(schedule, Arc::new(FixedClock::new(now)));
        for day in RevealView::build(&config, &gate).days {
            prop_assert_eq!(day.unlocked, day.countdown.is_zero());
        }
    }
}

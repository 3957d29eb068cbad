use std::sync::Arc;

use chrono::{Local, NaiveDate, TimeZone};

use crate::catalog::Catalog;
use crate::model::{BookingStatus, UserQuery};

use super::extract::{parse_count, parse_date, parse_duration, parse_option, parse_time};
use super::*;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

// ── Date extraction ──────────────────────────────────────────

#[test]
fn date_relative_words() {
    // 2025-06-11 is a Wednesday.
    let today = day(2025, 6, 11);
    assert_eq!(parse_date("today please", today), Some(today));
    assert_eq!(parse_date("tomorrow", today), Some(day(2025, 6, 12)));
}

#[test]
fn date_bare_weekday_is_next_occurrence() {
    let today = day(2025, 6, 11); // Wednesday
    assert_eq!(parse_date("friday", today), Some(day(2025, 6, 13)));
    // Same weekday rolls a full week forward.
    assert_eq!(parse_date("wednesday", today), Some(day(2025, 6, 18)));
    assert_eq!(parse_date("monday", today), Some(day(2025, 6, 16)));
}

#[test]
fn date_next_weekday_skips_a_week() {
    let today = day(2025, 6, 11); // Wednesday
    assert_eq!(parse_date("next friday", today), Some(day(2025, 6, 20)));
}

#[test]
fn date_numeric_forms() {
    let today = day(2025, 6, 11);
    assert_eq!(parse_date("6/20", today), Some(day(2025, 6, 20)));
    assert_eq!(parse_date("6-20-26", today), Some(day(2026, 6, 20)));
    assert_eq!(parse_date("12/31/2025", today), Some(day(2025, 12, 31)));
}

#[test]
fn date_month_name_rolls_to_next_year_when_past() {
    let today = day(2025, 6, 15);
    assert_eq!(parse_date("march 1", today), Some(day(2026, 3, 1)));
    assert_eq!(parse_date("july 4th", today), Some(day(2025, 7, 4)));
    assert_eq!(parse_date("dec 25", today), Some(day(2025, 12, 25)));
}

#[test]
fn date_gibberish_is_rejected() {
    let today = day(2025, 6, 11);
    assert_eq!(parse_date("whenever works", today), None);
}

// ── Time extraction ──────────────────────────────────────────

#[test]
fn time_twelve_hour_forms() {
    let t = parse_time("2pm").unwrap();
    assert_eq!(t.start, ClockTime::from_hm(14, 0));
    assert_eq!(t.end, None);

    let t = parse_time("at 2:30 pm").unwrap();
    assert_eq!(t.start, ClockTime::from_hm(14, 30));

    let t = parse_time("12am").unwrap();
    assert_eq!(t.start, ClockTime::from_hm(0, 0));
}

#[test]
fn time_twenty_four_hour_forms() {
    assert_eq!(parse_time("14:00").unwrap().start, ClockTime::from_hm(14, 0));
    assert_eq!(parse_time("9").unwrap().start, ClockTime::from_hm(9, 0));
    // Parsed 24-hour times render consistently in 12-hour form.
    assert_eq!(parse_time("14:00").unwrap().start.display_12h(), "2:00 PM");
    assert_eq!(parse_time("00:00").unwrap().start.display_12h(), "12:00 AM");
}

#[test]
fn time_range_with_both_meridiems() {
    let t = parse_time("from 11am to 1pm").unwrap();
    assert_eq!(t.start, ClockTime::from_hm(11, 0));
    assert_eq!(t.end, Some(ClockTime::from_hm(13, 0)));
}

#[test]
fn time_range_infers_pm_start_when_it_fits() {
    let t = parse_time("from 2 to 4pm").unwrap();
    assert_eq!(t.start, ClockTime::from_hm(14, 0));
    assert_eq!(t.end, Some(ClockTime::from_hm(16, 0)));
}

#[test]
fn time_range_keeps_am_start_when_pm_would_overshoot() {
    let t = parse_time("from 11 to 1pm").unwrap();
    assert_eq!(t.start, ClockTime::from_hm(11, 0));
    assert_eq!(t.end, Some(ClockTime::from_hm(13, 0)));
}

#[test]
fn time_backwards_range_is_rejected() {
    assert_eq!(parse_time("from 5pm to 2pm"), None);
}

#[test]
fn time_gibberish_is_rejected() {
    assert_eq!(parse_time("sometime later"), None);
}

// ── Duration extraction ──────────────────────────────────────

#[test]
fn duration_forms() {
    assert_eq!(parse_duration("2 hours"), Some(2.0));
    assert_eq!(parse_duration("1.5 hrs"), Some(1.5));
    assert_eq!(parse_duration("90 minutes"), Some(1.5));
    assert_eq!(parse_duration("1 hour and 30 minutes"), Some(1.5));
    assert_eq!(parse_duration("2"), Some(2.0));
    assert_eq!(parse_duration("a while"), None);
}

#[test]
fn count_and_option_picks() {
    assert_eq!(parse_count("about 4 people"), Some(4));
    assert_eq!(parse_count("a few"), None);
    assert_eq!(parse_option("2"), Some(2));
    assert_eq!(parse_option("option 3"), Some(3));
    assert_eq!(parse_option("room 101 please"), None);
}

// ── Validators ───────────────────────────────────────────────

#[test]
fn booking_window_is_thirty_days() {
    let today = day(2025, 6, 11);
    assert!(date_in_range(today, today));
    assert!(date_in_range(day(2025, 7, 11), today));
    assert!(!date_in_range(day(2025, 7, 12), today));
    assert!(!date_in_range(day(2025, 6, 10), today));
}

#[test]
fn same_day_lead_time() {
    let now = Local.with_ymd_and_hms(2025, 6, 11, 14, 0, 0).unwrap();
    let today = day(2025, 6, 11);
    assert!(!same_day_start_ok(today, ClockTime::from_hm(14, 5), now));
    assert!(same_day_start_ok(today, ClockTime::from_hm(14, 15), now));
    // Future dates are unrestricted.
    assert!(same_day_start_ok(day(2025, 6, 12), ClockTime::from_hm(8, 0), now));
}

// ── Ledger ───────────────────────────────────────────────────

fn ledger() -> BookingLedger {
    BookingLedger::new(Arc::new(Catalog::new()))
}

fn request(room_id: u32, user: &str, start_h: u16, end_h: u16) -> BookingRequest {
    BookingRequest {
        room_id,
        user_id: user.to_string(),
        user_email: None,
        date: day(2025, 6, 20),
        slot: Slot::new(ClockTime::from_hm(start_h, 0), ClockTime::from_hm(end_h, 0)),
        purpose: Some("group project".to_string()),
        attendees: Some(4),
    }
}

#[tokio::test]
async fn create_assigns_ids_and_codes() {
    let ledger = ledger();
    let a = ledger.create(request(1, "u1", 10, 11)).await.unwrap();
    let b = ledger.create(request(2, "u1", 10, 11)).await.unwrap();
    assert_eq!(a.id, 1);
    assert_eq!(b.id, 2);
    assert!(a.confirmation_code.starts_with("BK-"));
    assert_eq!(a.confirmation_code.len(), 11);
    assert_ne!(a.confirmation_code, b.confirmation_code);
    assert_eq!(a.status, BookingStatus::Confirmed);
}

#[tokio::test]
async fn overlapping_booking_is_rejected() {
    let ledger = ledger();
    ledger.create(request(1, "u1", 10, 12)).await.unwrap();
    let err = ledger.create(request(1, "u2", 11, 13)).await.unwrap_err();
    assert_eq!(err, LedgerError::RoomUnavailable(1));
    // Contained and containing slots conflict too.
    assert!(!ledger
        .is_room_available(
            1,
            day(2025, 6, 20),
            Slot::new(ClockTime::from_hm(10, 30), ClockTime::from_hm(11, 0)),
        )
        .await);
    assert!(!ledger
        .is_room_available(
            1,
            day(2025, 6, 20),
            Slot::new(ClockTime::from_hm(9, 0), ClockTime::from_hm(13, 0)),
        )
        .await);
}

#[tokio::test]
async fn adjacent_and_distinct_bookings_are_fine() {
    let ledger = ledger();
    ledger.create(request(1, "u1", 10, 12)).await.unwrap();
    // Back-to-back on the same room.
    ledger.create(request(1, "u2", 12, 14)).await.unwrap();
    // Same slot, different room.
    ledger.create(request(2, "u3", 10, 12)).await.unwrap();
    // Same slot, same room, different date.
    let mut other_day = request(1, "u4", 10, 12);
    other_day.date = day(2025, 6, 21);
    ledger.create(other_day).await.unwrap();
}

#[tokio::test]
async fn inactive_room_is_not_bookable() {
    let ledger = ledger();
    let err = ledger.create(request(6, "u1", 10, 11)).await.unwrap_err();
    assert_eq!(err, LedgerError::RoomNotFound(6));
}

#[tokio::test]
async fn find_available_rooms_filters_capacity_and_conflicts() {
    let ledger = ledger();
    let date = day(2025, 6, 20);
    let slot = Slot::new(ClockTime::from_hm(14, 0), ClockTime::from_hm(15, 0));

    let rooms = ledger.find_available_rooms(date, slot, 4).await;
    let ids: Vec<u32> = rooms.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![1, 2, 4, 5]);

    ledger.create(request(1, "u1", 14, 15)).await.unwrap();
    let rooms = ledger.find_available_rooms(date, slot, 4).await;
    let ids: Vec<u32> = rooms.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 4, 5]);

    // Nobody fits 50 people.
    assert!(ledger.find_available_rooms(date, slot, 50).await.is_empty());
}

#[tokio::test]
async fn cancel_requires_matching_user() {
    let ledger = ledger();
    let booking = ledger.create(request(1, "u1", 10, 11)).await.unwrap();
    assert!(!ledger.cancel(&booking.confirmation_code, "someone-else").await);
    assert!(ledger.cancel(&booking.confirmation_code, "u1").await);
    let stored = ledger.booking_by_code(&booking.confirmation_code).await.unwrap();
    assert_eq!(stored.status, BookingStatus::Cancelled);
    // Cancelling again finds no confirmed match.
    assert!(!ledger.cancel(&booking.confirmation_code, "u1").await);
    // The slot opens up again.
    ledger.create(request(1, "u2", 10, 11)).await.unwrap();
    assert!(!ledger.cancel("BK-DOESNOTX", "u1").await);
}

#[tokio::test]
async fn user_bookings_sorted_and_filtered() {
    let ledger = ledger();
    let late = ledger.create(request(1, "u1", 15, 16)).await.unwrap();
    let early = ledger.create(request(2, "u1", 9, 10)).await.unwrap();
    ledger.create(request(3, "other", 9, 10)).await.unwrap();
    ledger.cancel(&late.confirmation_code, "u1").await;

    let mine = ledger.user_bookings("u1").await;
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, early.id);
}

#[tokio::test]
async fn booking_details_render_the_fixed_layout() {
    let ledger = ledger();
    let booking = ledger.create(request(1, "u1", 14, 16)).await.unwrap();
    let details = ledger.format_booking_details(&booking);
    assert!(details.starts_with("Room: Whitmore Library 101 (Floor 1)"));
    assert!(details.contains("Date: Friday, June 20, 2025"));
    assert!(details.contains("Time: 2:00 PM - 4:00 PM"));
    assert!(details.contains("Capacity: 4 people"));
    assert!(details.contains(&format!("Confirmation Code: {}", booking.confirmation_code)));
}

// ── Conversation flow ────────────────────────────────────────

fn engine() -> DialogueEngine {
    let catalog = Arc::new(Catalog::new());
    let ledger = Arc::new(BookingLedger::new(catalog.clone()));
    DialogueEngine::new(catalog, ledger)
}

fn msg(session: &str, text: &str) -> UserQuery {
    UserQuery {
        text: text.to_string(),
        user_id: Some("student-1".to_string()),
        user_type: None,
        session_id: Some(session.to_string()),
        user_email: None,
    }
}

async fn say(engine: &DialogueEngine, session: &str, text: &str) -> AiResponse {
    engine.handle(&msg(session, text)).await
}

#[tokio::test]
async fn full_booking_flow_reaches_confirmation() {
    let engine = engine();
    let s = "flow-1";

    let r = say(&engine, s, "I need to book a study room").await;
    assert_eq!(r.intent, "room_booking_purpose");
    assert!(engine.has_active_conversation(s));

    let r = say(&engine, s, "group project").await;
    assert_eq!(r.intent, "room_booking_attendees");

    let r = say(&engine, s, "4").await;
    assert_eq!(r.intent, "room_booking_location");

    let r = say(&engine, s, "Whitmore Library").await;
    assert_eq!(r.intent, "room_booking_date");

    let r = say(&engine, s, "tomorrow").await;
    assert_eq!(r.intent, "room_booking_time");

    let r = say(&engine, s, "2pm").await;
    assert_eq!(r.intent, "room_booking_duration");

    let r = say(&engine, s, "1 hour").await;
    assert_eq!(r.intent, "room_booking_options");
    assert!(r.text.contains("1. Whitmore Library Room 101"));

    let r = say(&engine, s, "1").await;
    assert_eq!(r.intent, "room_booking_confirmation");
    assert!(r.text.contains("2:00 PM to 3:00 PM"));

    let r = say(&engine, s, "yes").await;
    assert_eq!(r.intent, "room_booking_success");
    assert!(r.text.contains("BK-"));
    // Terminal stage clears the session.
    assert!(!engine.has_active_conversation(s));
}

#[tokio::test]
async fn time_range_skips_the_duration_step() {
    let engine = engine();
    let s = "flow-2";
    say(&engine, s, "book a room").await;
    say(&engine, s, "meeting").await;
    say(&engine, s, "2").await;
    say(&engine, s, "anywhere").await;
    say(&engine, s, "tomorrow").await;
    let r = say(&engine, s, "from 2pm to 4pm").await;
    assert_eq!(r.intent, "room_booking_options");
}

#[tokio::test]
async fn duration_past_midnight_reprompts() {
    let engine = engine();
    let s = "flow-7";
    say(&engine, s, "book a room").await;
    say(&engine, s, "late review session").await;
    say(&engine, s, "3").await;
    say(&engine, s, "anywhere").await;
    say(&engine, s, "tomorrow").await;
    let r = say(&engine, s, "11pm").await;
    assert_eq!(r.intent, "room_booking_duration");

    // 11pm + 3 hours would wrap past midnight.
    let r = say(&engine, s, "3 hours").await;
    assert_eq!(r.intent, "room_booking_duration_validation");
    assert!(r.text.contains("past midnight"));

    // So would ending exactly at midnight; a shorter duration goes through.
    let r = say(&engine, s, "1 hour").await;
    assert_eq!(r.intent, "room_booking_duration_validation");
    let r = say(&engine, s, "30 minutes").await;
    assert_eq!(r.intent, "room_booking_options");
    assert!(r.text.contains("from 11:00 PM to 11:30 PM"));
}

#[tokio::test]
async fn invalid_inputs_reprompt_without_losing_state() {
    let engine = engine();
    let s = "flow-3";
    say(&engine, s, "book a study room").await;
    say(&engine, s, "exam prep").await;

    let r = say(&engine, s, "a few of us").await;
    assert_eq!(r.intent, "room_booking_attendees_clarification");
    let r = say(&engine, s, "25").await;
    assert_eq!(r.intent, "room_booking_attendees_validation");
    let r = say(&engine, s, "7").await;
    assert_eq!(r.intent, "room_booking_location");

    say(&engine, s, "anywhere quiet").await;
    let r = say(&engine, s, "someday").await;
    assert_eq!(r.intent, "room_booking_date_clarification");
    say(&engine, s, "tomorrow").await;
    say(&engine, s, "10am").await;

    let r = say(&engine, s, "6 hours").await;
    assert_eq!(r.intent, "room_booking_duration_validation");
    let r = say(&engine, s, "2 hours").await;
    // Only Room 102 holds 7 people.
    assert_eq!(r.intent, "room_booking_options");
    assert!(r.text.contains("Room 102"));

    let r = say(&engine, s, "option 9").await;
    assert_eq!(r.intent, "room_booking_selection_clarification");
    let r = say(&engine, s, "room 102").await;
    assert_eq!(r.intent, "room_booking_confirmation");
}

#[tokio::test]
async fn cancel_interrupts_anywhere() {
    let engine = engine();
    let s = "flow-4";
    say(&engine, s, "book a room").await;
    say(&engine, s, "study session").await;
    let r = say(&engine, s, "actually, cancel that").await;
    assert_eq!(r.intent, "room_booking_cancelled");
    assert!(!engine.has_active_conversation(s));
}

#[tokio::test]
async fn decline_at_confirmation_cancels() {
    let engine = engine();
    let s = "flow-5";
    say(&engine, s, "book a room").await;
    say(&engine, s, "project").await;
    say(&engine, s, "3").await;
    say(&engine, s, "anywhere").await;
    say(&engine, s, "tomorrow").await;
    say(&engine, s, "from 9am to 10am").await;
    say(&engine, s, "1").await;
    let r = say(&engine, s, "no thanks").await;
    assert_eq!(r.intent, "room_booking_cancelled");
    assert!(!engine.has_active_conversation(s));
}

#[tokio::test]
async fn losing_the_race_returns_to_room_selection() {
    let catalog = Arc::new(Catalog::new());
    let ledger = Arc::new(BookingLedger::new(catalog.clone()));
    let engine = DialogueEngine::new(catalog, ledger.clone());

    for s in ["race-a", "race-b"] {
        say(&engine, s, "book a room").await;
        say(&engine, s, "project").await;
        say(&engine, s, "4").await;
        say(&engine, s, "library").await;
        say(&engine, s, "tomorrow").await;
        say(&engine, s, "from 2pm to 3pm").await;
        let r = say(&engine, s, "1").await;
        assert_eq!(r.intent, "room_booking_confirmation");
    }

    let r = say(&engine, "race-a", "yes").await;
    assert_eq!(r.intent, "room_booking_success");

    let r = say(&engine, "race-b", "yes, book it").await;
    assert_eq!(r.intent, "room_booking_availability_error");
    assert!(engine.has_active_conversation("race-b"));

    // The next turn re-searches; the taken room is gone from the list.
    let r = say(&engine, "race-b", "show me").await;
    assert_eq!(r.intent, "room_booking_options");
    assert!(!r.text.contains("Room 101"));
    let r = say(&engine, "race-b", "1").await;
    assert_eq!(r.intent, "room_booking_confirmation");
    let r = say(&engine, "race-b", "confirm").await;
    assert_eq!(r.intent, "room_booking_success");
}

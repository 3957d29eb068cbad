//! Multi-turn room booking conversations.
//!
//! Each session owns one [`Conversation`] behind an async mutex, so turns
//! within a session are strictly serialized while different sessions proceed
//! concurrently. The ledger does its own atomic re-check at confirmation, so
//! two sessions racing for the same room cannot double-book.

mod error;
pub mod extract;
mod ledger;
#[cfg(test)]
mod tests;

pub use error::LedgerError;
pub use ledger::BookingLedger;

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Local, NaiveDate};
use dashmap::DashMap;
use metrics::gauge;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::limits::{
    MAX_ADVANCE_DAYS, MAX_ATTENDEES, MAX_DURATION_HOURS, MIN_ATTENDEES, MIN_DURATION_HOURS,
    SAME_DAY_LEAD_MINUTES, SESSION_IDLE_TIMEOUT_SECS,
};
use crate::model::{AiResponse, BookingRequest, ClockTime, Slot, StudyRoom, UserQuery, UserType};
use crate::observability;
use crate::occupancy::clock_of;

const SOURCE: &str = "Room Booking Service";
const CANCEL_WORDS: [&str; 3] = ["cancel", "stop", "nevermind"];
const AFFIRMATIVES: [&str; 4] = ["yes", "confirm", "book it", "looks good"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Initial,
    AwaitingPurpose,
    AwaitingAttendees,
    AwaitingLocation,
    AwaitingDate,
    AwaitingTime,
    AwaitingDuration,
    AwaitingRoomSelection,
    AwaitingConfirmation,
    Completed,
    Cancelled,
}

#[derive(Debug)]
struct Conversation {
    stage: Stage,
    purpose: Option<String>,
    attendees: Option<u32>,
    preferred_location: Option<String>,
    date: Option<NaiveDate>,
    start: Option<ClockTime>,
    end: Option<ClockTime>,
    /// Room ids exactly as last presented; option numbers index into this.
    candidates: Vec<u32>,
    selected_room: Option<u32>,
    last_activity: Instant,
}

impl Conversation {
    fn new() -> Self {
        Conversation {
            stage: Stage::Initial,
            purpose: None,
            attendees: None,
            preferred_location: None,
            date: None,
            start: None,
            end: None,
            candidates: Vec::new(),
            selected_room: None,
            last_activity: Instant::now(),
        }
    }

    fn touch(&mut self) {
        self.last_activity = Instant::now();
    }
}

pub struct DialogueEngine {
    catalog: Arc<Catalog>,
    ledger: Arc<BookingLedger>,
    sessions: DashMap<String, Arc<Mutex<Conversation>>>,
}

impl DialogueEngine {
    pub fn new(catalog: Arc<Catalog>, ledger: Arc<BookingLedger>) -> Self {
        DialogueEngine {
            catalog,
            ledger,
            sessions: DashMap::new(),
        }
    }

    /// Whether this session is mid-flow; expired conversations don't count.
    pub fn has_active_conversation(&self, session_id: &str) -> bool {
        self.sessions.get(session_id).is_some_and(|entry| {
            entry
                .value()
                .try_lock()
                .map(|c| c.last_activity.elapsed() < idle_cutoff())
                .unwrap_or(true)
        })
    }

    /// Drop conversations idle past the timeout. Driven by the refresh task.
    pub fn sweep_idle(&self) {
        let cutoff = idle_cutoff();
        self.sessions.retain(|_, convo| match convo.try_lock() {
            Ok(c) => c.last_activity.elapsed() < cutoff,
            Err(_) => true,
        });
        gauge!(observability::SESSIONS_ACTIVE).set(self.sessions.len() as f64);
    }

    /// Advance one conversation by one user turn.
    pub async fn handle(&self, query: &UserQuery) -> AiResponse {
        let session_id = query.session().to_string();
        let lower = query.text.to_lowercase();

        // Cancellation wins over everything, even an unknown session.
        if CANCEL_WORDS.iter().any(|w| lower.contains(w)) {
            self.sessions.remove(&session_id);
            return cancelled_reply(query.category());
        }

        let convo_arc = self
            .sessions
            .entry(session_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(Conversation::new())))
            .clone();
        let mut convo = convo_arc.lock().await;

        if convo.last_activity.elapsed() >= idle_cutoff() {
            debug!(session = %session_id, "conversation expired, restarting");
            *convo = Conversation::new();
        }
        convo.touch();

        let now = Local::now();
        let response = self.step(&mut convo, query, &lower, now).await;

        if matches!(convo.stage, Stage::Completed | Stage::Cancelled) {
            drop(convo);
            self.sessions.remove(&session_id);
        }
        response
    }

    async fn step(
        &self,
        convo: &mut Conversation,
        query: &UserQuery,
        lower: &str,
        now: DateTime<Local>,
    ) -> AiResponse {
        match convo.stage {
            Stage::Initial | Stage::Completed | Stage::Cancelled => start_flow(convo),
            Stage::AwaitingPurpose => take_purpose(convo, query),
            Stage::AwaitingAttendees => take_attendees(convo, query, lower),
            Stage::AwaitingLocation => take_location(convo, query),
            Stage::AwaitingDate => take_date(convo, query, lower, now),
            Stage::AwaitingTime => self.take_time(convo, query, lower, now).await,
            Stage::AwaitingDuration => self.take_duration(convo, query, lower).await,
            Stage::AwaitingRoomSelection => self.take_selection(convo, query, lower).await,
            Stage::AwaitingConfirmation => self.take_confirmation(convo, query, lower).await,
        }
    }

    async fn take_time(
        &self,
        convo: &mut Conversation,
        query: &UserQuery,
        lower: &str,
        now: DateTime<Local>,
    ) -> AiResponse {
        let Some(time) = extract::parse_time(lower) else {
            return reply(
                "I'm having trouble understanding that time. Please provide a time like \
                 '2pm' or '14:00'.",
                "room_booking_time_clarification",
                query.category(),
                0.9,
            );
        };

        if let Some(date) = convo.date
            && !same_day_start_ok(date, time.start, now)
        {
            return reply(
                "For same-day bookings, the start time must be at least 15 minutes from now. \
                 Please choose a later time.",
                "room_booking_time_validation",
                query.category(),
                0.9,
            );
        }

        convo.start = Some(time.start);
        if let Some(end) = time.end {
            convo.end = Some(end);
            return self.present_options(convo, query).await;
        }

        convo.stage = Stage::AwaitingDuration;
        reply(
            format!(
                "Got it, starting at {}. How long do you need the room for? \
                 (e.g., 2 hours, 90 minutes)",
                time.start.display_12h()
            ),
            "room_booking_duration",
            query.category(),
            0.95,
        )
    }

    async fn take_duration(
        &self,
        convo: &mut Conversation,
        query: &UserQuery,
        lower: &str,
    ) -> AiResponse {
        let Some(hours) = extract::parse_duration(lower) else {
            return reply(
                "I'm having trouble understanding that duration. Please specify how long \
                 you need the room, like '2 hours' or '90 minutes'.",
                "room_booking_duration_clarification",
                query.category(),
                0.9,
            );
        };
        if !(MIN_DURATION_HOURS..=MAX_DURATION_HOURS).contains(&hours) {
            return reply(
                "Room bookings must be between 30 minutes and 4 hours. Please specify a \
                 valid duration.",
                "room_booking_duration_validation",
                query.category(),
                0.9,
            );
        }
        let Some(start) = convo.start else {
            return self.restart_with_apology(convo, query);
        };
        // add_minutes wraps at midnight; a wrapped end would invert the slot.
        let end = start.add_minutes((hours * 60.0).floor() as u32);
        if end <= start {
            return reply(
                "That booking would run past midnight. Please pick a shorter duration or \
                 an earlier start time.",
                "room_booking_duration_validation",
                query.category(),
                0.9,
            );
        }
        convo.end = Some(end);
        self.present_options(convo, query).await
    }

    /// Search for rooms matching the collected slots and present a numbered
    /// list. No availability sends the conversation back to the date step.
    async fn present_options(&self, convo: &mut Conversation, query: &UserQuery) -> AiResponse {
        let (Some(date), Some(start), Some(end)) = (convo.date, convo.start, convo.end) else {
            return self.restart_with_apology(convo, query);
        };
        let attendees = convo.attendees.unwrap_or(MIN_ATTENDEES);
        debug!(
            preferred_location = convo.preferred_location.as_deref().unwrap_or("none"),
            %date,
            attendees,
            "searching rooms"
        );

        let slot = Slot::new(start, end);
        let rooms = self.ledger.find_available_rooms(date, slot, attendees).await;
        if rooms.is_empty() {
            convo.stage = Stage::AwaitingDate;
            convo.candidates.clear();
            return reply(
                format!(
                    "I'm sorry, there are no rooms available that can accommodate {attendees} \
                     people on the date and time you requested. Would you like to try a \
                     different date or time?"
                ),
                "room_booking_no_availability",
                query.category(),
                0.95,
            );
        }

        convo.candidates = rooms.iter().map(|r| r.id).collect();
        convo.stage = Stage::AwaitingRoomSelection;

        let mut text = format!(
            "I found {} rooms available on {} from {} to {}:\n\n",
            rooms.len(),
            format_date(date),
            start.display_12h(),
            end.display_12h(),
        );
        for (i, room) in rooms.iter().enumerate() {
            text.push_str(&format!(
                "{}. {} Room {} (Floor {}) - Capacity: {}, Features: {}\n",
                i + 1,
                room.building,
                room.room_number,
                room.floor,
                room.capacity,
                room.feature_list(),
            ));
        }
        text.push_str(
            "\nWhich room would you like to book? (Please respond with the room number or \
             the option number)",
        );
        reply(text, "room_booking_options", query.category(), 0.95)
    }

    async fn take_selection(
        &self,
        convo: &mut Conversation,
        query: &UserQuery,
        lower: &str,
    ) -> AiResponse {
        // Candidates were cleared (e.g. after a lost race): search again.
        if convo.candidates.is_empty() {
            return self.present_options(convo, query).await;
        }

        let rooms: Vec<&'static StudyRoom> = convo
            .candidates
            .iter()
            .filter_map(|id| self.catalog.room(*id))
            .collect();

        let mut selected = extract::parse_option(lower)
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| rooms.get(i).copied());
        if selected.is_none()
            && let Some(number) = extract::parse_room_number(lower)
        {
            selected = rooms.iter().find(|r| r.room_number == number).copied();
        }
        if selected.is_none() {
            selected = rooms
                .iter()
                .find(|r| {
                    let phrase = format!("{} room {}", r.building.to_lowercase(), r.room_number);
                    lower.contains(&phrase) || lower.contains(&r.building.to_lowercase())
                })
                .copied();
        }

        let Some(room) = selected else {
            return reply(
                "I couldn't identify which room you'd like to book. Please select one of the \
                 options by number (e.g., '1' for the first option) or specify the room \
                 number (e.g., 'Room 101').",
                "room_booking_selection_clarification",
                query.category(),
                0.9,
            );
        };

        let (Some(date), Some(start), Some(end)) = (convo.date, convo.start, convo.end) else {
            return self.restart_with_apology(convo, query);
        };
        convo.selected_room = Some(room.id);
        convo.stage = Stage::AwaitingConfirmation;

        let details = format!(
            "Room: {} Room {} (Floor {})\n\
             Date: {}\n\
             Time: {} to {}\n\
             Capacity: {} people\n\
             Features: {}",
            room.building,
            room.room_number,
            room.floor,
            format_date(date),
            start.display_12h(),
            end.display_12h(),
            room.capacity,
            room.feature_list(),
        );
        reply(
            format!(
                "Great choice! Here are your booking details:\n\n{details}\n\n\
                 Would you like to confirm this booking? (yes/no)"
            ),
            "room_booking_confirmation",
            query.category(),
            0.95,
        )
    }

    async fn take_confirmation(
        &self,
        convo: &mut Conversation,
        query: &UserQuery,
        lower: &str,
    ) -> AiResponse {
        if !AFFIRMATIVES.iter().any(|w| lower.contains(w)) {
            convo.stage = Stage::Cancelled;
            return cancelled_reply(query.category());
        }

        let (Some(date), Some(start), Some(end), Some(room_id)) =
            (convo.date, convo.start, convo.end, convo.selected_room)
        else {
            return self.restart_with_apology(convo, query);
        };

        let request = BookingRequest {
            room_id,
            user_id: query
                .user_id
                .clone()
                .unwrap_or_else(|| query.session().to_string()),
            user_email: query.user_email.clone(),
            date,
            slot: Slot::new(start, end),
            purpose: convo.purpose.clone(),
            attendees: convo.attendees,
        };

        match self.ledger.create(request).await {
            Ok(booking) => {
                convo.stage = Stage::Completed;
                let details = self.ledger.format_booking_details(&booking);
                reply(
                    format!(
                        "Your room has been successfully booked!\n\n{details}\n\n\
                         Your booking is confirmed. You'll receive a confirmation at your \
                         email if you've provided one."
                    ),
                    "room_booking_success",
                    query.category(),
                    0.98,
                )
            }
            Err(LedgerError::RoomUnavailable(_)) => {
                // Someone else took the slot mid-conversation. Keep the
                // date/time/attendees and offer a fresh search.
                convo.stage = Stage::AwaitingRoomSelection;
                convo.candidates.clear();
                convo.selected_room = None;
                reply(
                    "I'm sorry, it looks like this room was just booked by someone else \
                     while we were talking. Would you like to see other available rooms?",
                    "room_booking_availability_error",
                    query.category(),
                    0.9,
                )
            }
            Err(err) => {
                warn!(error = %err, "booking failed");
                self.restart_with_apology(convo, query)
            }
        }
    }

    fn restart_with_apology(&self, convo: &mut Conversation, query: &UserQuery) -> AiResponse {
        *convo = Conversation::new();
        reply(
            "I'm sorry, some of the booking information is missing. Let's start over. \
             When would you like to book a study room?",
            "room_booking_error",
            query.category(),
            0.9,
        )
    }
}

fn start_flow(convo: &mut Conversation) -> AiResponse {
    *convo = Conversation::new();
    convo.stage = Stage::AwaitingPurpose;
    reply(
        "I'd be happy to help you book a study room. What is the purpose of your booking? \
         (e.g., group project, individual study, meeting)",
        "room_booking_purpose",
        UserType::Student,
        0.98,
    )
}

fn take_purpose(convo: &mut Conversation, query: &UserQuery) -> AiResponse {
    convo.purpose = Some(query.text.clone());
    convo.stage = Stage::AwaitingAttendees;
    reply(
        format!(
            "Great! Your booking is for \"{}\". How many people will be using the room?",
            query.text
        ),
        "room_booking_attendees",
        query.category(),
        0.95,
    )
}

fn take_attendees(convo: &mut Conversation, query: &UserQuery, lower: &str) -> AiResponse {
    let Some(count) = extract::parse_count(lower) else {
        return reply(
            "I need to know how many people will be using the room. Please provide a \
             number, like '3' or '4 people'.",
            "room_booking_attendees_clarification",
            query.category(),
            0.9,
        );
    };
    if !(MIN_ATTENDEES..=MAX_ATTENDEES).contains(&count) {
        return reply(
            "Please specify a reasonable number of people (1-20).",
            "room_booking_attendees_validation",
            query.category(),
            0.9,
        );
    }
    convo.attendees = Some(count);
    convo.stage = Stage::AwaitingLocation;
    reply(
        format!(
            "Got it, {count} people will be attending. Do you have a preferred location on \
             campus? (e.g., Whitmore Library, Atrium Commons, Science Center)"
        ),
        "room_booking_location",
        query.category(),
        0.95,
    )
}

fn take_location(convo: &mut Conversation, query: &UserQuery) -> AiResponse {
    convo.preferred_location = Some(query.text.clone());
    convo.stage = Stage::AwaitingDate;
    reply(
        format!(
            "Perfect! I'll note your location preference for \"{}\". What date would you \
             like to book? (e.g., tomorrow, next Friday, March 30)",
            query.text
        ),
        "room_booking_date",
        query.category(),
        0.95,
    )
}

fn take_date(
    convo: &mut Conversation,
    query: &UserQuery,
    lower: &str,
    now: DateTime<Local>,
) -> AiResponse {
    let today = now.date_naive();
    let Some(date) = extract::parse_date(lower, today) else {
        return reply(
            "I'm having trouble understanding that date. Please provide a date like \
             'tomorrow', 'next Friday', or 'March 30'.",
            "room_booking_date_clarification",
            query.category(),
            0.9,
        );
    };
    if !date_in_range(date, today) {
        return reply(
            "I can only book rooms for today or future dates. Please provide a valid date.",
            "room_booking_date_validation",
            query.category(),
            0.9,
        );
    }
    convo.date = Some(date);
    convo.stage = Stage::AwaitingTime;
    reply(
        format!(
            "Great! You want to book a room on {}. What time would you like to start? \
             (e.g., 2pm, 14:00)",
            format_date(date)
        ),
        "room_booking_time",
        query.category(),
        0.95,
    )
}

fn cancelled_reply(category: UserType) -> AiResponse {
    reply(
        "I've cancelled the room booking process. Is there something else I can help \
         you with?",
        "room_booking_cancelled",
        category,
        0.98,
    )
}

fn reply(text: impl Into<String>, intent: &str, category: UserType, confidence: f32) -> AiResponse {
    AiResponse::new(text, intent, category, confidence, SOURCE).with_subcategory("study_rooms")
}

fn idle_cutoff() -> Duration {
    Duration::from_secs(SESSION_IDLE_TIMEOUT_SECS)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%A, %B %-d, %Y").to_string()
}

/// Bookings are accepted from today up to 30 days out.
fn date_in_range(date: NaiveDate, today: NaiveDate) -> bool {
    date >= today && date - today <= chrono::Duration::days(MAX_ADVANCE_DAYS)
}

/// Same-day bookings need a little lead time; future dates are unrestricted.
fn same_day_start_ok(date: NaiveDate, start: ClockTime, now: DateTime<Local>) -> bool {
    if date != now.date_naive() {
        return true;
    }
    let minimum = clock_of(now + chrono::Duration::minutes(SAME_DAY_LEAD_MINUTES));
    // A lead time that crosses midnight can't be satisfied today.
    if minimum < clock_of(now) {
        return false;
    }
    start >= minimum
}

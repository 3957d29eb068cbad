//! Top-level intent routing.
//!
//! Every inbound message passes through [`Assistant::handle_message`], which
//! decides between the booking dialogue, the campus advisor, a handful of
//! keyword replies, and the optional hosted-model escalation. Both sides of
//! the exchange are written to the transcript store.

use std::sync::Arc;
use std::time::Instant;

use chrono::Local;
use metrics::{counter, histogram};
use tracing::{debug, warn};

use crate::advisor::{self, Advisor};
use crate::dialogue::DialogueEngine;
use crate::history::{turn, TranscriptStore};
use crate::llm::LlmClient;
use crate::model::{AiResponse, Role, Turn, UserQuery};
use crate::observability;
use crate::occupancy::{InsightThrottle, OccupancySimulator};

const SOURCE: &str = "Campus Assistant";

const BOOKING_VERBS: [&str; 5] = ["book", "reserve", "need", "want", "looking for"];
const BOOKING_OBJECTS: [&str; 4] = ["study room", "room", "study space", "place to study"];
const GREETINGS: [&str; 3] = ["hello", "hi", "hey"];

/// Keyword-matched canned answers, checked in order.
const CANNED: [(&str, &str); 8] = [
    (
        "course",
        "To register for courses, log into the student portal and open \"Registration\". \
         From there you can search the catalog and add courses to your plan. Check for \
         prerequisites before finalizing your registration.",
    ),
    (
        "library",
        "Whitmore Library is open daily from 8am to midnight. It offers study spaces, \
         group study rooms, computer workstations, printers, and research help from \
         librarians. Online resources are available off-campus with your university login.",
    ),
    (
        "portal",
        "The student portal is where you register for classes, view your academic record, \
         pay bills, and find campus resources. If you're having trouble signing in, \
         contact the IT Help Desk.",
    ),
    (
        "id card",
        "Your campus ID card gives you access to buildings, dining services, and printing. \
         You can add funds to it for purchases across campus. If you've lost your card, \
         visit the card office in the student union for a replacement.",
    ),
    (
        "appointment",
        "To schedule an appointment with academic advising, career services, or another \
         office, use the scheduling tool in the student portal or contact the office \
         directly.",
    ),
    (
        "shuttle",
        "The campus shuttle runs a fixed loop during the academic year, with reduced \
         service during breaks. Real-time shuttle positions are available in the transit \
         app linked from the student portal.",
    ),
    (
        "bus",
        "The regional transit authority runs several routes past campus. The nearest \
         stops are on the main road at the north and south gates, with buses roughly \
         every 30 minutes on weekdays. Students ride at a discounted fare with a valid ID.",
    ),
    (
        "dining hours",
        "Union Dining Hall serves daily from 7am to 9pm. The Atrium Cafe is open 7:30am \
         to 7pm, and the Science Cafe 8am to 5pm on weekdays.",
    ),
];

pub struct Assistant {
    dialogue: Arc<DialogueEngine>,
    advisor: Advisor,
    sim: Arc<OccupancySimulator>,
    history: Arc<dyn TranscriptStore>,
    llm: Option<Arc<dyn LlmClient>>,
    insight_throttle: InsightThrottle,
}

impl Assistant {
    pub fn new(
        dialogue: Arc<DialogueEngine>,
        sim: Arc<OccupancySimulator>,
        history: Arc<dyn TranscriptStore>,
        llm: Option<Arc<dyn LlmClient>>,
    ) -> Self {
        Assistant {
            dialogue,
            advisor: Advisor::new(sim.clone()),
            sim,
            history,
            llm,
            insight_throttle: InsightThrottle::new(),
        }
    }

    /// Route one message and record both turns of the exchange.
    pub async fn handle_message(&self, query: &UserQuery) -> AiResponse {
        let started = Instant::now();
        self.history
            .record(self.user_turn(query))
            .await;

        let response = self.route(query).await;

        self.history
            .record(self.assistant_turn(query, &response))
            .await;
        counter!(observability::MESSAGES_TOTAL, "intent" => response.intent.clone()).increment(1);
        histogram!(observability::MESSAGE_DURATION_SECONDS).record(started.elapsed().as_secs_f64());
        response
    }

    async fn route(&self, query: &UserQuery) -> AiResponse {
        let lower = query.text.to_lowercase();
        let session_id = query.session();

        let wants_booking = BOOKING_VERBS.iter().any(|w| lower.contains(w))
            && BOOKING_OBJECTS.iter().any(|w| lower.contains(w));
        if wants_booking || self.dialogue.has_active_conversation(session_id) {
            return self.dialogue.handle(query).await;
        }

        if advisor::is_campus_query(&query.text) {
            return self.advisor.handle(query, Local::now());
        }

        let category = query.category();
        if GREETINGS.iter().any(|w| lower.contains(w)) {
            return AiResponse::new(
                format!(
                    "Hello! I'm your {} assistant. How can I help you today?",
                    category.label()
                ),
                "greeting",
                category,
                0.8,
                SOURCE,
            );
        }
        if lower.contains("thank") {
            return AiResponse::new(
                "You're welcome! Let me know if you need anything else.",
                "gratitude",
                category,
                0.8,
                SOURCE,
            );
        }

        for (keyword, answer) in CANNED {
            if lower.contains(keyword) {
                return AiResponse::new(
                    answer,
                    &format!("{}_{}", category.label(), keyword.replace(' ', "_")),
                    category,
                    0.8,
                    SOURCE,
                );
            }
        }

        if let Some(llm) = &self.llm {
            match llm.complete(query).await {
                Ok(response) => return response,
                Err(err) => warn!(error = %err, "llm escalation failed"),
            }
        }

        debug!(text = %query.text, "no route matched");
        AiResponse::new(
            "I'm not sure how to help with that yet. I can book study rooms, tell you how \
             busy campus spots are, and answer common campus questions. Could you try \
             rephrasing?",
            "fallback",
            category,
            0.4,
            SOURCE,
        )
    }

    /// A proactive occupancy tip for this session, or None when the dice,
    /// the hour, or the per-session cooldown say no.
    pub fn ambient_insight(&self, session_id: &str) -> Option<String> {
        if !self.insight_throttle.ready(session_id) {
            return None;
        }
        let insight = self.sim.random_insight(Local::now())?;
        self.insight_throttle.mark(session_id);
        counter!(observability::INSIGHTS_SENT_TOTAL).increment(1);
        Some(insight)
    }

    pub async fn history(&self, user_id: &str, session_id: &str) -> Vec<Turn> {
        self.history.history(user_id, session_id).await
    }

    fn user_turn(&self, query: &UserQuery) -> Turn {
        let mut t = turn(query.user(), query.session(), Role::User, &query.text);
        t.category = Some(query.category());
        t
    }

    fn assistant_turn(&self, query: &UserQuery, response: &AiResponse) -> Turn {
        let mut t = turn(query.user(), query.session(), Role::Assistant, &response.text);
        t.intent = Some(response.intent.clone());
        t.category = Some(response.category);
        t
    }
}

//! Occupancy-aware answers to campus questions.
//!
//! Sits between the router and the simulator: classifies what the user is
//! asking about (a place, a best time, or a resource) and renders the
//! simulator's numbers into a conversational reply.

use std::sync::Arc;

use chrono::{DateTime, Local, Timelike};

use crate::model::{AiResponse, LocationKind, ResourceKind, UserQuery};
use crate::occupancy::{clock_of, OccupancySimulator};

const AMBIENT_SOURCE: &str = "Campus Ambient Intelligence System";
const TIME_SOURCE: &str = "Campus Time Pattern Analysis";
const RESOURCE_SOURCE: &str = "Campus Resource Monitoring";

const OCCUPANCY_WORDS: [&str; 11] = [
    "busy", "crowded", "quiet", "empty", "full", "available", "packed", "space", "spot",
    "best time", "when to",
];
const PLACE_WORDS: [&str; 10] = [
    "library", "study", "cafe", "dining", "hall", "commons", "computer", "lab", "printer", "room",
];

/// Whether a message is asking about campus occupancy rather than booking.
/// Needs both an occupancy word and a place word, or a "where do I ..." form.
pub fn is_campus_query(text: &str) -> bool {
    let lower = text.to_lowercase();
    let about_occupancy = OCCUPANCY_WORDS.iter().any(|w| lower.contains(w));
    let about_place = PLACE_WORDS.iter().any(|w| lower.contains(w));
    (about_occupancy && about_place)
        || (lower.contains("where")
            && (lower.contains("study") || lower.contains("eat") || lower.contains("print")))
}

pub struct Advisor {
    sim: Arc<OccupancySimulator>,
}

impl Advisor {
    pub fn new(sim: Arc<OccupancySimulator>) -> Self {
        Advisor { sim }
    }

    pub fn handle(&self, query: &UserQuery, now: DateTime<Local>) -> AiResponse {
        let lower = query.text.to_lowercase();

        if lower.contains("when") || lower.contains("best time") || lower.contains("time to") {
            return self.time_query(query, &lower, now);
        }
        if lower.contains("printer") || lower.contains("printing") {
            return self.resource_query(query, ResourceKind::Printer, now);
        }
        if lower.contains("computer") || (lower.contains("pc") && !lower.contains("space")) {
            return self.resource_query(query, ResourceKind::Computer, now);
        }

        // Library outranks study areas so plain "study" lands on the library.
        let kinds: [(LocationKind, &[&str]); 6] = [
            (LocationKind::Library, &["library", "book", "study"]),
            (LocationKind::Cafe, &["cafe", "coffee", "food"]),
            (LocationKind::Lab, &["lab", "computer"]),
            (LocationKind::StudyArea, &["study", "quiet", "space"]),
            (LocationKind::Printer, &["print"]),
            (LocationKind::Dining, &["eat", "dining", "food", "lunch", "dinner"]),
        ];
        for (kind, words) in kinds {
            if words.iter().any(|w| lower.contains(w)) {
                if kind == LocationKind::Printer {
                    return self.resource_query(query, ResourceKind::Printer, now);
                }
                return self.place_query(query, kind, now);
            }
        }

        self.general_occupancy(query, now)
    }

    fn place_query(&self, query: &UserQuery, kind: LocationKind, now: DateTime<Local>) -> AiResponse {
        let Some(rec) = self.sim.recommended_location(kind, now) else {
            return AiResponse::new(
                "I can provide information about campus occupancy and availability. What \
                 specifically would you like to know?",
                "campus_occupancy",
                query.category(),
                0.8,
                AMBIENT_SOURCE,
            );
        };

        let hour = now.hour();
        let prime_meal_time = (11..=13).contains(&hour) || (17..=19).contains(&hour);

        let text = match kind {
            LocationKind::Library | LocationKind::StudyArea => {
                let mut text = format!(
                    "Based on my campus sensors, {} is currently the best place to study. \
                     It's at {}% capacity. {}",
                    rec.name, rec.occupancy_percentage, rec.reason
                );
                if rec.occupancy_percentage > 70 {
                    let time_rec = self.sim.recommended_time(rec.location_id, now);
                    if time_rec.improvement_percentage > 20 {
                        text.push_str(&format!(
                            " If you can wait, coming back at {} would be {}% less crowded.",
                            format_hour(time_rec.hour),
                            time_rec.improvement_percentage
                        ));
                    }
                }
                if let Some(occ) = self.sim.occupancy(rec.location_id)
                    && let Some(quietest) = occ.floors.iter().min_by_key(|f| f.count)
                {
                    text.push_str(&format!(
                        " The {} is the quietest area with only about {} people right now.",
                        quietest.floor, quietest.count
                    ));
                }
                text
            }
            LocationKind::Cafe | LocationKind::Dining => {
                if prime_meal_time {
                    let mut text = format!(
                        "It's peak hours, but {} currently has the shortest lines ({}% \
                         capacity). {}",
                        rec.name, rec.occupancy_percentage, rec.reason
                    );
                    if rec.occupancy_percentage > 80 {
                        let time_rec = self.sim.recommended_time(rec.location_id, now);
                        if time_rec.improvement_percentage > 20 {
                            text.push_str(&format!(
                                " If you can wait, coming back at {} would be {}% less crowded.",
                                format_hour(time_rec.hour),
                                time_rec.improvement_percentage
                            ));
                        }
                    }
                    text
                } else {
                    format!(
                        "Good timing! {} is not very busy right now ({}% capacity). {}",
                        rec.name, rec.occupancy_percentage, rec.reason
                    )
                }
            }
            LocationKind::Lab => {
                let computers = self
                    .sim
                    .resource_availability(ResourceKind::Computer)
                    .into_iter()
                    .find(|r| r.location_id == rec.location_id);
                match computers {
                    Some(c) => format!(
                        "{} is your best option with {} computers available out of {}. It's \
                         at {}% capacity overall. {}",
                        rec.name, c.available, c.total, rec.occupancy_percentage, rec.reason
                    ),
                    None => format!(
                        "{} is currently at {}% capacity. {}",
                        rec.name, rec.occupancy_percentage, rec.reason
                    ),
                }
            }
            LocationKind::Printer => unreachable!("printer queries go to resource_query"),
        };

        AiResponse::new(
            text,
            &format!("campus_{}_recommendation", kind_key(kind)),
            query.category(),
            0.9,
            AMBIENT_SOURCE,
        )
    }

    fn time_query(&self, query: &UserQuery, lower: &str, now: DateTime<Local>) -> AiResponse {
        let places: [(&str, &[&str]); 4] = [
            ("whitmore-library", &["library", "whitmore"]),
            ("atrium-cafe", &["cafe", "coffee", "atrium"]),
            ("union-dining", &["dining", "dining hall", "food", "eat"]),
            ("main-computer-lab", &["lab", "computer lab", "computer"]),
        ];
        let location_id = places
            .iter()
            .find(|(_, words)| words.iter().any(|w| lower.contains(w)))
            .map(|(id, _)| *id)
            .unwrap_or("whitmore-library");

        let Some(location) = self.sim.catalog().location(location_id) else {
            return AiResponse::new(
                "I'm not sure which location you're asking about. Could you specify a campus \
                 location like the library, cafe, or dining hall?",
                "campus_time_recommendation_error",
                query.category(),
                0.5,
                AMBIENT_SOURCE,
            );
        };

        let rec = self.sim.recommended_time(location_id, now);
        let text = if rec.improvement_percentage > 0 {
            let mut text = format!(
                "Based on typical daily patterns, the best time to visit {} today would be \
                 around {}. It should be {}% less crowded than right now.",
                location.name,
                format_hour(rec.hour),
                rec.improvement_percentage
            );
            if let Some(occ) = self.sim.occupancy(location_id) {
                text.push_str(&format!(" Currently, it's at {}% capacity.", occ.percentage()));
            }
            text
        } else {
            format!(
                "{} The current occupancy level at {} is already optimal.",
                rec.reason, location.name
            )
        };

        AiResponse::new(text, "campus_time_recommendation", query.category(), 0.9, TIME_SOURCE)
    }

    fn resource_query(
        &self,
        query: &UserQuery,
        kind: ResourceKind,
        now: DateTime<Local>,
    ) -> AiResponse {
        let intent = format!("campus_{}_availability", kind_key_resource(kind));
        let sites = self.sim.resource_availability(kind);
        if sites.is_empty() {
            return AiResponse::new(
                format!(
                    "I don't have information about {} availability right now.",
                    kind.label()
                ),
                &intent,
                query.category(),
                0.7,
                RESOURCE_SOURCE,
            );
        }

        let text = match kind {
            ResourceKind::Printer => {
                let mut text =
                    "Here's where you can find available printers right now:\n\n".to_string();
                for (i, site) in sites.iter().take(3).enumerate() {
                    text.push_str(&format!(
                        "{}. {}: {} out of {} printers available\n",
                        i + 1,
                        site.name,
                        site.available,
                        site.total
                    ));
                }
                text.push_str(
                    "\nPro tip: Printers are usually less busy early in the morning (before \
                     9AM) or in the evening after 7PM.",
                );
                text
            }
            ResourceKind::Computer => {
                let best = &sites[0];
                let mut text = format!(
                    "{} has the most computers available right now ({} out of {}).",
                    best.name, best.available, best.total
                );
                if let Some(runner_up) = sites.get(1)
                    && runner_up.available > 3
                {
                    text.push_str(&format!(
                        " Alternatively, {} has {} computers available.",
                        runner_up.name, runner_up.available
                    ));
                }
                if let Some(occ) = self.sim.occupancy(best.location_id) {
                    text.push_str(&format!(
                        " The overall space is at {}% capacity.",
                        occ.percentage()
                    ));
                }
                if best.available < 5 {
                    let time_rec = self.sim.recommended_time(best.location_id, now);
                    if time_rec.improvement_percentage > 20 {
                        text.push_str(&format!(
                            " If you can wait, coming at {} typically has {}% better computer \
                             availability.",
                            format_hour(time_rec.hour),
                            time_rec.improvement_percentage
                        ));
                    }
                }
                text
            }
            ResourceKind::StudyRoom => {
                let mut text = format!(
                    "I have information about {} {} locations.",
                    sites.len(),
                    kind.label()
                );
                for (i, site) in sites.iter().take(3).enumerate() {
                    text.push_str(&format!(
                        "\n{}. {}: {} out of {} available",
                        i + 1,
                        site.name,
                        site.available,
                        site.total
                    ));
                }
                text
            }
        };

        AiResponse::new(text, &intent, query.category(), 0.95, RESOURCE_SOURCE)
    }

    /// No particular place mentioned: list the three least crowded study
    /// spaces that are open right now.
    fn general_occupancy(&self, query: &UserQuery, now: DateTime<Local>) -> AiResponse {
        let clock = clock_of(now);
        let mut open: Vec<_> = self
            .sim
            .catalog()
            .locations_by_kind(LocationKind::StudyArea)
            .into_iter()
            .chain(self.sim.catalog().locations_by_kind(LocationKind::Library))
            .filter(|l| l.is_open_at(clock))
            .map(|l| {
                let ratio = self.sim.occupancy(l.id).map_or(1.0, |o| o.ratio());
                (l, ratio)
            })
            .collect();

        if open.is_empty() {
            return AiResponse::new(
                "I don't see any open study locations right now. Most campus facilities are \
                 closed at this hour.",
                "campus_occupancy",
                query.category(),
                0.8,
                AMBIENT_SOURCE,
            );
        }

        open.sort_by(|a, b| a.1.total_cmp(&b.1));
        let mut text = "Here are the least crowded study spaces on campus right now:\n\n".to_string();
        for (i, (location, ratio)) in open.iter().take(3).enumerate() {
            text.push_str(&format!(
                "{}. {}: {}% capacity",
                i + 1,
                location.name,
                (ratio * 100.0).round() as u32
            ));
            let labels: Vec<&str> = [
                ("quiet_zones", "quiet zones"),
                ("outlets", "outlets"),
                ("wifi", "WiFi"),
                ("computers", "computers"),
                ("group_study", "group study rooms"),
            ]
            .iter()
            .filter(|(feature, _)| location.has_feature(feature))
            .map(|(_, label)| *label)
            .collect();
            if !labels.is_empty() {
                text.push_str(&format!(" ({})", labels.join(", ")));
            }
            text.push('\n');
        }

        AiResponse::new(text, "campus_general_occupancy", query.category(), 0.8, AMBIENT_SOURCE)
    }
}

fn kind_key(kind: LocationKind) -> &'static str {
    match kind {
        LocationKind::Library => "library",
        LocationKind::Cafe => "cafe",
        LocationKind::Lab => "lab",
        LocationKind::StudyArea => "study_area",
        LocationKind::Printer => "printer",
        LocationKind::Dining => "dining",
    }
}

fn kind_key_resource(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Computer => "computer",
        ResourceKind::Printer => "printer",
        ResourceKind::StudyRoom => "study_room",
    }
}

fn format_hour(hour: u32) -> String {
    let h = if hour % 12 == 0 { 12 } else { hour % 12 };
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    format!("{h}{suffix}")
}

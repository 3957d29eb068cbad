//! Ambient campus tips pushed alongside normal replies.

use std::time::{Duration, Instant};

use chrono::{DateTime, Local, Timelike};
use dashmap::DashMap;
use rand::Rng;

use crate::catalog::POPULAR_LOCATION_IDS;
use crate::limits::{
    INSIGHT_CHANCE, INSIGHT_COOLDOWN_SECS, INSIGHT_HOUR_END, INSIGHT_HOUR_START,
    INSIGHT_MAP_PRUNE_THRESHOLD, INSIGHT_PRUNE_AGE_SECS,
};
use crate::model::{LocationKind, ResourceKind};

use super::OccupancySimulator;

impl OccupancySimulator {
    /// Roll for an ambient tip. `None` outside waking hours or when the dice
    /// roll or candidate search comes up empty.
    pub fn random_insight(&self, now: DateTime<Local>) -> Option<String> {
        let hour = now.hour();
        if !(INSIGHT_HOUR_START..=INSIGHT_HOUR_END).contains(&hour) {
            return None;
        }
        if !self.rng.lock().expect("rng lock").gen_bool(INSIGHT_CHANCE) {
            return None;
        }

        let mut insights: Vec<String> = Vec::new();

        // Unusually empty popular spot; one is enough.
        for id in POPULAR_LOCATION_IDS {
            if let Some(rec) = self.occupancy(id)
                && let Some(loc) = self.catalog().location(id)
                && rec.ratio() < 0.3
            {
                insights.push(format!(
                    "💡 Insider tip: {} is unusually empty right now ({}% capacity). \
                     Perfect time to grab a spot!",
                    loc.name,
                    rec.percentage()
                ));
                break;
            }
        }

        // Free machines nobody noticed.
        if let Some(site) = self
            .resource_availability(ResourceKind::Computer)
            .into_iter()
            .find(|s| s.available > 5)
        {
            insights.push(format!(
                "💡 Computer tip: {} has {} open computers right now. \
                 Most students don't realize this.",
                site.name, site.available
            ));
        }
        if let Some(site) = self
            .resource_availability(ResourceKind::Printer)
            .into_iter()
            .find(|s| s.available > 0)
        {
            insights.push(format!(
                "💡 Printing tip: {} has {} available printers with no waiting. \
                 Quick trip there could save you time!",
                site.name, site.available
            ));
        }

        // Crowded spot with a quieter same-kind alternative.
        if let Some(busy_loc) = self
            .all_occupancy()
            .into_iter()
            .filter(|rec| rec.ratio() > 0.8)
            .find_map(|rec| self.catalog().location(rec.location_id))
            && let Some(alt) = self.all_occupancy().into_iter().find_map(|rec| {
                let loc = self.catalog().location(rec.location_id)?;
                (loc.kind == busy_loc.kind && loc.id != busy_loc.id && rec.ratio() < 0.5)
                    .then_some(loc)
            })
        {
            insights.push(format!(
                "💡 FYI: {} is very crowded right now. {} is a great alternative \
                 with plenty of space.",
                busy_loc.name, alt.name
            ));
        }

        let hour12 = match hour % 12 {
            0 => 12,
            h => h,
        };
        let meridiem = if hour >= 12 { "PM" } else { "AM" };

        if (11..13).contains(&hour)
            && let Some(entry) = self
                .heatmap()
                .into_iter()
                .filter(|e| {
                    self.catalog().location(e.location_id).is_some_and(|l| {
                        matches!(l.kind, LocationKind::Dining | LocationKind::Cafe)
                    })
                })
                .min_by(|a, b| a.occupancy.total_cmp(&b.occupancy))
        {
            insights.push(format!(
                "💡 Lunch tip: At {hour12}{meridiem}, {} has the shortest lines right now \
                 ({}% capacity).",
                entry.name,
                (entry.occupancy * 100.0).round() as u32
            ));
        }

        if (16..20).contains(&hour)
            && let Some(entry) = self
                .heatmap()
                .into_iter()
                .filter(|e| {
                    self.catalog().location(e.location_id).is_some_and(|l| {
                        matches!(l.kind, LocationKind::Library | LocationKind::StudyArea)
                    })
                })
                .min_by(|a, b| a.occupancy.total_cmp(&b.occupancy))
        {
            insights.push(format!(
                "💡 Evening study tip: {} is the least crowded study space right now \
                 ({}% capacity).",
                entry.name,
                (entry.occupancy * 100.0).round() as u32
            ));
        }

        // Basement hidden gem, shown sparingly.
        let basements: Vec<_> = self
            .catalog()
            .locations()
            .iter()
            .filter(|l| l.floor_desc.to_lowercase().contains("basement"))
            .collect();
        if !basements.is_empty() {
            let mut rng = self.rng.lock().expect("rng lock");
            if rng.gen_bool(0.3) {
                let pick = basements[rng.gen_range(0..basements.len())];
                insights.push(format!(
                    "💡 Hidden gem: Most students don't know about the study spaces in {}. \
                     It's usually much quieter than main areas.",
                    pick.name
                ));
            }
        }

        if insights.is_empty() {
            return None;
        }
        let idx = self
            .rng
            .lock()
            .expect("rng lock")
            .gen_range(0..insights.len());
        Some(insights.swap_remove(idx))
    }
}

/// Per-session insight rate limiting.
#[derive(Default)]
pub struct InsightThrottle {
    last_sent: DashMap<String, Instant>,
}

impl InsightThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the session has not seen an insight within the cooldown.
    pub fn ready(&self, session_id: &str) -> bool {
        self.last_sent
            .get(session_id)
            .is_none_or(|t| t.elapsed() >= Duration::from_secs(INSIGHT_COOLDOWN_SECS))
    }

    /// Record a delivered insight and prune stale sessions once the map grows.
    pub fn mark(&self, session_id: &str) {
        self.last_sent.insert(session_id.to_string(), Instant::now());
        if self.last_sent.len() > INSIGHT_MAP_PRUNE_THRESHOLD {
            let cutoff = Duration::from_secs(INSIGHT_PRUNE_AGE_SECS);
            self.last_sent.retain(|_, t| t.elapsed() < cutoff);
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.last_sent.len()
    }
}

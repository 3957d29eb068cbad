//! Synthetic occupancy engine.
//!
//! Keeps one [`OccupancyRecord`] per campus location, seeded from the weekly
//! pattern matrix and drifted toward the time-of-day target on every tick.
//! No real sensors anywhere; the records are the authoritative state.

mod insight;
mod patterns;
mod recommend;
#[cfg(test)]
mod tests;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Datelike, Local, Timelike};
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::catalog::Catalog;
use crate::limits::{COUNT_JITTER, DRIFT_RATE_PER_MINUTE};
use crate::model::{
    ClockTime, FloorOccupancy, Location, LocationKind, OccupancyRecord, ResourceAvailability,
    ResourceKind,
};

pub use insight::InsightThrottle;
pub use patterns::WeekPattern;

/// Minute-of-day projection of a local timestamp.
pub fn clock_of(now: DateTime<Local>) -> ClockTime {
    ClockTime::from_hm(now.hour() as u16, now.minute() as u16)
}

pub struct OccupancySimulator {
    catalog: Arc<Catalog>,
    records: DashMap<&'static str, OccupancyRecord>,
    patterns: HashMap<&'static str, WeekPattern>,
    rng: Mutex<StdRng>,
    last_tick: Mutex<DateTime<Local>>,
}

impl OccupancySimulator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_rng(catalog, StdRng::from_entropy(), Local::now())
    }

    /// Deterministic constructor for tests: fixed rng seed and clock.
    pub fn with_rng(catalog: Arc<Catalog>, mut rng: StdRng, now: DateTime<Local>) -> Self {
        let patterns = catalog
            .locations()
            .iter()
            .map(|loc| (loc.id, patterns::build_week_pattern(loc.kind, &mut rng)))
            .collect();

        let sim = OccupancySimulator {
            catalog,
            records: DashMap::new(),
            patterns,
            rng: Mutex::new(rng),
            last_tick: Mutex::new(now),
        };
        sim.seed_records(now);
        sim
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn occupancy(&self, location_id: &str) -> Option<OccupancyRecord> {
        self.records.get(location_id).map(|r| r.clone())
    }

    pub fn all_occupancy(&self) -> Vec<OccupancyRecord> {
        self.records.iter().map(|e| e.value().clone()).collect()
    }

    /// Occupied fraction from the pattern matrix for `loc` at `now`, zero
    /// whenever the location is closed.
    pub(super) fn base_occupancy(&self, loc: &Location, now: DateTime<Local>) -> f64 {
        if !loc.is_open_at(clock_of(now)) {
            return 0.0;
        }
        let day = now.weekday().num_days_from_sunday() as usize;
        let hour = now.hour() as usize;
        match self.patterns.get(loc.id) {
            Some(week) => week[day][hour],
            None => patterns::fallback_curve(loc.kind, hour as u32),
        }
    }

    pub(super) fn pattern(&self, location_id: &str) -> Option<&WeekPattern> {
        self.patterns.get(location_id)
    }

    fn seed_records(&self, now: DateTime<Local>) {
        for loc in self.catalog.locations() {
            let base = self.base_occupancy(loc, now);
            let count = {
                let mut rng = self.rng.lock().expect("rng lock");
                let factor = 1.0 + rng.gen_range(-0.1..0.1);
                ((loc.capacity as f64 * base * factor).floor() as i64)
                    .clamp(0, loc.capacity as i64) as u32
            };
            let record = self.build_record(loc, count, now);
            self.records.insert(loc.id, record);
        }
    }

    /// One simulation tick: drift each head count toward the time-of-day
    /// target, add jitter, clamp, and regenerate the per-floor and
    /// per-resource breakdowns.
    pub fn refresh(&self, now: DateTime<Local>) {
        let minutes = {
            let mut last = self.last_tick.lock().expect("last_tick lock");
            let elapsed = (now - *last).num_seconds() as f64 / 60.0;
            *last = now;
            elapsed.max(0.0)
        };

        for loc in self.catalog.locations() {
            let Some(current) = self.records.get(loc.id).map(|r| r.current_count) else {
                continue;
            };
            let target = self.base_occupancy(loc, now) * loc.capacity as f64;
            let drift = (target - current as f64) * DRIFT_RATE_PER_MINUTE * minutes;
            let jitter = self
                .rng
                .lock()
                .expect("rng lock")
                .gen_range(-COUNT_JITTER..=COUNT_JITTER) as f64;
            let next = ((current as f64 + drift + jitter).floor() as i64)
                .clamp(0, loc.capacity as i64) as u32;

            let record = self.build_record(loc, next, now);
            self.records.insert(loc.id, record);
        }
        debug!(elapsed_minutes = minutes, "occupancy refreshed");
    }

    fn build_record(&self, loc: &Location, count: u32, now: DateTime<Local>) -> OccupancyRecord {
        let mut rng = self.rng.lock().expect("rng lock");
        OccupancyRecord {
            location_id: loc.id,
            current_count: count,
            capacity: loc.capacity,
            updated_at: now,
            floors: Self::floor_breakdown(loc, count, &mut rng),
            resources: Self::resource_breakdown(loc, count, now, &mut rng),
        }
    }

    /// Spread `total` people over the named floors. Every floor but the last
    /// takes a random portion capped at an even share; the last floor absorbs
    /// whatever is left, so the counts always sum to `total`.
    fn floor_breakdown(loc: &Location, total: u32, rng: &mut StdRng) -> Vec<FloorOccupancy> {
        if loc.floors.is_empty() {
            return Vec::new();
        }
        let per_floor_cap = loc.capacity / loc.floors.len() as u32;
        let mut remaining = total;
        let mut out = Vec::with_capacity(loc.floors.len());

        for floor in &loc.floors[..loc.floors.len() - 1] {
            let portion: f64 = rng.gen_range(0.3..1.0);
            let count = ((remaining as f64 * portion).floor() as u32).min(per_floor_cap);
            out.push(FloorOccupancy { floor, count });
            remaining -= count;
        }
        out.push(FloorOccupancy {
            floor: loc.floors[loc.floors.len() - 1],
            count: remaining,
        });
        out
    }

    fn resource_breakdown(
        loc: &Location,
        count: u32,
        now: DateTime<Local>,
        rng: &mut StdRng,
    ) -> Vec<ResourceAvailability> {
        let mut out = Vec::new();
        let ratio = if loc.capacity == 0 {
            0.0
        } else {
            count as f64 / loc.capacity as f64
        };

        if loc.has_feature("computers") {
            let total = match loc.kind {
                LocationKind::Lab => (loc.capacity as f64 * 0.8) as u32,
                LocationKind::Library | LocationKind::StudyArea => {
                    (loc.capacity as f64 * 0.2) as u32
                }
                _ => (loc.capacity as f64 * 0.05) as u32,
            };
            // Fewer free machines as the room fills, slightly super-linear.
            let base = (total as f64 * (1.0 - ratio * 1.2)).floor() as i64;
            let jitter: i64 = rng.gen_range(-2..=2);
            let available = (base + jitter).clamp(0, total as i64) as u32;
            out.push(ResourceAvailability {
                kind: ResourceKind::Computer,
                available,
                total,
            });
        }

        if loc.has_feature("printers") {
            let total = match loc.kind {
                LocationKind::Lab | LocationKind::Printer => loc.capacity / 10,
                _ => (loc.capacity / 50).min(3),
            };
            // Usually all free, occasionally a queue forms.
            let available = if rng.gen_bool(0.3) {
                total.saturating_sub(rng.gen_range(0..3))
            } else {
                total
            };
            out.push(ResourceAvailability {
                kind: ResourceKind::Printer,
                available,
                total,
            });
        }

        if loc.has_feature("group_study") {
            let total = loc.capacity / 30;
            let hour = now.hour();
            let base: f64 = if hour < 9 {
                0.9
            } else if hour < 12 {
                0.6
            } else if hour < 17 {
                0.3
            } else if hour < 21 {
                0.2
            } else {
                0.7
            };
            let availability = (base + rng.gen_range(-0.1..0.1)).clamp(0.0, 1.0);
            out.push(ResourceAvailability {
                kind: ResourceKind::StudyRoom,
                available: (total as f64 * availability).floor() as u32,
                total,
            });
        }

        out
    }
}

//! Recommendation queries over the simulated occupancy state.

use chrono::{DateTime, Datelike, Local, Timelike};

use crate::limits::TIME_SCAN_HOURS;
use crate::model::{
    HeatmapEntry, LocationKind, LocationRecommendation, ResourceKind, ResourceSite,
    TimeRecommendation,
};

use super::{OccupancySimulator, clock_of};

impl OccupancySimulator {
    /// All locations with their occupied fraction, busiest first.
    pub fn heatmap(&self) -> Vec<HeatmapEntry> {
        let mut out: Vec<HeatmapEntry> = self
            .all_occupancy()
            .into_iter()
            .filter_map(|rec| {
                let loc = self.catalog().location(rec.location_id)?;
                Some(HeatmapEntry {
                    location_id: rec.location_id,
                    name: loc.name,
                    occupancy: rec.ratio(),
                })
            })
            .collect();
        out.sort_by(|a, b| b.occupancy.total_cmp(&a.occupancy));
        out
    }

    /// Least busy open location of `kind`. Falls back to the first location
    /// of the kind with a "closed" reason when nothing is open; `None` only
    /// when the catalog has no location of the kind at all.
    pub fn recommended_location(
        &self,
        kind: LocationKind,
        now: DateTime<Local>,
    ) -> Option<LocationRecommendation> {
        let all = self.catalog().locations_by_kind(kind);
        let clock = clock_of(now);
        let open: Vec<_> = all.iter().copied().filter(|l| l.is_open_at(clock)).collect();

        if open.is_empty() {
            let first = all.first()?;
            return Some(LocationRecommendation {
                location_id: first.id,
                name: first.name,
                reason: "All locations are currently closed.".to_string(),
                occupancy_percentage: 0,
            });
        }

        let mut ranked: Vec<_> = open
            .iter()
            .filter_map(|loc| self.occupancy(loc.id).map(|rec| (*loc, rec.ratio())))
            .collect();
        if ranked.is_empty() {
            return Some(LocationRecommendation {
                location_id: open[0].id,
                name: open[0].name,
                reason: "Recommended based on availability.".to_string(),
                occupancy_percentage: 0,
            });
        }
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));

        let (best, ratio) = ranked[0];
        let percentage = (ratio * 100.0).round() as u32;
        let mut reason = String::from(if percentage < 20 {
            "Nearly empty right now."
        } else if percentage < 50 {
            "Plenty of space available."
        } else if percentage < 70 {
            "Moderately busy but space available."
        } else {
            "The least busy option currently."
        });
        if best.has_feature("quiet_zones") {
            reason.push_str(" Has quiet study zones.");
        }
        if best.has_feature("wifi") && best.has_feature("outlets") {
            reason.push_str(" Good WiFi and plenty of outlets.");
        }

        Some(LocationRecommendation {
            location_id: best.id,
            name: best.name,
            reason,
            occupancy_percentage: percentage,
        })
    }

    /// Scan today's pattern row for a quieter hour within the next 12 hours.
    ///
    /// First pass wants at least a 25% improvement; the relaxed pass accepts
    /// any strictly lower hour. Best improvement wins, scan order breaks ties.
    pub fn recommended_time(&self, location_id: &str, now: DateTime<Local>) -> TimeRecommendation {
        if self.catalog().location(location_id).is_none() {
            return TimeRecommendation {
                hour: 12,
                reason: "Location not found.".to_string(),
                improvement_percentage: 0,
            };
        }
        let current_hour = now.hour();
        let day = now.weekday().num_days_from_sunday() as usize;
        let Some(week) = self.pattern(location_id) else {
            return TimeRecommendation {
                hour: 12,
                reason: "No pattern data available.".to_string(),
                improvement_percentage: 0,
            };
        };
        let row = &week[day];
        let current = row[current_hour as usize];

        let scan = |factor: f64| -> Vec<(u32, u32)> {
            let mut out = Vec::new();
            for hour in (current_hour + 1)..24.min(current_hour + TIME_SCAN_HOURS) {
                let p = row[hour as usize];
                if p < current * factor {
                    out.push((hour, ((1.0 - p / current) * 100.0).round() as u32));
                }
            }
            out
        };

        let mut better = scan(0.75);
        if better.is_empty() {
            if current < 0.3 {
                return TimeRecommendation {
                    hour: current_hour,
                    reason: "Now is already a great time to visit!".to_string(),
                    improvement_percentage: 0,
                };
            }
            better = scan(1.0);
            if better.is_empty() {
                return TimeRecommendation {
                    hour: current_hour,
                    reason: "Current occupancy levels are expected to continue throughout the day."
                        .to_string(),
                    improvement_percentage: 0,
                };
            }
        }

        // Stable sort keeps earlier hours ahead on equal improvement.
        better.sort_by(|a, b| b.1.cmp(&a.1));
        let (best_hour, improvement) = better[0];
        let hour12 = match best_hour % 12 {
            0 => 12,
            h => h,
        };
        let meridiem = if best_hour >= 12 { "PM" } else { "AM" };

        TimeRecommendation {
            hour: best_hour,
            reason: format!("{hour12}{meridiem} would be {improvement}% less crowded than right now."),
            improvement_percentage: improvement,
        }
    }

    /// Availability of one resource kind across campus, most available first.
    pub fn resource_availability(&self, kind: ResourceKind) -> Vec<ResourceSite> {
        let mut out: Vec<ResourceSite> = self
            .all_occupancy()
            .into_iter()
            .filter_map(|rec| {
                let res = rec.resource(kind)?;
                let loc = self.catalog().location(rec.location_id)?;
                Some(ResourceSite {
                    location_id: rec.location_id,
                    name: loc.name,
                    available: res.available,
                    total: res.total,
                })
            })
            .collect();
        out.sort_by(|a, b| b.available.cmp(&a.available));
        out
    }
}

//! Weekly occupancy curves per location category.

use rand::Rng;
use rand::rngs::StdRng;

use crate::limits::PATTERN_JITTER;
use crate::model::LocationKind;

/// `[day][hour]` occupied fraction, day 0 = Sunday.
pub type WeekPattern = [[f64; 24]; 7];

/// Build a location's weekly pattern once at startup: the category curve with
/// weekend damping and a baked-in ±10% jitter per cell.
pub fn build_week_pattern(kind: LocationKind, rng: &mut StdRng) -> WeekPattern {
    let mut week = [[0.0; 24]; 7];
    for (day, row) in week.iter_mut().enumerate() {
        for (hour, cell) in row.iter_mut().enumerate() {
            let base = weekly_curve(kind, day as u32, hour as u32);
            let jitter = 1.0 + rng.gen_range(-PATTERN_JITTER..PATTERN_JITTER);
            *cell = (base * jitter).clamp(0.0, 1.0);
        }
    }
    week
}

fn weekly_curve(kind: LocationKind, day: u32, hour: u32) -> f64 {
    let weekend = day == 0 || day == 6;
    match kind {
        LocationKind::Library | LocationKind::StudyArea => {
            let base = if hour < 7 {
                0.0
            } else if hour < 9 {
                0.1
            } else if hour < 11 {
                0.3
            } else if hour < 14 {
                0.5
            } else if hour < 17 {
                0.7
            } else if hour < 20 {
                0.8
            } else if hour < 23 {
                0.6
            } else {
                0.3
            };
            if weekend { base * 0.7 } else { base }
        }
        LocationKind::Cafe => {
            let base = if !(7..19).contains(&hour) {
                0.0
            } else if hour < 9 {
                0.6
            } else if (11..14).contains(&hour) {
                0.9
            } else if (15..17).contains(&hour) {
                0.7
            } else {
                0.4
            };
            if weekend { base * 0.5 } else { base }
        }
        LocationKind::Lab => {
            let base = if !(8..22).contains(&hour) {
                0.0
            } else if (9..12).contains(&hour) {
                0.5
            } else if (12..14).contains(&hour) {
                0.3
            } else if (14..17).contains(&hour) {
                0.7
            } else if (19..22).contains(&hour) {
                0.9
            } else {
                0.4
            };
            match day {
                0 => base * 0.3,
                6 => base * 0.5,
                _ => base,
            }
        }
        LocationKind::Dining => {
            if !(7..21).contains(&hour) {
                0.0
            } else if hour < 9 {
                0.7
            } else if (11..14).contains(&hour) {
                0.9
            } else if (17..19).contains(&hour) {
                0.8
            } else {
                0.2
            }
        }
        LocationKind::Printer => {
            if !(8..20).contains(&hour) {
                0.1
            } else if (10..16).contains(&hour) {
                0.6
            } else {
                0.3
            }
        }
    }
}

/// Coarse curve used only when a location has no pattern row.
pub fn fallback_curve(kind: LocationKind, hour: u32) -> f64 {
    match kind {
        LocationKind::Library | LocationKind::StudyArea => {
            if hour < 8 {
                0.05
            } else if hour < 10 {
                0.2
            } else if hour < 14 {
                0.5
            } else if hour < 19 {
                0.7
            } else if hour < 22 {
                0.6
            } else {
                0.3
            }
        }
        LocationKind::Cafe => {
            if !(7..19).contains(&hour) {
                0.0
            } else if hour < 9 {
                0.6
            } else if hour < 11 {
                0.3
            } else if hour < 14 {
                0.8
            } else if hour < 16 {
                0.4
            } else {
                0.2
            }
        }
        LocationKind::Lab => {
            if !(8..22).contains(&hour) {
                0.0
            } else if hour < 12 {
                0.4
            } else if hour < 14 {
                0.3
            } else if hour < 17 {
                0.6
            } else if hour < 21 {
                0.8
            } else {
                0.4
            }
        }
        LocationKind::Dining => {
            if !(7..21).contains(&hour) {
                0.0
            } else if hour < 9 {
                0.6
            } else if hour < 11 {
                0.1
            } else if hour < 14 {
                0.9
            } else if hour < 16 {
                0.2
            } else if hour < 19 {
                0.8
            } else {
                0.3
            }
        }
        LocationKind::Printer => {
            if !(8..20).contains(&hour) {
                0.1
            } else if hour < 17 {
                0.6
            } else {
                0.3
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn patterns_stay_normalized() {
        let mut rng = StdRng::seed_from_u64(7);
        for kind in [
            LocationKind::Library,
            LocationKind::Cafe,
            LocationKind::Lab,
            LocationKind::StudyArea,
            LocationKind::Printer,
            LocationKind::Dining,
        ] {
            let week = build_week_pattern(kind, &mut rng);
            for row in &week {
                for &cell in row {
                    assert!((0.0..=1.0).contains(&cell));
                }
            }
        }
    }

    #[test]
    fn weekends_are_quieter_in_the_library() {
        let mut rng = StdRng::seed_from_u64(7);
        let week = build_week_pattern(LocationKind::Library, &mut rng);
        // Peak evening hour, jitter is at most ±10% so damping dominates.
        assert!(week[0][18] < week[3][18]);
        assert!(week[6][18] < week[3][18]);
    }

    #[test]
    fn closed_hours_are_zero() {
        let mut rng = StdRng::seed_from_u64(7);
        let week = build_week_pattern(LocationKind::Cafe, &mut rng);
        for day in 0..7 {
            assert_eq!(week[day][3], 0.0);
            assert_eq!(week[day][22], 0.0);
        }
    }
}

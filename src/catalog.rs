//! Static campus data: locations the occupancy simulator tracks and the
//! bookable study rooms.

use crate::model::{ClockTime, Location, LocationKind, StudyRoom};

pub static LOCATIONS: &[Location] = &[
    Location {
        id: "whitmore-library",
        name: "Whitmore Library",
        kind: LocationKind::Library,
        capacity: 500,
        floors: &["Main Floor", "Upper Level", "Basement"],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(24, 0),
        features: &["wifi", "outlets", "quiet_zones", "group_study", "computers", "printers"],
        building: "Whitmore Library",
        floor_desc: "All Floors",
    },
    Location {
        id: "whitmore-basement",
        name: "Whitmore Library Basement",
        kind: LocationKind::StudyArea,
        capacity: 120,
        floors: &[],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(24, 0),
        features: &["wifi", "outlets", "quiet_zones"],
        building: "Whitmore Library",
        floor_desc: "Basement",
    },
    Location {
        id: "atrium-commons",
        name: "Atrium Commons",
        kind: LocationKind::StudyArea,
        capacity: 200,
        floors: &["North Wing", "South Wing"],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(22, 0),
        features: &["wifi", "outlets", "group_study"],
        building: "Atrium Commons",
        floor_desc: "Main Floor",
    },
    Location {
        id: "atrium-cafe",
        name: "Atrium Commons Cafe",
        kind: LocationKind::Cafe,
        capacity: 75,
        floors: &[],
        open: ClockTime::from_hm(7, 30),
        close: ClockTime::from_hm(19, 0),
        features: &["wifi", "coffee", "food"],
        building: "Atrium Commons",
        floor_desc: "Main Floor",
    },
    Location {
        id: "fieldhouse-lounge",
        name: "Fieldhouse Study Lounge",
        kind: LocationKind::StudyArea,
        capacity: 60,
        floors: &[],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(21, 0),
        features: &["wifi", "quiet_zones"],
        building: "Fieldhouse",
        floor_desc: "Main Floor",
    },
    Location {
        id: "main-computer-lab",
        name: "Main Computer Lab",
        kind: LocationKind::Lab,
        capacity: 50,
        floors: &[],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(22, 0),
        features: &["computers", "printers", "scanners", "specialized_software"],
        building: "Science Center",
        floor_desc: "2nd Floor",
    },
    Location {
        id: "basement-computer-lab",
        name: "Basement Computer Lab",
        kind: LocationKind::Lab,
        capacity: 30,
        floors: &[],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(20, 0),
        features: &["computers", "printers", "quiet_zones"],
        building: "Science Center",
        floor_desc: "Basement",
    },
    Location {
        id: "union-dining",
        name: "Student Union Dining Hall",
        kind: LocationKind::Dining,
        capacity: 300,
        floors: &["Main Hall", "Mezzanine"],
        open: ClockTime::from_hm(7, 0),
        close: ClockTime::from_hm(21, 0),
        features: &["food", "wifi"],
        building: "Student Union",
        floor_desc: "Main Floor",
    },
    Location {
        id: "science-cafe",
        name: "Science Center Cafe",
        kind: LocationKind::Cafe,
        capacity: 40,
        floors: &[],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(17, 0),
        features: &["coffee", "snacks", "wifi"],
        building: "Science Center",
        floor_desc: "1st Floor",
    },
    Location {
        id: "print-center",
        name: "Print & Copy Center",
        kind: LocationKind::Printer,
        capacity: 25,
        floors: &[],
        open: ClockTime::from_hm(8, 0),
        close: ClockTime::from_hm(20, 0),
        features: &["printers", "copiers", "scanners"],
        building: "Student Union",
        floor_desc: "2nd Floor",
    },
];

/// Locations students gravitate to; used by the ambient insight generator.
pub static POPULAR_LOCATION_IDS: &[&str] =
    &["whitmore-library", "atrium-commons", "union-dining"];

pub static ROOMS: &[StudyRoom] = &[
    StudyRoom {
        id: 1,
        room_number: "101",
        building: "Whitmore Library",
        floor: 1,
        capacity: 4,
        features: &["whiteboard", "power outlets"],
        active: true,
    },
    StudyRoom {
        id: 2,
        room_number: "102",
        building: "Whitmore Library",
        floor: 1,
        capacity: 8,
        features: &["whiteboard", "projector", "power outlets"],
        active: true,
    },
    StudyRoom {
        id: 3,
        room_number: "201",
        building: "Whitmore Library",
        floor: 2,
        capacity: 2,
        features: &["power outlets"],
        active: true,
    },
    StudyRoom {
        id: 4,
        room_number: "202",
        building: "Whitmore Library",
        floor: 2,
        capacity: 6,
        features: &["whiteboard", "power outlets", "dual monitors"],
        active: true,
    },
    StudyRoom {
        id: 5,
        room_number: "301",
        building: "Science Center",
        floor: 3,
        capacity: 4,
        features: &["whiteboard", "power outlets"],
        active: true,
    },
    // Closed for renovation; kept in the table so old bookings still resolve.
    StudyRoom {
        id: 6,
        room_number: "305",
        building: "Science Center",
        floor: 3,
        capacity: 10,
        features: &["whiteboard", "projector"],
        active: false,
    },
];

/// Read-only view over the campus data. Constructible from custom tables in
/// tests.
#[derive(Debug, Clone)]
pub struct Catalog {
    locations: &'static [Location],
    rooms: &'static [StudyRoom],
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalog {
    pub fn new() -> Self {
        Catalog {
            locations: LOCATIONS,
            rooms: ROOMS,
        }
    }

    pub fn with_data(locations: &'static [Location], rooms: &'static [StudyRoom]) -> Self {
        Catalog { locations, rooms }
    }

    pub fn locations(&self) -> &'static [Location] {
        self.locations
    }

    pub fn location(&self, id: &str) -> Option<&'static Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn locations_by_kind(&self, kind: LocationKind) -> Vec<&'static Location> {
        self.locations.iter().filter(|l| l.kind == kind).collect()
    }

    pub fn open_at(&self, t: ClockTime) -> Vec<&'static Location> {
        self.locations.iter().filter(|l| l.is_open_at(t)).collect()
    }

    pub fn rooms(&self) -> &'static [StudyRoom] {
        self.rooms
    }

    pub fn room(&self, id: u32) -> Option<&'static StudyRoom> {
        self.rooms.iter().find(|r| r.id == id)
    }

    pub fn active_rooms(&self) -> impl Iterator<Item = &'static StudyRoom> + '_ {
        self.rooms.iter().filter(|r| r.active)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_id() {
        let catalog = Catalog::new();
        assert_eq!(catalog.location("whitmore-library").unwrap().capacity, 500);
        assert!(catalog.location("nope").is_none());
        assert_eq!(catalog.room(1).unwrap().room_number, "101");
    }

    #[test]
    fn active_rooms_excludes_inactive() {
        let catalog = Catalog::new();
        assert!(catalog.active_rooms().all(|r| r.active));
        assert!(catalog.rooms().iter().any(|r| !r.active));
    }

    #[test]
    fn every_kind_present_has_positive_capacity() {
        for loc in Catalog::new().locations() {
            assert!(loc.capacity > 0, "{} has zero capacity", loc.id);
        }
    }

    #[test]
    fn popular_ids_resolve() {
        let catalog = Catalog::new();
        for id in POPULAR_LOCATION_IDS {
            assert!(catalog.location(id).is_some(), "unknown popular id {id}");
        }
    }
}

use std::fmt;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Minute-of-day wall-clock time.
///
/// Values of `24:00` and beyond are legal as closing times only: a location
/// whose close is `26:00` stays open past midnight into the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);

    pub const fn from_hm(hour: u16, minute: u16) -> Self {
        ClockTime(hour * 60 + minute)
    }

    /// Parse `"HH:MM"`. Hours above 23 are accepted for wraparound closes.
    pub fn parse(s: &str) -> Option<Self> {
        let (h, m) = s.split_once(':')?;
        let hour: u16 = h.trim().parse().ok()?;
        let minute: u16 = m.trim().parse().ok()?;
        if hour > 30 || minute > 59 {
            return None;
        }
        Some(Self::from_hm(hour, minute))
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    /// Advance by `delta` minutes, wrapping at midnight.
    pub fn add_minutes(self, delta: u32) -> Self {
        ClockTime(((self.0 as u32 + delta) % 1440) as u16)
    }

    /// Twelve-hour rendering, e.g. `"2:30 PM"`, `"12:00 AM"`.
    pub fn display_12h(self) -> String {
        let hour24 = (self.0 / 60) % 24;
        let minute = self.0 % 60;
        let meridiem = if hour24 >= 12 { "PM" } else { "AM" };
        let hour12 = match hour24 % 12 {
            0 => 12,
            h => h,
        };
        format!("{hour12}:{minute:02} {meridiem}")
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

/// Half-open time slot `[start, end)` within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl Slot {
    pub fn new(start: ClockTime, end: ClockTime) -> Self {
        debug_assert!(start < end, "slot must be non-empty");
        Slot { start, end }
    }

    pub fn overlaps(&self, other: &Slot) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn duration_minutes(&self) -> u16 {
        self.end.minutes() - self.start.minutes()
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.display_12h(), self.end.display_12h())
    }
}

// ── Campus catalog ───────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Library,
    Cafe,
    Lab,
    StudyArea,
    Printer,
    Dining,
}

impl LocationKind {
    pub fn label(self) -> &'static str {
        match self {
            LocationKind::Library => "library",
            LocationKind::Cafe => "cafe",
            LocationKind::Lab => "lab",
            LocationKind::StudyArea => "study area",
            LocationKind::Printer => "printer",
            LocationKind::Dining => "dining",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Location {
    pub id: &'static str,
    pub name: &'static str,
    pub kind: LocationKind,
    pub capacity: u32,
    pub floors: &'static [&'static str],
    pub open: ClockTime,
    pub close: ClockTime,
    pub features: &'static [&'static str],
    pub building: &'static str,
    pub floor_desc: &'static str,
}

impl Location {
    pub fn has_feature(&self, feature: &str) -> bool {
        self.features.contains(&feature)
    }

    /// Open-hours check honoring closes at or past `24:00`.
    pub fn is_open_at(&self, t: ClockTime) -> bool {
        if self.close.minutes() >= 1440 {
            let close_wrapped = self.close.minutes() - 1440;
            t >= self.open || t.minutes() < close_wrapped
        } else {
            t >= self.open && t < self.close
        }
    }
}

#[derive(Debug, Clone)]
pub struct StudyRoom {
    pub id: u32,
    pub room_number: &'static str,
    pub building: &'static str,
    pub floor: i32,
    pub capacity: u32,
    pub features: &'static [&'static str],
    pub active: bool,
}

impl StudyRoom {
    pub fn feature_list(&self) -> String {
        self.features.join(", ")
    }

    pub fn label(&self) -> String {
        format!("{} {}", self.building, self.room_number)
    }
}

// ── Occupancy ────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OccupancyRecord {
    pub location_id: &'static str,
    pub current_count: u32,
    pub capacity: u32,
    pub updated_at: DateTime<Local>,
    pub floors: Vec<FloorOccupancy>,
    pub resources: Vec<ResourceAvailability>,
}

impl OccupancyRecord {
    /// Occupied fraction in `[0, 1]`.
    pub fn ratio(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.current_count as f64 / self.capacity as f64
        }
    }

    pub fn percentage(&self) -> u32 {
        (self.ratio() * 100.0).round() as u32
    }

    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceAvailability> {
        self.resources.iter().find(|r| r.kind == kind)
    }
}

#[derive(Debug, Clone)]
pub struct FloorOccupancy {
    pub floor: &'static str,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Computer,
    Printer,
    StudyRoom,
}

impl ResourceKind {
    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Computer => "computers",
            ResourceKind::Printer => "printers",
            ResourceKind::StudyRoom => "study rooms",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResourceAvailability {
    pub kind: ResourceKind,
    pub available: u32,
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct LocationRecommendation {
    pub location_id: &'static str,
    pub name: &'static str,
    pub reason: String,
    pub occupancy_percentage: u32,
}

#[derive(Debug, Clone)]
pub struct TimeRecommendation {
    pub hour: u32,
    pub reason: String,
    pub improvement_percentage: u32,
}

#[derive(Debug, Clone)]
pub struct ResourceSite {
    pub location_id: &'static str,
    pub name: &'static str,
    pub available: u32,
    pub total: u32,
}

#[derive(Debug, Clone)]
pub struct HeatmapEntry {
    pub location_id: &'static str,
    pub name: &'static str,
    pub occupancy: f64,
}

// ── Bookings ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Booking {
    pub id: u32,
    pub room_id: u32,
    pub user_id: String,
    pub user_email: Option<String>,
    pub date: NaiveDate,
    pub slot: Slot,
    pub purpose: Option<String>,
    pub attendees: Option<u32>,
    pub confirmation_code: String,
    pub status: BookingStatus,
}

#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub room_id: u32,
    pub user_id: String,
    pub user_email: Option<String>,
    pub date: NaiveDate,
    pub slot: Slot,
    pub purpose: Option<String>,
    pub attendees: Option<u32>,
}

// ── Chat ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    Student,
    Faculty,
    Other,
}

impl UserType {
    pub fn label(self) -> &'static str {
        match self {
            UserType::Student => "student",
            UserType::Faculty => "faculty",
            UserType::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserQuery {
    pub text: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub user_type: Option<UserType>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub user_email: Option<String>,
}

impl UserQuery {
    pub fn session(&self) -> &str {
        self.session_id.as_deref().unwrap_or("default")
    }

    pub fn user(&self) -> &str {
        self.user_id.as_deref().unwrap_or("anonymous")
    }

    pub fn category(&self) -> UserType {
        self.user_type.unwrap_or_default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiResponse {
    pub text: String,
    pub intent: String,
    pub category: UserType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    pub confidence: f32,
    pub sources: Vec<String>,
}

impl AiResponse {
    pub fn new(
        text: impl Into<String>,
        intent: &str,
        category: UserType,
        confidence: f32,
        source: &str,
    ) -> Self {
        AiResponse {
            text: text.into(),
            intent: intent.to_string(),
            category,
            subcategory: None,
            confidence,
            sources: vec![source.to_string()],
        }
    }

    pub fn with_subcategory(mut self, subcategory: &str) -> Self {
        self.subcategory = Some(subcategory.to_string());
        self
    }
}

/// One transcript entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub user_id: String,
    pub session_id: String,
    pub role: Role,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<UserType>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CampLocation {
    pub venue: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub pincode: String,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CampStatus {
    Scheduled,
    Upcoming,
    Ongoing,
    Completed,
    Cancelled,
}

impl CampStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampStatus::Scheduled => "scheduled",
            CampStatus::Upcoming => "upcoming",
            CampStatus::Ongoing => "ongoing",
            CampStatus::Completed => "completed",
            CampStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for CampStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CampStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "scheduled" => Ok(CampStatus::Scheduled),
            "upcoming" => Ok(CampStatus::Upcoming),
            "ongoing" => Ok(CampStatus::Ongoing),
            "completed" => Ok(CampStatus::Completed),
            "cancelled" | "canceled" => Ok(CampStatus::Cancelled),
            other => Err(format!("Unknown camp status: {}", other)),
        }
    }
}

/// Donor contact fields as they were at registration time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampRegistration {
    pub donor_id: String,
    pub name: String,
    pub phone: String,
    pub blood_group: String,
    pub registered_at: DateTime<Utc>,
    #[serde(default)]
    pub attended: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodCamp {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub organizer_id: String,
    pub organizer_name: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub location: CampLocation,
    pub target_units: u32,
    #[serde(default)]
    pub collected_units: u32,
    pub status: CampStatus,
    #[serde(default)]
    pub registered_donors: Vec<CampRegistration>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new camp
#[derive(Debug, Clone)]
pub struct NewCamp {
    pub name: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub location: CampLocation,
    pub target_units: u32,
}

impl BloodCamp {
    pub fn new(details: NewCamp, organizer_id: &str, organizer_name: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: details.name,
            description: details.description,
            organizer_id: organizer_id.to_string(),
            organizer_name: organizer_name.to_string(),
            date: details.date,
            start_time: details.start_time,
            end_time: details.end_time,
            location: details.location,
            target_units: details.target_units,
            collected_units: 0,
            status: CampStatus::Scheduled,
            registered_donors: Vec::new(),
            created_at: now,
        }
    }

    pub fn is_registered(&self, donor_id: &str) -> bool {
        self.registered_donors.iter().any(|r| r.donor_id == donor_id)
    }

    pub fn attended_count(&self) -> usize {
        self.registered_donors.iter().filter(|r| r.attended).count()
    }
}

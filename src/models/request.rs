use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BloodGroup, GeoPoint};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Critical,
    Urgent,
    #[default]
    Normal,
}

impl std::str::FromStr for Urgency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "critical" => Ok(Urgency::Critical),
            "urgent" => Ok(Urgency::Urgent),
            "normal" => Ok(Urgency::Normal),
            other => Err(format!("Unknown urgency: {}", other)),
        }
    }
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::Critical => write!(f, "critical"),
            Urgency::Urgent => write!(f, "urgent"),
            Urgency::Normal => write!(f, "normal"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
    Cancelled,
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Fulfilled => write!(f, "fulfilled"),
            RequestStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hospital {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub geo: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodRequest {
    pub id: String,
    pub requested_by: String,
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    #[serde(default)]
    pub urgency: Urgency,
    pub hospital: Hospital,
    pub contact_number: String,
    pub required_by: NaiveDate,
    pub status: RequestStatus,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fulfilled_by: Option<String>,
    #[serde(default)]
    pub fulfilled_at: Option<DateTime<Utc>>,
    /// Blood banks that turned the request down
    #[serde(default)]
    pub declined_by: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields for a new request
#[derive(Debug, Clone)]
pub struct NewRequest {
    pub patient_name: String,
    pub blood_group: BloodGroup,
    pub units: u32,
    pub urgency: Urgency,
    pub hospital: Hospital,
    pub contact_number: String,
    pub required_by: NaiveDate,
    pub description: Option<String>,
}

impl BloodRequest {
    pub fn new(details: NewRequest, requested_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            requested_by: requested_by.to_string(),
            patient_name: details.patient_name,
            blood_group: details.blood_group,
            units: details.units,
            urgency: details.urgency,
            hospital: details.hospital,
            contact_number: details.contact_number,
            required_by: details.required_by,
            status: RequestStatus::Pending,
            description: details.description,
            fulfilled_by: None,
            fulfilled_at: None,
            declined_by: Vec::new(),
            created_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BloodGroup;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Donor,
    Patient,
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "donor" => Ok(Role::Donor),
            "patient" => Ok(Role::Patient),
            other => Err(format!("Unknown role: {}", other)),
        }
    }
}

/// A donor or patient account. This is the authoritative copy of contact
/// fields that camp registrations snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonorProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub blood_group: Option<BloodGroup>,
    pub role: Role,
    #[serde(default)]
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DonorProfile {
    pub fn new(name: &str, email: &str, role: Role) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            phone: None,
            blood_group: None,
            role,
            city: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_phone(mut self, phone: &str) -> Self {
        self.phone = Some(phone.trim().to_string());
        self
    }

    pub fn with_blood_group(mut self, group: BloodGroup) -> Self {
        self.blood_group = Some(group);
        self
    }

    pub fn with_city(mut self, city: &str) -> Self {
        self.city = Some(city.trim().to_string());
        self
    }
}

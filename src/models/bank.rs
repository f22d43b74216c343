use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::BloodGroup;

/// Unit count for one blood group at one blood bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub blood_group: BloodGroup,
    pub units: u32,
    pub last_updated: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(blood_group: BloodGroup, units: u32, now: DateTime<Utc>) -> Self {
        Self {
            blood_group,
            units,
            last_updated: now,
        }
    }

    /// One zero-unit row per blood group
    pub fn empty_set(now: DateTime<Utc>) -> Vec<InventoryItem> {
        BloodGroup::ALL
            .iter()
            .map(|group| InventoryItem::new(*group, 0, now))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BloodBank {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub license_number: Option<String>,
    /// Embedded stock list written at registration time
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    pub created_at: DateTime<Utc>,
}

impl BloodBank {
    pub fn new(name: &str, email: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            email: email.trim().to_lowercase(),
            phone: None,
            address: None,
            city: None,
            state: None,
            license_number: None,
            inventory: InventoryItem::empty_set(now),
            created_at: now,
        }
    }
}

/// Standalone inventory record, keyed 1:1 by blood bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inventory {
    pub blood_bank_id: String,
    pub blood_bank_name: String,
    pub items: Vec<InventoryItem>,
    pub last_modified: DateTime<Utc>,
}

impl Inventory {
    pub fn new(bank: &BloodBank, items: Vec<InventoryItem>, now: DateTime<Utc>) -> Self {
        Self {
            blood_bank_id: bank.id.clone(),
            blood_bank_name: bank.name.clone(),
            items,
            last_modified: now,
        }
    }

    pub fn units_for(&self, group: BloodGroup) -> Option<u32> {
        self.items
            .iter()
            .find(|item| item.blood_group == group)
            .map(|item| item.units)
    }
}
